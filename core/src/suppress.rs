//! Identifier-suppression policy
//!
//! Execution identifiers depend on the order kernels happen to launch in,
//! which makes raw trace output awkward to diff across runs. Setting the
//! suppression variable renders every identifier number as zero while
//! leaving the surrounding text untouched.

use tracing::debug;

/// Environment variable controlling identifier suppression.
pub const SUPPRESS_IDS_ENV: &str = "KERNTRACE_SUPPRESS_IDS";

/// Accepted truthy spellings, compared case-insensitively.
const TRUTHY: [&str; 4] = ["1", "on", "true", "yes"];

/// Whether a raw variable value enables suppression. Absence and anything
/// outside the truthy set are false.
pub fn is_truthy(raw: Option<&str>) -> bool {
    match raw {
        Some(value) => {
            let value = value.trim();
            TRUTHY.iter().any(|t| value.eq_ignore_ascii_case(t))
        }
        None => false,
    }
}

/// Resolve the suppression flag from the process environment.
pub fn suppress_ids_from_env() -> bool {
    let raw = std::env::var(SUPPRESS_IDS_ENV).ok();
    let suppress = is_truthy(raw.as_deref());
    debug!(
        "{} resolved to {} (raw value {:?})",
        SUPPRESS_IDS_ENV, suppress, raw
    );
    suppress
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy_spellings() {
        for value in ["1", "on", "ON", "true", "TRUE", "True", "yes", "YES", "yEs"] {
            assert!(is_truthy(Some(value)), "expected {value:?} to enable suppression");
        }
    }

    #[test]
    fn test_falsy_values() {
        for value in ["0", "off", "false", "no", "2", "", "  ", "enabled"] {
            assert!(!is_truthy(Some(value)), "expected {value:?} to be false");
        }
        assert!(!is_truthy(None));
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        assert!(is_truthy(Some(" yes ")));
    }
}
