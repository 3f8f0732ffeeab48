//! Hook event definitions
//!
//! These types mirror the host runtime's hook surface closely enough that a
//! recorded sequence of events can be serialized, shipped around, and
//! replayed through a [`Session`](crate::session::Session) later.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::DeviceId;

/// Longest space-handle name the runtime's fixed-size tag can carry.
pub const SPACE_NAME_LEN: usize = 64;

/// Opaque memory-space name tag. Display-only; the session never stores one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceHandle(String);

impl SpaceHandle {
    /// Build a handle, truncating names longer than the fixed tag size at a
    /// character boundary.
    pub fn new(name: impl Into<String>) -> SpaceHandle {
        let mut name = name.into();
        if name.len() > SPACE_NAME_LEN {
            let mut end = SPACE_NAME_LEN;
            while !name.is_char_boundary(end) {
                end -= 1;
            }
            name.truncate(end);
        }
        SpaceHandle(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpaceHandle {
    fn from(name: &str) -> SpaceHandle {
        SpaceHandle::new(name)
    }
}

/// The three parallel-kernel dispatch kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KernelKind {
    ParallelFor,
    ParallelScan,
    ParallelReduce,
}

impl KernelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            KernelKind::ParallelFor => "parallel-for",
            KernelKind::ParallelScan => "parallel-scan",
            KernelKind::ParallelReduce => "parallel-reduce",
        }
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One hook invocation, as it appears in a recorded script.
///
/// End events carry no identifier: a replayer pairs each end with the most
/// recent outstanding begin of the same kind, the same way the runtime
/// hands the begin identifier back to the matching end hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HookEvent {
    BeginParallelFor {
        name: String,
        device: DeviceId,
    },
    EndParallelFor,
    BeginParallelScan {
        name: String,
        device: DeviceId,
    },
    EndParallelScan,
    BeginParallelReduce {
        name: String,
        device: DeviceId,
    },
    EndParallelReduce,
    BeginFence {
        name: String,
        device: DeviceId,
    },
    EndFence,
    PushRegion {
        name: String,
    },
    PopRegion,
    Allocate {
        space: SpaceHandle,
        name: String,
        ptr: u64,
        size: u64,
    },
    Deallocate {
        space: SpaceHandle,
        name: String,
        ptr: u64,
        size: u64,
    },
    DeepCopy {
        dst_space: SpaceHandle,
        dst_name: String,
        dst_ptr: u64,
        src_space: SpaceHandle,
        src_name: String,
        src_ptr: u64,
        size: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Backend;

    #[test]
    fn test_event_json_shape() {
        let event = HookEvent::BeginParallelFor {
            name: "saxpy".to_string(),
            device: DeviceId::new(Backend::Cuda, 0),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"begin_parallel_for\""), "got {json}");

        let parsed: HookEvent = serde_json::from_str(&json).unwrap();
        match parsed {
            HookEvent::BeginParallelFor { name, device } => {
                assert_eq!(name, "saxpy");
                assert_eq!(device.backend(), Some(Backend::Cuda));
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_end_events_have_no_payload() {
        let parsed: HookEvent = serde_json::from_str(r#"{"type":"pop_region"}"#).unwrap();
        assert!(matches!(parsed, HookEvent::PopRegion));
    }

    #[test]
    fn test_space_handle_truncates_long_names() {
        let long = "x".repeat(200);
        let handle = SpaceHandle::new(long);
        assert_eq!(handle.as_str().len(), SPACE_NAME_LEN);

        let short = SpaceHandle::new("CudaUVM");
        assert_eq!(short.as_str(), "CudaUVM");
    }

    #[test]
    fn test_space_handle_truncates_on_char_boundary() {
        // 2-byte code points straddling the 64-byte cut
        let name = "é".repeat(40);
        let handle = SpaceHandle::new(name);
        assert!(handle.as_str().len() <= SPACE_NAME_LEN);
        assert!(handle.as_str().chars().all(|c| c == 'é'));
    }
}
