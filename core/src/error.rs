//! Error types for kerntrace-core

use thiserror::Error;

/// Errors surfaced by session hooks.
///
/// The hook state machine itself never fails: misordered region pops are
/// no-ops and device decoding always produces a label. The only fallible
/// operation is writing a trace line to the session sink.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to write trace output")]
    Write(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
