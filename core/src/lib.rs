//! Core hook state machine for KernTrace
//!
//! A host runtime's profiling interface invokes named hooks on lifecycle
//! events (kernel launch/completion, fences, profiling regions, memory
//! events). This crate holds the session state those hooks share (the
//! execution-identifier counter, the region-name stack, and the cached
//! identifier-suppression flag) and formats each event as a line of
//! human-readable trace output.

pub mod device;
pub mod error;
pub mod events;
pub mod region;
pub mod session;
pub mod suppress;
pub mod sync;

// Re-export commonly used types
pub use device::{Backend, DeviceId};
pub use error::Error;
pub use events::{HookEvent, KernelKind, SpaceHandle};
pub use session::{ExecId, FenceId, Session, SessionConfig, INTERNAL_FENCE_MARKER};
pub use sync::SharedSession;

/// Prefix carried by every line of trace output.
pub const LINE_PREFIX: &str = "KernTrace: ";
