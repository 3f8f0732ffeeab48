//! Shared session for concurrently invoked hooks
//!
//! [`Session`] hooks take `&mut self`, so a host that serializes its hook
//! calls needs nothing more. Hosts that invoke hooks from several threads
//! wrap the session here; every hook then runs under one mutex, keeping the
//! identifier counter and region stack coherent.

use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use crate::session::Session;

/// Mutex-wrapped [`Session`] with interior mutability.
#[derive(Debug)]
pub struct SharedSession<W: Write> {
    inner: Mutex<Session<W>>,
}

impl<W: Write> SharedSession<W> {
    pub fn new(session: Session<W>) -> SharedSession<W> {
        SharedSession {
            inner: Mutex::new(session),
        }
    }

    /// Lock the session for one or more hook calls.
    ///
    /// A poisoned lock is recovered rather than propagated: the state a
    /// panicking hook leaves behind (a counter and a name stack) is still
    /// usable for continued tracing.
    pub fn lock(&self) -> MutexGuard<'_, Session<W>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Take the session back out, e.g. to finalize it.
    pub fn into_inner(self) -> Session<W> {
        self.inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write> From<Session<W>> for SharedSession<W> {
    fn from(session: Session<W>) -> SharedSession<W> {
        SharedSession::new(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Backend, DeviceId};
    use crate::session::SessionConfig;

    fn test_config() -> SessionConfig {
        SessionConfig {
            load_sequence: 0,
            interface_version: 1,
            suppress_ids: false,
        }
    }

    #[test]
    fn test_hooks_through_lock() {
        let session = Session::new(test_config(), Vec::new()).unwrap();
        let shared = SharedSession::new(session);
        let device = DeviceId::new(Backend::Threads, 0);

        let id = shared.lock().begin_parallel_for("k", device).unwrap();
        shared.lock().end_parallel_for(id).unwrap();

        assert_eq!(shared.lock().region_depth(), 0);
    }

    #[test]
    fn test_ids_stay_monotonic_across_threads() {
        use std::sync::Arc;

        let session = Session::new(test_config(), Vec::new()).unwrap();
        let shared = Arc::new(SharedSession::new(session));
        let device = DeviceId::new(Backend::OpenMp, 0);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        let id = shared.lock().begin_parallel_for("k", device).unwrap();
                        shared.lock().end_parallel_for(id).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // 100 begins total, so the next assignment is exactly 100
        let next = shared
            .lock()
            .begin_parallel_for("last", device)
            .unwrap();
        assert_eq!(next, 100);
    }
}
