//! Shared Conductor
//!
//! Single-writer lock around a [`Conductor`] so facades on any thread can
//! reach it. Every call takes the lock once.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::conductor::Conductor;
use crate::events::ConductorEvent;
use crate::pool::PoolStats;

/// Thread-safe handle to one conductor
#[derive(Clone)]
pub struct ConductorHandle {
    inner: Arc<Mutex<Conductor>>,
}

impl ConductorHandle {
    pub fn new(conductor: Conductor) -> Self {
        Self {
            inner: Arc::new(Mutex::new(conductor)),
        }
    }

    /// Lock for direct access. Do not drop a facade while holding the guard:
    /// facade `Drop` takes the same lock.
    pub fn lock(&self) -> MutexGuard<'_, Conductor> {
        self.inner.lock()
    }

    /// Per-frame tick
    pub fn update(&self, delta_time: f32) -> Vec<ConductorEvent> {
        self.inner.lock().update(delta_time)
    }

    pub fn take_events(&self) -> Vec<ConductorEvent> {
        self.inner.lock().take_events()
    }

    pub fn stop_all(&self, fade: bool) {
        self.inner.lock().stop_all(fade);
    }

    pub fn active_lease_count(&self) -> usize {
        self.inner.lock().active_lease_count()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.inner.lock().pool_stats()
    }
}

impl From<Conductor> for ConductorHandle {
    fn from(conductor: Conductor) -> Self {
        Self::new(conductor)
    }
}

impl std::fmt::Debug for ConductorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ConductorHandle").field(&*self.inner.lock()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_host::VirtualHost;
    use cf_core::Settings;

    #[test]
    fn test_handle_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConductorHandle>();
    }

    #[test]
    fn test_update_from_other_thread() {
        let host = VirtualHost::new();
        let handle = ConductorHandle::new(Conductor::with_seed(
            Settings::default(),
            Box::new(host.factory()),
            host.clock(),
            1,
        ));

        let worker = handle.clone();
        let events = std::thread::spawn(move || worker.update(0.016))
            .join()
            .unwrap();
        assert!(events.is_empty());
        assert_eq!(handle.active_lease_count(), 0);
    }
}
