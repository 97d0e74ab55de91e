use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::debug;

use crate::ride::RideId;
use crate::scheduler::{CancelHandle, ScheduledTask, Scheduler};

/// Tracks the outstanding scheduled transitions per ride so they can be
/// cancelled en masse. Owned by the composing application and injected
/// wherever needed; never process-global.
pub struct TimerRegistry {
    scheduler: Arc<dyn Scheduler>,
    entries: Mutex<HashMap<RideId, Vec<CancelHandle>>>,
}

impl TimerRegistry {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RideId, Vec<CancelHandle>>> {
        self.entries.lock().expect("timer registry lock poisoned")
    }

    /// Schedule `task` after `delay` on the shared scheduler and append the
    /// handle under `ride_id`, creating the entry if absent.
    pub fn schedule(&self, ride_id: RideId, delay: Duration, task: ScheduledTask) {
        let handle = self.scheduler.schedule(delay, task);
        self.lock().entry(ride_id).or_default().push(handle);
    }

    /// Cancel every pending handle for `ride_id` and drop the entry.
    /// No-op when no entry exists; idempotent.
    pub fn cancel_all(&self, ride_id: RideId) {
        let handles = self.lock().remove(&ride_id);
        if let Some(handles) = handles {
            debug!(%ride_id, count = handles.len(), "cancelling scheduled transitions");
            for handle in handles {
                handle.cancel();
            }
        }
    }

    /// Whether the registry currently holds an entry for `ride_id`.
    pub fn is_tracking(&self, ride_id: RideId) -> bool {
        self.lock().contains_key(&ride_id)
    }

    /// Number of handles registered under `ride_id` (fired or not).
    pub fn handle_count(&self, ride_id: RideId) -> usize {
        self.lock().get(&ride_id).map_or(0, Vec::len)
    }
}
