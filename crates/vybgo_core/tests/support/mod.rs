#![allow(dead_code)]

use std::sync::Arc;

use vybgo_core::registry::TimerRegistry;
use vybgo_core::ride::{Ride, RideId};
use vybgo_core::scheduler::{Scheduler, VirtualScheduler};
use vybgo_core::simulation::RideSimulator;
use vybgo_core::store::RideStore;
use vybgo_core::test_helpers::{pending_ride, MemoryRideStore};

/// Everything a lifecycle test needs: the store, the virtual clock, and a
/// simulator wired to a fresh registry. Each fixture is fully isolated.
pub struct SimFixture {
    pub store: Arc<MemoryRideStore>,
    pub scheduler: Arc<VirtualScheduler>,
    pub simulator: RideSimulator,
}

impl SimFixture {
    pub fn new() -> Self {
        let store = Arc::new(MemoryRideStore::new());
        let scheduler = Arc::new(VirtualScheduler::new());
        let registry = Arc::new(TimerRegistry::new(
            Arc::clone(&scheduler) as Arc<dyn Scheduler>
        ));
        let simulator =
            RideSimulator::new(Arc::clone(&store) as Arc<dyn RideStore>, registry);
        Self {
            store,
            scheduler,
            simulator,
        }
    }

    /// Seed a `PENDING` ride and return its id.
    pub fn seed_ride(&self) -> RideId {
        self.store.insert(pending_ride())
    }

    pub fn seed(&self, ride: Ride) -> RideId {
        self.store.insert(ride)
    }
}
