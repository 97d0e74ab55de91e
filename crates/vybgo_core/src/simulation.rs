//! Ride lifecycle simulator: drives a newly created ride through a fixed
//! simulated timeline (PENDING → ACCEPTED → IN_PROGRESS → COMPLETED)
//! without blocking the caller. Best-effort by design: a failed transition
//! is logged and abandoned, never retried.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::registry::TimerRegistry;
use crate::ride::{RideId, RideStatus};
use crate::store::{RideStore, StoreError};

/// Delay before the ride is accepted by the simulated driver.
pub const ACCEPT_AFTER: Duration = Duration::from_secs(5);
/// Delay before the simulated pickup.
pub const PICKUP_AFTER: Duration = Duration::from_secs(15);
/// Delay before the simulated dropoff.
pub const COMPLETE_AFTER: Duration = Duration::from_secs(30);

/// Schedules and applies status transitions for rides over time. Cheap to
/// clone; clones share the store and the timer registry.
#[derive(Clone)]
pub struct RideSimulator {
    store: Arc<dyn RideStore>,
    registry: Arc<TimerRegistry>,
}

impl RideSimulator {
    pub fn new(store: Arc<dyn RideStore>, registry: Arc<TimerRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &Arc<TimerRegistry> {
        &self.registry
    }

    /// Schedule the three lifecycle transitions and return immediately.
    ///
    /// The transitions are scheduled independently, not chained: each fires
    /// at its own offset and re-checks the stored status before writing.
    /// Calling `start` twice for the same ride appends a second set of
    /// handles to the registry entry rather than replacing the first;
    /// callers are expected to start each ride exactly once, at creation.
    pub fn start(&self, ride_id: RideId) {
        let sim = self.clone();
        self.registry.schedule(
            ride_id,
            ACCEPT_AFTER,
            Box::pin(async move {
                sim.apply_transition(ride_id, RideStatus::Accepted).await;
            }),
        );

        let sim = self.clone();
        self.registry.schedule(
            ride_id,
            PICKUP_AFTER,
            Box::pin(async move {
                sim.apply_transition(ride_id, RideStatus::InProgress).await;
            }),
        );

        let sim = self.clone();
        self.registry.schedule(
            ride_id,
            COMPLETE_AFTER,
            Box::pin(async move {
                sim.apply_transition(ride_id, RideStatus::Completed).await;
                // The timeline is over either way; drop the registry entry.
                sim.registry.cancel_all(ride_id);
            }),
        );

        info!(%ride_id, "started ride lifecycle simulation");
    }

    /// Cancel all pending transitions for the ride. Does not touch the
    /// stored status; a cancelling caller writes `CANCELLED` separately.
    /// No-op when no simulation is active for the ride.
    pub fn stop(&self, ride_id: RideId) {
        self.registry.cancel_all(ride_id);
        info!(%ride_id, "stopped ride lifecycle simulation");
    }

    /// Apply one scheduled transition, re-reading the stored status first.
    /// Every failure path is terminal to this single transition only.
    async fn apply_transition(&self, ride_id: RideId, target: RideStatus) {
        let current = match self.store.find_by_id(ride_id).await {
            Ok(Some(ride)) => ride.status,
            Ok(None) => {
                info!(%ride_id, "ride not found, skipping status update");
                return;
            }
            Err(err) => {
                error!(%ride_id, %err, "failed to read ride, abandoning transition");
                return;
            }
        };

        if current.is_terminal() {
            info!(%ride_id, status = %current, "ride already terminal, stopping simulation");
            self.registry.cancel_all(ride_id);
            return;
        }

        match self.store.update_status(ride_id, target).await {
            Ok(_) => {
                info!(%ride_id, status = %target, "ride status updated");
            }
            Err(StoreError::NotFound) => {
                info!(%ride_id, "ride disappeared before status update");
                return;
            }
            Err(err) => {
                error!(%ride_id, %err, "failed to write ride status");
                return;
            }
        }

        if target == RideStatus::Completed {
            self.registry.cancel_all(ride_id);
        }
    }
}
