use std::sync::Arc;

use vybgo_core::registry::TimerRegistry;
use vybgo_core::scheduler::Scheduler;
use vybgo_core::simulation::RideSimulator;
use vybgo_core::store::RideStore;

use crate::config::Config;
use crate::fcm::FcmClient;
use crate::store::Database;

/// Shared application state: configuration, the persistence layer, the
/// lifecycle simulator and the push client.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Database>,
    pub simulator: RideSimulator,
    pub fcm: FcmClient,
}

impl AppState {
    /// Wire the simulator to the given store and scheduler. The timer
    /// registry is owned here and injected into the simulator, so separate
    /// states (e.g. per-test apps) never share timers.
    pub fn new<S>(config: Config, store: Arc<S>, scheduler: Arc<dyn Scheduler>) -> Arc<Self>
    where
        S: Database + 'static,
    {
        let registry = Arc::new(TimerRegistry::new(scheduler));
        let ride_store: Arc<dyn RideStore> = Arc::clone(&store) as Arc<dyn RideStore>;
        let simulator = RideSimulator::new(ride_store, registry);
        let fcm = FcmClient::new(config.fcm_server_api_key.clone());

        Arc::new(Self {
            config,
            db: store,
            simulator,
            fcm,
        })
    }
}
