//! Shared application state

use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;
use crate::executor::{SimulatedExecutor, TrainingExecutor};
use crate::registry::ModelRegistry;
use crate::scheduler::{SchedulerConfig, TrainingScheduler};

/// State shared by all handlers
///
/// The scheduler and registry are the long-lived services; handlers hold
/// clones of this struct, all pointing at the same instances.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<TrainingScheduler>,
    pub registry: Arc<ModelRegistry>,
    pub config: ServerConfig,
    started: Instant,
}

impl AppState {
    /// Wire up state around the given executor
    pub fn new(
        config: ServerConfig,
        scheduler_config: SchedulerConfig,
        executor: Arc<dyn TrainingExecutor>,
    ) -> Self {
        let registry = Arc::new(ModelRegistry::in_memory());
        let scheduler =
            Arc::new(TrainingScheduler::new(scheduler_config, executor, Arc::clone(&registry)));
        Self { scheduler, registry, config, started: Instant::now() }
    }

    /// State backed by the simulated reference executor
    #[must_use]
    pub fn simulated(config: ServerConfig) -> Self {
        Self::new(config, SchedulerConfig::default(), Arc::new(SimulatedExecutor::new()))
    }

    /// Seconds since this state was created
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
