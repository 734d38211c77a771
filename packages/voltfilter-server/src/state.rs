use std::time::Instant;

use voltfilter_rs::PipelineConfig;

use crate::config::ServerConfig;

/// Main server state shared across all handlers
pub struct ServerState {
    pub config: ServerConfig,
    pub pipeline: PipelineConfig,
    pub start_time: Instant,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_pipeline(config, PipelineConfig::default())
    }

    pub fn with_pipeline(config: ServerConfig, pipeline: PipelineConfig) -> Self {
        Self {
            config,
            pipeline,
            start_time: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
