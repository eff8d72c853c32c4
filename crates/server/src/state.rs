use subrecall_core::{CommandQueue, Config, EventNormalizer, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    normalizer: EventNormalizer,
    queue: CommandQueue,
}

impl AppState {
    pub fn new(config: Config, normalizer: EventNormalizer, queue: CommandQueue) -> Self {
        Self {
            config,
            normalizer,
            queue,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn normalizer(&self) -> &EventNormalizer {
        &self.normalizer
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }
}
