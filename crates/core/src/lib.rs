pub mod catalog;
pub mod config;
pub mod managers;
pub mod normalizer;
pub mod output;
pub mod queue;
pub mod rechecker;
pub mod scoring;
pub mod source;
pub mod testing;
pub mod video;

pub use catalog::{CatalogError, SqliteCatalog, VideoCatalog};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use managers::{CouchPotatoClient, EpisodeManager, MovieManager, SonarrClient};
pub use normalizer::{EventNormalizer, NormalizeError};
pub use queue::{
    create_command_queue, Collaborators, Command, CommandQueue, CommandSink, CommandWorker,
    QueueError, QueueStatus, WorkerSettings,
};
pub use rechecker::Rechecker;
pub use source::{OpenSubtitlesSource, ProviderPool, SubtitleSource};
pub use video::{FileHasher, SceneNameIdentifier};
