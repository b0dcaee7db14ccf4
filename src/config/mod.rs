//! Configuration loading and validation.

mod settings;

pub use settings::{AuthConfig, Config, ServerConfig, StorageConfig, WorkerConfig};
