pub mod defaults;
pub mod loader;
pub mod settings;

pub use settings::{
    Config, DriftConfig, JobsConfig, LoggingConfig, PipelineConfig, RegistryConfig,
    SchedulerConfig, StoreConfig, TaskConfig,
};
