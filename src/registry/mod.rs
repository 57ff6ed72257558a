pub mod client;
pub mod mlflow;

pub use client::{ChampionModel, ModelRegistry, RegistryHealth};
pub use mlflow::MlflowRegistry;
