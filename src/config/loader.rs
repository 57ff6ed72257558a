use crate::config::defaults::{ENV_PG_HOST, ENV_PG_PASSWORD, ENV_TRACKING_URI};
use crate::config::settings::Config;
use crate::error::ConfigError;
use crate::Result;
use config::{Config as ConfigBuilder, Environment, File};

/// 从文件加载配置
pub fn load_from_file(path: &str) -> Result<Config> {
    let builder = ConfigBuilder::builder()
        .add_source(File::with_name(path))
        .add_source(environment());

    finish(builder)
}

/// 从环境变量加载配置
pub fn load_from_env() -> Result<Config> {
    let builder = ConfigBuilder::builder().add_source(environment());

    finish(builder)
}

fn environment() -> Environment {
    Environment::with_prefix("CHURNFLOW")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

fn finish(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<Config> {
    let mut config: Config = builder
        .build()
        .map_err(|e| ConfigError::LoadFailed(e.to_string()))?
        .try_deserialize()
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

    apply_deployment_env(&mut config, |key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
}

/// 部署环境变量覆盖（POSTGRES_HOST、PG_APP_PWD、MLFLOW_TRACKING_URI）
pub fn apply_deployment_env<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(ENV_PG_HOST).filter(|v| !v.is_empty()) {
        config.store.host = host;
    }
    if let Some(password) = lookup(ENV_PG_PASSWORD) {
        config.store.password = password;
    }
    if let Some(uri) = lookup(ENV_TRACKING_URI).filter(|v| !v.is_empty()) {
        config.registry.tracking_uri = uri;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::TaskConfig;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_deployment_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("POSTGRES_HOST", "postgres"),
            ("PG_APP_PWD", "secret"),
            ("MLFLOW_TRACKING_URI", "http://mlflow-server:5000"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_deployment_env(&mut config, |k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.store.host, "postgres");
        assert_eq!(config.store.password, "secret");
        assert_eq!(config.registry.tracking_uri, "http://mlflow-server:5000");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[jobs]
model_name = "churn_v2"

[drift]
drift_share = 0.5

[[scheduler.pipelines]]
name = "nightly"
hour = 3
tasks = [
  {{ kind = "marker", id = "start" }},
  {{ kind = "command", id = "predict", program = "docker", args = ["run", "churnflow"] }},
]
"#
        )
        .unwrap();

        let config = load_from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.jobs.model_name, "churn_v2");
        assert_eq!(config.jobs.prediction_table, "prediction_logs");
        assert_eq!(config.drift.drift_share, 0.5);
        assert_eq!(config.drift.cat_stattest_threshold, 0.2);

        let pipeline = &config.scheduler.pipelines[0];
        assert_eq!(pipeline.name, "nightly");
        assert_eq!(pipeline.hour, 3);
        assert_eq!(pipeline.retries, 1);
        assert!(matches!(pipeline.tasks[1], TaskConfig::Command { .. }));
    }
}
