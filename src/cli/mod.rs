pub mod commands;

use crate::config::Config;
use crate::error::ChurnflowError;
use crate::registry::{MlflowRegistry, ModelRegistry};
use crate::storage::{DataStore, PostgresStore};
use crate::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::sync::Arc;

/// Churnflow CLI
#[derive(Parser)]
#[command(name = "churnflow")]
#[command(about = "Batch churn scoring and drift detection against a model registry")]
#[command(version)]
pub struct Cli {
    /// 配置文件路径（TOML/YAML/JSON）；缺省时只读环境变量
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI 命令
#[derive(Subcommand)]
pub enum Command {
    /// 对一批客户数据评分
    Predict,
    /// 检测某一天评分数据的漂移
    Drift {
        /// 逻辑日期（YYYY-MM-DD），默认 UTC 昨天
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// 运行每日调度器
    Schedule {
        /// 立即运行指定流水线一次后退出
        #[arg(long, value_name = "PIPELINE")]
        once: Option<String>,
    },
    /// 检查存储与注册表是否可达
    Health,
}

/// 命令共享的依赖
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn DataStore>,
    pub registry: Arc<dyn ModelRegistry>,
}

impl AppContext {
    /// 按配置构建 Postgres 存储与 MLflow 注册表
    pub fn from_config(config: Config) -> Result<Self> {
        let store = PostgresStore::connect_lazy(&config.store);
        let registry = MlflowRegistry::new(&config.registry).map_err(ChurnflowError::from)?;

        tracing::info!(
            store = %config.store.redacted_url(),
            registry = %registry.base_url(),
            "Context initialised"
        );

        Ok(Self::with_dependencies(
            config,
            Arc::new(store),
            Arc::new(registry),
        ))
    }

    /// 使用给定依赖
    pub fn with_dependencies(
        config: Config,
        store: Arc<dyn DataStore>,
        registry: Arc<dyn ModelRegistry>,
    ) -> Self {
        Self {
            config,
            store,
            registry,
        }
    }
}

/// 加载配置：指定文件时读文件，否则只读环境变量
pub fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_drift_date() {
        let cli = Cli::parse_from(["churnflow", "drift", "--date", "2024-05-01"]);
        match cli.command {
            Some(Command::Drift { date }) => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 1));
            }
            _ => panic!("expected drift command"),
        }
    }

    #[test]
    fn test_parse_global_config_and_default_command() {
        let cli = Cli::parse_from(["churnflow", "--config", "churnflow.toml"]);
        assert_eq!(cli.config.as_deref(), Some("churnflow.toml"));
        assert!(cli.command.is_none());

        let cli = Cli::parse_from(["churnflow", "schedule", "--once", "prediction_pipeline"]);
        assert!(matches!(
            cli.command,
            Some(Command::Schedule { once: Some(ref name) }) if name == "prediction_pipeline"
        ));
    }

    #[test]
    fn test_invalid_date_rejected() {
        assert!(Cli::try_parse_from(["churnflow", "drift", "--date", "yesterday"]).is_err());
    }
}
