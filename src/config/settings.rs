use crate::config::defaults::*;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// 主配置结构
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub registry: RegistryConfig,
    pub jobs: JobsConfig,
    pub drift: DriftConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

/// 关系型存储配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

/// 模型注册表配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub tracking_uri: String,
    pub champion_alias: String,
    /// 模型版本内的模型制品路径
    pub model_artifact_path: String,
    /// 冠军版本所属 run 内的参考数据集路径
    pub reference_artifact_path: String,
    pub download_dir: PathBuf,
    pub timeout_secs: u64,
}

/// 作业配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JobsConfig {
    pub model_name: String,
    /// 预测作业读取待评分批次的查询
    pub batch_query: String,
    pub prediction_table: String,
    pub dataset_report_table: String,
    pub column_report_table: String,
}

/// 漂移检测阈值
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct DriftConfig {
    pub drift_share: f64,
    pub cat_stattest_threshold: f64,
    pub num_stattest_threshold: f64,
}

/// 调度器配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub pipelines: Vec<PipelineConfig>,
}

/// 流水线配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub name: String,
    #[serde(default = "default_hour")]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    pub tasks: Vec<TaskConfig>,
}

/// 任务配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskConfig {
    /// 空操作标记（开始/结束）
    Marker { id: String },
    /// 环境检查：打印当前日期
    PrintDate { id: String },
    /// 进程内预测作业
    Predict { id: String },
    /// 进程内漂移检测作业
    Drift { id: String },
    /// 外部命令（例如容器化作业）
    Command {
        id: String,
        program: String,
        #[serde(default)]
        args: Vec<String>,
        /// `KEY=VALUE` 形式的环境变量
        #[serde(default)]
        env: Vec<String>,
    },
}

impl TaskConfig {
    /// 任务 ID
    pub fn id(&self) -> &str {
        match self {
            Self::Marker { id }
            | Self::PrintDate { id }
            | Self::Predict { id }
            | Self::Drift { id }
            | Self::Command { id, .. } => id,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: Vec<String>,
}

fn default_hour() -> u32 {
    DEFAULT_SCHEDULE_HOUR
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

fn default_retry_delay_secs() -> u64 {
    DEFAULT_RETRY_DELAY_SECS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PG_HOST.to_string(),
            port: DEFAULT_PG_PORT,
            user: DEFAULT_PG_USER.to_string(),
            password: String::new(),
            database: DEFAULT_PG_DATABASE.to_string(),
            max_connections: DEFAULT_PG_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_PG_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            tracking_uri: DEFAULT_TRACKING_URI.to_string(),
            champion_alias: DEFAULT_CHAMPION_ALIAS.to_string(),
            model_artifact_path: DEFAULT_MODEL_ARTIFACT_PATH.to_string(),
            reference_artifact_path: DEFAULT_REFERENCE_ARTIFACT_PATH.to_string(),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            timeout_secs: DEFAULT_REGISTRY_TIMEOUT_SECS,
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            batch_query: DEFAULT_BATCH_QUERY.to_string(),
            prediction_table: DEFAULT_PREDICTION_TABLE.to_string(),
            dataset_report_table: DEFAULT_DATASET_REPORT_TABLE.to_string(),
            column_report_table: DEFAULT_COLUMN_REPORT_TABLE.to_string(),
        }
    }
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            drift_share: DEFAULT_DRIFT_SHARE,
            cat_stattest_threshold: DEFAULT_CAT_STATTEST_THRESHOLD,
            num_stattest_threshold: DEFAULT_NUM_STATTEST_THRESHOLD,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pipelines: vec![
                PipelineConfig::daily("prediction_pipeline", TaskConfig::Predict {
                    id: "predict_task".to_string(),
                }),
                PipelineConfig::daily("drift_detection_pipeline", TaskConfig::Drift {
                    id: "drift_detection_task".to_string(),
                }),
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: DEFAULT_LOG_FORMAT.to_string(),
            output: vec!["stdout".to_string()],
        }
    }
}

impl PipelineConfig {
    /// 默认形状的每日流水线：start → print_date → job → end
    pub fn daily(name: &str, job: TaskConfig) -> Self {
        Self {
            name: name.to_string(),
            hour: DEFAULT_SCHEDULE_HOUR,
            minute: DEFAULT_SCHEDULE_MINUTE,
            retries: DEFAULT_RETRIES,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            tasks: vec![
                TaskConfig::Marker {
                    id: "start_dag".to_string(),
                },
                TaskConfig::PrintDate {
                    id: "print_current_date".to_string(),
                },
                job,
                TaskConfig::Marker {
                    id: "end_dag".to_string(),
                },
            ],
        }
    }

    /// 重试间隔
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl StoreConfig {
    /// 用于日志的连接串（密码已隐去）
    pub fn redacted_url(&self) -> String {
        format!(
            "postgresql://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &str) -> crate::Result<Self> {
        crate::config::loader::load_from_file(path)
    }

    /// 从环境变量加载配置
    pub fn from_env() -> crate::Result<Self> {
        crate::config::loader::load_from_env()
    }

    /// 校验配置
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (name, value) in [
            ("drift.drift_share", self.drift.drift_share),
            ("drift.cat_stattest_threshold", self.drift.cat_stattest_threshold),
            ("drift.num_stattest_threshold", self.drift.num_stattest_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.jobs.model_name.trim().is_empty() {
            return Err(ConfigError::Invalid("jobs.model_name is empty".to_string()));
        }

        let mut names = HashSet::new();
        for pipeline in &self.scheduler.pipelines {
            if !names.insert(pipeline.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate pipeline name: {}",
                    pipeline.name
                )));
            }
            if pipeline.hour > 23 || pipeline.minute > 59 {
                return Err(ConfigError::Invalid(format!(
                    "pipeline {} has invalid schedule {:02}:{:02}",
                    pipeline.name, pipeline.hour, pipeline.minute
                )));
            }
            if pipeline.tasks.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "pipeline {} has no tasks",
                    pipeline.name
                )));
            }
        }

        Ok(())
    }
}
