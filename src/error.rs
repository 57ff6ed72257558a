use thiserror::Error;

/// churnflow 错误类型
#[derive(Debug, Error)]
pub enum ChurnflowError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Drift error: {0}")]
    Drift(#[from] DriftError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// 错误分类
///
/// 作业根据分类决定是降级为空操作还是中止进程。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 存储或注册表不可达
    Connectivity,
    /// 模型、别名、数据或制品不存在
    NotFound,
    /// 数据形状异常或内部缺陷，应当中止
    Defect,
}

impl ChurnflowError {
    /// 错误分类
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Registry(e) => e.class(),
            Self::Store(e) => e.class(),
            _ => ErrorClass::Defect,
        }
    }
}

/// 模型注册表错误
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registered model not found: {0}")]
    ModelNotFound(String),

    #[error("No version of model '{model}' carries alias '{alias}'")]
    NoChampionAlias { model: String, alias: String },

    #[error("Artifact unavailable: {0}")]
    ArtifactUnavailable(String),

    #[error("Registry unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid registry response: {0}")]
    InvalidResponse(String),

    #[error("Failed to load model artifact: {0}")]
    Model(#[from] ModelError),
}

impl RegistryError {
    /// 错误分类
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ModelNotFound(_) | Self::NoChampionAlias { .. } | Self::ArtifactUnavailable(_) => {
                ErrorClass::NotFound
            }
            Self::Unreachable(_) => ErrorClass::Connectivity,
            Self::InvalidResponse(_) | Self::Model(_) => ErrorClass::Defect,
        }
    }
}

/// 数据存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to connect to store: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Failed to write table '{table}': {message}")]
    Write { table: String, message: String },

    #[error("Unsupported column type '{column_type}' for column '{column}'")]
    UnsupportedType { column: String, column_type: String },
}

impl StoreError {
    /// 错误分类
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Connection(_) | Self::Query(_) | Self::Write { .. } => ErrorClass::Connectivity,
            Self::UnsupportedType { .. } => ErrorClass::Defect,
        }
    }
}

/// 预处理错误
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid value {value:?} in column '{column}' (row {row})")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Failed to read reference dataset: {0}")]
    Reference(String),
}

/// 模型错误
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Unsupported model kind: {0}")]
    UnsupportedKind(String),

    #[error("Unknown feature in model artifact: {0}")]
    UnknownFeature(String),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),
}

/// 漂移检测错误
#[derive(Debug, Error)]
pub enum DriftError {
    #[error("{which} dataset is empty")]
    EmptyDataset { which: &'static str },

    #[error("Column '{0}' is not part of the feature schema")]
    UnknownColumn(String),

    #[error("Column '{0}' is mapped as numerical but holds text values")]
    NotNumeric(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 调度错误
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Unknown pipeline: {0}")]
    UnknownPipeline(String),

    #[error("Task '{task}' failed: {message}")]
    TaskFailed { task: String, message: String },

    #[error("Pipeline '{pipeline}' failed at task '{task}'")]
    RunFailed { pipeline: String, task: String },

    #[error("Invalid schedule {hour:02}:{minute:02}")]
    InvalidSchedule { hour: u32, minute: u32 },

    #[error("Invalid task '{task}': {message}")]
    InvalidTask { task: String, message: String },
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, ChurnflowError>;
