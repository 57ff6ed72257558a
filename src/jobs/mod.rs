//! 批处理作业
//!
//! 作业返回类型化的 [`JobOutcome`]：可预见的缺数据情形（空批次、存储或注册表不可达、
//! 模型缺失、写入失败）降级为 `Skipped`，真正的缺陷以错误返回。

pub mod drift;
pub mod predict;

pub use drift::{yesterday, DriftJob};
pub use predict::PredictionJob;

use crate::Result;
use async_trait::async_trait;
use std::fmt;

/// 作业结果
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed(JobReport),
    Skipped(SkipReason),
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(report) => write!(f, "completed ({})", report),
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
        }
    }
}

/// 成功运行的统计
#[derive(Debug, Clone, PartialEq)]
pub enum JobReport {
    Prediction {
        rows_read: usize,
        rows_scored: usize,
        rows_written: u64,
    },
    Drift {
        rows_read: usize,
        reference_rows: usize,
        number_of_drifted_columns: usize,
        dataset_drift: bool,
        rows_written: u64,
    },
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prediction {
                rows_read,
                rows_scored,
                rows_written,
            } => write!(
                f,
                "read {}, scored {}, written {}",
                rows_read, rows_scored, rows_written
            ),
            Self::Drift {
                rows_read,
                reference_rows,
                number_of_drifted_columns,
                dataset_drift,
                rows_written,
            } => write!(
                f,
                "read {}, reference {}, drifted columns {}, dataset drift {}, written {}",
                rows_read, reference_rows, number_of_drifted_columns, dataset_drift, rows_written
            ),
        }
    }
}

/// 跳过原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 查询结果为空，或清洗后没有剩余行
    EmptyBatch,
    StoreUnavailable(String),
    ModelUnavailable(String),
    ReferenceUnavailable(String),
    WriteFailed { table: String, message: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBatch => write!(f, "empty batch"),
            Self::StoreUnavailable(e) => write!(f, "store unavailable: {}", e),
            Self::ModelUnavailable(e) => write!(f, "model unavailable: {}", e),
            Self::ReferenceUnavailable(e) => write!(f, "reference dataset unavailable: {}", e),
            Self::WriteFailed { table, message } => {
                write!(f, "write to '{}' failed: {}", table, message)
            }
        }
    }
}

/// 可被调度器调用的作业
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self) -> Result<JobOutcome>;
}
