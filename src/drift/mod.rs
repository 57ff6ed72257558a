pub mod report;
pub mod stattests;

pub use report::{compute_drift, ColumnDrift, DriftReport};
pub use stattests::StatTest;

use crate::models::schema::{BINARY_COLUMNS, CATEGORICAL_COLUMNS, NUMERICAL_COLUMNS};

/// 列在漂移检测中的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Categorical,
    Numerical,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Categorical => "cat",
            Self::Numerical => "num",
        }
    }
}

/// 列映射：声明哪些特征按数值处理，哪些按类别处理
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub numerical_features: Vec<String>,
    pub categorical_features: Vec<String>,
}

impl Default for ColumnMapping {
    /// 数值列为 tenure、月费与总额；其余类别列与二值列均按类别处理
    fn default() -> Self {
        Self {
            numerical_features: NUMERICAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
            categorical_features: CATEGORICAL_COLUMNS
                .iter()
                .chain(BINARY_COLUMNS.iter())
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl ColumnMapping {
    /// 按报告顺序列出 (列名, 类型)
    pub fn columns(&self) -> impl Iterator<Item = (&str, ColumnType)> {
        self.numerical_features
            .iter()
            .map(|c| (c.as_str(), ColumnType::Numerical))
            .chain(
                self.categorical_features
                    .iter()
                    .map(|c| (c.as_str(), ColumnType::Categorical)),
            )
    }

    pub fn len(&self) -> usize {
        self.numerical_features.len() + self.categorical_features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
