//! 客户数据模式
//!
//! 特征按三类列组织，顺序固定，预测与漂移检测共用。

/// 客户 ID 列
pub const CUSTOMER_ID_COLUMN: &str = "customerID";

/// 标签列（参考数据集中存在，读取时删除）
pub const TARGET_COLUMN: &str = "Churn";

/// 账单总额列；原始数据中以空白字符串表示缺失
pub const TOTAL_CHARGES_COLUMN: &str = "TotalCharges";

/// 类别列
pub const CATEGORICAL_COLUMNS: [&str; 11] = [
    "gender",
    "MultipleLines",
    "InternetService",
    "OnlineSecurity",
    "OnlineBackup",
    "DeviceProtection",
    "TechSupport",
    "StreamingTV",
    "StreamingMovies",
    "Contract",
    "PaymentMethod",
];

/// 数值列
pub const NUMERICAL_COLUMNS: [&str; 3] = ["tenure", "MonthlyCharges", TOTAL_CHARGES_COLUMN];

/// 二值列
pub const BINARY_COLUMNS: [&str; 5] = [
    "SeniorCitizen",
    "Partner",
    "Dependents",
    "PhoneService",
    "PaperlessBilling",
];

/// 特征列总数
pub const FEATURE_COUNT: usize = CATEGORICAL_COLUMNS.len() + NUMERICAL_COLUMNS.len() + BINARY_COLUMNS.len();

/// 列族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnFamily {
    Categorical,
    Numerical,
    Binary,
}

/// 按固定顺序遍历全部特征列：类别、数值、二值
pub fn feature_columns() -> impl Iterator<Item = (&'static str, ColumnFamily)> {
    CATEGORICAL_COLUMNS
        .iter()
        .map(|c| (*c, ColumnFamily::Categorical))
        .chain(NUMERICAL_COLUMNS.iter().map(|c| (*c, ColumnFamily::Numerical)))
        .chain(BINARY_COLUMNS.iter().map(|c| (*c, ColumnFamily::Binary)))
}

/// 查找列所属的列族
pub fn family_of(column: &str) -> Option<ColumnFamily> {
    feature_columns().find(|(name, _)| *name == column).map(|(_, f)| f)
}
