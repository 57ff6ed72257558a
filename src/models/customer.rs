//! 客户记录
//!
//! 原始客户行、清洗后的特征行与带预测结果的评分行。

use crate::error::TransformError;
use crate::models::schema::*;
use crate::storage::table::{Column, ColumnKind, Table, Value};
use chrono::{DateTime, Utc};
use std::hash::{Hash, Hasher};

/// 原始客户记录
///
/// 各数组按 `schema` 中对应列族的顺序存放。`total_charges` 保留原始文本，
/// 空白占位符在预处理阶段剔除。
#[derive(Debug, Clone)]
pub struct CustomerRecord {
    pub customer_id: Option<String>,
    pub categorical: [String; CATEGORICAL_COLUMNS.len()],
    pub tenure: i64,
    pub monthly_charges: f64,
    pub total_charges: String,
    /// 二值列原始文本（"Yes"/"No" 或 "1"/"0"）
    pub binary: [String; BINARY_COLUMNS.len()],
}

impl PartialEq for CustomerRecord {
    fn eq(&self, other: &Self) -> bool {
        self.customer_id == other.customer_id
            && self.categorical == other.categorical
            && self.tenure == other.tenure
            && self.monthly_charges.to_bits() == other.monthly_charges.to_bits()
            && self.total_charges == other.total_charges
            && self.binary == other.binary
    }
}

impl Eq for CustomerRecord {}

impl Hash for CustomerRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.customer_id.hash(state);
        self.categorical.hash(state);
        self.tenure.hash(state);
        self.monthly_charges.to_bits().hash(state);
        self.total_charges.hash(state);
        self.binary.hash(state);
    }
}

impl CustomerRecord {
    /// 从表格解析客户记录
    ///
    /// 多余的列（标签、预测列等）被忽略；缺少特征列或数值无法解析时返回错误。
    pub fn from_table(table: &Table) -> Result<Vec<Self>, TransformError> {
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let index = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| TransformError::MissingColumn(name.to_string()))
        };

        let id_index = table.column_index(CUSTOMER_ID_COLUMN);
        let categorical_index = CATEGORICAL_COLUMNS.map(index);
        let binary_index = BINARY_COLUMNS.map(index);
        let tenure_index = index(NUMERICAL_COLUMNS[0])?;
        let monthly_index = index(NUMERICAL_COLUMNS[1])?;
        let total_index = index(NUMERICAL_COLUMNS[2])?;

        let categorical_index = collect_indices(categorical_index)?;
        let binary_index = collect_indices(binary_index)?;

        table
            .rows()
            .iter()
            .enumerate()
            .map(|(row_number, row)| {
                let tenure = row[tenure_index].to_i64().ok_or_else(|| {
                    invalid(NUMERICAL_COLUMNS[0], row_number, &row[tenure_index])
                })?;
                let monthly_charges = row[monthly_index].to_f64().ok_or_else(|| {
                    invalid(NUMERICAL_COLUMNS[1], row_number, &row[monthly_index])
                })?;

                Ok(Self {
                    customer_id: id_index.and_then(|i| row[i].to_text()),
                    categorical: categorical_index.map(|i| text(&row[i])),
                    tenure,
                    monthly_charges,
                    total_charges: text(&row[total_index]),
                    binary: binary_index.map(|i| text(&row[i])),
                })
            })
            .collect()
    }

    /// 原始列定义
    pub fn columns() -> Vec<Column> {
        let mut columns = vec![Column::new(CUSTOMER_ID_COLUMN, ColumnKind::Text)];
        columns.extend(
            CATEGORICAL_COLUMNS
                .iter()
                .map(|c| Column::new(*c, ColumnKind::Text)),
        );
        columns.push(Column::new(NUMERICAL_COLUMNS[0], ColumnKind::Int));
        columns.push(Column::new(NUMERICAL_COLUMNS[1], ColumnKind::Float));
        columns.push(Column::new(NUMERICAL_COLUMNS[2], ColumnKind::Text));
        columns.extend(BINARY_COLUMNS.iter().map(|c| Column::new(*c, ColumnKind::Text)));
        columns
    }

    /// 与 `columns()` 对齐的取值
    pub fn values(&self) -> Vec<Value> {
        let mut values = vec![Value::from(self.customer_id.clone())];
        values.extend(self.categorical.iter().cloned().map(Value::Text));
        values.push(Value::Int(self.tenure));
        values.push(Value::Float(self.monthly_charges));
        values.push(Value::Text(self.total_charges.clone()));
        values.extend(self.binary.iter().cloned().map(Value::Text));
        values
    }

    /// 转换回表格
    pub fn to_table(records: &[Self]) -> Table {
        let mut table = Table::new(Self::columns());
        for record in records {
            table.push_row(record.values());
        }
        table
    }
}

fn collect_indices<const N: usize>(
    indices: [Result<usize, TransformError>; N],
) -> Result<[usize; N], TransformError> {
    let mut out = [0usize; N];
    for (slot, index) in out.iter_mut().zip(indices) {
        *slot = index?;
    }
    Ok(out)
}

fn text(value: &Value) -> String {
    value.to_text().unwrap_or_default()
}

fn invalid(column: &str, row: usize, value: &Value) -> TransformError {
    TransformError::InvalidValue {
        column: column.to_string(),
        row,
        value: value.to_text().unwrap_or_else(|| "NULL".to_string()),
    }
}

/// 特征取值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    Category(&'a str),
    Number(f64),
    Flag(u8),
}

/// 清洗后的特征行
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub categorical: [String; CATEGORICAL_COLUMNS.len()],
    pub numerical: [f64; NUMERICAL_COLUMNS.len()],
    pub binary: [u8; BINARY_COLUMNS.len()],
}

impl FeatureRow {
    /// 按列名取值
    pub fn value(&self, column: &str) -> Option<FeatureValue<'_>> {
        if let Some(i) = CATEGORICAL_COLUMNS.iter().position(|c| *c == column) {
            return Some(FeatureValue::Category(&self.categorical[i]));
        }
        if let Some(i) = NUMERICAL_COLUMNS.iter().position(|c| *c == column) {
            return Some(FeatureValue::Number(self.numerical[i]));
        }
        BINARY_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| FeatureValue::Flag(self.binary[i]))
    }
}

/// 评分记录
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub customer: CustomerRecord,
    pub prediction: u8,
    pub probability: f64,
    pub model_name: String,
    pub model_version: String,
    pub prediction_date: DateTime<Utc>,
}

impl ScoredRecord {
    /// 预测日志表的列定义
    pub fn columns() -> Vec<Column> {
        let mut columns = CustomerRecord::columns();
        columns.extend([
            Column::new("prediction", ColumnKind::Int),
            Column::new("probability", ColumnKind::Float),
            Column::new("model_name", ColumnKind::Text),
            Column::new("model_version", ColumnKind::Text),
            Column::new("prediction_date", ColumnKind::Timestamp),
        ]);
        columns
    }

    /// 转换为预测日志表格
    pub fn to_table(records: &[Self]) -> Table {
        let mut table = Table::new(Self::columns());
        for record in records {
            let mut values = record.customer.values();
            values.extend([
                Value::Int(i64::from(record.prediction)),
                Value::Float(record.probability),
                Value::Text(record.model_name.clone()),
                Value::Text(record.model_version.clone()),
                Value::Timestamp(record.prediction_date),
            ]);
            table.push_row(values);
        }
        table
    }
}
