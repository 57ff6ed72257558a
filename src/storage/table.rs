//! 表格数据
//!
//! 存储层与作业之间交换的行列结构。列带有类型，追加写入时据此建表与绑定空值。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 列类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Int,
    Float,
    Text,
    Bool,
    Date,
    Timestamp,
}

impl ColumnKind {
    /// 对应的 Postgres 列类型
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Int => "BIGINT",
            Self::Float => "DOUBLE PRECISION",
            Self::Text => "TEXT",
            Self::Bool => "BOOLEAN",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMPTZ",
        }
    }
}

/// 单元格取值
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// 文本表示；空值返回 None
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Text(v) => Some(v.clone()),
            Self::Bool(v) => Some(v.to_string()),
            Self::Date(v) => Some(v.to_string()),
            Self::Timestamp(v) => Some(v.to_rfc3339()),
        }
    }

    /// 数值表示；文本会尝试解析
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::Text(v) => v.trim().parse().ok(),
            _ => None,
        }
    }

    /// 整数表示；只接受没有小数部分的数
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Self::Bool(v) => Some(i64::from(*v)),
            Self::Text(v) => {
                let trimmed = v.trim();
                trimmed.parse::<i64>().ok().or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.fract() == 0.0)
                        .map(|f| f as i64)
                })
            }
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// 列定义
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// 表格
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// 创建空表
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// 追加一行
    ///
    /// # Panics
    ///
    /// 行宽与列数不一致时 panic。
    pub fn push_row(&mut self, row: Vec<Value>) {
        assert_eq!(
            row.len(),
            self.columns.len(),
            "row width does not match table columns"
        );
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 按名称查找列下标
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// 删除一列；列不存在时不做任何事
    pub fn drop_column(&mut self, name: &str) {
        if let Some(index) = self.column_index(name) {
            self.columns.remove(index);
            for row in &mut self.rows {
                row.remove(index);
            }
        }
    }

    /// 拼接另一张同构表的行
    pub fn extend(&mut self, other: Table) {
        if self.columns.is_empty() && self.rows.is_empty() {
            *self = other;
            return;
        }
        assert_eq!(self.columns, other.columns, "table schemas differ");
        self.rows.extend(other.rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new(vec![
            Column::new("customerID", ColumnKind::Text),
            Column::new("tenure", ColumnKind::Int),
            Column::new("Churn", ColumnKind::Text),
        ]);
        table.push_row(vec!["0001".into(), 12i64.into(), "No".into()]);
        table.push_row(vec!["0002".into(), Value::Null, "Yes".into()]);
        table
    }

    #[test]
    fn test_drop_column() {
        let mut table = sample();
        table.drop_column("Churn");
        assert_eq!(table.columns().len(), 2);
        assert_eq!(table.rows()[1], vec![Value::from("0002"), Value::Null]);

        table.drop_column("missing");
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::Text(" 29.85 ".to_string()).to_f64(), Some(29.85));
        assert_eq!(Value::Text(" ".to_string()).to_f64(), None);
        assert_eq!(Value::Text("12.0".to_string()).to_i64(), Some(12));
        assert_eq!(Value::Float(1.5).to_i64(), None);
        assert_eq!(Value::Int(3).to_text().as_deref(), Some("3"));
        assert_eq!(Value::from(None::<String>), Value::Null);
    }

    #[test]
    fn test_extend_empty() {
        let mut table = Table::default();
        table.extend(sample());
        assert_eq!(table.len(), 2);
        table.extend(sample());
        assert_eq!(table.len(), 4);
    }

    #[test]
    #[should_panic]
    fn test_push_row_width_mismatch() {
        let mut table = sample();
        table.push_row(vec![Value::Null]);
    }
}
