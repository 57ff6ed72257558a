//! 漂移报告行

use crate::storage::table::{Column, ColumnKind, Table, Value};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 数据集级漂移报告（每次运行一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDriftReport {
    /// 数据集漂移阈值
    pub drift_share: f64,
    pub number_of_columns: usize,
    pub number_of_drifted_columns: usize,
    pub share_of_drifted_columns: f64,
    pub dataset_drift: bool,
    /// 被检测数据所属的逻辑日期
    pub date_dataset: NaiveDate,
    /// 报告生成日期
    pub date_report: NaiveDate,
}

impl DatasetDriftReport {
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(vec![
            Column::new("drift_share", ColumnKind::Float),
            Column::new("number_of_columns", ColumnKind::Int),
            Column::new("number_of_drifted_columns", ColumnKind::Int),
            Column::new("share_of_drifted_columns", ColumnKind::Float),
            Column::new("dataset_drift", ColumnKind::Bool),
            Column::new("date_dataset", ColumnKind::Date),
            Column::new("date_report", ColumnKind::Date),
        ]);
        table.push_row(vec![
            Value::Float(self.drift_share),
            Value::Int(self.number_of_columns as i64),
            Value::Int(self.number_of_drifted_columns as i64),
            Value::Float(self.share_of_drifted_columns),
            Value::Bool(self.dataset_drift),
            Value::Date(self.date_dataset),
            Value::Date(self.date_report),
        ]);
        table
    }
}

/// 列级漂移报告（每列一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDriftReport {
    pub column_name: String,
    /// `cat` 或 `num`
    pub column_type: String,
    pub stattest_name: String,
    pub drift_score: f64,
    pub drift_detected: bool,
    pub date_dataset: NaiveDate,
    pub date_report: NaiveDate,
}

impl ColumnDriftReport {
    pub fn to_table(reports: &[Self]) -> Table {
        let mut table = Table::new(vec![
            Column::new("column_name", ColumnKind::Text),
            Column::new("column_type", ColumnKind::Text),
            Column::new("stattest_name", ColumnKind::Text),
            Column::new("drift_score", ColumnKind::Float),
            Column::new("drift_detected", ColumnKind::Bool),
            Column::new("date_dataset", ColumnKind::Date),
            Column::new("date_report", ColumnKind::Date),
        ]);
        for report in reports {
            table.push_row(vec![
                Value::Text(report.column_name.clone()),
                Value::Text(report.column_type.clone()),
                Value::Text(report.stattest_name.clone()),
                Value::Float(report.drift_score),
                Value::Bool(report.drift_detected),
                Value::Date(report.date_dataset),
                Value::Date(report.date_report),
            ]);
        }
        table
    }
}
