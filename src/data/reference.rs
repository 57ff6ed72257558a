//! 参考数据集读取

use crate::error::TransformError;
use crate::models::schema::TARGET_COLUMN;
use crate::models::CustomerRecord;
use crate::storage::table::{Column, ColumnKind, Table, Value};
use csv::ReaderBuilder;
use std::path::Path;

/// 读取 CSV 为全文本表格
///
/// 单元格原样保留（不 trim），账单总额的空白占位符因此得以保留。
pub fn read_csv_table(path: &Path) -> Result<Table, TransformError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| TransformError::Reference(format!("{}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| TransformError::Reference(e.to_string()))?
        .clone();

    let mut table = Table::new(
        headers
            .iter()
            .map(|h| Column::new(h, ColumnKind::Text))
            .collect(),
    );

    for record in reader.records() {
        let record = record.map_err(|e| TransformError::Reference(e.to_string()))?;
        table.push_row(record.iter().map(|v| Value::Text(v.to_string())).collect());
    }

    Ok(table)
}

/// 读取参考数据集并删除标签列
pub fn read_reference_dataset(path: &Path) -> Result<Vec<CustomerRecord>, TransformError> {
    let mut table = read_csv_table(path)?;
    table.drop_column(TARGET_COLUMN);
    tracing::info!(
        path = %path.display(),
        rows = table.len(),
        "Reference dataset loaded"
    );
    CustomerRecord::from_table(&table)
}
