//! 预处理
//!
//! 预测作业与漂移检测作业共用同一个变换，保证两边比较的是同样清洗过的数据。

use crate::error::TransformError;
use crate::models::schema::{BINARY_COLUMNS, TOTAL_CHARGES_COLUMN};
use crate::models::{CustomerRecord, FeatureRow};
use std::collections::HashSet;

/// 清洗结果
///
/// `records[i]` 是 `features[i]` 的来源行。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanBatch {
    pub records: Vec<CustomerRecord>,
    pub features: Vec<FeatureRow>,
}

impl CleanBatch {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// 清洗一批原始客户记录
///
/// 1. 去除完全重复的行（保留首次出现）
/// 2. 去除账单总额为空白占位符的行
/// 3. 投影到固定特征列
/// 4. 二值列 "Yes"/"No" 映射为 1/0
pub fn transform(rows: &[CustomerRecord]) -> Result<CleanBatch, TransformError> {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut batch = CleanBatch::default();

    for (row_number, record) in rows.iter().enumerate() {
        if !seen.insert(record) {
            continue;
        }
        if is_blank(&record.total_charges) {
            continue;
        }

        let total_charges = record.total_charges.trim().parse::<f64>().map_err(|_| {
            TransformError::InvalidValue {
                column: TOTAL_CHARGES_COLUMN.to_string(),
                row: row_number,
                value: record.total_charges.clone(),
            }
        })?;

        let mut binary = [0u8; BINARY_COLUMNS.len()];
        for (i, (slot, raw)) in binary.iter_mut().zip(&record.binary).enumerate() {
            *slot = binary_flag(raw).ok_or_else(|| TransformError::InvalidValue {
                column: BINARY_COLUMNS[i].to_string(),
                row: row_number,
                value: raw.clone(),
            })?;
        }

        batch.features.push(FeatureRow {
            categorical: record.categorical.clone(),
            numerical: [record.tenure as f64, record.monthly_charges, total_charges],
            binary,
        });
        batch.records.push(record.clone());
    }

    Ok(batch)
}

/// 空白占位符：空串或只含空白字符
fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn binary_flag(value: &str) -> Option<u8> {
    match value.trim() {
        "Yes" | "1" => Some(1),
        "No" | "0" => Some(0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, total: &str) -> CustomerRecord {
        CustomerRecord {
            customer_id: Some(id.to_string()),
            categorical: [
                "Male",
                "No phone service",
                "DSL",
                "Yes",
                "No",
                "Yes",
                "No",
                "No",
                "No",
                "One year",
                "Mailed check",
            ]
            .map(String::from),
            tenure: 34,
            monthly_charges: 56.95,
            total_charges: total.to_string(),
            binary: ["0", "No", "No", "Yes", "No"].map(String::from),
        }
    }

    #[test]
    fn test_ten_rows_two_duplicates_one_blank() {
        let mut rows: Vec<_> = (0..8).map(|i| record(&format!("c{}", i), "1889.5")).collect();
        rows[7].total_charges = " ".to_string();
        rows.push(rows[0].clone());
        rows.push(rows[3].clone());
        assert_eq!(rows.len(), 10);

        let batch = transform(&rows).unwrap();
        assert_eq!(batch.len(), 7);
        assert_eq!(batch.records.len(), batch.features.len());
    }

    #[test]
    fn test_first_duplicate_kept() {
        let rows = vec![record("a", "10"), record("b", "20"), record("a", "10")];
        let batch = transform(&rows).unwrap();
        let ids: Vec<_> = batch
            .records
            .iter()
            .map(|r| r.customer_id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_binary_mapping() {
        let batch = transform(&[record("a", "1889.5")]).unwrap();
        assert_eq!(batch.features[0].binary, [0, 0, 0, 1, 0]);
        assert!(batch.features.iter().all(|f| f.binary.iter().all(|b| *b <= 1)));
        assert_eq!(batch.features[0].numerical, [34.0, 56.95, 1889.5]);
    }

    #[test]
    fn test_unexpected_binary_value_is_error() {
        let mut row = record("a", "10");
        row.binary[1] = "Maybe".to_string();
        assert!(matches!(
            transform(&[row]),
            Err(TransformError::InvalidValue { column, .. }) if column == "Partner"
        ));
    }

    #[test]
    fn test_unparseable_total_charges_is_error() {
        assert!(transform(&[record("a", "n/a")]).is_err());
    }

    #[test]
    fn test_idempotent_on_clean_records() {
        let rows = vec![record("a", "10"), record("a", "10"), record("b", " ")];
        let first = transform(&rows).unwrap();
        let second = transform(&first.records).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input() {
        assert!(transform(&[]).unwrap().is_empty());
    }
}
