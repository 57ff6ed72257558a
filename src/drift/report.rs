//! 漂移报告计算

use super::stattests::{self, StatTest};
use super::{ColumnMapping, ColumnType};
use crate::config::DriftConfig;
use crate::error::DriftError;
use crate::models::{ColumnDriftReport, DatasetDriftReport, FeatureRow, FeatureValue};
use chrono::NaiveDate;
use std::collections::HashSet;

/// 单列检验结果
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDrift {
    pub column_name: String,
    pub column_type: ColumnType,
    pub stattest: StatTest,
    pub threshold: f64,
    pub drift_score: f64,
    pub drift_detected: bool,
}

/// 一次漂移检测的完整结果
#[derive(Debug, Clone, PartialEq)]
pub struct DriftReport {
    pub drift_share: f64,
    pub columns: Vec<ColumnDrift>,
    pub number_of_drifted_columns: usize,
    pub share_of_drifted_columns: f64,
    pub dataset_drift: bool,
}

impl DriftReport {
    /// 由逐列结果汇总数据集级结论
    ///
    /// 漂移列占比严格大于 `drift_share` 时判定数据集漂移。
    pub fn summarize(columns: Vec<ColumnDrift>, drift_share: f64) -> Self {
        let drifted = columns.iter().filter(|c| c.drift_detected).count();
        let share = if columns.is_empty() {
            0.0
        } else {
            drifted as f64 / columns.len() as f64
        };

        Self {
            drift_share,
            number_of_drifted_columns: drifted,
            share_of_drifted_columns: share,
            dataset_drift: share > drift_share,
            columns,
        }
    }

    pub fn number_of_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn dataset_report(&self, date_dataset: NaiveDate, date_report: NaiveDate) -> DatasetDriftReport {
        DatasetDriftReport {
            drift_share: self.drift_share,
            number_of_columns: self.number_of_columns(),
            number_of_drifted_columns: self.number_of_drifted_columns,
            share_of_drifted_columns: self.share_of_drifted_columns,
            dataset_drift: self.dataset_drift,
            date_dataset,
            date_report,
        }
    }

    pub fn column_reports(
        &self,
        date_dataset: NaiveDate,
        date_report: NaiveDate,
    ) -> Vec<ColumnDriftReport> {
        self.columns
            .iter()
            .map(|c| ColumnDriftReport {
                column_name: c.column_name.clone(),
                column_type: c.column_type.as_str().to_string(),
                stattest_name: c.stattest.name().to_string(),
                drift_score: c.drift_score,
                drift_detected: c.drift_detected,
                date_dataset,
                date_report,
            })
            .collect()
    }
}

/// 比较参考集与当前集的特征分布
pub fn compute_drift(
    reference: &[FeatureRow],
    current: &[FeatureRow],
    mapping: &ColumnMapping,
    options: &DriftConfig,
) -> Result<DriftReport, DriftError> {
    if reference.is_empty() {
        return Err(DriftError::EmptyDataset { which: "reference" });
    }
    if current.is_empty() {
        return Err(DriftError::EmptyDataset { which: "current" });
    }

    let mut columns = Vec::with_capacity(mapping.len());
    for (name, column_type) in mapping.columns() {
        let threshold = match column_type {
            ColumnType::Categorical => options.cat_stattest_threshold,
            ColumnType::Numerical => options.num_stattest_threshold,
        };
        let result = match column_type {
            ColumnType::Categorical => {
                let reference = text_values(reference, name)?;
                let current = text_values(current, name)?;
                test_categories(&reference, &current, false, reference.len())
            }
            ColumnType::Numerical => {
                let reference = numeric_values(reference, name)?;
                let current = numeric_values(current, name)?;
                test_numbers(&reference, &current)
            }
        };
        let (stattest, score) = result;

        tracing::debug!(
            column = name,
            stattest = stattest.name(),
            score,
            "Column drift computed"
        );

        columns.push(ColumnDrift {
            column_name: name.to_string(),
            column_type,
            stattest,
            threshold,
            drift_score: score,
            drift_detected: stattest.detected(score, threshold),
        });
    }

    Ok(DriftReport::summarize(columns, options.drift_share))
}

fn test_categories(
    reference: &[String],
    current: &[String],
    numerical: bool,
    reference_rows: usize,
) -> (StatTest, f64) {
    let reference: Vec<&str> = reference.iter().map(String::as_str).collect();
    let current: Vec<&str> = current.iter().map(String::as_str).collect();
    let n_unique = reference
        .iter()
        .chain(&current)
        .collect::<HashSet<_>>()
        .len();

    let stattest = stattests::default_test(numerical, reference_rows, n_unique);
    let score = match stattest {
        StatTest::ChiSquare => stattests::chi_square_test(&reference, &current),
        StatTest::ZTest => stattests::z_test(&reference, &current),
        _ => stattests::jensen_shannon_categorical(&reference, &current),
    };
    (stattest, score)
}

fn test_numbers(reference: &[f64], current: &[f64]) -> (StatTest, f64) {
    let n_unique = reference
        .iter()
        .chain(current)
        .map(|v| v.to_bits())
        .collect::<HashSet<_>>()
        .len();

    let stattest = stattests::default_test(true, reference.len(), n_unique);
    match stattest {
        StatTest::KolmogorovSmirnov => (stattest, stattests::ks_test(reference, current)),
        StatTest::Wasserstein => (stattest, stattests::wasserstein_normed(reference, current)),
        // 低基数数值列按类别检验
        _ => {
            let reference: Vec<String> = reference.iter().map(f64::to_string).collect();
            let current: Vec<String> = current.iter().map(f64::to_string).collect();
            test_categories(&reference, &current, true, reference.len())
        }
    }
}

fn text_values(rows: &[FeatureRow], column: &str) -> Result<Vec<String>, DriftError> {
    rows.iter()
        .map(|row| match row.value(column) {
            Some(FeatureValue::Category(v)) => Ok(v.to_string()),
            Some(FeatureValue::Number(v)) => Ok(v.to_string()),
            Some(FeatureValue::Flag(v)) => Ok(v.to_string()),
            None => Err(DriftError::UnknownColumn(column.to_string())),
        })
        .collect()
}

fn numeric_values(rows: &[FeatureRow], column: &str) -> Result<Vec<f64>, DriftError> {
    rows.iter()
        .map(|row| match row.value(column) {
            Some(FeatureValue::Number(v)) => Ok(v),
            Some(FeatureValue::Flag(v)) => Ok(f64::from(v)),
            Some(FeatureValue::Category(_)) => Err(DriftError::NotNumeric(column.to_string())),
            None => Err(DriftError::UnknownColumn(column.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::FEATURE_COUNT;

    fn row(i: usize, shift: f64, contract: &str) -> FeatureRow {
        FeatureRow {
            categorical: [
                if i % 2 == 0 { "Male" } else { "Female" },
                "No",
                "DSL",
                "Yes",
                "No",
                "Yes",
                "No",
                "No",
                "No",
                contract,
                "Mailed check",
            ]
            .map(String::from),
            numerical: [
                (i % 72) as f64 + shift,
                20.0 + (i % 50) as f64 + shift,
                100.0 + (i * 7 % 900) as f64 + shift * 100.0,
            ],
            binary: [0, (i % 2) as u8, 0, 1, 1],
        }
    }

    fn rows(n: usize, shift: f64, contract: &str) -> Vec<FeatureRow> {
        (0..n).map(|i| row(i, shift, contract)).collect()
    }

    #[test]
    fn test_identical_datasets_show_no_drift() {
        let data = rows(200, 0.0, "One year");
        let report =
            compute_drift(&data, &data, &ColumnMapping::default(), &DriftConfig::default()).unwrap();

        assert_eq!(report.number_of_columns(), FEATURE_COUNT);
        assert_eq!(report.number_of_drifted_columns, 0);
        assert!(!report.dataset_drift);
    }

    #[test]
    fn test_shifted_dataset_is_flagged() {
        let reference = rows(200, 0.0, "One year");
        let current = rows(200, 500.0, "Month-to-month");
        let report = compute_drift(
            &reference,
            &current,
            &ColumnMapping::default(),
            &DriftConfig::default(),
        )
        .unwrap();

        let drifted: Vec<_> = report
            .columns
            .iter()
            .filter(|c| c.drift_detected)
            .map(|c| c.column_name.as_str())
            .collect();
        assert_eq!(
            drifted,
            vec!["tenure", "MonthlyCharges", "TotalCharges", "Contract"]
        );
        // 4/19 < 0.25
        assert!(!report.dataset_drift);
    }

    #[test]
    fn test_large_reference_uses_distance_tests() {
        let reference = rows(1500, 0.0, "One year");
        let report = compute_drift(
            &reference,
            &reference,
            &ColumnMapping::default(),
            &DriftConfig::default(),
        )
        .unwrap();

        let tenure = &report.columns[0];
        assert_eq!(tenure.stattest, StatTest::Wasserstein);
        let contract = report
            .columns
            .iter()
            .find(|c| c.column_name == "Contract")
            .unwrap();
        assert_eq!(contract.stattest, StatTest::JensenShannon);
        assert!(!report.dataset_drift);
    }

    #[test]
    fn test_dataset_drift_share_is_strict() {
        let column = |detected: bool| ColumnDrift {
            column_name: "c".to_string(),
            column_type: ColumnType::Categorical,
            stattest: StatTest::ChiSquare,
            threshold: 0.2,
            drift_score: if detected { 0.01 } else { 0.9 },
            drift_detected: detected,
        };

        let five_of_nineteen: Vec<_> = (0..19).map(|i| column(i < 5)).collect();
        let report = DriftReport::summarize(five_of_nineteen, 0.25);
        assert_eq!(report.number_of_drifted_columns, 5);
        assert!((report.share_of_drifted_columns - 5.0 / 19.0).abs() < 1e-12);
        assert!(report.dataset_drift);

        let one_of_four: Vec<_> = (0..4).map(|i| column(i == 0)).collect();
        assert!(!DriftReport::summarize(one_of_four, 0.25).dataset_drift);
    }

    #[test]
    fn test_empty_inputs() {
        let data = rows(3, 0.0, "One year");
        let mapping = ColumnMapping::default();
        let options = DriftConfig::default();
        assert!(matches!(
            compute_drift(&[], &data, &mapping, &options),
            Err(DriftError::EmptyDataset { which: "reference" })
        ));
        assert!(matches!(
            compute_drift(&data, &[], &mapping, &options),
            Err(DriftError::EmptyDataset { which: "current" })
        ));
    }

    #[test]
    fn test_unknown_and_textual_columns() {
        let data = rows(3, 0.0, "One year");
        let options = DriftConfig::default();

        let unknown = ColumnMapping {
            numerical_features: vec![],
            categorical_features: vec!["Churn".to_string()],
        };
        assert!(matches!(
            compute_drift(&data, &data, &unknown, &options),
            Err(DriftError::UnknownColumn(_))
        ));

        let textual = ColumnMapping {
            numerical_features: vec!["Contract".to_string()],
            categorical_features: vec![],
        };
        assert!(matches!(
            compute_drift(&data, &data, &textual, &options),
            Err(DriftError::NotNumeric(_))
        ));
    }

    #[test]
    fn test_reports_carry_dates() {
        let data = rows(20, 0.0, "One year");
        let report =
            compute_drift(&data, &data, &ColumnMapping::default(), &DriftConfig::default()).unwrap();
        let dataset_date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let report_date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

        let dataset = report.dataset_report(dataset_date, report_date);
        assert_eq!(dataset.number_of_columns, FEATURE_COUNT);
        assert_eq!(dataset.date_dataset, dataset_date);

        let columns = report.column_reports(dataset_date, report_date);
        assert_eq!(columns.len(), FEATURE_COUNT);
        assert_eq!(columns[0].column_type, "num");
        assert!(columns.iter().all(|c| c.date_report == report_date));
    }
}
