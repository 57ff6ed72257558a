//! 漂移检测作业

use super::{Job, JobOutcome, JobReport, SkipReason};
use crate::config::{DriftConfig, JobsConfig};
use crate::data::{read_reference_dataset, transform};
use crate::drift::{compute_drift, ColumnMapping};
use crate::error::{ErrorClass, TransformError};
use crate::models::{ColumnDriftReport, CustomerRecord};
use crate::registry::ModelRegistry;
use crate::storage::manager::quote_ident;
use crate::storage::DataStore;
use crate::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

/// 默认的逻辑日期：UTC 昨天
pub fn yesterday() -> NaiveDate {
    Utc::now().date_naive() - chrono::Duration::days(1)
}

/// 比较某一天的评分数据与冠军模型的参考数据集，写入漂移报告
pub struct DriftJob {
    store: Arc<dyn DataStore>,
    registry: Arc<dyn ModelRegistry>,
    jobs: JobsConfig,
    options: DriftConfig,
    mapping: ColumnMapping,
}

impl DriftJob {
    pub fn new(
        store: Arc<dyn DataStore>,
        registry: Arc<dyn ModelRegistry>,
        jobs: &JobsConfig,
        options: &DriftConfig,
    ) -> Self {
        Self {
            store,
            registry,
            jobs: jobs.clone(),
            options: *options,
            mapping: ColumnMapping::default(),
        }
    }

    /// 读取某一天预测日志的查询
    ///
    /// `prediction_date` 是 TIMESTAMPTZ，按 UTC 取日期，与 `yesterday()` 一致。
    pub fn current_batch_query(&self, execution_date: NaiveDate) -> String {
        format!(
            "SELECT * FROM {} WHERE DATE(prediction_date AT TIME ZONE 'UTC') = '{}'",
            quote_ident(&self.jobs.prediction_table),
            execution_date.format("%Y-%m-%d")
        )
    }

    pub async fn run(&self, execution_date: NaiveDate) -> Result<JobOutcome> {
        tracing::info!(date = %execution_date, "Drift detection started");

        let sql = self.current_batch_query(execution_date);
        let table = match self.store.query(&sql).await {
            Ok(table) => table,
            Err(e) if e.class() == ErrorClass::Defect => return Err(e.into()),
            Err(e) => {
                tracing::error!(error = %e, "Failed to query prediction log");
                return Ok(JobOutcome::Skipped(SkipReason::StoreUnavailable(
                    e.to_string(),
                )));
            }
        };

        if table.is_empty() {
            tracing::warn!(date = %execution_date, "No scored records for date");
            return Ok(JobOutcome::Skipped(SkipReason::EmptyBatch));
        }
        let rows_read = table.len();

        let current = transform(&CustomerRecord::from_table(&table)?)?;
        if current.is_empty() {
            tracing::warn!(rows_read, "No rows left after preprocessing");
            return Ok(JobOutcome::Skipped(SkipReason::EmptyBatch));
        }

        let path = match self
            .registry
            .fetch_reference_dataset(&self.jobs.model_name)
            .await
        {
            Ok(path) => path,
            Err(e) => {
                tracing::error!(model = %self.jobs.model_name, error = %e, "Failed to fetch reference dataset");
                return Ok(JobOutcome::Skipped(SkipReason::ReferenceUnavailable(
                    e.to_string(),
                )));
            }
        };

        let reference_records = match read_reference_dataset(&path) {
            Ok(records) => records,
            Err(TransformError::Reference(message)) => {
                tracing::error!(path = %path.display(), error = %message, "Failed to read reference dataset");
                return Ok(JobOutcome::Skipped(SkipReason::ReferenceUnavailable(
                    message,
                )));
            }
            Err(e) => return Err(e.into()),
        };
        let reference = transform(&reference_records)?;
        let reference_rows = reference.len();

        let report = compute_drift(
            &reference.features,
            &current.features,
            &self.mapping,
            &self.options,
        )?;

        tracing::info!(
            date = %execution_date,
            columns = report.number_of_columns(),
            drifted = report.number_of_drifted_columns,
            share = report.share_of_drifted_columns,
            dataset_drift = report.dataset_drift,
            "Drift report computed"
        );

        // 两张报告表都以运行的逻辑日期标记
        let dataset_table = report
            .dataset_report(execution_date, execution_date)
            .to_table();
        let column_table =
            ColumnDriftReport::to_table(&report.column_reports(execution_date, execution_date));

        let mut rows_written = 0;
        for (name, data) in [
            (&self.jobs.dataset_report_table, &dataset_table),
            (&self.jobs.column_report_table, &column_table),
        ] {
            match self.store.append(name, data).await {
                Ok(n) => rows_written += n,
                Err(e) => {
                    tracing::error!(table = %name, error = %e, "Failed to write drift report");
                    return Ok(JobOutcome::Skipped(SkipReason::WriteFailed {
                        table: name.clone(),
                        message: e.to_string(),
                    }));
                }
            }
        }

        tracing::info!(rows_written, "Drift reports written");

        Ok(JobOutcome::Completed(JobReport::Drift {
            rows_read,
            reference_rows,
            number_of_drifted_columns: report.number_of_drifted_columns,
            dataset_drift: report.dataset_drift,
            rows_written,
        }))
    }
}

#[async_trait]
impl Job for DriftJob {
    fn name(&self) -> &str {
        "drift"
    }

    async fn execute(&self) -> Result<JobOutcome> {
        self.run(yesterday()).await
    }
}
