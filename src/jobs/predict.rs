//! 预测作业

use super::{Job, JobOutcome, JobReport, SkipReason};
use crate::config::JobsConfig;
use crate::data::transform;
use crate::error::ErrorClass;
use crate::models::{CustomerRecord, ScoredRecord};
use crate::registry::{ModelRegistry, RegistryHealth};
use crate::storage::DataStore;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// 读取一批客户数据，用冠军模型评分并追加到预测日志
pub struct PredictionJob {
    store: Arc<dyn DataStore>,
    registry: Arc<dyn ModelRegistry>,
    config: JobsConfig,
}

impl PredictionJob {
    pub fn new(
        store: Arc<dyn DataStore>,
        registry: Arc<dyn ModelRegistry>,
        config: &JobsConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config: config.clone(),
        }
    }

    pub async fn run(&self) -> Result<JobOutcome> {
        match self.registry.health_check().await {
            RegistryHealth::Healthy => tracing::info!("Model registry is reachable"),
            RegistryHealth::Unreachable(reason) => {
                tracing::warn!(reason = %reason, "Model registry health check failed")
            }
        }

        let table = match self.store.query(&self.config.batch_query).await {
            Ok(table) => table,
            Err(e) if e.class() == ErrorClass::Defect => return Err(e.into()),
            Err(e) => {
                tracing::error!(error = %e, "Failed to query customer batch");
                return Ok(JobOutcome::Skipped(SkipReason::StoreUnavailable(
                    e.to_string(),
                )));
            }
        };

        if table.is_empty() {
            tracing::warn!("No customer data to score");
            return Ok(JobOutcome::Skipped(SkipReason::EmptyBatch));
        }
        let rows_read = table.len();
        tracing::info!(rows = rows_read, "Customer batch loaded");

        let records = CustomerRecord::from_table(&table)?;
        let batch = transform(&records)?;
        if batch.is_empty() {
            tracing::warn!(rows_read, "No rows left after preprocessing");
            return Ok(JobOutcome::Skipped(SkipReason::EmptyBatch));
        }

        let champion = match self.registry.resolve_champion(&self.config.model_name).await {
            Ok(champion) => champion,
            Err(e) => {
                match e.class() {
                    ErrorClass::NotFound => {
                        tracing::warn!(model = %self.config.model_name, error = %e, "Champion model not found")
                    }
                    _ => {
                        tracing::error!(model = %self.config.model_name, error = %e, "Failed to resolve champion model")
                    }
                }
                return Ok(JobOutcome::Skipped(SkipReason::ModelUnavailable(
                    e.to_string(),
                )));
            }
        };

        let probabilities = champion.classifier.predict_proba(&batch.features);
        let predictions = champion.classifier.predict(&batch.features);
        let prediction_date = Utc::now();

        let scored: Vec<ScoredRecord> = batch
            .records
            .into_iter()
            .zip(predictions.into_iter().zip(probabilities))
            .map(|(customer, (prediction, probability))| ScoredRecord {
                customer,
                prediction,
                probability,
                model_name: champion.name.clone(),
                model_version: champion.version.clone(),
                prediction_date,
            })
            .collect();
        let rows_scored = scored.len();

        let output = ScoredRecord::to_table(&scored);
        match self.store.append(&self.config.prediction_table, &output).await {
            Ok(rows_written) => {
                tracing::info!(
                    table = %self.config.prediction_table,
                    model = %champion.name,
                    version = %champion.version,
                    rows_read,
                    rows_scored,
                    rows_written,
                    "Predictions written"
                );
                Ok(JobOutcome::Completed(JobReport::Prediction {
                    rows_read,
                    rows_scored,
                    rows_written,
                }))
            }
            Err(e) => {
                tracing::error!(
                    table = %self.config.prediction_table,
                    error = %e,
                    "Failed to write predictions"
                );
                Ok(JobOutcome::Skipped(SkipReason::WriteFailed {
                    table: self.config.prediction_table.clone(),
                    message: e.to_string(),
                }))
            }
        }
    }
}

#[async_trait]
impl Job for PredictionJob {
    fn name(&self) -> &str {
        "predict"
    }

    async fn execute(&self) -> Result<JobOutcome> {
        self.run().await
    }
}
