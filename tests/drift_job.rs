mod support;

use chrono::{NaiveDate, Utc};
use churnflow::config::{DriftConfig, JobsConfig};
use churnflow::error::StoreError;
use churnflow::jobs::{DriftJob, JobOutcome, JobReport, SkipReason};
use churnflow::models::schema::FEATURE_COUNT;
use churnflow::models::{CustomerRecord, ScoredRecord};
use churnflow::storage::{MemoryStore, Table, Value};
use churnflow::ChurnflowError;
use std::sync::Arc;
use support::{customer, customers, shifted_customer, write_reference_csv, FakeRegistry};
use tempfile::TempDir;

fn execution_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn prediction_log(records: Vec<CustomerRecord>) -> Table {
    let scored: Vec<ScoredRecord> = records
        .into_iter()
        .enumerate()
        .map(|(i, customer)| ScoredRecord {
            customer,
            prediction: (i % 2) as u8,
            probability: 0.4,
            model_name: "telco_customer_churn".to_string(),
            model_version: "3".to_string(),
            prediction_date: Utc::now(),
        })
        .collect();
    ScoredRecord::to_table(&scored)
}

fn reference_registry(dir: &TempDir, records: &[CustomerRecord]) -> Arc<FakeRegistry> {
    let path = dir.path().join("telco_customer_churn_reference.csv");
    write_reference_csv(&path, records);
    Arc::new(FakeRegistry::with_champion().with_reference(&path))
}

fn job(store: &Arc<MemoryStore>, registry: &Arc<FakeRegistry>) -> DriftJob {
    DriftJob::new(
        store.clone(),
        registry.clone(),
        &JobsConfig::default(),
        &DriftConfig::default(),
    )
}

#[tokio::test]
async fn test_same_distribution_writes_reports() {
    let dir = TempDir::new().unwrap();
    let registry = reference_registry(&dir, &customers(300));
    let store = Arc::new(MemoryStore::new().with_table("prediction_logs", prediction_log(customers(300))));

    let outcome = job(&store, &registry).run(execution_date()).await.unwrap();

    match outcome {
        JobOutcome::Completed(JobReport::Drift {
            rows_read,
            reference_rows,
            number_of_drifted_columns,
            dataset_drift,
            rows_written,
        }) => {
            assert_eq!(rows_read, 300);
            assert_eq!(number_of_drifted_columns, 0);
            assert_eq!(reference_rows, 300);
            assert!(!dataset_drift);
            assert_eq!(rows_written, 1 + FEATURE_COUNT as u64);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert_eq!(
        store.appends(),
        vec!["data_report".to_string(), "data_columns_report".to_string()]
    );

    let dataset = store.table("data_report").unwrap();
    assert_eq!(dataset.len(), 1);
    for name in ["date_dataset", "date_report"] {
        let index = dataset.column_index(name).unwrap();
        assert_eq!(dataset.rows()[0][index], Value::Date(execution_date()));
    }

    let columns = store.table("data_columns_report").unwrap();
    assert_eq!(columns.len(), FEATURE_COUNT);
    let type_column = columns.column_index("column_type").unwrap();
    let num = columns
        .rows()
        .iter()
        .filter(|row| row[type_column] == Value::Text("num".to_string()))
        .count();
    assert_eq!(num, 3);
    let date_report = columns.column_index("date_report").unwrap();
    assert!(columns
        .rows()
        .iter()
        .all(|row| row[date_report] == Value::Date(execution_date())));
}

#[tokio::test]
async fn test_shifted_batch_is_flagged() {
    let dir = TempDir::new().unwrap();
    let registry = reference_registry(&dir, &customers(300));
    let current: Vec<_> = (0..120).map(shifted_customer).collect();
    let store = Arc::new(MemoryStore::new().with_table("prediction_logs", prediction_log(current)));

    let outcome = job(&store, &registry).run(execution_date()).await.unwrap();

    match outcome {
        JobOutcome::Completed(JobReport::Drift {
            number_of_drifted_columns,
            dataset_drift,
            ..
        }) => {
            // tenure、月费、总额、合同、支付方式
            assert_eq!(number_of_drifted_columns, 5);
            assert!(dataset_drift);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_query_filters_by_execution_date() {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(FakeRegistry::with_champion());

    job(&store, &registry).run(execution_date()).await.unwrap();

    let queries = store.queries();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].contains("\"prediction_logs\""));
    assert!(queries[0].contains("DATE(prediction_date AT TIME ZONE 'UTC') = '2024-05-01'"));
}

#[tokio::test]
async fn test_empty_log_skips_without_registry_or_append() {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(FakeRegistry::with_champion());

    let outcome = job(&store, &registry).run(execution_date()).await.unwrap();

    assert_eq!(outcome, JobOutcome::Skipped(SkipReason::EmptyBatch));
    assert_eq!(registry.fetch_calls(), 0);
    assert!(store.appends().is_empty());
}

#[tokio::test]
async fn test_store_failure_skips() {
    let store = Arc::new(MemoryStore::new());
    store.push_query_error("timeout");
    let registry = Arc::new(FakeRegistry::with_champion());

    let outcome = job(&store, &registry).run(execution_date()).await.unwrap();

    assert!(matches!(
        outcome,
        JobOutcome::Skipped(SkipReason::StoreUnavailable(_))
    ));
    assert_eq!(registry.fetch_calls(), 0);
}

#[tokio::test]
async fn test_unsupported_column_type_is_a_defect() {
    let store = Arc::new(MemoryStore::new());
    store.push_query_failure(StoreError::UnsupportedType {
        column: "MonthlyCharges".to_string(),
        column_type: "NUMERIC".to_string(),
    });
    let registry = Arc::new(FakeRegistry::with_champion());

    let result = job(&store, &registry).run(execution_date()).await;

    assert!(matches!(
        result,
        Err(ChurnflowError::Store(StoreError::UnsupportedType { .. }))
    ));
    assert_eq!(registry.fetch_calls(), 0);
    assert!(store.appends().is_empty());
}

#[tokio::test]
async fn test_missing_reference_skips() {
    let store = Arc::new(MemoryStore::new().with_table("prediction_logs", prediction_log(customers(10))));
    let registry = Arc::new(FakeRegistry::with_champion());

    let outcome = job(&store, &registry).run(execution_date()).await.unwrap();

    assert!(matches!(
        outcome,
        JobOutcome::Skipped(SkipReason::ReferenceUnavailable(_))
    ));
    assert_eq!(registry.fetch_calls(), 1);
    assert!(store.appends().is_empty());
}

#[tokio::test]
async fn test_unreadable_reference_skips() {
    let dir = TempDir::new().unwrap();
    let registry = Arc::new(
        FakeRegistry::with_champion().with_reference(&dir.path().join("missing.csv")),
    );
    let store = Arc::new(MemoryStore::new().with_table("prediction_logs", prediction_log(customers(10))));

    let outcome = job(&store, &registry).run(execution_date()).await.unwrap();

    assert!(matches!(
        outcome,
        JobOutcome::Skipped(SkipReason::ReferenceUnavailable(_))
    ));
}

#[tokio::test]
async fn test_column_report_failure_leaves_dataset_report() {
    let dir = TempDir::new().unwrap();
    let registry = reference_registry(&dir, &customers(50));
    let store = Arc::new(MemoryStore::new().with_table("prediction_logs", prediction_log(vec![customer(1), customer(2)])));
    store.fail_writes_to("data_columns_report");

    let outcome = job(&store, &registry).run(execution_date()).await.unwrap();

    assert!(matches!(
        outcome,
        JobOutcome::Skipped(SkipReason::WriteFailed { ref table, .. }) if table == "data_columns_report"
    ));
    assert_eq!(store.row_count("data_report"), 1);
    assert_eq!(store.row_count("data_columns_report"), 0);
}
