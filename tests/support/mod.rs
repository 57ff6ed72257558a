//! 集成测试共用的假注册表与样本数据

#![allow(dead_code)]

use async_trait::async_trait;
use churnflow::error::RegistryError;
use churnflow::models::schema::{BINARY_COLUMNS, CATEGORICAL_COLUMNS, TARGET_COLUMN};
use churnflow::models::{CustomerRecord, LogisticModel};
use churnflow::registry::{ChampionModel, ModelRegistry, RegistryHealth};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const MODEL_JSON: &str = r#"{
    "kind": "logistic_regression",
    "intercept": -0.5,
    "numerical": [
        {"feature": "tenure", "mean": 32.0, "scale": 24.0, "coefficient": -1.1},
        {"feature": "MonthlyCharges", "mean": 65.0, "scale": 30.0, "coefficient": 0.6}
    ],
    "binary": [
        {"feature": "PaperlessBilling", "coefficient": 0.3}
    ],
    "categorical": [
        {"feature": "Contract", "levels": {"Month-to-month": 1.2, "Two year": -1.4}}
    ]
}"#;

pub fn model() -> LogisticModel {
    LogisticModel::from_json(MODEL_JSON.as_bytes()).unwrap()
}

/// 内存中的注册表，记录调用次数
pub struct FakeRegistry {
    model: Option<LogisticModel>,
    reference: Option<PathBuf>,
    healthy: bool,
    resolve_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl FakeRegistry {
    pub fn with_champion() -> Self {
        Self {
            model: Some(model()),
            reference: None,
            healthy: true,
            resolve_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn without_champion() -> Self {
        Self {
            model: None,
            ..Self::with_champion()
        }
    }

    pub fn with_reference(mut self, path: &Path) -> Self {
        self.reference = Some(path.to_path_buf());
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelRegistry for FakeRegistry {
    async fn resolve_champion(&self, model_name: &str) -> Result<ChampionModel, RegistryError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        match &self.model {
            Some(model) => Ok(ChampionModel {
                name: model_name.to_string(),
                version: "3".to_string(),
                run_id: "run-abc".to_string(),
                classifier: Arc::new(model.clone()),
            }),
            None => Err(RegistryError::NoChampionAlias {
                model: model_name.to_string(),
                alias: "champion".to_string(),
            }),
        }
    }

    async fn fetch_reference_dataset(&self, _model_name: &str) -> Result<PathBuf, RegistryError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.reference
            .clone()
            .ok_or_else(|| RegistryError::ArtifactUnavailable("reference dataset".to_string()))
    }

    async fn health_check(&self) -> RegistryHealth {
        if self.healthy {
            RegistryHealth::Healthy
        } else {
            RegistryHealth::Unreachable("connection refused".to_string())
        }
    }
}

const CONTRACTS: [&str; 3] = ["Month-to-month", "One year", "Two year"];
const PAYMENTS: [&str; 3] = ["Electronic check", "Mailed check", "Credit card (automatic)"];

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}

/// 第 i 个样本客户
pub fn customer(i: usize) -> CustomerRecord {
    let tenure = (i % 72) as i64 + 1;
    let monthly = 20.0 + (i % 80) as f64;
    CustomerRecord {
        customer_id: Some(format!("{:04}-CUST", i)),
        categorical: [
            if i % 2 == 0 { "Male" } else { "Female" },
            if i % 3 == 0 { "Yes" } else { "No" },
            if i % 4 == 0 { "Fiber optic" } else { "DSL" },
            "No",
            "Yes",
            "No",
            "No",
            "No",
            "Yes",
            CONTRACTS[i % 3],
            PAYMENTS[i % 3],
        ]
        .map(String::from),
        tenure,
        monthly_charges: monthly,
        total_charges: format!("{:.2}", tenure as f64 * monthly),
        binary: [
            if i % 5 == 0 { "1" } else { "0" }.to_string(),
            yes_no(i % 2 == 0),
            yes_no(i % 3 == 0),
            yes_no(true),
            yes_no(i % 2 == 1),
        ],
    }
}

/// 分布明显偏移的样本客户
pub fn shifted_customer(i: usize) -> CustomerRecord {
    let mut record = customer(i);
    record.categorical[9] = "Month-to-month".to_string();
    record.categorical[10] = "Electronic check".to_string();
    record.tenure += 300;
    record.monthly_charges += 500.0;
    record.total_charges = format!("{:.2}", record.tenure as f64 * record.monthly_charges);
    record
}

pub fn customers(n: usize) -> Vec<CustomerRecord> {
    (0..n).map(customer).collect()
}

/// 10 行：两行重复、一行账单总额为空白
pub fn dirty_batch() -> Vec<CustomerRecord> {
    let mut rows = customers(8);
    rows[5].total_charges = " ".to_string();
    rows.push(rows[0].clone());
    rows.push(rows[2].clone());
    rows
}

/// 把客户记录写成带标签列的参考 CSV
pub fn write_reference_csv(path: &Path, records: &[CustomerRecord]) {
    let mut writer = csv::Writer::from_path(path).unwrap();

    let mut header = vec!["customerID"];
    header.extend(CATEGORICAL_COLUMNS);
    header.extend(["tenure", "MonthlyCharges", "TotalCharges"]);
    header.extend(BINARY_COLUMNS);
    header.push(TARGET_COLUMN);
    writer.write_record(&header).unwrap();

    for (i, record) in records.iter().enumerate() {
        let mut row = vec![record.customer_id.clone().unwrap_or_default()];
        row.extend(record.categorical.iter().cloned());
        row.push(record.tenure.to_string());
        row.push(record.monthly_charges.to_string());
        row.push(record.total_charges.clone());
        row.extend(record.binary.iter().cloned());
        row.push(yes_no(i % 4 == 0));
        writer.write_record(&row).unwrap();
    }

    writer.flush().unwrap();
}
