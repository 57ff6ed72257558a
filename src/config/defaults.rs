// 默认配置常量

pub const DEFAULT_PG_HOST: &str = "localhost";
pub const DEFAULT_PG_PORT: u16 = 5432;
pub const DEFAULT_PG_USER: &str = "app_user";
pub const DEFAULT_PG_DATABASE: &str = "app_db";
pub const DEFAULT_PG_MAX_CONNECTIONS: u32 = 4;
pub const DEFAULT_PG_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_TRACKING_URI: &str = "http://localhost:5000";
pub const DEFAULT_CHAMPION_ALIAS: &str = "champion";
pub const DEFAULT_MODEL_ARTIFACT_PATH: &str = "model/model.json";
pub const DEFAULT_REFERENCE_ARTIFACT_PATH: &str =
    "reference_dataset/telco_customer_churn_reference.csv";
pub const DEFAULT_DOWNLOAD_DIR: &str = "./tmp";
pub const DEFAULT_REGISTRY_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_MODEL_NAME: &str = "telco_customer_churn";
pub const DEFAULT_BATCH_QUERY: &str = "SELECT * FROM customer_data ORDER BY random() LIMIT 10";
pub const DEFAULT_PREDICTION_TABLE: &str = "prediction_logs";
pub const DEFAULT_DATASET_REPORT_TABLE: &str = "data_report";
pub const DEFAULT_COLUMN_REPORT_TABLE: &str = "data_columns_report";

pub const DEFAULT_DRIFT_SHARE: f64 = 0.25;
pub const DEFAULT_CAT_STATTEST_THRESHOLD: f64 = 0.2;
pub const DEFAULT_NUM_STATTEST_THRESHOLD: f64 = 0.2;

pub const DEFAULT_SCHEDULE_HOUR: u32 = 2;
pub const DEFAULT_SCHEDULE_MINUTE: u32 = 0;
pub const DEFAULT_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 300;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FORMAT: &str = "json";

/// 部署环境变量
pub const ENV_PG_HOST: &str = "POSTGRES_HOST";
pub const ENV_PG_PASSWORD: &str = "PG_APP_PWD";
pub const ENV_TRACKING_URI: &str = "MLFLOW_TRACKING_URI";
