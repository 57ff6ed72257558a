pub mod customer;
pub mod logistic;
pub mod reports;
pub mod schema;
pub mod traits;

// Re-export commonly used types
pub use customer::{CustomerRecord, FeatureRow, FeatureValue, ScoredRecord};
pub use logistic::LogisticModel;
pub use reports::{ColumnDriftReport, DatasetDriftReport};
pub use schema::ColumnFamily;
pub use traits::Classifier;
