//! 模型 Trait 定义

use crate::models::customer::FeatureRow;

/// 二分类模型 trait
///
/// 从注册表加载的冠军模型都实现这个 trait。推理是纯 CPU 计算，因此是同步接口。
pub trait Classifier: Send + Sync {
    /// 模型种类（例如 `logistic_regression`）
    fn kind(&self) -> &str;

    /// 每行属于正类（流失）的概率，取值 [0, 1]
    fn predict_proba(&self, rows: &[FeatureRow]) -> Vec<f64>;

    /// 每行的类别预测（0/1）
    fn predict(&self, rows: &[FeatureRow]) -> Vec<u8>;
}
