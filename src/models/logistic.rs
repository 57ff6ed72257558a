//! 逻辑回归模型
//!
//! 注册表中的模型制品是一个 JSON 导出：数值特征先标准化，类别特征按取值查表
//! （未见过的取值贡献为 0），二值特征直接乘系数。

use crate::error::ModelError;
use crate::models::customer::{FeatureRow, FeatureValue};
use crate::models::schema::{family_of, ColumnFamily};
use crate::models::traits::Classifier;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const LOGISTIC_KIND: &str = "logistic_regression";

/// 逻辑回归模型
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub kind: String,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub numerical: Vec<NumericTerm>,
    #[serde(default)]
    pub binary: Vec<BinaryTerm>,
    #[serde(default)]
    pub categorical: Vec<CategoricalTerm>,
}

/// 数值项：coefficient * (x - mean) / scale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericTerm {
    pub feature: String,
    #[serde(default)]
    pub mean: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    pub coefficient: f64,
}

/// 二值项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryTerm {
    pub feature: String,
    pub coefficient: f64,
}

/// 类别项（one-hot 系数）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalTerm {
    pub feature: String,
    pub levels: HashMap<String, f64>,
}

fn default_threshold() -> f64 {
    0.5
}

fn default_scale() -> f64 {
    1.0
}

impl LogisticModel {
    /// 解析并校验模型制品
    pub fn from_json(bytes: &[u8]) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_slice(bytes)
            .map_err(|e| ModelError::InvalidArtifact(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    /// 校验特征名与参数
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.kind != LOGISTIC_KIND {
            return Err(ModelError::UnsupportedKind(self.kind.clone()));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(ModelError::InvalidArtifact(format!(
                "threshold must be in (0, 1), got {}",
                self.threshold
            )));
        }

        let features = self
            .numerical
            .iter()
            .map(|t| (t.feature.as_str(), ColumnFamily::Numerical))
            .chain(self.binary.iter().map(|t| (t.feature.as_str(), ColumnFamily::Binary)))
            .chain(
                self.categorical
                    .iter()
                    .map(|t| (t.feature.as_str(), ColumnFamily::Categorical)),
            );
        for (feature, expected) in features {
            if family_of(feature) != Some(expected) {
                return Err(ModelError::UnknownFeature(feature.to_string()));
            }
        }

        if let Some(term) = self.numerical.iter().find(|t| t.scale == 0.0 || !t.scale.is_finite()) {
            return Err(ModelError::InvalidArtifact(format!(
                "feature {} has invalid scale {}",
                term.feature, term.scale
            )));
        }

        Ok(())
    }

    /// 线性决策值
    fn decision(&self, row: &FeatureRow) -> f64 {
        let mut z = self.intercept;

        for term in &self.numerical {
            if let Some(FeatureValue::Number(x)) = row.value(&term.feature) {
                z += term.coefficient * (x - term.mean) / term.scale;
            }
        }
        for term in &self.binary {
            if let Some(FeatureValue::Flag(flag)) = row.value(&term.feature) {
                z += term.coefficient * f64::from(flag);
            }
        }
        for term in &self.categorical {
            if let Some(FeatureValue::Category(level)) = row.value(&term.feature) {
                z += term.levels.get(level).copied().unwrap_or(0.0);
            }
        }

        z
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticModel {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn predict_proba(&self, rows: &[FeatureRow]) -> Vec<f64> {
        rows.iter().map(|row| sigmoid(self.decision(row))).collect()
    }

    fn predict(&self, rows: &[FeatureRow]) -> Vec<u8> {
        self.predict_proba(rows)
            .into_iter()
            .map(|p| u8::from(p >= self.threshold))
            .collect()
    }
}
