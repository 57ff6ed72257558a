//! 模型注册表抽象

use crate::error::RegistryError;
use crate::models::Classifier;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// 冠军模型引用
///
/// 每次运行重新解析，不跨运行缓存。
#[derive(Clone)]
pub struct ChampionModel {
    pub name: String,
    pub version: String,
    pub run_id: String,
    pub classifier: Arc<dyn Classifier>,
}

impl fmt::Debug for ChampionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChampionModel")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("run_id", &self.run_id)
            .field("kind", &self.classifier.kind())
            .finish()
    }
}

/// 注册表健康状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryHealth {
    Healthy,
    Unreachable(String),
}

impl RegistryHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// 模型注册表
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    /// 解析带冠军别名的模型版本并加载分类器
    async fn resolve_champion(&self, model_name: &str) -> Result<ChampionModel, RegistryError>;

    /// 下载冠军版本所属 run 的参考数据集，返回本地路径
    async fn fetch_reference_dataset(&self, model_name: &str) -> Result<PathBuf, RegistryError>;

    /// 检查注册表是否可达
    async fn health_check(&self) -> RegistryHealth;
}
