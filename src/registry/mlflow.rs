//! MLflow REST 注册表客户端

use super::client::{ChampionModel, ModelRegistry, RegistryHealth};
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::models::LogisticModel;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const SEARCH_MODELS: &str = "/api/2.0/mlflow/registered-models/search";
const MODEL_ALIAS: &str = "/api/2.0/mlflow/registered-models/alias";
const SEARCH_EXPERIMENTS: &str = "/api/2.0/mlflow/experiments/search";
const MODEL_VERSION_ARTIFACT: &str = "/model-versions/get-artifact";
const RUN_ARTIFACT: &str = "/get-artifact";

/// 别名不存在时 MLflow 返回的错误码
const MISSING_RESOURCE_CODES: [&str; 2] = ["RESOURCE_DOES_NOT_EXIST", "INVALID_PARAMETER_VALUE"];

#[derive(Debug, Deserialize)]
struct SearchModelsResponse {
    #[serde(default)]
    registered_models: Vec<RegisteredModel>,
}

#[derive(Debug, Deserialize)]
struct RegisteredModel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AliasResponse {
    model_version: ModelVersion,
}

#[derive(Debug, Clone, Deserialize)]
struct ModelVersion {
    name: String,
    version: String,
    #[serde(default)]
    run_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    message: String,
}

/// MLflow 注册表
pub struct MlflowRegistry {
    client: Client,
    base_url: String,
    champion_alias: String,
    model_artifact_path: String,
    reference_artifact_path: String,
    download_dir: PathBuf,
}

impl MlflowRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.tracking_uri.trim_end_matches('/').to_string(),
            champion_alias: config.champion_alias.clone(),
            model_artifact_path: config.model_artifact_path.clone(),
            reference_artifact_path: config.reference_artifact_path.clone(),
            download_dir: config.download_dir.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response, RegistryError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "Registry request");
        self.client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| RegistryError::Unreachable(format!("{}: {}", url, e)))
    }

    /// 确认注册模型存在
    async fn ensure_registered(&self, model_name: &str) -> Result<(), RegistryError> {
        let filter = format!("name='{}'", model_name);
        let response = self.get(SEARCH_MODELS, &[("filter", filter.as_str())]).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RegistryError::ModelNotFound(model_name.to_string()));
        }
        let response = check_status(response).await?;
        let body: SearchModelsResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;

        if body.registered_models.iter().any(|m| m.name == model_name) {
            Ok(())
        } else {
            Err(RegistryError::ModelNotFound(model_name.to_string()))
        }
    }

    /// 按别名解析模型版本
    async fn champion_version(&self, model_name: &str) -> Result<ModelVersion, RegistryError> {
        self.ensure_registered(model_name).await?;

        let response = self
            .get(
                MODEL_ALIAS,
                &[("name", model_name), ("alias", self.champion_alias.as_str())],
            )
            .await?;

        let status = response.status();
        if status.is_client_error() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            if status == StatusCode::NOT_FOUND
                || MISSING_RESOURCE_CODES.contains(&body.error_code.as_str())
            {
                return Err(RegistryError::NoChampionAlias {
                    model: model_name.to_string(),
                    alias: self.champion_alias.clone(),
                });
            }
            return Err(RegistryError::InvalidResponse(format!(
                "{} {}: {}",
                status, body.error_code, body.message
            )));
        }

        let body: AliasResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;
        Ok(body.model_version)
    }

    /// 下载制品内容
    async fn download(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<u8>, RegistryError> {
        let response = self.get(path, query).await?;
        if response.status().is_client_error() {
            let artifact = query.last().map(|(_, v)| *v).unwrap_or_default();
            return Err(RegistryError::ArtifactUnavailable(format!(
                "{} ({})",
                artifact,
                response.status()
            )));
        }

        let bytes = check_status(response)
            .await?
            .bytes()
            .await
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// 5xx 统一视为不可达
async fn check_status(response: Response) -> Result<Response, RegistryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status.is_server_error() {
        Err(RegistryError::Unreachable(format!("{}: {}", status, body)))
    } else {
        Err(RegistryError::InvalidResponse(format!("{}: {}", status, body)))
    }
}

fn local_file_name(artifact_path: &str) -> &str {
    Path::new(artifact_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(artifact_path)
}

#[async_trait]
impl ModelRegistry for MlflowRegistry {
    async fn resolve_champion(&self, model_name: &str) -> Result<ChampionModel, RegistryError> {
        let version = self.champion_version(model_name).await?;

        let artifact = self
            .download(
                MODEL_VERSION_ARTIFACT,
                &[
                    ("name", version.name.as_str()),
                    ("version", version.version.as_str()),
                    ("path", self.model_artifact_path.as_str()),
                ],
            )
            .await?;
        let classifier = LogisticModel::from_json(&artifact)?;

        tracing::info!(
            model = %version.name,
            version = %version.version,
            run_id = %version.run_id,
            "Champion model resolved"
        );

        Ok(ChampionModel {
            name: version.name,
            version: version.version,
            run_id: version.run_id,
            classifier: Arc::new(classifier),
        })
    }

    async fn fetch_reference_dataset(&self, model_name: &str) -> Result<PathBuf, RegistryError> {
        let version = self.champion_version(model_name).await?;
        if version.run_id.is_empty() {
            return Err(RegistryError::ArtifactUnavailable(format!(
                "model version {} has no source run",
                version.version
            )));
        }

        let content = self
            .download(
                RUN_ARTIFACT,
                &[
                    ("run_uuid", version.run_id.as_str()),
                    ("path", self.reference_artifact_path.as_str()),
                ],
            )
            .await?;

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| RegistryError::ArtifactUnavailable(format!(
                "Failed to create download directory: {}",
                e
            )))?;

        let local_path = self
            .download_dir
            .join(local_file_name(&self.reference_artifact_path));
        tokio::fs::write(&local_path, &content)
            .await
            .map_err(|e| RegistryError::ArtifactUnavailable(format!(
                "Failed to write {}: {}",
                local_path.display(),
                e
            )))?;

        tracing::info!(
            run_id = %version.run_id,
            path = %local_path.display(),
            bytes = content.len(),
            "Reference dataset downloaded"
        );

        Ok(local_path)
    }

    async fn health_check(&self) -> RegistryHealth {
        match self.get(SEARCH_EXPERIMENTS, &[("max_results", "1")]).await {
            Ok(response) if response.status().is_success() => RegistryHealth::Healthy,
            Ok(response) => RegistryHealth::Unreachable(format!("status {}", response.status())),
            Err(e) => RegistryHealth::Unreachable(e.to_string()),
        }
    }
}
