//! 流水线任务

use crate::config::TaskConfig;
use crate::error::SchedulerError;
use crate::jobs::Job;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::process::Command;

/// 流水线中的一个步骤
#[async_trait]
pub trait Task: Send + Sync {
    fn id(&self) -> &str;

    async fn execute(&self) -> Result<(), SchedulerError>;
}

/// 开始/结束标记，不做任何事
pub struct MarkerTask {
    id: String,
}

impl MarkerTask {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Task for MarkerTask {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self) -> Result<(), SchedulerError> {
        Ok(())
    }
}

/// 环境检查：记录当前日期与主机
pub struct PrintDateTask {
    id: String,
}

impl PrintDateTask {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Task for PrintDateTask {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self) -> Result<(), SchedulerError> {
        let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
        tracing::info!(
            task = %self.id,
            date = %Utc::now().format("%Y-%m-%d %H:%M:%S"),
            host = %host,
            "Environment check"
        );
        Ok(())
    }
}

/// 进程内作业
///
/// `Skipped` 结果视为成功；只有作业返回错误时任务才失败。
pub struct JobTask {
    id: String,
    job: Arc<dyn Job>,
}

impl JobTask {
    pub fn new(id: impl Into<String>, job: Arc<dyn Job>) -> Self {
        Self { id: id.into(), job }
    }
}

#[async_trait]
impl Task for JobTask {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self) -> Result<(), SchedulerError> {
        match self.job.execute().await {
            Ok(outcome) => {
                tracing::info!(
                    task = %self.id,
                    job = self.job.name(),
                    outcome = %outcome,
                    "Job finished"
                );
                Ok(())
            }
            Err(e) => Err(SchedulerError::TaskFailed {
                task: self.id.clone(),
                message: e.to_string(),
            }),
        }
    }
}

/// 外部命令（如容器化作业），非零退出码即失败
pub struct CommandTask {
    id: String,
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl CommandTask {
    pub fn new(id: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

#[async_trait]
impl Task for CommandTask {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self) -> Result<(), SchedulerError> {
        tracing::info!(task = %self.id, program = %self.program, args = ?self.args, "Running command");

        let status = Command::new(&self.program)
            .args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| SchedulerError::TaskFailed {
                task: self.id.clone(),
                message: format!("failed to spawn {}: {}", self.program, e),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(SchedulerError::TaskFailed {
                task: self.id.clone(),
                message: format!("{} exited with {}", self.program, status),
            })
        }
    }
}

/// 由配置构建任务；作业类任务由 `job_for` 提供具体作业
pub fn build_task<F>(config: &TaskConfig, job_for: F) -> Result<Box<dyn Task>, SchedulerError>
where
    F: Fn(&TaskConfig) -> Option<Arc<dyn Job>>,
{
    let task: Box<dyn Task> = match config {
        TaskConfig::Marker { id } => Box::new(MarkerTask::new(id.as_str())),
        TaskConfig::PrintDate { id } => Box::new(PrintDateTask::new(id.as_str())),
        TaskConfig::Predict { id } | TaskConfig::Drift { id } => {
            let job = job_for(config).ok_or_else(|| SchedulerError::InvalidTask {
                task: id.clone(),
                message: "no job available for task".to_string(),
            })?;
            Box::new(JobTask::new(id.as_str(), job))
        }
        TaskConfig::Command {
            id,
            program,
            args,
            env,
        } => {
            let mut task = CommandTask::new(id.as_str(), program.as_str());
            for arg in args {
                task = task.arg(arg.as_str());
            }
            for pair in env {
                let (key, value) = pair.split_once('=').ok_or_else(|| SchedulerError::InvalidTask {
                    task: id.clone(),
                    message: format!("environment entry '{}' is not KEY=VALUE", pair),
                })?;
                task = task.env(key, value);
            }
            Box::new(task)
        }
    };
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_marker_and_print_date() {
        assert!(MarkerTask::new("start_dag").execute().await.is_ok());
        assert!(PrintDateTask::new("print_current_date").execute().await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_exit_status() {
        assert!(CommandTask::new("ok", "true").execute().await.is_ok());
        assert!(matches!(
            CommandTask::new("fail", "false").execute().await,
            Err(SchedulerError::TaskFailed { task, .. }) if task == "fail"
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_env() {
        let task = CommandTask::new("env", "sh")
            .arg("-c")
            .arg("test \"$MODEL_NAME\" = telco_customer_churn")
            .env("MODEL_NAME", "telco_customer_churn");
        assert!(task.execute().await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let result = CommandTask::new("missing", "/nonexistent/churnflow-job")
            .execute()
            .await;
        assert!(matches!(result, Err(SchedulerError::TaskFailed { .. })));
    }

    #[test]
    fn test_build_command_task_rejects_bad_env() {
        let config = TaskConfig::Command {
            id: "run".to_string(),
            program: "docker".to_string(),
            args: vec![],
            env: vec!["NOEQUALS".to_string()],
        };
        assert!(matches!(
            build_task(&config, |_| None),
            Err(SchedulerError::InvalidTask { .. })
        ));
    }

    #[test]
    fn test_build_job_task_requires_job() {
        let config = TaskConfig::Predict {
            id: "predict_task".to_string(),
        };
        assert!(build_task(&config, |_| None).is_err());

        let marker = TaskConfig::Marker {
            id: "start_dag".to_string(),
        };
        assert_eq!(build_task(&marker, |_| None).unwrap().id(), "start_dag");
    }
}
