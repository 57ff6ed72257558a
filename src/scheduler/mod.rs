//! 每日调度器
//!
//! 每条流水线有自己的触发时刻与重试策略。调度器一次只运行一条流水线，
//! 同一时刻到期的流水线按声明顺序依次运行。

pub mod pipeline;
pub mod schedule;
pub mod task;

pub use pipeline::{Pipeline, PipelineRun, TaskRun, TaskStatus};
pub use schedule::{DailySchedule, RetryPolicy};
pub use task::{build_task, CommandTask, JobTask, MarkerTask, PrintDateTask, Task};

use crate::config::{Config, PipelineConfig, TaskConfig};
use crate::error::SchedulerError;
use crate::jobs::{DriftJob, Job, PredictionJob};
use crate::registry::ModelRegistry;
use crate::storage::DataStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// 调度器
pub struct Scheduler {
    pipelines: Vec<Pipeline>,
}

impl Scheduler {
    pub fn new(pipelines: Vec<Pipeline>) -> Self {
        Self { pipelines }
    }

    /// 按配置构建流水线，作业共享注入的存储与注册表
    pub fn from_config(
        config: &Config,
        store: Arc<dyn DataStore>,
        registry: Arc<dyn ModelRegistry>,
    ) -> Result<Self, SchedulerError> {
        let job_for = |task: &TaskConfig| -> Option<Arc<dyn Job>> {
            match task {
                TaskConfig::Predict { .. } => Some(Arc::new(PredictionJob::new(
                    store.clone(),
                    registry.clone(),
                    &config.jobs,
                ))),
                TaskConfig::Drift { .. } => Some(Arc::new(DriftJob::new(
                    store.clone(),
                    registry.clone(),
                    &config.jobs,
                    &config.drift,
                ))),
                _ => None,
            }
        };

        let pipelines = config
            .scheduler
            .pipelines
            .iter()
            .map(|p| build_pipeline(p, &job_for))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(pipelines))
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    pub fn pipeline(&self, name: &str) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| p.name() == name)
    }

    /// 立即触发一条流水线
    pub async fn run_once(&self, name: &str) -> Result<PipelineRun, SchedulerError> {
        let pipeline = self
            .pipeline(name)
            .ok_or_else(|| SchedulerError::UnknownPipeline(name.to_string()))?;
        Ok(pipeline.run().await)
    }

    /// 最早的下一次触发时刻及届时到期的流水线
    pub fn next_due(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, Vec<&Pipeline>)> {
        let next = self
            .pipelines
            .iter()
            .map(|p| p.schedule().next_after(now))
            .min()?;
        let due = self
            .pipelines
            .iter()
            .filter(|p| p.schedule().next_after(now) == next)
            .collect();
        Some((next, due))
    }

    /// 常驻运行：睡眠到下一个触发时刻，再运行到期的流水线
    pub async fn run_forever(&self) -> Result<(), SchedulerError> {
        loop {
            let now = Utc::now();
            let Some((next, due)) = self.next_due(now) else {
                tracing::warn!("No pipelines configured, scheduler exiting");
                return Ok(());
            };

            let names: Vec<&str> = due.iter().map(|p| p.name()).collect();
            tracing::info!(next = %next, pipelines = ?names, "Waiting for next run");

            sleep_until(next).await;

            for pipeline in due {
                let run = pipeline.run().await;
                if let Some(task) = run.failed_task() {
                    tracing::error!(
                        pipeline = %run.pipeline,
                        task = %task.task_id,
                        "Run failed, manual intervention required"
                    );
                }
            }
        }
    }
}

/// 睡眠到墙钟时间不早于 `deadline`
///
/// 单次睡眠可能早于墙钟醒来，循环到越过触发时刻为止。
async fn sleep_until(deadline: DateTime<Utc>) {
    loop {
        let now = Utc::now();
        if now >= deadline {
            return;
        }
        let wait = (deadline - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;
    }
}

fn build_pipeline<F>(config: &PipelineConfig, job_for: &F) -> Result<Pipeline, SchedulerError>
where
    F: Fn(&TaskConfig) -> Option<Arc<dyn Job>>,
{
    let schedule = DailySchedule::new(config.hour, config.minute)?;
    let retry = RetryPolicy::new(config.retries, config.retry_delay());
    let mut pipeline = Pipeline::new(config.name.as_str(), schedule, retry);
    for task in &config.tasks {
        pipeline.push_task(build_task(task, job_for)?);
    }
    Ok(pipeline)
}
