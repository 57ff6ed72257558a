//! 流水线：按顺序执行任务，失败时按策略重试

use super::schedule::{DailySchedule, RetryPolicy};
use super::task::Task;
use chrono::{DateTime, Utc};

/// 单个任务的执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded { attempts: u32 },
    Failed { attempts: u32, error: String },
    /// 上游任务失败，未执行
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRun {
    pub task_id: String,
    pub status: TaskStatus,
}

/// 一次流水线运行的记录
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub pipeline: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tasks: Vec<TaskRun>,
}

impl PipelineRun {
    pub fn succeeded(&self) -> bool {
        self.failed_task().is_none()
    }

    /// 第一个失败的任务
    pub fn failed_task(&self) -> Option<&TaskRun> {
        self.tasks
            .iter()
            .find(|t| matches!(t.status, TaskStatus::Failed { .. }))
    }

    pub fn status_of(&self, task_id: &str) -> Option<&TaskStatus> {
        self.tasks
            .iter()
            .find(|t| t.task_id == task_id)
            .map(|t| &t.status)
    }
}

/// 流水线
pub struct Pipeline {
    name: String,
    schedule: DailySchedule,
    retry: RetryPolicy,
    tasks: Vec<Box<dyn Task>>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, schedule: DailySchedule, retry: RetryPolicy) -> Self {
        Self {
            name: name.into(),
            schedule,
            retry,
            tasks: Vec::new(),
        }
    }

    pub fn with_task(mut self, task: impl Task + 'static) -> Self {
        self.tasks.push(Box::new(task));
        self
    }

    pub fn push_task(&mut self, task: Box<dyn Task>) {
        self.tasks.push(task);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schedule(&self) -> DailySchedule {
        self.schedule
    }

    pub fn task_ids(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.id()).collect()
    }

    /// 按顺序执行全部任务
    ///
    /// 某个任务耗尽重试后失败时，下游任务记为 `Skipped`。
    pub async fn run(&self) -> PipelineRun {
        let started_at = Utc::now();
        tracing::info!(pipeline = %self.name, "Pipeline run started");

        let mut tasks = Vec::with_capacity(self.tasks.len());
        let mut failed = false;

        for task in &self.tasks {
            let status = if failed {
                TaskStatus::Skipped
            } else {
                self.run_task(task.as_ref()).await
            };
            if matches!(status, TaskStatus::Failed { .. }) {
                failed = true;
            }
            tasks.push(TaskRun {
                task_id: task.id().to_string(),
                status,
            });
        }

        let run = PipelineRun {
            pipeline: self.name.clone(),
            started_at,
            finished_at: Utc::now(),
            tasks,
        };

        match run.failed_task() {
            None => tracing::info!(pipeline = %self.name, "Pipeline run succeeded"),
            Some(task) => tracing::error!(
                pipeline = %self.name,
                task = %task.task_id,
                "Pipeline run failed"
            ),
        }

        run
    }

    async fn run_task(&self, task: &dyn Task) -> TaskStatus {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 1;

        loop {
            match task.execute().await {
                Ok(()) => return TaskStatus::Succeeded { attempts: attempt },
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(
                        pipeline = %self.name,
                        task = task.id(),
                        attempt,
                        error = %e,
                        delay_secs = self.retry.delay.as_secs(),
                        "Task failed, retrying"
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        pipeline = %self.name,
                        task = task.id(),
                        attempt,
                        error = %e,
                        "Task failed"
                    );
                    return TaskStatus::Failed {
                        attempts: attempt,
                        error: e.to_string(),
                    };
                }
            }
        }
    }
}
