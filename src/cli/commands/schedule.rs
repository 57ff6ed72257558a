use crate::cli::AppContext;
use crate::error::SchedulerError;
use crate::scheduler::{PipelineRun, Scheduler, TaskStatus};
use crate::Result;

/// 运行调度器
///
/// 指定 `once` 时立即运行该流水线一次；否则常驻运行直到收到 Ctrl-C。
pub async fn schedule(ctx: &AppContext, once: Option<&str>) -> Result<()> {
    let scheduler = Scheduler::from_config(&ctx.config, ctx.store.clone(), ctx.registry.clone())?;

    if let Some(name) = once {
        let run = scheduler.run_once(name).await?;
        print_run(&run);
        return match run.failed_task() {
            None => Ok(()),
            Some(task) => Err(SchedulerError::RunFailed {
                pipeline: run.pipeline.clone(),
                task: task.task_id.clone(),
            }
            .into()),
        };
    }

    let names: Vec<&str> = scheduler.pipelines().iter().map(|p| p.name()).collect();
    tracing::info!(pipelines = ?names, "Scheduler started");

    tokio::select! {
        result = scheduler.run_forever() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping scheduler");
        }
    }

    Ok(())
}

fn print_run(run: &PipelineRun) {
    println!("pipeline {} ({})", run.pipeline, run.started_at.format("%Y-%m-%d %H:%M:%S"));
    for task in &run.tasks {
        let status = match &task.status {
            TaskStatus::Succeeded { attempts } => format!("succeeded (attempts: {})", attempts),
            TaskStatus::Failed { attempts, error } => {
                format!("failed (attempts: {}): {}", attempts, error)
            }
            TaskStatus::Skipped => "skipped".to_string(),
        };
        println!("  {:<24} {}", task.task_id, status);
    }
}
