use crate::cli::AppContext;
use crate::jobs::{JobOutcome, PredictionJob};
use crate::Result;

/// 运行一次预测作业
pub async fn predict(ctx: &AppContext) -> Result<JobOutcome> {
    tracing::info!(model = %ctx.config.jobs.model_name, "Running prediction job");

    let job = PredictionJob::new(ctx.store.clone(), ctx.registry.clone(), &ctx.config.jobs);
    let outcome = job.run().await?;

    println!("predict: {}", outcome);
    Ok(outcome)
}
