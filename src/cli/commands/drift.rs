use crate::cli::AppContext;
use crate::jobs::{yesterday, DriftJob, JobOutcome};
use crate::Result;
use chrono::NaiveDate;

/// 对某一天运行漂移检测，缺省为 UTC 昨天
pub async fn drift(ctx: &AppContext, date: Option<NaiveDate>) -> Result<JobOutcome> {
    let execution_date = date.unwrap_or_else(yesterday);
    tracing::info!(
        model = %ctx.config.jobs.model_name,
        date = %execution_date,
        "Running drift detection job"
    );

    let job = DriftJob::new(
        ctx.store.clone(),
        ctx.registry.clone(),
        &ctx.config.jobs,
        &ctx.config.drift,
    );
    let outcome = job.run(execution_date).await?;

    println!("drift {}: {}", execution_date, outcome);
    Ok(outcome)
}
