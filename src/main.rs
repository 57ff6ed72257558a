use clap::Parser;
use churnflow::cli::{commands, load_config, AppContext, Cli, Command};
use churnflow::utils::logging::init_logging;
use churnflow::Result;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 解析命令行参数
    let cli = Cli::parse();

    // 配置先于日志加载：日志级别与格式来自配置
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging)?;
    tracing::info!(version = churnflow::VERSION, "churnflow starting");

    let ctx = AppContext::from_config(config)?;

    // 没有指定命令时运行调度器
    match cli.command {
        None => commands::schedule(&ctx, None).await?,
        Some(Command::Predict) => {
            commands::predict(&ctx).await?;
        }
        Some(Command::Drift { date }) => {
            commands::drift(&ctx, date).await?;
        }
        Some(Command::Schedule { once }) => commands::schedule(&ctx, once.as_deref()).await?,
        Some(Command::Health) => {
            // 不健康时以非零状态退出，供环境检查任务使用
            if !commands::health(&ctx).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
