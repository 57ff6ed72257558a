//! 日志系统
//!
//! 基于 tracing 的结构化日志：
//! - 日志级别来自配置，`RUST_LOG` 优先
//! - 格式：json、pretty、compact
//! - 输出：stdout、stderr 或文件

use crate::config::LoggingConfig;
use crate::error::ConfigError;
use crate::Result;
use std::path::PathBuf;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 日志输出目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl LogOutput {
    /// 解析输出目标，空值视为 stdout
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "stdout" => Self::Stdout,
            "stderr" => Self::Stderr,
            path => Self::File(PathBuf::from(path)),
        }
    }
}

/// 初始化日志系统
///
/// 只使用第一个输出目标；批处理作业只需要一个日志汇。
///
/// ```no_run
/// use churnflow::config::LoggingConfig;
/// use churnflow::utils::logging::init_logging;
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: "json".to_string(),
///     output: vec!["stdout".to_string()],
/// };
///
/// init_logging(&config).unwrap();
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| {
            // 日志系统尚未初始化，只能写 stderr
            eprintln!(
                "Warning: Invalid log level '{}', using 'info' as default",
                config.level
            );
            EnvFilter::new("info")
        })
    });

    let output = config
        .output
        .first()
        .map(|s| LogOutput::parse(s))
        .unwrap_or(LogOutput::Stdout);

    if config.output.len() > 1 {
        eprintln!(
            "Warning: Multiple log outputs specified, only {:?} will be used",
            output
        );
    }

    match &output {
        LogOutput::Stdout => init_subscriber(&config.format, filter, std::io::stdout)?,
        LogOutput::Stderr => init_subscriber(&config.format, filter, std::io::stderr)?,
        LogOutput::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ConfigError::Invalid(format!("Failed to create log directory: {}", e))
                })?;
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    ConfigError::Invalid(format!(
                        "Failed to open log file {}: {}",
                        path.display(),
                        e
                    ))
                })?;

            init_subscriber(&config.format, filter, file)?;
        }
    }

    tracing::info!(
        level = %config.level,
        format = %config.format,
        output = ?output,
        "Logging initialized"
    );

    Ok(())
}

/// 创建并初始化 subscriber
fn init_subscriber<W>(format: &str, filter: EnvFilter, writer: W) -> Result<()>
where
    W: for<'writer> fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    let registry = Registry::default().with(filter);

    let layer = match format.to_lowercase().as_str() {
        "json" => fmt::layer()
            .with_writer(writer)
            .json()
            .with_target(true)
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        "pretty" | "human" => fmt::layer()
            .with_writer(writer)
            .pretty()
            .with_target(true)
            .with_level(true)
            .boxed(),
        _ => fmt::layer()
            .with_writer(writer)
            .compact()
            .with_target(true)
            .with_level(true)
            .boxed(),
    };

    registry
        .with(layer)
        .try_init()
        .map_err(|e| ConfigError::Invalid(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_with_defaults() {
        // 全局 subscriber 只能初始化一次，重复调用返回错误
        let _ = init_logging(&LoggingConfig::default());
    }

    #[test]
    fn test_log_output_parse() {
        assert_eq!(LogOutput::parse("stdout"), LogOutput::Stdout);
        assert_eq!(LogOutput::parse(""), LogOutput::Stdout);
        assert_eq!(LogOutput::parse("stderr"), LogOutput::Stderr);
        assert_eq!(
            LogOutput::parse("logs/churnflow.log"),
            LogOutput::File(PathBuf::from("logs/churnflow.log"))
        );
    }
}
