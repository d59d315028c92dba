use std::env;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ConfigPaths, LogFormat, LogLevel, LoggingConfig};

/// Initialize tracing for a CLI invocation
///
/// Logs go to stderr so command output on stdout stays machine readable.
/// Uses RUST_LOG if set, otherwise the configured level (`debug` when the
/// application runs in debug mode). `ARTISAN_LOG_FORMAT=json|pretty`
/// overrides the configured format. When `logging.directory` is set, a
/// compact copy of every line is also written to a daily rolling file.
///
/// # Errors
/// Returns error if the log directory cannot be created or a global
/// subscriber is already installed
pub fn init(logging: &LoggingConfig, debug: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if debug { LogLevel::Debug } else { logging.level };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let format = match env::var("ARTISAN_LOG_FORMAT").as_deref() {
        Ok("json") => LogFormat::Json,
        Ok("pretty") => LogFormat::Pretty,
        _ => logging.format,
    };

    match &logging.directory {
        Some(directory) => init_with_file(env_filter, format, directory),
        None => {
            let registry = tracing_subscriber::registry().with(env_filter);

            match format {
                LogFormat::Json => {
                    registry
                        .with(
                            fmt::layer()
                                .json()
                                .with_target(true)
                                .with_level(true)
                                .with_writer(std::io::stderr),
                        )
                        .try_init()?;
                }
                LogFormat::Pretty => {
                    registry
                        .with(
                            fmt::layer()
                                .compact()
                                .with_target(true)
                                .with_level(true)
                                .with_writer(std::io::stderr),
                        )
                        .try_init()?;
                }
            }

            Ok(())
        }
    }
}

fn init_with_file(
    env_filter: EnvFilter,
    format: LogFormat,
    directory: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    const DAYS_TO_KEEP: usize = 7;

    let log_dir = ConfigPaths::ensure_log_dir(directory)?;

    let file_appender = tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .max_log_files(DAYS_TO_KEEP)
        .filename_prefix("artisan")
        .filename_suffix("log")
        .build(&log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .try_init()?;
        }
        LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .try_init()?;
        }
    }

    // The writer thread must outlive every command, including stay-alive ones.
    std::mem::forget(guard);

    Ok(())
}
