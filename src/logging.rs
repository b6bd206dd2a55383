use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set.
fn default_filter(debug_mode: bool) -> EnvFilter {
    if debug_mode {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    }
}

/// Setup console logging, plus a daily rotating log file when `log_dir` is given.
///
/// `RUST_LOG` takes precedence over `debug_mode`.
///
/// # Arguments
/// * `log_dir` - Optional directory for log files (e.g., "logs")
/// * `log_prefix` - Prefix for log files (e.g., "mustang-align")
/// * `debug_mode` - If true, use debug level; otherwise use warn level
/// * `json_file` - Write the log files as JSON lines instead of plain text
///
/// # Returns
/// A guard that must be held for the duration of the program to keep file logging active
pub fn setup_logging(
    log_dir: Option<&Utf8Path>,
    log_prefix: &str,
    debug_mode: bool,
    json_file: bool,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(debug_mode));

    let (file_writer, guard) = match log_dir {
        Some(log_dir) => {
            // Create log directory if it doesn't exist
            if !log_dir.exists() {
                fs::create_dir_all(log_dir)
                    .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
            }

            // Create daily rotating file appender
            let file_appender = rolling::daily(log_dir, log_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (Some(non_blocking), Some(guard))
        }
        None => (None, None),
    };

    // At most one of these is Some; an absent layer is a no-op
    let (text_file_layer, json_file_layer) = match file_writer {
        Some(writer) if json_file => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_current_span(true)
                    .with_span_list(true),
            ),
        ),
        Some(writer) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false) // No ANSI codes in log files
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            ),
            None,
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_file_layer)
        .with(json_file_layer)
        .with(
            // Console output goes to stderr so it does not interleave with stdout results
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(false),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(log_dir) = log_dir {
        tracing::info!(
            "Logging initialized: dir={}, prefix={}, debug={}, json={}",
            log_dir,
            log_prefix,
            debug_mode,
            json_file
        );
    }

    Ok(guard)
}
