use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};
use uuid::Uuid;

use crate::config::{LoggingConfig, LoggingRotation};

const LOG_FILE_PREFIX: &str = "recart.log";

/// Keeps the non-blocking log writer alive for the process lifetime and
/// carries the run id stamped into every startup line.
pub struct LoggingGuard {
    _worker_guard: WorkerGuard,
    run_id: String,
}

impl LoggingGuard {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

/// Installs the process-wide subscriber: a JSON rolling file plus an
/// optional WARN mirror on stderr. Field-level validation of the logging
/// section already happened in `Config`; this only deals with the
/// filesystem and the subscriber registry.
pub fn init_tracing(logging_config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_dir = if logging_config.dir.is_absolute() {
        logging_config.dir.clone()
    } else {
        std::env::current_dir()
            .context("failed to read current working directory for logging.dir resolution")?
            .join(&logging_config.dir)
    };
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create logging directory {}", log_dir.display()))?;

    let appender = match logging_config.rotation {
        LoggingRotation::Daily => rolling::daily(&log_dir, LOG_FILE_PREFIX),
        LoggingRotation::Hourly => rolling::hourly(&log_dir, LOG_FILE_PREFIX),
    };
    let (writer, worker_guard) = tracing_appender::non_blocking(appender);

    let env_filter = EnvFilter::try_new(&logging_config.filter)
        .with_context(|| format!("failed to parse logging.filter '{}'", logging_config.filter))?;
    let file_layer = fmt::layer()
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(env_filter);
    let stderr_layer = logging_config.stderr_warn_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    let run_id = Uuid::now_v7().to_string();
    tracing::info!(
        target: "logging",
        run_id = %run_id,
        dir = %log_dir.display(),
        filter = %logging_config.filter,
        rotation = ?logging_config.rotation,
        retention_days = logging_config.retention_days,
        "logging_initialized"
    );

    // The subscriber is live, so the sweep can report problems directly.
    let removed = sweep_expired_logs(
        &log_dir,
        logging_config.retention_days,
        SystemTime::now(),
    );
    if removed > 0 {
        tracing::info!(target: "logging", removed, "expired_log_files_removed");
    }

    Ok(LoggingGuard {
        _worker_guard: worker_guard,
        run_id,
    })
}

/// Deletes `recart.log*` files older than the retention window and returns
/// how many went away. Anything that cannot be inspected or removed is
/// warned about and left in place.
fn sweep_expired_logs(log_dir: &Path, retention_days: usize, now: SystemTime) -> usize {
    let retention = Duration::from_secs(retention_days.saturating_mul(24 * 60 * 60) as u64);
    let cutoff = now.checked_sub(retention).unwrap_or(SystemTime::UNIX_EPOCH);

    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(
                target: "logging",
                dir = %log_dir.display(),
                error = %err,
                "log_retention_scan_failed"
            );
            return 0;
        }
    };

    let mut removed = 0;
    for path in entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_expired_log(path, cutoff))
    {
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(err) => tracing::warn!(
                target: "logging",
                file = %path.display(),
                error = %err,
                "log_retention_removal_failed"
            ),
        }
    }
    removed
}

fn is_expired_log(path: &PathBuf, cutoff: SystemTime) -> bool {
    let prefixed = path
        .file_name()
        .map(|name| name.to_string_lossy().starts_with(LOG_FILE_PREFIX))
        .unwrap_or(false);
    if !prefixed {
        return false;
    }

    match path.metadata() {
        Ok(metadata) if metadata.is_file() => metadata
            .modified()
            .map(|modified| modified <= cutoff)
            .unwrap_or(false),
        _ => false,
    }
}
