//! Logging setup for the `onboard` binary
//!
//! Everything goes to stderr through one global `tracing` subscriber.
//! Records emitted through the `log` facade by HTTP dependencies are
//! forwarded into the same pipeline.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, registry::LookupSpan};

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("`log` records cannot be forwarded to tracing: {0}")]
    LogBridge(#[from] log::SetLoggerError),
    #[error("another global subscriber is already installed: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install the global subscriber once per process
///
/// `RUST_LOG` takes precedence over `ONBOARD_LOG_LEVEL`. Neither a foreign
/// `log` logger nor an existing subscriber aborts the run; both are reported
/// on stderr and logging carries on with whatever is already in place.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryInitError> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    if let Err(err) = forward_log_records() {
        report_degraded(&err);
    }

    let subscriber = tracing_subscriber::registry()
        .with(level_filter(&config.log_level))
        .with(stderr_layer(&config.log_format));
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        INSTALLED.store(false, Ordering::SeqCst);
        report_degraded(&TelemetryInitError::from(err));
    }

    Ok(())
}

/// Route `log` records into tracing; an existing `LogTracer` counts as done
fn forward_log_records() -> Result<(), TelemetryInitError> {
    match LogTracer::builder()
        .with_max_level(log::LevelFilter::Trace)
        .init()
    {
        Ok(()) => Ok(()),
        Err(_) if std::any::type_name_of_val(log::logger()).contains("LogTracer") => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Crate targets at `level`, dependencies at `warn`
fn default_directives(level: &str) -> String {
    format!("warn,onboarding={level},onboard={level}")
}

/// Human-readable output for `pretty`, one JSON object per line otherwise
fn stderr_layer<S>(format: &str) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    if format == "pretty" {
        fmt::layer().pretty().with_writer(io::stderr).boxed()
    } else {
        fmt::layer().json().with_writer(io::stderr).boxed()
    }
}

fn report_degraded(err: &TelemetryInitError) {
    eprintln!("onboard: logging degraded, {err}");
}
