use pipeline_core::settings::Settings;
use pipeline_runtime::pipeline::Stages;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a Python-style level name to a `tracing` filter directive. Unknown
/// names are passed through unchanged.
fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber on stderr.
///
/// `RUST_LOG` takes precedence when set; otherwise `log_level` is used,
/// falling back to `"info"` if it does not form a valid directive.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level_directive(log_level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;

    Ok(())
}

// ── Stage selection ────────────────────────────────────────────────────────────

/// Translate the `--no-transform` / `--no-serve` flags.
pub fn stages_from(settings: &Settings) -> Stages {
    Stages {
        transform: !settings.no_transform,
        serve: !settings.no_serve,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
