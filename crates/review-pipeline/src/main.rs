mod bootstrap;

use anyhow::Result;
use pipeline_core::settings::Settings;
use pipeline_runtime::pipeline::{Pipeline, PipelineConfig};

fn main() -> Result<()> {
    let settings = Settings::load()?;

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("review-pipeline v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Raw: {}, Processed: {}",
        settings.raw_dir.display(),
        settings.processed_dir.display()
    );

    let stages = bootstrap::stages_from(&settings);
    if !stages.transform && !stages.serve {
        tracing::warn!("Both --no-transform and --no-serve given; nothing to do");
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig::new(
        settings.raw_dir.clone(),
        settings.processed_dir.clone(),
    ));
    let report = pipeline.run(stages)?;

    if let Some(serve) = &report.serve {
        tracing::info!(
            "Pipeline complete: {} app KPI rows, {} daily rows",
            serve.kpi_rows,
            serve.daily_rows
        );
    }

    Ok(())
}
