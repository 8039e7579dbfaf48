use crate::cli::args::{Cli, Commands};
use crate::models::{Accumulator, MeasurementSeries, RunningStats, StationSummary};
use crate::processors::{AggregationReport, Orchestrator};
use crate::readers::SequentialReader;
use crate::utils::{ProcessorConfig, ProgressReporter};
use crate::writers::ReportWriter;
use anyhow::{anyhow, Context};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, Level};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Process {
            input_file,
            output,
            format,
            config,
            max_workers,
            retain_series,
            quiet,
        } => {
            let mut settings = ProcessorConfig::load(config.as_deref())
                .context("Failed to load configuration")?;
            if let Some(workers) = max_workers {
                settings = settings.with_workers(workers);
            }
            if retain_series {
                settings = settings.with_retain_series(true);
            }

            let writer = ReportWriter::new().with_format(&format)?;

            info!(
                input = %input_file.display(),
                workers = settings.workers,
                retain_series = settings.retain_series,
                "Processing measurements"
            );

            let report = if settings.retain_series {
                aggregate::<MeasurementSeries>(&input_file, &settings, quiet).await?
            } else {
                aggregate::<RunningStats>(&input_file, &settings, quiet).await?
            };
            emit_report(&writer, &report.stations, output.as_deref())?;
        }

        Commands::Scan {
            input_file,
            output,
            format,
            config,
            mmap,
        } => {
            let settings = ProcessorConfig::load(config.as_deref())
                .context("Failed to load configuration")?;
            let writer = ReportWriter::new().with_format(&format)?;

            info!(input = %input_file.display(), mmap, "Scanning measurements on one thread");

            let reader = SequentialReader::new(&settings).with_mmap(mmap);
            let path = input_file.clone();
            let stations = tokio::task::spawn_blocking(move || reader.aggregate(&path))
                .await?
                .with_context(|| format!("Scan of {} aborted", input_file.display()))?;

            emit_report(&writer, &stations, output.as_deref())?;
        }
    }

    Ok(())
}

async fn aggregate<A: Accumulator>(
    input_file: &Path,
    settings: &ProcessorConfig,
    quiet: bool,
) -> anyhow::Result<AggregationReport> {
    let orchestrator = Orchestrator::<A>::open(input_file, settings)
        .await
        .with_context(|| format!("Cannot start processing {}", input_file.display()))?;

    let progress = ProgressReporter::new(
        orchestrator.file_len(),
        "Aggregating measurements...",
        quiet,
    );

    let report = orchestrator.run(Some(&progress)).await?;
    if !progress.is_silent() {
        eprintln!("\n{}", report.summary());
    }

    Ok(report)
}

fn emit_report(
    writer: &ReportWriter,
    stations: &BTreeMap<String, StationSummary>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let written = writer.write_to_path(stations, path)?;
            info!(path = %written.display(), stations = stations.len(), "Report written");
        }
        None => writer.write_report(stations, std::io::stdout().lock())?,
    }

    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    let initialised = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    initialised.map_err(|e| anyhow!("Failed to initialise logging: {}", e))
}
