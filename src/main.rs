// ABOUTME: CLI entry point for postgres-elt
// ABOUTME: Loads configuration, runs the pipeline, and owns the single process exit

use clap::Parser;
use postgres_elt::config::{PipelineConfig, RunSettings};
use postgres_elt::pipeline::Pipeline;
use postgres_elt::runner::SystemRunner;
use postgres_elt::{logging, utils, EltError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "postgres-elt")]
#[command(
    about = "Copy a PostgreSQL database into another with pg_dump and psql",
    long_about = "Waits for the source (SOURCE_DB_*) and destination (DEST_DB_*) databases \
                  to accept connections, dumps the source to a SQL file, loads it into the \
                  destination and removes the file."
)]
struct Cli {
    /// TOML file with [retry] and [paths] settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Readiness probe attempts per database before giving up
    #[arg(long)]
    max_retries: Option<u32>,
    /// Base of the exponential backoff between probes, in seconds
    #[arg(long)]
    base_delay_secs: Option<u64>,
    /// Where to write the intermediate dump file
    #[arg(long)]
    dump_file: Option<PathBuf>,
    /// Where to append log lines
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<RunSettings> {
        let mut settings = match &self.config {
            Some(path) => RunSettings::from_file(path)?,
            None => RunSettings::default(),
        };

        if let Some(max_retries) = self.max_retries {
            settings.retry.max_retries = max_retries;
        }
        if let Some(secs) = self.base_delay_secs {
            settings.retry.base_delay = Duration::from_secs(secs);
        }
        if let Some(dump_file) = &self.dump_file {
            settings.dump_path = dump_file.clone();
        }
        if let Some(log_file) = &self.log_file {
            settings.log_path = log_file.clone();
        }

        Ok(settings)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match logging::init_logging(&settings.log_path) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            let code = e
                .downcast_ref::<EltError>()
                .map(EltError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}

async fn run(settings: &RunSettings) -> anyhow::Result<()> {
    utils::check_required_tools()?;

    let config = PipelineConfig::from_env(settings)?;
    let runner = SystemRunner;

    let report = Pipeline::new(&config, &runner).run().await.map_err(|e| {
        log_failure_details(&e);
        e
    })?;

    tracing::info!(
        "Transferred {} bytes of SQL in {:?}",
        report.artifact_bytes,
        report.elapsed
    );
    Ok(())
}

/// Log captured command output for stage failures that have any
fn log_failure_details(err: &EltError) {
    if let EltError::Dump(failure) | EltError::Load(failure) = err {
        if let Some((stdout, stderr)) = failure.output() {
            tracing::error!("Command output: {}", stdout.trim());
            tracing::error!("Command stderr: {}", stderr.trim());
        }
    }
}
