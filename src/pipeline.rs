// ABOUTME: Sequential transfer pipeline: probe both endpoints, dump, load, clean up
// ABOUTME: Stops at the first failing stage and hands its error back to the caller

use crate::config::{EndpointConfig, PipelineConfig};
use crate::error::EltError;
use crate::migration;
use crate::readiness::wait_for_ready;
use crate::runner::CommandRunner;
use std::time::{Duration, Instant};

/// Summary of a completed transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// Size of the dump file that was loaded and then removed
    pub artifact_bytes: u64,
    pub elapsed: Duration,
}

pub struct Pipeline<'a, R: CommandRunner + ?Sized> {
    config: &'a PipelineConfig,
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> Pipeline<'a, R> {
    pub fn new(config: &'a PipelineConfig, runner: &'a R) -> Self {
        Self { config, runner }
    }

    /// Run every stage in order.
    ///
    /// The dump file is only removed after a successful load; when loading
    /// fails it stays on disk for inspection.
    pub async fn run(&self) -> Result<TransferReport, EltError> {
        let started = Instant::now();

        self.await_endpoint(&self.config.source).await?;
        self.await_endpoint(&self.config.destination).await?;

        tracing::info!("Starting ELT process...");

        let artifact = migration::dump(self.runner, &self.config.source, &self.config.dump_path)?;
        let artifact_bytes = std::fs::metadata(&artifact).map(|m| m.len()).unwrap_or(0);
        tracing::info!(
            "Dump file {} is {} bytes",
            artifact.display(),
            artifact_bytes
        );

        migration::load(self.runner, &self.config.destination, &artifact)?;
        migration::cleanup(&artifact)?;

        let report = TransferReport {
            artifact_bytes,
            elapsed: started.elapsed(),
        };
        tracing::info!("Ending ELT script... (took {:?})", report.elapsed);
        Ok(report)
    }

    async fn await_endpoint(&self, endpoint: &EndpointConfig) -> Result<(), EltError> {
        tracing::info!(
            "Waiting for {} database at {}",
            endpoint.role,
            endpoint.host
        );

        if wait_for_ready(self.runner, &endpoint.host, &self.config.retry).await {
            Ok(())
        } else {
            Err(EltError::ConnectivityTimeout {
                role: endpoint.role,
                host: endpoint.host.clone(),
                attempts: self.config.retry.max_retries,
            })
        }
    }
}
