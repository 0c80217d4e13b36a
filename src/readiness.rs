// ABOUTME: Readiness probing for database endpoints via pg_isready
// ABOUTME: Polls with exponential backoff until a host accepts connections or retries run out

use crate::runner::{CommandOutput, CommandRunner, CommandSpec};
use std::fmt;
use std::io;
use std::time::Duration;

/// The only probe output recognized as ready.
///
/// Matching is literal: other wording from the probe, even if it means the
/// server is up, counts as a failed attempt.
pub const READY_PHRASE: &str = "accepting connections";

const PROBE_PROGRAM: &str = "pg_isready";

/// pg_isready exits with 3 when it was given unusable parameters
const PROBE_BAD_PARAMETERS: i32 = 3;

/// How long and how often to wait for an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Probe attempts before giving up
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay after the `attempt`-th failure (1-based): `base_delay * 2^attempt`.
    ///
    /// Saturates at `Duration::MAX` instead of overflowing.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

/// Result of a single readiness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Ready,
    /// The probe ran but did not report the ready phrase
    NotReady(String),
    /// The probe itself could not do its job
    Error(String),
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Ready => write!(f, "{}", READY_PHRASE),
            ProbeOutcome::NotReady(detail) => write!(f, "not ready ({})", detail),
            ProbeOutcome::Error(detail) => write!(f, "probe error ({})", detail),
        }
    }
}

/// Classify the output of one pg_isready run
pub fn parse_probe_output(output: &CommandOutput) -> ProbeOutcome {
    if output.code == Some(PROBE_BAD_PARAMETERS) {
        return ProbeOutcome::Error(describe(output, "invalid parameters"));
    }

    if output.success() && output.stdout.contains(READY_PHRASE) {
        ProbeOutcome::Ready
    } else {
        ProbeOutcome::NotReady(describe(output, "no ready status reported"))
    }
}

fn describe(output: &CommandOutput, fallback: &str) -> String {
    let text = if output.stdout.trim().is_empty() {
        output.stderr.trim()
    } else {
        output.stdout.trim()
    };
    let code = output
        .code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());

    if text.is_empty() {
        format!("exit {}: {}", code, fallback)
    } else {
        format!("exit {}: {}", code, text)
    }
}

fn classify(result: io::Result<CommandOutput>) -> ProbeOutcome {
    match result {
        Ok(output) => parse_probe_output(&output),
        Err(e) => ProbeOutcome::Error(format!("failed to run {}: {}", PROBE_PROGRAM, e)),
    }
}

/// Probe `host` once
pub fn probe<R>(runner: &R, host: &str) -> ProbeOutcome
where
    R: CommandRunner + ?Sized,
{
    let spec = CommandSpec::new(PROBE_PROGRAM).arg("-h").arg(host);
    classify(runner.run(&spec))
}

/// Wait for `host` to accept connections.
///
/// Returns `true` as soon as a probe reports [`READY_PHRASE`]. Every other
/// outcome is a failed attempt followed by a sleep of
/// [`RetryPolicy::delay_for`] the attempt number. Returns `false` after
/// `max_retries` failed attempts; no sleep follows the last one.
pub async fn wait_for_ready<R>(runner: &R, host: &str, policy: &RetryPolicy) -> bool
where
    R: CommandRunner + ?Sized,
{
    let mut attempts = 0;

    while attempts < policy.max_retries {
        let outcome = probe(runner, host);
        if outcome == ProbeOutcome::Ready {
            tracing::info!("Successfully connected to {}!", host);
            return true;
        }

        attempts += 1;
        tracing::warn!(
            "Error connecting to {}: {} (attempt {}/{})",
            host,
            outcome,
            attempts,
            policy.max_retries
        );

        if attempts < policy.max_retries {
            let delay = policy.delay_for(attempts);
            tracing::info!(
                "Retrying in {:?}... (Attempt {}/{})",
                delay,
                attempts,
                policy.max_retries
            );
            tokio::time::sleep(delay).await;
        }
    }

    tracing::error!(
        "Max retries reached. Failed to connect to {} after {} attempt(s)",
        host,
        attempts
    );
    false
}
