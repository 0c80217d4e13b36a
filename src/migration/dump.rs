// ABOUTME: Wrapper for pg_dump to export the source database
// ABOUTME: Writes a plain SQL dump file that the load stage replays

use super::{pg_command, run_checked};
use crate::config::EndpointConfig;
use crate::error::{CommandFailure, EltError};
use crate::runner::CommandRunner;
use std::path::{Path, PathBuf};

/// Dump the `source` database to `output_path` using pg_dump.
///
/// Runs once, without retry. Fails if pg_dump cannot be started, exits
/// non-zero, or exits cleanly without leaving a file behind.
pub fn dump<R>(runner: &R, source: &EndpointConfig, output_path: &Path) -> Result<PathBuf, EltError>
where
    R: CommandRunner + ?Sized,
{
    tracing::info!(
        "Dumping database '{}' from {} to {}",
        source.database,
        source.host,
        output_path.display()
    );

    let spec = pg_command("pg_dump", source)
        .arg("-f")
        .arg(output_path.to_string_lossy())
        .arg("-w"); // Never prompt for a password

    run_checked(runner, &spec).map_err(EltError::Dump)?;

    if !output_path.is_file() {
        return Err(EltError::Dump(CommandFailure::MissingOutput {
            command: spec.display(),
            path: output_path.to_path_buf(),
        }));
    }

    tracing::info!("Data successfully dumped from source database.");
    Ok(output_path.to_path_buf())
}
