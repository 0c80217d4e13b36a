// ABOUTME: Transfer stages wrapping the PostgreSQL client tools
// ABOUTME: Dump the source, load into the destination, remove the dump file

pub mod cleanup;
pub mod dump;
pub mod load;

pub use cleanup::cleanup;
pub use dump::dump;
pub use load::load;

use crate::config::EndpointConfig;
use crate::error::CommandFailure;
use crate::runner::{CommandOutput, CommandRunner, CommandSpec};
use secrecy::{ExposeSecret, SecretString};

/// Start a client tool invocation carrying `endpoint`'s connection parameters.
///
/// The password goes into the child's `PGPASSWORD` only, never onto the
/// command line where it would show up in process listings.
fn pg_command(program: &str, endpoint: &EndpointConfig) -> CommandSpec {
    CommandSpec::new(program)
        .arg("-h")
        .arg(&endpoint.host)
        .arg("-U")
        .arg(&endpoint.user)
        .arg("-d")
        .arg(&endpoint.database)
        .env(
            "PGPASSWORD",
            SecretString::new(endpoint.password.expose_secret().clone()),
        )
}

/// Run `spec`, treating anything but exit status 0 as a failure
fn run_checked<R>(runner: &R, spec: &CommandSpec) -> Result<CommandOutput, CommandFailure>
where
    R: CommandRunner + ?Sized,
{
    let output = runner.run(spec).map_err(|source| CommandFailure::Spawn {
        command: spec.display(),
        source,
    })?;

    if output.success() {
        Ok(output)
    } else {
        Err(CommandFailure::Exit {
            command: spec.display(),
            code: output.code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
