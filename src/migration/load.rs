// ABOUTME: Wrapper for psql to replay the dump file into the destination
// ABOUTME: Reports the failing command, return code and captured output on error

use super::{pg_command, run_checked};
use crate::config::EndpointConfig;
use crate::error::EltError;
use crate::runner::CommandRunner;
use std::path::Path;

/// Load the SQL file at `input_path` into `destination` using psql
pub fn load<R>(runner: &R, destination: &EndpointConfig, input_path: &Path) -> Result<(), EltError>
where
    R: CommandRunner + ?Sized,
{
    tracing::info!(
        "Loading {} into database '{}' on {}",
        input_path.display(),
        destination.database,
        destination.host
    );

    let spec = pg_command("psql", destination)
        .arg("-a") // Echo every statement so the captured output shows progress
        .arg("-f")
        .arg(input_path.to_string_lossy());

    let output = run_checked(runner, &spec).map_err(EltError::Load)?;
    tracing::debug!("psql output:\n{}", output.stdout);

    tracing::info!("Data successfully loaded into destination database.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointRole;
    use crate::runner::{CommandOutput, CommandSpec};
    use secrecy::{ExposeSecret, SecretString};
    use std::cell::RefCell;
    use std::io;

    struct FakePsql {
        code: i32,
        seen: RefCell<Vec<(Vec<String>, String)>>,
    }

    impl CommandRunner for FakePsql {
        fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
            let password = spec
                .env
                .iter()
                .find(|(k, _)| k == "PGPASSWORD")
                .map(|(_, v)| v.expose_secret().clone())
                .unwrap_or_default();
            self.seen.borrow_mut().push((spec.args.clone(), password));
            Ok(CommandOutput {
                code: Some(self.code),
                stdout: "CREATE TABLE\n".to_string(),
                stderr: if self.code == 0 {
                    String::new()
                } else {
                    "psql: error: connection refused".to_string()
                },
            })
        }
    }

    fn destination() -> EndpointConfig {
        EndpointConfig {
            role: EndpointRole::Destination,
            host: "destination_postgres".to_string(),
            user: "postgres".to_string(),
            password: SecretString::new("dest-pass".to_string()),
            database: "destination_db".to_string(),
        }
    }

    #[test]
    fn test_load_builds_psql_command() {
        let runner = FakePsql {
            code: 0,
            seen: RefCell::new(Vec::new()),
        };

        load(&runner, &destination(), Path::new("data_dump.sql")).unwrap();

        let seen = runner.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].0,
            vec![
                "-h",
                "destination_postgres",
                "-U",
                "postgres",
                "-d",
                "destination_db",
                "-a",
                "-f",
                "data_dump.sql"
            ]
        );
        assert_eq!(seen[0].1, "dest-pass");
    }

    #[test]
    fn test_load_failure_reports_command_code_and_output() {
        let runner = FakePsql {
            code: 1,
            seen: RefCell::new(Vec::new()),
        };

        let err = load(&runner, &destination(), Path::new("data_dump.sql")).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("psql -h destination_postgres"));
        assert!(msg.contains("return code 1"));
        match err {
            EltError::Load(failure) => {
                let (stdout, stderr) = failure.output().unwrap();
                assert_eq!(stdout, "CREATE TABLE\n");
                assert!(stderr.contains("connection refused"));
            }
            other => panic!("expected load error, got {:?}", other),
        }
    }
}
