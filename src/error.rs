// ABOUTME: Error taxonomy for the transfer pipeline
// ABOUTME: Every variant is fatal and maps to process exit status 1

use crate::config::EndpointRole;
use std::path::PathBuf;
use thiserror::Error;

/// Terminal failure of one pipeline stage.
#[derive(Error, Debug)]
pub enum EltError {
    /// The readiness probe exhausted its retry budget
    #[error("{role} database at '{host}' did not accept connections after {attempts} attempt(s)")]
    ConnectivityTimeout {
        role: EndpointRole,
        host: String,
        attempts: u32,
    },

    #[error("Failed to dump data from source database: {0}")]
    Dump(CommandFailure),

    #[error("Failed to load data into destination database: {0}")]
    Load(CommandFailure),

    /// The dump file survived a successful load
    #[error("Failed to remove dump file {}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EltError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Why an external command did not do its job
#[derive(Error, Debug)]
pub enum CommandFailure {
    #[error("could not execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command `{command}` exited with {}", describe_code(*code))]
    Exit {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("command `{command}` succeeded but produced no file at {}", path.display())]
    MissingOutput { command: String, path: PathBuf },
}

impl CommandFailure {
    pub fn code(&self) -> Option<i32> {
        match self {
            CommandFailure::Exit { code, .. } => *code,
            _ => None,
        }
    }

    /// Captured stdout and stderr, when the command got far enough to produce any
    pub fn output(&self) -> Option<(&str, &str)> {
        match self {
            CommandFailure::Exit { stdout, stderr, .. } => Some((stdout, stderr)),
            _ => None,
        }
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("return code {}", code),
        None => "no return code (terminated by signal)".to_string(),
    }
}
