use std::process::{Command, Stdio};

use miette::Diagnostic;
use thiserror::Error;

use crate::config::BuildCommand;

#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error("unable to start release build '{command}'")]
    #[diagnostic(
        code(docship::release::spawn),
        help("Make sure the build program is installed and on PATH")
    )]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("release build '{command}' failed{}", exit_status(.code))]
    #[diagnostic(
        code(docship::release::failed),
        help("Fix the build errors above and re-run; no assets were copied")
    )]
    Failed { command: String, code: Option<i32> },
}
impl BuildError {
    /// Status the whole process should exit with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Failed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {}", code),
        None => " (terminated by signal)".to_string(),
    }
}

/// Runs the external release build.
pub trait ReleaseBuilder {
    fn build(&self, command: &BuildCommand) -> Result<(), BuildError>;
}

/// Spawns the build as a child process sharing this process's standard streams,
/// so its output reaches the user directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessBuilder;

impl ReleaseBuilder for ProcessBuilder {
    fn build(&self, command: &BuildCommand) -> Result<(), BuildError> {
        log::debug!("running release build: {}", command);

        let status = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|error| BuildError::Spawn {
                command: command.to_string(),
                source: error,
            })?;

        if status.success() {
            log::debug!("release build finished");
            Ok(())
        } else {
            Err(BuildError::Failed {
                command: command.to_string(),
                code: status.code(),
            })
        }
    }
}
