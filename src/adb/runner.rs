use super::error::{BridgeError, BridgeResult};
use super::types::CommandRunner;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Runs the external `adb` binary.
#[derive(Debug, Clone)]
pub struct AdbProcess {
    program: String,
}

impl AdbProcess {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command_line(&self, args: &[&str]) -> String {
        let mut line = self.program.clone();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl CommandRunner for AdbProcess {
    async fn run(&self, args: &[&str], timeout: Duration) -> BridgeResult<String> {
        let command = self.command_line(args);
        log::debug!("Running: {command}");

        // The child is killed if the timeout drops the wait future.
        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => BridgeError::Unavailable {
                    program: self.program.clone(),
                    source: e,
                },
                _ => BridgeError::CommandFailed {
                    command: command.clone(),
                    code: None,
                    stderr: format!("failed to spawn: {e}"),
                },
            })?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(BridgeError::CommandFailed {
                    command,
                    code: None,
                    stderr: format!("failed to collect output: {e}"),
                });
            }
            Err(_) => {
                log::warn!("'{command}' timed out after {timeout:?}, killing it");
                return Err(BridgeError::Timeout { command, timeout });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            // adb sometimes reports errors on stdout only
            let stderr = if stderr.is_empty() {
                stdout.trim().to_string()
            } else {
                stderr
            };
            return Err(BridgeError::CommandFailed {
                command,
                code: output.status.code(),
                stderr,
            });
        }
        if !stderr.is_empty() {
            log::warn!("'{command}' stderr: {stderr}");
        }
        Ok(stdout)
    }
}
