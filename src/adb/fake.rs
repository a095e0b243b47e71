// Scripted CommandRunner used by bridge and sync tests
use super::error::{BridgeError, BridgeResult};
use super::types::CommandRunner;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    Stdout(String),
    /// Non-zero exit with this stderr
    Fail(String),
    Timeout,
    Unavailable,
    /// Behave like a successful `adb pull`: write the contents to the last argument
    PullFile(String),
}

#[derive(Debug, Clone)]
pub struct Call {
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Call {
    pub fn line(&self) -> String {
        self.args.join(" ")
    }
}

/// Replies are chosen by the first rule whose pattern occurs in the joined
/// argument line. Unmatched commands succeed with empty output.
#[derive(Debug, Default)]
pub struct FakeRunner {
    rules: Vec<(String, Reply)>,
    calls: Mutex<Vec<Call>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, pattern: &str, reply: Reply) -> Self {
        self.rules.push((pattern.to_string(), reply));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls().iter().map(Call::line).collect()
    }
}

impl CommandRunner for FakeRunner {
    async fn run(&self, args: &[&str], timeout: Duration) -> BridgeResult<String> {
        let line = args.join(" ");
        self.calls.lock().unwrap().push(Call {
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout,
        });
        let reply = self
            .rules
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or(Reply::Stdout(String::new()));

        let command = format!("adb {line}");
        match reply {
            Reply::Stdout(out) => Ok(out),
            Reply::Fail(stderr) => Err(BridgeError::CommandFailed {
                command,
                code: Some(1),
                stderr,
            }),
            Reply::Timeout => Err(BridgeError::Timeout { command, timeout }),
            Reply::Unavailable => Err(BridgeError::Unavailable {
                program: "adb".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
            Reply::PullFile(contents) => {
                let dest = args.last().expect("pull destination");
                std::fs::write(dest, contents).expect("write pulled file");
                Ok(format!("{dest}: 1 file pulled.\n"))
            }
        }
    }
}
