//! SSH transport with streaming output
//!
//! Spawns `sshpass -e ssh ...` so the password travels through the
//! `SSHPASS` environment variable and never appears on the command line.

use super::{CommandOutput, CommandTransport, Connection};
use crate::error::TransportError;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use workshop_common::defaults::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_PROVISION_TIMEOUT};

/// Program used to feed the password to ssh
pub const SSHPASS_PROGRAM: &str = "sshpass";

/// Environment variable `sshpass -e` reads the password from
const SSHPASS_ENV: &str = "SSHPASS";

/// Configuration for command execution
#[derive(Debug, Clone)]
pub struct CommandConfig {
    /// Command timeout (kills the process if exceeded)
    pub timeout: Duration,
    /// SSH connect timeout
    pub connect_timeout: Duration,
    /// Time to wait for output readers to drain after the command exits
    pub stream_flush_timeout: Duration,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_PROVISION_TIMEOUT),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            stream_flush_timeout: Duration::from_secs(2),
        }
    }
}

impl CommandConfig {
    /// Create with custom timeout, default connect and flush timeouts
    pub fn with_timeout_secs(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            ..Self::default()
        }
    }
}

/// Runs remote commands through `sshpass` + `ssh`
#[derive(Debug, Clone)]
pub struct SshTransport {
    program: String,
    config: CommandConfig,
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new(CommandConfig::default())
    }
}

impl SshTransport {
    pub fn new(config: CommandConfig) -> Self {
        Self {
            program: SSHPASS_PROGRAM.to_string(),
            config,
        }
    }

    /// Use a different launcher program (it receives the same arguments)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments passed to the launcher program
    pub fn args(&self, connection: &Connection, command: &str) -> Vec<String> {
        vec![
            "-e".to_string(),
            "ssh".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout.as_secs()),
            format!("{}@{}", connection.user, connection.host),
            command.to_string(),
        ]
    }
}

/// Read lines from a child pipe, logging each one
fn collect_lines<R>(reader: R, host: String, stream: &'static str) -> JoinHandle<Vec<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut collected = Vec::new();
        // Keep draining past invalid UTF-8 so the child never blocks on a full pipe
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf);
                    let line = text.trim_end_matches(['\n', '\r']).to_string();
                    debug!(host = %host, stream, "{line}");
                    collected.push(line);
                }
            }
        }
        collected
    })
}

impl CommandTransport for SshTransport {
    async fn run(
        &self,
        connection: &Connection,
        command: &str,
    ) -> Result<CommandOutput, TransportError> {
        let host = connection.host.clone();
        info!(
            host = %host,
            user = %connection.user,
            command,
            timeout_secs = self.config.timeout.as_secs(),
            "Running remote command"
        );

        let spawn_error = |source| TransportError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(self.args(connection, command))
            .env(SSHPASS_ENV, connection.password.expose())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_error(std::io::Error::other("stdout not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| spawn_error(std::io::Error::other("stderr not captured")))?;

        let stdout_handle = collect_lines(stdout, host.clone(), "stdout");
        let stderr_handle = collect_lines(stderr, host.clone(), "stderr");

        let status = match tokio::time::timeout(self.config.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(source)) => return Err(TransportError::Wait { host, source }),
            Err(_) => {
                warn!(
                    host = %host,
                    timeout_secs = self.config.timeout.as_secs(),
                    "Command timed out, killing process"
                );
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill timed-out process");
                }
                return Err(TransportError::Timeout {
                    host,
                    timeout_secs: self.config.timeout.as_secs(),
                });
            }
        };

        let flush = self.config.stream_flush_timeout;
        let output = CommandOutput {
            stdout: tokio::time::timeout(flush, stdout_handle)
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default(),
            stderr: tokio::time::timeout(flush, stderr_handle)
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default(),
        };

        if !status.success() {
            for line in &output.stderr {
                warn!(host = %host, "{line}");
            }
            return Err(TransportError::NonZeroExit {
                host,
                code: status.code(),
            });
        }

        info!(host = %host, lines = output.stdout.len(), "Remote command finished");
        Ok(output)
    }
}
