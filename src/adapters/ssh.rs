//! OpenSSH-backed chassis session.
//!
//! `connect` authenticates once and leaves a control master running in the
//! background; each `execute` multiplexes over it. `release` asks the master
//! to exit. A session dropped without `release` does the same from `Drop`.

use crate::config::{ChassisSettings, MonitorConfig};
use crate::domain::ports::{CommandSource, Connector};
use crate::utils::error::{MonitorError, Result};
use crate::utils::validation::Validate;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::{ExitStatus, Output, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::process::Command;
use tokio::runtime::{Handle, RuntimeFlavor};

static SESSION_COUNTER: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone)]
pub struct SshConnector {
    host: String,
    user: String,
    settings: ChassisSettings,
}

impl SshConnector {
    pub fn new(config: &MonitorConfig) -> Self {
        let settings = config.chassis.clone();
        Self {
            host: settings.host.clone().unwrap_or_default(),
            user: settings.user.clone().unwrap_or_default(),
            settings,
        }
    }

    fn control_path() -> PathBuf {
        let n = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("chassis-monitor-{}-{}.sock", std::process::id(), n))
    }
}

#[async_trait]
impl Connector for SshConnector {
    type Session = SshSession;

    async fn connect(&self) -> Result<SshSession> {
        self.settings.validate()?;

        let mut session = SshSession {
            host: self.host.clone(),
            user: self.user.clone(),
            settings: self.settings.clone(),
            control_path: Self::control_path(),
            open: false,
        };

        tracing::info!(
            "🔌 Connecting to {}@{}:{}",
            session.user,
            session.host,
            session.settings.port
        );

        // The backgrounded master keeps any inherited pipes open, so its
        // diagnostics go to a log file instead of stderr.
        let log_path = session.control_path.with_extension("log");
        let mut command = session.command();
        command
            .args(["-M", "-f", "-N", "-E"])
            .arg(&log_path)
            .arg(&session.host)
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let timeout = Duration::from_secs(session.settings.connect_timeout_seconds + 5);

        let status = tokio::time::timeout(timeout, command.status()).await;
        let log = tokio::fs::read_to_string(&log_path).await.unwrap_or_default();
        let _ = tokio::fs::remove_file(&log_path).await;

        let status = match status {
            Ok(result) => result.map_err(|e| session.connection_error(e.to_string()))?,
            Err(_) => {
                return Err(session.connection_error(format!("timed out after {:?}", timeout)))
            }
        };

        if !status.success() {
            let message = match log.trim() {
                "" => format!("ssh exited with {}", status),
                text => text.to_string(),
            };
            return Err(session.connection_error(message));
        }

        session.open = true;
        tracing::debug!("Control master ready at {}", session.control_path.display());
        Ok(session)
    }

    async fn release(&self, session: SshSession) {
        session.close().await;
    }
}

#[derive(Debug)]
pub struct SshSession {
    host: String,
    user: String,
    settings: ChassisSettings,
    control_path: PathBuf,
    open: bool,
}

impl SshSession {
    /// Base `ssh` invocation, wrapped in `sshpass -e` when a password is set.
    fn command(&self) -> Command {
        let mut command = match &self.settings.password {
            Some(password) => {
                let mut c = Command::new("sshpass");
                c.arg("-e").arg(&self.settings.ssh_binary).env("SSHPASS", password);
                c
            }
            None => {
                let mut c = Command::new(&self.settings.ssh_binary);
                c.args(["-o", "BatchMode=yes"]);
                c
            }
        };

        command
            .arg("-p")
            .arg(self.settings.port.to_string())
            .arg("-l")
            .arg(&self.user)
            .arg("-S")
            .arg(&self.control_path)
            .args(["-o", "LogLevel=ERROR"])
            .arg("-o")
            .arg(format!("ConnectTimeout={}", self.settings.connect_timeout_seconds));
        for option in &self.settings.ssh_options {
            command.arg("-o").arg(option);
        }

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn connection_error(&self, message: String) -> MonitorError {
        MonitorError::ConnectionError {
            host: self.host.clone(),
            message,
        }
    }

    fn exit_request(&self) -> std::process::Command {
        let mut command = std::process::Command::new(&self.settings.ssh_binary);
        command
            .arg("-S")
            .arg(&self.control_path)
            .args(["-O", "exit"])
            .arg(&self.host)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }

    fn released(&self, status: std::io::Result<ExitStatus>) {
        match status {
            Ok(s) if s.success() => tracing::debug!("Closed session to {}", self.host),
            Ok(s) => tracing::warn!("Control master for {} exited with {}", self.host, s),
            Err(e) => tracing::warn!("Could not stop control master for {}: {}", self.host, e),
        }
        let _ = std::fs::remove_file(&self.control_path);
    }

    /// Stops the control master without blocking the runtime.
    pub async fn close(mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        let status = Command::from(self.exit_request()).status().await;
        self.released(status);
    }
}

#[async_trait]
impl CommandSource for SshSession {
    async fn execute(&self, command: &str) -> Result<String> {
        let failed = |message: String| MonitorError::CommandExecutionError {
            command: command.to_string(),
            message,
        };

        let output = self
            .command()
            .args(["-o", "ControlMaster=no"])
            .arg(&self.host)
            .arg(command)
            .output()
            .await
            .map_err(|e| failed(e.to_string()))?;

        // The CMC reports command errors on stderr, sometimes with exit code 0.
        let stderr = stderr_text(&output);
        if !stderr.is_empty() {
            return Err(failed(stderr));
        }
        if !output.status.success() {
            return Err(failed(format!("exited with {}", output.status)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        tracing::debug!("'{}' returned {} bytes", command, stdout.len());
        Ok(stdout)
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        tracing::debug!("Session to {} dropped without close", self.host);

        let mut request = self.exit_request();
        let status = match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| request.status())
            }
            _ => request.status(),
        };
        self.released(status);
    }
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
