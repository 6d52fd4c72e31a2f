use crate::config::MonitorConfig;
use crate::domain::ports::{CommandSource, Connector};
use crate::utils::error::{MonitorError, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Answers the two CMC commands from files captured earlier, for offline
/// troubleshooting of parsing problems.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    module_table_command: String,
    error_log_command: String,
    module_table_file: PathBuf,
    error_log_file: PathBuf,
}

impl ReplaySource {
    pub fn new(config: &MonitorConfig, module_table_file: PathBuf, error_log_file: PathBuf) -> Self {
        Self {
            module_table_command: config.commands.module_table.clone(),
            error_log_command: config.commands.error_log.clone(),
            module_table_file,
            error_log_file,
        }
    }
}

#[async_trait]
impl CommandSource for ReplaySource {
    async fn execute(&self, command: &str) -> Result<String> {
        let path = if command == self.module_table_command {
            &self.module_table_file
        } else if command == self.error_log_command {
            &self.error_log_file
        } else {
            return Err(MonitorError::CommandExecutionError {
                command: command.to_string(),
                message: "no capture file for this command".to_string(),
            });
        };

        tracing::debug!("Replaying '{}' from {}", command, path.display());
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| MonitorError::CommandExecutionError {
                command: command.to_string(),
                message: format!("{}: {}", path.display(), e),
            })
    }
}

#[async_trait]
impl Connector for ReplaySource {
    type Session = ReplaySource;

    async fn connect(&self) -> Result<ReplaySource> {
        Ok(self.clone())
    }
}
