#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_discovery_macro, validate_host, validate_non_empty_string, validate_port,
    validate_required_field, Validate,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODULE_TABLE_COMMAND: &str = "getmodinfo";
pub const DEFAULT_ERROR_LOG_COMMAND: &str = "getactiveerrors";
pub const DEFAULT_ERRORS_KEY: &str = "dell_script_errors";
pub const DEFAULT_DISCOVERY_MACRO: &str = "{#DELL.MODULE.NAME}";
/// Trust a chassis key on first contact, refuse it if it later changes.
pub const DEFAULT_HOST_KEY_POLICY: &str = "StrictHostKeyChecking=accept-new";

/// Fully resolved settings: TOML file first, command line flags on top.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub chassis: ChassisSettings,
    #[serde(default)]
    pub commands: CommandSettings,
    #[serde(default)]
    pub sink: SinkSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChassisSettings {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub port: u16,
    pub ssh_binary: String,
    pub ssh_options: Vec<String>,
    pub connect_timeout_seconds: u64,
}

impl Default for ChassisSettings {
    fn default() -> Self {
        Self {
            host: None,
            user: None,
            password: None,
            port: 22,
            ssh_binary: "ssh".to_string(),
            ssh_options: vec![DEFAULT_HOST_KEY_POLICY.to_string()],
            connect_timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    pub module_table: String,
    pub error_log: String,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            module_table: DEFAULT_MODULE_TABLE_COMMAND.to_string(),
            error_log: DEFAULT_ERROR_LOG_COMMAND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkSettings {
    pub server: String,
    pub port: u16,
    pub host_key: String,
    pub errors_key: String,
    pub discovery_macro: String,
    pub timeout_seconds: u64,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            server: "127.0.0.1".to_string(),
            port: 10051,
            host_key: String::new(),
            errors_key: DEFAULT_ERRORS_KEY.to_string(),
            discovery_macro: DEFAULT_DISCOVERY_MACRO.to_string(),
            timeout_seconds: 10,
        }
    }
}

impl MonitorConfig {
    pub fn for_host(host_key: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.sink.host_key = host_key.into();
        config
    }
}

/// Checked by `SshConnector::connect`, not at startup.
impl Validate for ChassisSettings {
    fn validate(&self) -> Result<()> {
        let host = validate_required_field("chassis.host", &self.host)?;
        validate_host("chassis.host", host)?;
        let user = validate_required_field("chassis.user", &self.user)?;
        validate_non_empty_string("chassis.user", user)?;
        validate_port("chassis.port", self.port)?;
        validate_non_empty_string("chassis.ssh_binary", &self.ssh_binary)?;
        Ok(())
    }
}

impl Validate for MonitorConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("sink.host_key", &self.sink.host_key)?;
        validate_non_empty_string("sink.errors_key", &self.sink.errors_key)?;
        validate_host("sink.server", &self.sink.server)?;
        validate_port("sink.port", self.sink.port)?;
        validate_discovery_macro("sink.discovery_macro", &self.sink.discovery_macro)?;
        validate_non_empty_string("commands.module_table", &self.commands.module_table)?;
        validate_non_empty_string("commands.error_log", &self.commands.error_log)?;
        Ok(())
    }
}

impl ConfigProvider for MonitorConfig {
    fn host_key(&self) -> &str {
        &self.sink.host_key
    }

    fn module_table_command(&self) -> &str {
        &self.commands.module_table
    }

    fn error_log_command(&self) -> &str {
        &self.commands.error_log
    }

    fn errors_key(&self) -> &str {
        &self.sink.errors_key
    }

    fn discovery_macro(&self) -> &str {
        &self.sink.discovery_macro
    }
}
