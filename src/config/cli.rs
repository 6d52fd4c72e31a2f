use crate::config::MonitorConfig;
use crate::domain::model::Mode;
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Parser)]
#[command(name = "chassis-monitor")]
#[command(about = "Collects module health and active errors from a blade chassis CMC and sends them to Zabbix")]
pub struct CliConfig {
    /// discover: print the LLD document; check: send module items
    #[arg(long, value_enum)]
    pub mode: Mode,

    /// Zabbix host name the items belong to
    #[arg(long)]
    pub zhost: Option<String>,

    /// Chassis (CMC) address
    #[arg(long)]
    pub host: Option<String>,

    /// Chassis login
    #[arg(long)]
    pub user: Option<String>,

    /// Chassis password
    #[arg(long)]
    pub passwd: Option<String>,

    /// Chassis SSH port
    #[arg(long)]
    pub port: Option<u16>,

    /// Extra `ssh -o` option, appended to the configured ones (repeatable)
    #[arg(long = "ssh-option", value_name = "KEY=VALUE")]
    pub ssh_options: Vec<String>,

    /// TOML settings file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub zabbix_server: Option<String>,

    #[arg(long)]
    pub zabbix_port: Option<u16>,

    /// Replay captured `getmodinfo` output instead of connecting
    #[arg(long, requires = "error_log_file")]
    pub module_table_file: Option<PathBuf>,

    /// Replay captured `getactiveerrors` output instead of connecting
    #[arg(long, requires = "module_table_file")]
    pub error_log_file: Option<PathBuf>,

    /// Print the payload instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    pub fn apply(&self, config: &mut MonitorConfig) {
        if let Some(zhost) = &self.zhost {
            config.sink.host_key = zhost.clone();
        }
        if let Some(host) = &self.host {
            config.chassis.host = Some(host.clone());
        }
        if let Some(user) = &self.user {
            config.chassis.user = Some(user.clone());
        }
        if let Some(passwd) = &self.passwd {
            config.chassis.password = Some(passwd.clone());
        }
        if let Some(port) = self.port {
            config.chassis.port = port;
        }
        config.chassis.ssh_options.extend(self.ssh_options.iter().cloned());
        if let Some(server) = &self.zabbix_server {
            config.sink.server = server.clone();
        }
        if let Some(port) = self.zabbix_port {
            config.sink.port = port;
        }
    }

    /// Module table and error log captures, when both were given.
    pub fn replay_files(&self) -> Option<(&Path, &Path)> {
        match (&self.module_table_file, &self.error_log_file) {
            (Some(module_table), Some(error_log)) => Some((module_table, error_log)),
            _ => None,
        }
    }
}
