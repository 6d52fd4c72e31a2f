// Adapters layer: concrete implementations for the chassis session and the metric sinks.

pub mod console;
pub mod replay;
pub mod ssh;
pub mod zabbix;

pub use console::ConsoleSink;
pub use replay::ReplaySource;
pub use ssh::{SshConnector, SshSession};
pub use zabbix::ZabbixSender;
