use crate::domain::model::{SinkPayload, SinkResponse};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Something that can run a CMC command and hand back its text output.
#[async_trait]
pub trait CommandSource: Send + Sync {
    async fn execute(&self, command: &str) -> Result<String>;
}

/// Opens a remote session. `release` closes it; a session that is dropped
/// without being released must still clean up after itself.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: CommandSource;

    async fn connect(&self) -> Result<Self::Session>;

    async fn release(&self, session: Self::Session) {
        drop(session);
    }
}

#[async_trait]
pub trait MetricSink: Send + Sync {
    async fn send(&self, payload: &SinkPayload) -> Result<SinkResponse>;
}

pub trait ConfigProvider: Send + Sync {
    fn host_key(&self) -> &str;
    fn module_table_command(&self) -> &str;
    fn error_log_command(&self) -> &str;
    fn errors_key(&self) -> &str;
    fn discovery_macro(&self) -> &str;
}
