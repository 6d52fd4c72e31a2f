use crate::domain::model::{SinkPayload, SinkResponse};
use crate::domain::ports::MetricSink;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Dry-run sink: pretty-prints the payload to stderr, leaving stdout to the
/// discovery document.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn render(payload: &SinkPayload) -> Result<String> {
        Ok(serde_json::to_string_pretty(payload)?)
    }
}

#[async_trait]
impl MetricSink for ConsoleSink {
    async fn send(&self, payload: &SinkPayload) -> Result<SinkResponse> {
        eprintln!("{}", Self::render(payload)?);
        Ok(SinkResponse {
            processed: payload.item_count(),
            failed: 0,
            info: "dry run, nothing sent".to_string(),
        })
    }
}
