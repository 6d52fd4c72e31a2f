use crate::core::monitor::{Diagnostics, Monitor};
use crate::domain::model::{DiscoveryDocument, MetricMap, Mode, SinkPayload, SinkResponse};
use crate::domain::ports::{ConfigProvider, Connector, MetricSink};
use crate::utils::error::Result;

pub const CONNECTION_FAILED: &str = "Errors occurred while connecting to the chassis";

/// Everything one invocation produced. `delivery` is the sink's verdict on
/// `payload`; the payload itself is built even when nothing else worked.
#[derive(Debug)]
pub struct RunReport {
    pub mode: Mode,
    pub payload: SinkPayload,
    pub discovery: Option<DiscoveryDocument>,
    pub diagnostics: Diagnostics,
    pub delivery: Result<SinkResponse>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && self.delivery.is_ok()
    }
}

/// Opens the session, runs `mode`, releases the session and ships one
/// payload. Never fails: every problem lands in the diagnostics item.
pub async fn run<C, K, S>(monitor: &Monitor<C>, mode: Mode, connector: &K, sink: &S) -> RunReport
where
    C: ConfigProvider,
    K: Connector,
    S: MetricSink,
{
    tracing::info!("🚀 Starting {:?} run for {}", mode, monitor.config().host_key());

    let mut diagnostics = Diagnostics::default();
    let mut metrics = MetricMap::new();
    let mut discovery = None;

    match connector.connect().await {
        Ok(session) => {
            match mode {
                Mode::Check => {
                    let outcome = monitor.check(&session).await;
                    metrics = outcome.metrics;
                    diagnostics.extend(outcome.diagnostics);
                }
                Mode::Discover => {
                    let outcome = monitor.discover(&session).await;
                    discovery = Some(monitor.discovery_document(&outcome.entries));
                    diagnostics.extend(outcome.diagnostics);
                }
            }
            connector.release(session).await;
        }
        Err(e) => diagnostics.push(CONNECTION_FAILED, &e),
    }

    // Discovery consumers expect a document even when nothing was found.
    if mode == Mode::Discover && discovery.is_none() {
        discovery = Some(DiscoveryDocument::default());
    }

    let payload = monitor.payload(metrics, &diagnostics);
    let delivery = sink.send(&payload).await;
    if let Err(e) = &delivery {
        tracing::error!("❌ Could not deliver payload: {}", e);
    }

    RunReport {
        mode,
        payload,
        discovery,
        diagnostics,
        delivery,
    }
}
