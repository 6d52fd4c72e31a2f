use crate::core::aggregate::TelemetryAggregator;
use crate::core::discovery::build_discovery;
use crate::core::error_log::parse_error_log;
use crate::core::modules::ModuleTable;
use crate::domain::model::{
    DiscoveryDocument, DiscoveryEntry, ErrorIndex, MetricMap, MetricValue, SinkPayload,
};
use crate::domain::ports::{CommandSource, ConfigProvider};
use crate::utils::error::{MonitorError, Result};

/// Human-readable problems collected during a run. They end up joined in the
/// reserved errors item so Zabbix can alert on them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    messages: Vec<String>,
}

impl Diagnostics {
    pub fn push(&mut self, context: &str, error: &MonitorError) {
        tracing::error!("{}: {}", context, error);
        self.messages.push(format!("{}. Details:\n{}", context, error));
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn joined(&self) -> String {
        self.messages.join("\n")
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckOutcome {
    pub metrics: MetricMap,
    pub modules: usize,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default)]
pub struct DiscoverOutcome {
    pub entries: Vec<DiscoveryEntry>,
    pub diagnostics: Diagnostics,
}

pub const CHECK_FAILED: &str = "Errors occurred while collecting module data";
pub const DISCOVERY_FAILED: &str = "Errors occurred while collecting discovery data";
pub const ERROR_LOG_FAILED: &str = "Active errors could not be read, module state is reported without them";

pub struct Monitor<C: ConfigProvider> {
    config: C,
    aggregator: TelemetryAggregator,
}

impl<C: ConfigProvider> Monitor<C> {
    pub fn new(config: C) -> Self {
        Self::with_aggregator(config, TelemetryAggregator::default())
    }

    pub fn with_aggregator(config: C, aggregator: TelemetryAggregator) -> Self {
        Self { config, aggregator }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    async fn fetch<S: CommandSource + ?Sized>(&self, source: &S, command: &str) -> Result<String> {
        tracing::debug!("Running '{}'", command);
        source.execute(command).await
    }

    async fn module_table<S: CommandSource + ?Sized>(&self, source: &S) -> Result<ModuleTable> {
        let text = self.fetch(source, self.config.module_table_command()).await?;
        Ok(ModuleTable::parse(&text)?)
    }

    fn error_index(&self, text: &str) -> ErrorIndex {
        let parsed = parse_error_log(text);
        if !parsed.is_clean() {
            tracing::warn!(
                "{} malformed group(s) skipped in '{}' output",
                parsed.issues.len(),
                self.config.error_log_command()
            );
        }
        parsed.index
    }

    /// Fetches the module table, then the active errors, and only then parses
    /// either. An unreadable error log only costs the critical/noncritical
    /// texts; an unreadable module table costs all per-module items, and the
    /// error log is not requested when the table command itself failed.
    pub async fn check<S: CommandSource + ?Sized>(&self, source: &S) -> CheckOutcome {
        let mut outcome = CheckOutcome::default();

        let table_text = match self.fetch(source, self.config.module_table_command()).await {
            Ok(text) => text,
            Err(e) => {
                outcome.diagnostics.push(CHECK_FAILED, &e);
                return outcome;
            }
        };
        let error_text = self.fetch(source, self.config.error_log_command()).await;

        let table = match ModuleTable::parse(&table_text) {
            Ok(table) => table,
            Err(e) => {
                outcome.diagnostics.push(CHECK_FAILED, &MonitorError::from(e));
                return outcome;
            }
        };

        let errors = match error_text {
            Ok(text) => self.error_index(&text),
            Err(e) => {
                outcome.diagnostics.push(ERROR_LOG_FAILED, &e);
                ErrorIndex::new()
            }
        };

        outcome.modules = table.records.len();
        outcome.metrics = self.aggregator.aggregate(&table.records, &errors);
        tracing::info!(
            "Collected {} items for {} modules ({} with active errors)",
            outcome.metrics.len(),
            outcome.modules,
            errors.len()
        );
        outcome
    }

    pub async fn discover<S: CommandSource + ?Sized>(&self, source: &S) -> DiscoverOutcome {
        let mut outcome = DiscoverOutcome::default();
        match self.module_table(source).await {
            Ok(table) => {
                outcome.entries = build_discovery(&table.records);
                tracing::info!("Discovered {} modules", outcome.entries.len());
            }
            Err(e) => outcome.diagnostics.push(DISCOVERY_FAILED, &e),
        }
        outcome
    }

    pub fn discovery_document(&self, entries: &[DiscoveryEntry]) -> DiscoveryDocument {
        DiscoveryDocument::from_entries(entries, self.config.discovery_macro())
    }

    /// Wraps the items under the configured host and adds the reserved errors
    /// item, which is always present (empty when the run was clean).
    pub fn payload(&self, mut metrics: MetricMap, diagnostics: &Diagnostics) -> SinkPayload {
        metrics.insert(
            self.config.errors_key().to_string(),
            MetricValue::Text(diagnostics.joined()),
        );
        SinkPayload::single(self.config.host_key(), metrics)
    }
}
