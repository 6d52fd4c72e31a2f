use crate::core::normalize::StateNormalizer;
use crate::domain::model::{ErrorIndex, MetricMap, MetricValue, ModuleRecord, Severity};
use std::collections::HashSet;

pub const PRESENCE: &str = "presence";
pub const POWER: &str = "power";
pub const HEALTH: &str = "health";
pub const CRITICAL: &str = "critical";
pub const NONCRITICAL: &str = "noncritical";

pub fn metric_key(category: &str, module_name: &str) -> String {
    format!("{}[{}]", category, module_name)
}

/// Joins module rows with their active errors into the flat item map.
pub struct TelemetryAggregator {
    normalizer: StateNormalizer,
}

impl TelemetryAggregator {
    pub fn new(normalizer: StateNormalizer) -> Self {
        Self { normalizer }
    }

    /// Five items per module. A repeated module name overwrites the items of
    /// the earlier row.
    pub fn aggregate(&self, records: &[ModuleRecord], errors: &ErrorIndex) -> MetricMap {
        let mut metrics = MetricMap::new();
        let mut seen = HashSet::new();

        for record in records {
            if !seen.insert(record.name.as_str()) {
                tracing::warn!(
                    module = %record.name,
                    "Duplicate module name in module table, later row wins"
                );
            }
            self.aggregate_module(record, errors, &mut metrics);
        }

        metrics
    }

    fn aggregate_module(&self, record: &ModuleRecord, errors: &ErrorIndex, metrics: &mut MetricMap) {
        let mut critical = Vec::new();
        let mut noncritical = Vec::new();
        for error in errors.errors_for(&record.correlation_key()) {
            match error.severity {
                Severity::Critical => critical.push(error.message.as_str()),
                Severity::NonCritical => noncritical.push(error.message.as_str()),
                Severity::Unknown => {}
            }
        }

        let name = &record.name;
        metrics.insert(
            metric_key(PRESENCE, name),
            MetricValue::Ordinal(u8::from(record.presence)),
        );
        metrics.insert(
            metric_key(POWER, name),
            MetricValue::Ordinal(self.normalizer.power_ordinal(&record.power_state)),
        );
        metrics.insert(
            metric_key(HEALTH, name),
            MetricValue::Ordinal(self.normalizer.health_ordinal(&record.health)),
        );
        metrics.insert(
            metric_key(CRITICAL, name),
            MetricValue::Text(critical.join("\n")),
        );
        metrics.insert(
            metric_key(NONCRITICAL, name),
            MetricValue::Text(noncritical.join("\n")),
        );
    }
}

impl Default for TelemetryAggregator {
    fn default() -> Self {
        Self::new(StateNormalizer::default())
    }
}
