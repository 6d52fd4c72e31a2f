use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One row of the module table with its fields still in display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub name: String,
    pub presence: bool,
    pub power_state: String,
    pub health: String,
    pub service_tag: String,
}

impl ModuleRecord {
    /// Key used to correlate a module with its active errors.
    pub fn correlation_key(&self) -> String {
        self.name.to_uppercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    NonCritical,
    Unknown,
}

impl Severity {
    pub fn from_token(token: &str) -> Self {
        match token {
            "Critical" => Severity::Critical,
            "NonCritical" => Severity::NonCritical,
            _ => Severity::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub module_name: String,
    pub severity: Severity,
    pub message: String,
}

/// Active errors grouped by uppercased module name, in log order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorIndex {
    entries: HashMap<String, Vec<ErrorRecord>>,
}

impl ErrorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: ErrorRecord) {
        self.entries
            .entry(record.module_name.to_uppercase())
            .or_default()
            .push(record);
    }

    pub fn errors_for(&self, module_name: &str) -> &[ErrorRecord] {
        self.entries
            .get(&module_name.to_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct modules with at least one error.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Ordinal(u8),
    Text(String),
}

impl MetricValue {
    pub fn as_ordinal(&self) -> Option<u8> {
        match self {
            MetricValue::Ordinal(v) => Some(*v),
            MetricValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetricValue::Text(s) => Some(s),
            MetricValue::Ordinal(_) => None,
        }
    }

    /// Zabbix trapper items receive every value as a string.
    pub fn to_wire_string(&self) -> String {
        match self {
            MetricValue::Ordinal(v) => v.to_string(),
            MetricValue::Text(s) => s.clone(),
        }
    }
}

impl From<u8> for MetricValue {
    fn from(value: u8) -> Self {
        MetricValue::Ordinal(value)
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        MetricValue::Text(value)
    }
}

pub type MetricMap = BTreeMap<String, MetricValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryEntry {
    pub module_name: String,
}

/// Low-level discovery document: `{"data":[{"{#MACRO}":"name"}, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    pub data: Vec<BTreeMap<String, String>>,
}

impl DiscoveryDocument {
    pub fn from_entries(entries: &[DiscoveryEntry], discovery_macro: &str) -> Self {
        let data = entries
            .iter()
            .map(|entry| {
                let mut row = BTreeMap::new();
                row.insert(discovery_macro.to_string(), entry.module_name.clone());
                row
            })
            .collect();
        Self { data }
    }
}

/// One run's worth of metrics, keyed by the monitored host name in Zabbix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SinkPayload {
    pub hosts: BTreeMap<String, MetricMap>,
}

impl SinkPayload {
    pub fn single(host_key: impl Into<String>, metrics: MetricMap) -> Self {
        let mut hosts = BTreeMap::new();
        hosts.insert(host_key.into(), metrics);
        Self { hosts }
    }

    /// Flattened (host, key, value) triples in key order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &str, &MetricValue)> {
        self.hosts.iter().flat_map(|(host, metrics)| {
            metrics
                .iter()
                .map(move |(key, value)| (host.as_str(), key.as_str(), value))
        })
    }

    pub fn item_count(&self) -> usize {
        self.hosts.values().map(BTreeMap::len).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkResponse {
    pub processed: usize,
    pub failed: usize,
    pub info: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Mode {
    Discover,
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(module: &str, severity: Severity, message: &str) -> ErrorRecord {
        ErrorRecord {
            module_name: module.to_string(),
            severity,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_error_index_groups_by_uppercased_name() {
        let mut index = ErrorIndex::new();
        index.insert(error("Server-1", Severity::Critical, "a"));
        index.insert(error("SERVER-1", Severity::NonCritical, "b"));
        index.insert(error("PS2", Severity::Critical, "c"));

        assert_eq!(index.len(), 2);
        assert_eq!(index.record_count(), 3);
        let server = index.errors_for("server-1");
        assert_eq!(server.len(), 2);
        assert_eq!(server[0].message, "a");
        assert_eq!(server[1].message, "b");
        assert!(index.errors_for("Fan-1").is_empty());
    }

    #[test]
    fn test_severity_tokens_are_exact() {
        assert_eq!(Severity::from_token("Critical"), Severity::Critical);
        assert_eq!(Severity::from_token("NonCritical"), Severity::NonCritical);
        assert_eq!(Severity::from_token("critical"), Severity::Unknown);
        assert_eq!(Severity::from_token("Info"), Severity::Unknown);
    }

    #[test]
    fn test_discovery_document_shape() {
        let entries = vec![
            DiscoveryEntry { module_name: "PS1".to_string() },
            DiscoveryEntry { module_name: "Fan-1".to_string() },
        ];
        let doc = DiscoveryDocument::from_entries(&entries, "{#DELL.MODULE.NAME}");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"data": [
                {"{#DELL.MODULE.NAME}": "PS1"},
                {"{#DELL.MODULE.NAME}": "Fan-1"}
            ]})
        );
    }

    #[test]
    fn test_sink_payload_serializes_by_host() {
        let mut metrics = MetricMap::new();
        metrics.insert("power[PS1]".to_string(), MetricValue::Ordinal(3));
        metrics.insert("critical[PS1]".to_string(), MetricValue::Text(String::new()));
        let payload = SinkPayload::single("chassis-01", metrics);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["chassis-01"]["power[PS1]"], 3);
        assert_eq!(json["chassis-01"]["critical[PS1]"], "");
        assert_eq!(payload.item_count(), 2);
    }
}
