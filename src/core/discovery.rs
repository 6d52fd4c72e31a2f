use crate::domain::model::{DiscoveryEntry, ModuleRecord};

/// One entry per module row, raw name, row order. Repeated names are kept.
pub fn build_discovery(records: &[ModuleRecord]) -> Vec<DiscoveryEntry> {
    records
        .iter()
        .map(|record| DiscoveryEntry {
            module_name: record.name.clone(),
        })
        .collect()
}
