use crate::core::layout::{Column, ColumnLayout};
use crate::domain::model::ModuleRecord;
use crate::utils::error::ParseError;

const PRESENT: &str = "Present";

/// Parsed `getmodinfo` output: the resolved layout and one record per
/// non-blank data row, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleTable {
    pub layout: ColumnLayout,
    pub records: Vec<ModuleRecord>,
}

impl ModuleTable {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut lines = text.lines();
        let header = lines.next().unwrap_or_default();
        let layout = ColumnLayout::resolve(header)?;

        let records: Vec<ModuleRecord> = lines
            .filter(|row| !row.trim().is_empty())
            .map(|row| extract_record(&layout, row))
            .collect();

        tracing::debug!("Extracted {} module rows", records.len());
        Ok(Self { layout, records })
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn extract_record(layout: &ColumnLayout, row: &str) -> ModuleRecord {
    ModuleRecord {
        name: layout.slice(row, Column::Module).to_string(),
        presence: layout.slice(row, Column::Presence) == PRESENT,
        power_state: layout.slice(row, Column::PowerState).to_string(),
        health: layout.slice(row, Column::Health).to_string(),
        service_tag: layout.slice(row, Column::ServiceTag).to_string(),
    }
}
