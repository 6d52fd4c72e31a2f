//! Column boundaries of the `getmodinfo` table, derived from its header line.
//!
//! The header carries one `<marker>` per column, e.g.
//! `<module>      <presence>  <pwrState>  <health>    <svcTag>`, and every data
//! row is laid out at the same character offsets.

use crate::utils::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Module,
    Presence,
    PowerState,
    Health,
    ServiceTag,
}

impl Column {
    /// Columns in the order they appear in the header.
    pub const ALL: [Column; 5] = [
        Column::Module,
        Column::Presence,
        Column::PowerState,
        Column::Health,
        Column::ServiceTag,
    ];

    pub fn marker(self) -> &'static str {
        match self {
            Column::Module => "<module>",
            Column::Presence => "<presence>",
            Column::PowerState => "<pwrState>",
            Column::Health => "<health>",
            Column::ServiceTag => "<svcTag>",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Start offsets (in characters) of each column. Offsets are strictly
/// increasing in `Column::ALL` order and the last column runs to end of line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    offsets: [usize; 5],
}

impl ColumnLayout {
    pub fn resolve(header: &str) -> Result<Self, ParseError> {
        let mut offsets = [0usize; 5];

        for column in Column::ALL {
            let marker = column.marker();
            let byte_offset = header
                .find(marker)
                .ok_or(ParseError::MissingColumnMarker { marker })?;
            let offset = header[..byte_offset].chars().count();

            let i = column.index();
            if i > 0 && offset <= offsets[i - 1] {
                return Err(ParseError::MisorderedColumnMarker { marker, offset });
            }
            offsets[i] = offset;
        }

        tracing::debug!(?offsets, "Resolved module table layout");
        Ok(Self { offsets })
    }

    pub fn offset(&self, column: Column) -> usize {
        self.offsets[column.index()]
    }

    pub fn columns(&self) -> impl Iterator<Item = (Column, usize)> + '_ {
        Column::ALL.into_iter().map(|c| (c, self.offset(c)))
    }

    /// Raw (untrimmed) text of `column` in `row`. Short rows give an empty or
    /// partial slice.
    pub fn raw_slice<'a>(&self, row: &'a str, column: Column) -> &'a str {
        let start = byte_index(row, self.offset(column));
        let end = match column {
            Column::ServiceTag => row.len(),
            _ => byte_index(row, self.offsets[column.index() + 1]),
        };
        &row[start..end]
    }

    pub fn slice<'a>(&self, row: &'a str, column: Column) -> &'a str {
        self.raw_slice(row, column).trim()
    }
}

fn byte_index(row: &str, char_offset: usize) -> usize {
    row.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(row.len())
}
