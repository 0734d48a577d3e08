//! Data model: processed rows, the service envelope, and the editable table.
//!
//! ## Why a named record plus an extras map?
//!
//! The processing service returns semi-structured rows: two columns are
//! always present (`section`, `requirements`) and any number of additional
//! string columns may appear depending on the instruction. Modelling that as
//! a fully open map would push "is this row even valid?" onto every caller.
//! Instead [`Record`] names the required fields and keeps the open-ended
//! remainder in an explicit `extras` map, so validation happens once at the
//! service boundary: a row missing a required field fails to deserialise.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical name of the first required column.
pub const COL_SECTION: &str = "section";
/// Canonical name of the second required column.
pub const COL_REQUIREMENTS: &str = "requirements";

/// One row of processed output.
///
/// On the wire the extras are flattened alongside the named fields, so
/// `{"section": "...", "requirements": "...", "owner": "..."}` round-trips
/// with `owner` landing in [`Record::extras`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Section label, e.g. "Executive Summary".
    pub section: String,
    /// Requirements description for the section.
    pub requirements: String,
    /// Additional string columns keyed by column name.
    #[serde(flatten)]
    pub extras: BTreeMap<String, String>,
}

impl Record {
    /// Create a record with just the two required columns.
    pub fn new(section: impl Into<String>, requirements: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            requirements: requirements.into(),
            extras: BTreeMap::new(),
        }
    }

    /// Read a cell by column name.
    pub fn get(&self, column: &str) -> Option<&str> {
        match column {
            COL_SECTION => Some(&self.section),
            COL_REQUIREMENTS => Some(&self.requirements),
            other => self.extras.get(other).map(String::as_str),
        }
    }

    /// Write a cell by column name, creating an extra column when the name
    /// is not one of the required fields.
    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        match column {
            COL_SECTION => self.section = value.into(),
            COL_REQUIREMENTS => self.requirements = value.into(),
            other => {
                self.extras.insert(other.to_string(), value.into());
            }
        }
    }
}

/// The success/data/error wrapper returned by the processing call.
///
/// `success = false` is a *soft* failure — the service ran but declined the
/// request — and carries a human-readable `error`. Transport failures are
/// [`crate::error::IntellidocsError`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Record>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// A successful envelope carrying the given rows.
    pub fn ok(data: Vec<Record>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A soft-failure envelope with the given message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// The editable grid model: ordered rows with a stable column ordering.
///
/// Column order is `section`, `requirements`, then extra columns in the
/// order they are first seen (scanning rows top to bottom). Edits mutate
/// rows in place; nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Record>,
    extra_columns: Vec<String>,
}

impl Table {
    /// Build a table from processed rows, deriving the extra-column order.
    pub fn from_rows(rows: Vec<Record>) -> Self {
        let mut extra_columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.extras.keys() {
                if !extra_columns.iter().any(|c| c == key) {
                    extra_columns.push(key.clone());
                }
            }
        }
        Self {
            rows,
            extra_columns,
        }
    }

    /// Full column ordering: the two required columns, then extras.
    pub fn columns(&self) -> Vec<&str> {
        let mut cols = vec![COL_SECTION, COL_REQUIREMENTS];
        cols.extend(self.extra_columns.iter().map(String::as_str));
        cols
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Read a cell. `None` when the row index or column name is unknown.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Edit a cell in place.
    ///
    /// Returns `false` when the row index is out of range. A new column
    /// name is appended to the column ordering.
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<String>) -> bool {
        let Some(record) = self.rows.get_mut(row) else {
            return false;
        };
        record.set(column, value);
        if column != COL_SECTION
            && column != COL_REQUIREMENTS
            && !self.extra_columns.iter().any(|c| c == column)
        {
            self.extra_columns.push(column.to_string());
        }
        true
    }
}
