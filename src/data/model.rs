use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::LoadOptions;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell as the reader saw it
// ---------------------------------------------------------------------------

/// A raw spreadsheet cell, before it is bound to the dashboard schema.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Empty,
}

impl CellValue {
    /// Render a categorical cell. Blank cells are absent.
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) if s.trim().is_empty() => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Int(i) => Some(i.to_string()),
            CellValue::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(format!("{f:.0}")),
            CellValue::Float(f) => Some(f.to_string()),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Empty => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Empty => write!(f, "<empty>"),
        }
    }
}

/// Render a SAP ID as plain integer text: no separators, no fraction,
/// never exponential notation.
pub fn render_sap_id(cell: &CellValue, row: usize) -> Result<Option<String>> {
    let invalid = || Error::InvalidSapId {
        row,
        value: cell.to_string(),
    };
    match cell {
        CellValue::Empty => Ok(None),
        CellValue::Int(i) => Ok(Some(i.to_string())),
        CellValue::Float(f) if f.is_finite() => Ok(Some(format!("{f:.0}"))),
        CellValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Some(i.to_string()));
            }
            match s.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Some(format!("{f:.0}"))),
                _ => Err(invalid()),
            }
        }
        CellValue::Float(_) | CellValue::Bool(_) => Err(invalid()),
    }
}

// ---------------------------------------------------------------------------
// RawTable – reader output
// ---------------------------------------------------------------------------

/// Header names plus rows of cells, in source order.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

// ---------------------------------------------------------------------------
// Attribute – the fixed scalar columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    RollNo,
    SapId,
    Name,
    Branch,
    Campus,
    Major,
    Division,
}

impl Attribute {
    pub const ALL: [Attribute; 7] = [
        Attribute::RollNo,
        Attribute::SapId,
        Attribute::Name,
        Attribute::Branch,
        Attribute::Campus,
        Attribute::Major,
        Attribute::Division,
    ];

    /// Column header in the source spreadsheet.
    pub fn header(self) -> &'static str {
        match self {
            Attribute::RollNo => "Roll No",
            Attribute::SapId => "SAP ID",
            Attribute::Name => "Name",
            Attribute::Branch => "Branch",
            Attribute::Campus => "Campus",
            Attribute::Major => "Major",
            Attribute::Division => "Division",
        }
    }

    pub fn from_header(header: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.header() == header)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// ---------------------------------------------------------------------------
// Record – one enrollment row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    attributes: [Option<String>; 7],
    /// One entry per subject slot of the owning dataset.
    subjects: Vec<Option<String>>,
}

impl Record {
    pub fn new(attributes: [Option<String>; 7], subjects: Vec<Option<String>>) -> Self {
        Self {
            attributes,
            subjects,
        }
    }

    pub fn get(&self, attribute: Attribute) -> Option<&str> {
        self.attributes[attribute.index()].as_deref()
    }

    pub fn subject(&self, slot: usize) -> Option<&str> {
        self.subjects.get(slot).and_then(|s| s.as_deref())
    }

    pub fn subjects(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.subjects.iter().map(|s| s.as_deref())
    }

    /// Every field of the record: attributes first, then subject slots.
    pub fn fields(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.attributes
            .iter()
            .map(|a| a.as_deref())
            .chain(self.subjects())
    }
}

// ---------------------------------------------------------------------------
// Dataset – the loaded, immutable table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<Record>,
    /// Retained column names in source order.
    pub column_names: Vec<String>,
    /// Subject slot names in source order.
    pub subject_columns: Vec<String>,
    /// Distinct present values per attribute, in first-appearance order.
    pub unique_values: BTreeMap<Attribute, Vec<String>>,
    /// Distinct present values across all subject slots.
    pub subject_values: BTreeSet<String>,
}

impl Dataset {
    /// Bind a raw table to the dashboard schema.
    pub fn from_table(table: RawTable, options: &LoadOptions) -> Result<Self> {
        let headers: Vec<&str> = table.headers.iter().map(|h| h.trim()).collect();

        let mut attribute_idx = [0usize; 7];
        for attr in Attribute::ALL {
            attribute_idx[attr.index()] = headers
                .iter()
                .position(|h| *h == attr.header())
                .ok_or_else(|| Error::SchemaMissing {
                    column: attr.header().to_string(),
                })?;
        }

        for excluded in &options.excluded_subject_columns {
            if !headers.contains(&excluded.as_str()) {
                warn!("excluded subject column \"{excluded}\" not present in source");
            }
        }

        let mut column_names = Vec::new();
        let mut subject_columns = Vec::new();
        let mut subject_idx = Vec::new();
        for (i, header) in headers.iter().enumerate() {
            if Attribute::from_header(header).is_some() {
                column_names.push(header.to_string());
            } else if header.contains(options.subject_marker.as_str()) {
                if options.excluded_subject_columns.iter().any(|e| e == header) {
                    debug!("dropping excluded subject column \"{header}\"");
                    continue;
                }
                column_names.push(header.to_string());
                subject_columns.push(header.to_string());
                subject_idx.push(i);
            } else {
                debug!("ignoring column \"{header}\"");
            }
        }

        if subject_columns.is_empty() {
            return Err(Error::SchemaMissing {
                column: options.subject_marker.clone(),
            });
        }

        let empty = CellValue::Empty;
        let mut records = Vec::with_capacity(table.rows.len());
        for (row_no, row) in table.rows.iter().enumerate() {
            let cell = |idx: usize| row.get(idx).unwrap_or(&empty);

            let mut attributes: [Option<String>; 7] = Default::default();
            for attr in Attribute::ALL {
                let value = cell(attribute_idx[attr.index()]);
                attributes[attr.index()] = match attr {
                    Attribute::SapId => render_sap_id(value, row_no + 1)?,
                    _ => value.to_text(),
                };
            }
            let subjects = subject_idx.iter().map(|&i| cell(i).to_text()).collect();

            records.push(Record::new(attributes, subjects));
        }

        let mut dataset = Self::from_records(records, subject_columns);
        dataset.column_names = column_names;
        Ok(dataset)
    }

    /// Build the derived indices from already-typed records.
    pub fn from_records(records: Vec<Record>, subject_columns: Vec<String>) -> Self {
        let mut unique_values: BTreeMap<Attribute, Vec<String>> = BTreeMap::new();
        for attr in Attribute::ALL {
            let mut seen = HashSet::new();
            let values = records
                .iter()
                .filter_map(|r| r.get(attr))
                .filter(|v| seen.insert(*v))
                .map(str::to_string)
                .collect();
            unique_values.insert(attr, values);
        }

        let subject_values = records
            .iter()
            .flat_map(|r| r.subjects())
            .flatten()
            .map(str::to_string)
            .collect();

        let column_names = Attribute::ALL
            .iter()
            .map(|a| a.header().to_string())
            .chain(subject_columns.iter().cloned())
            .collect();

        Dataset {
            records,
            column_names,
            subject_columns,
            unique_values,
            subject_values,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct values offered for an attribute filter.
    pub fn options(&self, attribute: Attribute) -> &[String] {
        self.unique_values
            .get(&attribute)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
