use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::date::DateRange;
use crate::error::{Error, Result};
use crate::variable::Variable;

pub const TIME_COLUMN: &str = "Time";

/// One timestamp of a site time series. `None` marks missing data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRecord {
    pub timestamp: DateTime<Utc>,
    pub values: BTreeMap<Variable, Option<f64>>,
}

impl FlatRecord {
    pub fn get(&self, variable: Variable) -> Option<f64> {
        self.values.get(&variable).copied().flatten()
    }
}

/// Site time series, strictly ascending by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatTable {
    columns: Vec<Variable>,
    records: Vec<FlatRecord>,
    output_units: bool,
}

impl FlatTable {
    /// Records must be strictly ascending and carry exactly `columns`.
    pub fn new(columns: Vec<Variable>, records: Vec<FlatRecord>) -> Result<Self> {
        if let Some(w) = records.windows(2).find(|w| w[0].timestamp >= w[1].timestamp) {
            return Err(Error::InvalidRequest(format!(
                "records not strictly ascending at {}",
                w[1].timestamp
            )));
        }
        if let Some(r) = records
            .iter()
            .find(|r| r.values.len() != columns.len() || columns.iter().any(|c| !r.values.contains_key(c)))
        {
            return Err(Error::InvalidRequest(format!(
                "record at {} does not match the table columns",
                r.timestamp
            )));
        }
        Ok(Self {
            columns,
            records,
            output_units: false,
        })
    }

    pub(crate) fn from_parts(columns: Vec<Variable>, records: Vec<FlatRecord>, output_units: bool) -> Self {
        Self {
            columns,
            records,
            output_units,
        }
    }

    pub fn columns(&self) -> &[Variable] {
        &self.columns
    }

    pub fn records(&self) -> &[FlatRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<FlatRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether values were converted by [`FlatTable::to_output_units`].
    pub fn has_output_units(&self) -> bool {
        self.output_units
    }

    pub fn column(&self, variable: Variable) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.get(variable)).collect()
    }

    /// Keep only records whose timestamp falls inside `range`.
    pub fn within(&self, range: &DateRange) -> FlatTable {
        let records = self
            .records
            .iter()
            .filter(|r| range.contains(&r.timestamp))
            .cloned()
            .collect();
        Self::from_parts(self.columns.clone(), records, self.output_units)
    }

    pub fn headers(&self) -> Vec<String> {
        std::iter::once(TIME_COLUMN.to_string())
            .chain(self.columns.iter().map(|v| {
                if self.output_units {
                    v.column_name().to_string()
                } else {
                    format!("{} ({})", v.short_name(), v.native_unit().symbol())
                }
            }))
            .collect()
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut w = csv::Writer::from_writer(writer);
        w.write_record(self.headers())?;
        for r in &self.records {
            let mut row = Vec::with_capacity(self.columns.len() + 1);
            row.push(r.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true));
            for c in &self.columns {
                row.push(r.get(*c).map(|v| v.to_string()).unwrap_or_default());
            }
            w.write_record(&row)?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn to_csv_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(io::BufWriter::new(file))
    }
}
