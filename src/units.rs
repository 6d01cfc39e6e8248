use chrono::{DateTime, Duration, Timelike, Utc};

use crate::dataset::Accumulation;
use crate::table::{FlatRecord, FlatTable};
use crate::variable::{Unit, Variable};

const KELVIN_OFFSET: f64 = 273.15;
const SECONDS_PER_HOUR: f64 = 3600.0;

impl FlatTable {
    /// Convert every column from archive units to output units.
    ///
    /// Accumulated radiation becomes the mean W/m^2 over each hour. For
    /// running totals the 01 UTC step starts a new day and is used as-is; any
    /// other step whose previous hour is missing, or absent from the table,
    /// cannot be de-accumulated and becomes `None`.
    pub fn to_output_units(&self, accumulation: Accumulation) -> FlatTable {
        if self.has_output_units() {
            return self.clone();
        }

        let mut records: Vec<FlatRecord> = self.records().to_vec();
        for &variable in self.columns() {
            let converted = convert_column(self, variable, accumulation);
            for (record, value) in records.iter_mut().zip(converted) {
                record.values.insert(variable, value);
            }
        }

        FlatTable::from_parts(self.columns().to_vec(), records, true)
    }
}

fn convert_column(table: &FlatTable, variable: Variable, accumulation: Accumulation) -> Vec<Option<f64>> {
    let values = table.column(variable);
    match variable.native_unit() {
        Unit::Kelvin => values.iter().map(|v| v.map(|k| k - KELVIN_OFFSET)).collect(),
        Unit::JoulesPerSquareMetre => {
            let stamps: Vec<DateTime<Utc>> = table.records().iter().map(|r| r.timestamp).collect();
            hourly_energy(&stamps, &values, accumulation)
                .into_iter()
                .map(|j| j.map(|j| j.max(0.0) / SECONDS_PER_HOUR))
                .collect()
        }
        _ => values,
    }
}

/// Energy per hour (J/m^2) from the archive's accumulated values.
fn hourly_energy(
    stamps: &[DateTime<Utc>],
    values: &[Option<f64>],
    accumulation: Accumulation,
) -> Vec<Option<f64>> {
    match accumulation {
        Accumulation::Hourly => values.to_vec(),
        Accumulation::SinceMidnight => (0..values.len())
            .map(|i| {
                let current = values[i]?;
                // The running total restarts after the 00 UTC step.
                if stamps[i].hour() == 1 {
                    return Some(current);
                }
                if i == 0 || stamps[i] - stamps[i - 1] != Duration::hours(1) {
                    return None;
                }
                let previous = values[i - 1]?;
                Some((current - previous).max(0.0))
            })
            .collect(),
    }
}
