use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::variable::Variable;

/// One variable of a decoded grid file.
///
/// `values` is row-major over `(latitude, longitude, time)`, i.e. the value at
/// `(i, j, t)` lives at `(i * nlon + j) * ntime + t`.
///
/// Recent ERA5 months come as two experiment versions: final data (expver 1)
/// in `values` and preliminary ERA5T data (expver 5) in `preliminary_values`,
/// laid out the same way. Final values win wherever they exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridVariable {
    pub variable: Variable,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub times: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
    /// Archive fill value for cells outside data coverage.
    #[serde(default)]
    pub fill_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preliminary_values: Option<Vec<f64>>,
}

impl GridVariable {
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.latitudes.len(), self.longitudes.len(), self.times.len())
    }

    pub fn index(&self, lat_idx: usize, lon_idx: usize, time_idx: usize) -> usize {
        (lat_idx * self.longitudes.len() + lon_idx) * self.times.len() + time_idx
    }

    /// Value at a cell, `None` for NaN or the fill value. A missing final
    /// value falls back to the preliminary one.
    pub fn value_at(&self, lat_idx: usize, lon_idx: usize, time_idx: usize) -> Option<f64> {
        let idx = self.index(lat_idx, lon_idx, time_idx);
        self.present(self.values.get(idx)).or_else(|| {
            self.preliminary_values
                .as_ref()
                .and_then(|p| self.present(p.get(idx)))
        })
    }

    fn present(&self, v: Option<&f64>) -> Option<f64> {
        let v = *v?;
        if v.is_nan() || self.fill_value.is_some_and(|fill| v == fill) {
            None
        } else {
            Some(v)
        }
    }
}

/// `nlat * nlon * ntime`, or `None` when it does not fit in `usize`.
fn expected_len(nlat: usize, nlon: usize, ntime: usize) -> Option<usize> {
    nlat.checked_mul(nlon)?.checked_mul(ntime)
}

/// Named variables sharing one latitude/longitude/time grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GriddedDataset {
    pub variables: Vec<GridVariable>,
}

impl GriddedDataset {
    pub fn new(variables: Vec<GridVariable>) -> Self {
        Self { variables }
    }

    pub fn get(&self, variable: Variable) -> Option<&GridVariable> {
        self.variables.iter().find(|v| v.variable == variable)
    }

    /// Keep only `variables`, in that order. A requested variable the dataset
    /// lacks is an error; extra variables are dropped.
    pub fn select(mut self, variables: &[Variable]) -> Result<Self> {
        let mut selected = Vec::with_capacity(variables.len());
        for &wanted in variables {
            let Some(pos) = self.variables.iter().position(|v| v.variable == wanted) else {
                return Err(Error::InconsistentGrid {
                    variable: wanted.to_string(),
                    reason: "requested variable missing from dataset".into(),
                });
            };
            selected.push(self.variables.swap_remove(pos));
        }
        Ok(Self::new(selected))
    }

    /// Check the shared-grid invariants, returning the reference variable
    /// whose axes every other variable matches.
    pub fn validate(&self) -> Result<&GridVariable> {
        let Some(first) = self.variables.first() else {
            return Err(Error::EmptyDataset("dataset contains no variables".into()));
        };

        for (pos, var) in self.variables.iter().enumerate() {
            let (nlat, nlon, ntime) = var.shape();
            let Some(expected) = expected_len(nlat, nlon, ntime) else {
                return Err(inconsistent(var, format!("{nlat}x{nlon}x{ntime} grid size overflows")));
            };
            if var.values.len() != expected {
                return Err(inconsistent(
                    var,
                    format!(
                        "{} values for a {nlat}x{nlon}x{ntime} grid",
                        var.values.len()
                    ),
                ));
            }
            if let Some(p) = var.preliminary_values.as_ref().filter(|p| p.len() != expected) {
                return Err(inconsistent(
                    var,
                    format!(
                        "{} preliminary values for a {nlat}x{nlon}x{ntime} grid",
                        p.len()
                    ),
                ));
            }
            if self.variables[..pos].iter().any(|v| v.variable == var.variable) {
                return Err(inconsistent(var, "variable appears more than once".into()));
            }
            if var.latitudes != first.latitudes {
                return Err(inconsistent(var, format!("latitude axis differs from {}", first.variable)));
            }
            if var.longitudes != first.longitudes {
                return Err(inconsistent(var, format!("longitude axis differs from {}", first.variable)));
            }
            if var.times != first.times {
                return Err(inconsistent(var, format!("time axis differs from {}", first.variable)));
            }
        }

        let (nlat, nlon, ntime) = first.shape();
        if ntime == 0 {
            return Err(Error::EmptyDataset("time axis has zero length".into()));
        }
        if nlat == 0 || nlon == 0 {
            return Err(Error::EmptyDataset(format!("spatial grid is {nlat}x{nlon}")));
        }

        Ok(first)
    }
}

fn inconsistent(var: &GridVariable, reason: String) -> Error {
    Error::InconsistentGrid {
        variable: var.variable.to_string(),
        reason,
    }
}
