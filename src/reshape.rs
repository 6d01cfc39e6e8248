use std::collections::BTreeMap;

use log::debug;

use crate::error::{Error, Result};
use crate::grid::{GridVariable, GriddedDataset};
use crate::site::Site;
use crate::table::{FlatRecord, FlatTable};

/// Largest accepted great-circle distance between a site and its grid cell.
pub const DEFAULT_MAX_SNAP_DISTANCE_KM: f64 = 50.0;

/// Converts gridded data into a single-site table using the nearest cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reshaper {
    /// `f64::INFINITY` disables the check.
    pub max_snap_distance_km: f64,
}

impl Default for Reshaper {
    fn default() -> Self {
        Self {
            max_snap_distance_km: DEFAULT_MAX_SNAP_DISTANCE_KM,
        }
    }
}

/// Grid cell selected for a site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub lat_idx: usize,
    pub lon_idx: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
}

/// [`Reshaper::reshape`] with the default snapping distance.
pub fn reshape(dataset: GriddedDataset, site: &Site) -> Result<FlatTable> {
    Reshaper::default().reshape(dataset, site)
}

impl Reshaper {
    pub fn new(max_snap_distance_km: f64) -> Self {
        Self {
            max_snap_distance_km,
        }
    }

    /// Nearest cell on a rectilinear grid. Latitude and longitude indices are
    /// picked independently; ties go to the lower index.
    pub fn nearest_cell(&self, grid: &GridVariable, site: &Site) -> Result<GridCell> {
        if self.max_snap_distance_km.is_nan() || self.max_snap_distance_km < 0.0 {
            return Err(Error::InvalidRequest(format!(
                "max snap distance must be >= 0 km, got {}",
                self.max_snap_distance_km
            )));
        }

        let lat_idx = nearest_index(&grid.latitudes, |lat| (lat - site.latitude()).abs())
            .ok_or_else(|| Error::EmptyDataset("no finite latitudes".into()))?;
        let lon_idx = nearest_index(&grid.longitudes, |lon| lon_delta(lon, site.longitude()))
            .ok_or_else(|| Error::EmptyDataset("no finite longitudes".into()))?;

        let latitude = grid.latitudes[lat_idx];
        let longitude = grid.longitudes[lon_idx];
        let distance_km = site.distance_km(latitude, longitude);

        if distance_km > self.max_snap_distance_km {
            return Err(Error::SiteOutsideGrid {
                latitude: site.latitude(),
                longitude: site.longitude(),
                distance_km,
                max_km: self.max_snap_distance_km,
            });
        }

        Ok(GridCell {
            lat_idx,
            lon_idx,
            latitude,
            longitude,
            distance_km,
        })
    }

    /// Flatten `dataset` into one record per timestamp, ascending.
    ///
    /// Fails before producing anything if the grid is empty or inconsistent,
    /// the time axis repeats a timestamp, or the nearest cell is too far away.
    pub fn reshape(&self, dataset: GriddedDataset, site: &Site) -> Result<FlatTable> {
        let reference = dataset.validate()?;
        let cell = self.nearest_cell(reference, site)?;

        debug!(
            "site ({}, {}) -> cell [{}, {}] at ({}, {}), {:.2} km",
            site.latitude(),
            site.longitude(),
            cell.lat_idx,
            cell.lon_idx,
            cell.latitude,
            cell.longitude,
            cell.distance_km
        );

        // The archive does not promise a sorted time axis.
        let mut order: Vec<usize> = (0..reference.times.len()).collect();
        order.sort_by_key(|&t| reference.times[t]);
        if let Some(w) = order
            .windows(2)
            .find(|w| reference.times[w[0]] == reference.times[w[1]])
        {
            return Err(Error::InconsistentGrid {
                variable: reference.variable.to_string(),
                reason: format!("duplicate timestamp {}", reference.times[w[0]]),
            });
        }

        let records = order
            .into_iter()
            .map(|t| FlatRecord {
                timestamp: reference.times[t],
                values: dataset
                    .variables
                    .iter()
                    .map(|v| (v.variable, v.value_at(cell.lat_idx, cell.lon_idx, t)))
                    .collect::<BTreeMap<_, _>>(),
            })
            .collect();

        let columns = dataset.variables.iter().map(|v| v.variable).collect();
        Ok(FlatTable::from_parts(columns, records, false))
    }
}

fn nearest_index(axis: &[f64], distance: impl Fn(f64) -> f64) -> Option<usize> {
    axis.iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, v)| (i, distance(*v)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Absolute longitude difference in degrees, modulo 360.
fn lon_delta(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}
