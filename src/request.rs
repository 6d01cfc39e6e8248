use log::{debug, warn};
use serde::{Serialize, Serializer};

use crate::dataset::Dataset;
use crate::date::{ArchiveDates, DateRange};
use crate::error::{Error, Result};
use crate::site::Site;
use crate::variable::Variable;

/// Grid file format requested from the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "netcdf")]
    NetCdf,
    #[serde(rename = "grib")]
    Grib,
}

/// Request area in degrees, in the archive's `[north, west, south, east]` order.
///
/// Latitudes are clamped to the poles. Longitudes are left as computed: a box
/// reaching past +/-180 is not split or wrapped, see
/// [`BoundingBox::crosses_antimeridian`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub north: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn around(site: &Site, buffer: f64) -> Self {
        Self {
            north: (site.latitude() + buffer).min(90.0),
            west: site.longitude() - buffer,
            south: (site.latitude() - buffer).max(-90.0),
            east: site.longitude() + buffer,
        }
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.south..=self.north).contains(&latitude) && (self.west..=self.east).contains(&longitude)
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west < -180.0 || self.east > 180.0
    }

    pub fn as_area(&self) -> [f64; 4] {
        [self.north, self.west, self.south, self.east]
    }
}

impl Serialize for BoundingBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_area().serialize(serializer)
    }
}

/// Everything the archive needs to prepare one grid file.
///
/// Serializes to the JSON request body; the dataset goes into the endpoint
/// path instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestParameters {
    #[serde(skip)]
    pub dataset: Dataset,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    pub variable: Vec<Variable>,
    #[serde(flatten)]
    pub dates: ArchiveDates,
    pub area: BoundingBox,
    pub format: OutputFormat,
}

impl RequestParameters {
    /// Ask for a different grid file format than [`OutputFormat::NetCdf`].
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Build a request for the default dataset (ERA5-Land).
///
/// `variables` accepts [`Variable`]s or their archive/short names.
pub fn build_request<I, V>(
    site: &Site,
    variables: I,
    range: &DateRange,
    area_buffer: f64,
) -> Result<RequestParameters>
where
    I: IntoIterator<Item = V>,
    V: AsRef<str>,
{
    build_request_for(Dataset::default(), site, variables, range, area_buffer)
}

pub fn build_request_for<I, V>(
    dataset: Dataset,
    site: &Site,
    variables: I,
    range: &DateRange,
    area_buffer: f64,
) -> Result<RequestParameters>
where
    I: IntoIterator<Item = V>,
    V: AsRef<str>,
{
    let mut variable: Vec<Variable> = Vec::new();
    for name in variables {
        let v: Variable = name.as_ref().parse()?;
        if !variable.contains(&v) {
            variable.push(v);
        }
    }
    if variable.is_empty() {
        return Err(Error::InvalidRequest("at least one variable is required".into()));
    }

    if !area_buffer.is_finite() || area_buffer <= 0.0 {
        return Err(Error::InvalidRequest(format!(
            "area buffer must be > 0 degrees, got {area_buffer}"
        )));
    }

    let area = BoundingBox::around(site, area_buffer);
    if area.crosses_antimeridian() {
        warn!(
            "request area {:?} crosses the antimeridian; longitudes are not wrapped",
            area.as_area()
        );
    }

    debug!(
        "built {dataset} request for {range}: {} variable(s), area {:?}",
        variable.len(),
        area.as_area()
    );

    Ok(RequestParameters {
        dataset,
        product_type: dataset.product_type().map(str::to_string),
        variable,
        dates: range.archive_fields(),
        area,
        format: OutputFormat::default(),
    })
}
