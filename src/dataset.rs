use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Archive datasets (same identifiers as the Climate Data Store catalogue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Dataset {
    #[default]
    #[serde(rename = "reanalysis-era5-land")]
    Era5Land,
    #[serde(rename = "reanalysis-era5-single-levels")]
    Era5SingleLevels,
}

impl Dataset {
    pub fn id(&self) -> &'static str {
        match self {
            Dataset::Era5Land => "reanalysis-era5-land",
            Dataset::Era5SingleLevels => "reanalysis-era5-single-levels",
        }
    }

    /// Native grid spacing in degrees.
    pub fn grid_resolution(&self) -> f64 {
        match self {
            Dataset::Era5Land => 0.1,
            Dataset::Era5SingleLevels => 0.25,
        }
    }

    /// How radiation fields are accumulated in this dataset.
    pub fn accumulation(&self) -> Accumulation {
        match self {
            Dataset::Era5Land => Accumulation::SinceMidnight,
            Dataset::Era5SingleLevels => Accumulation::Hourly,
        }
    }

    /// Some datasets refuse requests without a `product_type`.
    pub fn product_type(&self) -> Option<&'static str> {
        match self {
            Dataset::Era5Land => None,
            Dataset::Era5SingleLevels => Some("reanalysis"),
        }
    }
}

/// Accumulation period of energy fields such as solar radiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulation {
    /// Each step holds the energy of the preceding hour.
    Hourly,
    /// Running total from 00 UTC; the 00 UTC step closes the previous day.
    SinceMidnight,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Dataset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "reanalysis-era5-land" => Ok(Dataset::Era5Land),
            "reanalysis-era5-single-levels" => Ok(Dataset::Era5SingleLevels),
            other => Err(Error::InvalidRequest(format!("unknown dataset: {other}"))),
        }
    }
}
