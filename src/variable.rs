use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Archive variables this crate knows how to request and convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variable {
    Temperature2m,
    SurfaceNetSolarRadiation,
    SurfaceSolarRadiationDownwards,
    WindU10,
    WindV10,
}

/// Physical units as delivered by the archive or written to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Kelvin,
    Celsius,
    /// Energy accumulated since the start of the forecast/day.
    JoulesPerSquareMetre,
    WattsPerSquareMetre,
    MetresPerSecond,
}

impl Variable {
    pub const ALL: [Variable; 5] = [
        Variable::Temperature2m,
        Variable::SurfaceNetSolarRadiation,
        Variable::SurfaceSolarRadiationDownwards,
        Variable::WindU10,
        Variable::WindV10,
    ];

    /// Name used in archive requests.
    pub fn archive_name(&self) -> &'static str {
        match self {
            Variable::Temperature2m => "2m_temperature",
            Variable::SurfaceNetSolarRadiation => "surface_net_solar_radiation",
            Variable::SurfaceSolarRadiationDownwards => "surface_solar_radiation_downwards",
            Variable::WindU10 => "10m_u_component_of_wind",
            Variable::WindV10 => "10m_v_component_of_wind",
        }
    }

    /// Name of the variable inside the delivered grid file.
    pub fn short_name(&self) -> &'static str {
        match self {
            Variable::Temperature2m => "t2m",
            Variable::SurfaceNetSolarRadiation => "ssr",
            Variable::SurfaceSolarRadiationDownwards => "ssrd",
            Variable::WindU10 => "u10",
            Variable::WindV10 => "v10",
        }
    }

    pub fn native_unit(&self) -> Unit {
        match self {
            Variable::Temperature2m => Unit::Kelvin,
            Variable::SurfaceNetSolarRadiation | Variable::SurfaceSolarRadiationDownwards => {
                Unit::JoulesPerSquareMetre
            }
            Variable::WindU10 | Variable::WindV10 => Unit::MetresPerSecond,
        }
    }

    pub fn output_unit(&self) -> Unit {
        match self.native_unit() {
            Unit::Kelvin => Unit::Celsius,
            Unit::JoulesPerSquareMetre => Unit::WattsPerSquareMetre,
            u => u,
        }
    }

    /// Column header once values are in output units.
    pub fn column_name(&self) -> &'static str {
        match self {
            Variable::Temperature2m => "Air temperature (deg C)",
            Variable::SurfaceNetSolarRadiation => "Global irradiance (W/m2)",
            Variable::SurfaceSolarRadiationDownwards => "Downward irradiance (W/m2)",
            Variable::WindU10 => "Wind u-component (m/s)",
            Variable::WindV10 => "Wind v-component (m/s)",
        }
    }
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Kelvin => "K",
            Unit::Celsius => "deg C",
            Unit::JoulesPerSquareMetre => "J/m2",
            Unit::WattsPerSquareMetre => "W/m2",
            Unit::MetresPerSecond => "m/s",
        }
    }
}

impl AsRef<str> for Variable {
    fn as_ref(&self) -> &str {
        self.archive_name()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.archive_name())
    }
}

/// Accepts either the archive name or the short grid name.
impl FromStr for Variable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        Variable::ALL
            .into_iter()
            .find(|v| v.archive_name() == t || v.short_name() == t)
            .ok_or_else(|| Error::UnsupportedVariable(t.to_string()))
    }
}

impl Serialize for Variable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.archive_name())
    }
}

impl<'de> Deserialize<'de> for Variable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
