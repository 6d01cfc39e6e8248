use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A geographic point in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    latitude: f64,
    longitude: f64,
}

impl Site {
    /// Latitude must lie in -90..=90 and longitude in -180..=180.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidRequest(format!(
                "latitude must be within -90..=90, got {latitude}"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidRequest(format!(
                "longitude must be within -180..=180, got {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance in kilometres.
    pub fn distance_km(&self, latitude: f64, longitude: f64) -> f64 {
        haversine::distance(
            haversine::Location {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            haversine::Location {
                latitude,
                longitude,
            },
            haversine::Units::Kilometers,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_coordinates() {
        let s = Site::new(52.414, -1.143).unwrap();
        assert_eq!(s.latitude(), 52.414);
        assert_eq!(s.longitude(), -1.143);
        assert!(Site::new(90.0, 180.0).is_ok());
        assert!(Site::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(matches!(Site::new(90.5, 0.0), Err(Error::InvalidRequest(_))));
        assert!(matches!(Site::new(0.0, -180.1), Err(Error::InvalidRequest(_))));
        assert!(matches!(Site::new(f64::NAN, 0.0), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn distance_to_self_is_zero() {
        let s = Site::new(10.0, 20.0).unwrap();
        assert!(s.distance_km(10.0, 20.0).abs() < 1e-9);
        // One degree of latitude is roughly 111 km.
        let d = s.distance_km(11.0, 20.0);
        assert!((d - 111.2).abs() < 1.0, "got {d}");
    }
}
