use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A WGS84 point. Longitude comes first, matching GeoJSON ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !self.lng.is_finite() || !self.lat.is_finite() {
            return Err(AppError::InvalidInput(
                "coordinate must be finite".to_string(),
            ));
        }

        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(AppError::InvalidInput(format!(
                "latitude {} out of range",
                self.lat
            )));
        }

        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(AppError::InvalidInput(format!(
                "longitude {} out of range",
                self.lng
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Coordinate;

    #[test]
    fn accepts_ordinary_point() {
        assert!(Coordinate::new(101.6869, 3.1390).validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(Coordinate::new(101.0, 91.0).validate().is_err());
    }

    #[test]
    fn rejects_nan() {
        assert!(Coordinate::new(f64::NAN, 3.0).validate().is_err());
    }
}
