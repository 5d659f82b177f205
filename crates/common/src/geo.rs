//! Geographic types and service-area validation.
//!
//! The geofence is a pure validator: it checks that a submitted coordinate
//! pair is numerically sane and falls inside the configured municipal
//! service area. It performs no I/O and can be called independently of
//! persistence.

use serde::{Deserialize, Serialize};

use crate::config::GeofenceConfig;
use crate::{AppError, AppResult};

/// A raw coordinate pair as submitted by a client.
///
/// Both fields are optional so that partial payloads surface as validation
/// errors rather than deserialization failures.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LocationInput {
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
}

/// A validated coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees, within [-90, 90].
    pub latitude: f64,
    /// Longitude in degrees, within [-180, 180].
    pub longitude: f64,
}

/// An axis-aligned geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    /// Southern edge.
    pub min_latitude: f64,
    /// Northern edge.
    pub max_latitude: f64,
    /// Western edge.
    pub min_longitude: f64,
    /// Eastern edge.
    pub max_longitude: f64,
}

impl BoundingBox {
    /// Whether the box contains the given point (edges inclusive).
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_latitude
            && latitude <= self.max_latitude
            && longitude >= self.min_longitude
            && longitude <= self.max_longitude
    }

    /// Parse a map-viewport bbox query parameter.
    ///
    /// Format: `minLon,minLat,maxLon,maxLat` (the ordering used by web map
    /// clients).
    pub fn parse(s: &str) -> AppResult<Self> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| {
                AppError::BadRequest(format!("Invalid bbox parameter: {s}"))
            })?;

        if parts.len() != 4 {
            return Err(AppError::BadRequest(format!(
                "Invalid bbox parameter: expected 4 values, got {}",
                parts.len()
            )));
        }

        let bbox = Self {
            min_longitude: parts[0],
            min_latitude: parts[1],
            max_longitude: parts[2],
            max_latitude: parts[3],
        };

        if bbox.min_latitude > bbox.max_latitude || bbox.min_longitude > bbox.max_longitude {
            return Err(AppError::BadRequest(
                "Invalid bbox parameter: min exceeds max".to_string(),
            ));
        }

        Ok(bbox)
    }
}

/// The municipal service area used to geofence incoming reports.
#[derive(Debug, Clone, Copy)]
pub struct ServiceArea {
    bounds: BoundingBox,
}

impl ServiceArea {
    /// Create a service area from an explicit bounding box.
    #[must_use]
    pub const fn new(bounds: BoundingBox) -> Self {
        Self { bounds }
    }

    /// Create a service area from configuration.
    #[must_use]
    pub const fn from_config(config: &GeofenceConfig) -> Self {
        Self {
            bounds: BoundingBox {
                min_latitude: config.min_latitude,
                max_latitude: config.max_latitude,
                min_longitude: config.min_longitude,
                max_longitude: config.max_longitude,
            },
        }
    }

    /// Validate a submitted location against this service area.
    ///
    /// Returns the validated coordinate pair on success.
    pub fn validate(&self, location: Option<LocationInput>) -> AppResult<Location> {
        let Some(input) = location else {
            return Err(AppError::BadRequest("Location is required".to_string()));
        };

        let (Some(latitude), Some(longitude)) = (input.latitude, input.longitude) else {
            return Err(AppError::BadRequest(
                "Location must include latitude and longitude".to_string(),
            ));
        };

        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(AppError::BadRequest(
                "Latitude and longitude must be valid numbers".to_string(),
            ));
        }

        if !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::BadRequest(
                "Latitude must be between -90 and 90".to_string(),
            ));
        }

        if !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::BadRequest(
                "Longitude must be between -180 and 180".to_string(),
            ));
        }

        if !self.bounds.contains(latitude, longitude) {
            return Err(AppError::BadRequest(
                "Location is outside the city boundaries".to_string(),
            ));
        }

        Ok(Location { latitude, longitude })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn turin_area() -> ServiceArea {
        ServiceArea::from_config(&GeofenceConfig::default())
    }

    fn input(latitude: f64, longitude: f64) -> Option<LocationInput> {
        Some(LocationInput {
            latitude: Some(latitude),
            longitude: Some(longitude),
        })
    }

    #[test]
    fn test_validate_accepts_point_inside_service_area() {
        let location = turin_area().validate(input(45.0703393, 7.6869005)).unwrap();
        assert_eq!(location.latitude, 45.0703393);
        assert_eq!(location.longitude, 7.6869005);
    }

    #[test]
    fn test_validate_rejects_missing_location() {
        let err = turin_area().validate(None).unwrap_err();
        assert!(err.to_string().contains("Location is required"));
    }

    #[test]
    fn test_validate_rejects_partial_coordinates() {
        let err = turin_area()
            .validate(Some(LocationInput {
                latitude: Some(45.07),
                longitude: None,
            }))
            .unwrap_err();
        assert!(err.to_string().contains("latitude and longitude"));
    }

    #[test]
    fn test_validate_rejects_nan() {
        assert!(turin_area().validate(input(f64::NAN, 7.68)).is_err());
        assert!(turin_area().validate(input(45.07, f64::INFINITY)).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(turin_area().validate(input(91.0, 7.68)).is_err());
        assert!(turin_area().validate(input(-91.0, 7.68)).is_err());
        assert!(turin_area().validate(input(45.07, 181.0)).is_err());
        assert!(turin_area().validate(input(45.07, -181.0)).is_err());
    }

    #[test]
    fn test_validate_rejects_point_outside_city() {
        // Milan
        let err = turin_area().validate(input(45.464, 9.19)).unwrap_err();
        assert!(err.to_string().contains("outside the city boundaries"));
    }

    #[test]
    fn test_validate_is_idempotent() {
        let area = turin_area();
        let first = area.validate(input(45.05, 7.66)).unwrap();
        let second = area.validate(input(45.05, 7.66)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_bbox_parse() {
        let bbox = BoundingBox::parse("7.55,44.95,7.75,45.15").unwrap();
        assert!(bbox.contains(45.07, 7.68));
        assert!(!bbox.contains(45.464, 9.19));
    }

    #[test]
    fn test_bbox_parse_rejects_malformed() {
        assert!(BoundingBox::parse("7.55,44.95,7.75").is_err());
        assert!(BoundingBox::parse("a,b,c,d").is_err());
        assert!(BoundingBox::parse("7.75,45.15,7.55,44.95").is_err());
    }
}
