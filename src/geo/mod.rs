pub mod distance;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Origin,
    Destination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateField {
    OriginLatitude,
    OriginLongitude,
    DestinationLatitude,
    DestinationLongitude,
}

impl CoordinateField {
    fn latitude_of(endpoint: Endpoint) -> Self {
        match endpoint {
            Endpoint::Origin => CoordinateField::OriginLatitude,
            Endpoint::Destination => CoordinateField::DestinationLatitude,
        }
    }

    fn longitude_of(endpoint: Endpoint) -> Self {
        match endpoint {
            Endpoint::Origin => CoordinateField::OriginLongitude,
            Endpoint::Destination => CoordinateField::DestinationLongitude,
        }
    }
}

impl fmt::Display for CoordinateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoordinateField::OriginLatitude => "origin latitude",
            CoordinateField::OriginLongitude => "origin longitude",
            CoordinateField::DestinationLatitude => "destination latitude",
            CoordinateField::DestinationLongitude => "destination longitude",
        };
        f.write_str(name)
    }
}

/// Builds a point from a `[lat, long]` pair, rejecting values outside the
/// valid ranges. NaN and infinities are out of range.
pub fn validated_point(endpoint: Endpoint, [lat, lng]: [f64; 2]) -> Result<GeoPoint, AppError> {
    if !LATITUDE_RANGE.contains(&lat) {
        return Err(AppError::CoordinateOutOfRange(CoordinateField::latitude_of(
            endpoint,
        )));
    }

    if !LONGITUDE_RANGE.contains(&lng) {
        return Err(AppError::CoordinateOutOfRange(CoordinateField::longitude_of(
            endpoint,
        )));
    }

    Ok(GeoPoint { lat, lng })
}
