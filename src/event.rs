use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::capabilities::{GeocodeResult, OptimizeResult, SessionResult, StorageResult};
use crate::route::{ShipDimensions, ShipType};
use crate::selection::PortSlot;

// --- Coordinate: validated, NaN-safe, (longitude, latitude) order ---

/// A point on the globe, ordered (longitude, latitude) to match the wire
/// format of the map and optimizer collaborators.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Coordinate {
    lon: f64,
    lat: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("coordinate value is not finite (NaN or infinity)")]
    NonFinite,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Result<Self, CoordinateError> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange(lon));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        Ok(Self { lon, lat })
    }

    /// Caller guarantees the values are in range; used for const defaults.
    pub(crate) const fn from_parts(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    #[must_use]
    pub const fn lon(self) -> f64 {
        self.lon
    }

    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn as_lon_lat(self) -> (f64, f64) {
        (self.lon, self.lat)
    }
}

// Bitwise comparison so coordinates can key state transitions without
// tripping over float semantics.
impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.lon.to_bits() == other.lon.to_bits() && self.lat.to_bits() == other.lat.to_bits()
    }
}

impl Eq for Coordinate {}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.4}, {:.4}]", self.lon, self.lat)
    }
}

// --- Typed ids ---

/// Opaque session identifier issued by the session backend and persisted in
/// durable shell storage across reloads.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlation id for one queued session write, so a stale completion can
/// never be mistaken for the in-flight one.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WriteId(Uuid);

impl WriteId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for WriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// --- Event enum ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    // Boot and session lifecycle
    Started,
    Resumed,
    NavigatedAway,
    Reset,
    SessionIdLoaded(StorageResult),
    SessionIdStored(StorageResult),
    SessionIdCleared(StorageResult),
    SessionCreated(SessionResult),
    SessionFetched(SessionResult),
    SessionSaved {
        write_id: WriteId,
        result: SessionResult,
    },
    SessionDeleted(SessionResult),

    // Trip form
    ShipTypeSelected(ShipType),
    ShipDimensionsEntered(ShipDimensions),
    DepartureSet(String),
    WeatherToggled,

    // Location selection
    PortPickRequested(PortSlot),
    MapClicked {
        lon: f64,
        lat: f64,
    },
    PickConfirmed,
    PickCancelled,

    // Search
    SearchSubmitted(String),
    SearchCompleted(GeocodeResult),

    // Route dispatch
    RoutePlanRequested,
    RoutePlanned(OptimizeResult),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_rejects_nan() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn coordinate_rejects_infinity() {
        assert!(Coordinate::new(f64::INFINITY, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn coordinate_rejects_out_of_range() {
        assert!(matches!(
            Coordinate::new(181.0, 0.0),
            Err(CoordinateError::LongitudeOutOfRange(_))
        ));
        assert!(matches!(
            Coordinate::new(0.0, 91.0),
            Err(CoordinateError::LatitudeOutOfRange(_))
        ));
        assert!(Coordinate::new(-181.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, -91.0).is_err());
    }

    #[test]
    fn coordinate_accepts_boundaries() {
        assert!(Coordinate::new(180.0, 90.0).is_ok());
        assert!(Coordinate::new(-180.0, -90.0).is_ok());
        assert!(Coordinate::new(72.8, 18.9).is_ok());
    }

    #[test]
    fn coordinate_order_is_lon_lat() {
        let c = Coordinate::new(72.8, 18.9).unwrap();
        assert_eq!(c.as_lon_lat(), (72.8, 18.9));
    }

    #[test]
    fn write_ids_are_unique() {
        assert_ne!(WriteId::generate(), WriteId::generate());
    }
}
