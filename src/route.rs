//! Route request assembly and validation.
//!
//! A request is only dispatched to the optimizer once every required field is
//! present and well formed; failures are keyed by field so the form can
//! highlight exactly what is missing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::event::Coordinate;
use crate::MIN_ROUTE_WAYPOINTS;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ShipType {
    Cargo,
    Tanker,
    Passenger,
}

impl ShipType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cargo => "cargo",
            Self::Tanker => "tanker",
            Self::Passenger => "passenger",
        }
    }

    #[must_use]
    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "cargo" => Some(Self::Cargo),
            "tanker" => Some(Self::Tanker),
            "passenger" => Some(Self::Passenger),
            _ => None,
        }
    }
}

impl fmt::Display for ShipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DimensionError {
    #[error("ship {field} must be a positive number, got {value}")]
    NotPositive { field: &'static str, value: f64 },
}

/// Hull dimensions in metres. Each value is a positive finite number,
/// enforced at construction.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ShipDimensions {
    length: f64,
    width: f64,
    draft: f64,
}

impl ShipDimensions {
    pub fn new(length: f64, width: f64, draft: f64) -> Result<Self, DimensionError> {
        for (field, value) in [("length", length), ("width", width), ("draft", draft)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DimensionError::NotPositive { field, value });
            }
        }
        Ok(Self {
            length,
            width,
            draft,
        })
    }

    #[must_use]
    pub const fn length(self) -> f64 {
        self.length
    }

    #[must_use]
    pub const fn width(self) -> f64 {
        self.width
    }

    #[must_use]
    pub const fn draft(self) -> f64 {
        self.draft
    }
}

/// Form fields a route request is assembled from, keyed the way the wire
/// format names them.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    ShipType,
    ShipDimensions,
    StartPort,
    EndPort,
    Departure,
}

impl FormField {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::ShipType => "shipType",
            Self::ShipDimensions => "shipDimensions",
            Self::StartPort => "startPort",
            Self::EndPort => "endPort",
            Self::Departure => "departureTimestamp",
        }
    }
}

pub type FieldErrors = BTreeMap<FormField, String>;

/// A fully validated optimization request. Only constructed via [`build`],
/// so a value of this type implies every field was present and well formed.
///
/// [`build`]: RouteRequest::build
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub ship_type: ShipType,
    pub ship_dimensions: ShipDimensions,
    pub start_port: Coordinate,
    pub end_port: Coordinate,
    pub departure: String,
}

impl RouteRequest {
    /// Assemble a request from the current form state. Every missing or
    /// malformed field is reported; the optimizer is never consulted on a
    /// partial request.
    pub fn build(
        ship_type: Option<ShipType>,
        ship_dimensions: Option<ShipDimensions>,
        start_port: Option<Coordinate>,
        end_port: Option<Coordinate>,
        departure: Option<&str>,
    ) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        if ship_type.is_none() {
            errors.insert(FormField::ShipType, "Ship type is required".into());
        }
        if ship_dimensions.is_none() {
            errors.insert(
                FormField::ShipDimensions,
                "Ship dimensions are required".into(),
            );
        }
        if start_port.is_none() {
            errors.insert(FormField::StartPort, "Start port is required".into());
        }
        if end_port.is_none() {
            errors.insert(FormField::EndPort, "End port is required".into());
        }
        match departure {
            None => {
                errors.insert(FormField::Departure, "Departure time is required".into());
            }
            Some(raw) => {
                if chrono::DateTime::parse_from_rfc3339(raw).is_err() {
                    errors.insert(
                        FormField::Departure,
                        "Departure time must be an RFC 3339 timestamp".into(),
                    );
                }
            }
        }
        let (Some(ship_type), Some(ship_dimensions), Some(start_port), Some(end_port), Some(departure)) =
            (ship_type, ship_dimensions, start_port, end_port, departure)
        else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self {
            ship_type,
            ship_dimensions,
            start_port,
            end_port,
            departure: departure.to_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteResultError {
    #[error("optimized route has {count} waypoints, need at least {MIN_ROUTE_WAYPOINTS}")]
    TooFewWaypoints { count: usize },
    #[error("optimized route reports a negative {field}")]
    NegativeMetric { field: &'static str },
}

/// An optimized route as returned by the optimizer and stored in the session
/// record. Arrives over the wire, so consumers call [`validate`] before
/// trusting it.
///
/// [`validate`]: RouteResult::validate
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub waypoints: Vec<Coordinate>,
    pub distance: f64,
    pub num_steps: u32,
    pub avg_step_distance: f64,
}

impl RouteResult {
    pub fn validate(&self) -> Result<(), RouteResultError> {
        if self.waypoints.len() < MIN_ROUTE_WAYPOINTS {
            return Err(RouteResultError::TooFewWaypoints {
                count: self.waypoints.len(),
            });
        }
        for (field, value) in [
            ("distance", self.distance),
            ("avgStepDistance", self.avg_step_distance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RouteResultError::NegativeMetric { field });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat).unwrap()
    }

    fn dims() -> ShipDimensions {
        ShipDimensions::new(200.0, 32.0, 12.5).unwrap()
    }

    #[test]
    fn dimensions_must_be_positive() {
        assert!(ShipDimensions::new(0.0, 32.0, 12.5).is_err());
        assert!(ShipDimensions::new(200.0, -1.0, 12.5).is_err());
        assert!(ShipDimensions::new(200.0, 32.0, f64::NAN).is_err());
        assert!(ShipDimensions::new(200.0, 32.0, 12.5).is_ok());
    }

    #[test]
    fn ship_type_round_trips_lowercase() {
        assert_eq!(ShipType::Cargo.as_str(), "cargo");
        assert_eq!(ShipType::from_str_opt("tanker"), Some(ShipType::Tanker));
        assert_eq!(ShipType::from_str_opt("submarine"), None);
    }

    #[test]
    fn build_reports_every_missing_field() {
        let errors = RouteRequest::build(None, None, None, None, None).unwrap_err();
        let keys: Vec<&str> = errors.keys().map(|f| f.key()).collect();
        assert_eq!(
            keys,
            vec![
                "shipType",
                "shipDimensions",
                "startPort",
                "endPort",
                "departureTimestamp"
            ]
        );
    }

    #[test]
    fn build_reports_only_the_missing_field() {
        let errors = RouteRequest::build(
            Some(ShipType::Cargo),
            Some(dims()),
            Some(coord(72.8, 18.9)),
            None,
            Some("2024-08-25T00:00:00Z"),
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get(&FormField::EndPort).map(String::as_str),
            Some("End port is required")
        );
    }

    #[test]
    fn build_rejects_malformed_departure() {
        let errors = RouteRequest::build(
            Some(ShipType::Cargo),
            Some(dims()),
            Some(coord(72.8, 18.9)),
            Some(coord(88.3, 22.5)),
            Some("next tuesday"),
        )
        .unwrap_err();
        assert!(errors.contains_key(&FormField::Departure));
    }

    #[test]
    fn build_accepts_complete_form() {
        let request = RouteRequest::build(
            Some(ShipType::Tanker),
            Some(dims()),
            Some(coord(72.8, 18.9)),
            Some(coord(88.3, 22.5)),
            Some("2024-08-25T00:00:00+05:30"),
        )
        .unwrap();
        assert_eq!(request.ship_type, ShipType::Tanker);
        assert_eq!(request.start_port, coord(72.8, 18.9));
    }

    #[test]
    fn route_result_needs_two_waypoints() {
        let result = RouteResult {
            waypoints: vec![coord(72.8, 18.9)],
            distance: 100.0,
            num_steps: 1,
            avg_step_distance: 100.0,
        };
        assert!(matches!(
            result.validate(),
            Err(RouteResultError::TooFewWaypoints { count: 1 })
        ));
    }

    #[test]
    fn route_result_rejects_negative_metrics() {
        let result = RouteResult {
            waypoints: vec![coord(72.8, 18.9), coord(88.3, 22.5)],
            distance: -1.0,
            num_steps: 1,
            avg_step_distance: 100.0,
        };
        assert!(result.validate().is_err());
    }

    #[test]
    fn route_request_serializes_camel_case() {
        let request = RouteRequest::build(
            Some(ShipType::Cargo),
            Some(dims()),
            Some(coord(72.8, 18.9)),
            Some(coord(88.3, 22.5)),
            Some("2024-08-25T00:00:00Z"),
        )
        .unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["shipType"], "cargo");
        assert!(json["shipDimensions"].is_object());
        assert!(json["startPort"].is_object());
    }
}
