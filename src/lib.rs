//! Headless core of an interactive ship-route-planning client.
//!
//! The crate owns all application state and behavior: the location selection
//! state machine, the session write-through cache and sync queue, search and
//! route-optimization dispatch. Rendering, networking and storage live in
//! shells that fulfil the typed capability requests this core emits.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

pub mod app;
pub mod capabilities;
pub mod event;
pub mod model;
pub mod route;
pub mod selection;
pub mod session;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use event::{Coordinate, CoordinateError, Event, SessionId, WriteId};
pub use model::{FieldError, Model, SessionPhase, ViewModel, Viewport};
pub use route::{
    FieldErrors, FormField, RouteRequest, RouteResult, ShipDimensions, ShipType,
};
pub use selection::{PortSlot, SelectionController, SelectionMode};
pub use session::{
    LocalSessionCache, SessionPatch, SessionRecord, SyncQueue, SESSION_ID_STORAGE_KEY,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use capabilities::{GeocodeError, OptimizeError, SessionError, StorageError};

/// Shell-enforced deadline on every remote capability call.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 10_000;

/// Map overview center (Indian Ocean basin), longitude then latitude.
pub const DEFAULT_MAP_CENTER_LON: f64 = 78.9629;
pub const DEFAULT_MAP_CENTER_LAT: f64 = 20.5937;
pub const DEFAULT_MAP_ZOOM: f64 = 5.0;
/// Zoom level used when previewing a candidate location.
pub const PREVIEW_ZOOM: f64 = 10.0;

/// Geocoder hits requested per search; only the first is used today.
pub const MAX_GEOCODE_RESULTS: u32 = 5;

/// A route must at least connect its two ports.
pub const MIN_ROUTE_WAYPOINTS: usize = 2;

pub const MAX_WRITE_ATTEMPTS: u32 = 3;
pub const BASE_RETRY_DELAY_MS: u64 = 1_000;
pub const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Stable failure categories. Every capability error is folded into one of
/// these before it reaches the model; no failure escapes the update loop.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Transient,
    NotFound,
    SessionCreate,
    SessionRead,
    SessionWrite,
    Optimization,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transient => "transient",
            Self::NotFound => "not_found",
            Self::SessionCreate => "session_create",
            Self::SessionRead => "session_read",
            Self::SessionWrite => "session_write",
            Self::Optimization => "optimization",
        }
    }

    /// Whether retrying the same operation could plausibly succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Transient | Self::SessionCreate | Self::SessionRead | Self::SessionWrite
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Copy suitable for an error banner.
    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::Transient => {
                "Unable to reach the server. Please check your connection and try again.".into()
            }
            ErrorKind::NotFound => "Location not found. Try a different search.".into(),
            ErrorKind::SessionCreate => {
                "Could not start a planning session. Your changes will not be saved.".into()
            }
            ErrorKind::SessionRead => "Could not load your saved session. Starting fresh.".into(),
            ErrorKind::SessionWrite => {
                "Could not save your changes. They are kept locally.".into()
            }
            ErrorKind::Optimization => {
                format!("Error optimizing route: {}. Please try again.", self.message)
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message)
    }
}

impl std::error::Error for AppError {}

impl From<SessionError> for AppError {
    fn from(error: SessionError) -> Self {
        let kind = match &error {
            SessionError::CreateFailed { .. } => ErrorKind::SessionCreate,
            SessionError::ReadFailed { .. } => ErrorKind::SessionRead,
            SessionError::WriteFailed { .. } => ErrorKind::SessionWrite,
            SessionError::Timeout { .. } => ErrorKind::Transient,
        };
        Self::new(kind, error.to_string())
    }
}

impl From<GeocodeError> for AppError {
    fn from(error: GeocodeError) -> Self {
        Self::new(ErrorKind::Transient, error.to_string())
    }
}

impl From<OptimizeError> for AppError {
    fn from(error: OptimizeError) -> Self {
        let kind = match &error {
            OptimizeError::Rejected { .. } => ErrorKind::Optimization,
            OptimizeError::Transient { .. } | OptimizeError::Timeout { .. } => ErrorKind::Transient,
        };
        Self::new(kind, error.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(error: StorageError) -> Self {
        Self::new(ErrorKind::Transient, error.to_string())
    }
}

impl From<CoordinateError> for AppError {
    fn from(error: CoordinateError) -> Self {
        Self::new(ErrorKind::Validation, error.to_string())
    }
}

/// Backoff schedule for failed session writes. Lives on the model so shells
/// and tests can tune it. Search and optimization are never auto-retried.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_WRITE_ATTEMPTS,
            base_delay_ms: BASE_RETRY_DELAY_MS,
            max_delay_ms: MAX_RETRY_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Whether another attempt is allowed after `attempts` tries so far.
    #[must_use]
    pub const fn allows(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Exponential backoff, doubling per attempt and capped.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}
