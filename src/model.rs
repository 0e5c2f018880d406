use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::event::{Coordinate, SessionId};
use crate::route::{FormField, RouteResult, ShipDimensions, ShipType};
use crate::selection::{SelectionController, SelectionMode};
use crate::session::{LocalSessionCache, SessionRecord, SyncQueue};
use crate::{
    AppError, RetryPolicy, DEFAULT_MAP_CENTER_LAT, DEFAULT_MAP_CENTER_LON, DEFAULT_MAP_ZOOM,
    PREVIEW_ZOOM,
};

/// Where the app is in its session lifecycle.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// Boot has not read durable storage yet.
    #[default]
    Starting,
    /// A stored session id was found; reading the record.
    Resuming,
    /// No stored id; waiting on the backend to issue one.
    Creating,
    /// Session established, writes flow through the sync queue.
    Ready,
    /// Session could not be established. The planner still works, but
    /// nothing is persisted remotely.
    Detached,
}

impl SessionPhase {
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: f64,
}

impl Viewport {
    /// The wide overview the map opens on.
    #[must_use]
    pub const fn overview() -> Self {
        Self {
            center: Coordinate::from_parts(DEFAULT_MAP_CENTER_LON, DEFAULT_MAP_CENTER_LAT),
            zoom: DEFAULT_MAP_ZOOM,
        }
    }

    /// Zoomed in on a candidate location during a pick.
    #[must_use]
    pub const fn preview(location: Coordinate) -> Self {
        Self {
            center: location,
            zoom: PREVIEW_ZOOM,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::overview()
    }
}

/// Canonical application state. Pure renderers read the [`ViewModel`]
/// projection; nothing else holds UI state.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Model {
    pub phase: SessionPhase,
    pub session_id: Option<SessionId>,
    pub cache: LocalSessionCache,
    pub sync: SyncQueue,
    pub retry: RetryPolicy,
    pub selection: SelectionController,
    pub ship_type: Option<ShipType>,
    pub ship_dimensions: Option<ShipDimensions>,
    pub departure: Option<String>,
    pub route: Option<RouteResult>,
    // Session-local display toggle, deliberately not part of the record.
    pub show_weather: bool,
    pub viewport: Viewport,
    pub optimizing: bool,
    pub searching: bool,
    pub form_errors: BTreeMap<FormField, String>,
    pub last_error: Option<AppError>,
}

impl Model {
    /// Restore form and map state from a saved session record.
    pub fn hydrate(&mut self, record: &SessionRecord) {
        self.ship_type = record.ship_type;
        self.ship_dimensions = record.ship_dimensions;
        self.departure = record.departure.clone();
        self.route = record.route.clone();
        self.selection
            .restore_ports(record.start_port, record.end_port);
    }

    /// Full teardown back to a pristine model, keeping the tuned retry
    /// policy.
    pub fn reset(&mut self) {
        *self = Self {
            retry: self.retry.clone(),
            ..Self::default()
        };
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// What the shell renders. A pure projection of [`Model`]; recomputed on
/// every render effect.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ViewModel {
    pub phase: SessionPhase,
    pub selection_mode: SelectionMode,
    pub start_port: Option<Coordinate>,
    pub end_port: Option<Coordinate>,
    pub ship_type: Option<ShipType>,
    pub ship_dimensions: Option<ShipDimensions>,
    pub departure: Option<String>,
    pub route: Option<RouteResult>,
    pub show_weather: bool,
    pub viewport: Viewport,
    pub optimizing: bool,
    pub searching: bool,
    pub pending_writes: usize,
    pub form_errors: Vec<FieldError>,
    pub banner: Option<String>,
}
