//! Geocoding capability. One search request per explicit user submit; the
//! core never retries a search on its own.

use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::Coordinate;
use crate::{DEFAULT_CALL_TIMEOUT_MS, MAX_GEOCODE_RESULTS};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum GeocodeOperation {
    Search {
        query: String,
        limit: u32,
        timeout_ms: u64,
    },
}

impl Operation for GeocodeOperation {
    type Output = GeocodeResult;
}

/// One geocoder hit. An empty result list is a valid response; "not found"
/// is decided by the caller, not the capability.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GeocodeMatch {
    pub coordinate: Coordinate,
    pub label: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {reason}")]
    Transient { reason: String },
    #[error("geocoder timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

pub type GeocodeResult = Result<Vec<GeocodeMatch>, GeocodeError>;

pub struct Geocoder<Ev> {
    context: CapabilityContext<GeocodeOperation, Ev>,
}

impl<Ev> crux_core::capability::Capability<Ev> for Geocoder<Ev> {
    type Operation = GeocodeOperation;
    type MappedSelf<MappedEv> = Geocoder<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Geocoder::new(self.context.map_event(f))
    }
}

impl<Ev> Geocoder<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<GeocodeOperation, Ev>) -> Self {
        Self { context }
    }

    /// Callers pass a non-empty, trimmed query; empty input is rejected
    /// before it reaches this capability.
    pub fn search<F>(&self, query: String, make_event: F)
    where
        F: FnOnce(GeocodeResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        let operation = GeocodeOperation::Search {
            query,
            limit: MAX_GEOCODE_RESULTS,
            timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
        };
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}
