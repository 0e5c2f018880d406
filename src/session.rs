//! Session persistence: the remote record shape, merge patches, the local
//! write-through cache and the ordered sync queue.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

use crate::event::{Coordinate, WriteId};
use crate::route::{RouteResult, ShipDimensions, ShipType};
use crate::selection::PortSlot;
use crate::RetryPolicy;

/// Durable-storage key the session id lives under, so a reload can rejoin.
pub const SESSION_ID_STORAGE_KEY: &str = "sessionId";

/// The remote session document. Every field is optional: a freshly created
/// session is an empty record that fills in as the user plans.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionRecord {
    pub ship_type: Option<ShipType>,
    pub ship_dimensions: Option<ShipDimensions>,
    pub start_port: Option<Coordinate>,
    pub end_port: Option<Coordinate>,
    pub departure: Option<String>,
    pub route: Option<RouteResult>,
}

impl SessionRecord {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ship_type.is_none()
            && self.ship_dimensions.is_none()
            && self.start_port.is_none()
            && self.end_port.is_none()
            && self.departure.is_none()
            && self.route.is_none()
    }
}

/// A partial update to the session record. `None` fields are left off the
/// wire entirely; the backend merges rather than replaces.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ship_type: Option<ShipType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ship_dimensions: Option<ShipDimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_port: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_port: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteResult>,
}

impl SessionPatch {
    #[must_use]
    pub fn ship_type(value: ShipType) -> Self {
        Self {
            ship_type: Some(value),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn ship_dimensions(value: ShipDimensions) -> Self {
        Self {
            ship_dimensions: Some(value),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn port(slot: PortSlot, location: Coordinate) -> Self {
        match slot {
            PortSlot::Start => Self {
                start_port: Some(location),
                ..Self::default()
            },
            PortSlot::End => Self {
                end_port: Some(location),
                ..Self::default()
            },
        }
    }

    #[must_use]
    pub fn departure(value: String) -> Self {
        Self {
            departure: Some(value),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn route(value: RouteResult) -> Self {
        Self {
            route: Some(value),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge this patch into a record. Set fields win, unset fields leave
    /// the record untouched.
    pub fn apply_to(&self, record: &mut SessionRecord) {
        if let Some(value) = self.ship_type {
            record.ship_type = Some(value);
        }
        if let Some(value) = self.ship_dimensions {
            record.ship_dimensions = Some(value);
        }
        if let Some(value) = self.start_port {
            record.start_port = Some(value);
        }
        if let Some(value) = self.end_port {
            record.end_port = Some(value);
        }
        if let Some(value) = &self.departure {
            record.departure = Some(value.clone());
        }
        if let Some(value) = &self.route {
            record.route = Some(value.clone());
        }
    }
}

/// In-memory copy of the session record for the current tab. Reads are
/// served from here once populated; writes land here synchronously before
/// they are forwarded to the backend. Staleness across tabs is accepted.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LocalSessionCache {
    record: Option<SessionRecord>,
}

impl LocalSessionCache {
    #[must_use]
    pub const fn get(&self) -> Option<&SessionRecord> {
        self.record.as_ref()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.record.is_none()
    }

    /// Populate from a remote read. Only called when the cache is empty, so
    /// local writes are never clobbered by a slow fetch.
    pub fn hydrate(&mut self, record: SessionRecord) {
        self.record = Some(record);
    }

    pub fn apply(&mut self, patch: &SessionPatch) {
        patch.apply_to(self.record.get_or_insert_with(SessionRecord::default));
    }

    pub fn clear(&mut self) {
        self.record = None;
    }
}

/// One queued remote write.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PendingWrite {
    pub id: WriteId,
    pub patch: SessionPatch,
    pub attempts: u32,
}

/// Outcome of a failed write, decided against the retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Re-issue after the given backoff delay.
    Retry { delay: Duration },
    /// Attempts exhausted; the write was dropped from the queue.
    GaveUp,
    /// Completion for a write that is no longer in flight.
    Stale,
}

/// FIFO queue of session patches awaiting remote acknowledgement. At most
/// one write is in flight at a time, preserving issue order at the backend.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SyncQueue {
    queue: VecDeque<PendingWrite>,
    in_flight: bool,
}

impl SyncQueue {
    pub fn enqueue(&mut self, patch: SessionPatch) -> WriteId {
        let id = WriteId::generate();
        self.queue.push_back(PendingWrite {
            id,
            patch,
            attempts: 0,
        });
        id
    }

    /// Take the front write for sending. Returns `None` while another write
    /// is already in flight or the queue is empty. Each call counts as one
    /// attempt.
    pub fn begin_send(&mut self) -> Option<PendingWrite> {
        if self.in_flight {
            return None;
        }
        let front = self.queue.front_mut()?;
        front.attempts += 1;
        self.in_flight = true;
        Some(front.clone())
    }

    /// Acknowledge the in-flight write. Completions for any other id are
    /// ignored.
    pub fn complete(&mut self, id: WriteId) -> bool {
        if !self.in_flight || self.queue.front().map(|w| w.id) != Some(id) {
            return false;
        }
        self.queue.pop_front();
        self.in_flight = false;
        true
    }

    /// Record a failed write and decide what happens next.
    pub fn fail(&mut self, id: WriteId, policy: &RetryPolicy) -> WriteOutcome {
        if !self.in_flight || self.queue.front().map(|w| w.id) != Some(id) {
            return WriteOutcome::Stale;
        }
        self.in_flight = false;
        let front = &self.queue[0];
        if policy.allows(front.attempts) {
            WriteOutcome::Retry {
                delay: policy.delay_for_attempt(front.attempts),
            }
        } else {
            self.queue.pop_front();
            WriteOutcome::GaveUp
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub const fn in_flight(&self) -> bool {
        self.in_flight
    }
}
