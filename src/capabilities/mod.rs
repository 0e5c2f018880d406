//! Typed collaborators the core suspends on. Each capability owns its
//! operation, output and error types; the shell fulfils requests and the
//! results come back as events.

mod geocoder;
mod optimizer;
mod session;
mod storage;

pub use geocoder::{GeocodeError, GeocodeMatch, GeocodeOperation, GeocodeResult, Geocoder};
pub use optimizer::{OptimizeError, OptimizeOperation, OptimizeResult, Optimizer};
pub use session::{SessionBackend, SessionError, SessionOperation, SessionOutput, SessionResult};
pub use storage::{KeyStore, StorageError, StorageOperation, StorageOutput, StorageResult};

use crux_core::render::Render;

use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub render: Render<Event>,
    pub session: SessionBackend<Event>,
    pub storage: KeyStore<Event>,
    pub geocoder: Geocoder<Event>,
    pub optimizer: Optimizer<Event>,
}
