//! The application coordinator: owns the update loop, wires the selection
//! state machine, the session sync queue and the remote collaborators
//! together, and projects the [`ViewModel`].

use tracing::{debug, warn};

use crate::capabilities::{Capabilities, SessionOutput, StorageOutput};
use crate::event::{Coordinate, Event, SessionId, WriteId};
use crate::model::{FieldError, Model, SessionPhase, ViewModel, Viewport};
use crate::route::{FormField, RouteRequest};
use crate::selection::PortSlot;
use crate::session::{SessionPatch, WriteOutcome, SESSION_ID_STORAGE_KEY};
use crate::{AppError, ErrorKind};

#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        match event {
            Event::Started => self.start(model, caps),
            Event::Resumed => self.resume(model, caps),
            Event::NavigatedAway => {
                model.cache.clear();
                caps.render.render();
            }
            Event::Reset => self.reset(model, caps),
            Event::SessionIdLoaded(result) => self.session_id_loaded(result, model, caps),
            Event::SessionIdStored(result) | Event::SessionIdCleared(result) => {
                if let Err(error) = result {
                    warn!(%error, "durable storage write failed");
                    model.last_error = Some(error.into());
                    caps.render.render();
                }
            }
            Event::SessionCreated(result) => self.session_created(result, model, caps),
            Event::SessionFetched(result) => self.session_fetched(result, model, caps),
            Event::SessionSaved { write_id, result } => {
                self.session_saved(write_id, result, model, caps);
            }
            Event::SessionDeleted(result) => {
                match result {
                    Ok(SessionOutput::Deleted) => debug!("session deleted"),
                    Ok(other) => warn!(?other, "unexpected delete response"),
                    Err(error) => {
                        // The remote record may linger; not fatal.
                        warn!(%error, "session delete failed");
                        model.last_error = Some(error.into());
                    }
                }
                caps.render.render();
            }

            Event::ShipTypeSelected(ship_type) => {
                model.ship_type = Some(ship_type);
                model.form_errors.remove(&FormField::ShipType);
                self.persist(SessionPatch::ship_type(ship_type), model, caps);
                caps.render.render();
            }
            Event::ShipDimensionsEntered(dimensions) => {
                model.ship_dimensions = Some(dimensions);
                model.form_errors.remove(&FormField::ShipDimensions);
                self.persist(SessionPatch::ship_dimensions(dimensions), model, caps);
                caps.render.render();
            }
            Event::DepartureSet(departure) => {
                model.departure = Some(departure.clone());
                model.form_errors.remove(&FormField::Departure);
                self.persist(SessionPatch::departure(departure), model, caps);
                caps.render.render();
            }
            Event::WeatherToggled => {
                model.show_weather = !model.show_weather;
                caps.render.render();
            }

            Event::PortPickRequested(slot) => {
                model.selection.begin(slot);
                caps.render.render();
            }
            Event::MapClicked { lon, lat } => self.map_clicked(lon, lat, model, caps),
            Event::PickConfirmed => self.pick_confirmed(model, caps),
            Event::PickCancelled => {
                if model.selection.mode().is_selecting() {
                    model.selection.cancel();
                    model.viewport = Viewport::overview();
                    caps.render.render();
                }
            }

            Event::SearchSubmitted(query) => self.search_submitted(&query, model, caps),
            Event::SearchCompleted(result) => self.search_completed(result, model, caps),

            Event::RoutePlanRequested => self.route_plan_requested(model, caps),
            Event::RoutePlanned(result) => self.route_planned(result, model, caps),
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel {
            phase: model.phase,
            selection_mode: model.selection.mode(),
            start_port: model.selection.start_port(),
            end_port: model.selection.end_port(),
            ship_type: model.ship_type,
            ship_dimensions: model.ship_dimensions,
            departure: model.departure.clone(),
            route: model.route.clone(),
            show_weather: model.show_weather,
            viewport: model.viewport,
            optimizing: model.optimizing,
            searching: model.searching,
            pending_writes: model.sync.len(),
            form_errors: model
                .form_errors
                .iter()
                .map(|(field, message)| FieldError {
                    field: field.key().to_owned(),
                    message: message.clone(),
                })
                .collect(),
            banner: model
                .last_error
                .as_ref()
                .map(AppError::user_facing_message),
        }
    }
}

impl App {
    // --- Session lifecycle ---

    fn start(&self, model: &mut Model, caps: &Capabilities) {
        model.phase = SessionPhase::Starting;
        caps.storage
            .get(SESSION_ID_STORAGE_KEY, Event::SessionIdLoaded);
        caps.render.render();
    }

    fn session_id_loaded(
        &self,
        result: Result<StorageOutput, crate::capabilities::StorageError>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        match result {
            Ok(StorageOutput::Value { value: Some(id) }) if !id.trim().is_empty() => {
                debug!(session_id = %id, "rejoining stored session");
                model.session_id = Some(SessionId::new(id));
                model.phase = SessionPhase::Resuming;
                self.load_session(model, caps);
            }
            Ok(_) => {
                model.phase = SessionPhase::Creating;
                caps.session.create(Event::SessionCreated);
            }
            Err(error) => {
                // A broken key store costs us reload continuity, not the
                // session itself.
                warn!(%error, "durable storage read failed");
                model.last_error = Some(error.into());
                model.phase = SessionPhase::Creating;
                caps.session.create(Event::SessionCreated);
            }
        }
        caps.render.render();
    }

    fn session_created(
        &self,
        result: crate::capabilities::SessionResult,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        match result {
            Ok(SessionOutput::Created { session_id }) if !session_id.trim().is_empty() => {
                debug!(%session_id, "session created");
                let id = SessionId::new(session_id);
                caps.storage.set(
                    SESSION_ID_STORAGE_KEY,
                    id.as_str().to_owned(),
                    Event::SessionIdStored,
                );
                model.session_id = Some(id);
                model.phase = SessionPhase::Ready;
                // Flush anything queued while we had no session yet.
                self.pump_sync(model, caps);
            }
            Ok(SessionOutput::Created { .. }) => {
                // Never proceed with a null id.
                warn!("session backend returned an empty id");
                model.phase = SessionPhase::Detached;
                model.last_error = Some(AppError::new(
                    ErrorKind::SessionCreate,
                    "backend returned an empty session id",
                ));
            }
            Ok(other) => {
                warn!(?other, "unexpected create response");
                model.phase = SessionPhase::Detached;
                model.last_error = Some(AppError::new(
                    ErrorKind::SessionCreate,
                    "unexpected response from session backend",
                ));
            }
            Err(error) => {
                warn!(%error, "session create failed");
                model.phase = SessionPhase::Detached;
                model.last_error = Some(error.into());
            }
        }
        caps.render.render();
    }

    /// Serve the session from the cache when populated, otherwise fall
    /// through to a remote read.
    fn load_session(&self, model: &mut Model, caps: &Capabilities) {
        if let Some(record) = model.cache.get().cloned() {
            model.hydrate(&record);
            model.phase = SessionPhase::Ready;
            return;
        }
        if let Some(session_id) = &model.session_id {
            caps.session.read(session_id, Event::SessionFetched);
        }
    }

    fn resume(&self, model: &mut Model, caps: &Capabilities) {
        self.load_session(model, caps);
        caps.render.render();
    }

    fn session_fetched(
        &self,
        result: crate::capabilities::SessionResult,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        model.phase = SessionPhase::Ready;
        match result {
            Ok(SessionOutput::Record {
                record: Some(record),
            }) => {
                model.cache.hydrate(record.clone());
                model.hydrate(&record);
            }
            Ok(SessionOutput::Record { record: None }) => {
                debug!("no saved record for this session yet");
            }
            Ok(other) => warn!(?other, "unexpected read response"),
            Err(error) => {
                // Read failures are masked: the user plans on with a fresh
                // form, and later writes repopulate the record.
                warn!(%error, "session read failed");
                model.last_error = Some(error.into());
            }
        }
        caps.render.render();
    }

    fn reset(&self, model: &mut Model, caps: &Capabilities) {
        if let Some(session_id) = model.session_id.take() {
            caps.session.delete(&session_id, Event::SessionDeleted);
            caps.storage
                .remove(SESSION_ID_STORAGE_KEY, Event::SessionIdCleared);
        }
        model.reset();
        caps.render.render();
    }

    // --- Write-through persistence ---

    /// Apply a patch locally, queue it for the backend and kick the queue.
    /// The local merge is never rolled back by a remote failure.
    fn persist(&self, patch: SessionPatch, model: &mut Model, caps: &Capabilities) {
        model.cache.apply(&patch);
        model.sync.enqueue(patch);
        self.pump_sync(model, caps);
    }

    fn pump_sync(&self, model: &mut Model, caps: &Capabilities) {
        let Some(session_id) = model.session_id.clone() else {
            // Detached: changes stay local until a session exists.
            return;
        };
        if let Some(write) = model.sync.begin_send() {
            debug!(write_id = %write.id, attempt = write.attempts, "forwarding session patch");
            let write_id = write.id;
            caps.session.update(&session_id, write.patch, move |result| {
                Event::SessionSaved { write_id, result }
            });
        }
    }

    fn session_saved(
        &self,
        write_id: WriteId,
        result: crate::capabilities::SessionResult,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        match result {
            Ok(SessionOutput::Updated) => {
                model.sync.complete(write_id);
                self.clear_write_error(model);
            }
            Ok(other) => {
                warn!(?other, "unexpected update response");
                model.sync.complete(write_id);
                self.clear_write_error(model);
            }
            Err(error) => {
                warn!(%write_id, %error, "session write failed");
                model.last_error = Some(error.into());
                match model.sync.fail(write_id, &model.retry) {
                    WriteOutcome::Retry { delay } => {
                        debug!(%write_id, ?delay, "retrying session write");
                    }
                    WriteOutcome::GaveUp => {
                        warn!(%write_id, "session write dropped after max attempts");
                    }
                    WriteOutcome::Stale => {
                        debug!(%write_id, "stale write completion ignored");
                    }
                }
            }
        }
        self.pump_sync(model, caps);
        caps.render.render();
    }

    /// A write just landed, so a lingering save-failure banner is out of
    /// date. Other error kinds are left for their own flows to clear.
    fn clear_write_error(&self, model: &mut Model) {
        if model
            .last_error
            .as_ref()
            .is_some_and(|error| error.kind == ErrorKind::SessionWrite)
        {
            model.last_error = None;
        }
    }

    // --- Location selection ---

    fn map_clicked(&self, lon: f64, lat: f64, model: &mut Model, caps: &Capabilities) {
        // Clicks outside an active pick are discarded without touching state.
        if !model.selection.mode().is_selecting() {
            return;
        }
        match Coordinate::new(lon, lat) {
            Ok(location) => self.candidate(location, model, caps),
            Err(error) => {
                model.last_error = Some(error.into());
                caps.render.render();
            }
        }
    }

    /// Single entry point for candidate locations, whether they come from a
    /// map click or a search hit.
    fn candidate(&self, location: Coordinate, model: &mut Model, caps: &Capabilities) {
        if model.selection.candidate(location) {
            model.viewport = Viewport::preview(location);
        }
        caps.render.render();
    }

    fn pick_confirmed(&self, model: &mut Model, caps: &Capabilities) {
        if !model.selection.mode().is_selecting() {
            return;
        }
        if let Some((slot, location)) = model.selection.confirm() {
            match slot {
                PortSlot::Start => model.form_errors.remove(&FormField::StartPort),
                PortSlot::End => model.form_errors.remove(&FormField::EndPort),
            };
            self.persist(SessionPatch::port(slot, location), model, caps);
        }
        model.viewport = Viewport::overview();
        caps.render.render();
    }

    // --- Search ---

    fn search_submitted(&self, query: &str, model: &mut Model, caps: &Capabilities) {
        let query = query.trim();
        if query.is_empty() {
            // Fail fast; the geocoder is never consulted.
            model.last_error = Some(AppError::new(
                ErrorKind::Validation,
                "Search query must not be empty",
            ));
            caps.render.render();
            return;
        }
        model.searching = true;
        model.last_error = None;
        caps.geocoder.search(query.to_owned(), Event::SearchCompleted);
        caps.render.render();
    }

    fn search_completed(
        &self,
        result: crate::capabilities::GeocodeResult,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        model.searching = false;
        match result {
            Ok(matches) => match matches.into_iter().next() {
                Some(hit) => {
                    debug!(label = %hit.label, "search hit");
                    self.candidate(hit.coordinate, model, caps);
                    return;
                }
                None => {
                    model.last_error =
                        Some(AppError::new(ErrorKind::NotFound, "Location not found"));
                }
            },
            Err(error) => {
                model.last_error = Some(error.into());
            }
        }
        caps.render.render();
    }

    // --- Route dispatch ---

    fn route_plan_requested(&self, model: &mut Model, caps: &Capabilities) {
        model.form_errors.clear();
        match RouteRequest::build(
            model.ship_type,
            model.ship_dimensions,
            model.selection.start_port(),
            model.selection.end_port(),
            model.departure.as_deref(),
        ) {
            Ok(request) => {
                debug!(ship_type = %request.ship_type, "dispatching route request");
                // A fresh submit invalidates the previous result.
                model.route = None;
                model.optimizing = true;
                model.last_error = None;
                caps.optimizer.optimize(request, Event::RoutePlanned);
            }
            Err(errors) => {
                model.form_errors = errors;
            }
        }
        caps.render.render();
    }

    fn route_planned(
        &self,
        result: crate::capabilities::OptimizeResult,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        model.optimizing = false;
        match result {
            Ok(plan) => match plan.validate() {
                Ok(()) => {
                    model.route = Some(plan.clone());
                    self.persist(SessionPatch::route(plan), model, caps);
                }
                Err(error) => {
                    warn!(%error, "optimizer returned an unusable route");
                    model.last_error =
                        Some(AppError::new(ErrorKind::Optimization, error.to_string()));
                }
            },
            Err(error) => {
                model.last_error = Some(error.into());
            }
        }
        caps.render.render();
    }
}
