use crux_core::testing::AppTester;
use crux_core::Request;

use voyage_shared::capabilities::{
    GeocodeMatch, GeocodeOperation, OptimizeOperation, SessionOperation, SessionOutput,
    StorageOperation, StorageOutput,
};
use voyage_shared::{
    App, Coordinate, Effect, ErrorKind, Event, Model, PortSlot, RouteResult, SessionPatch,
    SessionPhase, ShipDimensions, ShipType,
};

fn coord(lon: f64, lat: f64) -> Coordinate {
    Coordinate::new(lon, lat).unwrap()
}

fn dims() -> ShipDimensions {
    ShipDimensions::new(200.0, 32.0, 12.5).unwrap()
}

fn take_session(effects: &mut Vec<Effect>) -> Request<SessionOperation> {
    let index = effects
        .iter()
        .position(|e| matches!(e, Effect::SessionBackend(_)))
        .expect("expected a session effect");
    match effects.remove(index) {
        Effect::SessionBackend(request) => request,
        _ => unreachable!(),
    }
}

fn feed(app: &AppTester<App, Effect>, events: Vec<Event>, model: &mut Model) -> Vec<Effect> {
    let mut effects = Vec::new();
    for event in events {
        effects.extend(app.update(event, model).effects);
    }
    effects
}

/// Drive boot to a ready session with id "sess-1" and no saved record.
fn boot(app: &AppTester<App, Effect>, model: &mut Model) {
    let mut effects = app.update(Event::Started, model).effects;
    let index = effects
        .iter()
        .position(|e| matches!(e, Effect::KeyStore(_)))
        .expect("expected a storage effect");
    let Effect::KeyStore(mut request) = effects.remove(index) else {
        unreachable!()
    };
    assert_eq!(
        request.operation,
        StorageOperation::Get {
            key: "sessionId".into()
        }
    );

    let update = app
        .resolve(&mut request, Ok(StorageOutput::Value { value: None }))
        .expect("resolve storage get");
    let mut effects = feed(app, update.events, model);

    let mut request = take_session(&mut effects);
    assert!(matches!(request.operation, SessionOperation::Create { .. }));
    let update = app
        .resolve(
            &mut request,
            Ok(SessionOutput::Created {
                session_id: "sess-1".into(),
            }),
        )
        .expect("resolve session create");
    feed(app, update.events, model);

    assert_eq!(model.phase, SessionPhase::Ready);
    assert_eq!(model.session_id.as_ref().unwrap().as_str(), "sess-1");
}

/// Take the pending session write, check its patch, acknowledge it and feed
/// the completion back through the app.
fn ack_write(
    app: &AppTester<App, Effect>,
    effects: &mut Vec<Effect>,
    model: &mut Model,
    check: impl FnOnce(&SessionPatch),
) {
    let mut request = take_session(effects);
    match &request.operation {
        SessionOperation::Update { patch, .. } => check(patch),
        other => panic!("expected an update operation, got {other:?}"),
    }
    let update = app
        .resolve(&mut request, Ok(SessionOutput::Updated))
        .expect("resolve session update");
    effects.extend(feed(app, update.events, model));
}

#[test]
fn full_planning_flow() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    boot(&app, &mut model);

    // Pick the start port on the map.
    app.update(Event::PortPickRequested(PortSlot::Start), &mut model);
    app.update(Event::MapClicked { lon: 72.8, lat: 18.9 }, &mut model);
    assert_eq!(model.viewport.center, coord(72.8, 18.9));
    let mut effects = app.update(Event::PickConfirmed, &mut model).effects;
    ack_write(&app, &mut effects, &mut model, |patch| {
        assert_eq!(patch.start_port, Some(coord(72.8, 18.9)));
        assert_eq!(patch.end_port, None);
    });

    // Pick the end port.
    app.update(Event::PortPickRequested(PortSlot::End), &mut model);
    app.update(Event::MapClicked { lon: 88.3, lat: 22.5 }, &mut model);
    let mut effects = app.update(Event::PickConfirmed, &mut model).effects;
    ack_write(&app, &mut effects, &mut model, |patch| {
        assert_eq!(patch.end_port, Some(coord(88.3, 22.5)));
    });

    // Fill in the rest of the form; each field writes through on its own.
    let mut effects = app
        .update(Event::ShipTypeSelected(ShipType::Cargo), &mut model)
        .effects;
    ack_write(&app, &mut effects, &mut model, |patch| {
        assert_eq!(patch.ship_type, Some(ShipType::Cargo));
    });
    let mut effects = app
        .update(Event::ShipDimensionsEntered(dims()), &mut model)
        .effects;
    ack_write(&app, &mut effects, &mut model, |patch| {
        assert_eq!(patch.ship_dimensions, Some(dims()));
    });
    let mut effects = app
        .update(
            Event::DepartureSet("2024-08-25T00:00:00Z".into()),
            &mut model,
        )
        .effects;
    ack_write(&app, &mut effects, &mut model, |patch| {
        assert_eq!(patch.departure.as_deref(), Some("2024-08-25T00:00:00Z"));
    });

    // Submit. The optimizer gets the assembled request.
    let mut effects = app.update(Event::RoutePlanRequested, &mut model).effects;
    assert!(model.optimizing);
    let index = effects
        .iter()
        .position(|e| matches!(e, Effect::Optimizer(_)))
        .expect("expected an optimizer effect");
    let Effect::Optimizer(mut request) = effects.remove(index) else {
        unreachable!()
    };
    let OptimizeOperation {
        request: route_request,
        timeout_ms,
    } = &request.operation;
    assert_eq!(*timeout_ms, 10_000);
    assert_eq!(route_request.ship_type, ShipType::Cargo);
    assert_eq!(route_request.start_port, coord(72.8, 18.9));
    assert_eq!(route_request.end_port, coord(88.3, 22.5));

    let plan = RouteResult {
        waypoints: vec![coord(72.8, 18.9), coord(80.0, 10.0), coord(88.3, 22.5)],
        distance: 2_000.0,
        num_steps: 2,
        avg_step_distance: 1_000.0,
    };
    let update = app
        .resolve(&mut request, Ok(plan.clone()))
        .expect("resolve optimize");
    let mut effects = feed(&app, update.events, &mut model);

    assert!(!model.optimizing);
    let route = model.route.as_ref().expect("route stored");
    assert_eq!(route.waypoints.first(), Some(&coord(72.8, 18.9)));
    assert_eq!(route.waypoints.last(), Some(&coord(88.3, 22.5)));

    // The result is written back to the session so a reload can restore it.
    ack_write(&app, &mut effects, &mut model, |patch| {
        assert_eq!(patch.route.as_ref(), Some(&plan));
    });
    assert!(model.sync.is_empty());
}

#[test]
fn submit_without_end_port_keeps_optimizer_untouched() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::PortPickRequested(PortSlot::Start), &mut model);
    app.update(Event::MapClicked { lon: 72.8, lat: 18.9 }, &mut model);
    app.update(Event::PickConfirmed, &mut model);
    app.update(Event::ShipTypeSelected(ShipType::Cargo), &mut model);
    app.update(Event::ShipDimensionsEntered(dims()), &mut model);
    app.update(Event::DepartureSet("2024-08-25T00:00:00Z".into()), &mut model);

    let update = app.update(Event::RoutePlanRequested, &mut model);
    assert!(
        !update
            .effects
            .iter()
            .any(|e| matches!(e, Effect::Optimizer(_))),
        "a partial request must not reach the optimizer"
    );
    assert!(!model.optimizing);

    let view = app.view(&model);
    assert_eq!(view.form_errors.len(), 1);
    assert_eq!(view.form_errors[0].field, "endPort");
    assert_eq!(view.form_errors[0].message, "End port is required");
}

#[test]
fn empty_search_fails_fast() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::SearchSubmitted("   ".into()), &mut model);
    assert!(
        !update
            .effects
            .iter()
            .any(|e| matches!(e, Effect::Geocoder(_))),
        "an empty query must not reach the geocoder"
    );
    assert!(!model.searching);
    assert_eq!(model.last_error.as_ref().unwrap().kind, ErrorKind::Validation);
}

#[test]
fn search_hit_feeds_the_active_pick() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::PortPickRequested(PortSlot::End), &mut model);
    let mut effects = app
        .update(Event::SearchSubmitted("kolkata".into()), &mut model)
        .effects;
    assert!(model.searching);

    let index = effects
        .iter()
        .position(|e| matches!(e, Effect::Geocoder(_)))
        .expect("expected a geocoder effect");
    let Effect::Geocoder(mut request) = effects.remove(index) else {
        unreachable!()
    };
    let GeocodeOperation::Search { query, limit, .. } = &request.operation;
    assert_eq!(query, "kolkata");
    assert_eq!(*limit, 5);

    let hit = GeocodeMatch {
        coordinate: coord(88.3, 22.5),
        label: "Kolkata, India".into(),
    };
    let update = app
        .resolve(&mut request, Ok(vec![hit]))
        .expect("resolve search");
    feed(&app, update.events, &mut model);

    assert!(!model.searching);
    // The hit previews into the active slot and zooms the map.
    assert_eq!(model.selection.end_port(), Some(coord(88.3, 22.5)));
    assert_eq!(model.viewport.center, coord(88.3, 22.5));

    app.update(Event::PickConfirmed, &mut model);
    assert_eq!(model.selection.end_port(), Some(coord(88.3, 22.5)));
}

#[test]
fn search_miss_reports_not_found() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::PortPickRequested(PortSlot::Start), &mut model);
    let mut effects = app
        .update(Event::SearchSubmitted("atlantis".into()), &mut model)
        .effects;
    let index = effects
        .iter()
        .position(|e| matches!(e, Effect::Geocoder(_)))
        .expect("expected a geocoder effect");
    let Effect::Geocoder(mut request) = effects.remove(index) else {
        unreachable!()
    };
    let update = app
        .resolve(&mut request, Ok(Vec::new()))
        .expect("resolve search");
    feed(&app, update.events, &mut model);

    assert_eq!(model.last_error.as_ref().unwrap().kind, ErrorKind::NotFound);
    assert_eq!(model.selection.start_port(), None);
}

#[test]
fn cancel_rolls_back_and_resets_viewport() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::PortPickRequested(PortSlot::Start), &mut model);
    app.update(Event::MapClicked { lon: 72.8, lat: 18.9 }, &mut model);
    app.update(Event::PickConfirmed, &mut model);

    app.update(Event::PortPickRequested(PortSlot::Start), &mut model);
    app.update(Event::MapClicked { lon: 0.0, lat: 0.0 }, &mut model);
    app.update(Event::PickCancelled, &mut model);

    assert_eq!(model.selection.start_port(), Some(coord(72.8, 18.9)));
    assert_eq!(model.viewport.center, coord(78.9629, 20.5937));
}

#[test]
fn map_click_while_idle_is_ignored() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::MapClicked { lon: 72.8, lat: 18.9 }, &mut model);
    assert!(update.effects.is_empty());
    assert_eq!(model.selection.start_port(), None);
    assert_eq!(model.selection.end_port(), None);
}
