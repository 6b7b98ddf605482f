//! Integration tests for talus-telemetry.

use talus_telemetry::{ConsoleSink, EventBus, EventKind, SimulationEvent, TracingSink, VecSink};

#[test]
fn emit_and_flush_reaches_sink() {
    let mut bus = EventBus::new();
    let sink = VecSink::new();
    let buffer = sink.buffer();
    bus.add_sink(Box::new(sink));

    bus.emit(SimulationEvent::new(0, EventKind::TimestepBegin { sim_time: 0.0 }));
    bus.emit(SimulationEvent::new(0, EventKind::TimestepEnd { wall_time: 0.001 }));
    assert!(buffer.lock().unwrap().is_empty());

    bus.flush();
    let events = buffer.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0].kind, EventKind::TimestepBegin { .. }));
}

#[test]
fn disabled_bus_drops_events() {
    let sink = VecSink::new();
    let mut bus = EventBus::new().with_sink(Box::new(sink.clone()));
    bus.set_enabled(false);
    bus.emit(SimulationEvent::new(0, EventKind::Deletion { removed: 3 }));
    bus.flush();
    assert!(sink.events().is_empty());
}

#[test]
fn every_sink_sees_every_event() {
    let a = VecSink::new();
    let b = VecSink::new();
    let mut bus = EventBus::new()
        .with_sink(Box::new(a.clone()))
        .with_sink(Box::new(b.clone()))
        .with_sink(Box::new(TracingSink::new(tracing::Level::DEBUG)))
        .with_sink(Box::new(ConsoleSink::new()));
    assert_eq!(bus.sink_count(), 4);
    bus.emit(SimulationEvent::new(
        7,
        EventKind::Insertion {
            inserted: 2,
            failed_attempts: 5,
        },
    ));
    bus.finalize();
    assert_eq!(a.events(), b.events());
    assert_eq!(a.events()[0].timestep, 7);
}

#[test]
fn event_serialization() {
    let event = SimulationEvent::new(
        5,
        EventKind::Energy {
            kinetic: 1.0,
            rotational: 0.25,
            potential: 2.0,
            elastic: 0.5,
        },
    );
    let json = serde_json::to_string(&event).unwrap();
    let recovered: SimulationEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered, event);
}

#[test]
fn contact_event_names_its_fields() {
    let event = SimulationEvent::new(
        10,
        EventKind::ContactDetection {
            contact_count: 15,
            wall_contact_count: 4,
            candidate_pairs: 40,
            max_overlap: 1e-6,
        },
    );
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("wall_contact_count"));
}
