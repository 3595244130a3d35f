use parking_lot::Mutex;
use spanmeasure_core::{
    Error, EventBus, EventCategory, EventFilter, LengthUnit, MeasureError, MeasureEvent,
    PointEvent, SessionError, SessionEvent, SessionState, TrackingEvent, WorldPoint,
};
use spanmeasure_session::{
    AddPoint, LoopOptions, MeasurementHandle, MeasurementLoop, MeasurementOutcome,
    PresentationFrame, SessionOptions,
};
use spanmeasure_tracking::{SimulatedTracking, UnsupportedTracking};
use std::sync::Arc;
use std::time::Duration;

type Frames = Arc<Mutex<Vec<PresentationFrame>>>;

fn fast() -> LoopOptions {
    LoopOptions::from_tick_rate(200.0)
}

fn start(sim: &SimulatedTracking, unit: LengthUnit) -> (MeasurementHandle, Frames) {
    let frames: Frames = Arc::new(Mutex::new(Vec::new()));
    let sink_frames = frames.clone();

    let handle = MeasurementLoop::new(Arc::new(sim.clone()))
        .session_options(SessionOptions {
            unit,
            ..Default::default()
        })
        .loop_options(fast())
        .sink(move |frame: &PresentationFrame| sink_frames.lock().push(frame.clone()))
        .spawn()
        .unwrap();

    (handle, frames)
}

async fn place(sim: &SimulatedTracking, handle: &MeasurementHandle, x: f64, y: f64, z: f64) {
    sim.aim_at(WorldPoint::new(x, y, z));
    let added = handle.add_point().await.unwrap();
    assert!(added.is_committed(), "expected a point at ({}, {}, {})", x, y, z);
}

#[tokio::test]
async fn test_measure_and_finish() {
    let sim = SimulatedTracking::new();
    let (mut handle, _frames) = start(&sim, LengthUnit::Millimeters);

    place(&sim, &handle, 0.0, 0.0, 0.0).await;
    place(&sim, &handle, 0.0, 0.0, 1.0).await;

    let report = handle.finish().await.unwrap();
    assert_eq!(report.total_distance, "1000.0 mm");
    assert_eq!(report.segments, vec!["1000.0 mm"]);

    let outcome = handle.outcome().await;
    assert_eq!(outcome.report(), Some(&report));
    assert_eq!(handle.shutdown().await, MeasurementOutcome::Measured(report));
}

#[tokio::test]
async fn test_nothing_under_crosshair() {
    let sim = SimulatedTracking::new();
    let (handle, _frames) = start(&sim, LengthUnit::Millimeters);

    assert_eq!(handle.add_point().await.unwrap(), AddPoint::NotReady);

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, SessionState::Idle);
    assert_eq!(snapshot.point_count(), 0);
    handle.shutdown().await;
}

#[tokio::test]
async fn test_slow_raycast_is_not_ready() {
    let sim = SimulatedTracking::new();
    let (handle, _frames) = start(&sim, LengthUnit::Millimeters);

    sim.aim_at(WorldPoint::origin());
    sim.set_latency(Duration::from_millis(250));
    assert_eq!(handle.add_point().await.unwrap(), AddPoint::NotReady);

    sim.set_latency(Duration::ZERO);
    assert!(handle.add_point().await.unwrap().is_committed());
    handle.shutdown().await;
}

#[tokio::test]
async fn test_finish_needs_two_points() {
    let sim = SimulatedTracking::new();
    let (handle, _frames) = start(&sim, LengthUnit::Millimeters);

    place(&sim, &handle, 0.0, 0.0, 0.0).await;
    let err = handle.finish().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Session(SessionError::NotEnoughPoints { actual: 1, .. })
    ));
    assert!(err.is_rejection());

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, SessionState::Placing);
    handle.shutdown().await;
}

#[tokio::test]
async fn test_tracking_collapse_clears_points() {
    let sim = SimulatedTracking::new();
    let events = Arc::new(EventBus::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    events.subscribe(
        EventFilter::Categories(vec![EventCategory::Tracking]),
        move |event| sink.lock().push(event.clone()),
    );

    let handle = MeasurementLoop::new(Arc::new(sim.clone()))
        .loop_options(fast())
        .event_bus(events.clone())
        .spawn()
        .unwrap();

    for x in 0..3 {
        place(&sim, &handle, x as f64, 0.0, 0.0).await;
    }

    sim.collapse();
    assert_eq!(handle.add_point().await.unwrap(), AddPoint::NotReady);

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, SessionState::Idle);
    assert_eq!(snapshot.point_count(), 0);
    assert!(seen.lock().iter().any(|e| matches!(
        e,
        MeasureEvent::Tracking(TrackingEvent::Reset {
            cleared_points: 3,
            ..
        })
    )));

    // still in relocalizing: no second reset, and no hits
    tokio::time::sleep(Duration::from_millis(30)).await;
    let resets = seen
        .lock()
        .iter()
        .filter(|e| matches!(e, MeasureEvent::Tracking(TrackingEvent::Reset { .. })))
        .count();
    assert_eq!(resets, 1);

    sim.recover();
    place(&sim, &handle, 4.0, 0.0, 0.0).await;
    assert_eq!(handle.snapshot().await.unwrap().point_count(), 1);
    handle.shutdown().await;
}

#[tokio::test]
async fn test_collapse_between_ticks_clears_points() {
    let sim = SimulatedTracking::new();
    let events = Arc::new(EventBus::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    events.subscribe(
        EventFilter::Categories(vec![EventCategory::Tracking]),
        move |event| sink.lock().push(event.clone()),
    );

    // slow enough that the whole episode fits between two ticks
    let handle = MeasurementLoop::new(Arc::new(sim.clone()))
        .loop_options(LoopOptions::from_tick_rate(5.0))
        .event_bus(events.clone())
        .spawn()
        .unwrap();

    place(&sim, &handle, 0.0, 0.0, 0.0).await;
    place(&sim, &handle, 1.0, 0.0, 0.0).await;

    sim.collapse();
    tokio::time::sleep(Duration::from_millis(20)).await;
    sim.recover();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, SessionState::Idle);
    assert_eq!(snapshot.point_count(), 0);

    let resets: Vec<usize> = seen
        .lock()
        .iter()
        .filter_map(|e| match e {
            MeasureEvent::Tracking(TrackingEvent::Reset { cleared_points, .. }) => {
                Some(*cleared_points)
            }
            _ => None,
        })
        .collect();
    assert_eq!(resets, vec![2]);
    handle.shutdown().await;
}

async fn wait_for_frame(frames: &Frames, done: impl Fn(&PresentationFrame) -> bool) -> bool {
    for _ in 0..50 {
        if frames.lock().last().is_some_and(&done) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

#[tokio::test]
async fn test_preview_hidden_without_usable_hit() {
    let sim = SimulatedTracking::new();
    let (handle, frames) = start(&sim, LengthUnit::Millimeters);
    place(&sim, &handle, 0.0, 0.0, 0.0).await;

    let target = WorldPoint::new(1.0, 0.0, 0.0);
    sim.aim_at(target);
    assert!(wait_for_frame(&frames, |f| f.preview.as_ref().is_some_and(|p| p.end == target)).await);

    sim.clear_aim();
    assert!(wait_for_frame(&frames, |f| f.preview.is_none()).await);

    sim.aim_at(target);
    assert!(wait_for_frame(&frames, |f| f.preview.is_some()).await);

    // below the default minimum hit quality
    sim.set_quality(0.1);
    assert!(wait_for_frame(&frames, |f| f.preview.is_none()).await);

    let last = frames.lock().last().cloned().unwrap();
    assert_eq!(last.points, vec![WorldPoint::origin()]);
    assert_eq!(last.state, SessionState::Placing);
    handle.shutdown().await;
}

#[tokio::test]
async fn test_overrunning_raycast_skips_tick() {
    let sim = SimulatedTracking::new();
    let (handle, frames) = start(&sim, LengthUnit::Millimeters);
    place(&sim, &handle, 0.0, 0.0, 0.0).await;

    let first = WorldPoint::new(1.0, 0.0, 0.0);
    sim.aim_at(first);
    assert!(wait_for_frame(&frames, |f| f.preview.as_ref().is_some_and(|p| p.end == first)).await);

    let frame_count = frames.lock().len();
    let raycasts = sim.raycast_count();
    sim.set_latency(Duration::from_millis(50));
    sim.aim_at(WorldPoint::new(2.0, 0.0, 0.0));
    tokio::time::sleep(Duration::from_millis(60)).await;

    // ticks kept trying but none of them produced a frame
    assert!(sim.raycast_count() > raycasts);
    assert_eq!(frames.lock().len(), frame_count);
    let last = frames.lock().last().cloned().unwrap();
    assert_eq!(last.preview.map(|p| p.end), Some(first));
    assert_eq!(handle.snapshot().await.unwrap().point_count(), 1);

    let second = WorldPoint::new(2.0, 0.0, 0.0);
    sim.set_latency(Duration::ZERO);
    assert!(wait_for_frame(&frames, |f| f.preview.as_ref().is_some_and(|p| p.end == second)).await);
    handle.shutdown().await;
}

#[tokio::test]
async fn test_explicit_reset() {
    let sim = SimulatedTracking::new();
    let (handle, frames) = start(&sim, LengthUnit::Millimeters);

    place(&sim, &handle, 0.0, 0.0, 0.0).await;
    place(&sim, &handle, 1.0, 0.0, 0.0).await;

    assert_eq!(handle.reset_tracking().await.unwrap(), 2);
    let last = frames.lock().last().cloned().unwrap();
    assert_eq!(last.state, SessionState::Idle);
    assert!(last.points.is_empty());
    assert!(last.segments.is_empty());
    assert!(last.preview.is_none());
    handle.shutdown().await;
}

#[tokio::test]
async fn test_unsupported_provider() {
    let result = MeasurementLoop::new(Arc::new(UnsupportedTracking)).spawn();
    assert!(matches!(result, Err(MeasureError::CapabilityAbsent)));
}

#[tokio::test]
async fn test_invalid_quality_rejected() {
    let result = MeasurementLoop::new(Arc::new(SimulatedTracking::new()))
        .session_options(SessionOptions {
            min_hit_quality: 1.5,
            ..Default::default()
        })
        .spawn();
    assert!(matches!(result, Err(MeasureError::InvalidConfig { .. })));
}

#[tokio::test]
async fn test_cancel_then_reject() {
    let sim = SimulatedTracking::new();
    let (mut handle, _frames) = start(&sim, LengthUnit::Millimeters);

    place(&sim, &handle, 0.0, 0.0, 0.0).await;
    handle.cancel().await.unwrap();
    assert_eq!(handle.outcome().await, MeasurementOutcome::Cancelled);

    let err = handle.add_point().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Session(SessionError::InvalidState {
            state: SessionState::Cancelled,
            ..
        })
    ));
    assert!(handle.finish().await.is_err());
    assert_eq!(handle.shutdown().await, MeasurementOutcome::Cancelled);
}

#[tokio::test]
async fn test_shutdown_before_finishing_is_cancelled() {
    let sim = SimulatedTracking::new();
    let (handle, _frames) = start(&sim, LengthUnit::Millimeters);

    place(&sim, &handle, 0.0, 0.0, 0.0).await;
    place(&sim, &handle, 1.0, 0.0, 0.0).await;
    assert_eq!(handle.shutdown().await, MeasurementOutcome::Cancelled);
}

#[tokio::test]
async fn test_dropping_handle_stops_loop() {
    let sim = SimulatedTracking::new();
    let events = Arc::new(EventBus::new());
    let stopped = Arc::new(Mutex::new(false));
    let flag = stopped.clone();
    events.subscribe(EventFilter::All, move |event| {
        if matches!(event, MeasureEvent::Session(SessionEvent::Stopped { .. })) {
            *flag.lock() = true;
        }
    });

    let handle = MeasurementLoop::new(Arc::new(sim.clone()))
        .loop_options(fast())
        .event_bus(events)
        .spawn()
        .unwrap();
    drop(handle);

    for _ in 0..50 {
        if *stopped.lock() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(*stopped.lock());

    // no more ticks once stopped
    let count = sim.raycast_count();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(sim.raycast_count(), count);
}

#[tokio::test]
async fn test_finished_loop_stops_raycasting() {
    let sim = SimulatedTracking::new();
    let (handle, _frames) = start(&sim, LengthUnit::Millimeters);

    place(&sim, &handle, 0.0, 0.0, 0.0).await;
    place(&sim, &handle, 1.0, 0.0, 0.0).await;
    handle.finish().await.unwrap();

    let count = sim.raycast_count();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(sim.raycast_count(), count);
    handle.shutdown().await;
}

#[tokio::test]
async fn test_frames_carry_labels_and_preview() {
    let sim = SimulatedTracking::new();
    let (handle, frames) = start(&sim, LengthUnit::Inches);

    place(&sim, &handle, 0.0, 0.0, 0.0).await;
    place(&sim, &handle, 1.0, 0.0, 0.0).await;

    {
        let frames = frames.lock();
        let last = frames.last().unwrap();
        assert_eq!(last.segments.len(), 1);
        assert_eq!(last.segments[0].label, "39.37 in");
        assert_eq!(last.segments[0].midpoint, WorldPoint::new(0.5, 0.0, 0.0));
    }

    // aim somewhere new and let the loop tick
    let target = WorldPoint::new(1.0, 1.0, 0.0);
    sim.aim_at(target);
    let mut preview = None;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(5)).await;
        preview = frames.lock().last().and_then(|f| f.preview.clone());
        if preview.as_ref().is_some_and(|p| p.end == target) {
            break;
        }
    }
    let preview = preview.expect("preview frame");
    assert_eq!(preview.start, WorldPoint::new(1.0, 0.0, 0.0));
    assert_eq!(preview.end, target);
    assert_eq!(preview.label, "39.37 in");

    // a steady aim produces no further frames
    let count = frames.lock().len();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(frames.lock().len(), count);

    // the preview never commits anything
    assert_eq!(handle.snapshot().await.unwrap().point_count(), 2);
    handle.shutdown().await;
}

#[tokio::test]
async fn test_point_events_in_order() {
    let sim = SimulatedTracking::new();
    let events = Arc::new(EventBus::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    events.subscribe(
        EventFilter::Categories(vec![EventCategory::Point]),
        move |event| sink.lock().push(event.clone()),
    );

    let handle = MeasurementLoop::new(Arc::new(sim.clone()))
        .loop_options(fast())
        .event_bus(events)
        .spawn()
        .unwrap();

    place(&sim, &handle, 0.0, 0.0, 0.0).await;
    place(&sim, &handle, 2.0, 0.0, 0.0).await;
    assert_eq!(handle.undo().await.unwrap(), WorldPoint::new(2.0, 0.0, 0.0));

    let seen = seen.lock().clone();
    assert_eq!(seen.len(), 3);
    assert!(matches!(
        seen[0],
        MeasureEvent::Point(PointEvent::Added { index: 0, .. })
    ));
    assert!(matches!(
        seen[1],
        MeasureEvent::Point(PointEvent::Added { index: 1, .. })
    ));
    assert!(matches!(
        seen[2],
        MeasureEvent::Point(PointEvent::Undone { index: 1, .. })
    ));
    handle.shutdown().await;
}
