use proptest::prelude::*;
use spanmeasure_core::{SessionState, WorldPoint};
use spanmeasure_session::{MeasurementSession, SessionOptions};
use spanmeasure_tracking::RaycastHit;

#[derive(Debug, Clone)]
enum Op {
    Add(f64, f64, f64),
    Miss,
    Undo,
    Reset,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (-5.0..5.0f64, -5.0..5.0f64, -5.0..5.0f64).prop_map(|(x, y, z)| Op::Add(x, y, z)),
        1 => Just(Op::Miss),
        2 => Just(Op::Undo),
        1 => Just(Op::Reset),
    ]
}

fn path_length(points: &[WorldPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| {
            let (dx, dy, dz) = (w[1].x - w[0].x, w[1].y - w[0].y, w[1].z - w[0].z);
            (dx * dx + dy * dy + dz * dz).sqrt()
        })
        .sum()
}

proptest! {
    #[test]
    fn segments_follow_points(ops in prop::collection::vec(op(), 0..60)) {
        let mut session = MeasurementSession::new(SessionOptions::default());
        let mut expected: Vec<WorldPoint> = Vec::new();

        for op in ops {
            match op {
                Op::Add(x, y, z) => {
                    let p = WorldPoint::new(x, y, z);
                    session.add_point(Some(&RaycastHit::new(p, 1.0, 1.0))).unwrap();
                    expected.push(p);
                }
                Op::Miss => {
                    session.add_point(None).unwrap();
                }
                Op::Undo => {
                    let undone = session.undo();
                    prop_assert_eq!(undone.ok(), expected.pop());
                }
                Op::Reset => {
                    prop_assert_eq!(session.reset_tracking().unwrap(), expected.len());
                    expected.clear();
                }
            }

            prop_assert_eq!(session.points(), expected.as_slice());
            prop_assert_eq!(session.segment_count(), expected.len().saturating_sub(1));
            prop_assert!((session.total_distance() - path_length(&expected)).abs() < 1e-9);

            let state = if expected.is_empty() { SessionState::Idle } else { SessionState::Placing };
            prop_assert_eq!(session.state(), state);
        }
    }

    #[test]
    fn finished_total_matches_segments(points in prop::collection::vec((-3.0..3.0f64, -3.0..3.0f64, -3.0..3.0f64), 2..20)) {
        let mut session = MeasurementSession::new(SessionOptions::default());
        for (x, y, z) in &points {
            session.add_point(Some(&RaycastHit::new(WorldPoint::new(*x, *y, *z), 1.0, 1.0))).unwrap();
        }

        let result = session.finish().unwrap();
        prop_assert_eq!(result.segment_meters.len(), points.len() - 1);
        let sum: f64 = result.segment_meters.iter().sum();
        prop_assert!((result.total_meters - sum).abs() < 1e-9);
        prop_assert!(result.segment_meters.iter().all(|d| *d >= 0.0));
    }
}
