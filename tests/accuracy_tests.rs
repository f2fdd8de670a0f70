use tempo_check::accuracy::{self, TestCase, TestSet};
use tempo_check::analyzer::DetectionEvent;

#[test]
fn suite_manifest_fills_in_harness_defaults() {
    let json = r#"{
        "name": "smoke",
        "cases": [
            { "path": "testdata/track.mp3", "label": "track", "expected_bpm": 120.0 }
        ]
    }"#;

    let set: TestSet = serde_json::from_str(json).expect("minimal manifest must parse");
    assert_eq!(set.name, "smoke");
    assert!(set.results.is_empty());

    let case = &set.cases[0];
    assert_eq!(case.start_time, 0.0);
    assert_eq!(case.end_time, 0.0, "missing end time means no upper bound");
    assert_eq!(case.min_tempo, 40.0);
    assert_eq!(case.max_tempo, 240.0);
    assert_eq!(case.tolerance_bpm, 2.0);
    assert_eq!((case.correct, case.total), (0, 0));
}

#[test]
fn suite_manifest_keeps_explicit_values() {
    let json = r#"{
        "name": "studio",
        "cases": [
            {
                "path": "testdata/track.mp3",
                "label": "track",
                "expected_bpm": 136.0,
                "start_time": 0.0,
                "end_time": 15.0,
                "min_tempo": 80.0,
                "max_tempo": 160.0,
                "tolerance_bpm": 2.5
            }
        ]
    }"#;

    let set: TestSet = serde_json::from_str(json).unwrap();
    let case = &set.cases[0];
    assert_eq!(case.end_time, 15.0);
    assert_eq!(case.min_tempo, 80.0);
    assert_eq!(case.max_tempo, 160.0);
    assert_eq!(case.tolerance_bpm, 2.5);
}

fn case_with_tolerance(expected_bpm: f32, tolerance_bpm: f32) -> TestCase {
    TestCase {
        path: "testdata/track.wav".to_string(),
        label: "track".to_string(),
        expected_bpm,
        start_time: 0.0,
        end_time: 0.0,
        min_tempo: 40.0,
        max_tempo: 240.0,
        tolerance_bpm,
        correct: 0,
        total: 0,
    }
}

#[test]
fn tolerance_boundary_counts_as_correct() {
    let mut case = case_with_tolerance(137.0, 2.5);
    let on_edge = DetectionEvent {
        timestamp: 1.0,
        bpm: 139.5,
    };
    assert!(accuracy::record_detection(&mut case, &on_edge));

    let past_edge = DetectionEvent {
        timestamp: 1.1,
        bpm: 139.6,
    };
    assert!(!accuracy::record_detection(&mut case, &past_edge));
}

#[test]
fn set_mean_is_the_unweighted_average_in_completion_order() {
    assert_eq!(accuracy::set_mean(&[100.0, 50.0, 0.0]), Some(50.0));
    assert_eq!(accuracy::set_mean(&[80.0]), Some(80.0));
    assert_eq!(accuracy::set_mean(&[]), None, "an empty set has no mean");
}

#[test]
fn repeated_runs_with_reset_counters_are_identical() {
    let events = [119.0f32, 120.0, 121.5, 90.0, 122.0];
    let mut first = None;
    for _ in 0..2 {
        let mut case = case_with_tolerance(120.0, 2.0);
        for (i, bpm) in events.iter().enumerate() {
            accuracy::record_detection(
                &mut case,
                &DetectionEvent {
                    timestamp: i as f64,
                    bpm: *bpm,
                },
            );
        }
        let pct = accuracy::finish_test(&case).unwrap();
        match first {
            None => first = Some(pct),
            Some(prev) => assert_eq!(prev, pct, "identical inputs must score identically"),
        }
    }
}
