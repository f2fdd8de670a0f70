use serde::{Deserialize, Serialize};

use crate::analyzer::DetectionEvent;
use crate::error::{HarnessError, Result};

fn default_min_tempo() -> f32 {
    40.0
}

fn default_max_tempo() -> f32 {
    240.0
}

fn default_tolerance() -> f32 {
    2.0
}

/// One audio fixture with its ground truth. The detection counters live on
/// the case itself: reset when the case starts, bumped by every scored
/// event, read once when the case finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub path: String,
    pub label: String,
    pub expected_bpm: f32,
    #[serde(default)]
    pub start_time: f64,
    /// `0.0` means no upper bound.
    #[serde(default)]
    pub end_time: f64,
    #[serde(default = "default_min_tempo")]
    pub min_tempo: f32,
    #[serde(default = "default_max_tempo")]
    pub max_tempo: f32,
    /// Maximum BPM deviation from ground truth that still counts as correct.
    #[serde(default = "default_tolerance")]
    pub tolerance_bpm: f32,

    #[serde(skip)]
    pub correct: u32,
    #[serde(skip)]
    pub total: u32,
}

/// A named, ordered collection of test cases plus the accuracy percentages
/// of the cases that completed, in completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSet {
    pub name: String,
    pub cases: Vec<TestCase>,
    #[serde(skip)]
    pub results: Vec<f32>,
}

/// Zero the case's counters. Called once when the case starts so nothing
/// leaks across runs.
pub fn reset_counters(case: &mut TestCase) {
    case.correct = 0;
    case.total = 0;
}

/// Score one detection event against the case's ground truth. The total
/// count always advances; the correct count advances when the reported BPM
/// lands within the case's tolerance. Returns whether it did.
pub fn record_detection(case: &mut TestCase, event: &DetectionEvent) -> bool {
    let correct = (event.bpm - case.expected_bpm).abs() <= case.tolerance_bpm;
    case.total += 1;
    if correct {
        case.correct += 1;
    }
    correct
}

/// The case's accuracy percentage. A case with zero detections has no
/// defined accuracy and yields [`HarnessError::NoDetections`] instead of a
/// poisoned value.
pub fn finish_test(case: &TestCase) -> Result<f32> {
    if case.total == 0 {
        return Err(HarnessError::NoDetections {
            label: case.label.clone(),
        });
    }
    Ok(100.0 * case.correct as f32 / case.total as f32)
}

/// Unweighted mean of the per-case percentages, or `None` when no case in
/// the set completed.
pub fn set_mean(results: &[f32]) -> Option<f32> {
    if results.is_empty() {
        return None;
    }
    Some(results.iter().sum::<f32>() / results.len() as f32)
}
