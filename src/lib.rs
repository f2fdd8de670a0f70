//! Streams decoded audio through a tempo analyzer and validates detection
//! accuracy against known ground truth across curated song sets.
//!
//! The windowing engine turns arbitrarily-sized decoded batches into
//! fixed-size, overlapping analysis chunks with absolute timestamps; the
//! validation runner drives one analyzer per test case over that stream and
//! rolls per-chunk detection outcomes into per-test and per-set accuracy.

pub mod accuracy;
pub mod analyzer;
pub mod diagnostics;
pub mod error;
pub mod report;
pub mod scheduler;
pub mod source;
pub mod streaming;
pub mod validation;
pub mod windowing;

pub use error::HarnessError;
