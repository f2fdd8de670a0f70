use std::collections::VecDeque;

/// `end` values at or below this are the "no upper bound" sentinel. Real end
/// times sit well above it; the margin tolerates floating-point noise.
pub const END_TIME_EPSILON: f64 = 0.01;

/// A fixed-length run of mono samples with the absolute time of its first
/// sample. Timestamps come from the consumed-sample counter, so they are
/// unaffected by how batches happened to arrive from the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub timestamp: f64,
    pub samples: Vec<f32>,
}

/// Sliding-window buffer over a decoded sample stream.
///
/// Batches of any size go in; fixed-size chunks come out, each one
/// `hop_size` samples after the previous. `hop_size < chunk_size` makes
/// consecutive chunks overlap, which is what keeps detection responsive
/// without calling the analyzer once per sample.
#[derive(Debug)]
pub struct SampleQueue {
    pending: VecDeque<f32>,
    /// Total samples consumed off the head so far. Advances only in whole
    /// hop strides.
    consumed: u64,
    chunk_size: usize,
    hop_size: usize,
    sample_rate: f64,
}

impl SampleQueue {
    pub fn new(chunk_size: usize, hop_size: usize, sample_rate: f64) -> Self {
        assert!(chunk_size > 0 && hop_size > 0, "window sizes must be non-zero");
        assert!(
            hop_size <= chunk_size,
            "hop size {hop_size} must not exceed chunk size {chunk_size}"
        );
        assert!(
            sample_rate.is_finite() && sample_rate > 0.0,
            "sample rate must be positive"
        );
        Self {
            pending: VecDeque::new(),
            consumed: 0,
            chunk_size,
            hop_size,
            sample_rate,
        }
    }

    /// Append a decoded batch at the tail, in arrival order.
    pub fn push_batch(&mut self, batch: &[f32]) {
        self.pending.extend(batch.iter().copied());
    }

    /// True iff a full chunk is queued.
    pub fn has_chunk(&self) -> bool {
        self.pending.len() >= self.chunk_size
    }

    /// Absolute timestamp, in seconds, of the chunk currently at the head.
    pub fn timestamp(&self) -> f64 {
        self.consumed as f64 / self.sample_rate
    }

    /// Copy out the chunk at the head and advance by one hop.
    ///
    /// Precondition: `has_chunk()`. Calling this on a queue without a full
    /// chunk is a contract violation and panics.
    pub fn next_chunk(&mut self) -> Chunk {
        assert!(
            self.has_chunk(),
            "chunk requested with fewer than {} samples queued",
            self.chunk_size
        );
        let timestamp = self.timestamp();
        let samples: Vec<f32> = self.pending.iter().take(self.chunk_size).copied().collect();
        self.advance();
        Chunk { timestamp, samples }
    }

    /// Consume the chunk at the head without copying it out. Used for chunks
    /// outside the analysis window: the head still moves by exactly one hop,
    /// so later in-window chunks keep correct timestamps.
    pub fn advance(&mut self) {
        assert!(
            self.has_chunk(),
            "advance requested with fewer than {} samples queued",
            self.chunk_size
        );
        self.pending.drain(..self.hop_size);
        self.consumed += self.hop_size as u64;
    }

    /// Samples currently queued (may be a partial chunk at end of stream).
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Total samples consumed off the head since construction.
    pub fn consumed_samples(&self) -> u64 {
        self.consumed
    }
}

/// The time-of-interest interval of one test case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    /// `0.0` (or anything at/below [`END_TIME_EPSILON`]) means no upper bound.
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// A window that forwards every chunk.
    pub fn unbounded() -> Self {
        Self { start: 0.0, end: 0.0 }
    }

    /// Whether a chunk at `timestamp` should reach the analyzer. Chunks
    /// rejected here must still be consumed from the queue.
    pub fn should_analyze(&self, timestamp: f64) -> bool {
        if self.end > END_TIME_EPSILON {
            !(timestamp < self.start || timestamp > self.end)
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_chunk_until_chunk_size_samples_arrive() {
        let mut queue = SampleQueue::new(8, 3, 8.0);
        queue.push_batch(&[0.0; 7]);
        assert!(!queue.has_chunk());
        queue.push_batch(&[0.0]);
        assert!(queue.has_chunk());
    }

    #[test]
    fn next_chunk_returns_head_and_advances_by_hop() {
        let mut queue = SampleQueue::new(4, 2, 4.0);
        queue.push_batch(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let first = queue.next_chunk();
        assert_eq!(first.samples, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(first.timestamp, 0.0);
        assert_eq!(queue.consumed_samples(), 2);

        let second = queue.next_chunk();
        assert_eq!(second.samples, vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(second.timestamp, 0.5);
        assert!(!queue.has_chunk());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn advance_consumes_without_copying() {
        let mut queue = SampleQueue::new(4, 2, 4.0);
        queue.push_batch(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        queue.advance();
        assert_eq!(queue.consumed_samples(), 2);
        assert_eq!(queue.next_chunk().samples, vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    #[should_panic(expected = "chunk requested")]
    fn next_chunk_without_full_chunk_panics() {
        let mut queue = SampleQueue::new(8, 3, 8.0);
        queue.push_batch(&[0.0; 5]);
        queue.next_chunk();
    }

    #[test]
    #[should_panic(expected = "hop size")]
    fn hop_larger_than_chunk_is_rejected() {
        SampleQueue::new(4, 5, 44100.0);
    }

    #[test]
    fn bounded_window_rejects_outside_timestamps() {
        let window = TimeWindow::new(5.0, 15.0);
        assert!(!window.should_analyze(4.999));
        assert!(window.should_analyze(5.0));
        assert!(window.should_analyze(10.0));
        assert!(window.should_analyze(15.0));
        assert!(!window.should_analyze(15.001));
    }

    #[test]
    fn zero_end_is_the_unbounded_sentinel() {
        let window = TimeWindow::new(3.0, 0.0);
        assert!(window.should_analyze(0.0));
        assert!(window.should_analyze(1.0));
        assert!(window.should_analyze(1e6));
    }
}
