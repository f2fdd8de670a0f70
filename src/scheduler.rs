use crate::analyzer::{DetectionEvent, TempoAnalyzer};
use crate::diagnostics::PlotWriter;
use crate::error::Result;
use crate::source::AudioSource;
use crate::windowing::{SampleQueue, TimeWindow};

/// Samples per analysis window.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Samples the window advances between chunks. Far smaller than the chunk
/// size, so consecutive windows overlap heavily and the analyzer sees every
/// onset near its true time.
pub const DEFAULT_HOP_SIZE: usize = 132;

/// Counters from one scheduling run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Batches pulled from the source.
    pub batches: u64,
    /// Full chunks extracted, including gated-out ones.
    pub chunks: u64,
    /// Chunks that passed the time window and reached the analyzer.
    pub forwarded: u64,
}

/// Drives one test: pulls batches from the source, drains full chunks from
/// the queue, gates each by the time window, and feeds survivors to the
/// analyzer in stream order.
#[derive(Debug, Clone, Copy)]
pub struct ChunkScheduler {
    chunk_size: usize,
    hop_size: usize,
}

impl ChunkScheduler {
    pub fn new(chunk_size: usize, hop_size: usize) -> Self {
        assert!(
            hop_size <= chunk_size,
            "hop size {hop_size} must not exceed chunk size {chunk_size}"
        );
        Self { chunk_size, hop_size }
    }

    /// Run until the source is exhausted and the queue cannot produce a full
    /// chunk. Gated-out chunks are consumed without analysis so the pointer
    /// keeps advancing in hop strides. Every detection event is handed to
    /// `on_event` before the next chunk is scheduled.
    ///
    /// A source read failure aborts the run; whatever was scheduled before
    /// the failure has already reached `on_event`.
    pub fn run<S, A, F>(
        &self,
        source: &mut S,
        analyzer: &mut A,
        window: TimeWindow,
        mut sink: Option<&mut PlotWriter>,
        mut on_event: F,
    ) -> Result<StreamStats>
    where
        S: AudioSource + ?Sized,
        A: TempoAnalyzer + ?Sized,
        F: FnMut(&DetectionEvent),
    {
        let mut queue = SampleQueue::new(
            self.chunk_size,
            self.hop_size,
            f64::from(source.sample_rate()),
        );
        let mut stats = StreamStats::default();

        while let Some(batch) = source.next_batch()? {
            queue.push_batch(&batch);
            stats.batches += 1;

            while queue.has_chunk() {
                stats.chunks += 1;
                if !window.should_analyze(queue.timestamp()) {
                    queue.advance();
                    continue;
                }

                let chunk = queue.next_chunk();
                if let Some(s) = sink.as_deref_mut() {
                    s.log_chunk(chunk.timestamp, &chunk.samples);
                }

                let events = analyzer.feed(chunk.timestamp, &chunk.samples)?;
                stats.forwarded += 1;
                for event in &events {
                    if let Some(s) = sink.as_deref_mut() {
                        s.log_beat(event.timestamp, event.bpm);
                    }
                    on_event(event);
                }
            }
        }

        log::debug!(
            "stream done: {} batches, {} chunks ({} forwarded), {} samples left over",
            stats.batches,
            stats.chunks,
            stats.forwarded,
            queue.len()
        );
        Ok(stats)
    }
}
