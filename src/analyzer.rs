use aubio::{OnsetMode, Tempo};

use crate::error::{HarnessError, Result};

/// Per-test analyzer configuration.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerConfig {
    pub sample_rate: u32,
    pub min_tempo: f32,
    pub max_tempo: f32,
}

/// One tempo report from the analyzer: the timestamp of the chunk that
/// produced it and the detected BPM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionEvent {
    pub timestamp: f64,
    pub bpm: f32,
}

/// The narrow interface the harness drives. Implementations keep whatever
/// spectral state they need between chunks; the harness only feeds windows
/// and consumes the events each feed produces.
pub trait TempoAnalyzer {
    fn start(&mut self) {}

    /// Analyze one fixed-length chunk. Returns zero or more detection events
    /// for this chunk.
    fn feed(&mut self, timestamp: f64, chunk: &[f32]) -> Result<Vec<DetectionEvent>>;

    fn stop(&mut self) {}
}

/// Tempo detection backed by aubio's onset/autocorrelation tracker.
pub struct AubioTempoAnalyzer {
    tempo: Tempo,
    min_tempo: f32,
    max_tempo: f32,
}

impl AubioTempoAnalyzer {
    pub fn new(config: &AnalyzerConfig, chunk_size: usize, hop_size: usize) -> Result<Self> {
        let tempo = Tempo::new(OnsetMode::Complex, chunk_size, hop_size, config.sample_rate)
            .map_err(|e| HarnessError::Analysis(e.to_string()))?;
        Ok(Self {
            tempo,
            min_tempo: config.min_tempo,
            max_tempo: config.max_tempo,
        })
    }
}

impl TempoAnalyzer for AubioTempoAnalyzer {
    fn feed(&mut self, timestamp: f64, chunk: &[f32]) -> Result<Vec<DetectionEvent>> {
        let onset = self
            .tempo
            .do_result(chunk)
            .map_err(|e| HarnessError::Analysis(e.to_string()))?;
        if onset <= 0.0 {
            return Ok(Vec::new());
        }
        let bpm = fold_into_range(self.tempo.get_bpm(), self.min_tempo, self.max_tempo);
        if bpm <= 0.0 {
            return Ok(Vec::new());
        }
        Ok(vec![DetectionEvent { timestamp, bpm }])
    }
}

/// Fold a raw BPM estimate into `[min_tempo, max_tempo]` by octave
/// doubling/halving. Tempo trackers routinely lock onto half or double the
/// true tempo; the test case's search range decides which octave counts.
pub fn fold_into_range(mut bpm: f32, min_tempo: f32, max_tempo: f32) -> f32 {
    if bpm <= 0.0 || min_tempo <= 0.0 || max_tempo <= min_tempo {
        return bpm;
    }
    while bpm < min_tempo {
        bpm *= 2.0;
    }
    while bpm > max_tempo {
        bpm /= 2.0;
    }
    bpm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folding_doubles_up_into_range() {
        assert_eq!(fold_into_range(34.0, 60.0, 120.0), 68.0);
        assert_eq!(fold_into_range(17.0, 60.0, 120.0), 68.0);
    }

    #[test]
    fn folding_halves_down_into_range() {
        assert_eq!(fold_into_range(280.0, 80.0, 160.0), 140.0);
    }

    #[test]
    fn in_range_bpm_is_untouched() {
        assert_eq!(fold_into_range(123.0, 80.0, 160.0), 123.0);
    }

    #[test]
    fn degenerate_ranges_pass_through() {
        assert_eq!(fold_into_range(90.0, 0.0, 160.0), 90.0);
        assert_eq!(fold_into_range(90.0, 160.0, 80.0), 90.0);
    }
}
