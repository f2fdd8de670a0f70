use tempo_check::analyzer::{AnalyzerConfig, AubioTempoAnalyzer, DetectionEvent, TempoAnalyzer};
use tempo_check::scheduler::ChunkScheduler;
use tempo_check::source::AudioSource;
use tempo_check::windowing::TimeWindow;

/// Click track at a fixed BPM: 5 ms decaying 1 kHz clicks on every beat.
fn click_track(bpm: f64, sample_rate: u32, seconds: f64) -> Vec<f32> {
    let total = (sample_rate as f64 * seconds) as usize;
    let mut samples = vec![0.0f32; total];
    let samples_per_beat = (60.0 / bpm) * sample_rate as f64;
    let click_len = (sample_rate as f64 * 0.005) as usize;

    let mut position = 0.0f64;
    while (position as usize) < total {
        let start = position as usize;
        for j in 0..click_len {
            if start + j < total {
                let t = j as f32 / sample_rate as f32;
                samples[start + j] =
                    (2.0 * std::f32::consts::PI * 1000.0 * t).sin() * (-t * 500.0).exp();
            }
        }
        position += samples_per_beat;
    }
    samples
}

struct VecSource {
    batches: Vec<Vec<f32>>,
    next: usize,
    sample_rate: u32,
}

impl AudioSource for VecSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn next_batch(&mut self) -> tempo_check::error::Result<Option<Vec<f32>>> {
        if self.next >= self.batches.len() {
            return Ok(None);
        }
        let batch = self.batches[self.next].clone();
        self.next += 1;
        Ok(Some(batch))
    }
}

#[test]
fn aubio_analyzer_tracks_a_click_track() {
    let sample_rate = 44_100u32;
    let samples = click_track(120.0, sample_rate, 30.0);
    let mut source = VecSource {
        batches: samples.chunks(4410).map(|c| c.to_vec()).collect(),
        next: 0,
        sample_rate,
    };

    let config = AnalyzerConfig {
        sample_rate,
        min_tempo: 80.0,
        max_tempo: 160.0,
    };
    let mut analyzer = AubioTempoAnalyzer::new(&config, 1024, 512).expect("aubio tempo tracker");
    let scheduler = ChunkScheduler::new(1024, 512);

    let mut events: Vec<DetectionEvent> = Vec::new();
    analyzer.start();
    scheduler
        .run(
            &mut source,
            &mut analyzer,
            TimeWindow::unbounded(),
            None,
            |event| events.push(*event),
        )
        .expect("click track analyzes cleanly");
    analyzer.stop();

    assert!(
        !events.is_empty(),
        "a 30 s click track should produce detections"
    );
    assert!(
        events.iter().all(|e| e.bpm > 0.0 && e.bpm <= 160.0),
        "reported tempos must be folded into the configured range"
    );

    // Allow the tracker a warm-up; by the end it should sit near 120 bpm.
    let last = events.last().unwrap();
    assert!(
        (f64::from(last.bpm) - 120.0).abs() < 20.0,
        "expected ~120 bpm near the end, got {:.1}",
        last.bpm
    );
}
