use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Per-test plot file pair: one line per analyzed chunk (timestamp and mean
/// magnitude) and one line per detected beat (timestamp and BPM). Writes are
/// best-effort; the sink must never influence accuracy results.
pub struct PlotWriter {
    data: BufWriter<File>,
    markers: BufWriter<File>,
}

impl PlotWriter {
    pub fn create(dir: &Path, label: &str) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;
        let data_path = dir.join(format!("{label}-plot-data.txt"));
        let markers_path = dir.join(format!("{label}-plot-markers.txt"));

        // Normal for these to be missing on a first run.
        let _ = fs::remove_file(&data_path);
        let _ = fs::remove_file(&markers_path);

        Ok(Self {
            data: BufWriter::new(File::create(&data_path)?),
            markers: BufWriter::new(File::create(&markers_path)?),
        })
    }

    pub fn log_chunk(&mut self, timestamp: f64, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        let level = samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32;
        let _ = writeln!(self.data, "{timestamp:.6}\t{level:.6}");
    }

    pub fn log_beat(&mut self, timestamp: f64, bpm: f32) {
        let _ = writeln!(self.markers, "{timestamp:.6}\t{bpm:.2}");
    }
}
