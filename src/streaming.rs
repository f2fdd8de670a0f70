use std::sync::mpsc::{self, Receiver, Sender};

use cpal::SampleFormat;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use num_traits::ToPrimitive;

use crate::analyzer::{AnalyzerConfig, AubioTempoAnalyzer, TempoAnalyzer};
use crate::error::{HarnessError, Result};
use crate::scheduler::{ChunkScheduler, DEFAULT_CHUNK_SIZE, DEFAULT_HOP_SIZE};
use crate::source::AudioSource;
use crate::windowing::TimeWindow;

const LIVE_INPUT: &str = "default input device";

/// Live-capture provider. The OS audio callback runs on its own thread and
/// hands batches over a channel; the harness thread consumes them through
/// the same [`AudioSource`] interface the file provider uses. The stream is
/// unbounded; it ends only when the input stream itself dies.
pub struct LiveSource {
    sample_rate: u32,
    rx: Receiver<Vec<f32>>,
    _stream: cpal::Stream,
}

impl LiveSource {
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or_else(|| HarnessError::SourceOpen {
            path: LIVE_INPUT.to_string(),
            message: "no input device available".to_string(),
        })?;
        let config = device
            .default_input_config()
            .map_err(|e| HarnessError::SourceOpen {
                path: LIVE_INPUT.to_string(),
                message: e.to_string(),
            })?;
        let sample_rate = config.sample_rate().0;

        let (tx, rx) = mpsc::channel();
        let err_fn = |err| log::error!("input stream error: {err}");

        let stream = match config.sample_format() {
            SampleFormat::F32 => build_input_stream::<f32>(&device, &config.into(), tx, err_fn)?,
            SampleFormat::I16 => build_input_stream::<i16>(&device, &config.into(), tx, err_fn)?,
            SampleFormat::U16 => build_input_stream::<u16>(&device, &config.into(), tx, err_fn)?,
            other => {
                return Err(HarnessError::SourceOpen {
                    path: LIVE_INPUT.to_string(),
                    message: format!("unsupported sample format {other:?}"),
                });
            }
        };
        stream.play().map_err(|e| HarnessError::SourceOpen {
            path: LIVE_INPUT.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            sample_rate,
            rx,
            _stream: stream,
        })
    }
}

impl AudioSource for LiveSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn next_batch(&mut self) -> Result<Option<Vec<f32>>> {
        Ok(self.rx.recv().ok())
    }
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    tx: Sender<Vec<f32>>,
    err_fn: impl Fn(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::SizedSample + ToPrimitive,
{
    let channels = config.channels as usize;
    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mono: Vec<f32> = data
                    .chunks(channels)
                    .map(|frame| frame[0].to_f32().unwrap_or(0.0))
                    .collect();
                let _ = tx.send(mono);
            },
            err_fn,
            None,
        )
        .map_err(|e| HarnessError::SourceOpen {
            path: LIVE_INPUT.to_string(),
            message: e.to_string(),
        })?;
    Ok(stream)
}

/// Live mode: capture from the default input device and print a line per
/// detected beat. Runs until the process is interrupted.
pub fn run_live(min_tempo: f32, max_tempo: f32) -> anyhow::Result<()> {
    let mut source = LiveSource::open()?;
    let config = AnalyzerConfig {
        sample_rate: source.sample_rate(),
        min_tempo,
        max_tempo,
    };
    let mut analyzer = AubioTempoAnalyzer::new(&config, DEFAULT_CHUNK_SIZE, DEFAULT_HOP_SIZE)?;
    let scheduler = ChunkScheduler::new(DEFAULT_CHUNK_SIZE, DEFAULT_HOP_SIZE);

    println!(
        "Listening on the default input device ({} Hz), tempo range {:.0}-{:.0} bpm. Ctrl-C to stop.",
        source.sample_rate(),
        min_tempo,
        max_tempo
    );

    analyzer.start();
    scheduler.run(
        &mut source,
        &mut analyzer,
        TimeWindow::unbounded(),
        None,
        |event| {
            println!("{:8.2}s  {:6.1} bpm", event.timestamp, event.bpm);
        },
    )?;
    analyzer.stop();
    Ok(())
}
