use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hound::{SampleFormat, WavReader};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatReader;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::probe::Hint;
use symphonia::default::get_probe;

use crate::error::{HarnessError, Result};

/// A producer of decoded mono sample batches at a fixed rate. Batches arrive
/// in stream order and may be any length; `None` signals end of stream.
pub trait AudioSource {
    fn sample_rate(&self) -> u32;

    fn next_batch(&mut self) -> Result<Option<Vec<f32>>>;
}

/// Frames per batch for the WAV reader. Compressed formats batch per packet,
/// whatever size the container hands back.
const WAV_BATCH_FRAMES: usize = 8192;

fn open_error(path: &Path, message: impl ToString) -> HarnessError {
    HarnessError::SourceOpen {
        path: path.display().to_string(),
        message: message.to_string(),
    }
}

fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// File-decode provider. WAV goes through hound; everything else goes
/// through a symphonia probe (MP3 and FLAC are enabled).
pub enum FileSource {
    Wav(WavFileSource),
    Compressed(SymphoniaSource),
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("wav") => WavFileSource::open(path).map(Self::Wav),
            _ => SymphoniaSource::open(path).map(Self::Compressed),
        }
    }
}

impl AudioSource for FileSource {
    fn sample_rate(&self) -> u32 {
        match self {
            Self::Wav(s) => s.sample_rate(),
            Self::Compressed(s) => s.sample_rate(),
        }
    }

    fn next_batch(&mut self) -> Result<Option<Vec<f32>>> {
        match self {
            Self::Wav(s) => s.next_batch(),
            Self::Compressed(s) => s.next_batch(),
        }
    }
}

pub struct WavFileSource {
    reader: WavReader<BufReader<File>>,
    channels: usize,
    sample_rate: u32,
    /// Scale from integer PCM to `[-1.0, 1.0]`; unused for float WAVs.
    int_scale: f32,
    is_float: bool,
}

impl WavFileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path).map_err(|e| open_error(path, e))?;
        let spec = reader.spec();
        let int_scale = 1.0 / (((1i64 << (spec.bits_per_sample - 1)) - 1) as f32);
        Ok(Self {
            reader,
            channels: spec.channels as usize,
            sample_rate: spec.sample_rate,
            int_scale,
            is_float: spec.sample_format == SampleFormat::Float,
        })
    }
}

impl AudioSource for WavFileSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn next_batch(&mut self) -> Result<Option<Vec<f32>>> {
        let want = WAV_BATCH_FRAMES * self.channels;
        let mut interleaved = Vec::with_capacity(want);
        if self.is_float {
            for sample in self.reader.samples::<f32>().take(want) {
                interleaved.push(sample.map_err(|e| HarnessError::Decode(e.to_string()))?);
            }
        } else {
            let scale = self.int_scale;
            for sample in self.reader.samples::<i32>().take(want) {
                let s = sample.map_err(|e| HarnessError::Decode(e.to_string()))?;
                interleaved.push(s as f32 * scale);
            }
        }
        if interleaved.is_empty() {
            return Ok(None);
        }
        Ok(Some(downmix_to_mono(&interleaved, self.channels)))
    }
}

pub struct SymphoniaSource {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
}

impl SymphoniaSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| open_error(path, e))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = get_probe()
            .format(&hint, mss, &Default::default(), &Default::default())
            .map_err(|e| open_error(path, e))?;
        let format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| open_error(path, "no default audio track"))?;
        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| open_error(path, "sample rate unknown"))?;
        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| open_error(path, e))?;

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
        })
    }
}

impl AudioSource for SymphoniaSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn next_batch(&mut self) -> Result<Option<Vec<f32>>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(HarnessError::Decode(e.to_string())),
            };
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = self
                .decoder
                .decode(&packet)
                .map_err(|e| HarnessError::Decode(e.to_string()))?;
            let spec = *decoded.spec();
            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buf.copy_interleaved_ref(decoded);

            let mono = downmix_to_mono(buf.samples(), spec.channels.count());
            if mono.is_empty() {
                continue;
            }
            return Ok(Some(mono));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_frames_average_to_mono() {
        let interleaved = [0.0, 1.0, -1.0, 1.0, 0.5, 0.5];
        assert_eq!(downmix_to_mono(&interleaved, 2), vec![0.5, 0.0, 0.5]);
    }

    #[test]
    fn mono_passes_through() {
        let samples = [0.25, -0.25];
        assert_eq!(downmix_to_mono(&samples, 1), samples.to_vec());
    }
}
