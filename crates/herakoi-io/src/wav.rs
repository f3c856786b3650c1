//! WAV output for offline renders.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};

use crate::{Error, Result};

/// WAV file specification.
///
/// 32-bit files are written as IEEE float, 8/16/24-bit as integer PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// WAV metadata read from a file header.
#[derive(Debug, Clone, PartialEq)]
pub struct WavInfo {
    /// Format of the file.
    pub spec: WavSpec,
    /// Sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = WavSpec::from(reader.spec());
    let num_frames = u64::from(reader.len()) / u64::from(spec.channels.max(1));
    Ok(WavInfo {
        spec,
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate),
    })
}

/// Read a WAV file as f32, mixing multi-channel files down to mono.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let spec = WavSpec::from(reader.spec());
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f32> = match reader.spec().sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let mono = if channels > 1 {
        samples
            .chunks(channels)
            .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };

    Ok((mono, spec))
}

/// Incremental WAV writer for renders produced block by block.
///
/// Samples are interleaved according to `spec.channels`. Call
/// [`finalize`](Self::finalize) to write the header; a recorder that is
/// dropped instead is finalized by hound on a best-effort basis.
pub struct WavRecorder {
    writer: WavWriter<BufWriter<File>>,
    spec: WavSpec,
    samples_written: u64,
}

impl WavRecorder {
    /// Create the file at `path`.
    pub fn create<P: AsRef<Path>>(path: P, spec: WavSpec) -> Result<Self> {
        if !matches!(spec.bits_per_sample, 8 | 16 | 24 | 32) {
            return Err(Error::UnsupportedFormat(format!(
                "{}-bit WAV",
                spec.bits_per_sample
            )));
        }
        if spec.channels == 0 {
            return Err(Error::UnsupportedFormat("zero-channel WAV".to_string()));
        }
        let writer = WavWriter::create(path, hound::WavSpec::from(spec))?;
        Ok(Self {
            writer,
            spec,
            samples_written: 0,
        })
    }

    /// Append interleaved samples.
    pub fn write(&mut self, samples: &[f32]) -> Result<()> {
        if self.spec.bits_per_sample == 32 {
            for &sample in samples {
                self.writer.write_sample(sample)?;
            }
        } else {
            let max_val = (1i32 << (self.spec.bits_per_sample - 1)) as f32;
            for &sample in samples {
                let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
                self.writer.write_sample(int_sample)?;
            }
        }
        self.samples_written += samples.len() as u64;
        Ok(())
    }

    /// Frames written so far.
    pub fn frames(&self) -> u64 {
        self.samples_written / u64::from(self.spec.channels)
    }

    /// Format being written.
    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    /// Write the header and close the file. Returns the frame count.
    pub fn finalize(self) -> Result<u64> {
        let frames = self.frames();
        self.writer.finalize()?;
        Ok(frames)
    }
}
