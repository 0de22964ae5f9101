//! Decoding to the canonical classifier input (16kHz mono PCM).

use crate::audio::compressed;
use crate::defaults::SAMPLE_RATE;
use crate::error::{EmotagError, Result};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::ops::RangeInclusive;
use std::path::Path;

/// Source sample rates accepted before resampling. Anything outside is a
/// corrupt header, and resampling it could request an enormous buffer.
pub const SOURCE_RATE_RANGE: RangeInclusive<u32> = 1_000..=384_000;

/// A recording decoded to 16kHz mono 16-bit PCM.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<i16>,
    /// Sample rate of the file before resampling.
    pub source_rate: u32,
    /// Channel count of the file before downmixing.
    pub source_channels: u16,
}

impl DecodedAudio {
    /// Decode a recording from disk. RIFF files go through hound, anything
    /// else through symphonia.
    pub fn from_path(path: &Path) -> Result<Self> {
        let open_error = |e: std::io::Error| EmotagError::AudioDecode {
            message: format!("Failed to open {}: {}", path.display(), e),
        };
        let mut file = File::open(path).map_err(open_error)?;

        let mut magic = [0u8; 4];
        let is_riff = file.read_exact(&mut magic).is_ok() && &magic == b"RIFF";
        if !is_riff {
            let pcm = compressed::decode_file(path)?;
            return Self::from_interleaved(&pcm.samples, pcm.sample_rate, pcm.channels);
        }

        file.seek(SeekFrom::Start(0)).map_err(open_error)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Decode WAV data from any reader.
    ///
    /// Integer PCM of any bit depth and 32-bit float are accepted; everything
    /// is downmixed to mono and resampled to [`SAMPLE_RATE`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut wav_reader = hound::WavReader::new(reader).map_err(|e| EmotagError::AudioDecode {
            message: format!("Failed to parse WAV file: {}", e),
        })?;

        let spec = wav_reader.spec();
        check_layout(spec.sample_rate, spec.channels)?;

        let raw_samples: Vec<i16> = match spec.sample_format {
            hound::SampleFormat::Int if spec.bits_per_sample <= 16 => {
                let shift = 16 - spec.bits_per_sample;
                wav_reader
                    .samples::<i16>()
                    .map(|s| s.map(|v| v << shift))
                    .collect::<std::result::Result<Vec<_>, _>>()
            }
            hound::SampleFormat::Int => {
                let shift = spec.bits_per_sample.saturating_sub(16);
                wav_reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| (v >> shift) as i16))
                    .collect()
            }
            hound::SampleFormat::Float => wav_reader
                .samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
                .collect(),
        }
        .map_err(|e| EmotagError::AudioDecode {
            message: format!("Failed to read WAV samples: {}", e),
        })?;

        Self::from_interleaved(&raw_samples, spec.sample_rate, spec.channels)
    }

    /// Downmix and resample interleaved PCM.
    pub fn from_interleaved(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Self> {
        check_layout(sample_rate, channels)?;
        let mono_samples = downmix(samples, channels);
        Ok(Self {
            samples: resample(&mono_samples, sample_rate, SAMPLE_RATE),
            source_rate: sample_rate,
            source_channels: channels,
        })
    }

    /// Duration of the decoded audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / SAMPLE_RATE as f64
    }

    /// Re-encode as a 16kHz mono 16-bit WAV file, for backends that take
    /// audio files rather than raw samples.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        encode_wav(&self.samples)
    }
}

fn check_layout(sample_rate: u32, channels: u16) -> Result<()> {
    if channels == 0 {
        return Err(EmotagError::AudioDecode {
            message: "Audio declares zero channels".to_string(),
        });
    }
    if !SOURCE_RATE_RANGE.contains(&sample_rate) {
        return Err(EmotagError::AudioDecode {
            message: format!("Implausible sample rate {} Hz", sample_rate),
        });
    }
    Ok(())
}

/// Encode 16kHz mono samples as WAV bytes.
pub fn encode_wav(samples: &[i16]) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    let to_error = |e: hound::Error| EmotagError::AudioDecode {
        message: format!("Failed to encode WAV: {}", e),
    };
    let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(to_error)?;
    for &sample in samples {
        writer.write_sample(sample).map_err(to_error)?;
    }
    writer.finalize().map_err(to_error)?;
    Ok(cursor.into_inner())
}

/// Average interleaved channels into one.
fn downmix(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

/// Simple linear interpolation resampling.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = (source_pos.floor() as usize).min(samples.len() - 1);
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}
