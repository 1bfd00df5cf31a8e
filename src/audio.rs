use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("Audio file has no channels")]
    NoChannels,
}

/// Mono audio as produced by every inference adapter
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn silence(seconds: f32, sample_rate: u32) -> Self {
        let len = (sample_rate as f32 * seconds) as usize;
        Self::new(vec![0.0; len], sample_rate)
    }

    /// Join segments in order with `gap` between consecutive ones.
    ///
    /// The output takes the sample rate of the gap; segments are assumed to
    /// already share it.
    pub fn concat_with_gap(parts: Vec<Waveform>, gap: &Waveform) -> Waveform {
        let total = parts.iter().map(|p| p.samples.len()).sum::<usize>()
            + gap.samples.len() * parts.len().saturating_sub(1);
        let mut samples = Vec::with_capacity(total);

        let count = parts.len();
        for (i, part) in parts.into_iter().enumerate() {
            samples.extend(part.samples);
            if i + 1 < count {
                samples.extend_from_slice(&gap.samples);
            }
        }

        Waveform::new(samples, gap.sample_rate)
    }
}

/// Write mono 16-bit PCM. Samples outside [-1, 1] are clipped.
pub fn write_wav(path: &Path, waveform: &Waveform) -> Result<(), AudioError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for sample in &waveform.samples {
        let scaled = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        writer.write_sample(scaled)?;
    }
    writer.finalize()?;

    Ok(())
}

/// Read any PCM or float WAV, mixing multiple channels down to mono
pub fn read_wav(path: &Path) -> Result<Waveform, AudioError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(AudioError::NoChannels);
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let max = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<Result<_, _>>()?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(Waveform::new(samples, spec.sample_rate))
}

/// Sinc-resample to `target_rate`; returns the input untouched when rates match.
///
/// The filter delay is trimmed and the tail flushed, so output sample `i`
/// lines up with input time `i / target_rate`.
pub fn resample(waveform: Waveform, target_rate: u32) -> Result<Waveform, AudioError> {
    if waveform.sample_rate == target_rate || waveform.samples.is_empty() {
        return Ok(Waveform::new(waveform.samples, target_rate));
    }

    let ratio = target_rate as f64 / waveform.sample_rate as f64;
    let input_len = waveform.samples.len();
    let expected = (input_len as f64 * ratio).round() as usize;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, input_len, 1)
        .map_err(|e| AudioError::Resample(e.to_string()))?;
    let delay = resampler.output_delay();

    let mut samples = resampler
        .process(&[waveform.samples], None)
        .map_err(|e| AudioError::Resample(e.to_string()))?
        .remove(0);

    while samples.len() < delay + expected {
        let tail = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?
            .remove(0);
        if tail.is_empty() {
            break;
        }
        samples.extend(tail);
    }

    samples.drain(..delay.min(samples.len()));
    samples.truncate(expected);

    Ok(Waveform::new(samples, target_rate))
}
