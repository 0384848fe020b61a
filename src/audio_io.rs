//! Decode/encode boundary.
//!
//! Decoding goes through symphonia's probe so the same path handles wav,
//! mp3, m4a, and ogg. Multi-channel sources are downmixed to mono by
//! averaging at decode time; the editor only ever sees mono buffers.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::buffer::AudioBuffer;

pub const SUPPORTED_EXTS: &[&str] = &["wav", "mp3", "m4a", "ogg"];

pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTS.iter().any(|e| ext.eq_ignore_ascii_case(e))
}

pub fn is_supported_audio_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(is_supported_extension)
        .unwrap_or(false)
}

/// Probe-level facts about a file, for the metadata store and the info
/// panel. Cheap: no full decode.
#[derive(Clone, Copy, Debug)]
pub struct AudioInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub duration_secs: Option<f32>,
    pub file_size: u64,
}

pub fn read_audio_info(path: &Path) -> Result<AudioInfo> {
    let file_size = std::fs::metadata(path)
        .with_context(|| format!("stat audio: {}", path.display()))?
        .len();
    let (format, _decoder, _track_id, sample_rate) = open_decoder(path)?;
    let track = format.default_track().context("no default track")?;
    let cp = &track.codec_params;
    let channels = cp.channels.map(|c| c.count() as u16).unwrap_or(1);
    let duration_secs = match (cp.time_base, cp.n_frames) {
        (Some(tb), Some(n)) => Some(((n as f64) * (tb.numer as f64) / (tb.denom as f64)) as f32),
        _ => None,
    };
    Ok(AudioInfo {
        channels,
        sample_rate: sample_rate.max(1),
        duration_secs,
        file_size,
    })
}

fn open_decoder(
    path: &Path,
) -> Result<(
    Box<dyn symphonia::core::formats::FormatReader>,
    Box<dyn symphonia::core::codecs::Decoder>,
    u32,
    u32,
)> {
    let ext_hint = path.extension().and_then(|s| s.to_str());
    // Retry without the extension hint; a wrong extension should not make a
    // decodable file fail.
    let probed = match probe_once(path, ext_hint) {
        Ok(v) => v,
        Err(first_err) => {
            if ext_hint.is_some() {
                probe_once(path, None).with_context(|| {
                    format!(
                        "probe audio failed with and without hint: {}",
                        path.display()
                    )
                })?
            } else {
                return Err(first_err);
            }
        }
    };
    let format = probed.format;
    let track = format.default_track().context("no default track")?.clone();
    let decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;
    let sample_rate_hint = track.codec_params.sample_rate.unwrap_or(0);
    Ok((format, decoder, track.id, sample_rate_hint))
}

fn probe_once(
    path: &Path,
    hint_ext: Option<&str>,
) -> Result<symphonia::core::probe::ProbeResult> {
    let file = File::open(path).with_context(|| format!("open audio: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = hint_ext {
        hint.with_extension(ext);
    }
    get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(Into::into)
}

/// Full decode to a mono buffer (average across channels).
pub fn decode_audio_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let (mut format, mut decoder, track_id, mut sample_rate) = open_decoder(path)?;
    let mut mono: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(err.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(err.into()),
        };
        if sample_rate == 0 {
            sample_rate = decoded.spec().rate;
        }
        let channels = decoded.spec().channels.count().max(1);
        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        buf.copy_interleaved_ref(decoded);
        for frame in buf.samples().chunks(channels) {
            let mut acc = 0.0f32;
            for &v in frame {
                acc += v;
            }
            mono.push(acc / channels as f32);
        }
    }
    if sample_rate == 0 {
        anyhow::bail!("unknown sample rate: {}", path.display());
    }
    Ok((mono, sample_rate))
}

pub fn decode_buffer(path: &Path) -> Result<AudioBuffer> {
    let (mono, sample_rate) = decode_audio_mono(path)?;
    Ok(AudioBuffer::new(mono, sample_rate))
}

/// Writes the edited mono buffer back out as 32-bit float WAV.
pub fn write_wav_mono(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("create wav: {}", path.display()))?;
    for &v in samples {
        writer.write_sample(v)?;
    }
    writer
        .finalize()
        .with_context(|| format!("finalize wav: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_filter() {
        assert!(is_supported_audio_path(Path::new("a/b/kick.WAV")));
        assert!(is_supported_audio_path(Path::new("voice.mp3")));
        assert!(!is_supported_audio_path(Path::new("notes.txt")));
        assert!(!is_supported_audio_path(Path::new("noext")));
    }
}
