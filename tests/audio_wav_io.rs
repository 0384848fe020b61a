use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

fn make_temp_dir(tag: &str) -> PathBuf {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "epoch123_{tag}_{}_{}_{}",
        std::process::id(),
        now_ms,
        seq
    ));
    std::fs::create_dir_all(&dir).expect("create temp test dir");
    dir
}

fn synth_tone(sr: u32, secs: f32, hz: f32) -> Vec<f32> {
    let frames = ((sr as f32) * secs).max(1.0) as usize;
    (0..frames)
        .map(|i| {
            let t = (i as f32) / (sr as f32);
            (t * hz * std::f32::consts::TAU).sin() * 0.5
        })
        .collect()
}

#[test]
fn wav_write_then_decode_round_trip() {
    let dir = make_temp_dir("wav_round_trip");
    let path = dir.join("tone.wav");
    let samples = synth_tone(44_100, 0.1, 440.0);
    epoch123::audio_io::write_wav_mono(&path, &samples, 44_100).expect("write wav");

    let (decoded, sr) = epoch123::audio_io::decode_audio_mono(&path).expect("decode wav");
    assert_eq!(sr, 44_100);
    assert_eq!(decoded.len(), samples.len());
    for (a, b) in samples.iter().zip(&decoded) {
        assert!((a - b).abs() < 1e-5, "{a} vs {b}");
    }
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn stereo_decode_downmixes_by_average() {
    let dir = make_temp_dir("stereo_downmix");
    let path = dir.join("stereo.wav");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 22_050,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&path, spec).expect("create");
    // constant left 0.8, right 0.2 -> mono average 0.5
    for _ in 0..2048 {
        writer.write_sample(0.8f32).unwrap();
        writer.write_sample(0.2f32).unwrap();
    }
    writer.finalize().expect("finalize");

    let (mono, sr) = epoch123::audio_io::decode_audio_mono(&path).expect("decode");
    assert_eq!(sr, 22_050);
    assert_eq!(mono.len(), 2048);
    for &v in &mono {
        assert!((v - 0.5).abs() < 1e-5, "expected 0.5, got {v}");
    }
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn probe_reports_shape_without_full_decode() {
    let dir = make_temp_dir("probe_info");
    let path = dir.join("tone.wav");
    let samples = synth_tone(48_000, 0.25, 220.0);
    epoch123::audio_io::write_wav_mono(&path, &samples, 48_000).expect("write wav");

    let info = epoch123::audio_io::read_audio_info(&path).expect("probe");
    assert_eq!(info.channels, 1);
    assert_eq!(info.sample_rate, 48_000);
    assert!(info.file_size > 0);
    if let Some(secs) = info.duration_secs {
        assert!((secs - 0.25).abs() < 0.05, "duration {secs}");
    }
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_rejects_non_audio() {
    let dir = make_temp_dir("bad_input");
    let path = dir.join("notes.wav");
    std::fs::write(&path, b"this is not audio data at all").unwrap();
    assert!(epoch123::audio_io::decode_audio_mono(&path).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}
