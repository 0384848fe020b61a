//! cpal playback transport.
//!
//! The engine owns a read-only copy of whatever segment it was last handed
//! (full buffer or selection sub-range); edits to the live buffer never
//! reach an in-flight playback. The UI thread polls `elapsed_ms`/`is_busy`
//! instead of sharing the editor state with the audio callback.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use arc_swap::ArcSwapOption;
use atomic_float::AtomicF32;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

pub struct SharedAudio {
    /// Mono segment in [-1, 1], swapped atomically on load.
    pub samples: ArcSwapOption<Vec<f32>>,
    /// Sample rate of the loaded segment (not the device rate).
    pub src_rate: AtomicU32,
    pub vol: AtomicF32, // 0.0..1.0 linear gain
    pub playing: AtomicBool,
    pub paused: AtomicBool,
    pub play_pos_f: AtomicF32, // fractional position in segment samples
    pub out_sample_rate: u32,
}

pub struct AudioEngine {
    _stream: Option<cpal::Stream>,
    pub shared: Arc<SharedAudio>,
}

impl AudioEngine {
    fn new_shared(out_sample_rate: u32) -> Arc<SharedAudio> {
        Arc::new(SharedAudio {
            samples: ArcSwapOption::from(None),
            src_rate: AtomicU32::new(out_sample_rate),
            vol: AtomicF32::new(1.0),
            playing: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            play_pos_f: AtomicF32::new(0.0),
            out_sample_rate,
        })
    }

    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("No default output device")?;
        let cfg = device
            .default_output_config()
            .context("No default output config")?;

        let shared = Self::new_shared(cfg.sample_rate());

        let stream = match cfg.sample_format() {
            cpal::SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &cfg.into(), shared.clone())?
            }
            cpal::SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &cfg.into(), shared.clone())?
            }
            cpal::SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &cfg.into(), shared.clone())?
            }
            _ => anyhow::bail!("Unsupported sample format"),
        };

        Ok(Self {
            _stream: Some(stream),
            shared,
        })
    }

    /// Engine without a device stream, for headless tests.
    pub fn new_for_test() -> Self {
        Self {
            _stream: None,
            shared: Self::new_shared(48_000),
        }
    }

    fn build_stream<T>(
        device: &cpal::Device,
        cfg: &cpal::StreamConfig,
        shared: Arc<SharedAudio>,
    ) -> Result<cpal::Stream>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = cfg.channels as usize;
        let out_rate = shared.out_sample_rate.max(1) as f32;
        let err_fn = |e| log::error!("cpal stream error: {e}");
        let stream = device.build_output_stream(
            cfg,
            move |data: &mut [T], _| {
                let silence = |data: &mut [T]| {
                    for v in data.iter_mut() {
                        *v = T::from_sample(0.0);
                    }
                };
                let playing = shared.playing.load(Ordering::Relaxed);
                let paused = shared.paused.load(Ordering::Relaxed);
                if !playing || paused {
                    silence(data);
                    return;
                }
                let Some(segment) = shared.samples.load_full() else {
                    silence(data);
                    return;
                };
                let len = segment.len();
                if len == 0 {
                    shared.playing.store(false, Ordering::Relaxed);
                    silence(data);
                    return;
                }
                let vol = shared.vol.load(Ordering::Relaxed);
                let step = shared.src_rate.load(Ordering::Relaxed).max(1) as f32 / out_rate;
                let mut pos_f = shared.play_pos_f.load(Ordering::Relaxed);
                if !pos_f.is_finite() || pos_f < 0.0 {
                    pos_f = 0.0;
                }
                for frame in data.chunks_mut(channels) {
                    let pos = pos_f.floor() as usize;
                    if pos >= len {
                        shared.playing.store(false, Ordering::Relaxed);
                        for v in frame.iter_mut() {
                            *v = T::from_sample(0.0);
                        }
                        continue;
                    }
                    let i1 = (pos + 1).min(len - 1);
                    let t = (pos_f - pos as f32).clamp(0.0, 1.0);
                    let s = (segment[pos] * (1.0 - t) + segment[i1] * t) * vol;
                    let s = s.clamp(-1.0, 1.0);
                    for v in frame.iter_mut() {
                        *v = T::from_sample(s);
                    }
                    pos_f += step;
                }
                shared.play_pos_f.store(pos_f, Ordering::Relaxed);
            },
            err_fn,
            None,
        )?;
        stream.play()?;
        Ok(stream)
    }

    /// Hands the engine a new segment. Playback stops; `play` starts it
    /// from the segment's beginning.
    pub fn load(&self, samples: Vec<f32>, sample_rate: u32) {
        self.shared.playing.store(false, Ordering::Relaxed);
        self.shared.paused.store(false, Ordering::Relaxed);
        self.shared
            .src_rate
            .store(sample_rate.max(1), Ordering::Relaxed);
        self.shared.samples.store(Some(Arc::new(samples)));
        self.shared.play_pos_f.store(0.0, Ordering::Relaxed);
    }

    pub fn play(&self) {
        if self.shared.samples.load().is_none() {
            return;
        }
        self.shared.play_pos_f.store(0.0, Ordering::Relaxed);
        self.shared.paused.store(false, Ordering::Relaxed);
        self.shared.playing.store(true, Ordering::Relaxed);
    }

    /// Loads the current segment reversed and plays it.
    pub fn play_reverse(&self) {
        let Some(segment) = self.shared.samples.load_full() else {
            return;
        };
        let mut reversed = segment.as_ref().clone();
        reversed.reverse();
        let rate = self.shared.src_rate.load(Ordering::Relaxed);
        self.load(reversed, rate);
        self.play();
    }

    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::Relaxed);
    }

    pub fn stop(&self) {
        self.shared.playing.store(false, Ordering::Relaxed);
        self.shared.paused.store(false, Ordering::Relaxed);
        self.shared.play_pos_f.store(0.0, Ordering::Relaxed);
    }

    /// Volume on the user-facing 0..100 scale.
    pub fn set_volume(&self, v: u8) {
        let gain = (v.min(100) as f32) / 100.0;
        self.shared.vol.store(gain, Ordering::Relaxed);
    }

    pub fn is_busy(&self) -> bool {
        self.shared.playing.load(Ordering::Relaxed)
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Relaxed)
    }

    /// Elapsed time within the loaded segment, derived from the playback
    /// position rather than a wall clock so pause/resume need no extra
    /// bookkeeping.
    pub fn elapsed_ms(&self) -> u64 {
        let pos = self.shared.play_pos_f.load(Ordering::Relaxed).max(0.0) as f64;
        let rate = self.shared.src_rate.load(Ordering::Relaxed).max(1) as f64;
        (pos / rate * 1000.0) as u64
    }
}
