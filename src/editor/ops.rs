//! The destructive sample transforms. Pure functions over sample slices;
//! `EditorSession` wires them to history, selection, and playback.

use rustfft::num_complex::Complex32;
use rustfft::FftPlanner;
use thiserror::Error;

use super::filter::{butter_bandpass, butter_highpass, butter_lowpass, sosfiltfilt};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("audio buffer is empty")]
    EmptyBuffer,
    #[error("no region selected")]
    NoSelection,
    #[error("unknown filter kind index {0}")]
    UnknownFilterKind(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
}

impl FilterKind {
    pub const ALL: [FilterKind; 3] = [
        FilterKind::LowPass,
        FilterKind::HighPass,
        FilterKind::BandPass,
    ];

    pub fn from_index(index: usize) -> Result<Self, EditError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(EditError::UnknownFilterKind(index))
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterKind::LowPass => "Low Pass",
            FilterKind::HighPass => "High Pass",
            FilterKind::BandPass => "Band Pass",
        }
    }
}

/// Fixed 4th-order Butterworth designs, applied zero-phase. Cutoffs are
/// normalized to Nyquist: LP/HP at 0.1, BP over [0.05, 0.15].
pub fn band_filter(samples: &[f32], kind: FilterKind) -> Vec<f32> {
    let sos = match kind {
        FilterKind::LowPass => butter_lowpass(4, 0.1),
        FilterKind::HighPass => butter_highpass(4, 0.1),
        FilterKind::BandPass => butter_bandpass(4, 0.05, 0.15),
    };
    sosfiltfilt(&sos, samples)
}

/// Frequency-domain bin remap: `new_index = floor(i * 2^(semitones/12))`.
///
/// Colliding bins keep the last writer and out-of-range bins are dropped.
/// That aliasing is inherent to this simple method and is kept as-is; it is
/// fine for casual pitch preview, not for production resynthesis.
pub fn pitch_shift(samples: &[f32], semitones: f32) -> Vec<f32> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    let factor = 2f64.powf(semitones as f64 / 12.0);

    let mut planner = FftPlanner::<f32>::new();
    let mut spectrum: Vec<Complex32> = samples.iter().map(|&v| Complex32::new(v, 0.0)).collect();
    planner.plan_fft_forward(n).process(&mut spectrum);

    let mut remapped = vec![Complex32::new(0.0, 0.0); n];
    for (i, bin) in spectrum.iter().enumerate() {
        let new_index = (i as f64 * factor).floor() as usize;
        if new_index < n {
            remapped[new_index] = *bin;
        }
    }

    planner.plan_fft_inverse(n).process(&mut remapped);
    let scale = 1.0 / n as f32;
    remapped.iter().map(|c| c.re * scale).collect()
}

#[derive(Clone, Debug, PartialEq)]
pub enum TrimOutcome {
    /// New buffer plus how many samples were gated to zero.
    Trimmed { samples: Vec<f32>, zeroed: usize },
    /// All-zero input: nothing to derive a threshold from, harmless no-op.
    SilentBuffer,
}

/// Threshold gate at `max(|s|) * 10^(db/20)`. Strictly-below samples are
/// zeroed; samples equal to the threshold survive.
pub fn trim_amplitude(samples: &[f32], db: f32) -> TrimOutcome {
    let reference = samples.iter().fold(0.0f32, |m, &v| m.max(v.abs()));
    if reference == 0.0 {
        return TrimOutcome::SilentBuffer;
    }
    let threshold = reference * 10f32.powf(db / 20.0);
    let mut zeroed = 0usize;
    let out: Vec<f32> = samples
        .iter()
        .map(|&v| {
            if v.abs() < threshold {
                zeroed += 1;
                0.0
            } else {
                v
            }
        })
        .collect();
    TrimOutcome::Trimmed {
        samples: out,
        zeroed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_index_enumeration_is_fixed() {
        assert_eq!(FilterKind::from_index(0), Ok(FilterKind::LowPass));
        assert_eq!(FilterKind::from_index(2), Ok(FilterKind::BandPass));
        assert_eq!(
            FilterKind::from_index(3),
            Err(EditError::UnknownFilterKind(3))
        );
    }

    #[test]
    fn pitch_shift_zero_semitones_is_identity() {
        let input: Vec<f32> = (0..256)
            .map(|i| (i as f32 * 0.1).sin() * 0.8)
            .collect();
        let out = pitch_shift(&input, 0.0);
        assert_eq!(out.len(), input.len());
        for (a, b) in input.iter().zip(&out) {
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
    }

    #[test]
    fn pitch_shift_up_moves_energy_to_higher_bins() {
        // 8 cycles over 512 samples -> bin 8. One octave up lands at bin 16.
        let n = 512;
        let input: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * 8.0 * i as f32 / n as f32).sin())
            .collect();
        let out = pitch_shift(&input, 12.0);

        let mut planner = FftPlanner::<f32>::new();
        let mut spec: Vec<Complex32> = out.iter().map(|&v| Complex32::new(v, 0.0)).collect();
        planner.plan_fft_forward(n).process(&mut spec);
        let peak_bin = spec[..n / 2]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().partial_cmp(&b.1.norm()).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_bin, 16);
    }

    #[test]
    fn pitch_shift_empty_input() {
        assert!(pitch_shift(&[], 3.0).is_empty());
    }

    #[test]
    fn trim_reference_scenario() {
        // ref = 0.9, threshold = 0.09: 0.05 and 0.01 are gated.
        let out = trim_amplitude(&[0.1, 0.5, -0.9, 0.05, 0.01], -20.0);
        assert_eq!(
            out,
            TrimOutcome::Trimmed {
                samples: vec![0.1, 0.5, -0.9, 0.0, 0.0],
                zeroed: 2
            }
        );
    }

    #[test]
    fn trim_at_zero_db_keeps_peak() {
        let out = trim_amplitude(&[0.2, -1.0, 0.5, 1.0], 0.0);
        assert_eq!(
            out,
            TrimOutcome::Trimmed {
                samples: vec![0.0, -1.0, 0.0, 1.0],
                zeroed: 2
            }
        );
    }

    #[test]
    fn trim_silent_buffer_is_noop() {
        assert_eq!(trim_amplitude(&[0.0, 0.0, 0.0], -20.0), TrimOutcome::SilentBuffer);
    }

    #[test]
    fn lowpass_smooths_alternating_signal() {
        let input: Vec<f32> = (0..2000).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let out = band_filter(&input, FilterKind::LowPass);
        // Nyquist-rate alternation is far above the 0.1 cutoff.
        let peak = out[200..1800].iter().fold(0.0f32, |m, &v| m.max(v.abs()));
        assert!(peak < 0.01, "peak {peak}");
    }
}
