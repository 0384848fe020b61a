//! Fixed Butterworth band filters applied zero-phase.
//!
//! The designs are computed the classical way: analog prototype poles, band
//! transform, bilinear transform, then paired into second-order sections.
//! Application is forward-backward (`sosfiltfilt`) with odd-extension padding
//! and steady-state initial conditions, so the filtered signal has no phase
//! distortion.

use rustfft::num_complex::Complex64;

/// One second-order section, `a0` normalized to 1.
#[derive(Clone, Copy, Debug)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 2],
}

/// Digital design inputs are normalized to Nyquist (0..1), matching the
/// fixed cutoffs in the edit operations.
pub fn butter_lowpass(order: usize, wn: f64) -> Vec<Biquad> {
    let (z, p, k) = lp2lp(prototype_poles(order), warp(wn));
    bilinear_sos(z, p, k)
}

pub fn butter_highpass(order: usize, wn: f64) -> Vec<Biquad> {
    let (z, p, k) = lp2hp(prototype_poles(order), warp(wn));
    bilinear_sos(z, p, k)
}

pub fn butter_bandpass(order: usize, lo: f64, hi: f64) -> Vec<Biquad> {
    let (z, p, k) = lp2bp(prototype_poles(order), warp(lo), warp(hi));
    bilinear_sos(z, p, k)
}

// Sampling frequency is fixed at 2 so band edges line up with the
// normalized-to-Nyquist convention.
const FS: f64 = 2.0;

fn warp(wn: f64) -> f64 {
    2.0 * FS * (std::f64::consts::PI * wn / FS).tan()
}

/// Analog Butterworth prototype: `order` poles on the unit circle in the
/// left half-plane, unit gain, no zeros.
fn prototype_poles(order: usize) -> Vec<Complex64> {
    (0..order)
        .map(|k| {
            let theta = std::f64::consts::PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
            Complex64::new(theta.cos(), theta.sin())
        })
        .collect()
}

type Zpk = (Vec<Complex64>, Vec<Complex64>, f64);

fn lp2lp(poles: Vec<Complex64>, w0: f64) -> Zpk {
    let n = poles.len();
    let p: Vec<_> = poles.into_iter().map(|pk| pk * w0).collect();
    (Vec::new(), p, w0.powi(n as i32))
}

fn lp2hp(poles: Vec<Complex64>, w0: f64) -> Zpk {
    let n = poles.len();
    // k_hp = k * Re(1/prod(-p)); unity for the Butterworth prototype,
    // computed anyway to keep the transform general.
    let prod: Complex64 = poles.iter().map(|pk| -pk).product();
    let p: Vec<_> = poles.into_iter().map(|pk| w0 / pk).collect();
    let z = vec![Complex64::new(0.0, 0.0); n];
    (z, p, (Complex64::new(1.0, 0.0) / prod).re)
}

fn lp2bp(poles: Vec<Complex64>, w1: f64, w2: f64) -> Zpk {
    let n = poles.len();
    let bw = w2 - w1;
    let w0sq = w1 * w2;
    let mut p = Vec::with_capacity(2 * n);
    for pk in poles {
        let scaled = pk * (bw / 2.0);
        let disc = (scaled * scaled - w0sq).sqrt();
        p.push(scaled + disc);
        p.push(scaled - disc);
    }
    let z = vec![Complex64::new(0.0, 0.0); n];
    (z, p, bw.powi(n as i32))
}

/// Bilinear transform into the z-domain, then pair conjugate poles into
/// second-order sections. Zeros left at infinity map to z = -1. The overall
/// gain lands in the first section.
fn bilinear_sos(zeros: Vec<Complex64>, poles: Vec<Complex64>, gain: f64) -> Vec<Biquad> {
    let fs2 = 2.0 * FS;
    let degree = poles.len() - zeros.len();

    let num: Complex64 = zeros.iter().map(|z| fs2 - z).product();
    let den: Complex64 = poles.iter().map(|p| fs2 - p).product();
    let k = gain * (num / den).re;

    let mut zd: Vec<Complex64> = zeros.iter().map(|z| (fs2 + z) / (fs2 - z)).collect();
    zd.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(degree));
    let pd: Vec<Complex64> = poles.iter().map(|p| (fs2 + p) / (fs2 - p)).collect();

    // Conjugate pairs: keep the upper-half-plane member of each pair, its
    // conjugate is implied. Real axis poles do not occur in these even-order
    // all-pole designs.
    let mut upper: Vec<Complex64> = pd.iter().copied().filter(|p| p.im > 1e-12).collect();
    upper.sort_by(|a, b| {
        b.norm()
            .partial_cmp(&a.norm())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Distribute the zeros two per section. For these designs every zero is
    // real (+1 or -1); hand out one of each kind per section while both
    // remain, which keeps band-pass sections as (z-1)(z+1).
    let mut at_plus: usize = zd.iter().filter(|z| z.re > 0.0).count();
    let mut at_minus = zd.len() - at_plus;

    let mut sos = Vec::with_capacity(upper.len());
    for p in upper {
        let (z1, z2) = if at_plus > 0 && at_minus > 0 {
            at_plus -= 1;
            at_minus -= 1;
            (1.0, -1.0)
        } else if at_plus >= 2 {
            at_plus -= 2;
            (1.0, 1.0)
        } else {
            at_minus = at_minus.saturating_sub(2);
            (-1.0, -1.0)
        };
        sos.push(Biquad {
            b: [1.0, -(z1 + z2), z1 * z2],
            a: [-2.0 * p.re, p.norm_sqr()],
        });
    }
    if let Some(first) = sos.first_mut() {
        for b in first.b.iter_mut() {
            *b *= k;
        }
    }
    sos
}

/// Steady-state initial state for one section (direct form II transposed),
/// for unit constant input.
fn section_zi(s: &Biquad) -> [f64; 2] {
    let k = (s.b[0] + s.b[1] + s.b[2]) / (1.0 + s.a[0] + s.a[1]);
    let z2 = s.b[2] - s.a[1] * k;
    let z1 = s.b[1] - s.a[0] * k + z2;
    [z1, z2]
}

fn sosfilt(sos: &[Biquad], x: &mut [f64], scale: f64) {
    let mut gain = scale;
    for s in sos {
        let zi = section_zi(s);
        let mut z1 = zi[0] * gain;
        let mut z2 = zi[1] * gain;
        for v in x.iter_mut() {
            let xin = *v;
            let y = s.b[0] * xin + z1;
            z1 = s.b[1] * xin - s.a[0] * y + z2;
            z2 = s.b[2] * xin - s.a[1] * y;
            *v = y;
        }
        // The next section sees this section's DC gain applied to the
        // steady-state reference.
        gain *= (s.b[0] + s.b[1] + s.b[2]) / (1.0 + s.a[0] + s.a[1]);
    }
}

/// Zero-phase forward-backward application with odd-extension padding.
pub fn sosfiltfilt(sos: &[Biquad], samples: &[f32]) -> Vec<f32> {
    let n = samples.len();
    if n == 0 || sos.is_empty() {
        return samples.to_vec();
    }
    let ntaps = 2 * sos.len() + 1;
    let edge = (3 * ntaps).min(n.saturating_sub(1));

    let mut ext = Vec::with_capacity(n + 2 * edge);
    let first = samples[0] as f64;
    let last = samples[n - 1] as f64;
    for i in (1..=edge).rev() {
        ext.push(2.0 * first - samples[i] as f64);
    }
    ext.extend(samples.iter().map(|&v| v as f64));
    for i in 1..=edge {
        ext.push(2.0 * last - samples[n - 1 - i] as f64);
    }

    let x0 = ext[0];
    sosfilt(sos, &mut ext, x0);
    ext.reverse();
    let x0 = ext[0];
    sosfilt(sos, &mut ext, x0);
    ext.reverse();

    ext[edge..edge + n].iter().map(|&v| v as f32).collect()
}
