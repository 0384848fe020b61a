/// Mono sample buffer, the unit every edit operates on.
///
/// Decoded audio is downmixed to mono before it reaches the editor, so the
/// buffer is a single channel of amplitudes in roughly [-1, 1]. Edits never
/// mutate a buffer across an undo boundary; they build a replacement.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        debug_assert!(sample_rate > 0, "sample rate must be positive");
        Self {
            samples,
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Owned copy of a sub-range, clamped to the buffer bounds.
    pub fn slice(&self, start: usize, end: usize) -> Vec<f32> {
        let end = end.min(self.samples.len());
        let start = start.min(end);
        self.samples[start..end].to_vec()
    }

    /// Replacement buffer with the same sample rate.
    pub fn with_samples(&self, samples: Vec<f32>) -> Self {
        Self::new(samples, self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_clamps_to_bounds() {
        let buf = AudioBuffer::new(vec![0.1, 0.2, 0.3], 1000);
        assert_eq!(buf.slice(1, 10), vec![0.2, 0.3]);
        assert_eq!(buf.slice(5, 10), Vec::<f32>::new());
    }

    #[test]
    fn duration_uses_rate() {
        let buf = AudioBuffer::new(vec![0.0; 2000], 1000);
        assert!((buf.duration_secs() - 2.0).abs() < 1e-6);
    }
}
