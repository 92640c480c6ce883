/// Interleaved PCM frames normalized to [-1.0, 1.0].
#[derive(Clone, Debug, PartialEq)]
pub struct PcmBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl PcmBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Explicit silence: no frames at the given format.
    pub fn empty(sample_rate: u32, channels: u16) -> Self {
        Self::new(Vec::new(), sample_rate, channels)
    }

    /// Build an interleaved buffer from one vector per channel.
    ///
    /// All channels are truncated to the shortest one.
    pub fn from_planar(planar: &[Vec<f64>], sample_rate: u32) -> Self {
        let channels = planar.len().max(1);
        let frames = planar.iter().map(Vec::len).min().unwrap_or(0);
        let mut samples = Vec::with_capacity(frames * channels);
        for frame in 0..frames {
            for channel in planar {
                samples.push(channel[frame] as f32);
            }
        }
        Self::new(samples, sample_rate, channels as u16)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Split into one `f64` vector per channel.
    pub fn to_planar(&self) -> Vec<Vec<f64>> {
        let channels = self.channels.max(1) as usize;
        let mut planar = vec![Vec::with_capacity(self.frames()); channels];
        for frame in self.samples.chunks_exact(channels) {
            for (channel, &sample) in planar.iter_mut().zip(frame) {
                channel.push(sample as f64);
            }
        }
        planar
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
    }

    /// Clamp every sample into the normalized range, mapping NaN to silence.
    pub fn clamp(&mut self) {
        for s in &mut self.samples {
            *s = if s.is_finite() { s.clamp(-1.0, 1.0) } else { 0.0 };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_creates_buffer_with_correct_fields() {
        let samples = vec![0.0f32; 480];
        let pcm = PcmBuffer::new(samples.clone(), 48000, 1);
        assert_eq!(pcm.samples(), &samples[..]);
        assert_eq!(pcm.sample_rate(), 48000);
        assert_eq!(pcm.channels(), 1);
    }

    #[test]
    fn test_frames_and_duration_stereo() {
        let pcm = PcmBuffer::new(vec![0.0; 96000], 48000, 2);
        assert_eq!(pcm.frames(), 48000);
        assert_relative_eq!(pcm.duration(), 1.0);
    }

    #[test]
    fn test_empty_is_silence() {
        let pcm = PcmBuffer::empty(48000, 2);
        assert!(pcm.is_empty());
        assert_eq!(pcm.frames(), 0);
        assert_eq!(pcm.channels(), 2);
    }

    #[test]
    fn test_planar_round_trip_preserves_interleaving() {
        let pcm = PcmBuffer::new(vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3], 48000, 2);
        let planar = pcm.to_planar();
        assert_eq!(planar.len(), 2);
        assert_relative_eq!(planar[0][2], 0.3f32 as f64);
        assert_relative_eq!(planar[1][1], -0.2f32 as f64);

        let back = PcmBuffer::from_planar(&planar, 48000);
        assert_eq!(back, pcm);
    }

    #[test]
    fn test_from_planar_truncates_to_shortest_channel() {
        let planar = vec![vec![0.5; 10], vec![0.25; 7]];
        let pcm = PcmBuffer::from_planar(&planar, 48000);
        assert_eq!(pcm.frames(), 7);
    }

    #[test]
    fn test_clamp_limits_range_and_removes_nan() {
        let mut pcm = PcmBuffer::new(vec![1.5, -2.0, f32::NAN, 0.25], 48000, 1);
        pcm.clamp();
        assert_eq!(pcm.samples(), &[1.0, -1.0, 0.0, 0.25]);
    }

    #[test]
    fn test_peak() {
        let pcm = PcmBuffer::new(vec![0.1, -0.7, 0.3], 48000, 1);
        assert_relative_eq!(pcm.peak(), 0.7);
    }
}
