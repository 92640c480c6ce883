use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Analysis/synthesis window size.
pub(crate) const WINDOW_SIZE: usize = 2048;

/// Hop between successive frames (75 % overlap).
pub(crate) const HOP_SIZE: usize = 512;

/// Bins from DC to Nyquist inclusive.
pub(crate) const HALF_WINDOW: usize = WINDOW_SIZE / 2 + 1;

/// Short-time Fourier analysis and weighted overlap-add resynthesis.
///
/// The signal is padded so every input sample is covered by the same number
/// of frames; the first and last samples are reconstructed with full
/// overlap rather than faded out.
pub(crate) struct Stft {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    hann: Vec<f64>,
}

impl Stft {
    pub(crate) fn new() -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let hann = (0..WINDOW_SIZE)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / WINDOW_SIZE as f64).cos()))
            .collect();
        Self {
            forward: planner.plan_fft_forward(WINDOW_SIZE),
            inverse: planner.plan_fft_inverse(WINDOW_SIZE),
            hann,
        }
    }

    /// Run `modify` on every frame and return a signal of the input's length.
    ///
    /// `modify` receives the windowed time-domain frame and its spectrum; it
    /// rewrites bins `0..HALF_WINDOW` and the negative frequencies are
    /// mirrored from them afterwards.
    pub(crate) fn process<F>(&self, samples: &[f64], mut modify: F) -> Vec<f64>
    where
        F: FnMut(&[f64], &mut [Complex<f64>]),
    {
        let n = samples.len();
        if n == 0 {
            return Vec::new();
        }

        let lead = WINDOW_SIZE - HOP_SIZE;
        let total = lead + n + WINDOW_SIZE;
        let mut padded = vec![0.0f64; total];
        padded[lead..lead + n].copy_from_slice(samples);

        let mut output = vec![0.0f64; total];
        let mut window_sum = vec![0.0f64; total];
        let mut frame = vec![0.0f64; WINDOW_SIZE];
        let mut spectrum = vec![Complex::new(0.0, 0.0); WINDOW_SIZE];
        let norm = 1.0 / WINDOW_SIZE as f64;

        let num_frames = (total - WINDOW_SIZE) / HOP_SIZE + 1;
        for frame_idx in 0..num_frames {
            let start = frame_idx * HOP_SIZE;

            for (i, (dst, &w)) in frame.iter_mut().zip(&self.hann).enumerate() {
                *dst = padded[start + i] * w;
            }
            for (bin, &s) in spectrum.iter_mut().zip(&frame) {
                *bin = Complex::new(s, 0.0);
            }
            self.forward.process(&mut spectrum);

            modify(&frame, &mut spectrum);

            // Conjugate symmetry keeps the resynthesized frame real.
            for k in 1..HALF_WINDOW - 1 {
                spectrum[WINDOW_SIZE - k] = spectrum[k].conj();
            }
            self.inverse.process(&mut spectrum);

            for (i, &w) in self.hann.iter().enumerate() {
                let val = spectrum[i].re * norm * w;
                if val.is_finite() {
                    output[start + i] += val;
                }
                window_sum[start + i] += w * w;
            }
        }

        (lead..lead + n)
            .map(|i| {
                if window_sum[i] > 1e-9 {
                    output[i] / window_sum[i]
                } else {
                    0.0
                }
            })
            .collect()
    }
}

/// Scale `output` down so its peak does not exceed `input_peak`.
pub(crate) fn limit_to_peak(output: &mut [Vec<f64>], input_peak: f64) {
    let output_peak = output
        .iter()
        .flat_map(|ch| ch.iter())
        .map(|s| s.abs())
        .fold(0.0f64, f64::max);
    if output_peak > 1e-10 && output_peak > input_peak {
        let gain = input_peak / output_peak;
        for s in output.iter_mut().flat_map(|ch| ch.iter_mut()) {
            *s *= gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_passthrough_reconstructs_every_sample() {
        let samples: Vec<f64> = (0..5000).map(|i| ((i as f64) * 0.031).sin() * 0.7).collect();
        let out = Stft::new().process(&samples, |_, _| {});
        assert_eq!(out.len(), samples.len());
        for (a, b) in samples.iter().zip(&out) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_edges_are_not_faded() {
        let samples = vec![0.5f64; 3000];
        let out = Stft::new().process(&samples, |_, _| {});
        assert_abs_diff_eq!(out[0], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(out[2999], 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_shorter_than_window() {
        let samples = vec![0.25f64; 100];
        let out = Stft::new().process(&samples, |_, _| {});
        assert_eq!(out.len(), 100);
        assert_abs_diff_eq!(out[50], 0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_input() {
        assert!(Stft::new().process(&[], |_, _| {}).is_empty());
    }

    #[test]
    fn test_limit_to_peak_only_attenuates() {
        let mut loud = vec![vec![0.5, -1.0], vec![0.25]];
        limit_to_peak(&mut loud, 0.5);
        assert_abs_diff_eq!(loud[0][1], -0.5);
        assert_abs_diff_eq!(loud[1][0], 0.125);

        let mut quiet = vec![vec![0.1]];
        limit_to_peak(&mut quiet, 0.5);
        assert_abs_diff_eq!(quiet[0][0], 0.1);
    }
}
