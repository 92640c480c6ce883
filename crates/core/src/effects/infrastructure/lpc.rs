//! Linear-prediction helpers for spectral envelope estimation.

use std::f64::consts::PI;

/// Autocorrelation of `x` for lags `0..=order`.
pub(crate) fn autocorrelation(x: &[f64], order: usize) -> Vec<f64> {
    (0..=order)
        .map(|lag| {
            x.iter()
                .zip(x.iter().skip(lag))
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// Levinson-Durbin recursion.
///
/// Returns the predictor polynomial (`a[0] == 1`, length `order + 1`) and
/// the residual prediction error. Reflection coefficients are clamped just
/// inside the unit circle so the synthesis filter stays stable.
pub(crate) fn levinson_durbin(r: &[f64], order: usize) -> (Vec<f64>, f64) {
    let mut a = vec![0.0; order + 1];
    let mut prev = vec![0.0; order + 1];
    a[0] = 1.0;
    prev[0] = 1.0;

    let mut error = r[0];
    if error.abs() < 1e-30 {
        return (a, error);
    }

    for i in 1..=order {
        let acc: f64 = (0..i).map(|j| prev[j] * r[i - j]).sum();
        let k = (-acc / error).clamp(-0.999, 0.999);

        for j in 0..=i {
            a[j] = prev[j] + k * prev[i - j];
        }

        error *= 1.0 - k * k;
        if error.abs() < 1e-30 {
            break;
        }
        prev[..=i].copy_from_slice(&a[..=i]);
    }

    (a, error)
}

/// Magnitude of `gain / A(e^jw)` sampled at `bins` points from DC to Nyquist.
pub(crate) fn spectral_envelope(a: &[f64], gain: f64, bins: usize) -> Vec<f64> {
    let last = bins.saturating_sub(1).max(1) as f64;
    (0..bins)
        .map(|k| {
            let omega = PI * k as f64 / last;
            let (re, im) = a.iter().enumerate().fold((0.0, 0.0), |(re, im), (i, &c)| {
                let phase = omega * i as f64;
                (re + c * phase.cos(), im - c * phase.sin())
            });
            let mag = (re * re + im * im).sqrt();
            if mag > 1e-15 {
                gain / mag
            } else {
                gain * 1e15
            }
        })
        .collect()
}

/// Stretch an envelope along frequency by `ratio` with linear interpolation.
///
/// `ratio > 1` moves spectral peaks up.
pub(crate) fn warp_envelope(envelope: &[f64], ratio: f64) -> Vec<f64> {
    let n = envelope.len();
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|k| {
            let src = k as f64 / ratio;
            let idx = src.floor() as usize;
            let frac = src - idx as f64;
            if idx + 1 < n {
                envelope[idx] * (1.0 - frac) + envelope[idx + 1] * frac
            } else {
                envelope[n - 1]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_autocorrelation_lag_zero_is_energy() {
        let x = [1.0, -2.0, 3.0];
        let r = autocorrelation(&x, 2);
        assert_relative_eq!(r[0], 14.0);
        assert_relative_eq!(r[1], -8.0);
        assert_relative_eq!(r[2], 3.0);
    }

    #[test]
    fn test_levinson_recovers_first_order_predictor() {
        // AR(1) process with coefficient 0.5: r[k] = 0.5^k.
        let r = [1.0, 0.5, 0.25];
        let (a, error) = levinson_durbin(&r, 2);
        assert_relative_eq!(a[0], 1.0);
        assert_relative_eq!(a[1], -0.5, epsilon = 1e-12);
        assert_relative_eq!(a[2], 0.0, epsilon = 1e-12);
        assert_relative_eq!(error, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_silent_frame_gives_trivial_predictor() {
        let (a, error) = levinson_durbin(&[0.0, 0.0, 0.0], 2);
        assert_eq!(a, vec![1.0, 0.0, 0.0]);
        assert_eq!(error, 0.0);
    }

    #[test]
    fn test_flat_predictor_gives_flat_envelope() {
        let env = spectral_envelope(&[1.0], 2.0, 16);
        assert!(env.iter().all(|&v| (v - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_warp_moves_peak_up() {
        let mut env = vec![0.1; 100];
        env[20] = 1.0;
        let warped = warp_envelope(&env, 1.5);
        let peak = warped
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 30);
    }

    #[test]
    fn test_unity_warp_is_identity() {
        let env: Vec<f64> = (0..50).map(|i| i as f64).collect();
        assert_eq!(warp_envelope(&env, 1.0), env);
    }
}
