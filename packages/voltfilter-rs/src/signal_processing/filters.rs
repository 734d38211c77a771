//! Digital Filter Implementations
//!
//! Butterworth low-pass design via second-order sections, expanded into a
//! single transfer function, and zero-phase (forward-backward) application.

use crate::error::{PipelineError, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Orders above this lose precision once the sections are multiplied out
pub const MAX_FILTER_ORDER: usize = 8;

/// Configuration for the low-pass stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LowpassConfig {
    /// Filter order
    #[serde(default = "default_order")]
    pub order: usize,
    /// Cutoff frequency in Hz
    #[serde(default = "default_cutoff_hz")]
    pub cutoff_hz: f64,
    /// Sampling rate in Hz
    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: f64,
}

fn default_order() -> usize {
    4
}
fn default_cutoff_hz() -> f64 {
    50.0
}
fn default_sample_rate_hz() -> f64 {
    500.0
}

impl Default for LowpassConfig {
    fn default() -> Self {
        Self {
            order: default_order(),
            cutoff_hz: default_cutoff_hz(),
            sample_rate_hz: default_sample_rate_hz(),
        }
    }
}

impl LowpassConfig {
    pub fn nyquist(&self) -> f64 {
        self.sample_rate_hz / 2.0
    }

    /// Cutoff as a fraction of the Nyquist frequency
    pub fn normalized_cutoff(&self) -> f64 {
        self.cutoff_hz / self.nyquist()
    }

    pub fn validate(&self) -> Result<()> {
        if self.order == 0 || self.order > MAX_FILTER_ORDER {
            return Err(PipelineError::Configuration(format!(
                "filter order must be between 1 and {}, got {}",
                MAX_FILTER_ORDER, self.order
            )));
        }
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(PipelineError::Configuration(format!(
                "sample rate must be positive, got {} Hz",
                self.sample_rate_hz
            )));
        }
        let wn = self.normalized_cutoff();
        if !(wn > 0.0 && wn < 1.0) {
            return Err(PipelineError::Configuration(format!(
                "cutoff frequency must be within (0, Nyquist): {} Hz with Nyquist {} Hz",
                self.cutoff_hz,
                self.nyquist()
            )));
        }
        Ok(())
    }
}

/// Second-order section (biquad) coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

/// Feed-forward (`b`) and feed-back (`a`) polynomial coefficients, `a[0] == 1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferFunction {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

impl TransferFunction {
    /// Build from raw polynomials, normalising so that `a[0] == 1` and both
    /// polynomials have the same length
    pub fn new(mut b: Vec<f64>, mut a: Vec<f64>) -> Result<Self> {
        let a0 = a.first().copied().unwrap_or(0.0);
        if a0 == 0.0 || !a0.is_finite() || b.is_empty() {
            return Err(PipelineError::Configuration(
                "transfer function needs a non-zero leading denominator coefficient".to_string(),
            ));
        }
        if a0 != 1.0 {
            b.iter_mut().for_each(|c| *c /= a0);
            a.iter_mut().for_each(|c| *c /= a0);
        }
        let len = a.len().max(b.len());
        b.resize(len, 0.0);
        a.resize(len, 0.0);
        Ok(Self { b, a })
    }

    /// Multiply cascaded sections into a single transfer function
    pub fn from_sections(sections: &[BiquadCoeffs]) -> Result<Self> {
        let mut b = vec![1.0];
        let mut a = vec![1.0];
        for s in sections {
            b = convolve(&b, &[s.b0, s.b1, s.b2]);
            a = convolve(&a, &[1.0, s.a1, s.a2]);
        }
        // First-order sections carry a zero z^-2 term
        while b.len() > 1 && a.len() > 1 && b[b.len() - 1] == 0.0 && a[a.len() - 1] == 0.0 {
            b.pop();
            a.pop();
        }
        Self::new(b, a)
    }

    /// Number of coefficients per polynomial
    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// Edge padding used by zero-phase filtering: three times the coefficient count
    pub fn padlen(&self) -> usize {
        3 * self.a.len().max(self.b.len())
    }
}

fn convolve(p: &[f64], q: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; p.len() + q.len() - 1];
    for (i, &x) in p.iter().enumerate() {
        for (j, &y) in q.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Butterworth filter designer
pub struct ButterworthFilter;

impl ButterworthFilter {
    /// Design a Butterworth lowpass filter as a single transfer function
    pub fn lowpass(config: &LowpassConfig) -> Result<TransferFunction> {
        config.validate()?;
        let wn = Self::prewarp(config.cutoff_hz, config.sample_rate_hz);
        TransferFunction::from_sections(&Self::design_lowpass(wn, config.order))
    }

    /// Prewarp frequency for bilinear transform
    fn prewarp(freq: f64, sample_rate: f64) -> f64 {
        (PI * freq / sample_rate).tan()
    }

    /// Design lowpass second-order sections
    pub fn design_lowpass(wn: f64, order: usize) -> Vec<BiquadCoeffs> {
        let num_sections = (order + 1) / 2;
        let mut sections = Vec::with_capacity(num_sections);

        for k in 0..num_sections {
            // For odd order, last section is first-order
            if order % 2 == 1 && k == num_sections - 1 {
                // First-order section: H(s) = wn / (s + wn)
                let k_coeff = wn / (1.0 + wn);
                sections.push(BiquadCoeffs {
                    b0: k_coeff,
                    b1: k_coeff,
                    b2: 0.0,
                    a1: (wn - 1.0) / (wn + 1.0),
                    a2: 0.0,
                });
            } else {
                // Conjugate pole pair: s^2 + 2*sin(theta)*wn*s + wn^2
                let theta = PI * (2.0 * k as f64 + 1.0) / (2.0 * order as f64);
                let damping = 2.0 * theta.sin();
                let wn2 = wn * wn;
                let denom = 1.0 + damping * wn + wn2;

                let b0 = wn2 / denom;
                let b1 = 2.0 * wn2 / denom;
                let b2 = wn2 / denom;
                let a1 = 2.0 * (wn2 - 1.0) / denom;
                let a2 = (1.0 - damping * wn + wn2) / denom;

                sections.push(BiquadCoeffs { b0, b1, b2, a1, a2 });
            }
        }

        sections
    }
}

/// Steady-state initial conditions for a unit step input
///
/// Solves `(I - companion(a)^T) zi = b[1..] - a[1..] * b[0]`.
pub fn lfilter_zi(tf: &TransferFunction) -> Result<Vec<f64>> {
    let n = tf.len();
    if n < 2 {
        return Ok(Vec::new());
    }
    let m = n - 1;
    let (b, a) = (&tf.b, &tf.a);

    let mut system = DMatrix::<f64>::identity(m, m);
    for row in 0..m {
        system[(row, 0)] += a[row + 1];
    }
    for col in 1..m {
        system[(col - 1, col)] -= 1.0;
    }
    let rhs = DVector::from_iterator(m, (0..m).map(|i| b[i + 1] - a[i + 1] * b[0]));

    let zi = system.lu().solve(&rhs).ok_or_else(|| {
        PipelineError::Internal("filter initial-condition system is singular".to_string())
    })?;

    Ok(zi.iter().copied().collect())
}

/// Causal IIR filtering (Direct Form II Transposed) from initial state `zi`
pub fn lfilter(tf: &TransferFunction, signal: &[f64], zi: &[f64]) -> Vec<f64> {
    let (b, a) = (&tf.b, &tf.a);
    let order = tf.len().saturating_sub(1);
    let mut state = vec![0.0; order];
    state
        .iter_mut()
        .zip(zi)
        .for_each(|(s, &z)| *s = z);

    let mut output = Vec::with_capacity(signal.len());
    for &x in signal {
        let y = b[0] * x + state.first().copied().unwrap_or(0.0);
        for i in 0..order {
            let next = if i + 1 < order { state[i + 1] } else { 0.0 };
            state[i] = b[i + 1] * x + next - a[i + 1] * y;
        }
        output.push(y);
    }
    output
}

/// Zero-phase forward-backward filtering
///
/// Both ends are padded by odd reflection of `padlen` samples and each pass
/// starts from steady-state conditions matched to its first sample, so the
/// output has neither phase shift nor start-up transients.
///
/// # Errors
/// `InsufficientLength` unless `signal.len() > tf.padlen()`.
pub fn filtfilt(tf: &TransferFunction, signal: &[f64]) -> Result<Vec<f64>> {
    let edge = tf.padlen();
    let n = signal.len();
    if n <= edge {
        return Err(PipelineError::InsufficientLength {
            len: n,
            min: edge + 1,
        });
    }

    let first = signal[0];
    let last = signal[n - 1];
    let mut extended = Vec::with_capacity(n + 2 * edge);
    extended.extend((1..=edge).rev().map(|i| 2.0 * first - signal[i]));
    extended.extend_from_slice(signal);
    extended.extend((1..=edge).map(|i| 2.0 * last - signal[n - 1 - i]));

    let zi = lfilter_zi(tf)?;

    let x0 = extended[0];
    let forward_zi: Vec<f64> = zi.iter().map(|z| z * x0).collect();
    let mut forward = lfilter(tf, &extended, &forward_zi);
    forward.reverse();

    let y0 = forward[0];
    let backward_zi: Vec<f64> = zi.iter().map(|z| z * y0).collect();
    let mut backward = lfilter(tf, &forward, &backward_zi);
    backward.reverse();

    Ok(backward[edge..edge + n].to_vec())
}

/// Zero-phase Butterworth low-pass stage
#[derive(Debug, Clone)]
pub struct ZeroPhaseLowpass {
    config: LowpassConfig,
    coeffs: TransferFunction,
}

impl ZeroPhaseLowpass {
    pub fn new(config: LowpassConfig) -> Result<Self> {
        let coeffs = ButterworthFilter::lowpass(&config)?;
        Ok(Self { config, coeffs })
    }

    pub fn config(&self) -> &LowpassConfig {
        &self.config
    }

    pub fn coefficients(&self) -> &TransferFunction {
        &self.coeffs
    }

    /// Shortest series this stage accepts
    pub fn min_length(&self) -> usize {
        self.coeffs.padlen() + 1
    }

    pub fn apply(&self, signal: &[f64]) -> Result<Vec<f64>> {
        filtfilt(&self.coeffs, signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < tol, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn test_order4_coefficients() {
        let tf = ButterworthFilter::lowpass(&LowpassConfig::default()).unwrap();
        assert_close(
            &tf.b,
            &[
                0.004824343357716227,
                0.01929737343086491,
                0.028946060146297362,
                0.01929737343086491,
                0.004824343357716227,
            ],
            1e-12,
        );
        assert_close(
            &tf.a,
            &[
                1.0,
                -2.369513007182038,
                2.3139884144158804,
                -1.0546654058785678,
                0.1873794923681849,
            ],
            1e-12,
        );
        let dc_gain = tf.b.iter().sum::<f64>() / tf.a.iter().sum::<f64>();
        assert!((dc_gain - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_odd_order_has_order_plus_one_coefficients() {
        let config = LowpassConfig {
            order: 3,
            ..Default::default()
        };
        let tf = ButterworthFilter::lowpass(&config).unwrap();
        assert_eq!(tf.len(), 4);
        assert_close(
            &tf.a,
            &[1.0, -1.7600418803431692, 1.182893262037831, -0.2780599176345465],
            1e-12,
        );
    }

    #[test]
    fn test_cutoff_must_be_below_nyquist() {
        for cutoff in [0.0, -5.0, 250.0, 400.0] {
            let config = LowpassConfig {
                cutoff_hz: cutoff,
                ..Default::default()
            };
            let err = ButterworthFilter::lowpass(&config).unwrap_err();
            assert!(matches!(err, PipelineError::Configuration(_)));
            assert!(err.to_string().contains("(0, Nyquist)"));
        }
    }

    #[test]
    fn test_order_bounds() {
        for order in [0, MAX_FILTER_ORDER + 1] {
            let config = LowpassConfig {
                order,
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_lfilter_zi() {
        let tf = ButterworthFilter::lowpass(&LowpassConfig::default()).unwrap();
        let zi = lfilter_zi(&tf).unwrap();
        assert_close(
            &zi,
            &[
                0.995175656642285,
                -1.3936347239706206,
                0.8914076302989653,
                -0.1825551490104689,
            ],
            1e-10,
        );
    }

    #[test]
    fn test_step_from_steady_state_stays_flat() {
        let tf = ButterworthFilter::lowpass(&LowpassConfig::default()).unwrap();
        let zi = lfilter_zi(&tf).unwrap();
        let out = lfilter(&tf, &[1.0; 50], &zi);
        assert!(out.iter().all(|y| (y - 1.0).abs() < 1e-9));
    }

    #[test]
    fn test_filtfilt_preserves_dc() {
        let tf = ButterworthFilter::lowpass(&LowpassConfig::default()).unwrap();
        let out = filtfilt(&tf, &[3.0; 20]).unwrap();
        assert_eq!(out.len(), 20);
        assert!(out.iter().all(|y| (y - 3.0).abs() < 1e-9));
    }

    #[test]
    fn test_filtfilt_matches_reference_values() {
        let tf = ButterworthFilter::lowpass(&LowpassConfig::default()).unwrap();
        let signal: Vec<f64> = (0..40).map(|i| (i as f64 / 7.0).sin() + 0.5).collect();
        let out = filtfilt(&tf, &signal).unwrap();
        assert_close(
            &out[..4],
            &[
                0.5007644638194837,
                0.6424817713488797,
                0.781504050631197,
                0.9150544117999941,
            ],
            1e-9,
        );
        assert_close(&out[38..], &[-0.24838005032743857, -0.1532766365350738], 1e-9);
    }

    #[test]
    fn test_filtfilt_minimum_length() {
        let filter = ZeroPhaseLowpass::new(LowpassConfig::default()).unwrap();
        assert_eq!(filter.min_length(), 16);
        assert_eq!(filter.coefficients().len(), filter.config().order + 1);
        assert!(filter.apply(&[0.0; 16]).is_ok());
        let err = filter.apply(&[0.0; 15]).unwrap_err();
        assert_eq!(err, PipelineError::InsufficientLength { len: 15, min: 16 });
    }

    #[test]
    fn test_attenuates_high_frequency() {
        let filter = ZeroPhaseLowpass::new(LowpassConfig::default()).unwrap();
        let sample_rate = 500.0;
        let signal: Vec<f64> = (0..1000)
            .map(|i| (2.0 * PI * 200.0 * i as f64 / sample_rate).sin())
            .collect();

        let filtered = filter.apply(&signal).unwrap();

        // Ignore the edges, where the odd extension leaves a short transient
        let rms = |x: &[f64]| (x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64).sqrt();
        let input_rms = rms(&signal[50..950]);
        let output_rms = rms(&filtered[50..950]);

        assert!(
            output_rms < input_rms * 1e-4,
            "Lowpass filter should attenuate 200Hz"
        );
    }

    #[test]
    fn test_passes_low_frequency() {
        let filter = ZeroPhaseLowpass::new(LowpassConfig::default()).unwrap();
        let signal: Vec<f64> = (0..1000)
            .map(|i| (2.0 * PI * 5.0 * i as f64 / 500.0).sin())
            .collect();

        let filtered = filter.apply(&signal).unwrap();

        for (x, y) in signal.iter().zip(&filtered) {
            assert!((x - y).abs() < 0.01);
        }
    }
}
