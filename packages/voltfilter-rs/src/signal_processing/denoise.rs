//! Wavelet shrinkage denoising
//!
//! Noise is estimated from the finest detail band, every detail band is
//! soft-thresholded with the universal threshold, and the series is rebuilt
//! at its original length.

use super::wavelet::{wavedec, waverec, Wavelet, WaveletCoeffs};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the wavelet stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DenoiseConfig {
    #[serde(default)]
    pub wavelet: Wavelet,
    /// Number of detail bands to decompose into
    #[serde(default = "default_level")]
    pub level: usize,
}

/// Deepest decomposition accepted; `(L - 1) << level` must fit in a `usize`
/// for every supported wavelet.
pub const MAX_DECOMPOSITION_LEVEL: usize = usize::BITS as usize - 4;

fn default_level() -> usize {
    4
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            wavelet: Wavelet::default(),
            level: default_level(),
        }
    }
}

impl DenoiseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.level == 0 {
            return Err(PipelineError::Configuration(
                "decomposition level must be at least 1".to_string(),
            ));
        }
        if self.level > MAX_DECOMPOSITION_LEVEL {
            return Err(PipelineError::Configuration(format!(
                "decomposition level {} exceeds the maximum of {}",
                self.level, MAX_DECOMPOSITION_LEVEL
            )));
        }
        Ok(())
    }

    /// Shortest series that supports the configured depth.
    ///
    /// Saturates at `usize::MAX` for levels no series could reach.
    pub fn min_length(&self) -> usize {
        let base = self.wavelet.filter_len() - 1;
        u32::try_from(self.level)
            .ok()
            .filter(|&shift| shift <= base.leading_zeros())
            .map_or(usize::MAX, |shift| base << shift)
    }
}

/// Output of the wavelet stage
#[derive(Debug, Clone)]
pub struct Denoised {
    pub series: Vec<f64>,
    /// Estimated noise standard deviation
    pub sigma: f64,
    /// Threshold applied to the detail bands
    pub threshold: f64,
}

#[derive(Debug)]
pub struct WaveletDenoiser {
    config: DenoiseConfig,
}

impl WaveletDenoiser {
    pub fn new(config: DenoiseConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DenoiseConfig {
        &self.config
    }

    pub fn decompose(&self, signal: &[f64]) -> Result<WaveletCoeffs> {
        wavedec(signal, self.config.wavelet, self.config.level)
    }

    pub fn denoise(&self, signal: &[f64]) -> Result<Denoised> {
        let mut coeffs = self.decompose(signal)?;

        let sigma = noise_sigma(coeffs.finest_detail());
        let threshold = universal_threshold(sigma, signal.len());
        log::debug!(
            "{} level {}: sigma={:.6}, threshold={:.6}",
            self.config.wavelet,
            self.config.level,
            sigma,
            threshold
        );

        for band in coeffs.details_mut() {
            band.iter_mut().for_each(|c| *c = soft_threshold(*c, threshold));
        }

        let rebuilt = waverec(&coeffs, self.config.wavelet)?;

        Ok(Denoised {
            series: fit_length(rebuilt, signal.len()),
            sigma,
            threshold,
        })
    }
}

/// Population standard deviation of a coefficient band
pub fn noise_sigma(band: &[f64]) -> f64 {
    if band.is_empty() {
        return 0.0;
    }
    let n = band.len() as f64;
    let mean = band.iter().sum::<f64>() / n;
    let variance = band.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// `sigma * sqrt(2 * ln(n))`
pub fn universal_threshold(sigma: f64, n: usize) -> f64 {
    if n < 2 {
        return 0.0;
    }
    sigma * (2.0 * (n as f64).ln()).sqrt()
}

/// Shrink `value` toward zero by `threshold`, keeping its sign
#[inline]
pub fn soft_threshold(value: f64, threshold: f64) -> f64 {
    let shrunk = value.abs() - threshold;
    if shrunk > 0.0 {
        value.signum() * shrunk
    } else {
        0.0
    }
}

/// Trim trailing samples or repeat the last one so the series has exactly `len` samples
pub fn fit_length(mut series: Vec<f64>, len: usize) -> Vec<f64> {
    if series.len() >= len {
        series.truncate(len);
    } else {
        let fill = series.last().copied().unwrap_or(0.0);
        series.resize(len, fill);
    }
    series
}
