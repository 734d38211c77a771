//! Discrete Wavelet Transform
//!
//! Orthogonal Daubechies filter banks with multilevel decomposition and
//! reconstruction. Boundaries use half-sample symmetric extension, so each
//! level of a length-`n` signal yields `(n + L - 1) / 2` coefficients for a
//! filter of length `L`.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const HAAR: [f64; 2] = [
    std::f64::consts::FRAC_1_SQRT_2,
    std::f64::consts::FRAC_1_SQRT_2,
];

const DB2: [f64; 4] = [
    -0.12940952255092145,
    0.22414386804185735,
    0.836516303737469,
    0.48296291314469025,
];

const DB4: [f64; 8] = [
    -0.010597401784997278,
    0.032883011666982945,
    0.030841381835986965,
    -0.18703481171888114,
    -0.02798376941698385,
    0.6308807679295904,
    0.7148465705525415,
    0.23037781330885523,
];

const DB6: [f64; 12] = [
    -0.00107730108499558,
    0.004777257511010651,
    0.0005538422009938016,
    -0.031582039318031156,
    0.02752286553001629,
    0.09750160558707936,
    -0.12976686756709563,
    -0.22626469396516913,
    0.3152503517092432,
    0.7511339080215775,
    0.4946238903983854,
    0.11154074335008017,
];

/// Supported wavelet families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wavelet {
    Haar,
    Db2,
    Db4,
    /// Daubechies with 6 vanishing moments (12 taps)
    #[default]
    Db6,
}

impl Wavelet {
    /// Parse a wavelet from its case-insensitive short name (`"db6"`, `"haar"`, ...)
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "haar" | "db1" => Ok(Self::Haar),
            "db2" => Ok(Self::Db2),
            "db4" => Ok(Self::Db4),
            "db6" => Ok(Self::Db6),
            _ => Err(PipelineError::Configuration(format!(
                "unsupported wavelet: {}",
                name
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Haar => "haar",
            Self::Db2 => "db2",
            Self::Db4 => "db4",
            Self::Db6 => "db6",
        }
    }

    /// Number of filter taps
    pub fn filter_len(&self) -> usize {
        self.decomposition_low().len()
    }

    /// Decomposition low-pass filter, in convolution order
    fn decomposition_low(&self) -> &'static [f64] {
        match self {
            Self::Haar => &HAAR,
            Self::Db2 => &DB2,
            Self::Db4 => &DB4,
            Self::Db6 => &DB6,
        }
    }

    /// Build the four analysis/synthesis filters of the quadrature mirror bank
    pub fn filter_bank(&self) -> FilterBank {
        let dec_lo = self.decomposition_low().to_vec();
        let rec_lo: Vec<f64> = dec_lo.iter().rev().copied().collect();
        let dec_hi: Vec<f64> = rec_lo
            .iter()
            .enumerate()
            .map(|(k, &c)| if k % 2 == 0 { -c } else { c })
            .collect();
        let rec_hi: Vec<f64> = dec_hi.iter().rev().copied().collect();

        FilterBank {
            dec_lo,
            dec_hi,
            rec_lo,
            rec_hi,
        }
    }
}

impl fmt::Display for Wavelet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Analysis and synthesis filters for one wavelet
#[derive(Debug, Clone)]
pub struct FilterBank {
    pub dec_lo: Vec<f64>,
    pub dec_hi: Vec<f64>,
    pub rec_lo: Vec<f64>,
    pub rec_hi: Vec<f64>,
}

impl FilterBank {
    pub fn len(&self) -> usize {
        self.dec_lo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dec_lo.is_empty()
    }
}

/// Multilevel coefficient set: `[cA_n, cD_n, ..., cD_1]`
///
/// The approximation band comes first, detail bands follow from the coarsest
/// to the finest, so the last band is always the highest-frequency detail.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveletCoeffs {
    bands: Vec<Vec<f64>>,
}

impl WaveletCoeffs {
    pub fn from_bands(bands: Vec<Vec<f64>>) -> Self {
        Self { bands }
    }

    /// Decomposition depth (number of detail bands)
    pub fn level(&self) -> usize {
        self.bands.len().saturating_sub(1)
    }

    pub fn bands(&self) -> &[Vec<f64>] {
        &self.bands
    }

    pub fn approximation(&self) -> &[f64] {
        self.bands.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn details(&self) -> &[Vec<f64>] {
        let start = self.bands.len().min(1);
        &self.bands[start..]
    }

    pub fn details_mut(&mut self) -> &mut [Vec<f64>] {
        let start = self.bands.len().min(1);
        &mut self.bands[start..]
    }

    /// Finest-resolution detail band (the last one)
    pub fn finest_detail(&self) -> &[f64] {
        match self.bands.len() {
            0 | 1 => &[],
            n => &self.bands[n - 1],
        }
    }
}

/// Deepest useful decomposition level for a signal of `data_len` samples
///
/// Beyond this level every coefficient is dominated by boundary extension.
/// Returns 0 when the signal is shorter than `filter_len - 1`.
pub fn max_level(data_len: usize, filter_len: usize) -> usize {
    if filter_len < 2 {
        return 0;
    }
    let span = filter_len - 1;
    let mut level = 0;
    while span
        .checked_shl(level as u32 + 1)
        .map_or(false, |needed| needed <= data_len)
    {
        level += 1;
    }
    level
}

/// Map an arbitrary index onto `0..n` by mirroring about both ends
#[inline]
fn symmetric_index(index: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let folded = index.rem_euclid(period) as usize;
    if folded < n {
        folded
    } else {
        2 * n - 1 - folded
    }
}

/// Single-level forward transform, returning `(approximation, detail)`
pub fn dwt(signal: &[f64], bank: &FilterBank) -> Result<(Vec<f64>, Vec<f64>)> {
    let n = signal.len();
    if n == 0 {
        return Err(PipelineError::EmptySeries);
    }

    let taps = bank.len();
    let out_len = (n + taps - 1) / 2;
    let mut approx = Vec::with_capacity(out_len);
    let mut detail = Vec::with_capacity(out_len);

    for k in 0..out_len {
        let centre = (2 * k + 1) as isize;
        let mut lo = 0.0;
        let mut hi = 0.0;
        for j in 0..taps {
            let x = signal[symmetric_index(centre - j as isize, n)];
            lo += bank.dec_lo[j] * x;
            hi += bank.dec_hi[j] * x;
        }
        approx.push(lo);
        detail.push(hi);
    }

    Ok((approx, detail))
}

/// Single-level inverse transform
///
/// Produces `2 * n - L + 2` samples for `n` coefficients per band.
pub fn idwt(approx: &[f64], detail: &[f64], bank: &FilterBank) -> Result<Vec<f64>> {
    if approx.len() != detail.len() {
        return Err(PipelineError::Internal(format!(
            "coefficient band mismatch: approximation has {} values, detail has {}",
            approx.len(),
            detail.len()
        )));
    }

    let n = approx.len();
    let taps = bank.len();
    let out_len = (2 * n + 2).checked_sub(taps).ok_or_else(|| {
        PipelineError::Internal(format!(
            "{} coefficients are too few to reconstruct with a {}-tap filter",
            n, taps
        ))
    })?;

    let mut output = Vec::with_capacity(out_len);
    for i in 0..out_len {
        // Position in the full convolution of the upsampled bands
        let m = i + taps - 2;
        let mut acc = 0.0;
        let mut j = m % 2;
        while j < taps && j <= m {
            let k = (m - j) / 2;
            if k < n {
                acc += bank.rec_lo[j] * approx[k] + bank.rec_hi[j] * detail[k];
            }
            j += 2;
        }
        output.push(acc);
    }

    Ok(output)
}

/// Multilevel decomposition into `level` detail bands plus one approximation
///
/// # Errors
/// * `Configuration` when `level` is zero
/// * `EmptySeries` for an empty signal
/// * `Decomposition` when the signal is too short for the requested depth
pub fn wavedec(signal: &[f64], wavelet: Wavelet, level: usize) -> Result<WaveletCoeffs> {
    if level == 0 {
        return Err(PipelineError::Configuration(
            "decomposition level must be at least 1".to_string(),
        ));
    }
    if signal.is_empty() {
        return Err(PipelineError::EmptySeries);
    }

    let max = max_level(signal.len(), wavelet.filter_len());
    if level > max {
        return Err(PipelineError::Decomposition {
            len: signal.len(),
            level,
            max_level: max,
            wavelet: wavelet.name().to_string(),
        });
    }

    let bank = wavelet.filter_bank();
    let mut details = Vec::with_capacity(level);
    let mut approx = signal.to_vec();

    for _ in 0..level {
        let (a, d) = dwt(&approx, &bank)?;
        details.push(d);
        approx = a;
    }

    let mut bands = Vec::with_capacity(level + 1);
    bands.push(approx);
    bands.extend(details.into_iter().rev());

    Ok(WaveletCoeffs::from_bands(bands))
}

/// Multilevel reconstruction
///
/// The result can be one sample longer than the original signal when some
/// level had an odd length; callers trim it back.
pub fn waverec(coeffs: &WaveletCoeffs, wavelet: Wavelet) -> Result<Vec<f64>> {
    let bank = wavelet.filter_bank();
    let mut approx = coeffs.approximation().to_vec();

    for detail in coeffs.details() {
        // Odd-length levels leave one extra approximation coefficient
        if approx.len() == detail.len() + 1 {
            approx.pop();
        }
        approx = idwt(&approx, detail, &bank)?;
    }

    Ok(approx)
}
