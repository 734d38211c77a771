//! Signal Processing Module
//!
//! Noise removal for sampled voltage series:
//! - Multilevel discrete wavelet transform with soft-threshold shrinkage
//! - Zero-phase Butterworth low-pass filtering
//!
//! The pipeline chains both and summarizes the result.

mod denoise;
mod filters;
mod pipeline;
mod stats;
mod wavelet;

pub use denoise::{
    fit_length, noise_sigma, soft_threshold, universal_threshold, DenoiseConfig, Denoised,
    WaveletDenoiser, MAX_DECOMPOSITION_LEVEL,
};
pub use filters::{
    filtfilt, lfilter, lfilter_zi, BiquadCoeffs, ButterworthFilter, LowpassConfig,
    TransferFunction, ZeroPhaseLowpass, MAX_FILTER_ORDER,
};
pub use pipeline::{process_csv, FilterPipeline, FilterReport, PipelineConfig};
pub use stats::{summarize, SignalSummary};
pub use wavelet::{dwt, idwt, max_level, wavedec, waverec, FilterBank, Wavelet, WaveletCoeffs};
