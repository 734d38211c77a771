//! Filter Pipeline
//!
//! Runs a voltage series through:
//! 1. Wavelet shrinkage (broadband noise removal)
//! 2. Zero-phase Butterworth low-pass (high-frequency removal)
//! 3. Summary statistics
//!
//! Every stage is built from the configuration up front, so a pipeline that
//! constructs successfully only fails on the data it is given.

use super::denoise::{DenoiseConfig, WaveletDenoiser};
use super::filters::{LowpassConfig, ZeroPhaseLowpass};
use super::stats::{summarize, SignalSummary};
use crate::error::{PipelineError, Result};
use crate::input::{read_voltage_column, VOLTAGE_COLUMN};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Configuration for the whole pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub denoise: DenoiseConfig,
    #[serde(default)]
    pub lowpass: LowpassConfig,
}

impl PipelineConfig {
    /// Shortest series both stages accept
    pub fn min_length(&self) -> usize {
        let lowpass_min = 3 * (self.lowpass.order + 1) + 1;
        self.denoise.min_length().max(lowpass_min)
    }
}

/// Result of filtering one series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterReport {
    /// Filtered series, same length as the input
    pub data: Vec<f64>,
    pub summary: SignalSummary,
    /// Wavelet threshold applied to the detail bands
    pub threshold: f64,
    /// Applied configuration
    pub config: PipelineConfig,
    /// Processing time in milliseconds
    pub processing_time_ms: f64,
}

#[derive(Debug)]
pub struct FilterPipeline {
    config: PipelineConfig,
    denoiser: WaveletDenoiser,
    lowpass: ZeroPhaseLowpass,
}

impl FilterPipeline {
    /// Each stage validates its own section of `config`.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            config,
            denoiser: WaveletDenoiser::new(config.denoise)?,
            lowpass: ZeroPhaseLowpass::new(config.lowpass)?,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, series: &[f64]) -> Result<FilterReport> {
        let start = Instant::now();
        validate_series(series)?;

        let denoised = self.denoiser.denoise(series)?;
        log::debug!(
            "Wavelet stage done: {} samples, threshold {:.6}",
            denoised.series.len(),
            denoised.threshold
        );

        let data = self.lowpass.apply(&denoised.series)?;
        log::debug!(
            "Low-pass stage done: order {}, cutoff {} Hz",
            self.config.lowpass.order,
            self.config.lowpass.cutoff_hz
        );

        if data.len() != series.len() {
            return Err(PipelineError::Internal(format!(
                "filtered length {} does not match input length {}",
                data.len(),
                series.len()
            )));
        }

        let summary = summarize(&data)?;
        let processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        log::info!(
            "Filtered {} samples in {:.2}ms (mean={:.4}, max={:.4})",
            data.len(),
            processing_time_ms,
            summary.mean,
            summary.max
        );

        Ok(FilterReport {
            data,
            summary,
            threshold: denoised.threshold,
            config: self.config,
            processing_time_ms,
        })
    }
}

fn validate_series(series: &[f64]) -> Result<()> {
    if series.is_empty() {
        return Err(PipelineError::EmptySeries);
    }
    if let Some(index) = series.iter().position(|v| !v.is_finite()) {
        return Err(PipelineError::NonFinite { index });
    }
    Ok(())
}

/// Read the voltage column from CSV bytes and filter it
pub fn process_csv(bytes: &[u8], config: &PipelineConfig) -> Result<FilterReport> {
    let pipeline = FilterPipeline::new(*config)?;
    let series = read_voltage_column(bytes, VOLTAGE_COLUMN)?;
    log::debug!("Read {} samples from '{}'", series.len(), VOLTAGE_COLUMN);
    pipeline.run(&series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal_processing::Wavelet;

    fn sine(n: usize) -> Vec<f64> {
        (0..n).map(|i| (i as f64 * 0.05).sin() * 10.0).collect()
    }

    #[test]
    fn test_pipeline_creation() {
        let pipeline = FilterPipeline::new(PipelineConfig::default()).unwrap();
        assert_eq!(pipeline.config(), &PipelineConfig::default());
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let config = PipelineConfig {
            lowpass: LowpassConfig {
                cutoff_hz: 300.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            FilterPipeline::new(config),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_min_length() {
        assert_eq!(PipelineConfig::default().min_length(), 176);

        let config = PipelineConfig {
            denoise: DenoiseConfig {
                wavelet: Wavelet::Haar,
                level: 1,
            },
            ..Default::default()
        };
        assert_eq!(config.min_length(), 16);
    }

    #[test]
    fn test_excessive_level_rejected_without_panic() {
        let config = PipelineConfig {
            denoise: DenoiseConfig {
                wavelet: Wavelet::Db6,
                level: 64,
            },
            ..Default::default()
        };
        assert_eq!(config.min_length(), usize::MAX);
        assert!(matches!(
            FilterPipeline::new(config),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_each_stage_rejects_its_own_section() {
        let config = PipelineConfig {
            denoise: DenoiseConfig {
                level: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = FilterPipeline::new(config).unwrap_err();
        assert!(err.to_string().contains("decomposition level"));

        let config = PipelineConfig {
            lowpass: LowpassConfig {
                order: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            FilterPipeline::new(config),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_run() {
        let pipeline = FilterPipeline::new(PipelineConfig::default()).unwrap();
        let input = sine(500);
        let report = pipeline.run(&input).unwrap();

        assert_eq!(report.data.len(), 500);
        assert!(report.threshold >= 0.0);
        assert!(report.summary.max <= 10.5);
        assert_eq!(report.config, PipelineConfig::default());
    }

    #[test]
    fn test_empty_series() {
        let pipeline = FilterPipeline::new(PipelineConfig::default()).unwrap();
        assert_eq!(pipeline.run(&[]).unwrap_err(), PipelineError::EmptySeries);
    }

    #[test]
    fn test_non_finite_series() {
        let pipeline = FilterPipeline::new(PipelineConfig::default()).unwrap();
        let mut input = sine(300);
        input[42] = f64::INFINITY;
        assert_eq!(
            pipeline.run(&input).unwrap_err(),
            PipelineError::NonFinite { index: 42 }
        );
    }

    #[test]
    fn test_process_csv_missing_column() {
        let err = process_csv(b"time,value\n0,1\n", &PipelineConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "\"Voltaje (mV)\" column not found in the file");
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"lowpass": {"cutoff_hz": 30.0}}"#).unwrap();
        assert_eq!(config.denoise, DenoiseConfig::default());
        assert_eq!(config.lowpass.order, 4);
        assert_eq!(config.lowpass.cutoff_hz, 30.0);
        assert_eq!(config.lowpass.sample_rate_hz, 500.0);
    }
}
