use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use voltfilter_rs::signal_processing::{DenoiseConfig, LowpassConfig, Wavelet};
use voltfilter_rs::PipelineConfig;

use crate::config::{parse_upload_size, ServerConfig};

/// voltfilter server - denoise voltage recordings uploaded as CSV
#[derive(Parser)]
#[command(name = "voltfilter-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the server (default)
    Serve(ServeArgs),

    /// Filter a CSV file without starting the server
    Filter {
        /// CSV file with a "Voltaje (mV)" column
        #[arg(short, long)]
        file: PathBuf,

        /// Write the JSON result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

/// Pipeline parameters for offline filtering
#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// Wavelet used for denoising (haar, db2, db4, db6)
    #[arg(long, default_value = "db6", value_parser = parse_wavelet)]
    pub wavelet: Wavelet,

    /// Wavelet decomposition level
    #[arg(long, default_value_t = 4)]
    pub level: usize,

    /// Butterworth filter order
    #[arg(long, default_value_t = 4)]
    pub order: usize,

    /// Low-pass cutoff frequency in Hz
    #[arg(long, default_value_t = 50.0)]
    pub cutoff: f64,

    /// Sampling rate of the recording in Hz
    #[arg(long, default_value_t = 500.0)]
    pub sample_rate: f64,
}

impl PipelineArgs {
    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            denoise: DenoiseConfig {
                wavelet: self.wavelet,
                level: self.level,
            },
            lowpass: LowpassConfig {
                order: self.order,
                cutoff_hz: self.cutoff,
                sample_rate_hz: self.sample_rate,
            },
        }
    }
}

/// Flags that override the environment configuration
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Maximum upload size in bytes
    #[arg(long, value_parser = parse_size_arg)]
    pub max_upload_size: Option<usize>,
}

impl ServeArgs {
    pub fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.debug {
            config.debug = true;
        }
        if let Some(size) = self.max_upload_size {
            config.max_upload_size = size;
        }
        config
    }
}

fn parse_wavelet(value: &str) -> Result<Wavelet, String> {
    Wavelet::from_name(value).map_err(|e| e.to_string())
}

fn parse_size_arg(value: &str) -> Result<usize, String> {
    parse_upload_size(value).map_err(|e| e.to_string())
}
