use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub mean: f64,
    pub max: f64,
}

pub fn summarize(series: &[f64]) -> Result<SignalSummary> {
    if series.is_empty() {
        return Err(PipelineError::EmptySeries);
    }

    let mean = series.iter().sum::<f64>() / series.len() as f64;
    let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(SignalSummary { mean, max })
}
