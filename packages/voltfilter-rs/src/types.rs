use crate::signal_processing::FilterReport;
use serde::{Deserialize, Serialize};

/// Filtered voltage series with its summary, as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredSignal {
    pub data: Vec<f64>,
    pub mean_voltage: f64,
    pub max_voltage: f64,
}

impl From<FilterReport> for FilteredSignal {
    fn from(report: FilterReport) -> Self {
        Self {
            data: report.data,
            mean_voltage: report.summary.mean,
            max_voltage: report.summary.max,
        }
    }
}
