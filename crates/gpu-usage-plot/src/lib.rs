//! # gpu-usage-plot
//!
//! Utilization charts from `nvidia-smi` CSV dumps.
//!
//! This crate provides:
//! - CSV loading with whitespace trimming and missing-value detection
//! - Percentage normalization for the compute and memory utilization columns
//! - Stable device ids derived from the sorted set of PCI bus ids
//! - Device filtering by id
//! - A two-panel PNG chart (compute on top, memory below) sharing the time axis
//! - Per-device summary statistics
//!
//! ## Example
//!
//! ```rust,no_run
//! use gpu_usage_plot::{pipeline, ColumnNames, RenderOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dataset = pipeline::plot(
//!         Path::new("gpu_stats.csv"),
//!         &ColumnNames::default(),
//!         Some(&[0, 1]),
//!         &RenderOptions::default(),
//!         Path::new("gpu_usage.png"),
//!     )?;
//!     println!("Plotted {} samples", dataset.len());
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

pub mod devices;
pub mod filter;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod summary;
pub mod timeline;

pub use devices::{DeviceIndex, DeviceSample};
pub use filter::filter_devices;
pub use loader::{load_table, RawRecord, RawTable};
pub use normalize::{normalize, parse_percentage, ColumnNames, NormalizedTable, UsageSample};
pub use pipeline::UsageDataset;
pub use render::{render_usage_chart, RenderOptions};
pub use summary::{summarize, DeviceSummary};
pub use timeline::TimeAxis;

/// Default file name of the rendered chart
pub const DEFAULT_OUTPUT_FILE: &str = "gpu_usage.png";

/// Result type for plotting operations
pub type Result<T> = std::result::Result<T, PlotError>;

/// Errors that can occur while turning a stats dump into a chart
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("Invalid percentage {value:?} in column {column:?} on line {line}")]
    InvalidPercentage {
        line: u64,
        column: String,
        value: String,
    },

    #[error("No values to display, did you filter out all GPU ids?")]
    NoValues,

    #[error("Rendering failed: {0}")]
    Render(String),
}

impl PlotError {
    /// Check if this error comes from the contents of the input file
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            PlotError::Csv { .. }
                | PlotError::MissingColumn(_)
                | PlotError::MalformedRecord { .. }
                | PlotError::InvalidPercentage { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_values_message() {
        assert_eq!(
            PlotError::NoValues.to_string(),
            "No values to display, did you filter out all GPU ids?"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(PlotError::MissingColumn("pci.bus_id".to_string()).is_data_error());
        assert!(PlotError::InvalidPercentage {
            line: 3,
            column: "utilization.gpu [%]".to_string(),
            value: "abc %".to_string(),
        }
        .is_data_error());
        assert!(!PlotError::NoValues.is_data_error());
        assert!(!PlotError::Render("backend".to_string()).is_data_error());
    }
}
