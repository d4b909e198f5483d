//! End-to-end pipeline: load, normalize, index, filter, render

use crate::devices::{DeviceIndex, DeviceSample};
use crate::filter::filter_devices;
use crate::loader::{load_table, RawTable};
use crate::normalize::{normalize, ColumnNames, UsageSample};
use crate::render::{render_usage_chart, RenderOptions};
use crate::timeline::TimeAxis;
use crate::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Filtered samples ready for plotting
#[derive(Debug, Clone)]
pub struct UsageDataset {
    /// Source file
    pub source: PathBuf,
    /// Bus id mapping of the whole file, before filtering
    pub index: DeviceIndex,
    /// Horizontal axis derived from the index column
    pub axis: TimeAxis,
    /// Passthrough column names
    pub extra_columns: Vec<String>,
    /// Retained samples in file order
    pub samples: Vec<DeviceSample>,
}

impl UsageDataset {
    /// Sorted ids of the devices present after filtering.
    ///
    /// Both chart panels and the legend iterate this list.
    pub fn devices(&self) -> Vec<usize> {
        self.samples
            .iter()
            .map(|s| s.device_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Samples of one device, in file order
    pub fn samples_for(&self, device_id: usize) -> impl Iterator<Item = &DeviceSample> {
        self.samples.iter().filter(move |s| s.device_id == device_id)
    }

    /// Smallest and largest x position
    pub fn time_range(&self) -> (f64, f64) {
        self.samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s.time), hi.max(s.time))
            })
    }

    /// Passthrough value of a sample by column name
    pub fn extra_value<'a>(&self, sample: &'a UsageSample, column: &str) -> Option<&'a str> {
        self.extra_columns
            .iter()
            .position(|c| c == column)
            .and_then(|pos| sample.extra.get(pos))
            .map(String::as_str)
    }

    /// File name used in the chart title
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Run every step up to (and including) filtering on an already loaded table
pub fn prepare_table(
    table: &RawTable,
    columns: &ColumnNames,
    filter_ids: Option<&[usize]>,
) -> Result<UsageDataset> {
    let normalized = normalize(table, columns)?;

    let index = DeviceIndex::from_samples(&normalized.samples);
    for (id, bus_id) in index.iter() {
        debug!("GPU {} -> bus id {}", id, bus_id);
    }

    let indices: Vec<&str> = normalized.samples.iter().map(|s| s.index.as_str()).collect();
    let (axis, times) = TimeAxis::resolve(&normalized.index_name, &indices);
    debug!("Using time axis {:?}", axis);

    let tagged = index.attach(normalized.samples, &times);
    let samples = filter_devices(tagged, &index, filter_ids)?;

    Ok(UsageDataset {
        source: table.path.clone(),
        index,
        axis,
        extra_columns: normalized.extra_columns,
        samples,
    })
}

/// Load a stats dump and run every step up to filtering
pub fn prepare(path: &Path, columns: &ColumnNames, filter_ids: Option<&[usize]>) -> Result<UsageDataset> {
    info!("Reading GPU stats from {}", path.display());
    let table = load_table(path)?;
    let dataset = prepare_table(&table, columns, filter_ids)?;
    info!(
        "Prepared {} samples for {} of {} GPUs",
        dataset.len(),
        dataset.devices().len(),
        dataset.index.len()
    );
    Ok(dataset)
}

/// Load, prepare and render a stats dump into `output`.
///
/// Nothing is written unless every preceding step succeeded.
pub fn plot(
    path: &Path,
    columns: &ColumnNames,
    filter_ids: Option<&[usize]>,
    options: &RenderOptions,
    output: &Path,
) -> Result<UsageDataset> {
    let dataset = prepare(path, columns, filter_ids)?;
    render_usage_chart(&dataset, options, output)?;
    info!("Saved utilization chart to {}", output.display());
    Ok(dataset)
}
