//! Per-device utilization statistics

use crate::pipeline::UsageDataset;
use serde::{Deserialize, Serialize};

/// Aggregated utilization of one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub device_id: usize,
    pub bus_id: String,
    /// Model name, when the dump carries one
    pub name: Option<String>,
    pub samples: usize,
    pub mean_gpu: f64,
    pub max_gpu: f64,
    pub mean_memory: f64,
    pub max_memory: f64,
}

/// Summarize every device of the dataset, in device id order
pub fn summarize(dataset: &UsageDataset, name_column: &str) -> Vec<DeviceSummary> {
    dataset
        .devices()
        .into_iter()
        .map(|device_id| {
            let samples: Vec<_> = dataset.samples_for(device_id).collect();
            let (mean_gpu, max_gpu) = mean_and_max(samples.iter().map(|s| s.sample.gpu));
            let (mean_memory, max_memory) = mean_and_max(samples.iter().map(|s| s.sample.memory));

            DeviceSummary {
                device_id,
                bus_id: dataset.index.bus_id(device_id).unwrap_or_default().to_string(),
                name: samples
                    .first()
                    .and_then(|s| dataset.extra_value(&s.sample, name_column))
                    .map(str::to_string),
                samples: samples.len(),
                mean_gpu,
                max_gpu,
                mean_memory,
                max_memory,
            }
        })
        .collect()
}

fn mean_and_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (count, sum, max) = values.fold((0usize, 0.0, f64::NEG_INFINITY), |(n, sum, max), v| {
        (n + 1, sum + v, max.max(v))
    });
    (sum / count.max(1) as f64, max)
}
