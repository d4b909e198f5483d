//! Horizontal axis resolution from the index column

use chrono::{DateTime, NaiveDateTime};

/// Timestamp layouts accepted for the index column, nvidia-smi first
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M",
];

/// How index values map onto the horizontal axis
#[derive(Debug, Clone, PartialEq)]
pub enum TimeAxis {
    /// Seconds elapsed since the earliest timestamp
    Elapsed { start: NaiveDateTime },
    /// Index values are plain numbers
    Numeric { name: String },
    /// Row position
    Ordinal,
}

impl TimeAxis {
    /// Pick an axis for the given index values and compute each row's position
    pub fn resolve(index_name: &str, values: &[&str]) -> (Self, Vec<f64>) {
        if values.is_empty() {
            return (TimeAxis::Ordinal, Vec::new());
        }

        if let Some(stamps) = values
            .iter()
            .map(|v| parse_timestamp(v))
            .collect::<Option<Vec<_>>>()
        {
            if let Some(&start) = stamps.iter().min() {
                let times = stamps
                    .iter()
                    .map(|t| (*t - start).num_milliseconds() as f64 / 1000.0)
                    .collect();
                return (TimeAxis::Elapsed { start }, times);
            }
        }

        if let Some(numbers) = values
            .iter()
            .map(|v| v.parse::<f64>().ok().filter(|n| n.is_finite()))
            .collect::<Option<Vec<_>>>()
        {
            let axis = TimeAxis::Numeric {
                name: index_name.to_string(),
            };
            return (axis, numbers);
        }

        let ordinals = (0..values.len()).map(|i| i as f64).collect();
        (TimeAxis::Ordinal, ordinals)
    }

    /// Axis description for the chart
    pub fn label(&self) -> String {
        match self {
            TimeAxis::Elapsed { start } => {
                format!("Elapsed time since {} [s]", start.format("%Y-%m-%d %H:%M:%S"))
            }
            TimeAxis::Numeric { name } if !name.is_empty() => name.clone(),
            TimeAxis::Numeric { .. } | TimeAxis::Ordinal => "Sample".to_string(),
        }
    }
}

/// Parse a timestamp in any of the accepted layouts
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}
