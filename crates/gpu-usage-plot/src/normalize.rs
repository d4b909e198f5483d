//! Percentage normalization and missing-value removal

use crate::loader::RawTable;
use crate::{PlotError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Names of the columns the pipeline reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnNames {
    /// PCI bus id column
    pub bus_id: String,

    /// Compute utilization column
    pub gpu: String,

    /// Memory utilization column
    pub memory: String,

    /// Device model name column, used for summaries when present
    pub name: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            bus_id: "pci.bus_id".to_string(),
            gpu: "utilization.gpu [%]".to_string(),
            memory: "utilization.memory [%]".to_string(),
            name: "name".to_string(),
        }
    }
}

/// A fully populated row with utilization scaled to fractions
#[derive(Debug, Clone, PartialEq)]
pub struct UsageSample {
    /// Line number in the source file
    pub line: u64,
    /// Raw index value (usually a timestamp)
    pub index: String,
    pub bus_id: String,
    /// Compute utilization as a fraction
    pub gpu: f64,
    /// Memory utilization as a fraction
    pub memory: f64,
    /// Remaining columns, aligned with `NormalizedTable::extra_columns`
    pub extra: Vec<String>,
}

/// Output of the normalization step
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub index_name: String,
    pub extra_columns: Vec<String>,
    pub samples: Vec<UsageSample>,
    /// Number of rows dropped for missing values
    pub dropped: usize,
}

/// Parse a `"<number> %"` string into a fraction of one.
///
/// Trailing spaces and percent signs are stripped before parsing.
pub fn parse_percentage(value: &str) -> Option<f64> {
    value
        .trim_end_matches(|c| c == ' ' || c == '%')
        .parse::<f64>()
        .ok()
        .map(|v| v / 100.0)
}

/// Scale both utilization columns and drop every row with a missing value
pub fn normalize(table: &RawTable, columns: &ColumnNames) -> Result<NormalizedTable> {
    let bus_pos = table.column_position(&columns.bus_id)?;
    let gpu_pos = table.column_position(&columns.gpu)?;
    let mem_pos = table.column_position(&columns.memory)?;

    let extra_positions: Vec<usize> = (0..table.columns.len())
        .filter(|pos| ![bus_pos, gpu_pos, mem_pos].contains(pos))
        .collect();
    let extra_columns = extra_positions
        .iter()
        .map(|&pos| table.columns[pos].clone())
        .collect();

    let mut samples = Vec::with_capacity(table.len());
    let mut dropped = 0;

    for record in &table.records {
        // Percentages are parsed before the missing-value check so that a
        // malformed value always aborts, even on rows that would be dropped.
        let gpu = scale_field(record.fields[gpu_pos].as_deref(), record.line, &columns.gpu)?;
        let memory = scale_field(record.fields[mem_pos].as_deref(), record.line, &columns.memory)?;

        let (Some(gpu), Some(memory)) = (gpu, memory) else {
            dropped += 1;
            continue;
        };
        if record.has_missing() {
            dropped += 1;
            continue;
        }

        for (column, value) in [(&columns.gpu, gpu), (&columns.memory, memory)] {
            if !(0.0..=1.0).contains(&value) {
                warn!(
                    "Line {}: {} is {:.1}%, outside the 0-100% range",
                    record.line,
                    column,
                    value * 100.0
                );
            }
        }

        let field = |pos: usize| record.fields[pos].clone().unwrap_or_default();
        samples.push(UsageSample {
            line: record.line,
            index: record.index.clone(),
            bus_id: field(bus_pos),
            gpu,
            memory,
            extra: extra_positions.iter().map(|&pos| field(pos)).collect(),
        });
    }

    debug!(
        "Normalized {} samples, dropped {} with missing values",
        samples.len(),
        dropped
    );

    Ok(NormalizedTable {
        index_name: table.index_name.clone(),
        extra_columns,
        samples,
        dropped,
    })
}

/// Parse an optional percentage field; `Ok(None)` for missing or NaN values
fn scale_field(value: Option<&str>, line: u64, column: &str) -> Result<Option<f64>> {
    let Some(value) = value else {
        return Ok(None);
    };
    match parse_percentage(value) {
        Some(v) if v.is_nan() => Ok(None),
        Some(v) => Ok(Some(v)),
        None => Err(PlotError::InvalidPercentage {
            line,
            column: column.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_table;
    use std::path::Path;

    fn normalize_str(content: &str) -> Result<NormalizedTable> {
        let table = read_table(content.as_bytes(), Path::new("stats.csv")).unwrap();
        normalize(&table, &ColumnNames::default())
    }

    #[test]
    fn test_parse_percentage() {
        assert_eq!(parse_percentage("50 %"), Some(0.5));
        assert_eq!(parse_percentage("12.5 %"), Some(0.125));
        assert_eq!(parse_percentage("100%"), Some(1.0));
        assert_eq!(parse_percentage("0"), Some(0.0));
        assert_eq!(parse_percentage("7 % %"), Some(0.07));
        assert_eq!(parse_percentage("abc %"), None);
        assert_eq!(parse_percentage("% 5"), None);
        assert_eq!(parse_percentage(""), None);
    }

    #[test]
    fn test_values_are_fractions() {
        let normalized = normalize_str(
            "timestamp,pci.bus_id,utilization.gpu [%],utilization.memory [%]\n\
             t0,0000:01:00.0,50 %,12.5 %\n\
             t1,0000:01:00.0,100 %,0 %\n",
        )
        .unwrap();

        assert_eq!(normalized.samples.len(), 2);
        assert_eq!(normalized.samples[0].gpu, 0.5);
        assert_eq!(normalized.samples[0].memory, 0.125);
        for sample in &normalized.samples {
            assert!((0.0..=1.0).contains(&sample.gpu));
            assert!((0.0..=1.0).contains(&sample.memory));
        }
    }

    #[test]
    fn test_rows_with_any_missing_value_are_dropped() {
        let normalized = normalize_str(
            "timestamp,name,pci.bus_id,utilization.gpu [%],utilization.memory [%]\n\
             t0,T4,0000:01:00.0,50 %,12 %\n\
             t1,,0000:01:00.0,50 %,12 %\n\
             t2,T4,0000:01:00.0,NaN,12 %\n\
             t3,T4,0000:01:00.0,nan %,12 %\n\
             t4,T4,,50 %,12 %\n\
             t5,T4,0000:01:00.0,50 %\n",
        )
        .unwrap();

        assert_eq!(normalized.samples.len(), 1);
        assert_eq!(normalized.samples[0].index, "t0");
        assert_eq!(normalized.dropped, 5);
    }

    #[test]
    fn test_malformed_percentage_aborts() {
        let err = normalize_str(
            "timestamp,name,pci.bus_id,utilization.gpu [%],utilization.memory [%]\n\
             t0,,0000:01:00.0,fifty %,12 %\n",
        )
        .unwrap_err();

        match err {
            PlotError::InvalidPercentage { line, column, value } => {
                assert_eq!(line, 2);
                assert_eq!(column, "utilization.gpu [%]");
                assert_eq!(value, "fifty %");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_required_column() {
        let err = normalize_str("timestamp,pci.bus_id,utilization.gpu [%]\nt0,a,1 %\n").unwrap_err();
        assert!(matches!(err, PlotError::MissingColumn(c) if c == "utilization.memory [%]"));
    }

    #[test]
    fn test_passthrough_columns() {
        let normalized = normalize_str(
            "timestamp,name,pci.bus_id,utilization.gpu [%],utilization.memory [%],temperature.gpu\n\
             t0,Tesla T4,0000:01:00.0,50 %,12 %,41\n",
        )
        .unwrap();

        assert_eq!(normalized.extra_columns, vec!["name", "temperature.gpu"]);
        assert_eq!(normalized.samples[0].extra, vec!["Tesla T4", "41"]);
        assert_eq!(normalized.samples[0].bus_id, "0000:01:00.0");
    }

    #[test]
    fn test_out_of_range_values_are_kept() {
        let normalized = normalize_str(
            "timestamp,pci.bus_id,utilization.gpu [%],utilization.memory [%]\n\
             t0,0000:01:00.0,150 %,-5 %\n\
             t1,0000:01:00.0,inf %,10 %\n",
        )
        .unwrap();

        assert_eq!(normalized.samples.len(), 2);
        assert_eq!(normalized.dropped, 0);
        assert_eq!(normalized.samples[0].gpu, 1.5);
        assert_eq!(normalized.samples[0].memory, -0.05);
        assert!(normalized.samples[1].gpu.is_infinite());
    }

    #[test]
    fn test_unknown_column_key_is_rejected() {
        let columns: ColumnNames = serde_yaml::from_str("gpu: util\n").unwrap();
        assert_eq!(columns.gpu, "util");
        assert_eq!(columns.bus_id, "pci.bus_id");

        assert!(serde_yaml::from_str::<ColumnNames>("index_name: time\n").is_err());
    }
}
