//! Output formatting for gpu-usage-plot

use anyhow::Result;
use clap::ValueEnum;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use gpu_usage_plot::DeviceSummary;
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Compact text format
    Text,
}

/// Trait for types that can be formatted for output
pub trait Formattable {
    /// Format as a table row
    fn table_headers() -> Vec<String>;
    fn table_row(&self) -> Vec<String>;

    /// Format as key-value pairs for detailed view
    fn key_value_pairs(&self) -> Vec<(String, String)>;
}

impl Formattable for DeviceSummary {
    fn table_headers() -> Vec<String> {
        ["GPU", "Bus ID", "Name", "Samples", "GPU mean", "GPU max", "Mem mean", "Mem max"]
            .iter()
            .map(|h| h.to_string())
            .collect()
    }

    fn table_row(&self) -> Vec<String> {
        vec![
            self.device_id.to_string(),
            self.bus_id.clone(),
            self.name.clone().unwrap_or_else(|| "-".to_string()),
            self.samples.to_string(),
            format_percentage(self.mean_gpu),
            format_percentage(self.max_gpu),
            format_percentage(self.mean_memory),
            format_percentage(self.max_memory),
        ]
    }

    fn key_value_pairs(&self) -> Vec<(String, String)> {
        Self::table_headers().into_iter().zip(self.table_row()).collect()
    }
}

/// Output formatter
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a list of items in the configured format
    pub fn render_list<T>(&self, items: &[T]) -> Result<String>
    where
        T: Serialize + Formattable,
    {
        if items.is_empty() {
            return Ok(match self.format {
                OutputFormat::Json | OutputFormat::Yaml => "[]".to_string(),
                OutputFormat::Table | OutputFormat::Text => "No items found".dimmed().to_string(),
            });
        }

        let rendered = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(items)?,
            OutputFormat::Yaml => serde_yaml::to_string(items)?.trim_end().to_string(),
            OutputFormat::Table => Self::table(items).to_string(),
            OutputFormat::Text => items
                .iter()
                .map(|item| {
                    item.key_value_pairs()
                        .into_iter()
                        .map(|(key, value)| format!("{}: {}", key, value))
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
        };
        Ok(rendered)
    }

    /// Format and print a list of items
    pub fn print_list<T>(&self, items: &[T]) -> Result<()>
    where
        T: Serialize + Formattable,
    {
        println!("{}", self.render_list(items)?);
        Ok(())
    }

    fn table<T: Formattable>(items: &[T]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        let header_cells: Vec<Cell> = T::table_headers()
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold).fg(Color::Cyan))
            .collect();
        table.set_header(header_cells);

        for item in items {
            table.add_row(item.table_row());
        }
        table
    }

    /// Print a success message; structured formats keep stdout machine-readable
    pub fn print_success(&self, message: &str) {
        match self.format {
            OutputFormat::Table | OutputFormat::Text => {
                println!("{} {}", "✓".green().bold(), message.green());
            }
            OutputFormat::Json | OutputFormat::Yaml => {
                eprintln!("{}", message);
            }
        }
    }
}

/// Helper function to format a fraction as a percentage
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> DeviceSummary {
        DeviceSummary {
            device_id: 0,
            bus_id: "00000000:01:00.0".to_string(),
            name: Some("Tesla T4".to_string()),
            samples: 3,
            mean_gpu: 0.5,
            max_gpu: 0.75,
            mean_memory: 0.125,
            max_memory: 0.2,
        }
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(0.0), "0.0%");
        assert_eq!(format_percentage(0.5), "50.0%");
        assert_eq!(format_percentage(1.0), "100.0%");
        assert_eq!(format_percentage(0.125), "12.5%");
    }

    #[test]
    fn test_summary_row() {
        let row = summary().table_row();
        assert_eq!(
            row,
            vec!["0", "00000000:01:00.0", "Tesla T4", "3", "50.0%", "75.0%", "12.5%", "20.0%"]
        );
        assert_eq!(DeviceSummary::table_headers().len(), row.len());

        let unnamed = DeviceSummary { name: None, ..summary() };
        assert_eq!(unnamed.table_row()[2], "-");
    }

    #[test]
    fn test_render_json() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let rendered = formatter.render_list(&[summary()]).unwrap();

        let parsed: Vec<DeviceSummary> = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, vec![summary()]);
    }

    #[test]
    fn test_render_yaml() {
        let formatter = OutputFormatter::new(OutputFormat::Yaml);
        let rendered = formatter.render_list(&[summary()]).unwrap();

        let parsed: Vec<DeviceSummary> = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(parsed[0].bus_id, "00000000:01:00.0");
    }

    #[test]
    fn test_render_text() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let rendered = formatter.render_list(&[summary(), summary()]).unwrap();

        assert!(rendered.starts_with("GPU: 0\nBus ID: 00000000:01:00.0\n"));
        assert_eq!(rendered.matches("GPU mean: 50.0%").count(), 2);
    }

    #[test]
    fn test_render_table() {
        let formatter = OutputFormatter::new(OutputFormat::Table);
        let rendered = formatter.render_list(&[summary()]).unwrap();
        assert!(rendered.contains("Tesla T4"));
        assert!(rendered.contains("12.5%"));
    }

    #[test]
    fn test_render_empty() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let empty: [DeviceSummary; 0] = [];
        assert_eq!(formatter.render_list(&empty).unwrap(), "[]");
    }
}
