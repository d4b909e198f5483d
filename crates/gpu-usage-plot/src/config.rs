//! Configuration management for gpu-usage-plot

use anyhow::{Context, Result};
use gpu_usage_plot::{ColumnNames, RenderOptions, DEFAULT_OUTPUT_FILE};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Plot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotConfig {
    /// Default output image path
    pub output: PathBuf,

    /// Input column names
    pub columns: ColumnNames,

    /// Chart geometry and styling
    pub render: RenderOptions,

    /// Configuration source path
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            columns: ColumnNames::default(),
            render: RenderOptions::default(),
            source: None,
        }
    }
}

impl PlotConfig {
    /// Load configuration from file or create default
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
                }
                path.to_path_buf()
            }
            None => match Self::default_config_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            let mut config = Self::default();
            config.source = Some(config_path);
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = ConfigFormat::from_path(path)
            .parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Write the configuration back to the file it was loaded from
    pub fn save(&self) -> Result<()> {
        let Some(path) = self.source.as_deref() else {
            return Err(anyhow::anyhow!("No config file path specified"));
        };

        let content = ConfigFormat::from_path(path).render(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Default configuration file path, if the platform has a config directory
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gpu-usage-plot").join("config.yaml"))
    }

    /// Get the configuration source path
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Override values with command-line flags
    pub fn apply_overrides(&mut self, output: Option<PathBuf>, dpi: Option<u32>) -> Result<()> {
        if let Some(output) = output {
            self.output = output;
        }
        if let Some(dpi) = dpi {
            if dpi == 0 {
                return Err(anyhow::anyhow!("DPI must be positive"));
            }
            self.render.dpi = dpi;
        }
        Ok(())
    }
}

/// Serialization format of a config file, picked from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Yaml,
        }
    }

    fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T> {
        Ok(match self {
            ConfigFormat::Yaml => serde_yaml::from_str(content).context("Malformed YAML")?,
            ConfigFormat::Json => serde_json::from_str(content).context("Malformed JSON")?,
        })
    }

    fn render<T: Serialize>(self, value: &T) -> Result<String> {
        Ok(match self {
            ConfigFormat::Yaml => serde_yaml::to_string(value)?,
            ConfigFormat::Json => serde_json::to_string_pretty(value)?,
        })
    }
}
