//! Application Configuration
//!
//! Reconstruction tuning stored in TOML format. Correct values depend on the
//! scene and screenshot resolution, so every constant is overridable.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::vision::ConfigError;

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name column detection
    pub column: ColumnConfig,
    /// Grid bucketing and table layout
    pub grid: GridConfig,
    /// Output settings
    pub output: OutputConfig,
}

impl AppConfig {
    /// Check every section for values the algorithms cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.column.validate()?;
        self.grid.validate()
    }
}

/// Name column detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Minimum number of rows a column must have (window size)
    pub min_column_size: usize,
    /// Window acceptance: every x must be at most `tolerance` times the first x
    pub tolerance: f64,
    /// Extension: next x must be below `secondary_tolerance` times the last accepted x
    pub secondary_tolerance: f64,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            min_column_size: 6,
            tolerance: 1.15,
            secondary_tolerance: 1.05,
        }
    }
}

impl ColumnConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_column_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        positive("tolerance", self.tolerance)?;
        positive("secondary_tolerance", self.secondary_tolerance)
    }
}

/// Grid bucketing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Horizontal cell size in pixels (derived from the items when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_size_x: Option<f64>,
    /// Vertical cell size in pixels (derived from the items when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_size_y: Option<f64>,
    /// Stat columns left to right
    pub stat_columns: Vec<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size_x: None,
            cell_size_y: None,
            stat_columns: ["points", "kills", "assists", "deaths", "ping"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(x) = self.cell_size_x {
            positive("cell_size_x", x)?;
        }
        if let Some(y) = self.cell_size_y {
            positive("cell_size_y", y)?;
        }
        Ok(())
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Attempt full table reconstruction after finding the name column
    pub full_reconstruction: bool,
    /// Pretty-print JSON reports
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            full_reconstruction: true,
            pretty: true,
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
