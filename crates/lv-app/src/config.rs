//! Application configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use lv_data::DatasetConfig;
use lv_views::plots::colors::color_from_rgba;
use lv_views::ProjectorStyle;

/// Emphasis styling shared by both views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub baseline_opacity: f32,
    pub emphasized_opacity: f32,
    pub deemphasized_opacity: f32,
    pub transition_ms: u64,
    /// RGBA fill of selected scatter points
    pub scatter_selected: [u8; 4],
    /// RGBA fill of scatter points at rest
    pub scatter_point: [u8; 4],
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            baseline_opacity: 0.3,
            emphasized_opacity: 1.0,
            deemphasized_opacity: 0.1,
            transition_ms: 300,
            scatter_selected: [128, 0, 128, 255],
            scatter_point: [105, 179, 162, 255],
        }
    }
}

impl HighlightConfig {
    fn apply(&self, style: ProjectorStyle) -> ProjectorStyle {
        ProjectorStyle {
            baseline_opacity: self.baseline_opacity,
            emphasized_opacity: self.emphasized_opacity,
            deemphasized_opacity: self.deemphasized_opacity,
            transition: Duration::from_millis(self.transition_ms),
            ..style
        }
    }

    pub fn scatter_style(&self) -> ProjectorStyle {
        ProjectorStyle {
            emphasized_color: Some(color_from_rgba(self.scatter_selected)),
            ..self.apply(ProjectorStyle::scatter())
        }
    }

    pub fn parallel_style(&self) -> ProjectorStyle {
        self.apply(ProjectorStyle::parallel())
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub highlight: HighlightConfig,
    pub window_size: [f32; 2],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            highlight: HighlightConfig::default(),
            window_size: [1300.0, 560.0],
        }
    }
}

impl AppConfig {
    /// Load from `path`, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.dataset.validate()?;
        Ok(config)
    }
}
