//! Dataset configuration: where the rows come from and how the views use them

use ahash::AHashSet;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::schema::{DimensionKind, Schema};
use crate::DataError;

/// Attributes plotted by the scatter view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterAttributes {
    pub x: String,
    pub y: String,
}

/// Configuration for one dataset and its two views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Path to the CSV file
    pub path: PathBuf,

    /// Declared dimensions
    pub schema: Schema,

    /// Scatter plot axes
    pub scatter: ScatterAttributes,

    /// Axes of the parallel coordinates plot, left to right
    pub parallel_dimensions: Vec<String>,

    /// Categorical dimension used for line colors
    pub color_dimension: Option<String>,

    /// Palette order of the color dimension's categories
    pub color_categories: Vec<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/Housing.csv"),
            schema: Schema::housing(),
            scatter: ScatterAttributes {
                x: "area".to_string(),
                y: "price".to_string(),
            },
            parallel_dimensions: ["price", "area", "bedrooms", "bathrooms", "stories", "parking"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            color_dimension: Some("furnishingstatus".to_string()),
            color_categories: ["furnished", "semi-furnished", "unfurnished"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl DatasetConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(text: &str) -> Result<Self, DataError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, or fall back to the housing defaults when the file
    /// does not exist
    pub fn load(path: &Path) -> Result<Self, DataError> {
        if !path.exists() {
            info!("No dataset config at {}, using housing defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Every referenced dimension must be declared and used at most once per
    /// view; the color dimension must be categorical
    pub fn validate(&self) -> Result<(), DataError> {
        if self.scatter.x == self.scatter.y {
            return Err(DataError::RepeatedDimension(self.scatter.x.clone()));
        }
        let mut seen = AHashSet::new();
        if let Some(name) = self.parallel_dimensions.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(DataError::RepeatedDimension(name.clone()));
        }

        let referenced = [&self.scatter.x, &self.scatter.y]
            .into_iter()
            .chain(self.parallel_dimensions.iter());
        for name in referenced {
            if self.schema.index_of(name).is_none() {
                return Err(DataError::UnknownDimension(name.clone()));
            }
        }

        if let Some(color) = &self.color_dimension {
            if self.schema.kind(color) != Some(DimensionKind::Categorical) {
                return Err(DataError::UnknownDimension(color.clone()));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, DataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DatasetConfig::default();
        assert!(config.validate().is_ok());
        let back = DatasetConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = DatasetConfig::from_json(r#"{"path": "other.csv"}"#).unwrap();
        assert_eq!(config.path, PathBuf::from("other.csv"));
        assert_eq!(config.scatter.x, "area");
    }

    #[test]
    fn test_unknown_dimension_rejected() {
        let json = r#"{"parallel_dimensions": ["price", "lot_size"]}"#;
        assert!(matches!(
            DatasetConfig::from_json(json),
            Err(DataError::UnknownDimension(name)) if name == "lot_size"
        ));

        let json = r#"{"color_dimension": "price"}"#;
        assert!(DatasetConfig::from_json(json).is_err());
    }

    #[test]
    fn test_dimension_used_twice_by_a_view_rejected() {
        let json = r#"{"scatter": {"x": "price", "y": "price"}}"#;
        assert!(matches!(
            DatasetConfig::from_json(json),
            Err(DataError::RepeatedDimension(name)) if name == "price"
        ));

        let json = r#"{"parallel_dimensions": ["price", "area", "price"]}"#;
        assert!(matches!(
            DatasetConfig::from_json(json),
            Err(DataError::RepeatedDimension(name)) if name == "price"
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = DatasetConfig::load(Path::new("no/such/config.json")).unwrap();
        assert_eq!(config, DatasetConfig::default());
    }
}
