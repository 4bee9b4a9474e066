use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::DataError;

/// Kind of a dataset axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKind {
    /// Numeric values mapped linearly
    Continuous,
    /// Text values mapped to evenly spaced points
    Categorical,
}

/// One declared dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionSpec {
    pub name: String,
    pub kind: DimensionKind,
}

impl DimensionSpec {
    pub fn continuous(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: DimensionKind::Continuous }
    }

    pub fn categorical(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: DimensionKind::Categorical }
    }
}

/// Declared, ordered set of dimensions.
///
/// The dimension set comes from the declaration and never from the rows, so
/// it keeps its shape across reloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DimensionSpec>", into = "Vec<DimensionSpec>")]
pub struct Schema {
    dimensions: IndexMap<String, DimensionKind>,
}

impl Schema {
    /// Build a schema, rejecting duplicate names
    pub fn new(specs: impl IntoIterator<Item = DimensionSpec>) -> Result<Self, DataError> {
        let mut dimensions = IndexMap::new();
        for spec in specs {
            if dimensions.insert(spec.name.clone(), spec.kind).is_some() {
                return Err(DataError::DuplicateDimension(spec.name));
            }
        }
        Ok(Self { dimensions })
    }

    /// Schema of the housing price dataset
    pub fn housing() -> Self {
        let continuous = ["price", "area", "bedrooms", "bathrooms", "stories", "parking"];
        let categorical = [
            "mainroad",
            "guestroom",
            "basement",
            "hotwaterheating",
            "airconditioning",
            "prefarea",
            "furnishingstatus",
        ];

        let dimensions = continuous
            .iter()
            .map(|name| (name.to_string(), DimensionKind::Continuous))
            .chain(categorical.iter().map(|name| (name.to_string(), DimensionKind::Categorical)))
            .collect();
        Self { dimensions }
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Position of a dimension in declaration order
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.dimensions.get_index_of(name)
    }

    pub fn kind(&self, name: &str) -> Option<DimensionKind> {
        self.dimensions.get(name).copied()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.dimensions.get_index(index).map(|(name, _)| name.as_str())
    }

    /// Iterate `(index, name, kind)` in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, DimensionKind)> + '_ {
        self.dimensions
            .iter()
            .enumerate()
            .map(|(index, (name, kind))| (index, name.as_str(), *kind))
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::housing()
    }
}

impl TryFrom<Vec<DimensionSpec>> for Schema {
    type Error = DataError;

    fn try_from(specs: Vec<DimensionSpec>) -> Result<Self, Self::Error> {
        Schema::new(specs)
    }
}

impl From<Schema> for Vec<DimensionSpec> {
    fn from(schema: Schema) -> Self {
        schema
            .dimensions
            .into_iter()
            .map(|(name, kind)| DimensionSpec { name, kind })
            .collect()
    }
}

/// Value extent of a dimension over one record set
#[derive(Debug, Clone, PartialEq)]
pub enum Domain {
    /// `[min, max]` of present values; `[0, 0]` for an empty dataset
    Continuous { min: f64, max: f64 },
    /// Sorted distinct values
    Categorical(Vec<String>),
}

impl Domain {
    /// Whether the domain has zero width (single value, or none)
    pub fn is_degenerate(&self) -> bool {
        match self {
            Domain::Continuous { min, max } => min == max,
            Domain::Categorical(values) => values.len() <= 1,
        }
    }
}

/// A dimension together with its domain snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    /// Position in the schema
    pub index: usize,
    pub name: String,
    pub kind: DimensionKind,
    pub domain: Domain,
}
