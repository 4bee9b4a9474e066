//! Record store: ID-stable, immutable record snapshots

use ahash::AHashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use lv_core::{Generation, RecordId};

use crate::schema::{Dimension, DimensionKind, Domain, Schema};
use crate::DataError;

/// One untyped input row: field name to raw text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    fields: AHashMap<String, String>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// A typed dimension value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Numeric(f64),
    Category(String),
}

/// One data row with its stable identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    /// Values in schema order
    values: Vec<Value>,
}

impl Record {
    pub fn value(&self, dimension: usize) -> Option<&Value> {
        self.values.get(dimension)
    }

    pub fn numeric(&self, dimension: usize) -> Option<f64> {
        match self.values.get(dimension) {
            Some(Value::Numeric(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn category(&self, dimension: usize) -> Option<&str> {
        match self.values.get(dimension) {
            Some(Value::Category(c)) => Some(c.as_str()),
            _ => None,
        }
    }
}

/// Immutable snapshot of the dataset.
///
/// A reload never mutates a `RecordSet`; it produces a new one with a new
/// [`Generation`], invalidating every identifier of the previous snapshot.
#[derive(Debug, Clone)]
pub struct RecordSet {
    generation: Generation,
    schema: Arc<Schema>,
    records: Vec<Record>,
    dimensions: Vec<Dimension>,
}

impl RecordSet {
    /// An empty snapshot, used before the first load
    pub fn empty(schema: Arc<Schema>) -> Self {
        let dimensions = compute_dimensions(&schema, &[]);
        Self {
            generation: Generation::default(),
            schema,
            records: Vec::new(),
            dimensions,
        }
    }

    /// Type the rows against `schema` and assign identifiers `0..n` in
    /// ingestion order. All-or-nothing: the first bad field aborts the load.
    pub fn load(
        schema: Arc<Schema>,
        rows: impl IntoIterator<Item = RawRow>,
        generation: Generation,
    ) -> Result<Self, DataError> {
        let mut records = Vec::new();

        for (row_idx, row) in rows.into_iter().enumerate() {
            let mut values = Vec::with_capacity(schema.len());
            for (_, name, kind) in schema.iter() {
                let raw = row.get(name).ok_or_else(|| DataError::MissingField {
                    row: row_idx,
                    field: name.to_string(),
                })?;
                values.push(coerce(row_idx, name, kind, raw)?);
            }
            records.push(Record {
                id: RecordId::from(row_idx),
                values,
            });
        }

        let dimensions = compute_dimensions(&schema, &records);
        Ok(Self {
            generation,
            schema,
            records,
            dimensions,
        })
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn ids(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.records.iter().map(|r| r.id)
    }

    /// Look up a record of this snapshot. Ids from other snapshots are not
    /// detectable here; compare generations for that.
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.get(id.index()).filter(|r| r.id == id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.get(id).is_some()
    }

    /// Dimensions with their domains, in schema order
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.schema.index_of(name).and_then(|idx| self.dimensions.get(idx))
    }
}

fn coerce(row: usize, field: &str, kind: DimensionKind, raw: &str) -> Result<Value, DataError> {
    let text = raw.trim();
    match kind {
        DimensionKind::Continuous => match text.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Value::Numeric(v)),
            _ => Err(DataError::DataFormat {
                row,
                field: field.to_string(),
                value: raw.to_string(),
            }),
        },
        DimensionKind::Categorical => Ok(Value::Category(text.to_string())),
    }
}

fn compute_dimensions(schema: &Schema, records: &[Record]) -> Vec<Dimension> {
    schema
        .iter()
        .map(|(index, name, kind)| {
            let domain = match kind {
                DimensionKind::Continuous => {
                    let (min, max) = records
                        .iter()
                        .filter_map(|r| r.numeric(index))
                        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                            None => Some((v, v)),
                            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                        })
                        .unwrap_or((0.0, 0.0));
                    Domain::Continuous { min, max }
                }
                DimensionKind::Categorical => {
                    let distinct: BTreeSet<&str> =
                        records.iter().filter_map(|r| r.category(index)).collect();
                    Domain::Categorical(distinct.into_iter().map(str::to_string).collect())
                }
            };
            Dimension {
                index,
                name: name.to_string(),
                kind,
                domain,
            }
        })
        .collect()
}

/// Owner of the current snapshot
pub struct RecordStore {
    schema: Arc<Schema>,
    current: Arc<RecordSet>,
}

impl RecordStore {
    pub fn new(schema: Schema) -> Self {
        let schema = Arc::new(schema);
        Self {
            current: Arc::new(RecordSet::empty(schema.clone())),
            schema,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The current snapshot
    pub fn current(&self) -> Arc<RecordSet> {
        self.current.clone()
    }

    /// Replace the dataset. On error the previous snapshot stays current.
    pub fn reload(&mut self, rows: impl IntoIterator<Item = RawRow>) -> Result<Arc<RecordSet>, DataError> {
        let generation = self.current.generation().next();
        match RecordSet::load(self.schema.clone(), rows, generation) {
            Ok(set) => {
                info!("Loaded {} records as {}", set.len(), generation);
                self.current = Arc::new(set);
                Ok(self.current.clone())
            }
            Err(e) => {
                warn!("Reload rejected, keeping {}: {}", self.current.generation(), e);
                Err(e)
            }
        }
    }
}
