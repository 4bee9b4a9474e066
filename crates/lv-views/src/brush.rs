//! Brush state tracker: one per view

use ahash::AHashSet;
use thiserror::Error;

use lv_core::{CandidateSelection, Membership, RecordId};
use lv_data::RecordSet;

use crate::scale::ScaleSet;

/// Rejected brush input. Stays inside the view that received it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BrushError {
    #[error("Dimension '{0}' is not brushable in this view")]
    UnknownDimension(String),

    #[error("Brush extent on '{0}' is not finite")]
    NonFinite(String),
}

/// Active range constraint on one dimension, in view position space
#[derive(Debug, Clone, PartialEq)]
pub struct BrushExtent {
    pub dimension: String,
    pub low: f32,
    pub high: f32,
}

impl BrushExtent {
    /// Endpoints may come in either order
    pub fn new(dimension: impl Into<String>, a: f32, b: f32) -> Self {
        Self {
            dimension: dimension.into(),
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn contains(&self, position: f32) -> bool {
        position >= self.low && position <= self.high
    }

    pub fn is_collapsed(&self) -> bool {
        self.low == self.high
    }
}

/// Per-view brush state.
///
/// Holds at most one extent per brushable dimension. The candidate selection
/// is recomputed from the current extents every time; nothing accumulates
/// across gestures.
#[derive(Debug, Clone)]
pub struct BrushTracker {
    dimensions: Vec<String>,
    extents: Vec<Option<BrushExtent>>,
}

impl BrushTracker {
    pub fn new(dimensions: Vec<String>) -> Self {
        let extents = vec![None; dimensions.len()];
        Self { dimensions, extents }
    }

    /// Start over with a new set of brushable dimensions
    pub fn reset(&mut self, dimensions: Vec<String>) {
        self.extents = vec![None; dimensions.len()];
        self.dimensions = dimensions;
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    fn slot(&self, dimension: &str) -> Result<usize, BrushError> {
        self.dimensions
            .iter()
            .position(|d| d == dimension)
            .ok_or_else(|| BrushError::UnknownDimension(dimension.to_string()))
    }

    /// Check a brush without applying it
    pub fn validate(&self, dimension: &str, low: f32, high: f32) -> Result<(), BrushError> {
        self.slot(dimension)?;
        if !low.is_finite() || !high.is_finite() {
            return Err(BrushError::NonFinite(dimension.to_string()));
        }
        Ok(())
    }

    /// Record or replace the extent on `dimension`. A zero-width extent
    /// clears the dimension instead.
    pub fn set_brush(&mut self, dimension: &str, low: f32, high: f32) -> Result<(), BrushError> {
        self.validate(dimension, low, high)?;
        let slot = self.slot(dimension)?;
        let extent = BrushExtent::new(dimension, low, high);
        self.extents[slot] = if extent.is_collapsed() { None } else { Some(extent) };
        Ok(())
    }

    /// Remove the extent on `dimension`. Returns whether one was active.
    pub fn clear_brush(&mut self, dimension: &str) -> Result<bool, BrushError> {
        let slot = self.slot(dimension)?;
        Ok(self.extents[slot].take().is_some())
    }

    /// Gesture completion: without a usable extent the dimension is cleared
    pub fn end_gesture(&mut self, dimension: &str, extent: Option<(f32, f32)>) -> Result<(), BrushError> {
        match extent {
            Some((low, high)) => self.set_brush(dimension, low, high),
            None => self.clear_brush(dimension).map(|_| ()),
        }
    }

    /// Remove every extent. Returns whether any was active.
    pub fn clear_all(&mut self) -> bool {
        let had_any = self.active_count() > 0;
        self.extents.iter_mut().for_each(|e| *e = None);
        had_any
    }

    pub fn extent(&self, dimension: &str) -> Option<&BrushExtent> {
        self.slot(dimension).ok().and_then(|slot| self.extents[slot].as_ref())
    }

    pub fn active(&self) -> impl Iterator<Item = &BrushExtent> + '_ {
        self.extents.iter().flatten()
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Records whose position on every brushed dimension lies inside that
    /// dimension's extent. `Unconstrained` when nothing is brushed.
    pub fn candidate_selection(&self, records: &RecordSet, scales: &ScaleSet) -> CandidateSelection {
        let active: Vec<&BrushExtent> = self.active().collect();
        if active.is_empty() {
            return CandidateSelection::cleared(records.generation());
        }

        let selected: AHashSet<RecordId> = records
            .records()
            .iter()
            .filter(|record| {
                active.iter().all(|extent| {
                    scales
                        .position(&extent.dimension, record)
                        .map(|pos| extent.contains(pos))
                        .unwrap_or(false)
                })
            })
            .map(|record| record.id)
            .collect();

        CandidateSelection::new(Membership::only(selected), records.generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::ScaleRange;
    use lv_core::Generation;
    use lv_data::{DimensionSpec, RawRow, Schema};
    use std::sync::Arc;

    fn records() -> RecordSet {
        let schema = Schema::new(vec![
            DimensionSpec::continuous("price"),
            DimensionSpec::continuous("area"),
            DimensionSpec::categorical("furnishingstatus"),
        ])
        .unwrap();
        let rows = [("100", "10", "furnished"), ("200", "30", "unfurnished"), ("300", "20", "furnished")]
            .iter()
            .map(|(p, a, f)| RawRow::new().with("price", *p).with("area", *a).with("furnishingstatus", *f))
            .collect::<Vec<_>>();
        RecordSet::load(Arc::new(schema), rows, Generation(1)).unwrap()
    }

    fn scales(records: &RecordSet) -> ScaleSet {
        ScaleSet::build(
            records,
            [
                ("price", ScaleRange::vertical(100.0)),
                ("area", ScaleRange::vertical(100.0)),
                ("furnishingstatus", ScaleRange::vertical(100.0)),
            ],
        )
    }

    fn tracker() -> BrushTracker {
        BrushTracker::new(vec!["price".into(), "area".into(), "furnishingstatus".into()])
    }

    fn ids(candidate: &CandidateSelection) -> Vec<u64> {
        candidate.membership.ids().into_iter().map(|id| id.0).collect()
    }

    #[test]
    fn test_no_extents_means_no_constraint() {
        let records = records();
        let candidate = tracker().candidate_selection(&records, &scales(&records));
        assert!(candidate.membership.is_unconstrained());
        assert_eq!(candidate.generation, Generation(1));
    }

    #[test]
    fn test_single_extent_with_reversed_endpoints() {
        let records = records();
        let scales = scales(&records);
        let mut tracker = tracker();
        // price 150..250 is 75..25 on a vertical axis
        tracker.set_brush("price", 75.0, 25.0).unwrap();

        assert_eq!(tracker.extent("price").unwrap().low, 25.0);
        assert_eq!(ids(&tracker.candidate_selection(&records, &scales)), vec![1]);
    }

    #[test]
    fn test_extents_intersect_and_never_grow() {
        let records = records();
        let scales = scales(&records);
        let mut tracker = tracker();
        tracker.set_brush("price", 0.0, 100.0).unwrap();
        let all = ids(&tracker.candidate_selection(&records, &scales));
        assert_eq!(all, vec![0, 1, 2]);

        // area domain niced to [10, 30]: area >= 20 is position 0..50
        tracker.set_brush("area", 0.0, 50.0).unwrap();
        let narrowed = ids(&tracker.candidate_selection(&records, &scales));
        assert_eq!(narrowed, vec![1, 2]);

        let furnished = scales.get("furnishingstatus").unwrap()
            .map_value(&lv_data::Value::Category("furnished".into()))
            .unwrap();
        tracker.set_brush("furnishingstatus", furnished - 1.0, furnished + 1.0).unwrap();
        let narrowest = ids(&tracker.candidate_selection(&records, &scales));
        assert_eq!(narrowest, vec![2]);
    }

    #[test]
    fn test_disjoint_extents_give_empty_not_unconstrained() {
        let records = records();
        let scales = scales(&records);
        let mut tracker = tracker();
        tracker.set_brush("price", 90.0, 100.0).unwrap();
        tracker.set_brush("area", 90.0, 100.0).unwrap();
        tracker.set_brush("price", 0.0, 10.0).unwrap();

        let candidate = tracker.candidate_selection(&records, &scales);
        assert_eq!(candidate.membership.len(), Some(0));
        assert_eq!(tracker.active_count(), 2);
    }

    #[test]
    fn test_collapsed_extent_and_gesture_end_clear() {
        let mut tracker = tracker();
        tracker.set_brush("price", 10.0, 20.0).unwrap();
        tracker.set_brush("price", 15.0, 15.0).unwrap();
        assert!(tracker.extent("price").is_none());

        tracker.set_brush("area", 10.0, 20.0).unwrap();
        tracker.end_gesture("area", None).unwrap();
        assert_eq!(tracker.active_count(), 0);

        tracker.end_gesture("area", Some((5.0, 30.0))).unwrap();
        assert_eq!(tracker.active_count(), 1);
        assert!(tracker.clear_all());
        assert!(!tracker.clear_all());
    }

    #[test]
    fn test_invalid_input_leaves_state_alone() {
        let mut tracker = tracker();
        tracker.set_brush("price", 10.0, 20.0).unwrap();

        assert_eq!(
            tracker.set_brush("lot_size", 0.0, 1.0),
            Err(BrushError::UnknownDimension("lot_size".into()))
        );
        assert_eq!(
            tracker.set_brush("price", f32::NAN, 1.0),
            Err(BrushError::NonFinite("price".into()))
        );
        assert_eq!(tracker.extent("price").unwrap().high, 20.0);
    }
}
