//! Linked view abstraction and the brush-to-coordinator plumbing shared by views

use egui::Ui;
use std::any::Any;
use std::sync::Arc;
use tracing::warn;

use lv_core::{RecordId, Selection, SelectionCoordinator, ViewId};
use lv_data::RecordSet;

use crate::brush::{BrushError, BrushTracker};
use crate::highlight::HighlightProjector;
use crate::scale::ScaleSet;

/// Space between a view's edge and its plotting area, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self { top, right, bottom, left }
    }

    /// Plotting area left inside `size`, never negative
    pub fn inner(&self, size: egui::Vec2) -> egui::Vec2 {
        egui::vec2(
            (size.x - self.left - self.right).max(0.0),
            (size.y - self.top - self.bottom).max(0.0),
        )
    }

    pub fn offset(&self) -> egui::Vec2 {
        egui::vec2(self.left, self.top)
    }
}

/// Base trait for every view taking part in linked selection
pub trait LinkedView: Send + Sync {
    /// Get the unique ID of this view
    fn id(&self) -> ViewId;

    /// Get the title of this view
    fn title(&self) -> &str;

    /// Get the view type (for logging and events)
    fn view_type(&self) -> &str;

    /// Adopt a new dataset: brushes cleared, scales rebuilt, projector at baseline
    fn reset(&mut self, records: Arc<RecordSet>);

    /// The projector that receives selection broadcasts for this view
    fn projector(&self) -> &Arc<HighlightProjector>;

    fn brush_tracker(&self) -> &BrushTracker;

    /// Drop every brush in this view and submit the result
    fn clear_brushes(&mut self) -> Option<Selection>;

    /// Draw the view and handle its gestures
    fn ui(&mut self, ui: &mut Ui);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Brush state of one view wired to the coordinator.
///
/// Every brush change recomputes the candidate from scratch and submits it,
/// one submit per change.
pub struct BrushLink {
    view_id: ViewId,
    coordinator: Arc<SelectionCoordinator>,
    records: Arc<RecordSet>,
    scales: ScaleSet,
    tracker: BrushTracker,
    projector: Arc<HighlightProjector>,
}

impl BrushLink {
    pub fn new(
        view_id: ViewId,
        coordinator: Arc<SelectionCoordinator>,
        projector: Arc<HighlightProjector>,
        dimensions: Vec<String>,
    ) -> Self {
        let records = Arc::new(RecordSet::empty(Default::default()));
        Self {
            view_id,
            coordinator,
            records,
            scales: ScaleSet::default(),
            tracker: BrushTracker::new(dimensions),
            projector,
        }
    }

    pub fn records(&self) -> &Arc<RecordSet> {
        &self.records
    }

    pub fn scales(&self) -> &ScaleSet {
        &self.scales
    }

    pub fn tracker(&self) -> &BrushTracker {
        &self.tracker
    }

    pub fn projector(&self) -> &Arc<HighlightProjector> {
        &self.projector
    }

    pub fn coordinator(&self) -> &Arc<SelectionCoordinator> {
        &self.coordinator
    }

    /// Move to a new dataset. Brushes are dropped without submitting: the
    /// coordinator resets on its own after every view has reset.
    pub fn reset(&mut self, records: Arc<RecordSet>, scales: ScaleSet, colors: impl IntoIterator<Item = (RecordId, egui::Color32)>) {
        self.tracker.reset(self.tracker.dimensions().to_vec());
        self.projector.reset(records.generation(), colors);
        self.records = records;
        self.scales = scales;
    }

    /// Swap scales for the same dataset (resize). Active brushes are in the
    /// old position space, so they are cleared and the clear is submitted.
    pub fn rescale(&mut self, scales: ScaleSet) {
        self.scales = scales;
        if self.tracker.clear_all() {
            self.emit();
        }
    }

    /// Set one extent and submit
    pub fn brush(&mut self, dimension: &str, low: f32, high: f32) -> Result<Option<Selection>, BrushError> {
        self.brush_many(&[(dimension, low, high)])
    }

    /// Set several extents as one gesture tick. Nothing changes unless every
    /// extent is valid.
    pub fn brush_many(&mut self, extents: &[(&str, f32, f32)]) -> Result<Option<Selection>, BrushError> {
        if let Err(e) = extents
            .iter()
            .try_for_each(|(dim, low, high)| self.tracker.validate(dim, *low, *high))
        {
            warn!("View {} dropped brush input: {}", self.view_id, e);
            return Err(e);
        }
        for (dim, low, high) in extents {
            self.tracker.set_brush(dim, *low, *high)?;
        }
        Ok(self.emit())
    }

    /// Gesture completion on one dimension
    pub fn end_gesture(&mut self, dimension: &str, extent: Option<(f32, f32)>) -> Result<Option<Selection>, BrushError> {
        if let Err(e) = self.tracker.end_gesture(dimension, extent) {
            warn!("View {} dropped gesture end: {}", self.view_id, e);
            return Err(e);
        }
        Ok(self.emit())
    }

    pub fn clear_brush(&mut self, dimension: &str) -> Result<Option<Selection>, BrushError> {
        self.end_gesture(dimension, None)
    }

    /// Drop every brush in this view and submit the resulting candidate
    pub fn clear_all(&mut self) -> Option<Selection> {
        self.tracker.clear_all();
        self.emit()
    }

    /// Submit the candidate of the current extents
    pub fn emit(&self) -> Option<Selection> {
        let candidate = self.tracker.candidate_selection(&self.records, &self.scales);
        self.coordinator.submit(candidate, self.view_id)
    }

    /// Transient hover, never submitted
    pub fn hover(&self, id: Option<RecordId>) -> bool {
        self.projector.set_hover(id)
    }
}
