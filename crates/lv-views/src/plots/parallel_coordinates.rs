//! Parallel coordinates plot with per-axis brushes

use egui::{pos2, vec2, Align2, Color32, FontId, Pos2, Rect, Rounding, Sense, Shape, Stroke, Ui, Vec2};
use std::any::Any;
use std::sync::Arc;
use uuid::Uuid;

use lv_core::{RecordId, Selection, SelectionCoordinator, ViewId};
use lv_data::{Domain, RecordSet};

use super::colors::{categorical_color, NEUTRAL};
use super::format_tick;
use crate::brush::{BrushError, BrushTracker};
use crate::highlight::{Clock, HighlightProjector, ProjectorStyle};
use crate::linked::{BrushLink, LinkedView, Margins};
use crate::scale::{PointScale, Scale, ScaleRange, ScaleSet};

/// Outer padding of the axis placement, in steps
const AXIS_PADDING: f32 = 1.0;

/// Parallel coordinates configuration
#[derive(Debug, Clone)]
pub struct ParallelCoordinatesConfig {
    pub title: String,
    /// Axes left to right
    pub dimensions: Vec<String>,
    /// Categorical dimension the lines are colored by
    pub color_column: Option<String>,
    /// Palette order of the color categories. Categories not listed follow
    /// in the order they appear in the data.
    pub color_categories: Vec<String>,

    pub size: Vec2,
    pub margins: Margins,

    /// Half width of the brushable band around an axis
    pub brush_half_width: f32,
    /// Pointer distance within which a line counts as hovered
    pub hover_distance: f32,
    pub style: ProjectorStyle,
}

impl Default for ParallelCoordinatesConfig {
    fn default() -> Self {
        Self {
            title: "Parallel Coordinates".to_string(),
            dimensions: ["price", "area", "bedrooms", "bathrooms", "stories", "parking"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            color_column: Some("furnishingstatus".to_string()),
            color_categories: ["furnished", "semi-furnished", "unfurnished"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            size: vec2(600.0, 400.0),
            margins: Margins::new(30.0, 50.0, 30.0, 50.0),
            brush_half_width: 10.0,
            hover_distance: 5.0,
            style: ProjectorStyle::parallel(),
        }
    }
}

/// One vertical axis per dimension and one polyline per record
pub struct ParallelCoordinatesView {
    id: ViewId,
    config: ParallelCoordinatesConfig,
    size: Vec2,
    link: BrushLink,
    axes: PointScale,
    brushing_axis: Option<(String, f32)>,
    drag_current: Option<f32>,
}

impl ParallelCoordinatesView {
    pub fn new(
        config: ParallelCoordinatesConfig,
        coordinator: Arc<SelectionCoordinator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let id = Uuid::new_v4();
        let projector = Arc::new(HighlightProjector::new(config.style.clone(), clock));
        let link = BrushLink::new(id, coordinator, projector, config.dimensions.clone());
        let axes = Self::place_axes(&config, config.size);
        Self {
            id,
            size: config.size,
            config,
            link,
            axes,
            brushing_axis: None,
            drag_current: None,
        }
    }

    pub fn config(&self) -> &ParallelCoordinatesConfig {
        &self.config
    }

    pub fn link(&self) -> &BrushLink {
        &self.link
    }

    fn place_axes(config: &ParallelCoordinatesConfig, size: Vec2) -> PointScale {
        let inner = config.margins.inner(size);
        PointScale::new(config.dimensions.clone(), ScaleRange::horizontal(inner.x), AXIS_PADDING)
    }

    fn build_scales(&self, records: &RecordSet) -> ScaleSet {
        let height = self.config.margins.inner(self.size).y;
        ScaleSet::build(
            records,
            self.config
                .dimensions
                .iter()
                .map(|d| (d.as_str(), ScaleRange::vertical(height))),
        )
    }

    /// Horizontal position of an axis inside the plotting area
    pub fn axis_x(&self, dimension: &str) -> Option<f32> {
        self.axes.map(dimension)
    }

    /// Axis whose brushable band contains `x`
    pub fn axis_at(&self, x: f32) -> Option<&str> {
        self.config
            .dimensions
            .iter()
            .enumerate()
            .map(|(idx, d)| (d.as_str(), (self.axes.position_at(idx) - x).abs()))
            .filter(|(_, dist)| *dist <= self.config.brush_half_width)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(d, _)| d)
    }

    /// Polyline of a record, `None` if any axis has no position for it
    pub fn polyline(&self, id: RecordId) -> Option<Vec<Pos2>> {
        let record = self.link.records().get(id)?;
        let scales = self.link.scales();
        self.config
            .dimensions
            .iter()
            .enumerate()
            .map(|(idx, d)| Some(pos2(self.axes.position_at(idx), scales.position(d, record)?)))
            .collect()
    }

    /// Brush `[low, high]` on one axis, in plotting-area coordinates
    pub fn brush_axis(&mut self, dimension: &str, low: f32, high: f32) -> Result<Option<Selection>, BrushError> {
        self.link.brush(dimension, low, high)
    }

    /// Gesture completion on one axis; `None` is a click that clears it
    pub fn end_axis_brush(&mut self, dimension: &str, extent: Option<(f32, f32)>) -> Result<Option<Selection>, BrushError> {
        self.link.end_gesture(dimension, extent)
    }

    /// Hover the line nearest to `pos`, if it is close enough
    pub fn hover_at(&self, pos: Option<Pos2>) -> Option<RecordId> {
        let hit = pos.and_then(|pos| {
            let mut best: Option<(RecordId, f32)> = None;
            for id in self.link.records().ids() {
                let Some(line) = self.polyline(id) else { continue };
                for segment in line.windows(2) {
                    let dist = distance_to_segment(pos, segment[0], segment[1]);
                    if dist <= self.config.hover_distance && best.map_or(true, |(_, d)| dist < d) {
                        best = Some((id, dist));
                    }
                }
            }
            best.map(|(id, _)| id)
        });
        self.link.hover(hit);
        hit
    }

    /// New view size: axes and scales are rebuilt and brushes cleared
    pub fn resize(&mut self, size: Vec2) {
        if self.size == size {
            return;
        }
        self.size = size;
        self.axes = Self::place_axes(&self.config, size);
        let records = self.link.records().clone();
        let scales = self.build_scales(&records);
        self.link.rescale(scales);
    }

    fn line_colors(&self, records: &RecordSet) -> Vec<(RecordId, Color32)> {
        let color_dim = self
            .config
            .color_column
            .as_deref()
            .and_then(|c| records.dimension(c))
            .and_then(|d| match &d.domain {
                Domain::Categorical(labels) => Some((d.index, labels)),
                Domain::Continuous { .. } => None,
            });

        records
            .records()
            .iter()
            .map(|record| {
                let color = color_dim
                    .as_ref()
                    .and_then(|(idx, labels)| {
                        let category = record.category(*idx)?;
                        let declared = &self.config.color_categories;
                        declared.iter().position(|c| c == category).or_else(|| {
                            labels
                                .iter()
                                .filter(|l| !declared.contains(*l))
                                .position(|l| l == category)
                                .map(|i| declared.len() + i)
                        })
                    })
                    .map(categorical_color)
                    .unwrap_or(NEUTRAL);
                (record.id, color)
            })
            .collect()
    }

    fn draw_axes(&self, painter: &egui::Painter, area: Rect, color: Color32) {
        let stroke = Stroke::new(1.0, color);
        let font = FontId::proportional(9.0);
        let scales = self.link.scales();

        for (idx, dimension) in self.config.dimensions.iter().enumerate() {
            let x = area.left() + self.axes.position_at(idx);
            painter.line_segment([pos2(x, area.top()), pos2(x, area.bottom())], stroke);
            painter.text(
                pos2(x, area.top() - 8.0),
                Align2::CENTER_BOTTOM,
                dimension,
                FontId::proportional(11.0),
                color,
            );

            match scales.get(dimension) {
                Some(Scale::Linear(scale)) => {
                    for tick in scale.ticks(5) {
                        let y = area.top() + scale.map(tick);
                        painter.line_segment([pos2(x - 3.0, y), pos2(x + 3.0, y)], stroke);
                        painter.text(pos2(x - 5.0, y), Align2::RIGHT_CENTER, format_tick(tick), font.clone(), color);
                    }
                }
                Some(Scale::Point(scale)) => {
                    for (i, label) in scale.domain().iter().enumerate() {
                        let y = area.top() + scale.position_at(i);
                        painter.line_segment([pos2(x - 3.0, y), pos2(x + 3.0, y)], stroke);
                        painter.text(pos2(x - 5.0, y), Align2::RIGHT_CENTER, label, font.clone(), color);
                    }
                }
                None => {}
            }

            // Draw brush if active
            if let Some(extent) = self.link.tracker().extent(dimension) {
                let brush_rect = Rect::from_min_max(
                    pos2(x - self.config.brush_half_width, area.top() + extent.low),
                    pos2(x + self.config.brush_half_width, area.top() + extent.high),
                );
                painter.rect_filled(brush_rect, Rounding::ZERO, Color32::from_rgba_unmultiplied(255, 200, 0, 50));
                painter.rect_stroke(brush_rect, Rounding::ZERO, Stroke::new(2.0, Color32::from_rgb(255, 200, 0)));
            }
        }
    }

    fn draw_lines(&self, painter: &egui::Painter, area: Rect) {
        let projector = self.link.projector();
        let now = projector.clock().now();
        for id in projector.paint_order() {
            if let (Some(line), Some(style)) = (self.polyline(id), projector.style_at(id, now)) {
                let points: Vec<Pos2> = line.into_iter().map(|p| area.min + p.to_vec2()).collect();
                painter.add(Shape::line(points, Stroke::new(style.stroke_width, style.paint_color())));
            }
        }
    }
}

impl LinkedView for ParallelCoordinatesView {
    fn id(&self) -> ViewId {
        self.id
    }

    fn title(&self) -> &str {
        &self.config.title
    }

    fn view_type(&self) -> &str {
        "ParallelCoordinatesView"
    }

    fn reset(&mut self, records: Arc<RecordSet>) {
        let scales = self.build_scales(&records);
        let colors = self.line_colors(&records);
        self.link.reset(records, scales, colors);
        self.brushing_axis = None;
        self.drag_current = None;
    }

    fn projector(&self) -> &Arc<HighlightProjector> {
        self.link.projector()
    }

    fn brush_tracker(&self) -> &BrushTracker {
        self.link.tracker()
    }

    fn clear_brushes(&mut self) -> Option<Selection> {
        self.link.clear_all()
    }

    fn ui(&mut self, ui: &mut Ui) {
        self.resize(vec2(ui.available_width(), self.config.size.y));

        let (response, painter) = ui.allocate_painter(self.size, Sense::click_and_drag());
        let origin = response.rect.min + self.config.margins.offset();
        let area = Rect::from_min_size(origin, self.config.margins.inner(self.size));
        let to_local = |p: Pos2| (p - origin).to_pos2();

        // Check for brush interaction
        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos().map(to_local) {
                self.brushing_axis = self.axis_at(pos.x).map(|d| (d.to_string(), pos.y));
                self.drag_current = Some(pos.y);
            }
        }
        if response.dragged() {
            let current = response.interact_pointer_pos().map(|p| to_local(p).y);
            if let (Some((dimension, start)), Some(y)) = (self.brushing_axis.clone(), current) {
                if self.drag_current != Some(y) {
                    self.drag_current = Some(y);
                    self.brush_axis(&dimension, start, y).ok();
                }
            }
        }
        if response.drag_released() {
            if let Some((dimension, start)) = self.brushing_axis.take() {
                let extent = self.drag_current.map(|y| (start, y));
                self.end_axis_brush(&dimension, extent).ok();
            }
            self.drag_current = None;
        } else if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos().map(to_local) {
                if let Some(dimension) = self.axis_at(pos.x).map(str::to_string) {
                    self.end_axis_brush(&dimension, None).ok();
                }
            }
        }
        if self.brushing_axis.is_none() {
            self.hover_at(response.hover_pos().map(to_local));
        }

        self.draw_lines(&painter, area);
        self.draw_axes(&painter, area, ui.visuals().text_color());

        if self.link.projector().is_animating() {
            ui.ctx().request_repaint();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Calculate distance from point to line segment
fn distance_to_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let ap = point - a;
    let ab_squared = ab.x * ab.x + ab.y * ab.y;

    if ab_squared == 0.0 {
        return ap.length();
    }

    let t = ((ap.x * ab.x + ap.y * ab.y) / ab_squared).clamp(0.0, 1.0);
    let projection = a + ab * t;
    (point - projection).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::ManualClock;
    use lv_core::Generation;
    use lv_data::{DimensionSpec, RawRow, Schema};

    fn records() -> Arc<RecordSet> {
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
        Arc::new(RecordSet::load(Arc::new(schema), rows, Generation(1)).unwrap())
    }

    /// Plotting area of 300 x 100 with axes at x = 75, 150, 225
    fn view() -> (ParallelCoordinatesView, Arc<SelectionCoordinator>) {
        let coordinator = Arc::new(SelectionCoordinator::default());
        let config = ParallelCoordinatesConfig {
            dimensions: vec!["price".into(), "area".into(), "furnishingstatus".into()],
            size: vec2(400.0, 160.0),
            ..ParallelCoordinatesConfig::default()
        };
        let mut view = ParallelCoordinatesView::new(config, coordinator.clone(), Arc::new(ManualClock::default()));
        view.reset(records());
        coordinator.register_view(view.id(), view.projector());
        coordinator.reset_for_reload(Generation(1));
        (view, coordinator)
    }

    #[test]
    fn test_axis_layout_and_polylines() {
        let (view, _) = view();
        assert_eq!(view.axis_x("price"), Some(75.0));
        assert_eq!(view.axis_x("furnishingstatus"), Some(225.0));
        assert_eq!(
            view.polyline(RecordId(1)),
            Some(vec![pos2(75.0, 50.0), pos2(150.0, 0.0), pos2(225.0, 25.0)])
        );
        assert_eq!(view.axis_at(80.0), Some("price"));
        assert_eq!(view.axis_at(112.0), None);
    }

    #[test]
    fn test_axis_brushes_intersect() {
        let (mut view, coordinator) = view();
        let selection = view.brush_axis("price", 75.0, 25.0).unwrap().unwrap();
        assert_eq!(selection.ids(), vec![RecordId(1)]);

        view.brush_axis("area", 0.0, 60.0).unwrap();
        assert_eq!(coordinator.selection().ids(), vec![RecordId(1)]);

        view.end_axis_brush("price", None).unwrap();
        assert_eq!(coordinator.selection().ids(), vec![RecordId(1), RecordId(2)]);
        assert_eq!(view.projector().partition().de_emphasized, vec![RecordId(0)]);

        assert!(view.clear_brushes().unwrap().is_unconstrained());
    }

    #[test]
    fn test_unknown_axis_is_rejected_locally() {
        let (mut view, coordinator) = view();
        let before = coordinator.selection();
        assert_eq!(
            view.brush_axis("lot_size", 0.0, 10.0),
            Err(BrushError::UnknownDimension("lot_size".into()))
        );
        assert_eq!(coordinator.selection(), before);
    }

    #[test]
    fn test_hover_by_distance_to_line() {
        let (view, coordinator) = view();
        let revision = coordinator.selection().revision;
        assert_eq!(view.hover_at(Some(pos2(90.0, 40.0))), Some(RecordId(1)));
        assert_eq!(view.hover_at(Some(pos2(150.0, 200.0))), None);
        assert_eq!(coordinator.selection().revision, revision);
    }

    #[test]
    fn test_lines_colored_by_category() {
        let (view, _) = view();
        let records = view.link().records().clone();
        let colors = view.line_colors(&records);
        assert_eq!(colors[0].1, categorical_color(0));
        assert_eq!(colors[1].1, categorical_color(2));
        assert_eq!(colors[2].1, categorical_color(0));
    }

    #[test]
    fn test_undeclared_categories_follow_declared_ones() {
        let (mut view, _) = view();
        view.config.color_categories = vec!["unfurnished".to_string()];
        let records = view.link().records().clone();
        let colors = view.line_colors(&records);
        assert_eq!(colors[1].1, categorical_color(0));
        assert_eq!(colors[0].1, categorical_color(1));
    }

    #[test]
    fn test_distance_to_segment() {
        let a = pos2(0.0, 0.0);
        let b = pos2(10.0, 0.0);
        assert_eq!(distance_to_segment(pos2(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(pos2(13.0, 4.0), a, b), 5.0);
        assert_eq!(distance_to_segment(pos2(1.0, 1.0), a, a), 2f32.sqrt());
    }
}
