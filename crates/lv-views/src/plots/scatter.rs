//! Scatter plot view with a rectangular brush

use egui::{pos2, vec2, Align2, Color32, FontId, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};
use std::any::Any;
use std::sync::Arc;
use uuid::Uuid;

use lv_core::{RecordId, Selection, SelectionCoordinator, ViewId};
use lv_data::RecordSet;

use super::colors::NEUTRAL;
use super::format_tick;
use crate::brush::{BrushError, BrushTracker};
use crate::highlight::{Clock, HighlightProjector, ProjectorStyle};
use crate::linked::{BrushLink, LinkedView, Margins};
use crate::scale::{Scale, ScaleRange, ScaleSet};

/// Scatter plot configuration
#[derive(Debug, Clone)]
pub struct ScatterPlotConfig {
    pub title: String,
    pub x_column: String,
    pub y_column: String,

    /// Initial size of the whole view
    pub size: Vec2,
    pub margins: Margins,

    pub point_radius: f32,
    /// Pointer distance within which a point counts as hovered
    pub hover_radius: f32,
    pub base_color: Color32,
    pub style: ProjectorStyle,
}

impl Default for ScatterPlotConfig {
    fn default() -> Self {
        Self {
            title: "Price vs. Area".to_string(),
            x_column: "area".to_string(),
            y_column: "price".to_string(),
            size: vec2(600.0, 400.0),
            margins: Margins::new(100.0, 10.0, 50.0, 100.0),
            point_radius: 3.0,
            hover_radius: 6.0,
            base_color: NEUTRAL,
            style: ProjectorStyle::scatter(),
        }
    }
}

/// Scatter plot of two continuous dimensions.
///
/// The brush is a rectangle kept as two extents, one per axis, updated
/// together so each drag tick submits once.
pub struct ScatterPlotView {
    id: ViewId,
    config: ScatterPlotConfig,
    size: Vec2,
    link: BrushLink,
    drag_start: Option<Pos2>,
    drag_current: Option<Pos2>,
}

impl ScatterPlotView {
    pub fn new(config: ScatterPlotConfig, coordinator: Arc<SelectionCoordinator>, clock: Arc<dyn Clock>) -> Self {
        let id = Uuid::new_v4();
        let projector = Arc::new(HighlightProjector::new(config.style.clone(), clock));
        let link = BrushLink::new(
            id,
            coordinator,
            projector,
            vec![config.x_column.clone(), config.y_column.clone()],
        );
        Self {
            id,
            size: config.size,
            config,
            link,
            drag_start: None,
            drag_current: None,
        }
    }

    pub fn config(&self) -> &ScatterPlotConfig {
        &self.config
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn link(&self) -> &BrushLink {
        &self.link
    }

    fn build_scales(&self, records: &RecordSet) -> ScaleSet {
        let inner = self.config.margins.inner(self.size);
        ScaleSet::build(
            records,
            [
                (self.config.x_column.as_str(), ScaleRange::horizontal(inner.x)),
                (self.config.y_column.as_str(), ScaleRange::vertical(inner.y)),
            ],
        )
    }

    /// Position of a point inside the plotting area
    pub fn point_position(&self, id: RecordId) -> Option<Pos2> {
        let record = self.link.records().get(id)?;
        let scales = self.link.scales();
        Some(pos2(
            scales.position(&self.config.x_column, record)?,
            scales.position(&self.config.y_column, record)?,
        ))
    }

    /// Brush the rectangle spanned by two corners in plotting-area
    /// coordinates. A rectangle without area clears the brush.
    pub fn brush_rect(&mut self, a: Pos2, b: Pos2) -> Result<Option<Selection>, BrushError> {
        if a.x == b.x || a.y == b.y {
            return Ok(self.link.clear_all());
        }
        let (x, y) = (self.config.x_column.clone(), self.config.y_column.clone());
        self.link.brush_many(&[(x.as_str(), a.x, b.x), (y.as_str(), a.y, b.y)])
    }

    /// Gesture completion; `None` is a click that clears the brush
    pub fn end_brush(&mut self, rect: Option<(Pos2, Pos2)>) -> Result<Option<Selection>, BrushError> {
        match rect {
            Some((a, b)) => self.brush_rect(a, b),
            None => Ok(self.link.clear_all()),
        }
    }

    /// Hover the point nearest to `pos`, if it is close enough
    pub fn hover_at(&self, pos: Option<Pos2>) -> Option<RecordId> {
        let hit = pos.and_then(|pos| {
            self.link
                .records()
                .ids()
                .filter_map(|id| self.point_position(id).map(|p| (id, p.distance(pos))))
                .filter(|(_, d)| *d <= self.config.hover_radius)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id)
        });
        self.link.hover(hit);
        hit
    }

    /// New view size. Brushes are cleared because their extents are in the
    /// old position space.
    pub fn resize(&mut self, size: Vec2) {
        if self.size == size {
            return;
        }
        self.size = size;
        let records = self.link.records().clone();
        let scales = self.build_scales(&records);
        self.link.rescale(scales);
    }

    fn draw_axes(&self, painter: &egui::Painter, area: Rect, color: Color32) {
        let stroke = Stroke::new(1.0, color);
        painter.rect_stroke(area, Rounding::ZERO, stroke);
        let font = FontId::proportional(10.0);
        let scales = self.link.scales();

        if let Some(Scale::Linear(x)) = scales.get(&self.config.x_column) {
            for tick in x.ticks(5) {
                let px = area.left() + x.map(tick);
                painter.line_segment([pos2(px, area.bottom()), pos2(px, area.bottom() + 4.0)], stroke);
                painter.text(pos2(px, area.bottom() + 6.0), Align2::CENTER_TOP, format_tick(tick), font.clone(), color);
            }
        }
        if let Some(Scale::Linear(y)) = scales.get(&self.config.y_column) {
            for tick in y.ticks(5) {
                let py = area.top() + y.map(tick);
                painter.line_segment([pos2(area.left() - 4.0, py), pos2(area.left(), py)], stroke);
                painter.text(pos2(area.left() - 6.0, py), Align2::RIGHT_CENTER, format_tick(tick), font.clone(), color);
            }
        }

        let label_font = FontId::proportional(12.0);
        painter.text(
            pos2(area.center().x, area.bottom() + 28.0),
            Align2::CENTER_TOP,
            &self.config.x_column,
            label_font.clone(),
            color,
        );
        painter.text(
            pos2(area.left() - 60.0, area.top()),
            Align2::RIGHT_TOP,
            &self.config.y_column,
            label_font,
            color,
        );
    }

    fn draw_brush(&self, painter: &egui::Painter, area: Rect) {
        let tracker = self.link.tracker();
        if let (Some(x), Some(y)) = (tracker.extent(&self.config.x_column), tracker.extent(&self.config.y_column)) {
            let rect = Rect::from_min_max(
                area.min + vec2(x.low, y.low),
                area.min + vec2(x.high, y.high),
            );
            painter.rect_filled(rect, Rounding::ZERO, Color32::from_rgba_unmultiplied(200, 200, 200, 30));
            painter.rect_stroke(rect, Rounding::ZERO, Stroke::new(1.0, Color32::from_gray(200)));
        }
    }
}

impl LinkedView for ScatterPlotView {
    fn id(&self) -> ViewId {
        self.id
    }

    fn title(&self) -> &str {
        &self.config.title
    }

    fn view_type(&self) -> &str {
        "ScatterPlotView"
    }

    fn reset(&mut self, records: Arc<RecordSet>) {
        let scales = self.build_scales(&records);
        let base = self.config.base_color;
        let colors: Vec<_> = records.ids().map(|id| (id, base)).collect();
        self.link.reset(records, scales, colors);
        self.drag_start = None;
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

        // Handle interactions
        if response.drag_started() {
            self.drag_start = response.interact_pointer_pos().map(to_local);
            self.drag_current = self.drag_start;
        }
        if response.dragged() {
            let current = response.interact_pointer_pos().map(to_local);
            if let (Some(start), Some(cur)) = (self.drag_start, current) {
                if self.drag_current != Some(cur) {
                    self.drag_current = Some(cur);
                    self.brush_rect(start, cur).ok();
                }
            }
        }
        if response.drag_released() {
            let rect = self.drag_start.zip(self.drag_current);
            self.end_brush(rect).ok();
            self.drag_start = None;
            self.drag_current = None;
        } else if response.clicked() {
            self.end_brush(None).ok();
        }
        if self.drag_start.is_none() {
            self.hover_at(response.hover_pos().map(to_local));
        }

        let text_color = ui.visuals().text_color();
        self.draw_axes(&painter, area, text_color);

        let projector = self.link.projector();
        let now = projector.clock().now();
        for id in projector.paint_order() {
            if let (Some(p), Some(style)) = (self.point_position(id), projector.style_at(id, now)) {
                let radius = self.config.point_radius + (style.stroke_width - 1.0).max(0.0);
                painter.circle_filled(origin + p.to_vec2(), radius, style.paint_color());
            }
        }

        self.draw_brush(&painter, area);

        if projector.is_animating() {
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
