//! Highlight projector: canonical selection to per-element visual emphasis

use ahash::AHashMap;
use egui::Color32;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use lv_core::{Generation, RecordId, Selection, SelectionSubscriber};

/// Source of animation time, in seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Wall clock measured from construction
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to
#[derive(Default)]
pub struct ManualClock {
    now: Mutex<f64>,
}

impl ManualClock {
    pub fn set(&self, seconds: f64) {
        *self.now.lock() = seconds;
    }

    pub fn advance(&self, seconds: f64) {
        *self.now.lock() += seconds;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock()
    }
}

/// Emphasis class of one element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emphasis {
    /// Nothing is brushed
    Baseline,
    Emphasized,
    DeEmphasized,
}

/// Rendered style of one element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualStyle {
    pub opacity: f32,
    pub color: Color32,
    pub stroke_width: f32,
}

impl VisualStyle {
    fn lerp(self, to: VisualStyle, t: f32) -> VisualStyle {
        if t >= 1.0 {
            return to;
        }
        if t <= 0.0 {
            return self;
        }
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        let [r0, g0, b0, a0] = self.color.to_srgba_unmultiplied();
        let [r1, g1, b1, a1] = to.color.to_srgba_unmultiplied();
        VisualStyle {
            opacity: self.opacity + (to.opacity - self.opacity) * t,
            color: Color32::from_rgba_unmultiplied(mix(r0, r1), mix(g0, g1), mix(b0, b1), mix(a0, a1)),
            stroke_width: self.stroke_width + (to.stroke_width - self.stroke_width) * t,
        }
    }

    /// Color with the opacity folded into alpha
    pub fn paint_color(&self) -> Color32 {
        let [r, g, b, a] = self.color.to_srgba_unmultiplied();
        let alpha = (self.opacity.clamp(0.0, 1.0) * a as f32).round() as u8;
        Color32::from_rgba_unmultiplied(r, g, b, alpha)
    }
}

/// Styling rules of one view
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectorStyle {
    pub baseline_opacity: f32,
    pub emphasized_opacity: f32,
    pub deemphasized_opacity: f32,
    pub baseline_width: f32,
    pub emphasized_width: f32,
    /// Replaces the element color when emphasized. `None` keeps it.
    pub emphasized_color: Option<Color32>,
    pub transition: Duration,
}

impl Default for ProjectorStyle {
    fn default() -> Self {
        Self {
            baseline_opacity: 0.3,
            emphasized_opacity: 1.0,
            deemphasized_opacity: 0.1,
            baseline_width: 1.0,
            emphasized_width: 2.0,
            emphasized_color: None,
            transition: Duration::from_millis(300),
        }
    }
}

impl ProjectorStyle {
    /// Scatter markers turn purple when selected
    pub fn scatter() -> Self {
        Self {
            emphasized_color: Some(Color32::from_rgb(128, 0, 128)),
            ..Self::default()
        }
    }

    /// Parallel lines keep their category color and get a thicker stroke
    pub fn parallel() -> Self {
        Self::default()
    }

    fn target(&self, emphasis: Emphasis, base: Color32) -> VisualStyle {
        match emphasis {
            Emphasis::Baseline => VisualStyle {
                opacity: self.baseline_opacity,
                color: base,
                stroke_width: self.baseline_width,
            },
            Emphasis::Emphasized => VisualStyle {
                opacity: self.emphasized_opacity,
                color: self.emphasized_color.unwrap_or(base),
                stroke_width: self.emphasized_width,
            },
            Emphasis::DeEmphasized => VisualStyle {
                opacity: self.deemphasized_opacity,
                color: base,
                stroke_width: self.baseline_width,
            },
        }
    }
}

/// Emphasized/de-emphasized split of a view's elements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmphasisPartition {
    pub baseline: Vec<RecordId>,
    pub emphasized: Vec<RecordId>,
    pub de_emphasized: Vec<RecordId>,
}

#[derive(Debug, Clone)]
struct ElementState {
    id: RecordId,
    base_color: Color32,
    emphasis: Emphasis,
    from: VisualStyle,
    to: VisualStyle,
    started_at: f64,
}

struct ProjectorState {
    generation: Generation,
    elements: Vec<ElementState>,
    index: AHashMap<RecordId, usize>,
    selection: Selection,
    hovered: Option<RecordId>,
}

/// Projects the canonical selection onto one view's elements.
///
/// Elements are keyed by record id. Ids in a selection that the view does
/// not draw are ignored, and selections computed against another dataset
/// generation are dropped entirely.
pub struct HighlightProjector {
    style: ProjectorStyle,
    clock: Arc<dyn Clock>,
    state: RwLock<ProjectorState>,
}

impl HighlightProjector {
    pub fn new(style: ProjectorStyle, clock: Arc<dyn Clock>) -> Self {
        Self {
            style,
            clock,
            state: RwLock::new(ProjectorState {
                generation: Generation::default(),
                elements: Vec::new(),
                index: AHashMap::new(),
                selection: Selection::default(),
                hovered: None,
            }),
        }
    }

    pub fn style(&self) -> &ProjectorStyle {
        &self.style
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Replace the element set for a new dataset. Everything starts at
    /// baseline with no transition.
    pub fn reset(&self, generation: Generation, elements: impl IntoIterator<Item = (RecordId, Color32)>) {
        let now = self.clock.now();
        let mut state = self.state.write();
        state.elements = elements
            .into_iter()
            .map(|(id, base_color)| {
                let style = self.style.target(Emphasis::Baseline, base_color);
                ElementState {
                    id,
                    base_color,
                    emphasis: Emphasis::Baseline,
                    from: style,
                    to: style,
                    started_at: now,
                }
            })
            .collect();
        state.index = state
            .elements
            .iter()
            .enumerate()
            .map(|(pos, e)| (e.id, pos))
            .collect();
        state.generation = generation;
        state.selection = Selection::unconstrained(generation);
        state.hovered = None;
    }

    /// Retarget every element to the emphasis `selection` implies. Each
    /// element's transition restarts from what is currently displayed, so
    /// rapid calls never queue. Returns false when the selection was dropped.
    pub fn apply_emphasis(&self, selection: &Selection) -> bool {
        let now = self.clock.now();
        let mut state = self.state.write();
        if selection.generation != state.generation {
            warn!(
                "Ignoring selection r{} for {} while showing {}",
                selection.revision, selection.generation, state.generation
            );
            return false;
        }

        for element in state.elements.iter_mut() {
            let emphasis = if selection.is_unconstrained() {
                Emphasis::Baseline
            } else if selection.contains(element.id) {
                Emphasis::Emphasized
            } else {
                Emphasis::DeEmphasized
            };
            let displayed = self.displayed(element, now);
            element.emphasis = emphasis;
            element.from = displayed;
            element.to = self.style.target(emphasis, element.base_color);
            element.started_at = now;
        }
        state.selection = selection.clone();
        true
    }

    fn progress(&self, element: &ElementState, now: f64) -> f32 {
        let duration = self.style.transition.as_secs_f64();
        if duration <= 0.0 {
            return 1.0;
        }
        ((now - element.started_at) / duration).clamp(0.0, 1.0) as f32
    }

    fn displayed(&self, element: &ElementState, now: f64) -> VisualStyle {
        element.from.lerp(element.to, self.progress(element, now))
    }

    /// Last selection applied
    pub fn selection(&self) -> Selection {
        self.state.read().selection.clone()
    }

    pub fn generation(&self) -> Generation {
        self.state.read().generation
    }

    pub fn len(&self) -> usize {
        self.state.read().elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn emphasis_of(&self, id: RecordId) -> Option<Emphasis> {
        let state = self.state.read();
        state.index.get(&id).map(|&pos| state.elements[pos].emphasis)
    }

    pub fn partition(&self) -> EmphasisPartition {
        let state = self.state.read();
        let mut partition = EmphasisPartition::default();
        for element in &state.elements {
            match element.emphasis {
                Emphasis::Baseline => partition.baseline.push(element.id),
                Emphasis::Emphasized => partition.emphasized.push(element.id),
                Emphasis::DeEmphasized => partition.de_emphasized.push(element.id),
            }
        }
        partition.baseline.sort_unstable();
        partition.emphasized.sort_unstable();
        partition.de_emphasized.sort_unstable();
        partition
    }

    /// Style of `id` at time `now`, hover layer included
    pub fn style_at(&self, id: RecordId, now: f64) -> Option<VisualStyle> {
        let state = self.state.read();
        let element = state.index.get(&id).map(|&pos| &state.elements[pos])?;
        let displayed = self.displayed(element, now);

        Some(match state.hovered {
            Some(hovered) if hovered == id => VisualStyle {
                opacity: self.style.emphasized_opacity,
                color: displayed.color,
                stroke_width: self.style.emphasized_width,
            },
            Some(_) => VisualStyle {
                opacity: displayed.opacity.min(self.style.deemphasized_opacity),
                ..displayed
            },
            None => displayed,
        })
    }

    /// Style of `id` now
    pub fn current_style(&self, id: RecordId) -> Option<VisualStyle> {
        self.style_at(id, self.clock.now())
    }

    /// Ids in drawing order: emphasized elements are raised above the rest,
    /// the hovered element above everything
    pub fn paint_order(&self) -> Vec<RecordId> {
        let state = self.state.read();
        let rank = |e: &ElementState| -> u8 {
            if state.hovered == Some(e.id) {
                2
            } else if e.emphasis == Emphasis::Emphasized {
                1
            } else {
                0
            }
        };
        let mut order: Vec<(u8, RecordId)> = state.elements.iter().map(|e| (rank(e), e.id)).collect();
        order.sort_unstable();
        order.into_iter().map(|(_, id)| id).collect()
    }

    /// Whether any transition is still running
    pub fn is_animating(&self) -> bool {
        let now = self.clock.now();
        let state = self.state.read();
        state.elements.iter().any(|e| self.progress(e, now) < 1.0 && e.from != e.to)
    }

    /// Transient single-element emphasis. Never touches the selection.
    /// Unknown ids are ignored.
    pub fn set_hover(&self, id: Option<RecordId>) -> bool {
        let mut state = self.state.write();
        match id {
            Some(id) if !state.index.contains_key(&id) => false,
            _ => {
                state.hovered = id;
                true
            }
        }
    }

    pub fn hovered(&self) -> Option<RecordId> {
        self.state.read().hovered
    }
}

impl SelectionSubscriber for HighlightProjector {
    fn on_selection_change(&self, selection: &Selection) {
        self.apply_emphasis(selection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lv_core::Membership;

    const GEN: Generation = Generation(1);

    fn projector() -> (HighlightProjector, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let projector = HighlightProjector::new(ProjectorStyle::scatter(), clock.clone());
        projector.reset(GEN, (0..3u64).map(|i| (RecordId(i), Color32::WHITE)));
        (projector, clock)
    }

    fn selection(ids: &[u64]) -> Selection {
        Selection {
            membership: Membership::only(ids.iter().map(|&i| RecordId(i))),
            origin: None,
            generation: GEN,
            revision: 1,
        }
    }

    #[test]
    fn test_selected_ids_emphasized_others_dimmed() {
        let (projector, clock) = projector();
        assert!(projector.apply_emphasis(&selection(&[1])));
        clock.advance(1.0);

        let partition = projector.partition();
        assert_eq!(partition.emphasized, vec![RecordId(1)]);
        assert_eq!(partition.de_emphasized, vec![RecordId(0), RecordId(2)]);

        let style = projector.current_style(RecordId(1)).unwrap();
        assert_eq!(style.opacity, 1.0);
        assert_eq!(style.color, Color32::from_rgb(128, 0, 128));
        assert_eq!(projector.current_style(RecordId(0)).unwrap().opacity, 0.1);
        assert_eq!(projector.paint_order().last(), Some(&RecordId(1)));
    }

    #[test]
    fn test_translucent_color_keeps_its_channels() {
        let close = |a: [u8; 4], b: [u8; 4]| a.iter().zip(b).all(|(x, y)| (*x as i16 - y as i16).abs() <= 2);
        let base = Color32::from_rgba_unmultiplied(201, 101, 50, 128);
        let style = VisualStyle {
            opacity: 1.0,
            color: base,
            stroke_width: 1.0,
        };
        assert!(close(style.paint_color().to_srgba_unmultiplied(), [201, 101, 50, 128]));

        let target = VisualStyle {
            color: Color32::from_rgba_unmultiplied(201, 101, 50, 255),
            ..style
        };
        let halfway = style.lerp(target, 0.5).color.to_srgba_unmultiplied();
        assert!(close(halfway, [201, 101, 50, 192]), "{:?}", halfway);
    }

    #[test]
    fn test_unconstrained_is_baseline_not_dimmed() {
        let (projector, clock) = projector();
        projector.apply_emphasis(&selection(&[]));
        clock.advance(1.0);
        assert_eq!(projector.partition().de_emphasized.len(), 3);

        projector.apply_emphasis(&Selection::unconstrained(GEN));
        clock.advance(1.0);
        let partition = projector.partition();
        assert_eq!(partition.baseline.len(), 3);
        assert_eq!(projector.current_style(RecordId(2)).unwrap().opacity, 0.3);
    }

    #[test]
    fn test_transition_restarts_from_displayed_value() {
        let (projector, clock) = projector();
        projector.apply_emphasis(&selection(&[0]));
        clock.advance(0.15);
        let halfway = projector.current_style(RecordId(0)).unwrap().opacity;
        assert!((halfway - 0.65).abs() < 1e-4);
        assert!(projector.is_animating());

        // superseding call starts from the half-way value, not from baseline
        projector.apply_emphasis(&Selection::unconstrained(GEN));
        assert!((projector.current_style(RecordId(0)).unwrap().opacity - halfway).abs() < 1e-4);
        clock.advance(0.5);
        assert_eq!(projector.current_style(RecordId(0)).unwrap().opacity, 0.3);
        assert!(!projector.is_animating());
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let (once, clock_once) = projector();
        let (twice, clock_twice) = projector();
        once.apply_emphasis(&selection(&[2]));
        twice.apply_emphasis(&selection(&[2]));
        twice.apply_emphasis(&selection(&[2]));
        clock_once.advance(1.0);
        clock_twice.advance(1.0);

        assert_eq!(once.partition(), twice.partition());
        for i in 0..3 {
            assert_eq!(once.current_style(RecordId(i)), twice.current_style(RecordId(i)));
        }
    }

    #[test]
    fn test_unknown_ids_and_stale_generation_ignored() {
        let (projector, _) = projector();
        assert!(projector.apply_emphasis(&selection(&[1, 99])));
        assert_eq!(projector.partition().emphasized, vec![RecordId(1)]);

        let stale = Selection {
            generation: Generation(0),
            ..selection(&[0])
        };
        assert!(!projector.apply_emphasis(&stale));
        assert_eq!(projector.partition().emphasized, vec![RecordId(1)]);
    }

    #[test]
    fn test_hover_is_reversible_and_local() {
        let (projector, clock) = projector();
        projector.apply_emphasis(&selection(&[1]));
        clock.advance(1.0);
        let before: Vec<_> = (0..3).map(|i| projector.current_style(RecordId(i))).collect();

        assert!(projector.set_hover(Some(RecordId(0))));
        let hovered = projector.current_style(RecordId(0)).unwrap();
        assert_eq!(hovered.opacity, 1.0);
        assert_eq!(hovered.stroke_width, 2.0);
        assert_eq!(projector.current_style(RecordId(1)).unwrap().opacity, 0.1);
        assert_eq!(projector.paint_order().last(), Some(&RecordId(0)));
        assert_eq!(projector.selection().ids(), vec![RecordId(1)]);

        projector.set_hover(None);
        let after: Vec<_> = (0..3).map(|i| projector.current_style(RecordId(i))).collect();
        assert_eq!(before, after);
        assert!(!projector.set_hover(Some(RecordId(42))));
    }
}
