//! Linked views for the housing dataset
//!
//! Scales, brushes and highlight projection, the scatter and
//! parallel-coordinates views built from them, and the session that links
//! the views through one selection coordinator.

pub mod brush;
pub mod highlight;
mod linked;
pub mod plots;
pub mod scale;
mod session;

pub use brush::{BrushError, BrushExtent, BrushTracker};
pub use highlight::{
    Clock, Emphasis, EmphasisPartition, HighlightProjector, ManualClock, ProjectorStyle, SystemClock, VisualStyle,
};
pub use linked::{BrushLink, LinkedView, Margins};
pub use plots::{ParallelCoordinatesConfig, ParallelCoordinatesView, ScatterPlotConfig, ScatterPlotView};
pub use scale::{LinearScale, PointScale, Scale, ScaleRange, ScaleSet};
pub use session::LinkedSession;
