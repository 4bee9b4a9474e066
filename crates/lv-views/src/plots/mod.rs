//! Plot view implementations

pub mod colors;
pub mod parallel_coordinates;
pub mod scatter;

// Re-exports
pub use parallel_coordinates::{ParallelCoordinatesConfig, ParallelCoordinatesView};
pub use scatter::{ScatterPlotConfig, ScatterPlotView};

/// Short axis label for a tick value
pub(crate) fn format_tick(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if magnitude >= 1e3 {
        format!("{:.0}k", value / 1e3)
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}
