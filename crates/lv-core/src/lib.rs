//! Core functionality for the linked housing views
//!
//! This crate provides the identifiers, the canonical selection value and the
//! coordinator that keeps every view's selection in sync.

pub mod events;
pub mod ids;
pub mod selection;
pub mod sync;

// Re-export commonly used types
pub use events::{EventBus, Event, EventHandler, handler_from_fn};
pub use ids::{Generation, RecordId, ViewId};
pub use selection::{CandidateSelection, Membership, Selection};
pub use sync::{SelectionCoordinator, SelectionSubscriber};
