//! The canonical selection value and the candidates views submit for it

use ahash::AHashSet;
use std::sync::Arc;

use crate::ids::{Generation, RecordId, ViewId};

/// Which records a selection covers.
///
/// `Unconstrained` means nothing is brushed and every element is drawn at
/// baseline. `Only` with an empty set means the brushes exclude everything.
#[derive(Debug, Clone, Default)]
pub enum Membership {
    #[default]
    Unconstrained,
    Only(Arc<AHashSet<RecordId>>),
}

impl Membership {
    /// Build a constrained membership from any collection of ids
    pub fn only(ids: impl IntoIterator<Item = RecordId>) -> Self {
        Membership::Only(Arc::new(ids.into_iter().collect()))
    }

    pub fn is_unconstrained(&self) -> bool {
        matches!(self, Membership::Unconstrained)
    }

    /// Whether `id` is part of a constrained set. Always false when unconstrained.
    pub fn contains(&self, id: RecordId) -> bool {
        match self {
            Membership::Unconstrained => false,
            Membership::Only(ids) => ids.contains(&id),
        }
    }

    /// Number of selected ids, `None` when unconstrained
    pub fn len(&self) -> Option<usize> {
        match self {
            Membership::Unconstrained => None,
            Membership::Only(ids) => Some(ids.len()),
        }
    }

    /// Sorted snapshot of the selected ids
    pub fn ids(&self) -> Vec<RecordId> {
        match self {
            Membership::Unconstrained => Vec::new(),
            Membership::Only(ids) => {
                let mut sorted: Vec<RecordId> = ids.iter().copied().collect();
                sorted.sort_unstable();
                sorted
            }
        }
    }
}

impl PartialEq for Membership {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Membership::Unconstrained, Membership::Unconstrained) => true,
            (Membership::Only(a), Membership::Only(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl Eq for Membership {}

/// A selection a view computed locally from its brushes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSelection {
    pub membership: Membership,
    /// Dataset snapshot the candidate was computed against
    pub generation: Generation,
}

impl CandidateSelection {
    pub fn new(membership: Membership, generation: Generation) -> Self {
        Self { membership, generation }
    }

    /// Explicit "selection cleared" signal
    pub fn cleared(generation: Generation) -> Self {
        Self::new(Membership::Unconstrained, generation)
    }
}

/// The canonical, system-wide selection.
///
/// Replaced wholesale on every reconciliation. Clones share the id set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub membership: Membership,
    /// View whose gesture produced this selection. Diagnostic only.
    pub origin: Option<ViewId>,
    pub generation: Generation,
    /// Increases by one on every replacement
    pub revision: u64,
}

impl Selection {
    pub fn unconstrained(generation: Generation) -> Self {
        Self {
            membership: Membership::Unconstrained,
            origin: None,
            generation,
            revision: 0,
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.membership.is_unconstrained()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.membership.contains(id)
    }

    pub fn len(&self) -> Option<usize> {
        self.membership.len()
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.membership.ids()
    }
}
