//! Single-selection state.

use super::element::{ElementId, find_tagged};
use crate::dom::{ArenaDom, NodeId};

/// Either nothing is selected or exactly one element id is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Unselected,
    Selected(ElementId),
}

impl SelectionState {
    pub fn id(&self) -> Option<&ElementId> {
        match self {
            SelectionState::Unselected => None,
            SelectionState::Selected(id) => Some(id),
        }
    }

    pub fn is_selected(&self, id: &ElementId) -> bool {
        self.id() == Some(id)
    }

    /// Resolve the selected id against the live container.
    ///
    /// Never cached: the node may have been deleted or replaced since.
    pub fn element(&self, dom: &ArenaDom, container: NodeId) -> Option<NodeId> {
        self.id().and_then(|id| find_tagged(dom, container, id))
    }
}
