//! Node descriptors and per-node handles

use std::fmt;
use std::rc::Rc;

use crate::render::RowStyle;

/// A snapshot of one tree node, produced fresh by the tree source on every
/// traversal.
///
/// The `id` is what makes two descriptors from different traversals "the same
/// node". Everything else may change between traversals and is simply
/// replaced in the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDescriptor<K, P> {
    /// Stable identity of the node
    pub id: K,
    /// Number of direct children (0 for a leaf)
    pub children_count: usize,
    /// Depth from the root (root = 0)
    pub nesting_level: usize,
    /// Openness used when the node is first registered or reset
    pub default_open: bool,
    /// Caller-owned data, re-supplied every traversal
    pub payload: P,
    /// Row size for this node, replacing the configured row size
    pub size_override: Option<f32>,
    /// Row style for this node, replacing the style the surface supplies
    pub style_override: Option<RowStyle>,
}

impl<K, P> NodeDescriptor<K, P> {
    /// Create a closed leaf descriptor at nesting level 0
    pub fn new(id: K, payload: P) -> Self {
        Self {
            id,
            children_count: 0,
            nesting_level: 0,
            default_open: false,
            payload,
            size_override: None,
            style_override: None,
        }
    }

    /// Set the number of direct children
    pub fn children(mut self, count: usize) -> Self {
        self.children_count = count;
        self
    }

    /// Set the nesting level
    pub fn level(mut self, level: usize) -> Self {
        self.nesting_level = level;
        self
    }

    /// Set the default openness
    pub fn open(mut self, open: bool) -> Self {
        self.default_open = open;
        self
    }

    /// Set the row size override
    pub fn size(mut self, size: f32) -> Self {
        self.size_override = Some(size);
        self
    }

    /// Set the row style override
    pub fn style(mut self, style: RowStyle) -> Self {
        self.style_override = Some(style);
        self
    }

    /// Returns true if the node has no children
    pub fn is_leaf(&self) -> bool {
        self.children_count == 0
    }
}

/// Stable handle that toggles one node.
///
/// One handle is created when a node is first registered and the same handle
/// is handed out for that node from then on, so consumers can compare handles
/// with [`ToggleHandle::ptr_eq`] across render passes.
///
/// The handle only names the node and holds no reference to the engine, so a
/// row renderer cannot fire it on its own. The owner passes it back to
/// `TreeFlattener::toggle` or `TreeView::toggle`, or turns it into a callback
/// bound to a shared engine with `SharedFlattener::bind`.
pub struct ToggleHandle<K> {
    id: Rc<K>,
}

impl<K> ToggleHandle<K> {
    pub(crate) fn new(id: K) -> Self {
        Self { id: Rc::new(id) }
    }

    /// The identity this handle toggles
    pub fn id(&self) -> &K {
        &self.id
    }

    /// Returns true if both handles were issued for the same record
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.id, &other.id)
    }
}

impl<K> Clone for ToggleHandle<K> {
    fn clone(&self) -> Self {
        Self {
            id: Rc::clone(&self.id),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for ToggleHandle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ToggleHandle").field(&*self.id).finish()
    }
}
