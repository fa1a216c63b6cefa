//! Per-node state that survives repeated flattenings

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::error::{Result, TreeError};
use crate::node::{NodeDescriptor, ToggleHandle};

/// Mutable state for one node, keyed by its identity
#[derive(Debug)]
pub struct NodeRecord<K, P> {
    descriptor: NodeDescriptor<K, P>,
    opened: bool,
    toggle: ToggleHandle<K>,
}

impl<K: Clone, P> NodeRecord<K, P> {
    fn new(descriptor: NodeDescriptor<K, P>) -> Self {
        Self {
            opened: descriptor.default_open,
            toggle: ToggleHandle::new(descriptor.id.clone()),
            descriptor,
        }
    }
}

impl<K, P> NodeRecord<K, P> {
    /// The node's identity
    pub fn id(&self) -> &K {
        &self.descriptor.id
    }

    /// The most recent descriptor seen for this node
    pub fn descriptor(&self) -> &NodeDescriptor<K, P> {
        &self.descriptor
    }

    /// Whether the node's children are descended into
    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /// The node's toggle handle, stable for the lifetime of the record
    pub fn toggle_handle(&self) -> &ToggleHandle<K> {
        &self.toggle
    }

    /// Depth from the root, as of the latest descriptor
    pub fn nesting_level(&self) -> usize {
        self.descriptor.nesting_level
    }

    /// Number of direct children, as of the latest descriptor
    pub fn children_count(&self) -> usize {
        self.descriptor.children_count
    }

    /// Payload of the latest descriptor
    pub fn payload(&self) -> &P {
        &self.descriptor.payload
    }
}

/// Mapping from node identity to [`NodeRecord`].
///
/// Records are created the first time an identity is seen and are never
/// removed, so collapsing a subtree and reopening it later restores the
/// openness of everything below it. Memory therefore grows with the number of
/// distinct identities ever seen.
#[derive(Debug)]
pub struct NodeRegistry<K, P> {
    records: HashMap<K, NodeRecord<K, P>>,
}

impl<K, P> Default for NodeRegistry<K, P> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
        }
    }
}

impl<K, P> NodeRegistry<K, P>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no node has been registered
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record
    pub fn get(&self, id: &K) -> Option<&NodeRecord<K, P>> {
        self.records.get(id)
    }

    /// Returns true if `id` has been registered
    pub fn contains(&self, id: &K) -> bool {
        self.records.contains_key(id)
    }

    /// Iterate over every registered record, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &NodeRecord<K, P>> {
        self.records.values()
    }

    /// Register a node or refresh its descriptor.
    ///
    /// A new record starts with the descriptor's default openness. An existing
    /// record keeps its openness and takes the new descriptor.
    pub fn get_or_create(&mut self, descriptor: NodeDescriptor<K, P>) -> &NodeRecord<K, P> {
        let id = descriptor.id.clone();
        self.upsert(descriptor, false);
        &self.records[&id]
    }

    /// Set a registered node's openness.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownIdentity`] if `id` was never registered.
    pub fn set_openness(&mut self, id: &K, opened: bool) -> Result<()> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| TreeError::unknown(id))?;
        record.opened = opened;
        Ok(())
    }

    /// Insert or refresh a record, returning true if it was created.
    ///
    /// With `reset`, an existing record's openness goes back to the
    /// descriptor's default.
    pub(crate) fn upsert(&mut self, descriptor: NodeDescriptor<K, P>, reset: bool) -> bool {
        match self.records.get_mut(&descriptor.id) {
            Some(record) => {
                if reset {
                    record.opened = descriptor.default_open;
                }
                record.descriptor = descriptor;
                false
            }
            None => {
                self.records
                    .insert(descriptor.id.clone(), NodeRecord::new(descriptor));
                true
            }
        }
    }

    /// Reset a registered node's openness to its latest descriptor's default
    pub(crate) fn reset_openness(&mut self, id: &K) {
        if let Some(record) = self.records.get_mut(id) {
            record.opened = record.descriptor.default_open;
        }
    }
}
