//! Flattening engine and toggle coordination
//!
//! [`TreeFlattener`] drives a [`TreeSource`] traversal to produce the flat,
//! depth-first order of visible identities, consulting and updating the
//! [`NodeRegistry`] along the way.

use std::cell::{Ref, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use log::{debug, trace, warn};

use crate::error::{Result, TreeError};
use crate::node::{NodeDescriptor, ToggleHandle};
use crate::registry::{NodeRecord, NodeRegistry};
use crate::source::{Step, TreeSource};

/// Result of a complete walk, not yet applied to the registry
struct Walk<K, P> {
    order: Vec<K>,
    described: Vec<NodeDescriptor<K, P>>,
    revisited: Vec<K>,
}

/// Flattens a tree source into an ordered sequence of visible identities.
///
/// The flattener exclusively owns the registry of per-node state. Openness
/// changes only through [`toggle_nodes`](Self::toggle_nodes),
/// [`toggle`](Self::toggle) and the reset performed by
/// [`recompute_tree`](Self::recompute_tree).
pub struct TreeFlattener<S: TreeSource> {
    source: S,
    registry: NodeRegistry<S::Id, S::Payload>,
    order: Vec<S::Id>,
    generation: u64,
}

impl<S: TreeSource> TreeFlattener<S> {
    /// Create a flattener with an empty order.
    ///
    /// Nothing is traversed until [`recompute_tree`](Self::recompute_tree) is
    /// called.
    pub fn new(source: S) -> Self {
        Self {
            source,
            registry: NodeRegistry::new(),
            order: Vec::new(),
            generation: 0,
        }
    }

    /// The tree source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the tree source.
    ///
    /// Changes to the data become visible on the next recomputation.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// The per-node state registry
    pub fn registry(&self) -> &NodeRegistry<S::Id, S::Payload> {
        &self.registry
    }

    /// Visible identities in depth-first order
    pub fn flat_order(&self) -> &[S::Id] {
        &self.order
    }

    /// Number of visible rows
    pub fn row_count(&self) -> usize {
        self.order.len()
    }

    /// Number of successful recomputations so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Look up a node's record
    pub fn record(&self, id: &S::Id) -> Option<&NodeRecord<S::Id, S::Payload>> {
        self.registry.get(id)
    }

    /// Record of the node shown at a flat row index
    pub fn record_at(&self, index: usize) -> Option<&NodeRecord<S::Id, S::Payload>> {
        self.order.get(index).and_then(|id| self.registry.get(id))
    }

    /// Current openness of a registered node
    pub fn is_opened(&self, id: &S::Id) -> Option<bool> {
        self.registry.get(id).map(NodeRecord::is_opened)
    }

    /// Walk the tree source and publish a new flat order.
    ///
    /// `refresh` asks the source to rebuild its traversal state.
    /// `ignore_inner_state` resets every node encountered during the walk to
    /// its default openness, discarding user toggles.
    ///
    /// # Errors
    ///
    /// Returns a protocol violation if the source re-affirms an identity that
    /// was never registered or yields an identity twice. On error neither the
    /// flat order nor the registry changes.
    pub fn recompute_tree(&mut self, refresh: bool, ignore_inner_state: bool) -> Result<()> {
        let walk = match self.walk(refresh, ignore_inner_state) {
            Ok(walk) => walk,
            Err(err) => {
                warn!("Tree recomputation aborted: {}", err);
                return Err(err);
            }
        };

        let mut created = 0;
        for descriptor in walk.described {
            if self.registry.upsert(descriptor, ignore_inner_state) {
                created += 1;
            }
        }
        if ignore_inner_state {
            for id in &walk.revisited {
                self.registry.reset_openness(id);
            }
        }

        self.order = walk.order;
        self.generation += 1;
        debug!(
            "Recomputed tree (refresh={}, reset={}): {} rows, {} new records, {} registered",
            refresh,
            ignore_inner_state,
            self.order.len(),
            created,
            self.registry.len()
        );
        Ok(())
    }

    /// Drive one traversal to completion, staging every change
    fn walk(
        &mut self,
        refresh: bool,
        ignore_inner_state: bool,
    ) -> Result<Walk<S::Id, S::Payload>> {
        let registry = &self.registry;
        let mut traversal = self.source.traverse(refresh);

        let mut walk = Walk {
            order: Vec::new(),
            described: Vec::new(),
            revisited: Vec::new(),
        };
        let mut visited: HashSet<S::Id> = HashSet::new();
        let mut last_opened = false;

        loop {
            match traversal.resume(last_opened) {
                Step::Done => break,
                Step::Revisit(id) => {
                    let record = registry.get(&id).ok_or_else(|| TreeError::unregistered(&id))?;
                    if !visited.insert(id.clone()) {
                        return Err(TreeError::duplicate(&id));
                    }
                    last_opened = if ignore_inner_state {
                        record.descriptor().default_open
                    } else {
                        record.is_opened()
                    };
                    trace!("revisit {:?} (opened={})", id, last_opened);
                    walk.revisited.push(id.clone());
                    walk.order.push(id);
                }
                Step::Node(descriptor) => {
                    let id = descriptor.id.clone();
                    if !visited.insert(id.clone()) {
                        return Err(TreeError::duplicate(&id));
                    }
                    last_opened = match registry.get(&id) {
                        Some(record) if !ignore_inner_state => record.is_opened(),
                        _ => descriptor.default_open,
                    };
                    trace!(
                        "node {:?} (level={}, children={}, opened={})",
                        id,
                        descriptor.nesting_level,
                        descriptor.children_count,
                        last_opened
                    );
                    walk.described.push(descriptor);
                    walk.order.push(id);
                }
            }
        }

        Ok(walk)
    }

    /// Apply a batch of openness changes, then recompute once.
    ///
    /// Every identity is validated before anything is applied. If the
    /// recomputation fails the changes are rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownIdentity`] if any identity in the batch was
    /// never registered, or the protocol violation raised by the
    /// recomputation.
    pub fn toggle_nodes<I>(&mut self, changes: I) -> Result<()>
    where
        I: IntoIterator<Item = (S::Id, bool)>,
    {
        let changes: Vec<_> = changes.into_iter().collect();

        let mut previous = Vec::with_capacity(changes.len());
        for (id, _) in &changes {
            match self.registry.get(id) {
                Some(record) => previous.push((id.clone(), record.is_opened())),
                None => {
                    warn!("Rejected toggle batch: unknown node {:?}", id);
                    return Err(TreeError::unknown(id));
                }
            }
        }

        for (id, opened) in &changes {
            self.registry.set_openness(id, *opened)?;
        }

        if let Err(err) = self.recompute_tree(true, false) {
            // Restore in reverse so the earliest value wins for repeated ids
            for (id, opened) in previous.iter().rev() {
                self.registry.set_openness(id, *opened)?;
            }
            return Err(err);
        }
        Ok(())
    }

    /// Flip one node's openness and recompute.
    ///
    /// This is what a record's [`ToggleHandle`] stands for.
    pub fn toggle(&mut self, handle: &ToggleHandle<S::Id>) -> Result<()> {
        let opened = self
            .is_opened(handle.id())
            .ok_or_else(|| TreeError::unknown(handle.id()))?;
        self.toggle_nodes([(handle.id().clone(), !opened)])
    }

    /// Open every registered node that has children, as one batch
    pub fn open_all(&mut self) -> Result<()> {
        self.set_all(true)
    }

    /// Close every registered node that has children, as one batch
    pub fn close_all(&mut self) -> Result<()> {
        self.set_all(false)
    }

    fn set_all(&mut self, opened: bool) -> Result<()> {
        let changes: Vec<_> = self
            .registry
            .iter()
            .filter(|record| record.children_count() > 0)
            .map(|record| (record.id().clone(), opened))
            .collect();
        self.toggle_nodes(changes)
    }
}

/// A flattener shared between the owner and callbacks such as tree sources or
/// event handlers.
///
/// The flattener is not re-entrant. Issuing a recomputation or a toggle while
/// another is in flight returns [`TreeError::Reentrant`] instead of
/// interleaving with the running walk.
pub struct SharedFlattener<S: TreeSource> {
    inner: Rc<RefCell<TreeFlattener<S>>>,
}

impl<S: TreeSource> Clone for SharedFlattener<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: TreeSource> SharedFlattener<S> {
    /// Wrap a flattener for shared use
    pub fn new(flattener: TreeFlattener<S>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(flattener)),
        }
    }

    /// Borrow the flattener for reading
    pub fn borrow(&self) -> Result<Ref<'_, TreeFlattener<S>>> {
        self.inner.try_borrow().map_err(|_| TreeError::Reentrant)
    }

    /// See [`TreeFlattener::recompute_tree`]
    pub fn recompute_tree(&self, refresh: bool, ignore_inner_state: bool) -> Result<()> {
        self.with_mut(|flattener| flattener.recompute_tree(refresh, ignore_inner_state))
    }

    /// See [`TreeFlattener::toggle_nodes`]
    pub fn toggle_nodes<I>(&self, changes: I) -> Result<()>
    where
        I: IntoIterator<Item = (S::Id, bool)>,
    {
        self.with_mut(|flattener| flattener.toggle_nodes(changes))
    }

    /// See [`TreeFlattener::toggle`]
    pub fn toggle(&self, handle: &ToggleHandle<S::Id>) -> Result<()> {
        self.with_mut(|flattener| flattener.toggle(handle))
    }

    /// A callback that toggles `handle`'s node on this flattener.
    ///
    /// The callback keeps the flattener alive. Calling it while the flattener
    /// is borrowed returns [`TreeError::Reentrant`].
    pub fn bind(&self, handle: &ToggleHandle<S::Id>) -> impl Fn() -> Result<()> {
        let shared = self.clone();
        let handle = handle.clone();
        move || shared.toggle(&handle)
    }

    fn with_mut<R>(&self, f: impl FnOnce(&mut TreeFlattener<S>) -> Result<R>) -> Result<R> {
        let mut flattener = self.inner.try_borrow_mut().map_err(|_| {
            warn!("Rejected re-entrant tree update");
            TreeError::Reentrant
        })?;
        f(&mut flattener)
    }
}
