//! Tree source protocol
//!
//! A tree source owns the hierarchical data. The flattener never asks it for
//! children directly; instead it drives a resumable [`Traversal`] and answers
//! one question after every yielded node: "is that node open?". The source
//! only descends when the answer is `true`, so unopened subtrees are never
//! materialised and may be arbitrarily large or lazily loaded.

use std::collections::HashSet;
use std::hash::Hash;
use std::fmt;

use crate::node::NodeDescriptor;

/// One step of a traversal
#[derive(Debug, Clone, PartialEq)]
pub enum Step<K, P> {
    /// A node described in full
    Node(NodeDescriptor<K, P>),
    /// A node the flattener already knows, re-affirmed by identity only
    Revisit(K),
    /// The traversal is exhausted
    Done,
}

/// A resumable, generator-like traversal.
///
/// `previous_was_opened` tells the traversal whether the node it yielded last
/// is open. It is `false` on the first call, when nothing has been yielded.
/// After returning [`Step::Done`] a traversal is not resumed again.
pub trait Traversal<K, P> {
    /// Resume the traversal and return the next step
    fn resume(&mut self, previous_was_opened: bool) -> Step<K, P>;
}

impl<K, P, F> Traversal<K, P> for F
where
    F: FnMut(bool) -> Step<K, P>,
{
    fn resume(&mut self, previous_was_opened: bool) -> Step<K, P> {
        self(previous_was_opened)
    }
}

/// The data owner side of the protocol
///
/// # Example
///
/// ```ignore
/// impl TreeSource for MyTree {
///     type Id = String;
///     type Payload = MyData;
///
///     fn traverse(&mut self, refresh: bool) -> Box<dyn Traversal<String, MyData> + '_> {
///         let roots = self.root_descriptors();
///         Box::new(
///             DepthFirstWalker::new(roots, |id: &String| self.child_descriptors(id))
///         )
///     }
/// }
/// ```
pub trait TreeSource {
    /// Stable identity of a node
    type Id: Clone + Eq + Hash + fmt::Debug;
    /// Caller-owned data carried by each descriptor
    type Payload;

    /// Begin a traversal.
    ///
    /// With `refresh` set the source must rebuild its traversal state and
    /// describe every node in full rather than relying on cached state.
    fn traverse(&mut self, refresh: bool) -> Box<dyn Traversal<Self::Id, Self::Payload> + '_>;
}

struct LastYield<K> {
    id: K,
    children_count: usize,
    nesting_level: usize,
}

/// Explicit-stack, pre-order walker implementing [`Traversal`].
///
/// Roots are given up front; children are fetched through a closure only when
/// the flattener reports a node with children as open. The walker assigns
/// nesting levels itself: roots are at level 0 and children one below their
/// parent.
pub struct DepthFirstWalker<'a, K, P, F> {
    stack: Vec<NodeDescriptor<K, P>>,
    last: Option<LastYield<K>>,
    children: F,
    seen: Option<&'a mut HashSet<K>>,
    refresh: bool,
}

impl<'a, K, P, F> DepthFirstWalker<'a, K, P, F>
where
    K: Clone + Eq + Hash,
    F: FnMut(&K) -> Vec<NodeDescriptor<K, P>>,
{
    /// Create a walker over `roots`, fetching children with `children`
    pub fn new(roots: Vec<NodeDescriptor<K, P>>, children: F) -> Self {
        let mut stack = roots;
        for root in &mut stack {
            root.nesting_level = 0;
        }
        // Reverse so roots are popped in order
        stack.reverse();

        Self {
            stack,
            last: None,
            children,
            seen: None,
            refresh: true,
        }
    }

    /// Remember which nodes were described across traversals.
    ///
    /// Without `refresh`, nodes already present in `seen` are yielded as
    /// [`Step::Revisit`] instead of being described again. Every node that is
    /// described is added to `seen`.
    pub fn remember(mut self, seen: &'a mut HashSet<K>, refresh: bool) -> Self {
        self.seen = Some(seen);
        self.refresh = refresh;
        self
    }
}

impl<'a, K, P, F> Traversal<K, P> for DepthFirstWalker<'a, K, P, F>
where
    K: Clone + Eq + Hash,
    F: FnMut(&K) -> Vec<NodeDescriptor<K, P>>,
{
    fn resume(&mut self, previous_was_opened: bool) -> Step<K, P> {
        if let Some(last) = self.last.take() {
            if previous_was_opened && last.children_count > 0 {
                let children = (self.children)(&last.id);
                // Push in reverse so children are popped in order
                for mut child in children.into_iter().rev() {
                    child.nesting_level = last.nesting_level + 1;
                    self.stack.push(child);
                }
            }
        }

        let Some(node) = self.stack.pop() else {
            return Step::Done;
        };

        self.last = Some(LastYield {
            id: node.id.clone(),
            children_count: node.children_count,
            nesting_level: node.nesting_level,
        });

        match self.seen.as_deref_mut() {
            Some(seen) if !self.refresh && seen.contains(&node.id) => Step::Revisit(node.id),
            Some(seen) => {
                seen.insert(node.id.clone());
                Step::Node(node)
            }
            None => Step::Node(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn fixture() -> HashMap<&'static str, Vec<&'static str>> {
        // a
        //   b
        //     d
        //   c
        // e
        let mut children = HashMap::new();
        children.insert("a", vec!["b", "c"]);
        children.insert("b", vec!["d"]);
        children
    }

    fn describe(
        tree: &HashMap<&'static str, Vec<&'static str>>,
        id: &'static str,
    ) -> NodeDescriptor<&'static str, ()> {
        let count = tree.get(id).map(Vec::len).unwrap_or(0);
        NodeDescriptor::new(id, ()).children(count)
    }

    fn drain<T: Traversal<&'static str, ()>>(
        walker: &mut T,
        open: &[&str],
    ) -> Vec<(&'static str, usize, bool)> {
        let mut out = Vec::new();
        let mut last = false;
        loop {
            match walker.resume(last) {
                Step::Node(node) => {
                    last = open.contains(&node.id);
                    out.push((node.id, node.nesting_level, true));
                }
                Step::Revisit(id) => {
                    last = open.contains(&id);
                    out.push((id, 0, false));
                }
                Step::Done => return out,
            }
        }
    }

    #[test]
    fn test_walker_descends_only_when_open() {
        let tree = fixture();
        let roots = vec![describe(&tree, "a"), describe(&tree, "e")];
        let mut walker = DepthFirstWalker::new(roots, |id: &&'static str| {
            tree.get(id)
                .map(|c| c.iter().map(|&child| describe(&tree, child)).collect())
                .unwrap_or_default()
        });

        let steps = drain(&mut walker, &["a"]);
        assert_eq!(
            steps,
            vec![("a", 0, true), ("b", 1, true), ("c", 1, true), ("e", 0, true)]
        );
    }

    #[test]
    fn test_walker_preorder_when_everything_open() {
        let tree = fixture();
        let mut fetched = Vec::new();
        let roots = vec![describe(&tree, "a"), describe(&tree, "e")];
        let mut walker = DepthFirstWalker::new(roots, |id: &&'static str| {
            fetched.push(*id);
            tree.get(id)
                .map(|c| c.iter().map(|&child| describe(&tree, child)).collect())
                .unwrap_or_default()
        });

        let ids: Vec<_> = drain(&mut walker, &["a", "b", "c", "d", "e"])
            .into_iter()
            .map(|(id, level, _)| (id, level))
            .collect();
        drop(walker);

        assert_eq!(ids, vec![("a", 0), ("b", 1), ("d", 2), ("c", 1), ("e", 0)]);
        // Leaves are never asked for children
        assert_eq!(fetched, vec!["a", "b"]);
    }

    #[test]
    fn test_walker_revisits_remembered_nodes() {
        let tree = fixture();
        let mut seen = HashSet::new();
        let children = |id: &&'static str| {
            tree.get(id)
                .map(|c| c.iter().map(|&child| describe(&tree, child)).collect())
                .unwrap_or_default()
        };

        let roots = vec![describe(&tree, "a"), describe(&tree, "e")];
        let mut first = DepthFirstWalker::new(roots, children).remember(&mut seen, false);
        let steps = drain(&mut first, &[]);
        assert!(steps.iter().all(|&(_, _, full)| full));
        drop(first);

        let roots = vec![describe(&tree, "a"), describe(&tree, "e")];
        let mut second = DepthFirstWalker::new(roots, children).remember(&mut seen, false);
        let steps = drain(&mut second, &["a"]);
        assert_eq!(
            steps,
            vec![("a", 0, false), ("b", 1, true), ("c", 1, true), ("e", 0, false)]
        );
        drop(second);

        let roots = vec![describe(&tree, "a"), describe(&tree, "e")];
        let mut refreshed = DepthFirstWalker::new(roots, children).remember(&mut seen, true);
        let steps = drain(&mut refreshed, &["a"]);
        assert!(steps.iter().all(|&(_, _, full)| full));
    }

    #[test]
    fn test_closure_traversal() {
        let mut script = vec![Step::Done, Step::Revisit("x"), Step::Node(NodeDescriptor::new("r", ()))];
        let mut traversal = move |_open: bool| script.pop().unwrap_or(Step::Done);

        assert!(matches!(traversal.resume(false), Step::Node(_)));
        assert_eq!(traversal.resume(false), Step::Revisit("x"));
        assert_eq!(traversal.resume(false), Step::Done);
    }
}
