//! In-memory tree source
//!
//! A simple data owner for trees that live entirely in memory. Nodes are named
//! by string identities; each node stores its payload, default openness and
//! ordered children.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, TreeError};
use crate::node::NodeDescriptor;
use crate::source::{DepthFirstWalker, Traversal, TreeSource};

#[derive(Debug, Clone)]
struct MemNode<P> {
    payload: P,
    parent: Option<String>,
    children: Vec<String>,
    default_open: bool,
    size: Option<f32>,
}

/// A tree held in memory, implementing [`TreeSource`].
///
/// Without `refresh`, nodes described by an earlier traversal are re-affirmed
/// by identity only, unless they changed since. Every mutator forgets the
/// nodes whose descriptor it changes, so they are described again.
///
/// # Example
///
/// ```
/// use flat_tree::prelude::*;
///
/// let mut tree = MemoryTree::new();
/// tree.add_root("src", ()).unwrap();
/// tree.add_child("src", "lib.rs", ()).unwrap();
///
/// let mut flattener = TreeFlattener::new(tree);
/// flattener.recompute_tree(true, true).unwrap();
/// assert_eq!(flattener.flat_order(), ["src"]);
/// ```
#[derive(Debug)]
pub struct MemoryTree<P> {
    nodes: HashMap<String, MemNode<P>>,
    roots: Vec<String>,
    seen: HashSet<String>,
}

impl<P> Default for MemoryTree<P> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            seen: HashSet::new(),
        }
    }
}

/// A clone has never been traversed, so its first traversal describes
/// every node in full.
impl<P: Clone> Clone for MemoryTree<P> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            roots: self.roots.clone(),
            seen: HashSet::new(),
        }
    }
}

impl<P: Clone> MemoryTree<P> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if a node with this identity exists
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Append a root node
    pub fn add_root(&mut self, id: impl Into<String>, payload: P) -> Result<()> {
        self.insert(None, id.into(), payload)
    }

    /// Append a child to `parent`
    pub fn add_child(&mut self, parent: &str, id: impl Into<String>, payload: P) -> Result<()> {
        self.insert(Some(parent), id.into(), payload)
    }

    fn insert(&mut self, parent: Option<&str>, id: String, payload: P) -> Result<()> {
        if self.nodes.contains_key(&id) {
            return Err(TreeError::in_use(&id));
        }
        match parent {
            Some(parent) => self.node_mut(parent)?.children.push(id.clone()),
            None => self.roots.push(id.clone()),
        }

        self.nodes.insert(
            id,
            MemNode {
                payload,
                parent: parent.map(str::to_string),
                children: Vec::new(),
                default_open: false,
                size: None,
            },
        );
        Ok(())
    }

    /// Mutable access to a node, which is then described again on the next
    /// traversal
    fn node_mut(&mut self, id: &str) -> Result<&mut MemNode<P>> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::unknown(&id))?;
        self.seen.remove(id);
        Ok(node)
    }

    /// Set the openness a node starts with
    pub fn set_default_open(&mut self, id: &str, open: bool) -> Result<()> {
        self.node_mut(id)?.default_open = open;
        Ok(())
    }

    /// Replace a node's payload
    pub fn set_payload(&mut self, id: &str, payload: P) -> Result<()> {
        self.node_mut(id)?.payload = payload;
        Ok(())
    }

    /// Set or clear a node's row size override
    pub fn set_size(&mut self, id: &str, size: Option<f32>) -> Result<()> {
        self.node_mut(id)?.size = size;
        Ok(())
    }

    /// Children of a node, in order
    pub fn children(&self, id: &str) -> Option<&[String]> {
        self.nodes.get(id).map(|node| node.children.as_slice())
    }

    /// Parent of a node; `None` for roots and unknown identities
    pub fn parent(&self, id: &str) -> Option<&str> {
        self.nodes.get(id)?.parent.as_deref()
    }

    /// Remove a node and its whole subtree
    pub fn remove(&mut self, id: &str) -> Result<()> {
        let node = self.nodes.get(id).ok_or_else(|| TreeError::unknown(&id))?;
        match node.parent.clone() {
            Some(parent) => {
                if let Ok(parent) = self.node_mut(&parent) {
                    parent.children.retain(|child| child != id);
                }
            }
            None => self.roots.retain(|root| root != id),
        }

        let mut pending = vec![id.to_string()];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                pending.extend(node.children);
            }
            // A re-added node must be described again
            self.seen.remove(&current);
        }
        Ok(())
    }
}

fn describe<P: Clone>(
    nodes: &HashMap<String, MemNode<P>>,
    id: &str,
) -> Option<NodeDescriptor<String, P>> {
    let node = nodes.get(id)?;
    let mut descriptor = NodeDescriptor::new(id.to_string(), node.payload.clone())
        .children(node.children.len())
        .open(node.default_open);
    descriptor.size_override = node.size;
    Some(descriptor)
}

impl<P: Clone> TreeSource for MemoryTree<P> {
    type Id = String;
    type Payload = P;

    fn traverse(&mut self, refresh: bool) -> Box<dyn Traversal<String, P> + '_> {
        let nodes = &self.nodes;
        let roots = self
            .roots
            .iter()
            .filter_map(|id| describe(nodes, id))
            .collect();

        let walker = DepthFirstWalker::new(roots, move |id: &String| {
            nodes
                .get(id)
                .map(|node| {
                    node.children
                        .iter()
                        .filter_map(|child| describe(nodes, child))
                        .collect()
                })
                .unwrap_or_default()
        })
        .remember(&mut self.seen, refresh);

        Box::new(walker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Step;

    fn sample() -> MemoryTree<u32> {
        let mut tree = MemoryTree::new();
        tree.add_root("a", 1).unwrap();
        tree.add_child("a", "b", 2).unwrap();
        tree.add_child("b", "c", 3).unwrap();
        tree.add_root("d", 4).unwrap();
        tree
    }

    fn ids(tree: &mut MemoryTree<u32>, refresh: bool, open: bool) -> Vec<(String, bool)> {
        let mut traversal = tree.traverse(refresh);
        let mut out = Vec::new();
        loop {
            match traversal.resume(open) {
                Step::Node(node) => out.push((node.id, true)),
                Step::Revisit(id) => out.push((id, false)),
                Step::Done => return out,
            }
        }
    }

    #[test]
    fn test_structure() {
        let tree = sample();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.children("a").unwrap(), ["b"]);
        assert_eq!(tree.parent("c"), Some("b"));
        assert_eq!(tree.parent("a"), None);
    }

    #[test]
    fn test_insert_errors() {
        let mut tree = sample();
        assert!(matches!(
            tree.add_root("a", 0),
            Err(TreeError::IdentityInUse { .. })
        ));
        assert!(matches!(
            tree.add_child("nope", "x", 0),
            Err(TreeError::UnknownIdentity { .. })
        ));
        assert!(!tree.contains("x"));
    }

    #[test]
    fn test_traverse_describes_then_revisits() {
        let mut tree = sample();
        let first = ids(&mut tree, false, true);
        assert_eq!(
            first,
            vec![
                ("a".to_string(), true),
                ("b".to_string(), true),
                ("c".to_string(), true),
                ("d".to_string(), true),
            ]
        );

        let second = ids(&mut tree, false, true);
        assert!(second.iter().all(|(_, full)| !full));

        let refreshed = ids(&mut tree, true, true);
        assert!(refreshed.iter().all(|(_, full)| *full));
    }

    #[test]
    fn test_remove_subtree() {
        let mut tree = sample();
        ids(&mut tree, true, true);

        tree.remove("b").unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.children("a").unwrap().is_empty());

        tree.add_child("a", "b", 9).unwrap();
        // "b" was forgotten, so it is described again
        let steps = ids(&mut tree, false, true);
        assert_eq!(steps[1], ("b".to_string(), true));
        assert_eq!(steps[0], ("a".to_string(), false));
    }

    #[test]
    fn test_mutated_nodes_are_described_again() {
        let mut tree = sample();
        ids(&mut tree, true, true);

        tree.add_child("c", "e", 5).unwrap();
        tree.set_payload("d", 40).unwrap();
        let steps = ids(&mut tree, false, true);
        assert_eq!(
            steps,
            vec![
                ("a".to_string(), false),
                ("b".to_string(), false),
                ("c".to_string(), true),
                ("e".to_string(), true),
                ("d".to_string(), true),
            ]
        );

        // Nothing changed since, so everything is re-affirmed
        let steps = ids(&mut tree, false, true);
        assert!(steps.iter().all(|(_, full)| !full));

        tree.remove("e").unwrap();
        let steps = ids(&mut tree, false, true);
        assert_eq!(steps[2], ("c".to_string(), true));
    }

    #[test]
    fn test_clone_starts_untraversed() {
        let mut tree = sample();
        ids(&mut tree, true, true);

        let mut copy = tree.clone();
        let steps = ids(&mut copy, false, true);
        assert_eq!(steps.len(), 4);
        assert!(steps.iter().all(|(_, full)| *full));
    }

    #[test]
    fn test_descriptor_fields() {
        let mut tree = sample();
        tree.set_default_open("a", true).unwrap();
        tree.set_size("a", Some(40.0)).unwrap();
        tree.set_payload("a", 10).unwrap();
        assert!(tree.set_size("zzz", None).is_err());

        let mut traversal = tree.traverse(true);
        match traversal.resume(false) {
            Step::Node(node) => {
                assert_eq!(node.payload, 10);
                assert!(node.default_open);
                assert_eq!(node.size_override, Some(40.0));
                assert_eq!(node.children_count, 1);
            }
            other => panic!("unexpected step {:?}", other),
        }
    }
}
