use std::collections::{HashMap, HashSet};

use flat_tree::prelude::*;
use proptest::prelude::*;
use proptest::sample::Index;

/// Node `i` is a root or a child of some node before it
fn build(shape: &[(bool, Index, bool)]) -> (MemoryTree<usize>, HashMap<String, String>) {
    let mut tree = MemoryTree::new();
    let mut parents = HashMap::new();
    for (i, (is_root, parent, open)) in shape.iter().enumerate() {
        let id = format!("n{}", i);
        if i == 0 || *is_root {
            tree.add_root(id.clone(), i).unwrap();
        } else {
            let parent = format!("n{}", parent.index(i));
            tree.add_child(&parent, id.clone(), i).unwrap();
            parents.insert(id.clone(), parent);
        }
        tree.set_default_open(&id, *open).unwrap();
    }
    (tree, parents)
}

fn expected_order(
    tree: &MemoryTree<usize>,
    flattener: &TreeFlattener<MemoryTree<usize>>,
    roots: &[String],
) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack: Vec<String> = roots.iter().rev().cloned().collect();
    while let Some(id) = stack.pop() {
        if flattener.is_opened(&id) == Some(true) {
            if let Some(children) = tree.children(&id) {
                stack.extend(children.iter().rev().cloned());
            }
        }
        out.push(id);
    }
    out
}

fn check_order(
    flattener: &TreeFlattener<MemoryTree<usize>>,
    parents: &HashMap<String, String>,
) -> Result<(), TestCaseError> {
    let order = flattener.flat_order();
    let position: HashMap<&String, usize> =
        order.iter().enumerate().map(|(i, id)| (id, i)).collect();
    prop_assert_eq!(position.len(), order.len(), "identity listed twice");

    for (i, id) in order.iter().enumerate() {
        // Every ancestor precedes the node and is open
        let mut current = id;
        while let Some(parent) = parents.get(current) {
            let at = position.get(parent).copied();
            prop_assert!(at.map_or(false, |at| at < i), "{} is not preceded by its parent {}", id, parent);
            prop_assert_eq!(flattener.is_opened(parent), Some(true));
            current = parent;
        }
    }
    Ok(())
}

fn shape() -> impl Strategy<Value = Vec<(bool, Index, bool)>> {
    prop::collection::vec((prop::bool::weighted(0.2), any::<Index>(), any::<bool>()), 1..40)
}

proptest! {
    #[test]
    fn flat_order_is_valid_after_random_toggles(
        shape in shape(),
        batches in prop::collection::vec(prop::collection::vec((any::<Index>(), any::<bool>()), 0..5), 0..8),
    ) {
        let (tree, parents) = build(&shape);
        let roots: Vec<String> = (0..shape.len())
            .map(|i| format!("n{}", i))
            .filter(|id| !parents.contains_key(id))
            .collect();
        let reference = tree.clone();

        let mut flattener = TreeFlattener::new(tree);
        flattener.recompute_tree(true, true).unwrap();
        check_order(&flattener, &parents)?;

        for batch in batches {
            let registered: Vec<String> = {
                let mut ids: Vec<String> = flattener.registry().iter().map(|r| r.id().clone()).collect();
                ids.sort();
                ids
            };
            let changes: Vec<(String, bool)> = batch
                .iter()
                .map(|(index, open)| (index.get(&registered).clone(), *open))
                .collect();

            let generation = flattener.generation();
            flattener.toggle_nodes(changes.clone()).unwrap();
            prop_assert_eq!(flattener.generation(), generation + 1);

            // Last write wins within a batch
            let mut last: HashMap<&String, bool> = HashMap::new();
            for (id, open) in &changes {
                last.insert(id, *open);
            }
            for (id, open) in last {
                prop_assert_eq!(flattener.is_opened(id), Some(open));
            }

            check_order(&flattener, &parents)?;
            prop_assert_eq!(
                flattener.flat_order().to_vec(),
                expected_order(&reference, &flattener, &roots)
            );
        }
    }

    #[test]
    fn closed_nodes_hide_descendants(shape in shape()) {
        let (tree, parents) = build(&shape);
        let mut flattener = TreeFlattener::new(tree);
        flattener.recompute_tree(true, true).unwrap();
        flattener.close_all().unwrap();

        let shown: HashSet<&String> = flattener.flat_order().iter().collect();
        for (child, _) in parents.iter() {
            prop_assert!(!shown.contains(child));
        }
        prop_assert_eq!(shown.len(), shape.len() - parents.len());
    }

    #[test]
    fn refresh_flag_does_not_change_order(shape in shape()) {
        let (tree, _) = build(&shape);
        let mut flattener = TreeFlattener::new(tree);
        flattener.recompute_tree(true, true).unwrap();
        let refreshed = flattener.flat_order().to_vec();

        flattener.recompute_tree(false, false).unwrap();
        prop_assert_eq!(flattener.flat_order().to_vec(), refreshed);
    }
}
