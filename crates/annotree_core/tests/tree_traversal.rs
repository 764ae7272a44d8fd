use annotree_core::{NodeId, Tree, TreeError};
use std::collections::HashSet;

/// Deterministic pseudo-random sequence for reproducible tree shapes.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

fn random_tree(seed: u64, size: usize) -> (Tree<usize>, Vec<NodeId>) {
    let mut rng = Lcg(seed);
    let mut tree = Tree::new();
    let mut ids = vec![tree.insert_root(0)];
    for value in 1..size {
        let parent = ids[rng.next(ids.len())];
        let index = rng.next(tree.children(parent).len() + 1);
        ids.push(tree.insert(value, Some(parent), Some(index)).unwrap());
    }
    (tree, ids)
}

fn assert_well_formed(tree: &Tree<usize>, root: NodeId) {
    let order: Vec<NodeId> = tree.subtree_depth_first(root).collect();
    let unique: HashSet<NodeId> = order.iter().copied().collect();
    assert_eq!(order.len(), unique.len(), "node visited twice");
    assert_eq!(order.len(), tree.len());

    for (position, id) in order.iter().enumerate() {
        if let Some(parent) = tree.parent(*id) {
            let parent_position = order.iter().position(|other| *other == parent).unwrap();
            assert!(parent_position < position, "parent after child");
            assert!(tree.has_ancestor(*id, parent));
            assert_eq!(tree.children(parent)[tree.row(*id)], *id);
        }
        assert!(!tree.has_ancestor(*id, *id));
    }

    for id in &order {
        let children = tree.children(*id);
        let visited: Vec<NodeId> = order
            .iter()
            .copied()
            .filter(|other| children.contains(other))
            .collect();
        assert_eq!(visited, children, "children out of sibling order");
    }

    let mut reversed = order.clone();
    reversed.reverse();
    assert_eq!(tree.subtree_reverse_depth_first(root).collect::<Vec<_>>(), reversed);

    let leaves: Vec<NodeId> = order.iter().copied().filter(|id| tree.is_leaf(*id)).collect();
    assert_eq!(tree.subtree_leaves(root).collect::<Vec<_>>(), leaves);
    let mut reverse_leaves = leaves;
    reverse_leaves.reverse();
    assert_eq!(tree.subtree_reverse_leaves(root).collect::<Vec<_>>(), reverse_leaves);
}

#[test]
fn generated_trees_satisfy_traversal_properties() {
    for seed in 1..=20 {
        let (tree, ids) = random_tree(seed, 40);
        assert_well_formed(&tree, ids[0]);
    }
}

#[test]
fn random_moves_keep_the_tree_well_formed() {
    for seed in 1..=10 {
        let (mut tree, ids) = random_tree(seed, 30);
        let mut rng = Lcg(seed * 7919);
        for _ in 0..100 {
            let node = ids[1 + rng.next(ids.len() - 1)];
            let parent = ids[rng.next(ids.len())];
            let before: Vec<Vec<NodeId>> = ids.iter().map(|id| tree.children(*id).to_vec()).collect();
            let limit = tree.children(parent).len() + 1;
            let index = rng.next(limit);

            match tree.insert_child(parent, index, node) {
                Ok(()) => assert_eq!(tree.parent(node), Some(parent)),
                Err(TreeError::Cycle { .. }) => {
                    assert!(parent == node || tree.has_ancestor(parent, node));
                    let after: Vec<Vec<NodeId>> =
                        ids.iter().map(|id| tree.children(*id).to_vec()).collect();
                    assert_eq!(before, after);
                }
                Err(TreeError::IndexOutOfRange { .. }) => {
                    let after: Vec<Vec<NodeId>> =
                        ids.iter().map(|id| tree.children(*id).to_vec()).collect();
                    assert_eq!(before, after);
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_well_formed(&tree, ids[0]);
    }
}

#[test]
fn text_repr_draws_guides_for_open_ancestors() {
    let mut tree = Tree::new();
    let root = tree.insert_root("root");
    let a = tree.append(root, "a").unwrap();
    tree.append(a, "a1").unwrap();
    let b = tree.append(root, "b").unwrap();
    let b1 = tree.append(b, "b1").unwrap();
    tree.append(b1, "b1x").unwrap();

    let rendered = tree.text_repr(root, |_, name| name.to_string());
    assert_eq!(
        rendered,
        "root\n├── a\n│   └── a1\n└── b\n    └── b1\n        └── b1x"
    );
    assert_eq!(tree.text_repr(b1, |_, name| name.to_string()), "b1\n└── b1x");
}
