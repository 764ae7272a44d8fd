//! Indented text rendering of a subtree, used for debug logging.

use super::arena::{NodeId, Tree};

const BRANCH: &str = "\u{251C}\u{2500}\u{2500} ";
const LAST_BRANCH: &str = "\u{2514}\u{2500}\u{2500} ";
const PIPE: &str = "\u{2502}   ";
const GAP: &str = "    ";

impl<T> Tree<T> {
    /// Renders the subtree rooted at `id`, one node per line.
    ///
    /// Each line is `label(node)` prefixed with box-drawing connectors; the
    /// subtree root itself carries no prefix.
    pub fn text_repr<F>(&self, id: NodeId, mut label: F) -> String
    where
        F: FnMut(NodeId, &T) -> String,
    {
        let mut lines = Vec::new();
        for node in self.subtree_depth_first(id) {
            let Some(data) = self.get(node) else {
                continue;
            };
            let text = label(node, data);
            if node == id {
                lines.push(text);
                continue;
            }

            let mut segments = vec![if self.is_last_child(node) {
                LAST_BRANCH
            } else {
                BRANCH
            }];
            for ancestor in self.parents(node).take_while(|ancestor| *ancestor != id) {
                segments.push(if self.is_last_child(ancestor) { GAP } else { PIPE });
            }
            segments.reverse();
            lines.push(format!("{}{text}", segments.concat()));
        }
        lines.join("\n")
    }

    fn is_last_child(&self, id: NodeId) -> bool {
        self.parent(id)
            .and_then(|parent| self.last_child(parent))
            .is_some_and(|last| last == id)
    }
}

#[cfg(test)]
mod tests {
    use crate::tree::Tree;

    #[test]
    fn renders_connectors_and_indent_guides() {
        let mut tree = Tree::new();
        let root = tree.insert_root("root");
        tree.append(root, "a").expect("append a");
        let c = tree.append(root, "c").expect("append c");
        tree.append(c, "d").expect("append d");
        let b = tree.append(root, "b").expect("append b");
        let e = tree.append(b, "e").expect("append e");
        tree.append(e, "f").expect("append f");
        tree.append(c, "g").expect("append g");

        let rendered = tree.text_repr(root, |_, name| name.to_string());
        let expected = [
            "root",
            "├── a",
            "├── c",
            "│   ├── d",
            "│   └── g",
            "└── b",
            "    └── e",
            "        └── f",
        ]
        .join("\n");
        assert_eq!(rendered, expected);
    }

    #[test]
    fn renders_relative_to_subtree_root() {
        let mut tree = Tree::new();
        let root = tree.insert_root("root");
        let c = tree.append(root, "c").expect("append c");
        tree.append(c, "d").expect("append d");
        tree.append(root, "b").expect("append b");

        assert_eq!(tree.text_repr(c, |_, name| name.to_string()), "c\n└── d");
    }
}
