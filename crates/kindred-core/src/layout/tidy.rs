//! Tidy tree placement.
//!
//! Subtrees are laid out bottom-up. Each subtree keeps its left and right
//! contour (extreme breadth per level, relative to its root). Children are
//! packed left to right, each pushed just far enough that no level overlaps the
//! siblings already placed, then the parent is centred over its first and last
//! child. A second, top-down pass turns relative offsets into absolute breadth.
//!
//! Adjacent nodes that share a parent are kept `sibling` apart; nodes from
//! different parents (cousins, and everything under separate clans) are kept
//! `clan` apart.

use std::collections::HashMap;

use crate::model::{Gender, Graph, Member, MemberId, Root, FOREST_ROOT_ID};

#[derive(Debug, Clone)]
pub struct TidyNode {
    pub id: MemberId,
    pub name: String,
    pub gender: Gender,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub depth: usize,
    /// Position along the sibling axis.
    pub breadth: f64,
    /// The forest root: placed like any node but never drawn.
    pub synthetic: bool,
}

/// Centre-to-centre distances along the sibling axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    pub sibling: f64,
    pub clan: f64,
}

#[derive(Debug, Clone)]
pub struct TidyTree {
    /// Nodes in pre-order; index 0 is the visual root.
    pub nodes: Vec<TidyNode>,
    index: HashMap<MemberId, usize>,
}

impl TidyTree {
    pub fn get(&self, id: &str) -> Option<&TidyNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }
}

#[derive(Debug, Default)]
struct Contour {
    left: Vec<f64>,
    right: Vec<f64>,
}

impl Contour {
    fn leaf() -> Self {
        Self {
            left: vec![0.0],
            right: vec![0.0],
        }
    }

    fn shifted(&self, by: f64) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.left
            .iter()
            .zip(&self.right)
            .map(move |(l, r)| (l + by, r + by))
    }
}

fn push_member(nodes: &mut Vec<TidyNode>, member: &Member, parent: Option<usize>, depth: usize) -> usize {
    let idx = nodes.len();
    nodes.push(TidyNode {
        id: member.id.clone(),
        name: member.name.clone(),
        gender: member.gender,
        parent,
        children: Vec::with_capacity(member.children.len()),
        depth,
        breadth: 0.0,
        synthetic: false,
    });
    for child in &member.children {
        let c = push_member(nodes, child, Some(idx), depth + 1);
        nodes[idx].children.push(c);
    }
    idx
}

fn build_nodes(graph: &Graph) -> Vec<TidyNode> {
    let mut nodes = Vec::with_capacity(graph.member_count() + 1);
    match graph.root() {
        Root::Member(member) => {
            push_member(&mut nodes, member, None, 0);
        }
        Root::Forest(clans) => {
            nodes.push(TidyNode {
                id: FOREST_ROOT_ID.to_string(),
                name: String::new(),
                gender: Gender::Other,
                parent: None,
                children: Vec::with_capacity(clans.len()),
                depth: 0,
                breadth: 0.0,
                synthetic: true,
            });
            for clan in clans {
                let c = push_member(&mut nodes, clan, Some(0), 1);
                nodes[0].children.push(c);
            }
        }
    }
    nodes
}

/// Lay out the graph. The synthetic forest root, if any, is node 0.
pub fn tidy(graph: &Graph, spacing: Spacing) -> TidyTree {
    let mut nodes = build_nodes(graph);
    let n = nodes.len();
    let mut offsets = vec![0.0_f64; n];
    let mut contours: Vec<Option<Contour>> = (0..n).map(|_| None).collect();

    // Pre-order puts every child after its parent, so a reverse sweep is a
    // valid post-order.
    for v in (0..n).rev() {
        let children = nodes[v].children.clone();
        if children.is_empty() {
            contours[v] = Some(Contour::leaf());
            continue;
        }

        let clan_level = nodes[v].synthetic;
        let mut merged = Contour::default();
        let mut placed = Vec::with_capacity(children.len());

        for &c in &children {
            let sub = contours[c].take().unwrap_or_else(Contour::leaf);
            let mut offset = 0.0;
            if !placed.is_empty() {
                offset = f64::NEG_INFINITY;
                for (level, (right, left)) in merged.right.iter().zip(&sub.left).enumerate() {
                    let gap = if level == 0 && !clan_level {
                        spacing.sibling
                    } else {
                        spacing.clan
                    };
                    offset = offset.max(right + gap - left);
                }
            }
            for (level, (l, r)) in sub.shifted(offset).enumerate() {
                if level < merged.left.len() {
                    merged.left[level] = merged.left[level].min(l);
                    merged.right[level] = r;
                } else {
                    merged.left.push(l);
                    merged.right.push(r);
                }
            }
            placed.push(offset);
        }

        let mid = (placed[0] + placed[placed.len() - 1]) / 2.0;
        for (&c, off) in children.iter().zip(&placed) {
            offsets[c] = off - mid;
        }

        let mut contour = Contour::leaf();
        contour.left.extend(merged.left.iter().map(|l| l - mid));
        contour.right.extend(merged.right.iter().map(|r| r - mid));
        contours[v] = Some(contour);
    }

    for v in 0..n {
        let base = nodes[v].parent.map_or(0.0, |p| nodes[p].breadth);
        nodes[v].breadth = base + offsets[v];
    }

    let index = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id.clone(), i))
        .collect();
    TidyTree { nodes, index }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutate::insert_parent;

    const SPACING: Spacing = Spacing {
        sibling: 10.0,
        clan: 15.0,
    };

    fn leaf(id: &str) -> Member {
        Member::new(id, id, Gender::Male)
    }

    fn breadth(tree: &TidyTree, id: &str) -> f64 {
        tree.get(id).unwrap().breadth
    }

    #[test]
    fn parent_is_centred_over_children() {
        let graph = Graph::new(leaf("r").with_child(leaf("a")).with_child(leaf("b")).with_child(leaf("c")));
        let tree = tidy(&graph, SPACING);
        assert_eq!(breadth(&tree, "r"), 0.0);
        assert_eq!(breadth(&tree, "a"), -10.0);
        assert_eq!(breadth(&tree, "b"), 0.0);
        assert_eq!(breadth(&tree, "c"), 10.0);
        assert_eq!(tree.get("c").unwrap().depth, 1);
    }

    #[test]
    fn cousins_get_the_wider_clan_gap() {
        // r ─┬─ a ─ a1
        //    └─ b ─ b1
        let graph = Graph::new(
            leaf("r")
                .with_child(leaf("a").with_child(leaf("a1")))
                .with_child(leaf("b").with_child(leaf("b1"))),
        );
        let tree = tidy(&graph, SPACING);
        assert_eq!(breadth(&tree, "b1") - breadth(&tree, "a1"), 15.0);
        assert_eq!(breadth(&tree, "b") - breadth(&tree, "a"), 15.0);
    }

    #[test]
    fn wide_subtrees_do_not_overlap() {
        let wide = leaf("a")
            .with_child(leaf("a1"))
            .with_child(leaf("a2"))
            .with_child(leaf("a3"));
        let graph = Graph::new(leaf("r").with_child(wide).with_child(leaf("b").with_child(leaf("b1"))));
        let tree = tidy(&graph, SPACING);
        assert!(breadth(&tree, "b1") - breadth(&tree, "a3") >= 15.0);
        assert!(breadth(&tree, "b") - breadth(&tree, "a") >= 10.0);
    }

    #[test]
    fn forest_root_is_synthetic_and_clans_use_clan_gap() {
        let graph = insert_parent(&Graph::new(leaf("r"))).graph;
        let tree = tidy(&graph, SPACING);
        assert!(tree.nodes[0].synthetic);
        assert_eq!(tree.nodes[0].id, FOREST_ROOT_ID);
        assert_eq!(tree.get("r").unwrap().depth, 1);
        assert_eq!(breadth(&tree, "m-1") - breadth(&tree, "r"), 15.0);
    }
}
