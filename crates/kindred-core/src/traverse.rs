//! Read-only walks over a graph snapshot: lookup, flattening, root paths and
//! the ancestor/descendant sets built from them.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::model::{Gender, Graph, Member, MemberId};

/// Pre-order iterator over every real member. The synthetic forest root is
/// never yielded. Calling [`walk`] again restarts from the top.
pub struct Preorder<'a> {
    stack: Vec<&'a Member>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Member;

    fn next(&mut self) -> Option<Self::Item> {
        let member = self.stack.pop()?;
        self.stack
            .extend(member.children.iter().rev().map(|c| c.as_ref()));
        Some(member)
    }
}

pub fn walk(graph: &Graph) -> Preorder<'_> {
    Preorder {
        stack: graph.clans().iter().rev().map(|c| c.as_ref()).collect(),
    }
}

/// Every member in pre-order.
pub fn flatten(graph: &Graph) -> Vec<&Member> {
    walk(graph).collect()
}

/// First member (in pre-order) with the given id.
pub fn find_by_id<'a>(graph: &'a Graph, id: &str) -> Option<&'a Member> {
    walk(graph).find(|m| m.id == id)
}

/// Direct parent of `id`. Clan roots have no parent member.
pub fn find_parent<'a>(graph: &'a Graph, id: &str) -> Option<&'a Member> {
    walk(graph).find(|m| m.children.iter().any(|c| c.id == id))
}

/// Members from the top-level root down to `id`, inclusive. Under a forest
/// root the path starts at the clan root.
pub fn path_to_root<'a>(graph: &'a Graph, id: &str) -> Option<Vec<&'a Member>> {
    fn descend<'a>(node: &'a Member, id: &str, path: &mut Vec<&'a Member>) -> bool {
        path.push(node);
        if node.id == id {
            return true;
        }
        for child in &node.children {
            if descend(child, id, path) {
                return true;
            }
        }
        path.pop();
        false
    }

    let mut path = Vec::new();
    for clan in graph.clans() {
        if descend(clan, id, &mut path) {
            return Some(path);
        }
    }
    None
}

pub fn depth_of(graph: &Graph, id: &str) -> Option<usize> {
    path_to_root(graph, id).map(|p| p.len() - 1)
}

/// Ids strictly above `id` on its root path.
pub fn collect_ancestors(graph: &Graph, id: &str) -> HashSet<MemberId> {
    let Some(path) = path_to_root(graph, id) else {
        return HashSet::new();
    };
    path.iter()
        .take(path.len() - 1)
        .map(|m| m.id.clone())
        .collect()
}

/// Ids strictly below `id`.
pub fn collect_descendants(graph: &Graph, id: &str) -> HashSet<MemberId> {
    let Some(member) = find_by_id(graph, id) else {
        return HashSet::new();
    };
    subtree_ids(member)
        .into_iter()
        .filter(|d| d != id)
        .collect()
}

/// `id` together with all of its ancestors and descendants.
pub fn lineage(graph: &Graph, id: &str) -> HashSet<MemberId> {
    if find_by_id(graph, id).is_none() {
        return HashSet::new();
    }
    let mut ids = collect_ancestors(graph, id);
    ids.extend(collect_descendants(graph, id));
    ids.insert(id.to_string());
    ids
}

/// Ids of `member` and everything beneath it, in pre-order.
pub fn subtree_ids(member: &Member) -> Vec<MemberId> {
    let mut ids = Vec::new();
    let mut stack = vec![member];
    while let Some(m) = stack.pop() {
        ids.push(m.id.clone());
        stack.extend(m.children.iter().rev().map(|c| c.as_ref()));
    }
    ids
}

pub fn all_ids(graph: &Graph) -> HashSet<MemberId> {
    walk(graph).map(|m| m.id.clone()).collect()
}

/// True when either member holds a spouse connection to the other.
pub fn are_spouses(graph: &Graph, a: &str, b: &str) -> bool {
    let holds = |from: &str, to: &str| find_by_id(graph, from).is_some_and(|m| m.is_spouse_of(to));
    holds(a, b) || holds(b, a)
}

/// Members married to `id`, in connection order.
pub fn spouses_of<'a>(graph: &'a Graph, id: &str) -> Vec<&'a Member> {
    let mut spouses: Vec<&Member> = Vec::new();
    let mut push = |m: &'a Member| {
        if !spouses.iter().any(|s| s.id == m.id) {
            spouses.push(m);
        }
    };
    if let Some(member) = find_by_id(graph, id) {
        for conn in member.connections.iter().filter(|c| c.is_spouse()) {
            if let Some(target) = find_by_id(graph, &conn.target_id) {
                push(target);
            }
        }
    }
    for other in walk(graph).filter(|m| m.is_spouse_of(id)) {
        push(other);
    }
    spouses
}

/// Number of generations in the deepest clan.
pub fn generation_count(graph: &Graph) -> usize {
    fn height(member: &Arc<Member>) -> usize {
        1 + member.children.iter().map(height).max().unwrap_or(0)
    }
    graph.clans().iter().map(height).max().unwrap_or(0)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    pub members: usize,
    pub male: usize,
    pub female: usize,
    pub other: usize,
    pub generations: usize,
    pub clans: usize,
    pub connections: usize,
    pub living: usize,
}

pub fn stats(graph: &Graph) -> TreeStats {
    let mut stats = TreeStats {
        generations: generation_count(graph),
        clans: graph.clans().len(),
        ..Default::default()
    };
    for member in walk(graph) {
        stats.members += 1;
        match member.gender {
            Gender::Male => stats.male += 1,
            Gender::Female => stats.female += 1,
            Gender::Other => stats.other += 1,
        }
        stats.connections += member.connections.len();
        if member.death_date.as_deref().map_or(true, |d| d.trim().is_empty()) {
            stats.living += 1;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Connection;

    // R ─┬─ A ─┬─ B
    //    │     └─ C
    //    └─ D
    fn sample() -> Graph {
        let a = Member::new("a", "A", Gender::Male)
            .with_child(Member::new("b", "B", Gender::Male))
            .with_child(Member::new("c", "C", Gender::Female));
        let root = Member::new("r", "R", Gender::Male)
            .with_child(a)
            .with_child(Member::new("d", "D", Gender::Female));
        Graph::new(root)
    }

    #[test]
    fn flatten_is_preorder() {
        let graph = sample();
        let ids: Vec<&str> = flatten(&graph).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["r", "a", "b", "c", "d"]);
        // restartable
        assert_eq!(walk(&graph).count(), walk(&graph).count());
    }

    #[test]
    fn path_runs_from_root_to_target() {
        let graph = sample();
        let path: Vec<&str> = path_to_root(&graph, "c")
            .unwrap()
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(path, vec!["r", "a", "c"]);
        assert!(path_to_root(&graph, "zz").is_none());
        assert_eq!(depth_of(&graph, "r"), Some(0));
    }

    #[test]
    fn parent_lookup() {
        let graph = sample();
        assert_eq!(find_parent(&graph, "b").map(|m| m.id.as_str()), Some("a"));
        assert!(find_parent(&graph, "r").is_none());
    }

    #[test]
    fn ancestors_and_descendants_exclude_self() {
        let graph = sample();
        let anc = collect_ancestors(&graph, "b");
        assert_eq!(anc, HashSet::from(["r".to_string(), "a".to_string()]));
        let desc = collect_descendants(&graph, "a");
        assert_eq!(desc, HashSet::from(["b".to_string(), "c".to_string()]));
        let line = lineage(&graph, "a");
        assert_eq!(line.len(), 4);
        assert!(!line.contains("d"));
    }

    #[test]
    fn spouses_seen_from_either_side() {
        let mut root = Member::new("r", "R", Gender::Male)
            .with_child(Member::new("w", "W", Gender::Female));
        root.connections.push(Connection::spouse("w"));
        let graph = Graph::new(root);
        assert!(are_spouses(&graph, "w", "r"));
        let ids: Vec<&str> = spouses_of(&graph, "w").iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["r"]);
    }

    #[test]
    fn stats_count_genders_and_generations() {
        let stats = stats(&sample());
        assert_eq!(stats.members, 5);
        assert_eq!(stats.male, 3);
        assert_eq!(stats.female, 2);
        assert_eq!(stats.generations, 3);
        assert_eq!(stats.living, 5);
    }
}
