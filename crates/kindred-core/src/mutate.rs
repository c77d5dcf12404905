//! Snapshot-to-snapshot edits of the family tree.
//!
//! Every function takes the current snapshot by reference and returns a new one.
//! Only the members on the path to a change are cloned (`Arc::make_mut`); all
//! other subtrees stay shared with the input. A missing id is a no-op that
//! hands back an unchanged snapshot. Deleting the absolute root, adding a
//! sibling to it, and an update that would duplicate an id are rejected with a
//! [`TreeError`].

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::TreeError;
use crate::model::{Connection, Edit, Gender, Graph, Member, MemberId, Root, FOREST_ROOT_ID, SPOUSE_LABEL};
use crate::traverse::{self, find_by_id, subtree_ids};

/// Child indices from a clan root down to a member: `[clan, child, child, ..]`.
type Location = Vec<usize>;

/// Generate the next member id by scanning existing members.
/// Ids follow the pattern "m-{N}" with N incrementing.
pub fn next_member_id(graph: &Graph) -> MemberId {
    let max = traverse::walk(graph)
        .filter_map(|m| m.id.strip_prefix("m-").and_then(|s| s.parse::<u64>().ok()))
        .max()
        .unwrap_or(0);
    format!("m-{}", max + 1)
}

fn locate(graph: &Graph, id: &str) -> Option<Location> {
    fn descend(node: &Member, id: &str, loc: &mut Location) -> bool {
        if node.id == id {
            return true;
        }
        for (i, child) in node.children.iter().enumerate() {
            loc.push(i);
            if descend(child, id, loc) {
                return true;
            }
            loc.pop();
        }
        false
    }

    graph.clans().iter().enumerate().find_map(|(i, clan)| {
        let mut loc = vec![i];
        descend(clan, id, &mut loc).then_some(loc)
    })
}

/// Locations of every member matching `pred`.
fn locate_all(graph: &Graph, pred: impl Fn(&Member) -> bool) -> Vec<Location> {
    fn descend(node: &Member, pred: &dyn Fn(&Member) -> bool, loc: &mut Location, out: &mut Vec<Location>) {
        if pred(node) {
            out.push(loc.clone());
        }
        for (i, child) in node.children.iter().enumerate() {
            loc.push(i);
            descend(child, pred, loc, out);
            loc.pop();
        }
    }

    let mut out = Vec::new();
    for (i, clan) in graph.clans().iter().enumerate() {
        let mut loc = vec![i];
        descend(clan, &pred, &mut loc, &mut out);
    }
    out
}

/// The slot holding the member at `loc`, un-sharing every ancestor on the way.
fn slot_mut<'a>(graph: &'a mut Graph, loc: &[usize]) -> Option<&'a mut Arc<Member>> {
    let (first, rest) = loc.split_first()?;
    let mut slot = graph.clans_mut().get_mut(*first)?;
    for &i in rest {
        let current = slot;
        slot = Arc::make_mut(current).children.get_mut(i)?;
    }
    Some(slot)
}

fn member_mut<'a>(graph: &'a mut Graph, loc: &[usize]) -> Option<&'a mut Member> {
    slot_mut(graph, loc).map(Arc::make_mut)
}

/// Apply `f` to the member with `id`; `None` when there is no such member.
fn modify(graph: &Graph, id: &str, f: impl FnOnce(&mut Member)) -> Option<Graph> {
    let loc = locate(graph, id)?;
    let mut next = graph.clone();
    f(member_mut(&mut next, &loc)?);
    Some(next)
}

/// Drop every connection whose target is not in `keep`.
fn prune_connections(graph: &mut Graph, keep: &HashSet<MemberId>) {
    let dangling = |m: &Member| m.connections.iter().any(|c| !keep.contains(&c.target_id));
    for loc in locate_all(graph, dangling) {
        if let Some(member) = member_mut(graph, &loc) {
            member.connections.retain(|c| keep.contains(&c.target_id));
        }
    }
}

/// Append a new child of `gender` under `parent_id`.
pub fn insert_child(graph: &Graph, parent_id: &str, gender: Gender) -> Edit {
    let id = next_member_id(graph);
    let child = Member::new(id.clone(), gender.default_child_name(), gender);
    match modify(graph, parent_id, |parent| parent.children.push(Arc::new(child))) {
        Some(next) => {
            debug!(parent_id, member_id = %id, "inserted child");
            Edit {
                graph: next,
                created: Some(id),
            }
        }
        None => {
            debug!(parent_id, "insert_child: parent not found");
            Edit::unchanged(graph)
        }
    }
}

/// Add a new member next to `sibling_id`, under the same parent. The absolute
/// root has no parent and cannot get a sibling.
pub fn insert_sibling(graph: &Graph, sibling_id: &str, gender: Gender) -> Result<Edit, TreeError> {
    if let Root::Member(root) = graph.root() {
        if root.id == sibling_id {
            warn!(sibling_id, "rejected sibling for the root");
            return Err(TreeError::RootSibling);
        }
    }
    let Some(loc) = locate(graph, sibling_id) else {
        debug!(sibling_id, "insert_sibling: member not found");
        return Ok(Edit::unchanged(graph));
    };

    let id = next_member_id(graph);
    let sibling = Member::new(id.clone(), gender.default_child_name(), gender);
    let mut next = graph.clone();
    if loc.len() == 1 {
        // a clan root's siblings are the other clans
        next.push_clan(sibling);
    } else if let Some(parent) = member_mut(&mut next, &loc[..loc.len() - 1]) {
        parent.children.push(Arc::new(sibling));
    }
    debug!(sibling_id, member_id = %id, "inserted sibling");
    Ok(Edit {
        graph: next,
        created: Some(id),
    })
}

/// Add a new independent clan root beside the existing ones, wrapping a
/// real-member root into a forest root when needed.
pub fn insert_parent(graph: &Graph) -> Edit {
    let id = next_member_id(graph);
    let mut next = graph.clone();
    next.push_clan(Member::new(id.clone(), "Unnamed ancestor", Gender::Male));
    debug!(member_id = %id, clans = next.clans().len(), "inserted clan root");
    Edit {
        graph: next,
        created: Some(id),
    }
}

/// Point `source_id` at `target_id` with a spouse link. An existing
/// connection to the target is relabelled rather than duplicated.
fn link_spouse(graph: &Graph, source_id: &str, target_id: &str) -> Graph {
    if find_by_id(graph, source_id).is_some_and(|m| m.is_spouse_of(target_id)) {
        return graph.clone();
    }
    modify(graph, source_id, |source| {
        match source.connections.iter_mut().find(|c| c.target_id == target_id) {
            Some(existing) => existing.label = SPOUSE_LABEL.to_string(),
            None => source.connections.push(Connection::spouse(target_id)),
        }
    })
    .unwrap_or_else(|| graph.clone())
}

/// Marry `member_id` to `existing_spouse_id`, or to a new member of the
/// opposite gender placed as its own clan under the forest root.
pub fn insert_spouse(graph: &Graph, member_id: &str, existing_spouse_id: Option<&str>) -> Edit {
    let Some(member) = find_by_id(graph, member_id) else {
        debug!(member_id, "insert_spouse: member not found");
        return Edit::unchanged(graph);
    };

    match existing_spouse_id {
        Some(spouse_id) => {
            if spouse_id == member_id || find_by_id(graph, spouse_id).is_none() {
                return Edit::unchanged(graph);
            }
            let next = link_spouse(graph, member_id, spouse_id);
            let next = link_spouse(&next, spouse_id, member_id);
            debug!(member_id, spouse_id, "linked spouses");
            Edit {
                graph: next,
                created: None,
            }
        }
        None => {
            let id = next_member_id(graph);
            let gender = member.gender.opposite();
            let mut spouse = Member::new(id.clone(), format!("Spouse of {}", member.name), gender);
            spouse.connections.push(Connection::spouse(member_id));

            let mut next = graph.clone();
            next.push_clan(spouse);
            let next = link_spouse(&next, member_id, &id);
            debug!(member_id, spouse_id = %id, "inserted spouse");
            Edit {
                graph: next,
                created: Some(id),
            }
        }
    }
}

/// Remove the subtree rooted at `id` and every connection that pointed into it.
pub fn delete_cascade(graph: &Graph, id: &str) -> Result<Graph, TreeError> {
    if graph.absolute_root_id() == id {
        warn!(member_id = id, "rejected deletion of the root");
        return Err(TreeError::RootDeletion);
    }
    let Some(loc) = locate(graph, id) else {
        debug!(member_id = id, "delete_cascade: member not found");
        return Ok(graph.clone());
    };

    let removed: HashSet<MemberId> = find_by_id(graph, id)
        .map(|m| subtree_ids(m).into_iter().collect())
        .unwrap_or_default();

    let mut next = graph.clone();
    if loc.len() == 1 {
        next.remove_clan(loc[0]);
    } else if let Some(parent) = member_mut(&mut next, &loc[..loc.len() - 1]) {
        parent.children.remove(loc[loc.len() - 1]);
    }

    let keep: HashSet<MemberId> = traverse::all_ids(&next);
    prune_connections(&mut next, &keep);
    debug!(member_id = id, removed = removed.len(), "deleted subtree");
    Ok(next)
}

/// Replace the member with `updated.id` wholesale, keeping its position.
/// Connections left dangling by the replacement are pruned. A replacement
/// whose subtree reuses an id from outside the replaced subtree is rejected.
pub fn update_member(graph: &Graph, updated: Member) -> Result<Graph, TreeError> {
    let Some(loc) = locate(graph, &updated.id) else {
        debug!(member_id = %updated.id, "update_member: member not found");
        return Ok(graph.clone());
    };

    let replaced: HashSet<MemberId> = find_by_id(graph, &updated.id)
        .map(|m| subtree_ids(m).into_iter().collect())
        .unwrap_or_default();
    let outside: HashSet<MemberId> = traverse::all_ids(graph).difference(&replaced).cloned().collect();
    let mut seen = HashSet::new();
    for id in subtree_ids(&updated) {
        if id == FOREST_ROOT_ID || outside.contains(&id) || !seen.insert(id.clone()) {
            warn!(member_id = %updated.id, duplicate = %id, "rejected update with duplicate id");
            return Err(TreeError::DuplicateId(id));
        }
    }

    let mut next = graph.clone();
    if let Some(slot) = slot_mut(&mut next, &loc) {
        *slot = Arc::new(updated);
    }
    let keep = traverse::all_ids(&next);
    prune_connections(&mut next, &keep);
    Ok(next)
}

/// Add a labelled connection. A second call for the same pair is a no-op.
pub fn add_connection(graph: &Graph, source_id: &str, target_id: &str, label: &str) -> Graph {
    if source_id == target_id || find_by_id(graph, target_id).is_none() {
        return graph.clone();
    }
    match find_by_id(graph, source_id) {
        Some(source) if !source.has_connection_to(target_id) => {}
        _ => return graph.clone(),
    }
    modify(graph, source_id, |source| {
        source.connections.push(Connection {
            target_id: target_id.to_string(),
            label: label.to_string(),
        })
    })
    .unwrap_or_else(|| graph.clone())
}

pub fn remove_connection(graph: &Graph, source_id: &str, target_id: &str) -> Graph {
    if !find_by_id(graph, source_id).is_some_and(|m| m.has_connection_to(target_id)) {
        return graph.clone();
    }
    modify(graph, source_id, |source| {
        source.connections.retain(|c| c.target_id != target_id)
    })
    .unwrap_or_else(|| graph.clone())
}

/// Remove both directions of a marriage.
pub fn remove_spouse(graph: &Graph, a: &str, b: &str) -> Graph {
    let next = remove_connection(graph, a, b);
    remove_connection(&next, b, a)
}
