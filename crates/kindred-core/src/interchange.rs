//! JSON import and export of whole trees.
//!
//! The document is the root member with nested `children` and `connections`.
//! A forest is written as a root with `"relation": "forest-root"` whose
//! children are the clans.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ImportError;
use crate::model::{Graph, Member, MemberId, FOREST_RELATION, FOREST_ROOT_ID};

pub fn export_json(graph: &Graph) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(graph)
}

/// Parse and validate a document. Nothing is returned unless the whole
/// document is usable.
pub fn import_json(text: &str) -> Result<Graph, ImportError> {
    let value: Value = serde_json::from_str(text)?;
    import_value(value)
}

pub fn import_value(value: Value) -> Result<Graph, ImportError> {
    let Value::Object(object) = &value else {
        return Err(ImportError::NotAnObject);
    };
    let present = |key: &str| object.get(key).is_some_and(|v| !v.is_null());
    if !present("id") && !present("name") {
        return Err(ImportError::MissingIdentity);
    }
    let forest = object.get("relation").and_then(Value::as_str) == Some(FOREST_RELATION);

    let root: Member = serde_json::from_value(value).map_err(|e| ImportError::Shape(e.to_string()))?;
    let mut clans = if forest {
        root.children
    } else {
        vec![Arc::new(root)]
    };
    if clans.is_empty() {
        return Err(ImportError::Shape("forest root has no clans".to_string()));
    }

    let mut seen = HashSet::new();
    let mut missing = 0;
    for clan in &clans {
        check_ids(clan, &mut seen, &mut missing)?;
    }
    if missing > 0 {
        let mut next = seen
            .iter()
            .filter_map(|id| id.strip_prefix("m-").and_then(|n| n.parse::<u64>().ok()))
            .max()
            .unwrap_or(0);
        for clan in &mut clans {
            assign_ids(Arc::make_mut(clan), &mut next, &mut seen);
        }
        debug!(count = missing, "generated ids for imported members");
    }

    let mut pruned = 0;
    for clan in &mut clans {
        pruned += prune(Arc::make_mut(clan), &seen);
    }
    if pruned > 0 {
        warn!(count = pruned, "dropped dangling connections from import");
    }

    Graph::from_clans(clans).ok_or_else(|| ImportError::Shape("document has no members".to_string()))
}

fn check_ids(member: &Member, seen: &mut HashSet<MemberId>, missing: &mut usize) -> Result<(), ImportError> {
    if member.id.is_empty() {
        *missing += 1;
    } else if member.id == FOREST_ROOT_ID {
        return Err(ImportError::ReservedId(member.id.clone()));
    } else if !seen.insert(member.id.clone()) {
        return Err(ImportError::DuplicateId(member.id.clone()));
    }
    for child in &member.children {
        check_ids(child, seen, missing)?;
    }
    Ok(())
}

fn assign_ids(member: &mut Member, next: &mut u64, seen: &mut HashSet<MemberId>) {
    if member.id.is_empty() {
        *next += 1;
        member.id = format!("m-{next}");
        seen.insert(member.id.clone());
    }
    for child in &mut member.children {
        assign_ids(Arc::make_mut(child), next, seen);
    }
}

/// Drop connections to unknown members or to self. Returns how many went.
fn prune(member: &mut Member, ids: &HashSet<MemberId>) -> usize {
    let before = member.connections.len();
    let own = member.id.clone();
    member
        .connections
        .retain(|c| c.target_id != own && ids.contains(&c.target_id));
    let mut dropped = before - member.connections.len();
    for child in &mut member.children {
        dropped += prune(Arc::make_mut(child), ids);
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Gender;
    use crate::mutate::{insert_parent, insert_spouse};
    use crate::traverse::{find_by_id, flatten};

    fn sample() -> Graph {
        let a = Member::new("a", "A", Gender::Male)
            .with_child(Member::new("b", "B", Gender::Male))
            .with_child(Member::new("c", "C", Gender::Female));
        insert_spouse(&Graph::new(Member::new("r", "R", Gender::Male).with_child(a)), "b", Some("c")).graph
    }

    #[test]
    fn export_then_import_keeps_tree() {
        let graph = sample();
        let text = export_json(&graph).unwrap();
        assert!(text.contains("\"connections\""));
        assert_eq!(import_json(&text).unwrap(), graph);
    }

    #[test]
    fn forest_marker_rebuilds_forest() {
        let graph = insert_parent(&sample()).graph;
        let text = export_json(&graph).unwrap();
        let back = import_json(&text).unwrap();
        assert!(back.is_forest());
        assert_eq!(back.root_ids(), vec!["r", "m-1"]);
    }

    #[test]
    fn rejects_documents_without_identity() {
        assert!(matches!(import_json("[1, 2]"), Err(ImportError::NotAnObject)));
        assert!(matches!(import_json("{\"gender\": \"male\"}"), Err(ImportError::MissingIdentity)));
        assert!(matches!(import_json("{not json"), Err(ImportError::Json(_))));
        assert!(matches!(
            import_json(r#"{"id": "a", "children": "nope"}"#),
            Err(ImportError::Shape(_))
        ));
    }

    #[test]
    fn rejects_duplicate_and_reserved_ids() {
        let dup = r#"{"id": "a", "name": "A", "children": [{"id": "a", "name": "again"}]}"#;
        assert!(matches!(import_json(dup), Err(ImportError::DuplicateId(id)) if id == "a"));
        let reserved = r#"{"id": "a", "children": [{"id": "forest-root"}]}"#;
        assert!(matches!(import_json(reserved), Err(ImportError::ReservedId(_))));
    }

    #[test]
    fn assigns_missing_ids_and_prunes_dangling_links() {
        let text = r#"{
            "name": "Founder",
            "connections": [{"targetId": "ghost", "label": "friend"}],
            "children": [
                {"id": "m-3", "name": "Known"},
                {"name": "Nameless", "connections": [{"targetId": "m-3", "label": "spouse"}]}
            ]
        }"#;
        let graph = import_json(text).unwrap();
        let ids: Vec<&str> = flatten(&graph).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m-4", "m-3", "m-5"]);
        assert!(find_by_id(&graph, "m-4").unwrap().connections.is_empty());
        assert!(find_by_id(&graph, "m-5").unwrap().is_spouse_of("m-3"));
    }

    #[test]
    fn empty_forest_is_rejected() {
        let text = r#"{"id": "forest-root", "relation": "forest-root", "children": []}"#;
        assert!(matches!(import_json(text), Err(ImportError::Shape(_))));
    }
}
