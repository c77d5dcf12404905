use kindred_core::traverse::{find_by_id, find_parent, spouses_of};
use kindred_core::{Graph, Member};

pub fn system_prompt() -> String {
    "You write short biographies for entries in a family genealogy. \
     Use only the facts given. Do not invent dates, places or events. \
     Write two to four sentences of plain prose in the third person. \
     Reply with the biography text only: no headings, no markdown, no quotes."
        .to_string()
}

fn push_attr(out: &mut String, key: &str, value: Option<&str>) {
    if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
        out.push(' ');
        out.push_str(key);
        out.push('=');
        out.push_str(v);
    }
}

/// One line per person: `"Name" (gender) born=.. died=.. ...`.
fn describe(member: &Member) -> String {
    let mut out = String::with_capacity(128);
    out.push('"');
    out.push_str(&member.name);
    out.push_str("\" (");
    out.push_str(member.gender.as_str());
    out.push(')');
    push_attr(&mut out, "born", member.birth_date.as_deref());
    push_attr(&mut out, "died", member.death_date.as_deref());
    push_attr(&mut out, "place", member.location.as_deref());
    push_attr(&mut out, "occupation", member.occupation.as_deref());
    if !member.tags.is_empty() {
        out.push_str(" tags=");
        out.push_str(&member.tags.join(","));
    }
    out
}

/// Compact rendering of a member and their immediate family. `None` if the
/// member does not exist.
pub fn biography_prompt(graph: &Graph, id: &str) -> Option<String> {
    let member = find_by_id(graph, id)?;
    let mut out = String::with_capacity(1024);

    out.push_str("PERSON:\n");
    out.push_str(&describe(member));
    out.push('\n');
    if let Some(note) = member.note.as_deref().filter(|n| !n.trim().is_empty()) {
        out.push_str("NOTES: ");
        out.push_str(note.trim());
        out.push('\n');
    }

    if let Some(parent) = find_parent(graph, id) {
        out.push_str("\nPARENT:\n");
        out.push_str(&describe(parent));
        out.push('\n');
    }

    let spouses = spouses_of(graph, id);
    if !spouses.is_empty() {
        out.push_str("\nSPOUSES:\n");
        for s in spouses {
            out.push_str(&describe(s));
            out.push('\n');
        }
    }

    if !member.children.is_empty() {
        out.push_str("\nCHILDREN:\n");
        for c in &member.children {
            out.push_str(&describe(c));
            out.push('\n');
        }
    }

    out.push_str("\nWrite the biography of ");
    out.push_str(&member.name);
    out.push('.');
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::{insert_spouse, Gender};

    #[test]
    fn prompt_lists_family() {
        let mut scholar = Member::new("b", "Tran Bao", Gender::Male);
        scholar.birth_date = Some("1352".into());
        scholar.occupation = Some("scholar".into());
        scholar.note = Some("Passed the court exam.".into());
        let scholar = scholar.with_child(Member::new("c", "Tran Chi", Gender::Female));
        let graph = Graph::new(Member::new("a", "Tran An", Gender::Male).with_child(scholar));
        let graph = insert_spouse(&graph, "b", None).graph;

        let prompt = biography_prompt(&graph, "b").unwrap();
        assert!(prompt.contains("\"Tran Bao\" (male) born=1352 occupation=scholar"));
        assert!(prompt.contains("NOTES: Passed the court exam."));
        assert!(prompt.contains("PARENT:\n\"Tran An\""));
        assert!(prompt.contains("SPOUSES:\n\"Spouse of Tran Bao\" (female)"));
        assert!(prompt.contains("CHILDREN:\n\"Tran Chi\" (female)"));
        assert!(prompt.ends_with("Write the biography of Tran Bao."));
    }

    #[test]
    fn missing_member_has_no_prompt() {
        let graph = Graph::new(Member::new("a", "A", Gender::Male));
        assert!(biography_prompt(&graph, "zz").is_none());
    }
}
