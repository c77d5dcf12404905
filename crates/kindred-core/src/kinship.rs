//! Kinship terms between two members, derived from where their root paths
//! diverge (the lowest common ancestor).
//!
//! `resolve(graph, from, to)` names `to` as seen from `from`: if `to` is the
//! father of `from` the answer is "father". Terms for uncles, aunts, nephews,
//! nieces and cousins say which side of the family the link runs through, so
//! swapping the arguments yields the mirrored category under different wording.

use serde::Serialize;

use crate::model::{Gender, Graph, Member};
use crate::traverse::{are_spouses, find_by_id, path_to_root};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RelationshipCategory {
    SameMember,
    Spouse,
    Ancestor { generations: usize },
    Descendant { generations: usize },
    Sibling,
    SiblingChild,
    ParentSibling,
    Cousin,
    Distant { up: usize, down: usize },
    NoBloodRelation,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub category: RelationshipCategory,
    pub label: String,
}

impl Relationship {
    fn new(category: RelationshipCategory, label: impl Into<String>) -> Self {
        Self {
            category,
            label: label.into(),
        }
    }
}

fn gendered(gender: Gender, male: &str, female: &str, neutral: &str) -> String {
    match gender {
        Gender::Male => male,
        Gender::Female => female,
        Gender::Other => neutral,
    }
    .to_string()
}

/// How `to` is related to `from`.
pub fn resolve(graph: &Graph, from_id: &str, to_id: &str) -> Relationship {
    use RelationshipCategory as C;

    let (Some(_), Some(to)) = (find_by_id(graph, from_id), find_by_id(graph, to_id)) else {
        return Relationship::new(C::NotFound, "member not found");
    };
    if from_id == to_id {
        return Relationship::new(C::SameMember, "self");
    }
    if are_spouses(graph, from_id, to_id) {
        return Relationship::new(C::Spouse, gendered(to.gender, "husband", "wife", "spouse"));
    }

    let (Some(p1), Some(p2)) = (path_to_root(graph, from_id), path_to_root(graph, to_id)) else {
        return Relationship::new(C::NotFound, "member not found");
    };
    if p1[0].id != p2[0].id {
        return Relationship::new(C::NoBloodRelation, "no direct blood relation");
    }

    let mut lca = 0;
    while lca + 1 < p1.len() && lca + 1 < p2.len() && p1[lca + 1].id == p2[lca + 1].id {
        lca += 1;
    }
    let d1 = p1.len() - 1 - lca;
    let d2 = p2.len() - 1 - lca;

    classify(d1, d2, &p1[lca..], &p2[lca..], to)
}

/// `up` and `down` are the paths from the common ancestor (inclusive) to each member.
fn classify(d1: usize, d2: usize, up: &[&Member], down: &[&Member], to: &Member) -> Relationship {
    use RelationshipCategory as C;

    match (d1, d2) {
        (0, generations) => {
            let label = match generations {
                1 => gendered(to.gender, "son", "daughter", "child"),
                2 => gendered(to.gender, "grandson", "granddaughter", "grandchild"),
                n => format!("descendant {n} generations down"),
            };
            Relationship::new(C::Descendant { generations }, label)
        }
        (generations, 0) => {
            let label = match generations {
                1 => gendered(to.gender, "father", "mother", "parent"),
                2 => gendered(to.gender, "grandfather", "grandmother", "grandparent"),
                n => format!("ancestor {n} generations up"),
            };
            Relationship::new(C::Ancestor { generations }, label)
        }
        (1, 1) => Relationship::new(C::Sibling, gendered(to.gender, "brother", "sister", "sibling")),
        (1, 2) => {
            // through the parent of `to`, who is a sibling of `from`
            let via = gendered(down[1].gender, "brother's", "sister's", "sibling's");
            let child = gendered(to.gender, "son", "daughter", "child");
            Relationship::new(C::SiblingChild, format!("{via} {child}"))
        }
        (2, 1) => {
            let side = match up[1].gender {
                Gender::Male => "paternal ",
                Gender::Female => "maternal ",
                Gender::Other => "",
            };
            let term = gendered(to.gender, "uncle", "aunt", "parent's sibling");
            Relationship::new(C::ParentSibling, format!("{side}{term}"))
        }
        (2, 2) => {
            let own_parent = gendered(up[1].gender, "father's", "mother's", "parent's");
            let their_parent = gendered(down[1].gender, "brother", "sister", "sibling");
            Relationship::new(C::Cousin, format!("cousin through {own_parent} {their_parent}"))
        }
        (up, down) => Relationship::new(
            C::Distant { up, down },
            format!("distant relative (distance {up}-{down})"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutate::{add_connection, insert_parent, insert_spouse};
    use crate::model::SPOUSE_LABEL;

    // R ─ A(m) ─┬─ B(m) ─ E(f)
    //           └─ C(f) ─ F(m)
    //     G(f) ─ H(f) ─ I(m)       (G is a second child of R)
    fn family() -> Graph {
        let a = Member::new("a", "A", Gender::Male)
            .with_child(Member::new("b", "B", Gender::Male).with_child(Member::new("e", "E", Gender::Female)))
            .with_child(Member::new("c", "C", Gender::Female).with_child(Member::new("f", "F", Gender::Male)));
        let g = Member::new("g", "G", Gender::Female)
            .with_child(Member::new("h", "H", Gender::Female).with_child(Member::new("i", "I", Gender::Male)));
        Graph::new(Member::new("r", "R", Gender::Male).with_child(a).with_child(g))
    }

    fn label(graph: &Graph, from: &str, to: &str) -> String {
        resolve(graph, from, to).label
    }

    #[test]
    fn siblings_parents_and_children() {
        let g = family();
        assert_eq!(label(&g, "b", "c"), "sister");
        assert_eq!(label(&g, "c", "b"), "brother");
        assert_eq!(label(&g, "b", "a"), "father");
        assert_eq!(label(&g, "a", "b"), "son");
        assert_eq!(label(&g, "e", "r"), "ancestor 3 generations up");
        assert_eq!(label(&g, "r", "e"), "descendant 3 generations down");
        assert_eq!(label(&g, "e", "a"), "grandfather");
        assert_eq!(label(&g, "a", "f"), "grandson");
    }

    #[test]
    fn sibling_category_is_symmetric() {
        let g = family();
        assert_eq!(resolve(&g, "b", "c").category, RelationshipCategory::Sibling);
        assert_eq!(resolve(&g, "c", "b").category, RelationshipCategory::Sibling);
    }

    #[test]
    fn nephews_and_nieces_name_the_parent_sibling() {
        let g = family();
        assert_eq!(label(&g, "b", "f"), "sister's son");
        assert_eq!(label(&g, "c", "e"), "brother's daughter");
    }

    #[test]
    fn uncles_and_aunts_name_the_side() {
        let g = family();
        // F's mother is C, her brother is B
        assert_eq!(label(&g, "f", "b"), "maternal uncle");
        // E's father is B, his sister is C
        assert_eq!(label(&g, "e", "c"), "paternal aunt");
        assert_eq!(resolve(&g, "e", "c").category, RelationshipCategory::ParentSibling);
    }

    #[test]
    fn cousins_combine_both_parents() {
        let g = family();
        assert_eq!(label(&g, "e", "f"), "cousin through father's sister");
        assert_eq!(label(&g, "f", "e"), "cousin through mother's brother");
    }

    #[test]
    fn far_branches_fall_back_to_distance() {
        let g = family();
        let rel = resolve(&g, "e", "i");
        assert_eq!(rel.category, RelationshipCategory::Distant { up: 3, down: 3 });
        assert_eq!(rel.label, "distant relative (distance 3-3)");
    }

    #[test]
    fn spouse_wins_over_tree_distance() {
        let g = insert_spouse(&family(), "e", Some("i")).graph;
        assert_eq!(resolve(&g, "e", "i").category, RelationshipCategory::Spouse);
        assert_eq!(label(&g, "i", "e"), "wife");

        let one_way = add_connection(&family(), "b", "h", SPOUSE_LABEL);
        assert_eq!(label(&one_way, "h", "b"), "husband");
    }

    #[test]
    fn separate_clans_are_not_blood_related() {
        let g = insert_parent(&family()).graph;
        let clan = g.root_ids()[1].to_string();
        assert_eq!(resolve(&g, "b", &clan).category, RelationshipCategory::NoBloodRelation);
    }

    #[test]
    fn self_and_missing() {
        let g = family();
        assert_eq!(resolve(&g, "b", "b").category, RelationshipCategory::SameMember);
        assert_eq!(resolve(&g, "b", "zz").category, RelationshipCategory::NotFound);
    }

    #[test]
    fn scenario_new_spouse_is_spouse() {
        let g = family();
        let edit = insert_spouse(&g, "b", None);
        let d = edit.created.unwrap();
        assert_eq!(resolve(&edit.graph, "b", &d).category, RelationshipCategory::Spouse);
    }
}
