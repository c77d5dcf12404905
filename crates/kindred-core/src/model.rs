use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifier of a member, unique across the whole graph.
pub type MemberId = String;

/// Id under which the synthetic forest root appears in layouts and documents.
pub const FOREST_ROOT_ID: &str = "forest-root";

/// Value of the `relation` field that marks a document root as a forest root.
pub const FOREST_RELATION: &str = "forest-root";

/// Label used for marriage connections.
pub const SPOUSE_LABEL: &str = "spouse";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

impl Gender {
    pub fn opposite(self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
            Gender::Other => Gender::Other,
        }
    }

    /// Name given to a freshly inserted child of this gender.
    pub fn default_child_name(self) -> &'static str {
        match self {
            Gender::Male => "Unnamed son",
            Gender::Female => "Unnamed daughter",
            Gender::Other => "Unnamed child",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

/// A directed, non-hierarchical edge such as a marriage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub target_id: MemberId,
    pub label: String,
}

impl Connection {
    pub fn spouse(target_id: impl Into<MemberId>) -> Self {
        Self {
            target_id: target_id.into(),
            label: SPOUSE_LABEL.to_string(),
        }
    }

    pub fn is_spouse(&self) -> bool {
        self.label == SPOUSE_LABEL
    }
}

/// A person in the tree. Children are owned exclusively; unchanged subtrees are
/// shared between snapshots through the `Arc`s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(default)]
    pub id: MemberId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: Gender,
    /// Lineage or registry code, searchable alongside the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Free-text biography.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Arc<Member>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
}

impl Member {
    pub fn new(id: impl Into<MemberId>, name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            gender,
            ..Default::default()
        }
    }

    pub fn with_child(mut self, child: Member) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn has_connection_to(&self, target_id: &str) -> bool {
        self.connections.iter().any(|c| c.target_id == target_id)
    }

    pub fn is_spouse_of(&self, target_id: &str) -> bool {
        self.connections
            .iter()
            .any(|c| c.target_id == target_id && c.is_spouse())
    }
}

/// The top of the hierarchy: either a real member, or a synthetic forest root
/// hosting several independent clans side by side.
#[derive(Debug, Clone, PartialEq)]
pub enum Root {
    Member(Arc<Member>),
    Forest(Vec<Arc<Member>>),
}

/// An immutable snapshot of the family tree.
///
/// Cloning is cheap: only the top-level `Arc`s are copied. Mutations in
/// [`crate::mutate`] clone the members on the path they touch and share the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "RootDocument", try_from = "RootDocument")]
pub struct Graph {
    root: Root,
}

impl Graph {
    pub fn new(root: Member) -> Self {
        Self {
            root: Root::Member(Arc::new(root)),
        }
    }

    /// Build a graph from clan roots. A single clan becomes a real-member root;
    /// returns `None` when there is no clan at all.
    pub fn from_clans(mut clans: Vec<Arc<Member>>) -> Option<Self> {
        match clans.len() {
            0 => None,
            1 => clans.pop().map(|root| Self {
                root: Root::Member(root),
            }),
            _ => Some(Self {
                root: Root::Forest(clans),
            }),
        }
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn is_forest(&self) -> bool {
        matches!(self.root, Root::Forest(_))
    }

    /// The top-level members: the root itself, or every clan under the forest root.
    pub fn clans(&self) -> &[Arc<Member>] {
        match &self.root {
            Root::Member(member) => std::slice::from_ref(member),
            Root::Forest(clans) => clans,
        }
    }

    pub fn root_ids(&self) -> Vec<&str> {
        self.clans().iter().map(|m| m.id.as_str()).collect()
    }

    /// Id of the absolute root, which can never be deleted.
    pub fn absolute_root_id(&self) -> &str {
        match &self.root {
            Root::Member(member) => &member.id,
            Root::Forest(_) => FOREST_ROOT_ID,
        }
    }

    pub fn member_count(&self) -> usize {
        fn count(member: &Member) -> usize {
            1 + member.children.iter().map(|c| count(c)).sum::<usize>()
        }
        self.clans().iter().map(|c| count(c)).sum()
    }

    /// True when both snapshots share every top-level member allocation,
    /// i.e. nothing has been mutated between them.
    pub fn same_snapshot(&self, other: &Graph) -> bool {
        let (a, b) = (self.clans(), other.clans());
        self.is_forest() == other.is_forest()
            && a.len() == b.len()
            && a.iter().zip(b).all(|(x, y)| Arc::ptr_eq(x, y))
    }

    pub(crate) fn clans_mut(&mut self) -> &mut [Arc<Member>] {
        match &mut self.root {
            Root::Member(member) => std::slice::from_mut(member),
            Root::Forest(clans) => clans,
        }
    }

    /// Append a clan root, turning a real-member root into a forest root first.
    pub(crate) fn push_clan(&mut self, clan: Member) {
        let clan = Arc::new(clan);
        match &mut self.root {
            Root::Forest(clans) => clans.push(clan),
            Root::Member(member) => {
                let existing = Arc::clone(member);
                self.root = Root::Forest(vec![existing, clan]);
            }
        }
    }

    /// Remove a clan root; a forest left with one clan dissolves into it.
    pub(crate) fn remove_clan(&mut self, index: usize) -> bool {
        let Root::Forest(clans) = &mut self.root else {
            return false;
        };
        if index >= clans.len() || clans.len() < 2 {
            return false;
        }
        clans.remove(index);
        if clans.len() == 1 {
            if let Some(only) = clans.pop() {
                self.root = Root::Member(only);
            }
        }
        true
    }
}

/// Result of an insert: the new snapshot plus the id of the member it created.
#[derive(Debug, Clone)]
pub struct Edit {
    pub graph: Graph,
    pub created: Option<MemberId>,
}

impl Edit {
    pub(crate) fn unchanged(graph: &Graph) -> Self {
        Self {
            graph: graph.clone(),
            created: None,
        }
    }
}

// --- Document shape ---

/// On-disk shape of a graph: the root member, with a `relation` marker when it
/// is a synthetic forest root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RootDocument {
    #[serde(flatten)]
    pub member: Member,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

impl From<Graph> for RootDocument {
    fn from(graph: Graph) -> Self {
        match graph.root {
            Root::Member(member) => RootDocument {
                member: Arc::unwrap_or_clone(member),
                relation: None,
            },
            Root::Forest(clans) => RootDocument {
                member: Member {
                    id: FOREST_ROOT_ID.to_string(),
                    children: clans,
                    ..Default::default()
                },
                relation: Some(FOREST_RELATION.to_string()),
            },
        }
    }
}

impl TryFrom<RootDocument> for Graph {
    type Error = String;

    fn try_from(doc: RootDocument) -> Result<Self, Self::Error> {
        if doc.relation.as_deref() == Some(FOREST_RELATION) {
            Graph::from_clans(doc.member.children)
                .ok_or_else(|| "forest root has no clans".to_string())
        } else {
            Ok(Graph::new(doc.member))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clan(id: &str) -> Member {
        Member::new(id, id, Gender::Male)
    }

    #[test]
    fn push_clan_wraps_real_root_into_forest() {
        let mut graph = Graph::new(clan("a"));
        assert!(!graph.is_forest());
        graph.push_clan(clan("b"));
        assert!(graph.is_forest());
        assert_eq!(graph.root_ids(), vec!["a", "b"]);
        assert_eq!(graph.absolute_root_id(), FOREST_ROOT_ID);
    }

    #[test]
    fn removing_down_to_one_clan_dissolves_forest() {
        let mut graph = Graph::new(clan("a"));
        graph.push_clan(clan("b"));
        assert!(graph.remove_clan(0));
        assert!(!graph.is_forest());
        assert_eq!(graph.absolute_root_id(), "b");
        assert!(!graph.remove_clan(0));
    }

    #[test]
    fn forest_round_trips_through_document_marker() {
        let mut graph = Graph::new(clan("a").with_child(clan("a1")));
        graph.push_clan(clan("b"));

        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["relation"], FOREST_RELATION);
        assert_eq!(json["id"], FOREST_ROOT_ID);
        assert_eq!(json["children"][0]["children"][0]["id"], "a1");

        let back: Graph = serde_json::from_value(json).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn clone_is_same_snapshot_until_changed() {
        let graph = Graph::new(clan("a"));
        let copy = graph.clone();
        assert!(graph.same_snapshot(&copy));

        let rebuilt = Graph::new(clan("a"));
        assert_eq!(rebuilt, graph);
        assert!(!rebuilt.same_snapshot(&graph));
    }
}
