use kindred_core::layout::{compute_layout, EdgeKind, LayoutSettings, Orientation};
use kindred_core::{
    filter, flatten, lineage, mutate, resolve, stats, traverse, FilterCriteria, Gender, Graph, Library, Member,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const INSTRUCTIONS: &str = "\
Kindred keeps family trees (genealogies) as named documents.

Every member has an id such as \"m-4\". Use get_tree to see ids, names and the
nesting of children. Members with several independent family lines are kept
as separate clans side by side; add_clan starts a new one.

- add_child / add_sibling / add_spouse create members and return the new id.
- update_member edits fields of one member; omitted fields stay as they are.
- delete_member removes a member with all descendants and every connection
  pointing into the removed branch. The root of the tree cannot be deleted.
- relationship names how the second member is related to the first
  (e.g. \"paternal uncle\", \"sister's son\").
- search filters members by name/code, occupation, tag and birth-year range.";

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct TreeRequest {
    /// Name of the tree
    tree: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct CreateTreeRequest {
    /// Name of the new tree (letters, digits, dashes; no slashes)
    tree: String,
    /// Display name of the first member
    root_name: String,
    /// Gender of the first member: "male", "female" or "other"
    gender: Option<Gender>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AddChildRequest {
    tree: String,
    /// ID of the parent member (e.g. "m-3")
    parent_id: String,
    /// "male", "female" or "other" (default)
    gender: Option<Gender>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AddSiblingRequest {
    tree: String,
    /// ID of the member who gets a new sibling
    sibling_id: String,
    /// "male", "female" or "other" (default)
    gender: Option<Gender>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AddSpouseRequest {
    tree: String,
    member_id: String,
    /// Marry an existing member instead of creating a new one
    spouse_id: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct UpdateMemberRequest {
    tree: String,
    member_id: String,
    name: Option<String>,
    gender: Option<Gender>,
    /// Lineage or registry code
    code: Option<String>,
    birth_date: Option<String>,
    death_date: Option<String>,
    location: Option<String>,
    occupation: Option<String>,
    /// Replaces all tags
    tags: Option<Vec<String>>,
    /// Free-text biography
    note: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct MemberRequest {
    tree: String,
    member_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ConnectionRequest {
    tree: String,
    source_id: String,
    target_id: String,
    /// Free-text label such as "godparent" (add_connection only; default "related")
    label: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct RelationshipRequest {
    tree: String,
    /// Member the relationship is seen from
    from_id: String,
    /// Member whose relation to from_id is named
    to_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SearchRequest {
    tree: String,
    #[serde(flatten)]
    criteria: FilterCriteria,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct LayoutRequest {
    tree: String,
    /// "vertical" (default) or "horizontal"
    orientation: Option<Orientation>,
}

// --- Helpers ---

fn ok(text: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(text.into())]))
}

fn fail(text: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(text.into())]))
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Serialization error: {}", e))
}

fn missing_member(tree: &str, id: &str) -> String {
    format!("Member '{}' not found in tree '{}'", id, tree)
}

fn member_line(m: &Member) -> String {
    format!("{} \"{}\" ({})", m.id, m.name, m.gender.as_str())
}

// --- Server ---

#[derive(Clone)]
pub struct KindredServer {
    library: Library,
    tool_router: ToolRouter<Self>,
}

impl KindredServer {
    fn load(&self, tree: &str) -> Result<Graph, String> {
        self.library
            .read_tree(tree)
            .map_err(|e| format!("Failed to read tree '{}': {}", tree, e))
    }

    fn store(&self, tree: &str, graph: &Graph) -> Result<(), String> {
        self.library
            .write_tree(tree, graph)
            .map_err(|e| format!("Failed to write tree '{}': {}", tree, e))
    }

    /// Load, edit, save. `edit` returns the new snapshot and a success message.
    fn apply(
        &self,
        tree: &str,
        edit: impl FnOnce(&Graph) -> Result<(Graph, String), String>,
    ) -> Result<CallToolResult, McpError> {
        let graph = match self.load(tree) {
            Ok(g) => g,
            Err(e) => return fail(e),
        };
        let (next, message) = match edit(&graph) {
            Ok(done) => done,
            Err(e) => {
                warn!(tree, error = %e, "edit rejected");
                return fail(e);
            }
        };
        if let Err(e) = self.store(tree, &next) {
            return fail(e);
        }
        info!(tree, "{}", message);
        ok(message)
    }
}

#[tool_router]
impl KindredServer {
    pub fn new(library: Library) -> Self {
        Self {
            library,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "List all family trees")]
    fn list_trees(&self) -> Result<CallToolResult, McpError> {
        match self.library.list_trees() {
            Ok(names) => {
                let text = if names.is_empty() {
                    "No trees found. Use create_tree to start one.".to_string()
                } else {
                    names.join("\n")
                };
                ok(text)
            }
            Err(e) => fail(e.to_string()),
        }
    }

    #[tool(
        description = "Get a tree as JSON: the root member {id, name, gender, birthDate?, deathDate?, location?, occupation?, tags?, code?, note?, children: [...], connections: [{targetId, label}]}. A root with relation \"forest-root\" is a container whose children are independent clans."
    )]
    fn get_tree(&self, Parameters(req): Parameters<TreeRequest>) -> Result<CallToolResult, McpError> {
        match self.load(&req.tree) {
            Ok(graph) => ok(to_json(&graph)),
            Err(e) => fail(e),
        }
    }

    #[tool(description = "Create a new tree with a single root member")]
    fn create_tree(&self, Parameters(req): Parameters<CreateTreeRequest>) -> Result<CallToolResult, McpError> {
        if self.library.exists(&req.tree) {
            return fail(format!("Tree '{}' already exists", req.tree));
        }
        let root = Member::new("m-1", req.root_name, req.gender.unwrap_or_default());
        let graph = Graph::new(root);
        match self.store(&req.tree, &graph) {
            Ok(()) => ok(format!("Created tree '{}' with root m-1", req.tree)),
            Err(e) => fail(e),
        }
    }

    #[tool(description = "Add a child under a member. Returns the new member's id.")]
    fn add_child(&self, Parameters(req): Parameters<AddChildRequest>) -> Result<CallToolResult, McpError> {
        let tree = req.tree.clone();
        self.apply(&req.tree, |g| {
            let edit = mutate::insert_child(g, &req.parent_id, req.gender.unwrap_or_default());
            match edit.created {
                Some(id) => Ok((edit.graph, format!("Added child {} under {}", id, req.parent_id))),
                None => Err(missing_member(&tree, &req.parent_id)),
            }
        })
    }

    #[tool(
        description = "Add a sibling next to a member (same parent). The root of the tree cannot get a sibling; use add_clan for an unrelated family line."
    )]
    fn add_sibling(&self, Parameters(req): Parameters<AddSiblingRequest>) -> Result<CallToolResult, McpError> {
        let tree = req.tree.clone();
        self.apply(&req.tree, |g| {
            let edit =
                mutate::insert_sibling(g, &req.sibling_id, req.gender.unwrap_or_default()).map_err(|e| e.to_string())?;
            match edit.created {
                Some(id) => Ok((edit.graph, format!("Added sibling {} next to {}", id, req.sibling_id))),
                None => Err(missing_member(&tree, &req.sibling_id)),
            }
        })
    }

    #[tool(description = "Start a new independent clan (family line) beside the existing ones")]
    fn add_clan(&self, Parameters(req): Parameters<TreeRequest>) -> Result<CallToolResult, McpError> {
        self.apply(&req.tree, |g| {
            let edit = mutate::insert_parent(g);
            let id = edit.created.unwrap_or_default();
            Ok((edit.graph, format!("Added clan root {}", id)))
        })
    }

    #[tool(
        description = "Marry a member. With spouse_id, links two existing members; otherwise creates a new spouse of the opposite gender as a separate clan."
    )]
    fn add_spouse(&self, Parameters(req): Parameters<AddSpouseRequest>) -> Result<CallToolResult, McpError> {
        let tree = req.tree.clone();
        self.apply(&req.tree, |g| {
            if traverse::find_by_id(g, &req.member_id).is_none() {
                return Err(missing_member(&tree, &req.member_id));
            }
            if let Some(spouse) = req.spouse_id.as_deref() {
                if spouse == req.member_id {
                    return Err("A member cannot marry themselves".to_string());
                }
                if traverse::find_by_id(g, spouse).is_none() {
                    return Err(missing_member(&tree, spouse));
                }
            }
            let edit = mutate::insert_spouse(g, &req.member_id, req.spouse_id.as_deref());
            let spouse = edit.created.or(req.spouse_id.clone()).unwrap_or_default();
            Ok((edit.graph, format!("Married {} and {}", req.member_id, spouse)))
        })
    }

    #[tool(description = "Update fields of a member. Omitted fields are left unchanged; empty strings clear optional fields.")]
    fn update_member(&self, Parameters(req): Parameters<UpdateMemberRequest>) -> Result<CallToolResult, McpError> {
        let tree = req.tree.clone();
        self.apply(&req.tree, |g| {
            let Some(current) = traverse::find_by_id(g, &req.member_id) else {
                return Err(missing_member(&tree, &req.member_id));
            };
            let opt = |v: String| Some(v).filter(|s| !s.trim().is_empty());
            let mut member = current.clone();
            if let Some(name) = req.name {
                member.name = name;
            }
            if let Some(gender) = req.gender {
                member.gender = gender;
            }
            if let Some(v) = req.code {
                member.code = opt(v);
            }
            if let Some(v) = req.birth_date {
                member.birth_date = opt(v);
            }
            if let Some(v) = req.death_date {
                member.death_date = opt(v);
            }
            if let Some(v) = req.location {
                member.location = opt(v);
            }
            if let Some(v) = req.occupation {
                member.occupation = opt(v);
            }
            if let Some(tags) = req.tags {
                member.tags = tags;
            }
            if let Some(v) = req.note {
                member.note = opt(v);
            }
            let next = mutate::update_member(g, member).map_err(|e| e.to_string())?;
            Ok((next, format!("Updated {}", req.member_id)))
        })
    }

    #[tool(description = "Delete a member together with all descendants")]
    fn delete_member(&self, Parameters(req): Parameters<MemberRequest>) -> Result<CallToolResult, McpError> {
        let tree = req.tree.clone();
        self.apply(&req.tree, |g| {
            let Some(member) = traverse::find_by_id(g, &req.member_id) else {
                return Err(missing_member(&tree, &req.member_id));
            };
            let removed = traverse::subtree_ids(member).len();
            let next = mutate::delete_cascade(g, &req.member_id).map_err(|e| e.to_string())?;
            Ok((next, format!("Deleted {} member(s) starting at {}", removed, req.member_id)))
        })
    }

    #[tool(description = "Add a labelled connection from one member to another (idempotent)")]
    fn add_connection(&self, Parameters(req): Parameters<ConnectionRequest>) -> Result<CallToolResult, McpError> {
        let tree = req.tree.clone();
        self.apply(&req.tree, |g| {
            for id in [&req.source_id, &req.target_id] {
                if traverse::find_by_id(g, id).is_none() {
                    return Err(missing_member(&tree, id));
                }
            }
            let label = req.label.as_deref().unwrap_or("related");
            let next = mutate::add_connection(g, &req.source_id, &req.target_id, label);
            Ok((next, format!("Connected {} -> {} ({})", req.source_id, req.target_id, label)))
        })
    }

    #[tool(description = "Remove the connection from one member to another")]
    fn remove_connection(&self, Parameters(req): Parameters<ConnectionRequest>) -> Result<CallToolResult, McpError> {
        self.apply(&req.tree, |g| {
            let next = mutate::remove_connection(g, &req.source_id, &req.target_id);
            if next.same_snapshot(g) {
                return Err(format!("No connection from {} to {}", req.source_id, req.target_id));
            }
            Ok((next, format!("Removed connection {} -> {}", req.source_id, req.target_id)))
        })
    }

    #[tool(
        description = "Name how to_id is related to from_id, e.g. father, sister's son, maternal aunt, cousin through father's brother. Returns {category: {kind, ...}, label}."
    )]
    fn relationship(&self, Parameters(req): Parameters<RelationshipRequest>) -> Result<CallToolResult, McpError> {
        match self.load(&req.tree) {
            Ok(graph) => ok(to_json(&resolve(&graph, &req.from_id, &req.to_id))),
            Err(e) => fail(e),
        }
    }

    #[tool(
        description = "Search members. textQuery matches name or code, occupation and tag are substrings, startYear/endYear bound the birth year. All given options must match."
    )]
    fn search(&self, Parameters(req): Parameters<SearchRequest>) -> Result<CallToolResult, McpError> {
        let graph = match self.load(&req.tree) {
            Ok(g) => g,
            Err(e) => return fail(e),
        };
        let hits = filter(flatten(&graph), &req.criteria);
        if hits.is_empty() {
            return ok("No members match.");
        }
        ok(hits.into_iter().map(member_line).collect::<Vec<_>>().join("\n"))
    }

    #[tool(description = "List a member's ancestors and descendants")]
    fn lineage(&self, Parameters(req): Parameters<MemberRequest>) -> Result<CallToolResult, McpError> {
        let graph = match self.load(&req.tree) {
            Ok(g) => g,
            Err(e) => return fail(e),
        };
        let ids = lineage(&graph, &req.member_id);
        if ids.is_empty() {
            return fail(missing_member(&req.tree, &req.member_id));
        }
        let lines: Vec<String> = flatten(&graph)
            .into_iter()
            .filter(|m| ids.contains(&m.id))
            .map(|m| {
                let depth = traverse::depth_of(&graph, &m.id).unwrap_or(0);
                format!("{}{}", "  ".repeat(depth), member_line(m))
            })
            .collect();
        ok(lines.join("\n"))
    }

    #[tool(description = "Summary counts: members, genders, generations, clans, connections, living")]
    fn stats(&self, Parameters(req): Parameters<TreeRequest>) -> Result<CallToolResult, McpError> {
        match self.load(&req.tree) {
            Ok(graph) => ok(to_json(&stats(&graph))),
            Err(e) => fail(e),
        }
    }

    #[tool(
        description = "Compute the drawing layout: node centres {id, x, y, depth} and edges {source, target, kind, dashed, d} where d is SVG path data"
    )]
    fn layout(&self, Parameters(req): Parameters<LayoutRequest>) -> Result<CallToolResult, McpError> {
        let graph = match self.load(&req.tree) {
            Ok(g) => g,
            Err(e) => return fail(e),
        };
        let settings = LayoutSettings {
            orientation: req.orientation.unwrap_or_default(),
            ..LayoutSettings::default()
        };
        let layout = compute_layout(&graph, &settings);
        let nodes: Vec<serde_json::Value> = layout
            .visible_nodes()
            .map(|n| serde_json::json!({ "id": n.id, "name": n.name, "x": n.x, "y": n.y, "depth": n.depth }))
            .collect();
        let edges: Vec<serde_json::Value> = layout
            .edges
            .iter()
            .map(|e| {
                let kind = match &e.kind {
                    EdgeKind::Hierarchy => "hierarchy".to_string(),
                    EdgeKind::Connection { label } => label.clone(),
                };
                serde_json::json!({
                    "source": e.source,
                    "target": e.target,
                    "kind": kind,
                    "dashed": e.dashed,
                    "d": e.path.to_svg(),
                })
            })
            .collect();
        ok(to_json(&serde_json::json!({ "nodes": nodes, "edges": edges })))
    }
}

#[tool_handler]
impl ServerHandler for KindredServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let library = Library::open_default();
    info!(dir = %library.dir().display(), "serving family trees");

    let service = KindredServer::new(library)
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "MCP server error"))?;
    service.waiting().await?;
    Ok(())
}
