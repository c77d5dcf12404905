//! Render-ready view of a layout for one selection and highlight set.

use std::collections::HashSet;

use serde::Serialize;

use super::{EdgeKind, TreeLayout};
use crate::model::{Gender, MemberId};

/// Opacity of members and edges outside a non-empty highlight set.
pub const DIM_OPACITY: f64 = 0.15;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneNode {
    pub id: MemberId,
    pub label: String,
    pub gender: Gender,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub opacity: f64,
    pub selected: bool,
    pub highlighted: bool,
    pub visible: bool,
    pub interactive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneEdge {
    pub source: MemberId,
    pub target: MemberId,
    /// SVG path data.
    pub d: String,
    pub dashed: bool,
    pub label: Option<String>,
    pub opacity: f64,
    pub emphasized: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<SceneEdge>,
}

impl Scene {
    pub fn node(&self, id: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Topmost interactive node whose box contains the world point.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&SceneNode> {
        self.nodes.iter().rev().find(|n| {
            n.interactive && (x - n.x).abs() <= n.width / 2.0 && (y - n.y).abs() <= n.height / 2.0
        })
    }
}

/// Style `layout` for drawing. An empty `highlight` set dims nothing; otherwise
/// members outside it, and edges without both endpoints in it, are dimmed.
pub fn build_scene(layout: &TreeLayout, highlight: &HashSet<MemberId>, selected: Option<&str>) -> Scene {
    let dimming = !highlight.is_empty();
    let lit = |id: &str| dimming && highlight.contains(id);
    let settings = &layout.settings;

    let nodes = layout
        .nodes
        .iter()
        .map(|n| SceneNode {
            id: n.id.clone(),
            label: n.name.clone(),
            gender: n.gender,
            x: n.x,
            y: n.y,
            width: settings.node_width,
            height: settings.node_height,
            opacity: if dimming && !lit(&n.id) { DIM_OPACITY } else { 1.0 },
            selected: !n.synthetic && selected == Some(n.id.as_str()),
            highlighted: lit(&n.id),
            visible: !n.synthetic,
            interactive: !n.synthetic,
        })
        .collect();

    let edges = layout
        .edges
        .iter()
        .map(|e| {
            let emphasized = lit(&e.source) && lit(&e.target);
            SceneEdge {
                source: e.source.clone(),
                target: e.target.clone(),
                d: e.path.to_svg(),
                dashed: e.dashed,
                label: match &e.kind {
                    EdgeKind::Connection { label } => Some(label.clone()),
                    EdgeKind::Hierarchy => None,
                },
                opacity: if dimming && !emphasized { DIM_OPACITY } else { 1.0 },
                emphasized,
            }
        })
        .collect();

    Scene { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_layout, LayoutSettings};
    use crate::model::{Graph, Member, FOREST_ROOT_ID};
    use crate::mutate::insert_parent;

    fn layout() -> TreeLayout {
        let graph = Graph::new(
            Member::new("r", "R", Gender::Male)
                .with_child(Member::new("a", "A", Gender::Female))
                .with_child(Member::new("b", "B", Gender::Male)),
        );
        compute_layout(&graph, &LayoutSettings::default())
    }

    fn set(ids: &[&str]) -> HashSet<MemberId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_highlight_dims_nothing() {
        let scene = build_scene(&layout(), &HashSet::new(), Some("a"));
        assert!(scene.nodes.iter().all(|n| n.opacity == 1.0 && !n.highlighted));
        assert!(scene.edges.iter().all(|e| e.opacity == 1.0));
        assert!(scene.node("a").unwrap().selected);
        assert!(!scene.node("b").unwrap().selected);
    }

    #[test]
    fn edges_need_both_endpoints_lit() {
        let scene = build_scene(&layout(), &set(&["r", "a"]), None);
        assert_eq!(scene.node("b").unwrap().opacity, DIM_OPACITY);
        assert!(scene.node("a").unwrap().highlighted);
        let ra = scene.edges.iter().find(|e| e.target == "a").unwrap();
        let rb = scene.edges.iter().find(|e| e.target == "b").unwrap();
        assert!(ra.emphasized && ra.opacity == 1.0);
        assert!(!rb.emphasized && rb.opacity == DIM_OPACITY);
    }

    #[test]
    fn forest_root_is_hidden_and_inert() {
        let graph = insert_parent(&Graph::new(Member::new("r", "R", Gender::Male))).graph;
        let layout = compute_layout(&graph, &LayoutSettings::default());
        let scene = build_scene(&layout, &HashSet::new(), Some(FOREST_ROOT_ID));
        let forest = scene.node(FOREST_ROOT_ID).unwrap();
        assert!(!forest.visible && !forest.interactive && !forest.selected);
        assert!(scene.hit_test(forest.x, forest.y).is_none());
    }

    #[test]
    fn hit_test_finds_box_under_point() {
        let scene = build_scene(&layout(), &HashSet::new(), None);
        let a = scene.node("a").unwrap();
        assert_eq!(scene.hit_test(a.x + 10.0, a.y - 5.0).map(|n| n.id.as_str()), Some("a"));
        assert!(scene.hit_test(a.x, a.y + 1000.0).is_none());
    }
}
