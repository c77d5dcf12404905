//! Projection of a graph snapshot into 2D.
//!
//! [`compute_layout`] is a pure function of (snapshot, settings): it places
//! every member with the tidy tree pass and derives hierarchy and connection
//! edge geometry. [`scene::build_scene`] then styles the result for a given
//! selection and highlight set, and [`viewport::Viewport`] maps it to the
//! screen. [`canvas::Canvas`] ties the three together and only relayouts when
//! the snapshot or settings change.

pub mod canvas;
pub mod edges;
pub mod scene;
pub mod tidy;
pub mod viewport;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Gender, Graph, MemberId};
use crate::traverse;

pub use canvas::Canvas;
pub use edges::{EdgePath, PathCommand};
pub use scene::{build_scene, Scene, SceneEdge, SceneNode};
pub use viewport::{Transform, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new((self.min.x + self.max.x) / 2.0, (self.min.y + self.max.y) / 2.0)
    }
}

/// Which screen axis generations advance along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Generations run left to right.
    Horizontal,
    /// Generations run top to bottom.
    #[default]
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStyle {
    #[default]
    Curved,
    Elbow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutSettings {
    pub orientation: Orientation,
    pub link_style: LinkStyle,
    /// Spread connection edges over three lanes.
    pub prevent_overlap: bool,
    pub node_width: f64,
    pub node_height: f64,
    /// Space between generations.
    pub level_gap: f64,
    /// Space between boxes that share a parent.
    pub sibling_gap: f64,
    /// Space between boxes with different parents.
    pub clan_gap: f64,
    pub lane_spacing: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            orientation: Orientation::Vertical,
            link_style: LinkStyle::Curved,
            prevent_overlap: true,
            node_width: 180.0,
            node_height: 72.0,
            level_gap: 80.0,
            sibling_gap: 24.0,
            clan_gap: 64.0,
            lane_spacing: 10.0,
        }
    }
}

impl LayoutSettings {
    /// Box extent along the sibling axis.
    fn breadth_extent(&self) -> f64 {
        match self.orientation {
            Orientation::Vertical => self.node_width,
            Orientation::Horizontal => self.node_height,
        }
    }

    /// Box extent along the generation axis.
    fn depth_extent(&self) -> f64 {
        match self.orientation {
            Orientation::Vertical => self.node_height,
            Orientation::Horizontal => self.node_width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub id: MemberId,
    pub name: String,
    pub gender: Gender,
    /// Box centre in world coordinates.
    pub x: f64,
    pub y: f64,
    pub depth: usize,
    pub parent: Option<MemberId>,
    pub children: Vec<MemberId>,
    /// The forest root: positioned, never drawn or navigable.
    pub synthetic: bool,
}

impl PositionedNode {
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum EdgeKind {
    Hierarchy,
    Connection { label: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEdge {
    pub source: MemberId,
    pub target: MemberId,
    pub kind: EdgeKind,
    pub path: EdgePath,
    pub dashed: bool,
}

#[derive(Debug, Clone)]
pub struct TreeLayout {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<LayoutEdge>,
    pub settings: LayoutSettings,
    index: HashMap<MemberId, usize>,
}

impl TreeLayout {
    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn visible_nodes(&self) -> impl Iterator<Item = &PositionedNode> {
        self.nodes.iter().filter(|n| !n.synthetic)
    }

    /// Extent of the drawn boxes.
    pub fn bounds(&self) -> Option<Bounds> {
        let (hw, hh) = (self.settings.node_width / 2.0, self.settings.node_height / 2.0);
        self.visible_nodes().fold(None, |acc, n| {
            let (lo, hi) = (Point::new(n.x - hw, n.y - hh), Point::new(n.x + hw, n.y + hh));
            Some(match acc {
                None => Bounds { min: lo, max: hi },
                Some(b) => Bounds {
                    min: Point::new(b.min.x.min(lo.x), b.min.y.min(lo.y)),
                    max: Point::new(b.max.x.max(hi.x), b.max.y.max(hi.y)),
                },
            })
        })
    }
}

/// Place every member and build edge geometry.
pub fn compute_layout(graph: &Graph, settings: &LayoutSettings) -> TreeLayout {
    let spacing = tidy::Spacing {
        sibling: settings.breadth_extent() + settings.sibling_gap,
        clan: settings.breadth_extent() + settings.clan_gap,
    };
    let tree = tidy::tidy(graph, spacing);
    let step = settings.depth_extent() + settings.level_gap;

    let nodes: Vec<PositionedNode> = tree
        .nodes
        .iter()
        .map(|t| {
            let along = t.depth as f64 * step;
            let (x, y) = match settings.orientation {
                Orientation::Vertical => (t.breadth, along),
                Orientation::Horizontal => (along, t.breadth),
            };
            PositionedNode {
                id: t.id.clone(),
                name: t.name.clone(),
                gender: t.gender,
                x,
                y,
                depth: t.depth,
                parent: t.parent.map(|p| tree.nodes[p].id.clone()),
                children: t.children.iter().map(|&c| tree.nodes[c].id.clone()).collect(),
                synthetic: t.synthetic,
            }
        })
        .collect();
    let index: HashMap<MemberId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.clone(), i))
        .collect();

    let mut edges = Vec::new();
    let half_depth = settings.depth_extent() / 2.0;
    for node in nodes.iter().filter(|n| !n.synthetic) {
        for child_id in &node.children {
            if let Some(child) = index.get(child_id).map(|&i| &nodes[i]) {
                edges.push(LayoutEdge {
                    source: node.id.clone(),
                    target: child.id.clone(),
                    kind: EdgeKind::Hierarchy,
                    path: edges::hierarchy_path(
                        node.center(),
                        child.center(),
                        half_depth,
                        settings.orientation,
                        settings.link_style,
                    ),
                    dashed: false,
                });
            }
        }
    }

    for member in traverse::walk(graph) {
        let Some(from) = index.get(&member.id).map(|&i| &nodes[i]) else {
            continue;
        };
        for conn in &member.connections {
            let Some(to) = index.get(&conn.target_id).map(|&i| &nodes[i]) else {
                continue;
            };
            let offset = if settings.prevent_overlap {
                edges::lane_offset(&conn.target_id, settings.lane_spacing)
            } else {
                0.0
            };
            edges.push(LayoutEdge {
                source: from.id.clone(),
                target: to.id.clone(),
                kind: EdgeKind::Connection {
                    label: conn.label.clone(),
                },
                path: edges::connection_path(from.center(), to.center(), offset),
                dashed: true,
            });
        }
    }

    TreeLayout {
        nodes,
        edges,
        settings: settings.clone(),
        index,
    }
}
