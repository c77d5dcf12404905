//! Cached layout plus viewport for one rendered tree.

use std::collections::HashSet;

use tracing::debug;

use super::scene::{build_scene, Scene};
use super::viewport::Viewport;
use super::{compute_layout, LayoutSettings, TreeLayout};
use crate::model::{Graph, MemberId};

/// Screen padding used when fitting the whole tree.
const FIT_PADDING: f64 = 40.0;

/// Cached layout plus viewport for one drawing surface.
///
/// The layout is recomputed only when the snapshot or the settings change.
/// Viewport gestures never touch the cache.
#[derive(Debug)]
pub struct Canvas {
    key: Option<(Graph, LayoutSettings)>,
    layout: Option<TreeLayout>,
    viewport: Viewport,
    relayouts: usize,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            key: None,
            layout: None,
            viewport: Viewport::new(width, height),
            relayouts: 0,
        }
    }

    /// Bring the layout up to date. Returns true when it was recomputed.
    pub fn sync(&mut self, graph: &Graph, settings: &LayoutSettings) -> bool {
        let fresh = self
            .key
            .as_ref()
            .is_some_and(|(g, s)| g.same_snapshot(graph) && s == settings);
        if fresh {
            return false;
        }
        let first = self.layout.is_none();
        self.layout = Some(compute_layout(graph, settings));
        self.key = Some((graph.clone(), settings.clone()));
        self.relayouts += 1;
        debug!(members = graph.member_count(), relayouts = self.relayouts, "relayout");
        if first {
            self.fit();
        }
        true
    }

    pub fn layout(&self) -> Option<&TreeLayout> {
        self.layout.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Number of layout passes run so far.
    pub fn relayouts(&self) -> usize {
        self.relayouts
    }

    pub fn fit(&mut self) {
        if let Some(bounds) = self.layout.as_ref().and_then(TreeLayout::bounds) {
            self.viewport.fit(&bounds, FIT_PADDING);
        }
    }

    pub fn scene(&self, highlight: &HashSet<MemberId>, selected: Option<&str>) -> Scene {
        self.layout
            .as_ref()
            .map(|layout| build_scene(layout, highlight, selected))
            .unwrap_or_default()
    }

    /// Animate the viewport towards a member. Returns false if it is not laid out.
    pub fn focus(&mut self, id: &str) -> bool {
        let Some(node) = self.layout.as_ref().and_then(|l| l.node(id)) else {
            return false;
        };
        if node.synthetic {
            return false;
        }
        let centre = node.center();
        self.viewport.center_on(centre);
        true
    }
}
