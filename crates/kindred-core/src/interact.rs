//! Selection, keyboard navigation and highlight state.
//!
//! Application state is an immutable value updated through [`reduce`]; the
//! [`Controller`] pairs it with a [`Canvas`] and keeps the two in step.

use std::collections::HashSet;

use tracing::debug;

use crate::filter::FilterCriteria;
use crate::layout::{Canvas, LayoutSettings, Orientation, Scene, TreeLayout};
use crate::model::{Graph, MemberId, FOREST_ROOT_ID};
use crate::traverse::{self, find_by_id};

/// Arrow key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Movement in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Parent,
    FirstChild,
    PrevSibling,
    NextSibling,
}

impl Direction {
    /// Generations run along the vertical axis in a vertical layout and along
    /// the horizontal one otherwise; arrows follow them.
    pub fn to_move(self, orientation: Orientation) -> Move {
        match (orientation, self) {
            (Orientation::Vertical, Direction::Up) | (Orientation::Horizontal, Direction::Left) => Move::Parent,
            (Orientation::Vertical, Direction::Down) | (Orientation::Horizontal, Direction::Right) => {
                Move::FirstChild
            }
            (Orientation::Vertical, Direction::Left) | (Orientation::Horizontal, Direction::Up) => {
                Move::PrevSibling
            }
            (Orientation::Vertical, Direction::Right) | (Orientation::Horizontal, Direction::Down) => {
                Move::NextSibling
            }
        }
    }
}

/// Target of `mv` from `current`, or `None` when there is nowhere to go. The
/// forest root is never a target.
pub fn navigate(layout: &TreeLayout, current: &str, mv: Move) -> Option<MemberId> {
    let node = layout.node(current)?;
    let target = match mv {
        Move::Parent => node.parent.clone()?,
        Move::FirstChild => node.children.first()?.clone(),
        Move::PrevSibling | Move::NextSibling => {
            let parent = layout.node(node.parent.as_deref()?)?;
            let pos = parent.children.iter().position(|c| c == current)?;
            let next = if mv == Move::PrevSibling {
                pos.checked_sub(1)?
            } else {
                pos + 1
            };
            parent.children.get(next)?.clone()
        }
    };
    let synthetic = layout.node(&target).map_or(true, |n| n.synthetic);
    (!synthetic).then_some(target)
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub graph: Graph,
    pub selected: Option<MemberId>,
    pub filter: FilterCriteria,
    pub settings: LayoutSettings,
}

impl AppState {
    pub fn new(graph: Graph, settings: LayoutSettings) -> Self {
        Self {
            graph,
            selected: None,
            filter: FilterCriteria::default(),
            settings,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    Select(Option<MemberId>),
    Navigate(Direction),
    SetFilter(FilterCriteria),
    ClearFilter,
    /// A new snapshot, usually the result of a mutation.
    ReplaceGraph(Graph),
    SetSettings(LayoutSettings),
}

fn selectable(graph: &Graph, id: &str) -> bool {
    id != FOREST_ROOT_ID && find_by_id(graph, id).is_some()
}

/// Apply `action` to `state`. Navigation needs the current layout; without
/// one it leaves the selection alone.
pub fn reduce(state: &AppState, action: Action, layout: Option<&TreeLayout>) -> AppState {
    let mut next = state.clone();
    match action {
        Action::Select(id) => {
            next.selected = id.filter(|id| selectable(&state.graph, id));
        }
        Action::Navigate(direction) => {
            let Some(layout) = layout else {
                return next;
            };
            next.selected = match &state.selected {
                Some(current) => {
                    let mv = direction.to_move(state.settings.orientation);
                    navigate(layout, current, mv).or_else(|| state.selected.clone())
                }
                None => layout.visible_nodes().next().map(|n| n.id.clone()),
            };
        }
        Action::SetFilter(criteria) => next.filter = criteria,
        Action::ClearFilter => next.filter = FilterCriteria::default(),
        Action::ReplaceGraph(graph) => {
            if next.selected.as_deref().is_some_and(|id| !selectable(&graph, id)) {
                debug!("selected member no longer exists");
                next.selected = None;
            }
            next.graph = graph;
        }
        Action::SetSettings(settings) => next.settings = settings,
    }
    next
}

/// Members to emphasize: filter matches when a filter is active, otherwise
/// the selected member's lineage, otherwise nothing.
pub fn highlight_set(state: &AppState) -> HashSet<MemberId> {
    if !state.filter.is_empty() {
        return traverse::walk(&state.graph)
            .filter(|m| state.filter.matches(m))
            .map(|m| m.id.clone())
            .collect();
    }
    match &state.selected {
        Some(id) => traverse::lineage(&state.graph, id),
        None => HashSet::new(),
    }
}

/// State plus drawing surface.
#[derive(Debug)]
pub struct Controller {
    state: AppState,
    canvas: Canvas,
}

impl Controller {
    pub fn new(graph: Graph, settings: LayoutSettings, width: f64, height: f64) -> Self {
        let state = AppState::new(graph, settings);
        let mut canvas = Canvas::new(width, height);
        canvas.sync(&state.graph, &state.settings);
        Self { state, canvas }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Apply an action, relayout if needed, and centre on the new selection
    /// after keyboard navigation.
    pub fn dispatch(&mut self, action: Action) {
        let navigating = matches!(action, Action::Navigate(_));
        let before = self.state.selected.clone();
        self.state = reduce(&self.state, action, self.canvas.layout());
        self.canvas.sync(&self.state.graph, &self.state.settings);

        if navigating && self.state.selected != before {
            if let Some(id) = &self.state.selected {
                self.canvas.focus(id);
            }
        }
    }

    pub fn highlight(&self) -> HashSet<MemberId> {
        highlight_set(&self.state)
    }

    pub fn scene(&self) -> Scene {
        self.canvas.scene(&self.highlight(), self.state.selected.as_deref())
    }
}
