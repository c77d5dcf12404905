//! Edge geometry: hierarchy links between parent and child boxes, and dashed
//! connection links between any two members.

use serde::Serialize;

use super::{LinkStyle, Orientation, Point};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "op")]
pub enum PathCommand {
    MoveTo { to: Point },
    LineTo { to: Point },
    CubicTo { c1: Point, c2: Point, to: Point },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EdgePath {
    pub commands: Vec<PathCommand>,
}

impl EdgePath {
    /// SVG path data (`d` attribute).
    pub fn to_svg(&self) -> String {
        let mut d = String::new();
        for cmd in &self.commands {
            if !d.is_empty() {
                d.push(' ');
            }
            let part = match cmd {
                PathCommand::MoveTo { to } => format!("M{},{}", to.x, to.y),
                PathCommand::LineTo { to } => format!("L{},{}", to.x, to.y),
                PathCommand::CubicTo { c1, c2, to } => {
                    format!("C{},{} {},{} {},{}", c1.x, c1.y, c2.x, c2.y, to.x, to.y)
                }
            };
            d.push_str(&part);
        }
        d
    }

    pub fn start(&self) -> Option<Point> {
        match self.commands.first()? {
            PathCommand::MoveTo { to } => Some(*to),
            _ => None,
        }
    }

    pub fn end(&self) -> Option<Point> {
        self.commands.last().map(|cmd| match cmd {
            PathCommand::MoveTo { to } | PathCommand::LineTo { to } | PathCommand::CubicTo { to, .. } => *to,
        })
    }
}

/// Link from the bottom (or right) side of a parent box to the top (or left)
/// side of a child box. `from` and `to` are box centres; `half_depth` is half the
/// box extent along the generation axis.
pub fn hierarchy_path(from: Point, to: Point, half_depth: f64, orientation: Orientation, style: LinkStyle) -> EdgePath {
    let (start, end) = match orientation {
        Orientation::Vertical => (Point::new(from.x, from.y + half_depth), Point::new(to.x, to.y - half_depth)),
        Orientation::Horizontal => (Point::new(from.x + half_depth, from.y), Point::new(to.x - half_depth, to.y)),
    };
    let (bend_a, bend_b) = match orientation {
        Orientation::Vertical => {
            let mid = (start.y + end.y) / 2.0;
            (Point::new(start.x, mid), Point::new(end.x, mid))
        }
        Orientation::Horizontal => {
            let mid = (start.x + end.x) / 2.0;
            (Point::new(mid, start.y), Point::new(mid, end.y))
        }
    };
    let commands = match style {
        LinkStyle::Elbow => vec![
            PathCommand::MoveTo { to: start },
            PathCommand::LineTo { to: bend_a },
            PathCommand::LineTo { to: bend_b },
            PathCommand::LineTo { to: end },
        ],
        LinkStyle::Curved => vec![
            PathCommand::MoveTo { to: start },
            PathCommand::CubicTo {
                c1: bend_a,
                c2: bend_b,
                to: end,
            },
        ],
    };
    EdgePath { commands }
}

/// Lane (0, 1 or 2) for a connection, derived from its target id so the same
/// edge always lands in the same lane.
pub fn lane_for(target_id: &str) -> u32 {
    let hash = target_id
        .chars()
        .fold(0i32, |h, c| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(c as i32));
    hash.unsigned_abs() % 3
}

/// Lateral offset of a connection in its lane: -spacing, 0 or +spacing.
pub fn lane_offset(target_id: &str, lane_spacing: f64) -> f64 {
    (lane_for(target_id) as f64 - 1.0) * lane_spacing
}

/// Connection between two box centres, displaced sideways by `offset`. A zero
/// offset gives a straight line; otherwise the line bows out with its lane.
pub fn connection_path(from: Point, to: Point, offset: f64) -> EdgePath {
    if offset == 0.0 {
        return EdgePath {
            commands: vec![PathCommand::MoveTo { to: from }, PathCommand::LineTo { to }],
        };
    }
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let len = (dx * dx + dy * dy).sqrt();
    let (nx, ny) = if len > f64::EPSILON { (-dy / len, dx / len) } else { (0.0, 1.0) };
    let shift = |p: Point, k: f64| Point::new(p.x + nx * offset * k, p.y + ny * offset * k);

    let start = shift(from, 1.0);
    let end = shift(to, 1.0);
    let c1 = shift(Point::new(from.x + dx / 3.0, from.y + dy / 3.0), 2.0);
    let c2 = shift(Point::new(from.x + dx * 2.0 / 3.0, from.y + dy * 2.0 / 3.0), 2.0);
    EdgePath {
        commands: vec![
            PathCommand::MoveTo { to: start },
            PathCommand::CubicTo { c1, c2, to: end },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elbow_vertical_runs_through_midline() {
        let path = hierarchy_path(
            Point::new(0.0, 0.0),
            Point::new(100.0, 200.0),
            20.0,
            Orientation::Vertical,
            LinkStyle::Elbow,
        );
        assert_eq!(path.to_svg(), "M0,20 L0,100 L100,100 L100,180");
    }

    #[test]
    fn curve_horizontal_uses_midline_controls() {
        let path = hierarchy_path(
            Point::new(0.0, 0.0),
            Point::new(200.0, 50.0),
            40.0,
            Orientation::Horizontal,
            LinkStyle::Curved,
        );
        assert_eq!(path.to_svg(), "M40,0 C100,0 100,50 160,50");
        assert_eq!(path.start(), Some(Point::new(40.0, 0.0)));
        assert_eq!(path.end(), Some(Point::new(160.0, 50.0)));
    }

    #[test]
    fn lanes_are_stable_and_bounded() {
        for id in ["m-1", "m-2", "m-3", "m-42", "a very long member identifier", ""] {
            let lane = lane_for(id);
            assert!(lane < 3);
            assert_eq!(lane, lane_for(id));
        }
        assert_eq!(lane_for(""), 0);
        assert_eq!(lane_offset("", 8.0), -8.0);
    }

    #[test]
    fn zero_offset_is_straight() {
        let path = connection_path(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 0.0);
        assert_eq!(path.to_svg(), "M0,0 L10,0");
    }

    #[test]
    fn offset_moves_endpoints_sideways() {
        let path = connection_path(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 5.0);
        assert_eq!(path.start(), Some(Point::new(0.0, 5.0)));
        assert_eq!(path.end(), Some(Point::new(10.0, 5.0)));
    }
}
