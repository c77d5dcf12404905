//! Pan/zoom transform over the laid-out tree.
//!
//! The viewport only maps world coordinates to the screen. Nothing here feeds
//! back into layout: panning, zooming and animating leave the tree geometry
//! alone.

use serde::Serialize;

use super::{Bounds, Point};

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 10.0;

/// Duration of the centre-on animation, in seconds.
pub const FOCUS_DURATION: f64 = 0.5;

/// screen = world * k + (x, y)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, k: 1.0 }
    }
}

impl Transform {
    fn lerp(&self, to: &Transform, t: f64) -> Transform {
        Transform {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
            k: self.k + (to.k - self.k) * t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Idle,
    Panning { start: Point, origin: Transform },
    Animating { from: Transform, to: Transform, elapsed: f64 },
}

#[derive(Debug, Clone)]
pub struct Viewport {
    transform: Transform,
    gesture: Gesture,
    width: f64,
    height: f64,
}

fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            transform: Transform {
                x: width / 2.0,
                y: height / 2.0,
                k: 1.0,
            },
            gesture: Gesture::Idle,
            width,
            height,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn screen_to_world(&self, sx: f64, sy: f64) -> Point {
        Point::new(
            (sx - self.transform.x) / self.transform.k,
            (sy - self.transform.y) / self.transform.k,
        )
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        Point::new(
            p.x * self.transform.k + self.transform.x,
            p.y * self.transform.k + self.transform.y,
        )
    }

    /// SVG `transform` attribute for the group holding the scene.
    pub fn svg_transform(&self) -> String {
        let t = self.transform;
        format!("translate({},{}) scale({})", t.x, t.y, t.k)
    }

    pub fn begin_pan(&mut self, sx: f64, sy: f64) {
        self.gesture = Gesture::Panning {
            start: Point::new(sx, sy),
            origin: self.transform,
        };
    }

    pub fn pan_to(&mut self, sx: f64, sy: f64) {
        if let Gesture::Panning { start, origin } = self.gesture {
            self.transform.x = origin.x + (sx - start.x);
            self.transform.y = origin.y + (sy - start.y);
        }
    }

    pub fn end_pan(&mut self) {
        if matches!(self.gesture, Gesture::Panning { .. }) {
            self.gesture = Gesture::Idle;
        }
    }

    /// Wheel zoom anchored at the pointer: the world point under (sx, sy)
    /// stays put.
    pub fn zoom_at(&mut self, sx: f64, sy: f64, delta_y: f64) {
        let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
        self.zoom_to(sx, sy, self.transform.k * factor);
    }

    pub fn zoom_to(&mut self, sx: f64, sy: f64, k: f64) {
        if matches!(self.gesture, Gesture::Animating { .. }) {
            self.gesture = Gesture::Idle;
        }
        let new_k = k.clamp(MIN_SCALE, MAX_SCALE);
        let ratio = new_k / self.transform.k;
        self.transform.x = sx - (sx - self.transform.x) * ratio;
        self.transform.y = sy - (sy - self.transform.y) * ratio;
        self.transform.k = new_k;
    }

    /// Transform that puts `world` at the centre of the screen at the current scale.
    pub fn centered_on(&self, world: Point) -> Transform {
        Transform {
            x: self.width / 2.0 - world.x * self.transform.k,
            y: self.height / 2.0 - world.y * self.transform.k,
            k: self.transform.k,
        }
    }

    /// Start animating towards `world` at the centre of the screen.
    pub fn center_on(&mut self, world: Point) {
        let to = self.centered_on(world);
        self.gesture = Gesture::Animating {
            from: self.transform,
            to,
            elapsed: 0.0,
        };
    }

    /// Frame `bounds` with `padding` screen pixels on every side.
    pub fn fit(&mut self, bounds: &Bounds, padding: f64) {
        let avail_w = (self.width - 2.0 * padding).max(1.0);
        let avail_h = (self.height - 2.0 * padding).max(1.0);
        let k = if bounds.width() > 0.0 && bounds.height() > 0.0 {
            (avail_w / bounds.width()).min(avail_h / bounds.height())
        } else {
            1.0
        }
        .clamp(MIN_SCALE, MAX_SCALE);
        let centre = bounds.center();
        self.gesture = Gesture::Idle;
        self.transform = Transform {
            x: self.width / 2.0 - centre.x * k,
            y: self.height / 2.0 - centre.y * k,
            k,
        };
    }

    /// Advance an animation by `dt` seconds. Returns true while still animating.
    pub fn tick(&mut self, dt: f64) -> bool {
        let Gesture::Animating { from, to, elapsed } = self.gesture else {
            return false;
        };
        let elapsed = elapsed + dt;
        if elapsed >= FOCUS_DURATION {
            self.transform = to;
            self.gesture = Gesture::Idle;
            return false;
        }
        self.transform = from.lerp(&to, ease_in_out_cubic(elapsed / FOCUS_DURATION));
        self.gesture = Gesture::Animating { from, to, elapsed };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn pan_follows_pointer_and_returns_to_idle() {
        let mut vp = Viewport::new(800.0, 600.0);
        vp.begin_pan(10.0, 10.0);
        vp.pan_to(40.0, -10.0);
        assert_eq!(vp.transform(), Transform { x: 430.0, y: 280.0, k: 1.0 });
        vp.end_pan();
        assert!(vp.is_idle());
        // moves outside a pan are ignored
        vp.pan_to(0.0, 0.0);
        assert_eq!(vp.transform().x, 430.0);
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut vp = Viewport::new(800.0, 600.0);
        let anchor = vp.screen_to_world(100.0, 50.0);
        vp.zoom_at(100.0, 50.0, -1.0);
        let after = vp.world_to_screen(anchor);
        assert!(close(after.x, 100.0) && close(after.y, 50.0));
        assert!(close(vp.transform().k, 1.1));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = Viewport::new(800.0, 600.0);
        vp.zoom_to(0.0, 0.0, 1000.0);
        assert_eq!(vp.transform().k, MAX_SCALE);
        vp.zoom_to(0.0, 0.0, 0.0);
        assert_eq!(vp.transform().k, MIN_SCALE);
    }

    #[test]
    fn center_on_animates_to_target() {
        let mut vp = Viewport::new(800.0, 600.0);
        vp.center_on(Point::new(100.0, 100.0));
        assert!(vp.tick(0.1));
        assert!(!vp.is_idle());
        assert!(!vp.tick(1.0));
        assert!(vp.is_idle());
        let centre = vp.world_to_screen(Point::new(100.0, 100.0));
        assert!(close(centre.x, 400.0) && close(centre.y, 300.0));
    }

    #[test]
    fn fit_frames_bounds() {
        let mut vp = Viewport::new(400.0, 400.0);
        vp.fit(
            &Bounds {
                min: Point::new(0.0, 0.0),
                max: Point::new(200.0, 100.0),
            },
            0.0,
        );
        assert!(close(vp.transform().k, 2.0));
        let c = vp.world_to_screen(Point::new(100.0, 50.0));
        assert!(close(c.x, 200.0) && close(c.y, 200.0));
    }
}
