//! Small 2D geometry helpers shared by the grid, line-of-sight and steering code.

use glam::Vec2;

/// Axis-aligned bounding box in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Box centered on `center` whose full extent is `scale`.
    ///
    /// The sign of `scale` only mirrors sprites, so it is dropped here.
    pub fn from_center_scale(center: Vec2, scale: Vec2) -> Self {
        let half = scale.abs() / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Inclusive point containment.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Unit vector pointing along `angle` (radians).
pub fn direction_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Facing angle from `from` toward `to`, in radians.
pub fn angle_toward(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}
