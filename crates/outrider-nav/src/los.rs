//! Line-of-sight by sampling points along a segment against wall boxes.

use glam::Vec2;

use crate::geometry::Aabb;

/// Default spacing between samples, in world units.
pub const DEFAULT_STEP: f32 = 10.0;

/// Hard cap on samples per query.
pub const MAX_SAMPLES: usize = 1000;

/// Whether any sample point on `from -> to` lies inside one of `walls`.
///
/// Samples start at `from` and advance by `step`; the far endpoint is always
/// tested too. At most `max_samples` points along the way are tested, so a
/// zero step or a huge segment still terminates, reporting "not blocked" if
/// nothing was hit before the cap.
pub fn segment_blocked(from: Vec2, to: Vec2, walls: &[Aabb], step: f32, max_samples: usize) -> bool {
    if walls.is_empty() {
        return false;
    }

    let length = from.distance(to);
    let dir = (to - from).normalize_or_zero();
    let hit = |p: Vec2| walls.iter().any(|w| w.contains(p));

    for k in 0..max_samples {
        let travelled = k as f32 * step;
        if travelled > length {
            return hit(to);
        }
        if hit(from + dir * travelled) {
            return true;
        }
    }

    false
}

/// [`segment_blocked`] with the default step and cap.
pub fn has_line_of_sight(from: Vec2, to: Vec2, walls: &[Aabb]) -> bool {
    !segment_blocked(from, to, walls, DEFAULT_STEP, MAX_SAMPLES)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall(x: f32, y: f32) -> Aabb {
        Aabb::from_center_scale(Vec2::new(x, y), Vec2::splat(50.0))
    }

    #[test]
    fn no_walls_never_blocks() {
        assert!(has_line_of_sight(Vec2::ZERO, Vec2::new(1000.0, 300.0), &[]));
    }

    #[test]
    fn wall_on_segment_blocks() {
        let from = Vec2::new(0.0, 0.0);
        let to = Vec2::new(400.0, 0.0);
        assert!(has_line_of_sight(from, to, &[wall(200.0, 200.0)]));
        assert!(!has_line_of_sight(
            from,
            to,
            &[wall(200.0, 200.0), wall(200.0, 10.0)]
        ));
    }

    #[test]
    fn wall_beyond_target_does_not_block() {
        let from = Vec2::new(0.0, 0.0);
        let to = Vec2::new(100.0, 0.0);
        assert!(has_line_of_sight(from, to, &[wall(200.0, 0.0)]));
    }

    #[test]
    fn degenerate_segment_terminates() {
        let p = Vec2::new(500.0, 500.0);
        assert!(has_line_of_sight(p, p, &[wall(0.0, 0.0)]));
        assert!(!segment_blocked(
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
            &[wall(80.0, 0.0)],
            0.0,
            MAX_SAMPLES
        ));
    }

    #[test]
    fn cap_limits_reach() {
        // 5 samples at step 10 only cover the first 40 units.
        let walls = [wall(300.0, 0.0)];
        assert!(!segment_blocked(Vec2::ZERO, Vec2::new(1000.0, 0.0), &walls, 10.0, 5));
        assert!(segment_blocked(Vec2::ZERO, Vec2::new(1000.0, 0.0), &walls, 10.0, MAX_SAMPLES));
    }
}
