//! How enemies move: grid paths when they have one, context steering otherwise.

use glam::Vec2;
use outrider_nav::Steering;
use rand::Rng;

use crate::components::Motion;

use super::state_machine::{EnemyParts, TickContext};

pub(crate) fn apply(motion: &mut Motion, steering: Steering) {
    motion.velocity = steering.velocity;
    motion.angle = steering.angle;
}

/// Follow the cached grid path toward the player, or context-steer when the
/// enemy has no path follower or no room is loaded.
pub(crate) fn chase(ctx: &mut TickContext, e: &mut EnemyParts) -> Steering {
    match (e.pathfinder.as_deref_mut(), ctx.nav.grid.as_ref()) {
        (Some(pathfinder), Some(grid)) => pathfinder.0.tick(
            &mut ctx.nav.planner,
            grid,
            e.motion.position,
            ctx.player.position,
            e.speed,
            ctx.elapsed_ms,
        ),
        _ => context_chase(ctx, e),
    }
}

/// Steer straight for the player, pushed off the nearest wall and crowding enemies.
pub(crate) fn context_chase(ctx: &TickContext, e: &EnemyParts) -> Steering {
    let peers: Vec<Vec2> = ctx
        .enemies
        .iter()
        .filter(|(entity, _)| *entity != e.entity)
        .map(|(_, p)| *p)
        .collect();
    ctx.cfg.context_steering().steer(
        e.motion.position,
        ctx.player.position,
        ctx.wall_centers,
        &peers,
        e.speed,
    )
}

/// Random wander velocity with each component in `[-jitter / 2, jitter / 2)`.
pub fn roam_velocity<R: Rng + ?Sized>(rng: &mut R, jitter: f32) -> Vec2 {
    Vec2::new(
        (rng.gen::<f32>() - 0.5) * jitter,
        (rng.gen::<f32>() - 0.5) * jitter,
    )
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn roam_velocity_stays_within_jitter() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let v = roam_velocity(&mut rng, 10.0);
            assert!(v.x >= -5.0 && v.x < 5.0);
            assert!(v.y >= -5.0 && v.y < 5.0);
        }
    }

    #[test]
    fn roam_velocity_is_seeded() {
        let a = roam_velocity(&mut StdRng::seed_from_u64(9), 10.0);
        let b = roam_velocity(&mut StdRng::seed_from_u64(9), 10.0);
        assert_eq!(a, b);
    }
}
