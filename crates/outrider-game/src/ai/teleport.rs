//! Boss teleports: the Teleporting state, destination sampling and the scale
//! pulse played while the boss is in transit.

use bevy_ecs::prelude::*;
use glam::Vec2;
use outrider_nav::Aabb;
use rand::Rng;
use tracing::{debug, warn};

use crate::components::*;
use crate::game_world::AiEvent;

use super::commands::AiCommand;
use super::state_machine::{EnemyParts, TickContext};

const CURVE_START: Vec2 = Vec2::ONE;
const CURVE_CONTROL: Vec2 = Vec2::NEG_ONE;
const CURVE_END: Vec2 = Vec2::ONE;

/// Scale multiplier along a quadratic Bézier curve, `elapsed_ms` into a pulse
/// lasting `max_ms`. Starts and ends at full size and passes through zero halfway.
pub fn bezier_scale(elapsed_ms: f32, max_ms: f32) -> Vec2 {
    if max_ms <= 0.0 {
        return CURVE_END;
    }
    let t = elapsed_ms / max_ms;
    let not_t = ((max_ms - elapsed_ms) / max_ms).min(1.0);
    CURVE_START * (not_t * not_t) + CURVE_CONTROL * (2.0 * not_t * t) + CURVE_END * (t * t)
}

/// Constraints on where a teleport may land.
#[derive(Debug, Clone, Copy)]
pub struct DestinationRules {
    pub player_clearance: f32,
    pub wall_clearance: f32,
    pub max_attempts: usize,
}

/// Sample a landing spot inside `bounds` that keeps clear of the player and of
/// every wall center.
///
/// Returns the spot and whether it satisfied the rules. If no sample did within
/// `max_attempts`, the sample that came closest is used instead.
pub fn pick_destination<R: Rng + ?Sized>(
    rng: &mut R,
    bounds: Aabb,
    player: Vec2,
    walls: &[Vec2],
    rules: DestinationRules,
) -> (Vec2, bool) {
    let size = bounds.size();
    let mut best: Option<(Vec2, f32)> = None;

    for _ in 0..rules.max_attempts {
        let candidate = bounds.min + Vec2::new(rng.gen::<f32>(), rng.gen::<f32>()) * size;
        let wall_margin = walls
            .iter()
            .map(|w| w.distance(candidate))
            .fold(f32::INFINITY, f32::min)
            - rules.wall_clearance;
        let score = (candidate.distance(player) - rules.player_clearance).min(wall_margin);
        if score > 0.0 {
            return (candidate, true);
        }
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }

    warn!(
        attempts = rules.max_attempts,
        "no teleport destination clear of player and walls"
    );
    (best.map_or_else(|| bounds.center(), |(p, _)| p), false)
}

/// Enter the Teleporting state. The boss keeps its current size as the base of
/// the scale pulse.
pub(crate) fn begin(ctx: &mut TickContext, e: &mut EnemyParts) {
    let scale = e.motion.scale;
    let Some(teleporter) = e.teleporter.as_deref_mut() else {
        return;
    };
    teleporter.prev_scale = scale;
    teleporter.animation_ms = 0.0;
    e.stop();
    e.enemy.state = EnemyState::Teleporting;
    ctx.pending.push(AiCommand::BeginTeleport { entity: e.entity });
}

/// One tick of the Teleporting state. Once the animation has run its course
/// the boss lands somewhere new and attacks, or summons if it can.
pub(crate) fn advance(ctx: &mut TickContext, e: &mut EnemyParts) {
    let summons = match e.enemy.kind {
        EnemyKind::Boss {
            teleports: true,
            summons,
        } => summons,
        EnemyKind::Roamer
        | EnemyKind::Ranged
        | EnemyKind::Melee
        | EnemyKind::Boss {
            teleports: false, ..
        } => {
            e.enemy.state = EnemyState::Pursuing;
            return;
        }
    };

    e.stop();
    let Some(teleporter) = e.teleporter.as_deref_mut() else {
        e.enemy.state = EnemyState::Pursuing;
        return;
    };
    teleporter.animation_ms += ctx.elapsed_ms;
    if teleporter.animation_ms < teleporter.max_teleport_ms {
        return;
    }
    teleporter.animation_ms = 0.0;
    let prev_scale = teleporter.prev_scale;

    let rules = DestinationRules {
        player_clearance: ctx.cfg.teleport_player_clearance,
        wall_clearance: ctx.cfg.teleport_wall_clearance,
        max_attempts: ctx.cfg.teleport_max_attempts,
    };
    let bounds = ctx.room_bounds();
    let (destination, clear) = pick_destination(
        ctx.rng,
        bounds,
        ctx.player.position,
        ctx.wall_centers,
        rules,
    );

    e.motion.position = destination;
    e.motion.scale = prev_scale;
    if let Some(pathfinder) = e.pathfinder.as_deref_mut() {
        pathfinder.0.invalidate();
    }
    ctx.pending.push(AiCommand::FinishTeleport { entity: e.entity });
    ctx.events.push(AiEvent::Teleported {
        entity: e.entity,
        to: destination,
    });
    debug!(entity = ?e.entity, ?destination, clear, "boss teleported");

    match e.necromancer.as_deref_mut() {
        Some(necromancer) if summons => {
            necromancer.center_position = destination;
            e.enemy.state = EnemyState::SpawnMinions;
        }
        _ => {
            e.enemy.state = EnemyState::Attack;
            e.enemy.attack = Some(AttackMode::Ranged);
        }
    }
}

/// Play the scale pulse on every enemy with a [`Teleporting`] marker.
pub fn system_teleport_animation(world: &mut World, elapsed_ms: f32) {
    let mut q = world.query::<(&mut Motion, &Teleporter, &mut Teleporting)>();
    for (mut motion, teleporter, mut pulse) in q.iter_mut(world) {
        pulse.elapsed_ms += elapsed_ms;
        if pulse.max_time_ms > 0.0 && pulse.elapsed_ms >= pulse.max_time_ms {
            pulse.elapsed_ms -= pulse.max_time_ms;
        }
        motion.scale = teleporter.prev_scale * bezier_scale(pulse.elapsed_ms, pulse.max_time_ms);
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn rules() -> DestinationRules {
        DestinationRules {
            player_clearance: 100.0,
            wall_clearance: 50.0,
            max_attempts: 256,
        }
    }

    #[test]
    fn bezier_pulse_shape() {
        assert_eq!(bezier_scale(0.0, 1000.0), Vec2::ONE);
        assert!((bezier_scale(1000.0, 1000.0) - Vec2::ONE).length() < 1e-6);
        assert!(bezier_scale(500.0, 1000.0).length() < 1e-6);
        let quarter = bezier_scale(250.0, 1000.0);
        assert!((quarter.x - 0.25).abs() < 1e-6);
    }

    #[test]
    fn destination_keeps_clear_of_player_and_walls() {
        let mut rng = StdRng::seed_from_u64(11);
        let bounds = Aabb {
            min: Vec2::ZERO,
            max: Vec2::splat(1000.0),
        };
        let player = Vec2::splat(500.0);
        let walls = [Vec2::new(200.0, 200.0), Vec2::new(800.0, 300.0)];
        for _ in 0..100 {
            let (p, clear) = pick_destination(&mut rng, bounds, player, &walls, rules());
            assert!(clear);
            assert!(bounds.contains(p));
            assert!(p.distance(player) > 100.0);
            assert!(walls.iter().all(|w| w.distance(p) > 50.0));
        }
    }

    #[test]
    fn destination_search_is_capped() {
        let mut rng = StdRng::seed_from_u64(5);
        // The whole box sits within the player's clearance.
        let bounds = Aabb::from_center_scale(Vec2::ZERO, Vec2::splat(20.0));
        let (p, clear) = pick_destination(&mut rng, bounds, Vec2::ZERO, &[], rules());
        assert!(!clear);
        assert!(bounds.contains(p));
    }

    #[test]
    fn pulse_wraps_and_scales_from_base() {
        let mut world = World::new();
        let e = world
            .spawn((
                Motion::new(Vec2::ZERO, Vec2::splat(74.0)),
                Teleporter {
                    animation_ms: 0.0,
                    max_teleport_ms: 1000.0,
                    prev_scale: Vec2::splat(74.0),
                },
                Teleporting {
                    elapsed_ms: 0.0,
                    max_time_ms: 1000.0,
                },
            ))
            .id();
        system_teleport_animation(&mut world, 500.0);
        assert!(world.get::<Motion>(e).unwrap().scale.length() < 1e-3);
        system_teleport_animation(&mut world, 750.0);
        let pulse = world.get::<Teleporting>(e).unwrap();
        assert!((pulse.elapsed_ms - 250.0).abs() < 1e-3);
        let scale = world.get::<Motion>(e).unwrap().scale;
        assert!((scale.x - 74.0 * 0.25).abs() < 1e-3);
    }
}
