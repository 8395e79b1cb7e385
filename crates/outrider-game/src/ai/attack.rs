//! The Attack state: aimed volleys for ranged enemies, windup strikes for melee ones.

use crate::components::EnemyState;

use super::commands::AiCommand;
use super::state_machine::{EnemyParts, TickContext};

/// Shape of a ranged attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volley {
    Single,
    /// Center pellet plus one on each side.
    Shotgun,
}

/// Firing angles for a volley aimed at `aim`.
pub fn volley_angles(aim: f32, volley: Volley, spread: f32) -> Vec<f32> {
    match volley {
        Volley::Single => vec![aim],
        Volley::Shotgun => vec![aim, aim + spread, aim - spread],
    }
}

/// Stand still and fire on the shoot cooldown until the aim window closes,
/// then reload and go back to pursuing.
pub(crate) fn ranged_attack(ctx: &mut TickContext, e: &mut EnemyParts, volley: Volley) {
    if e.reload.is_none() {
        return;
    }
    let origin = e.motion.position;
    e.stop();
    e.face(ctx.player.position);
    let aim = e.motion.angle;

    let Some(reload) = e.reload.as_deref_mut() else {
        return;
    };
    reload.take_aim_ms -= ctx.elapsed_ms;
    reload.shoot_rate_ms -= ctx.elapsed_ms;

    if reload.shoot_rate_ms < 0.0 {
        for angle in volley_angles(aim, volley, ctx.cfg.shotgun_spread) {
            ctx.pending.push(AiCommand::SpawnProjectile {
                origin,
                angle,
                hostile: true,
            });
        }
        reload.shoot_rate_ms = ctx.cfg.shoot_rate_ms;
    }

    if reload.take_aim_ms < 0.0 {
        reload.counter_ms = ctx.cfg.reload_ms;
        reload.take_aim_ms = ctx.cfg.take_aim_ms;
        e.enemy.state = EnemyState::Pursuing;
    }
}

/// Wind up in place, then land one hit on the player.
///
/// The hit lands even if the player stepped out of reach during the windup.
pub(crate) fn melee_attack(ctx: &mut TickContext, e: &mut EnemyParts) {
    if e.melee.is_none() {
        return;
    }
    e.stop();
    e.face(ctx.player.position);

    let Some(melee) = e.melee.as_deref_mut() else {
        return;
    };
    melee.windup_ms -= ctx.elapsed_ms;
    if melee.windup_ms > 0.0 {
        return;
    }

    ctx.pending.push(AiCommand::MeleeHit {
        attacker: e.entity,
        target: ctx.player.entity,
        damage: melee.damage,
    });
    melee.windup_ms = melee.windup_max_ms;
    e.enemy.state = EnemyState::Pursuing;
}
