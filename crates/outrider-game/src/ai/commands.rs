//! Pending actions: side effects requested during the AI decision pass and
//! applied afterwards, once no query over the enemies is alive.

use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::Rng;
use tracing::{debug, info};

use crate::components::*;
use crate::config::AiConfig;
use crate::game_world::{power_up_active, AiEvent, AiEvents, SimRng};

use super::factory::EntityFactory;

/// One deferred side effect.
#[derive(Debug, Clone, PartialEq)]
pub enum AiCommand {
    SpawnProjectile {
        origin: Vec2,
        angle: f32,
        hostile: bool,
    },
    MeleeHit {
        attacker: Entity,
        target: Entity,
        damage: f32,
    },
    /// Start the scale pulse on a teleporting enemy.
    BeginTeleport { entity: Entity },
    /// Stop the scale pulse once the enemy has landed.
    FinishTeleport { entity: Entity },
    SummonMinions { necromancer: Entity, center: Vec2 },
}

/// Queue filled by the state machine and drained by [`flush_pending_actions`].
#[derive(Resource, Debug, Default)]
pub struct PendingActions {
    commands: Vec<AiCommand>,
}

impl PendingActions {
    pub fn push(&mut self, command: AiCommand) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[AiCommand] {
        &self.commands
    }

    fn take(&mut self) -> Vec<AiCommand> {
        std::mem::take(&mut self.commands)
    }
}

/// Apply every queued command in the order it was issued.
pub fn flush_pending_actions(world: &mut World, factory: &dyn EntityFactory) {
    let commands = match world.get_resource_mut::<PendingActions>() {
        Some(mut pending) => pending.take(),
        None => return,
    };
    if commands.is_empty() {
        return;
    }

    let cfg = world.get_resource::<AiConfig>().cloned().unwrap_or_default();
    let mut events = Vec::new();

    for command in commands {
        match command {
            AiCommand::SpawnProjectile {
                origin,
                angle,
                hostile,
            } => {
                factory.create_projectile(world, origin, angle, hostile);
                events.push(AiEvent::ProjectileFired { origin, angle });
            }
            AiCommand::MeleeHit {
                attacker,
                target,
                damage,
            } => {
                if let Some(dealt) = apply_melee_hit(world, factory, target, damage) {
                    events.push(AiEvent::MeleeHit {
                        attacker,
                        target,
                        damage: dealt,
                    });
                }
            }
            AiCommand::BeginTeleport { entity } => {
                let Some(max_time_ms) = world.get::<Teleporter>(entity).map(|t| t.max_teleport_ms)
                else {
                    continue;
                };
                world.entity_mut(entity).insert(Teleporting {
                    elapsed_ms: 0.0,
                    max_time_ms,
                });
            }
            AiCommand::FinishTeleport { entity } => {
                if world.get::<Teleporting>(entity).is_some() {
                    world.entity_mut(entity).remove::<Teleporting>();
                }
            }
            AiCommand::SummonMinions {
                necromancer,
                center,
            } => {
                summon_minions(world, factory, &cfg, necromancer, center, &mut events);
            }
        }
    }

    world
        .get_resource_or_insert_with(AiEvents::default)
        .events
        .extend(events);
}

/// Damage the target unless the player is invincible. Returns damage dealt.
fn apply_melee_hit(
    world: &mut World,
    factory: &dyn EntityFactory,
    target: Entity,
    damage: f32,
) -> Option<f32> {
    if power_up_active(world, PowerUpKind::Invincibility) {
        debug!(?target, "melee hit absorbed by invincibility");
        return None;
    }
    let position = world.get::<Motion>(target).map(|m| m.position)?;
    let dealt = world.get_mut::<Health>(target)?.apply_damage(damage);
    if dealt > 0.0 {
        factory.create_damage_text(world, position, dealt);
    }
    Some(dealt)
}

/// Up to four spots around `center`, skipping any within `clearance` of a wall center.
pub fn minion_spots(center: Vec2, offset: f32, walls: &[Vec2], clearance: f32) -> Vec<Vec2> {
    [
        Vec2::new(0.0, -offset),
        Vec2::new(0.0, offset),
        Vec2::new(-offset, 0.0),
        Vec2::new(offset, 0.0),
    ]
    .into_iter()
    .map(|d| center + d)
    .filter(|spot| walls.iter().all(|w| w.distance(*spot) >= clearance))
    .collect()
}

fn summon_minions(
    world: &mut World,
    factory: &dyn EntityFactory,
    cfg: &AiConfig,
    necromancer: Entity,
    center: Vec2,
    events: &mut Vec<AiEvent>,
) {
    let walls: Vec<Vec2> = world
        .query_filtered::<&Motion, With<Wall>>()
        .iter(world)
        .map(|m| m.position)
        .collect();

    let spots = minion_spots(center, cfg.minion_offset, &walls, cfg.minion_wall_clearance);
    for spot in &spots {
        let melee = world
            .get_resource_mut::<SimRng>()
            .map(|mut rng| rng.0.gen::<f32>() < 0.5)
            .unwrap_or(true);
        let minion = if melee {
            factory.create_melee_minion(world, *spot)
        } else {
            factory.create_ranged_minion(world, *spot)
        };
        events.push(AiEvent::MinionSummoned {
            necromancer,
            minion,
            position: *spot,
        });
    }
    info!(?necromancer, count = spots.len(), "minions summoned");

    if let Some(mut n) = world.get_mut::<Necromancer>(necromancer) {
        n.spawning_minions = false;
    }
}
