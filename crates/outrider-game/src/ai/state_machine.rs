//! Enemy state machine: one decision pass over every enemy per tick.
//!
//! The pass snapshots the player and walls, then walks the enemies and mutates
//! their timers, velocity and state in place. Anything that creates, removes or
//! damages other entities goes into [`PendingActions`] instead.

use bevy_ecs::prelude::*;
use glam::Vec2;
use outrider_nav::{los, Aabb};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use crate::components::*;
use crate::config::AiConfig;
use crate::game_world::{AiEvent, AiEvents, Navigation, SimRng};

use super::attack::{self, Volley};
use super::commands::{AiCommand, PendingActions};
use super::movement;
use super::teleport;

#[derive(Debug, Clone, Copy)]
pub(crate) struct PlayerSnapshot {
    pub entity: Entity,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct WallSnapshot {
    pub center: Vec2,
    pub bounds: Aabb,
}

/// Everything an enemy may read or append to while deciding.
pub(crate) struct TickContext<'a> {
    pub cfg: &'a AiConfig,
    pub elapsed_ms: f32,
    pub player: PlayerSnapshot,
    pub walls: &'a [WallSnapshot],
    pub wall_centers: &'a [Vec2],
    /// Boxes tested for line of sight.
    pub sight_blockers: &'a [Aabb],
    pub enemies: &'a [(Entity, Vec2)],
    pub nav: &'a mut Navigation,
    pub rng: &'a mut StdRng,
    pub pending: &'a mut PendingActions,
    pub events: &'a mut Vec<AiEvent>,
}

impl TickContext<'_> {
    pub fn distance_to_player(&self, from: Vec2) -> f32 {
        from.distance(self.player.position)
    }

    pub fn can_see_player(&self, from: Vec2) -> bool {
        !los::segment_blocked(
            from,
            self.player.position,
            self.sight_blockers,
            self.cfg.los_step,
            self.cfg.los_max_samples,
        )
    }

    /// Center of and distance to the closest wall.
    pub fn nearest_wall(&self, from: Vec2) -> Option<(Vec2, f32)> {
        self.walls
            .iter()
            .map(|w| (w.center, from.distance(w.center)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Area teleport destinations are drawn from.
    pub fn room_bounds(&self) -> Aabb {
        match &self.nav.grid {
            Some(grid) => Aabb {
                min: Vec2::ZERO,
                max: grid.dimensions(),
            },
            None => Aabb::from_center_scale(
                self.player.position,
                Vec2::splat(self.cfg.aggro_distance * 2.0),
            ),
        }
    }
}

/// The components of one enemy, borrowed for the duration of its step.
pub(crate) struct EnemyParts<'a> {
    pub entity: Entity,
    pub enemy: &'a mut Enemy,
    pub motion: &'a mut Motion,
    pub speed: f32,
    pub reload: Option<&'a mut ReloadTime>,
    pub melee: Option<&'a mut MeleeAttack>,
    pub teleporter: Option<&'a mut Teleporter>,
    pub necromancer: Option<&'a mut Necromancer>,
    pub pathfinder: Option<&'a mut Pathfinder>,
}

impl EnemyParts<'_> {
    pub fn stop(&mut self) {
        self.motion.velocity = Vec2::ZERO;
    }

    pub fn face(&mut self, target: Vec2) {
        self.motion.angle = outrider_nav::geometry::angle_toward(self.motion.position, target);
    }
}

/// Run the decision pass for every enemy. Does nothing without a player.
pub fn system_enemy_ai(world: &mut World, elapsed_ms: f32) {
    let player = {
        let mut q = world.query_filtered::<(Entity, &Motion), With<Player>>();
        q.iter(world).next().map(|(entity, m)| PlayerSnapshot {
            entity,
            position: m.position,
        })
    };
    let Some(player) = player else {
        return;
    };

    let (walls, exposed): (Vec<WallSnapshot>, Vec<bool>) = {
        let mut q = world.query_filtered::<(&Motion, Has<ExposedWall>), With<Wall>>();
        q.iter(world)
            .map(|(m, exposed)| {
                (
                    WallSnapshot {
                        center: m.position,
                        bounds: m.bounding_box(),
                    },
                    exposed,
                )
            })
            .unzip()
    };
    let wall_centers: Vec<Vec2> = walls.iter().map(|w| w.center).collect();
    // Buried walls cannot block a segment without an exposed wall blocking it first.
    let sight_blockers: Vec<Aabb> = if exposed.iter().any(|&e| e) {
        walls
            .iter()
            .zip(&exposed)
            .filter(|(_, e)| **e)
            .map(|(w, _)| w.bounds)
            .collect()
    } else {
        walls.iter().map(|w| w.bounds).collect()
    };

    let enemies: Vec<(Entity, Vec2)> = {
        let mut q = world.query_filtered::<(Entity, &Motion), With<Enemy>>();
        q.iter(world).map(|(e, m)| (e, m.position)).collect()
    };
    if enemies.is_empty() {
        return;
    }

    let cfg = world.get_resource::<AiConfig>().cloned().unwrap_or_default();
    let mut nav = world.remove_resource::<Navigation>().unwrap_or_default();
    let mut rng = world
        .remove_resource::<SimRng>()
        .unwrap_or_else(SimRng::from_entropy);
    let mut pending = world.remove_resource::<PendingActions>().unwrap_or_default();
    let mut events = Vec::new();

    {
        let mut ctx = TickContext {
            cfg: &cfg,
            elapsed_ms,
            player,
            walls: &walls,
            wall_centers: &wall_centers,
            sight_blockers: &sight_blockers,
            enemies: &enemies,
            nav: &mut nav,
            rng: &mut rng.0,
            pending: &mut pending,
            events: &mut events,
        };

        let mut q = world.query::<(
            Entity,
            &mut Enemy,
            &mut Motion,
            &MovementSpeed,
            Option<&mut ReloadTime>,
            Option<&mut MeleeAttack>,
            Option<&mut Teleporter>,
            Option<&mut Necromancer>,
            Option<&mut Pathfinder>,
        )>();
        for (
            entity,
            mut enemy,
            mut motion,
            speed,
            mut reload,
            mut melee,
            mut teleporter,
            mut necromancer,
            mut pathfinder,
        ) in q.iter_mut(world)
        {
            let mut parts = EnemyParts {
                entity,
                enemy: &mut *enemy,
                motion: &mut *motion,
                speed: speed.0,
                reload: reload.as_deref_mut(),
                melee: melee.as_deref_mut(),
                teleporter: teleporter.as_deref_mut(),
                necromancer: necromancer.as_deref_mut(),
                pathfinder: pathfinder.as_deref_mut(),
            };
            step_enemy(&mut ctx, &mut parts);
        }
    }

    world.insert_resource(nav);
    world.insert_resource(rng);
    world.insert_resource(pending);
    world
        .get_resource_or_insert_with(AiEvents::default)
        .events
        .extend(events);
}

pub(crate) fn step_enemy(ctx: &mut TickContext, e: &mut EnemyParts) {
    let before = e.enemy.state;

    match before {
        EnemyState::Roaming => roam(ctx, e),
        EnemyState::Pursuing => pursue(ctx, e),
        EnemyState::Attack => attack_player(ctx, e),
        EnemyState::AvoidWall => avoid_wall(ctx, e),
        EnemyState::Teleporting => teleport::advance(ctx, e),
        EnemyState::SpawnMinions => spawn_minions(ctx, e),
    }

    let after = e.enemy.state;
    if after != EnemyState::Attack {
        e.enemy.attack = None;
    }
    if after != before {
        debug!(entity = ?e.entity, ?before, ?after, "enemy state changed");
        ctx.events.push(AiEvent::StateChanged {
            entity: e.entity,
            from: before,
            to: after,
        });
    }
}

fn roam(ctx: &mut TickContext, e: &mut EnemyParts) {
    e.motion.velocity = movement::roam_velocity(ctx.rng, ctx.cfg.roam_jitter);
    if ctx.distance_to_player(e.motion.position) < ctx.cfg.aggro_distance {
        e.enemy.state = EnemyState::Pursuing;
    }
}

fn pursue(ctx: &mut TickContext, e: &mut EnemyParts) {
    let position = e.motion.position;
    let in_melee_range = ctx.distance_to_player(position) < ctx.cfg.melee_distance;

    match e.enemy.kind {
        EnemyKind::Roamer => {
            let steering = movement::context_chase(ctx, e);
            movement::apply(e.motion, steering);
            if let Some((_, d)) = ctx.nearest_wall(position) {
                if d < ctx.cfg.wall_avoid_trigger {
                    e.enemy.state = EnemyState::AvoidWall;
                }
            }
        }
        EnemyKind::Melee => {
            if e.melee.is_none() {
                return;
            }
            if in_melee_range {
                e.face(ctx.player.position);
                enter_attack(e, AttackMode::Melee);
            } else {
                let steering = movement::chase(ctx, e);
                movement::apply(e.motion, steering);
            }
        }
        EnemyKind::Ranged => {
            let Some(lapsed) = tick_reload(ctx, e) else {
                return;
            };
            if lapsed && ctx.can_see_player(position) {
                enter_attack(e, AttackMode::Ranged);
            } else {
                let steering = movement::chase(ctx, e);
                movement::apply(e.motion, steering);
            }
        }
        EnemyKind::Boss { teleports, .. } => {
            let Some(lapsed) = tick_reload(ctx, e) else {
                return;
            };
            if in_melee_range && e.melee.is_some() {
                enter_attack(e, AttackMode::Melee);
            } else if !lapsed {
                let steering = movement::chase(ctx, e);
                movement::apply(e.motion, steering);
            } else if teleports
                && e.teleporter.is_some()
                && ctx.rng.gen::<f32>() < ctx.cfg.teleport_chance
            {
                teleport::begin(ctx, e);
            } else if ctx.can_see_player(position) {
                enter_attack(e, AttackMode::Ranged);
            } else {
                let steering = movement::chase(ctx, e);
                movement::apply(e.motion, steering);
            }
        }
    }
}

/// Stop and commit to one kind of attack for the whole Attack state.
fn enter_attack(e: &mut EnemyParts, mode: AttackMode) {
    e.stop();
    e.enemy.state = EnemyState::Attack;
    e.enemy.attack = Some(mode);
}

/// Count the reload timer down. `None` when the enemy has no timer.
fn tick_reload(ctx: &TickContext, e: &mut EnemyParts) -> Option<bool> {
    let reload = e.reload.as_deref_mut()?;
    reload.counter_ms -= ctx.elapsed_ms;
    Some(reload.counter_ms <= 0.0)
}

fn attack_player(ctx: &mut TickContext, e: &mut EnemyParts) {
    match e.enemy.kind {
        // Roamers hurt by contact only.
        EnemyKind::Roamer => e.enemy.state = EnemyState::Pursuing,
        EnemyKind::Ranged => attack::ranged_attack(ctx, e, Volley::Single),
        EnemyKind::Melee => attack::melee_attack(ctx, e),
        EnemyKind::Boss { .. } => {
            let mode = match e.enemy.attack {
                Some(mode) => mode,
                None => {
                    // Entered Attack from outside the pursuit logic; pick once.
                    let close =
                        ctx.distance_to_player(e.motion.position) < ctx.cfg.melee_distance;
                    let mode = if close && e.melee.is_some() {
                        AttackMode::Melee
                    } else {
                        AttackMode::Ranged
                    };
                    e.enemy.attack = Some(mode);
                    mode
                }
            };
            match mode {
                AttackMode::Melee => attack::melee_attack(ctx, e),
                AttackMode::Ranged => attack::ranged_attack(ctx, e, Volley::Shotgun),
            }
        }
    }
}

fn avoid_wall(ctx: &mut TickContext, e: &mut EnemyParts) {
    let Some((wall, distance)) = ctx.nearest_wall(e.motion.position) else {
        e.enemy.state = EnemyState::Pursuing;
        return;
    };
    if distance > ctx.cfg.wall_avoid_release {
        e.enemy.state = EnemyState::Pursuing;
        return;
    }
    e.motion.velocity = (e.motion.position - wall).normalize_or_zero() * e.speed;
    e.face(ctx.player.position);
}

fn spawn_minions(ctx: &mut TickContext, e: &mut EnemyParts) {
    match e.enemy.kind {
        EnemyKind::Boss { summons: true, .. } => {
            let Some(necromancer) = e.necromancer.as_deref_mut() else {
                return;
            };
            necromancer.spawning_minions = true;
            let center = necromancer.center_position;
            if let Some(reload) = e.reload.as_deref_mut() {
                reload.counter_ms = ctx.cfg.reload_ms;
            }
            ctx.pending.push(AiCommand::SummonMinions {
                necromancer: e.entity,
                center,
            });
            e.enemy.state = EnemyState::Pursuing;
        }
        EnemyKind::Roamer
        | EnemyKind::Ranged
        | EnemyKind::Melee
        | EnemyKind::Boss { summons: false, .. } => e.enemy.state = EnemyState::Pursuing,
    }
}
