//! ECS components for the player, enemies, walls and transient effects.

use bevy_ecs::prelude::*;
use glam::Vec2;
use outrider_nav::{Aabb, PathFollower};

use crate::config::AiConfig;

/// Position, facing and velocity of anything that occupies space.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub position: Vec2,
    /// Facing angle in radians.
    pub angle: f32,
    pub velocity: Vec2,
    /// Full extent. A negative component only mirrors the sprite.
    pub scale: Vec2,
    /// Displacement applied by the last physics step.
    pub last_displacement: Vec2,
    /// Last nonzero movement direction.
    pub last_direction: Vec2,
}

impl Motion {
    pub fn new(position: Vec2, scale: Vec2) -> Self {
        Self {
            position,
            angle: 0.0,
            velocity: Vec2::ZERO,
            scale,
            last_displacement: Vec2::ZERO,
            last_direction: Vec2::X,
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_center_scale(self.position, self.scale)
    }

    /// Move by `velocity * seconds` and record the step.
    pub fn integrate(&mut self, seconds: f32) {
        let step = self.velocity * seconds;
        self.position += step;
        self.last_displacement = step;
        if step != Vec2::ZERO {
            self.last_direction = step.normalize_or_zero();
        }
    }
}

/// Behavior state of one enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnemyState {
    Roaming,
    #[default]
    Pursuing,
    Attack,
    AvoidWall,
    Teleporting,
    SpawnMinions,
}

/// What an enemy is, which decides how every state plays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyKind {
    /// Chases by context steering, sidesteps walls, never attacks on its own.
    Roamer,
    /// Paths toward the player and fires single shots.
    Ranged,
    /// Closes in and strikes after a windup.
    Melee,
    /// Shotgun plus melee; optionally teleports and summons minions.
    Boss { teleports: bool, summons: bool },
}

/// How the current Attack state plays out, fixed when the state is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackMode {
    Melee,
    Ranged,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Enemy {
    pub state: EnemyState,
    pub kind: EnemyKind,
    /// Set while in [`EnemyState::Attack`], cleared when the enemy leaves it.
    pub attack: Option<AttackMode>,
}

impl Enemy {
    pub fn new(kind: EnemyKind) -> Self {
        Self {
            state: EnemyState::default(),
            kind,
            attack: None,
        }
    }
}

/// Ranged timers, all in milliseconds and counting down.
#[derive(Component, Debug, Clone, Copy)]
pub struct ReloadTime {
    /// Time left in pursuit before the next attack.
    pub counter_ms: f32,
    /// Time left in the current attack stance.
    pub take_aim_ms: f32,
    /// Cooldown until the next shot.
    pub shoot_rate_ms: f32,
}

impl ReloadTime {
    pub fn from_config(cfg: &AiConfig) -> Self {
        Self {
            counter_ms: cfg.reload_ms,
            take_aim_ms: cfg.take_aim_ms,
            shoot_rate_ms: cfg.shoot_rate_ms,
        }
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct MeleeAttack {
    pub damage: f32,
    pub windup_ms: f32,
    pub windup_max_ms: f32,
}

impl MeleeAttack {
    pub fn from_config(cfg: &AiConfig) -> Self {
        Self {
            damage: cfg.melee_damage,
            windup_ms: cfg.melee_windup_ms,
            windup_max_ms: cfg.melee_windup_ms,
        }
    }
}

/// Teleport capability.
#[derive(Component, Debug, Clone, Copy)]
pub struct Teleporter {
    /// Time spent in the current teleport.
    pub animation_ms: f32,
    pub max_teleport_ms: f32,
    /// Scale captured when the teleport started, restored when it ends.
    pub prev_scale: Vec2,
}

/// Present only while the teleport scale pulse is playing.
#[derive(Component, Debug, Clone, Copy)]
pub struct Teleporting {
    pub elapsed_ms: f32,
    pub max_time_ms: f32,
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Necromancer {
    pub spawning_minions: bool,
    /// Where the last teleport landed; minions appear around it.
    pub center_position: Vec2,
}

/// Cached grid path for enemies that navigate.
#[derive(Component, Debug, Clone, Default)]
pub struct Pathfinder(pub PathFollower);

/// Movement speed in world units per second.
#[derive(Component, Debug, Clone, Copy)]
pub struct MovementSpeed(pub f32);

/// Health points.
#[derive(Component, Debug, Clone, Copy)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Subtract `amount`, never dropping below zero. Returns the damage actually taken.
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        let dealt = amount.max(0.0).min(self.current);
        self.current -= dealt;
        dealt
    }

    /// Bullets lose punch with every bounce they have left.
    pub fn apply_projectile_hit(&mut self, bounces_remaining: u32, multiplier: f32) -> f32 {
        let base = (30.0 - 10.0 * bounces_remaining as f32).max(0.0);
        self.apply_damage(base * multiplier)
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

/// Marker: the player.
#[derive(Component, Debug)]
pub struct Player;

/// Marker: a static wall tile.
#[derive(Component, Debug)]
pub struct Wall;

/// Marker: a wall tile that borders walkable space.
#[derive(Component, Debug)]
pub struct ExposedWall;

/// Marker: an enemy created by a necromancer.
#[derive(Component, Debug)]
pub struct Minion;

#[derive(Component, Debug, Clone, Copy)]
pub struct Projectile {
    /// Fired by an enemy.
    pub hostile: bool,
    pub bounces_remaining: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpKind {
    /// Player takes no damage.
    Invincibility,
    /// Player bullets deal triple damage.
    SuperBullets,
    /// Damage dealt to enemies heals the player.
    HealthStealer,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub active: bool,
}

/// Floating damage number.
#[derive(Component, Debug, Clone, Copy)]
pub struct DamageText {
    pub amount: f32,
    pub remaining_ms: f32,
}
