//! Enemy AI tuning. Distances are world units, times milliseconds, speeds units per second.

use bevy_ecs::prelude::*;
use serde::Deserialize;

#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub enemy_speed: f32,
    /// Roaming enemies start pursuing inside this radius.
    pub aggro_distance: f32,
    /// Roamers closer than this to a wall center switch to wall avoidance.
    pub wall_avoid_trigger: f32,
    /// Wall avoidance ends once the nearest wall center is farther than this.
    pub wall_avoid_release: f32,
    /// Repulsion constant for context steering.
    pub obstacle_force: f32,
    pub separation_radius: f32,
    /// Context-steering chasers stop this close to the player.
    pub stop_distance: f32,
    pub melee_distance: f32,
    pub reload_ms: f32,
    pub take_aim_ms: f32,
    pub shoot_rate_ms: f32,
    pub melee_windup_ms: f32,
    pub melee_damage: f32,
    pub path_refresh_ms: f32,
    /// Step cost of a diagonal grid move. 1.0 prices it like a cardinal one.
    pub diagonal_cost: f32,
    pub los_step: f32,
    pub los_max_samples: usize,
    /// Angle between the center pellet and each side pellet of a shotgun blast.
    pub shotgun_spread: f32,
    pub projectile_speed: f32,
    pub projectile_bounces: u32,
    /// Chance per tick that a reloaded teleporting boss teleports instead of attacking.
    pub teleport_chance: f32,
    pub teleport_ms: f32,
    pub teleport_player_clearance: f32,
    pub teleport_wall_clearance: f32,
    /// Rejection sampling attempts before settling for the best candidate.
    pub teleport_max_attempts: usize,
    pub minion_offset: f32,
    pub minion_wall_clearance: f32,
    /// Magnitude of the random per-tick roaming velocity.
    pub roam_jitter: f32,
    pub damage_text_ms: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enemy_speed: 50.0,
            aggro_distance: 400.0,
            wall_avoid_trigger: 60.0,
            wall_avoid_release: 150.0,
            obstacle_force: 120.0,
            separation_radius: 100.0,
            stop_distance: 75.0,
            melee_distance: 75.0,
            reload_ms: 3000.0,
            take_aim_ms: 1500.0,
            shoot_rate_ms: 500.0,
            melee_windup_ms: 500.0,
            melee_damage: 10.0,
            path_refresh_ms: 1000.0,
            diagonal_cost: 1.0,
            los_step: outrider_nav::los::DEFAULT_STEP,
            los_max_samples: outrider_nav::los::MAX_SAMPLES,
            shotgun_spread: std::f32::consts::FRAC_PI_8,
            projectile_speed: 300.0,
            projectile_bounces: 2,
            teleport_chance: 0.5,
            teleport_ms: 1000.0,
            teleport_player_clearance: 250.0,
            teleport_wall_clearance: 100.0,
            teleport_max_attempts: 256,
            minion_offset: 100.0,
            minion_wall_clearance: 60.0,
            roam_jitter: 10.0,
            damage_text_ms: 800.0,
        }
    }
}

impl AiConfig {
    pub fn context_steering(&self) -> outrider_nav::ContextSteering {
        outrider_nav::ContextSteering {
            force: self.obstacle_force,
            separation_radius: self.separation_radius,
            stop_distance: self.stop_distance,
        }
    }
}
