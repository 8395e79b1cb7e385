//! Creation of projectiles, minions and damage numbers requested by the AI.

use bevy_ecs::prelude::*;
use glam::Vec2;
use outrider_nav::geometry::direction_from_angle;

use crate::archetypes::{self, spawn_enemy};
use crate::components::*;
use crate::config::AiConfig;

/// Projectile sprite size.
const PROJECTILE_SIZE: f32 = 20.0;

/// Builds the entities the AI asks for. Swap it out to attach rendering or
/// physics data; the AI only depends on this interface.
pub trait EntityFactory {
    /// `angle` is the direction of travel in radians.
    fn create_projectile(&self, world: &mut World, origin: Vec2, angle: f32, hostile: bool)
        -> Entity;
    fn create_melee_minion(&self, world: &mut World, position: Vec2) -> Entity;
    fn create_ranged_minion(&self, world: &mut World, position: Vec2) -> Entity;
    fn create_damage_text(&self, world: &mut World, position: Vec2, amount: f32) -> Entity;
}

/// Plain ECS entities with just the simulation components.
#[derive(Debug, Default, Clone, Copy)]
pub struct EcsFactory;

impl EntityFactory for EcsFactory {
    fn create_projectile(
        &self,
        world: &mut World,
        origin: Vec2,
        angle: f32,
        hostile: bool,
    ) -> Entity {
        let cfg = world.get_resource::<AiConfig>().cloned().unwrap_or_default();
        let mut motion = Motion::new(origin, Vec2::splat(PROJECTILE_SIZE));
        motion.angle = angle;
        motion.velocity = direction_from_angle(angle) * cfg.projectile_speed;
        world
            .spawn((
                motion,
                Projectile {
                    hostile,
                    bounces_remaining: cfg.projectile_bounces,
                },
            ))
            .id()
    }

    fn create_melee_minion(&self, world: &mut World, position: Vec2) -> Entity {
        spawn_enemy(world, &archetypes::MELEE_MINION, position)
    }

    fn create_ranged_minion(&self, world: &mut World, position: Vec2) -> Entity {
        spawn_enemy(world, &archetypes::RANGED_MINION, position)
    }

    fn create_damage_text(&self, world: &mut World, position: Vec2, amount: f32) -> Entity {
        let cfg = world.get_resource::<AiConfig>().cloned().unwrap_or_default();
        world
            .spawn((
                Motion::new(position, Vec2::ONE),
                DamageText {
                    amount,
                    remaining_ms: cfg.damage_text_ms,
                },
            ))
            .id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projectile_travels_along_angle() {
        let mut world = World::new();
        let e = EcsFactory.create_projectile(&mut world, Vec2::new(5.0, 5.0), 0.0, true);
        let motion = world.get::<Motion>(e).unwrap();
        assert_eq!(motion.position, Vec2::new(5.0, 5.0));
        assert!(motion.velocity.x > 0.0);
        assert!(motion.velocity.y.abs() < 1e-4);
        let p = world.get::<Projectile>(e).unwrap();
        assert!(p.hostile);
        assert_eq!(p.bounces_remaining, AiConfig::default().projectile_bounces);
    }

    #[test]
    fn minions_are_marked() {
        let mut world = World::new();
        let m = EcsFactory.create_melee_minion(&mut world, Vec2::ZERO);
        let r = EcsFactory.create_ranged_minion(&mut world, Vec2::ZERO);
        assert!(world.get::<Minion>(m).is_some());
        assert_eq!(world.get::<Enemy>(m).unwrap().kind, EnemyKind::Melee);
        assert_eq!(world.get::<Enemy>(r).unwrap().kind, EnemyKind::Ranged);
    }
}
