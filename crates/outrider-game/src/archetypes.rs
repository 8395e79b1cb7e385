//! Enemy archetype definitions and the spawner that turns one into an entity.

use bevy_ecs::prelude::*;
use glam::Vec2;
use outrider_nav::PathFollower;

use crate::components::*;
use crate::config::AiConfig;

/// Side length of an unscaled enemy sprite.
pub const BASE_SIZE: f32 = 99.0;

/// Definition of an enemy archetype.
#[derive(Debug, Clone, Copy)]
pub struct ArchetypeDefinition {
    /// Lookup key, e.g. `"necromancer"`.
    pub name: &'static str,
    pub kind: EnemyKind,
    pub max_health: f32,
    /// Multiplier on [`BASE_SIZE`].
    pub scale_factor: f32,
    /// Whether it navigates the grid instead of steering directly.
    pub uses_pathfinding: bool,
    pub minion: bool,
}

impl ArchetypeDefinition {
    pub fn scale(&self) -> Vec2 {
        Vec2::splat(BASE_SIZE * self.scale_factor)
    }
}

pub const ROAMER: ArchetypeDefinition = ArchetypeDefinition {
    name: "roamer",
    kind: EnemyKind::Roamer,
    max_health: 100.0,
    scale_factor: 0.5,
    uses_pathfinding: false,
    minion: false,
};

pub const RANGED: ArchetypeDefinition = ArchetypeDefinition {
    name: "ranged",
    kind: EnemyKind::Ranged,
    max_health: 100.0,
    scale_factor: 0.5,
    uses_pathfinding: true,
    minion: false,
};

pub const MELEE: ArchetypeDefinition = ArchetypeDefinition {
    name: "melee",
    kind: EnemyKind::Melee,
    max_health: 100.0,
    scale_factor: 0.5,
    uses_pathfinding: false,
    minion: false,
};

/// Teleporting shotgun boss.
pub const GUNSLINGER: ArchetypeDefinition = ArchetypeDefinition {
    name: "gunslinger",
    kind: EnemyKind::Boss {
        teleports: true,
        summons: false,
    },
    max_health: 1000.0,
    scale_factor: 0.75,
    uses_pathfinding: true,
    minion: false,
};

/// Teleporting boss that raises minions wherever it lands.
pub const NECROMANCER: ArchetypeDefinition = ArchetypeDefinition {
    name: "necromancer",
    kind: EnemyKind::Boss {
        teleports: true,
        summons: true,
    },
    max_health: 1500.0,
    scale_factor: 0.75,
    uses_pathfinding: true,
    minion: false,
};

pub const MELEE_MINION: ArchetypeDefinition = ArchetypeDefinition {
    name: "melee_minion",
    kind: EnemyKind::Melee,
    max_health: 25.0,
    scale_factor: 0.3,
    uses_pathfinding: false,
    minion: true,
};

pub const RANGED_MINION: ArchetypeDefinition = ArchetypeDefinition {
    name: "ranged_minion",
    kind: EnemyKind::Ranged,
    max_health: 25.0,
    scale_factor: 0.3,
    uses_pathfinding: true,
    minion: true,
};

/// Registry of spawnable enemies, looked up by name.
pub struct ArchetypeRegistry {
    archetypes: Vec<ArchetypeDefinition>,
}

impl Default for ArchetypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchetypeRegistry {
    pub fn new() -> Self {
        Self {
            archetypes: vec![
                ROAMER,
                RANGED,
                MELEE,
                GUNSLINGER,
                NECROMANCER,
                MELEE_MINION,
                RANGED_MINION,
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&ArchetypeDefinition> {
        self.archetypes.iter().find(|a| a.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.archetypes.iter().map(|a| a.name)
    }
}

/// Spawn an enemy with the capability components its kind needs.
///
/// Enemies start out roaming. Timers come from the world's [`AiConfig`].
pub fn spawn_enemy(world: &mut World, def: &ArchetypeDefinition, position: Vec2) -> Entity {
    let cfg = world.get_resource::<AiConfig>().cloned().unwrap_or_default();
    let scale = def.scale();

    let mut entity = world.spawn((
        Enemy {
            state: EnemyState::Roaming,
            ..Enemy::new(def.kind)
        },
        Motion::new(position, scale),
        Health::new(def.max_health),
        MovementSpeed(cfg.enemy_speed),
    ));

    match def.kind {
        EnemyKind::Roamer => {}
        EnemyKind::Ranged => {
            entity.insert(ReloadTime::from_config(&cfg));
        }
        EnemyKind::Melee => {
            entity.insert(MeleeAttack::from_config(&cfg));
        }
        EnemyKind::Boss { teleports, summons } => {
            entity.insert((ReloadTime::from_config(&cfg), MeleeAttack::from_config(&cfg)));
            if teleports {
                entity.insert(Teleporter {
                    animation_ms: 0.0,
                    max_teleport_ms: cfg.teleport_ms,
                    prev_scale: scale,
                });
            }
            if summons {
                entity.insert(Necromancer::default());
            }
        }
    }

    if def.uses_pathfinding {
        entity.insert(Pathfinder(PathFollower::new(cfg.path_refresh_ms)));
    }
    if def.minion {
        entity.insert(Minion);
    }

    entity.id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup() {
        let reg = ArchetypeRegistry::new();
        assert_eq!(reg.get("necromancer").unwrap().max_health, 1500.0);
        assert!(reg.get("dragon").is_none());
        assert_eq!(reg.names().count(), 7);
    }

    #[test]
    fn boss_gets_all_capabilities() {
        let reg = ArchetypeRegistry::new();
        let mut world = World::new();
        let e = spawn_enemy(&mut world, reg.get("necromancer").unwrap(), Vec2::new(10.0, 20.0));
        let em = world.entity(e);
        assert!(em.contains::<ReloadTime>());
        assert!(em.contains::<MeleeAttack>());
        assert!(em.contains::<Teleporter>());
        assert!(em.contains::<Necromancer>());
        assert!(em.contains::<Pathfinder>());
        assert!(!em.contains::<Minion>());
        assert_eq!(em.get::<Enemy>().unwrap().state, EnemyState::Roaming);
        let motion = em.get::<Motion>().unwrap();
        assert!((motion.scale.x - 74.25).abs() < 1e-4);
    }

    #[test]
    fn melee_minion_steers_without_grid() {
        let reg = ArchetypeRegistry::new();
        let mut world = World::new();
        world.insert_resource(AiConfig::default());
        let e = spawn_enemy(&mut world, reg.get("melee_minion").unwrap(), Vec2::ZERO);
        let em = world.entity(e);
        assert!(em.contains::<MeleeAttack>());
        assert!(em.contains::<Minion>());
        assert!(!em.contains::<Pathfinder>());
        assert!(!em.contains::<ReloadTime>());
        assert_eq!(em.get::<Health>().unwrap().max, 25.0);
        assert_eq!(em.get::<MovementSpeed>().unwrap().0, 50.0);
    }

    #[test]
    fn ranged_uses_configured_timers() {
        let reg = ArchetypeRegistry::new();
        let mut world = World::new();
        world.insert_resource(AiConfig {
            reload_ms: 1234.0,
            ..AiConfig::default()
        });
        let e = spawn_enemy(&mut world, reg.get("ranged").unwrap(), Vec2::ZERO);
        assert_eq!(world.get::<ReloadTime>(e).unwrap().counter_ms, 1234.0);
        assert!(world.get::<Pathfinder>(e).is_some());
    }
}
