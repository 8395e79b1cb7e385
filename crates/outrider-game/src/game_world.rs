//! ECS game world: bevy_ecs World, room loading, the tick pipeline and the event sink.

use bevy_ecs::prelude::*;
use glam::Vec2;
use outrider_nav::{PathPlanner, SpatialGrid};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::ai::commands::{flush_pending_actions, PendingActions};
use crate::ai::factory::{EcsFactory, EntityFactory};
use crate::ai::state_machine::system_enemy_ai;
use crate::ai::teleport::system_teleport_animation;
use crate::archetypes::{spawn_enemy, ArchetypeRegistry};
use crate::components::*;
use crate::config::AiConfig;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Navigation data for the current room. `grid` is `None` between rooms, in
/// which case enemies fall back to context steering.
#[derive(Resource, Debug, Default)]
pub struct Navigation {
    pub grid: Option<SpatialGrid>,
    pub planner: PathPlanner,
    /// Wall entities that border walkable space.
    pub exposed_walls: Vec<Entity>,
}

/// The simulation's only random source.
#[derive(Resource, Debug)]
pub struct SimRng(pub StdRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }
}

/// Number of ticks run so far.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

/// Events queued for audio, rendering or logging.
#[derive(Resource, Default)]
pub struct AiEvents {
    pub events: Vec<AiEvent>,
}

// ---------------------------------------------------------------------------
// AI events (simulation → presentation)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum AiEvent {
    StateChanged {
        entity: Entity,
        from: EnemyState,
        to: EnemyState,
    },
    ProjectileFired {
        origin: Vec2,
        angle: f32,
    },
    MeleeHit {
        attacker: Entity,
        target: Entity,
        damage: f32,
    },
    Teleported {
        entity: Entity,
        to: Vec2,
    },
    MinionSummoned {
        necromancer: Entity,
        minion: Entity,
        position: Vec2,
    },
}

/// Whether any power-up of `kind` is currently active.
pub fn power_up_active(world: &mut World, kind: PowerUpKind) -> bool {
    world
        .query::<&PowerUp>()
        .iter(world)
        .any(|p| p.active && p.kind == kind)
}

// ---------------------------------------------------------------------------
// GameWorld
// ---------------------------------------------------------------------------

/// The ECS game world.
pub struct GameWorld {
    pub world: World,
    registry: ArchetypeRegistry,
    factory: Box<dyn EntityFactory>,
}

impl GameWorld {
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, AiConfig::default())
    }

    pub fn with_config(seed: u64, config: AiConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(Navigation {
            planner: PathPlanner::with_diagonal_cost(config.diagonal_cost),
            ..Navigation::default()
        });
        world.insert_resource(config);
        world.insert_resource(SimRng::seeded(seed));
        world.insert_resource(PendingActions::default());
        world.insert_resource(AiEvents::default());
        world.insert_resource(TickCounter::default());

        Self {
            world,
            registry: ArchetypeRegistry::new(),
            factory: Box::new(EcsFactory),
        }
    }

    /// Replace the factory used for projectiles, minions and damage text.
    pub fn with_factory(mut self, factory: Box<dyn EntityFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Run one simulation tick: decide, apply deferred actions, then animate.
    pub fn tick(&mut self, elapsed_ms: f32) {
        self.world.resource_mut::<TickCounter>().0 += 1;

        system_enemy_ai(&mut self.world, elapsed_ms);
        flush_pending_actions(&mut self.world, self.factory.as_ref());
        system_teleport_animation(&mut self.world, elapsed_ms);
        system_expire_damage_text(&mut self.world, elapsed_ms);
        system_cleanup_dead(&mut self.world);
    }

    /// Drain all pending AI events.
    pub fn drain_events(&mut self) -> Vec<AiEvent> {
        std::mem::take(&mut self.world.resource_mut::<AiEvents>().events)
    }

    pub fn current_tick(&self) -> u64 {
        self.world.resource::<TickCounter>().0
    }

    pub fn config(&self) -> &AiConfig {
        self.world.resource::<AiConfig>()
    }

    pub fn registry(&self) -> &ArchetypeRegistry {
        &self.registry
    }

    pub fn spawn_player(&mut self, position: Vec2) -> Entity {
        self.world
            .spawn((
                Player,
                Motion::new(position, Vec2::splat(50.0)),
                Health::new(100.0),
            ))
            .id()
    }

    /// Spawn an enemy by archetype name. `None` if the name is unknown.
    pub fn spawn_enemy(&mut self, archetype: &str, position: Vec2) -> Option<Entity> {
        let def = *self.registry.get(archetype)?;
        let entity = spawn_enemy(&mut self.world, &def, position);
        debug!(archetype, ?entity, ?position, "enemy spawned");
        Some(entity)
    }

    pub fn add_power_up(&mut self, kind: PowerUpKind) -> Entity {
        self.world.spawn(PowerUp { kind, active: true }).id()
    }

    /// Install a new room: previous walls are despawned, one wall entity is
    /// spawned per blocked cell and the grid becomes the navigation grid.
    pub fn load_room(&mut self, grid: SpatialGrid) {
        let old: Vec<Entity> = self
            .world
            .query_filtered::<Entity, With<Wall>>()
            .iter(&self.world)
            .collect();
        for entity in old {
            self.world.despawn(entity);
        }

        let exposed = grid.exposed_cells();
        let mut exposed_walls = Vec::with_capacity(exposed.len());
        let mut wall_count = 0usize;
        for node in grid.nodes().iter().filter(|n| n.not_walkable) {
            let mut wall = self
                .world
                .spawn((Wall, Motion::new(node.position, node.size)));
            if exposed.contains(&node.coord) {
                wall.insert(ExposedWall);
                exposed_walls.push(wall.id());
            }
            wall_count += 1;
        }

        info!(
            cols = grid.cols(),
            rows = grid.rows(),
            walls = wall_count,
            exposed = exposed_walls.len(),
            "room loaded"
        );

        {
            let mut nav = self.world.resource_mut::<Navigation>();
            nav.grid = Some(grid);
            nav.exposed_walls = exposed_walls;
        }

        // Cached paths index the previous room's cells.
        let mut q = self.world.query::<&mut Pathfinder>();
        for mut pathfinder in q.iter_mut(&mut self.world) {
            pathfinder.0.invalidate();
        }
    }

    /// Resolve a projectile striking `target`. Returns the damage dealt, or
    /// `None` if either entity is gone. The projectile is consumed either way.
    pub fn projectile_hit(&mut self, projectile: Entity, target: Entity) -> Option<f32> {
        let bullet = *self.world.get::<Projectile>(projectile)?;
        self.world.despawn(projectile);

        let target_is_player = self.world.get::<Player>(target).is_some();
        let position = self.world.get::<Motion>(target)?.position;

        let dealt = if target_is_player {
            if power_up_active(&mut self.world, PowerUpKind::Invincibility) {
                0.0
            } else {
                self.world
                    .get_mut::<Health>(target)?
                    .apply_projectile_hit(bullet.bounces_remaining, 1.0)
            }
        } else {
            let multiplier = if power_up_active(&mut self.world, PowerUpKind::SuperBullets) {
                3.0
            } else {
                1.0
            };
            let dealt = self
                .world
                .get_mut::<Health>(target)?
                .apply_projectile_hit(bullet.bounces_remaining, multiplier);
            if power_up_active(&mut self.world, PowerUpKind::HealthStealer) {
                self.heal_player(dealt);
            }
            dealt
        };

        if dealt > 0.0 {
            self.factory
                .create_damage_text(&mut self.world, position, dealt);
        }
        Some(dealt)
    }

    pub fn enemy_state(&self, entity: Entity) -> Option<EnemyState> {
        self.world.get::<Enemy>(entity).map(|e| e.state)
    }

    fn heal_player(&mut self, amount: f32) {
        let mut q = self.world.query_filtered::<&mut Health, With<Player>>();
        for mut health in q.iter_mut(&mut self.world) {
            health.heal(amount);
        }
    }
}

// ---------------------------------------------------------------------------
// Internal systems
// ---------------------------------------------------------------------------

/// Count damage numbers down and despawn expired ones.
fn system_expire_damage_text(world: &mut World, elapsed_ms: f32) {
    let mut expired = Vec::new();
    let mut q = world.query::<(Entity, &mut DamageText)>();
    for (entity, mut text) in q.iter_mut(world) {
        text.remaining_ms -= elapsed_ms;
        if text.remaining_ms <= 0.0 {
            expired.push(entity);
        }
    }
    for entity in expired {
        world.despawn(entity);
    }
}

/// Despawn enemies whose health ran out.
fn system_cleanup_dead(world: &mut World) {
    let dead: Vec<Entity> = world
        .query_filtered::<(Entity, &Health), With<Enemy>>()
        .iter(world)
        .filter(|(_, h)| h.is_dead())
        .map(|(e, _)| e)
        .collect();
    for entity in dead {
        debug!(?entity, "enemy died");
        world.despawn(entity);
    }
}
