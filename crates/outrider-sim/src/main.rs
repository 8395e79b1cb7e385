mod config;

use std::time::Duration;

use bevy_ecs::prelude::*;
use config::SimConfig;
use glam::Vec2;
use outrider_game::components::{Health, Motion, Projectile};
use outrider_game::game_world::{AiEvent, GameWorld};
use outrider_nav::SpatialGrid;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| "sim.toml".into());
    let config = match SimConfig::load(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "Outrider sim v{} (seed: {}, tick: {} ms)",
        env!("CARGO_PKG_VERSION"),
        config.sim.seed,
        config.sim.tick_ms
    );

    let cell_size = Vec2::splat(config.room.cell_size);
    let grid = match SpatialGrid::from_layout(&config.room.layout[..], cell_size) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Invalid room layout: {e}");
            std::process::exit(1);
        }
    };
    let room = grid.dimensions();

    let mut gw = GameWorld::with_config(config.sim.seed, config.ai.clone());
    gw.load_room(grid);
    let player = gw.spawn_player(Vec2::from(config.room.player));
    for spawn in &config.spawns {
        match gw.spawn_enemy(&spawn.archetype, Vec2::new(spawn.x, spawn.y)) {
            Some(entity) => info!(archetype = %spawn.archetype, ?entity, "spawned"),
            None => warn!(archetype = %spawn.archetype, "unknown archetype, skipped"),
        }
    }

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

    // Handle Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let tick_ms = config.sim.tick_ms.max(1);
    let mut tick_interval = tokio::time::interval(Duration::from_millis(tick_ms));
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                gw.tick(tick_ms as f32);
                step_physics(&mut gw, player, room, tick_ms as f32 / 1000.0);
                for event in gw.drain_events() {
                    log_event(&event);
                }

                if gw.world.get::<Health>(player).is_some_and(|h| h.is_dead()) {
                    info!(tick = gw.current_tick(), "player died");
                    break;
                }
                if config.sim.ticks > 0 && gw.current_tick() >= config.sim.ticks {
                    info!(ticks = gw.current_tick(), "tick limit reached");
                    break;
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("Simulation stopped after {} ticks", gw.current_tick());
}

/// Minimal stand-in for a physics engine: integrate velocities, land hostile
/// projectiles on the player and drop the ones that leave the room.
fn step_physics(gw: &mut GameWorld, player: Entity, room: Vec2, seconds: f32) {
    let mut q = gw.world.query::<&mut Motion>();
    for mut motion in q.iter_mut(&mut gw.world) {
        motion.integrate(seconds);
    }

    let Some(target) = gw.world.get::<Motion>(player).map(|m| m.bounding_box()) else {
        return;
    };
    let bounds = outrider_nav::Aabb {
        min: Vec2::ZERO,
        max: room,
    };

    let mut hits = Vec::new();
    let mut lost = Vec::new();
    let mut q = gw.world.query::<(Entity, &Projectile, &Motion)>();
    for (entity, projectile, motion) in q.iter(&gw.world) {
        if projectile.hostile && target.contains(motion.position) {
            hits.push(entity);
        } else if !bounds.contains(motion.position) {
            lost.push(entity);
        }
    }

    for projectile in hits {
        if let Some(dealt) = gw.projectile_hit(projectile, player) {
            debug!(dealt, "player hit by projectile");
        }
    }
    for projectile in lost {
        gw.world.despawn(projectile);
    }
}

fn log_event(event: &AiEvent) {
    match event {
        AiEvent::StateChanged { entity, from, to } => {
            debug!(?entity, ?from, ?to, "state changed");
        }
        AiEvent::ProjectileFired { origin, angle } => {
            debug!(?origin, angle, "projectile fired");
        }
        AiEvent::MeleeHit {
            attacker, damage, ..
        } => {
            info!(?attacker, damage, "melee hit");
        }
        AiEvent::Teleported { entity, to } => {
            info!(?entity, ?to, "teleported");
        }
        AiEvent::MinionSummoned {
            necromancer,
            minion,
            position,
        } => {
            info!(?necromancer, ?minion, ?position, "minion summoned");
        }
    }
}
