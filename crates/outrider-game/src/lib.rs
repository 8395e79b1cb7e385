//! Enemy behavior on top of the navigation core: ECS components, archetypes and the AI tick.

pub mod ai;
pub mod archetypes;
pub mod components;
pub mod config;
pub mod game_world;
