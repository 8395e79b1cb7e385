//! Enemy AI: the per-tick state machine, its attacks and teleports, and the
//! queue of side effects applied once the decision pass is over.

pub mod attack;
pub mod commands;
pub mod factory;
pub mod movement;
pub mod state_machine;
pub mod teleport;
