// commands/mod.rs - Command Module Registry
// This file declares the Discord-facing command modules and the shared helpers
// they use to reach bot state stored in the serenity TypeMap

pub mod checks;         // Readiness check guarding commands that need the family tree
pub mod help;           // Help listing for the simulation commands
pub mod hooks;          // Framework hooks: dispatch errors and command errors
pub mod simulation;     // hug, kiss, slap, ... and the copulate handshake

use serenity::client::Context;
use std::sync::Arc;

use crate::config::BotConfig;
use crate::error::SimulationError;
use crate::simulation::SimulationEnv;

/// Fetch the config and simulation dependencies inserted at startup
pub async fn simulation_state(ctx: &Context) -> Result<(Arc<BotConfig>, Arc<SimulationEnv>), SimulationError> {
    let data = ctx.data.read().await;
    let config = data.get::<crate::BotConfigKey>().cloned();
    let env = data.get::<crate::SimulationEnvKey>().cloned();
    match (config, env) {
        (Some(config), Some(env)) => Ok((config, env)),
        _ => Err(SimulationError::Unexpected(
            "simulation state missing from client data".to_string(),
        )),
    }
}
