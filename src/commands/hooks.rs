// hooks.rs - Framework hooks for the simulation commands
// Both failed dispatches (cooldown, readiness, arguments) and errors returned
// from command bodies end up in `handle_error`, which asks error::translate
// what the invoker should see.

use serenity::{
    client::Context,
    framework::standard::{CommandResult, DispatchError},
    model::channel::Message,
};
use std::time::Duration;

use super::checks::READY_CHECK_NAME;
use super::simulation::reinvoke;
use super::simulation_state;
use crate::config::DEFAULT_COOLDOWN;
use crate::error::{translate, ErrorAction, SimulationError};

/// `after` hook: report command errors
pub async fn after(ctx: &Context, msg: &Message, command_name: &str, result: CommandResult) {
    match result {
        Ok(()) => {
            log::debug!(
                "[HOOKS] Command '{}' executed successfully by user {} ({})",
                command_name,
                msg.author.name,
                msg.author.id
            );
        }
        Err(e) => {
            let error = match e.downcast::<SimulationError>() {
                Ok(error) => *error,
                Err(other) => SimulationError::Unexpected(other.to_string()),
            };
            handle_error(ctx, msg, command_name, error).await;
        }
    }
}

/// `on_dispatch_error` hook: turn framework rejections into simulation errors
pub async fn dispatch_error(ctx: &Context, msg: &Message, error: DispatchError, command_name: &str) {
    let per = match simulation_state(ctx).await {
        Ok((config, _)) => config.cooldown,
        Err(_) => DEFAULT_COOLDOWN,
    };
    let error = match rejection(error, per) {
        Ok(error) => error,
        Err(other) => {
            log::warn!(
                "[HOOKS] Dispatch of '{}' for user {} ({}) failed: {:?}",
                command_name,
                msg.author.name,
                msg.author.id,
                other
            );
            return;
        }
    };
    handle_error(ctx, msg, command_name, error).await;
}

/// Owners are not exempt here: the framework runs with owner_privilege off,
/// so their cooldowns and failed checks come through this mapping too.
fn rejection(error: DispatchError, per: Duration) -> Result<SimulationError, DispatchError> {
    match error {
        DispatchError::Ratelimited(info) => Ok(SimulationError::Cooldown {
            per,
            retry_after: info.rate_limit,
        }),
        DispatchError::CheckFailed(name, _) if name == READY_CHECK_NAME => Ok(SimulationError::BotNotReady),
        DispatchError::NotEnoughArguments { .. } => Ok(SimulationError::MissingArgument("user")),
        other => Err(other),
    }
}

/// `unrecognised_command` hook
pub async fn unrecognised(_ctx: &Context, msg: &Message, command_name: &str) {
    log::debug!(
        "[HOOKS] Unrecognized command '{}' attempted by user {} ({})",
        command_name,
        msg.author.name,
        msg.author.id
    );
}

async fn handle_error(ctx: &Context, msg: &Message, command_name: &str, error: SimulationError) {
    let config = match simulation_state(ctx).await {
        Ok((config, _)) => config,
        Err(e) => {
            log::error!("[HOOKS] Cannot report error for '{}': {}", command_name, e);
            return;
        }
    };
    let is_owner = config.is_owner(msg.author.id);

    match translate(&error, is_owner) {
        ErrorAction::Reinvoke => {
            if let Err(e) = reinvoke(ctx, msg, command_name, &config.prefix).await {
                let error = match e.downcast::<SimulationError>() {
                    Ok(error) => *error,
                    Err(other) => SimulationError::Unexpected(other.to_string()),
                };
                deliver(ctx, msg, command_name, &error, translate(&error, is_owner)).await;
            }
        }
        action => deliver(ctx, msg, command_name, &error, action).await,
    }
}

async fn deliver(ctx: &Context, msg: &Message, command_name: &str, error: &SimulationError, action: ErrorAction) {
    let text = match action {
        ErrorAction::Reply(text) => text,
        ErrorAction::RawToOwner(text) => {
            log::error!(
                "❌ Command '{}' failed for owner {} ({}): {:?}",
                command_name,
                msg.author.name,
                msg.author.id,
                error
            );
            text
        }
        ErrorAction::Suppress => {
            log::error!(
                "❌ Command '{}' failed for user {} ({}): {:?}",
                command_name,
                msg.author.name,
                msg.author.id,
                error
            );
            return;
        }
        ErrorAction::Reinvoke => {
            log::warn!("[HOOKS] Refusing to reinvoke '{}' twice", command_name);
            return;
        }
    };

    if let Err(e) = msg.channel_id.say(&ctx.http, text).await {
        log::error!("[HOOKS] Failed to send error reply for '{}': {}", command_name, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::framework::standard::Reason;

    #[test]
    fn test_failed_ready_check_reaches_owners() {
        let error = rejection(DispatchError::CheckFailed(READY_CHECK_NAME, Reason::Unknown), DEFAULT_COOLDOWN);
        let error = match error {
            Ok(error) => error,
            Err(other) => panic!("expected BotNotReady, got {:?}", other),
        };
        assert!(matches!(error, SimulationError::BotNotReady));
        assert!(matches!(translate(&error, true), ErrorAction::Reply(_)));
    }

    #[test]
    fn test_missing_arguments_and_other_rejections() {
        let missing = rejection(DispatchError::NotEnoughArguments { min: 1, given: 0 }, DEFAULT_COOLDOWN);
        assert!(matches!(missing, Ok(SimulationError::MissingArgument("user"))));

        let other = rejection(DispatchError::OnlyForOwners, DEFAULT_COOLDOWN);
        assert!(matches!(other, Err(DispatchError::OnlyForOwners)));
    }
}
