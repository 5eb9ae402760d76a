// error.rs - Simulation error taxonomy and user-facing translation
// Every failure a simulation command can produce is one of these variants.
// The framework hooks in main.rs funnel both command errors and dispatch
// errors through `translate`, which decides what (if anything) the invoker sees.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while handling a simulation command
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A command that needs a target was invoked without one
    #[error("missing required argument `{0}`")]
    MissingArgument(&'static str),

    /// The per-user cooldown bucket rejected the invocation
    #[error("command on cooldown for another {retry_after:?} (window {per:?})")]
    Cooldown { per: Duration, retry_after: Duration },

    /// The target token could not be converted into a user
    #[error("member \"{0}\" not found")]
    BadArgument(String),

    /// The readiness check failed
    #[error("bot is not ready")]
    BotNotReady,

    #[error(transparent)]
    Discord(#[from] serenity::Error),

    #[error("{0}")]
    Unexpected(String),
}

/// What the error hooks should do in response to a `SimulationError`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorAction {
    /// Send this text back to the invoking channel
    Reply(String),
    /// Run the command again, skipping the cooldown
    Reinvoke,
    /// Show the raw error to an owner
    RawToOwner(String),
    /// Say nothing to the user
    Suppress,
}

pub const MISSING_ARGUMENT_TEXT: &str =
    "You need to specify a person for this command to work properly.";
pub const BOT_NOT_READY_TEXT: &str =
    "The bot isn't ready to start processing that command yet - please wait.";

/// Map an error to the action shown to the invoker.
/// Owners get cooldowns skipped and see unexpected errors verbatim.
pub fn translate(error: &SimulationError, invoker_is_owner: bool) -> ErrorAction {
    match error {
        SimulationError::MissingArgument(_) => ErrorAction::Reply(MISSING_ARGUMENT_TEXT.to_string()),
        SimulationError::Cooldown { per, retry_after } => {
            if invoker_is_owner {
                ErrorAction::Reinvoke
            } else {
                ErrorAction::Reply(cooldown_text(*per, *retry_after))
            }
        }
        SimulationError::BadArgument(token) => {
            ErrorAction::Reply(format!("User `{}` could not be found.", token))
        }
        SimulationError::BotNotReady => ErrorAction::Reply(BOT_NOT_READY_TEXT.to_string()),
        SimulationError::Discord(_) | SimulationError::Unexpected(_) => {
            if invoker_is_owner {
                ErrorAction::RawToOwner(format!("```\n{}```", error))
            } else {
                ErrorAction::Suppress
            }
        }
    }
}

fn cooldown_text(per: Duration, retry_after: Duration) -> String {
    format!(
        "You can only use this command once every `{:.0} seconds` per server. You may use this again in `{:.2} seconds`.",
        per.as_secs_f64(),
        retry_after.as_secs_f64()
    )
}
