// checks.rs - Command checks
// The Ready check keeps family-tree commands off until startup has finished.

use serenity::{
    client::Context,
    framework::standard::{macros::check, Args, CommandOptions, Reason},
    model::channel::Message,
};

/// Name reported in `DispatchError::CheckFailed` when the bot isn't ready
pub const READY_CHECK_NAME: &str = "Ready";

// Passes once the gateway is ready and the family tree is loaded
#[check]
#[name = "Ready"]
pub async fn ready_check(
    ctx: &Context,
    _msg: &Message,
    _args: &mut Args,
    _options: &CommandOptions,
) -> Result<(), Reason> {
    let data = ctx.data.read().await;
    let ready = data
        .get::<crate::BotStatusKey>()
        .map_or(false, |status| status.is_ready());

    if ready {
        Ok(())
    } else {
        Err(Reason::Log("bot is not ready".to_string()))
    }
}
