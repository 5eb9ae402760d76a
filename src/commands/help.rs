// help.rs - Help Command Module
// Lists the visible simulation commands with their aliases

use serenity::{
    client::Context,
    framework::standard::{macros::command, Args, CommandResult},
    model::channel::Message,
};

use super::simulation_state;
use crate::simulation::Verb;

#[command]
#[aliases("commands")]
/// Display help information for the simulation commands
pub async fn help(ctx: &Context, msg: &Message, _args: Args) -> CommandResult {
    let (config, _) = simulation_state(ctx).await?;
    msg.reply(ctx, help_text(&config.prefix, config.cooldown.as_secs())).await?;
    Ok(())
}

pub fn help_text(prefix: &str, cooldown_secs: u64) -> String {
    let mut text = String::from("**🤗 Simulation Commands**\n\n");
    for verb in Verb::ALL.into_iter().filter(|v| !v.hidden()) {
        let usage = if verb.takes_target() { " @user" } else { "" };
        text.push_str(&format!("• `{}{}{}` - {}", prefix, verb.name(), usage, verb.description()));
        let aliases = verb.aliases();
        if !aliases.is_empty() {
            let aliases: Vec<String> = aliases.iter().map(|a| format!("`{}{}`", prefix, a)).collect();
            text.push_str(&format!(" (aliases: {})", aliases.join(", ")));
        }
        text.push('\n');
    }
    text.push_str(&format!(
        "\n**Notes:**\n\
        • Most commands can be used once every {} seconds\n\
        • `{}copulate` only works in NSFW channels and needs a yes from the other person\n\
        • `{}help` - Show this help message",
        cooldown_secs, prefix, prefix
    ));
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_hides_hidden_commands() {
        let text = help_text("^", 5);
        assert!(text.contains("`^hug @user`"));
        assert!(text.contains("`^snuggle`"));
        assert!(text.contains("every 5 seconds"));
        assert!(!text.contains("^kill"));
        assert!(!text.contains("^sleep"));
        assert!(!text.contains("^eat"));
    }
}
