// simulation.rs - Simulation Command Module
// Discord adapters for the social-simulation commands. Each #[command] resolves
// the target argument, builds an Invocation and hands it to crate::simulation.
//
// Key Features:
// - Target resolution from mentions, raw ids or member names
// - Per-user cooldown through the "simulation" bucket
// - Readiness check on commands that consult the family tree
// - Reply collector wiring for the copulate handshake
//
// Used by: main.rs (command registration), commands/hooks.rs (owner re-invocation)

// ============================================================================
// IMPORTS
// ============================================================================

use async_trait::async_trait;
use futures_util::StreamExt;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use regex::Regex;
use serenity::{
    client::Context,
    collector::{MessageCollector, MessageCollectorBuilder},
    framework::standard::{macros::command, Args, CommandResult, Delimiter},
    http::Http,
    model::{
        channel::Message,
        id::{ChannelId, UserId},
    },
};
use std::sync::Arc;

use super::checks::READY_CHECK;
use super::simulation_state;
use crate::acceptance::Reply;
use crate::error::SimulationError;
use crate::handshake::ReplySource;
use crate::simulation::{self, Invocation, Outbox, Participant, Verb};

static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<@!?(\d+)>$").expect("static regex"));

// ============================================================================
// COMMANDS
// ============================================================================

#[command]
#[aliases("snuggle")]
#[bucket = "simulation"]
/// Hugs a mentioned user
pub async fn hug(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    run(ctx, msg, args, Verb::Hug).await
}

#[command]
#[checks(Ready)]
#[bucket = "simulation"]
/// Kisses a mentioned user
pub async fn kiss(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    run(ctx, msg, args, Verb::Kiss).await
}

#[command]
#[bucket = "simulation"]
/// Slaps a mentioned user
pub async fn slap(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    run(ctx, msg, args, Verb::Slap).await
}

#[command]
#[bucket = "simulation"]
/// Punches a mentioned user
pub async fn punch(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    run(ctx, msg, args, Verb::Punch).await
}

#[command]
#[bucket = "simulation"]
/// Gives a cookie to a mentioned user
pub async fn cookie(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    run(ctx, msg, args, Verb::Cookie).await
}

#[command]
#[bucket = "simulation"]
/// Pokes a given user
pub async fn poke(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    run(ctx, msg, args, Verb::Poke).await
}

#[command]
#[bucket = "simulation"]
/// Stabs a mentioned user
pub async fn stab(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    run(ctx, msg, args, Verb::Stab).await
}

#[command]
#[aliases("murder")]
#[help_available(false)]
pub async fn kill(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    run(ctx, msg, args, Verb::Kill).await
}

#[command]
#[aliases("vore")]
#[help_available(false)]
pub async fn eat(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    run(ctx, msg, args, Verb::Eat).await
}

#[command]
#[help_available(false)]
pub async fn sleep(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    run(ctx, msg, args, Verb::Sleep).await
}

#[command]
#[aliases("intercourse", "fuck", "smash")]
#[checks(Ready)]
#[bucket = "simulation"]
/// Lets you... um... heck someone
/// Needs an NSFW channel and a yes from the target within the proposal window
pub async fn copulate(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    run(ctx, msg, args, Verb::Copulate).await
}

// ============================================================================
// DISPATCH
// ============================================================================

/// Shared body of every simulation command
pub async fn run(ctx: &Context, msg: &Message, mut args: Args, verb: Verb) -> CommandResult {
    let (_, env) = simulation_state(ctx).await?;

    let target = if verb.takes_target() {
        resolve_target(ctx, msg, &mut args).await?
    } else {
        None
    };

    if verb == Verb::Copulate {
        let nsfw = match msg.channel_id.to_channel(ctx).await {
            Ok(channel) => channel.is_nsfw(),
            Err(e) => {
                log::warn!("[SIMULATION] Could not fetch channel {}: {}", msg.channel_id, e);
                false
            }
        };
        let inv = invocation(ctx, msg, target, nsfw);

        // Listen before proposing so an instant answer isn't lost
        let mut replies = CollectorReplies::listen(ctx, &inv);
        let outbox = ChannelOutbox {
            http: ctx.http.clone(),
            channel: msg.channel_id,
        };
        let mut rng = StdRng::from_entropy();
        let outcome = simulation::copulate(&inv, &env, &outbox, &mut replies, &mut rng).await?;
        log::info!(
            "[SIMULATION] copulate by {} ({}) ended with {:?}",
            msg.author.name,
            msg.author.id,
            outcome
        );
        return Ok(());
    }

    let inv = invocation(ctx, msg, target, false);
    let text = if verb == Verb::Kiss {
        // Relationship lookups can be slow on big trees
        let _typing = ctx.http.start_typing(msg.channel_id.0)?;
        let mut rng = StdRng::from_entropy();
        simulation::reply(verb, &inv, &env, &mut rng)?
    } else {
        let mut rng = StdRng::from_entropy();
        simulation::reply(verb, &inv, &env, &mut rng)?
    };

    msg.channel_id.say(&ctx.http, text).await?;
    Ok(())
}

/// Run a command again by name, outside the framework (no bucket, no checks)
pub async fn reinvoke(ctx: &Context, msg: &Message, command_name: &str, prefix: &str) -> CommandResult {
    let verb = Verb::from_name(command_name).ok_or_else(|| {
        SimulationError::Unexpected(format!("cannot reinvoke unknown command '{}'", command_name))
    })?;
    let rest = command_args(&msg.content, prefix);
    let args = Args::new(rest, &[Delimiter::Single(' ')]);
    log::info!(
        "[SIMULATION] Reinvoking '{}' for owner {} ({})",
        command_name,
        msg.author.name,
        msg.author.id
    );
    run(ctx, msg, args, verb).await
}

// ============================================================================
// ARGUMENT HANDLING
// ============================================================================

/// Text following `<prefix><command>` in a message
pub fn command_args<'a>(content: &'a str, prefix: &str) -> &'a str {
    let body = content.trim_start();
    let body = body.strip_prefix(prefix).unwrap_or(body).trim_start();
    match body.find(char::is_whitespace) {
        Some(end) => body[end..].trim(),
        None => "",
    }
}

/// A mention (`<@id>`, `<@!id>`) or a bare numeric id
pub fn parse_user_token(token: &str) -> Option<UserId> {
    let token = token.trim();
    let digits = match MENTION.captures(token) {
        Some(caps) => caps.get(1).map(|m| m.as_str())?,
        None => token,
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok().map(UserId)
}

/// What the first argument asks us to look up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetLookup {
    Id { token: String, id: UserId },
    Name(String),
}

impl TargetLookup {
    /// Read the first argument only; anything after it is ignored.
    /// A double-quoted argument may contain spaces.
    pub fn from_args(rest: &str) -> Option<Self> {
        let token = first_argument(rest);
        if token.is_empty() {
            return None;
        }
        Some(match parse_user_token(token) {
            Some(id) => TargetLookup::Id {
                token: token.to_string(),
                id,
            },
            None => TargetLookup::Name(token.to_string()),
        })
    }

    pub fn token(&self) -> &str {
        match self {
            TargetLookup::Id { token, .. } | TargetLookup::Name(token) => token,
        }
    }
}

fn first_argument(rest: &str) -> &str {
    let rest = rest.trim_start();
    if let Some(quoted) = rest.strip_prefix('"') {
        if let Some(end) = quoted.find('"') {
            return quoted[..end].trim();
        }
    }
    rest.split_whitespace().next().unwrap_or("")
}

/// A lookup that found nobody is a conversion failure naming the token
pub fn resolved_target(lookup: &TargetLookup, user: Option<Participant>) -> Result<Participant, SimulationError> {
    user.ok_or_else(|| SimulationError::BadArgument(lookup.token().to_string()))
}

/// Resolve the first argument to a user. No arguments means no target.
async fn resolve_target(ctx: &Context, msg: &Message, args: &mut Args) -> Result<Option<Participant>, SimulationError> {
    let Some(lookup) = TargetLookup::from_args(args.rest()) else {
        return Ok(None);
    };

    let user = match (&lookup, msg.guild_id) {
        (TargetLookup::Id { id, .. }, _) if msg.mentions.iter().any(|u| u.id == *id) => {
            msg.mentions.iter().find(|u| u.id == *id).cloned()
        }
        (TargetLookup::Id { id, .. }, Some(guild_id)) => guild_id.member(ctx, *id).await.ok().map(|m| m.user),
        (TargetLookup::Id { id, .. }, None) => id.to_user(ctx).await.ok(),
        (TargetLookup::Name(name), Some(guild_id)) => guild_id
            .to_guild_cached(ctx)
            .and_then(|guild| guild.member_named(name).map(|m| m.user.clone())),
        (TargetLookup::Name(_), None) => None,
    };

    resolved_target(&lookup, user.as_ref().map(Participant::from)).map(Some)
}

fn invocation(ctx: &Context, msg: &Message, target: Option<Participant>, nsfw: bool) -> Invocation {
    Invocation {
        author: Participant::from(&msg.author),
        target,
        channel: msg.channel_id,
        guild: msg.guild_id,
        nsfw,
        bot_id: ctx.cache.current_user_id(),
    }
}

// ============================================================================
// HANDSHAKE PLUMBING
// ============================================================================

struct ChannelOutbox {
    http: Arc<Http>,
    channel: ChannelId,
}

#[async_trait]
impl Outbox for ChannelOutbox {
    async fn send(&self, text: &str) -> Result<(), SimulationError> {
        self.channel.say(&self.http, text).await?;
        Ok(())
    }
}

/// Messages from the target in the invoking channel
struct CollectorReplies {
    collector: MessageCollector,
}

impl CollectorReplies {
    fn listen(ctx: &Context, inv: &Invocation) -> Self {
        let mut builder = MessageCollectorBuilder::new(ctx).channel_id(inv.channel);
        if let Some(target) = &inv.target {
            builder = builder.author_id(target.id);
        }
        Self {
            collector: builder.build(),
        }
    }
}

#[async_trait]
impl ReplySource for CollectorReplies {
    async fn next_reply(&mut self) -> Option<Reply> {
        let message = self.collector.next().await?;
        Some(Reply {
            author: message.author.id,
            channel: message.channel_id,
            content: message.content.clone(),
        })
    }
}
