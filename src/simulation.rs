// simulation.rs - Core logic for the simulation commands
// Everything here is independent of the Discord gateway: the command adapters
// in commands/simulation.rs build an `Invocation`, hand over an `Outbox` and a
// `ReplySource`, and this module decides what gets said.
//
// Key Features:
// - One reply per command, chosen from the templates in responses.rs
// - Relationship-aware kiss/copulate branching through a RelationshipOracle
// - The copulate handshake: NSFW gate, consent catches, family policy, proposal, answer

use async_trait::async_trait;
use rand::RngCore;
use serenity::model::{
    id::{ChannelId, GuildId, UserId},
    user::User,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::acceptance::AcceptanceCheck;
use crate::copulate_text::HandshakeText;
use crate::error::SimulationError;
use crate::family::{Relation, RelationshipOracle};
use crate::handshake::{await_answer, Handshake, HandshakeState, ReplySource};
use crate::responses::{self, choose};

// ============================================================================
// INVOCATION CONTEXT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: UserId,
    pub mention: String,
    pub bot: bool,
}

impl Participant {
    pub fn new(id: UserId, bot: bool) -> Self {
        Self {
            id,
            mention: format!("<@{}>", id.0),
            bot,
        }
    }
}

impl From<&User> for Participant {
    fn from(user: &User) -> Self {
        Participant::new(user.id, user.bot)
    }
}

/// Who invoked what, where
#[derive(Debug, Clone)]
pub struct Invocation {
    pub author: Participant,
    pub target: Option<Participant>,
    pub channel: ChannelId,
    pub guild: Option<GuildId>,
    pub nsfw: bool,
    pub bot_id: UserId,
}

impl Invocation {
    fn required_target(&self) -> Result<&Participant, SimulationError> {
        self.target.as_ref().ok_or(SimulationError::MissingArgument("user"))
    }

    fn targets_self(&self) -> bool {
        self.target.as_ref().map_or(false, |t| t.id == self.author.id)
    }
}

// ============================================================================
// COMMAND TABLE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Hug,
    Kiss,
    Slap,
    Punch,
    Cookie,
    Poke,
    Stab,
    Kill,
    Eat,
    Sleep,
    Copulate,
}

impl Verb {
    pub const ALL: [Verb; 11] = [
        Verb::Hug,
        Verb::Kiss,
        Verb::Slap,
        Verb::Punch,
        Verb::Cookie,
        Verb::Poke,
        Verb::Stab,
        Verb::Kill,
        Verb::Eat,
        Verb::Sleep,
        Verb::Copulate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Verb::Hug => "hug",
            Verb::Kiss => "kiss",
            Verb::Slap => "slap",
            Verb::Punch => "punch",
            Verb::Cookie => "cookie",
            Verb::Poke => "poke",
            Verb::Stab => "stab",
            Verb::Kill => "kill",
            Verb::Eat => "eat",
            Verb::Sleep => "sleep",
            Verb::Copulate => "copulate",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Verb::Hug => &["snuggle"],
            Verb::Kill => &["murder"],
            Verb::Eat => &["vore"],
            Verb::Copulate => &["intercourse", "fuck", "smash"],
            _ => &[],
        }
    }

    /// Look a verb up by its name or one of its aliases, case-insensitively
    pub fn from_name(name: &str) -> Option<Verb> {
        let name = name.to_lowercase();
        Verb::ALL
            .into_iter()
            .find(|verb| verb.name() == name || verb.aliases().contains(&name.as_str()))
    }

    pub fn description(self) -> &'static str {
        match self {
            Verb::Hug => "Hugs a mentioned user",
            Verb::Kiss => "Kisses a mentioned user",
            Verb::Slap => "Slaps a mentioned user",
            Verb::Punch => "Punches a mentioned user",
            Verb::Cookie => "Gives a cookie to a mentioned user",
            Verb::Poke => "Pokes a given user",
            Verb::Stab => "Stabs a mentioned user",
            Verb::Kill => "Kills a person :/",
            Verb::Eat => "Eats a person OwO",
            Verb::Sleep => "Todd Howard strikes once more",
            Verb::Copulate => "Lets you... um... heck someone",
        }
    }

    pub fn hidden(self) -> bool {
        matches!(self, Verb::Kill | Verb::Eat | Verb::Sleep)
    }

    pub fn takes_target(self) -> bool {
        !matches!(self, Verb::Sleep)
    }
}

// ============================================================================
// DEPENDENCIES
// ============================================================================

/// Collaborators and policy handed to every simulation command
pub struct SimulationEnv {
    pub oracle: Arc<dyn RelationshipOracle>,
    pub text: Arc<dyn HandshakeText>,
    pub family_pairing_guilds: HashSet<GuildId>,
    pub proposal_timeout: Duration,
}

impl SimulationEnv {
    /// DMs never allow family pairing
    pub fn allows_family_pairing(&self, guild: Option<GuildId>) -> bool {
        guild.map_or(false, |g| self.family_pairing_guilds.contains(&g))
    }

    pub fn relation(&self, author: &Participant, target: &Participant) -> Relation {
        Relation::from_label(self.oracle.relation(author.id, target.id).as_deref())
    }
}

/// Where replies go
#[async_trait]
pub trait Outbox: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), SimulationError>;
}

// ============================================================================
// ONE-SHOT COMMANDS
// ============================================================================

/// Build the reply for every command except copulate
pub fn reply(
    verb: Verb,
    inv: &Invocation,
    env: &SimulationEnv,
    rng: &mut dyn RngCore,
) -> Result<String, SimulationError> {
    let is_self = inv.targets_self();
    let set = match verb {
        Verb::Hug => responses::hug(&inv.required_target()?.mention, is_self),
        Verb::Slap => responses::slap(&inv.required_target()?.mention, is_self),
        Verb::Punch => responses::punch(&inv.required_target()?.mention, is_self),
        Verb::Cookie => responses::cookie(&inv.required_target()?.mention, is_self),
        Verb::Poke => responses::poke(&inv.required_target()?.mention, is_self),
        Verb::Stab => responses::stab(&inv.required_target()?.mention, is_self),
        Verb::Eat => responses::eat(&inv.required_target()?.mention),
        Verb::Kill => responses::kill(),
        Verb::Sleep => return Ok(responses::SLEEP.to_string()),
        Verb::Kiss => {
            let target = inv.required_target()?;
            if is_self {
                return Ok(responses::KISS_SELF.to_string());
            }
            match env.relation(&inv.author, target) {
                Relation::None | Relation::Partner => responses::kiss(&target.mention),
                Relation::Family(_) => responses::kiss_family(),
            }
        }
        Verb::Copulate => {
            return Err(SimulationError::Unexpected(
                "copulate needs a live channel to wait for an answer".to_string(),
            ))
        }
    };
    Ok(choose(&set, rng))
}

// ============================================================================
// COPULATE HANDSHAKE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopulateOutcome {
    NotNsfw,
    Blocked,
    Related,
    Finished(HandshakeState),
}

/// Run the copulate flow. `replies` must already be listening so an answer
/// sent right after the proposal is seen.
pub async fn copulate<O, S>(
    inv: &Invocation,
    env: &SimulationEnv,
    outbox: &O,
    replies: &mut S,
    rng: &mut (dyn RngCore + Send),
) -> Result<CopulateOutcome, SimulationError>
where
    O: Outbox + ?Sized,
    S: ReplySource + ?Sized,
{
    let target = inv.required_target()?;
    let author = &inv.author;

    if !inv.nsfw {
        outbox.send(responses::NOT_NSFW).await?;
        return Ok(CopulateOutcome::NotNsfw);
    }

    let blocked = env.text.process(author, target, inv.bot_id, rng);
    if let Some(text) = blocked {
        outbox.send(&text).await?;
        return Ok(CopulateOutcome::Blocked);
    }

    if env.relation(author, target).is_family() && !env.allows_family_pairing(inv.guild) {
        let text = env.text.target_is_relation(author, target, rng);
        outbox.send(&text).await?;
        return Ok(CopulateOutcome::Related);
    }

    let proposal = env.text.valid_target(author, target, rng);
    outbox.send(&proposal).await?;

    let handshake = Handshake::propose(AcceptanceCheck::new(target.id, inv.channel));
    let state = await_answer(handshake, replies, env.proposal_timeout).await;

    match state {
        HandshakeState::Accepted => {
            let text = env.text.request_accepted(author, target, rng);
            outbox.send(&text).await?;
        }
        HandshakeState::Declined => {
            let text = env.text.request_denied(author, target, rng);
            outbox.send(&text).await?;
        }
        HandshakeState::Expired | HandshakeState::Proposed => {
            let text = env.text.proposal_timed_out(author, target, rng);
            if let Err(e) = outbox.send(&text).await {
                log::warn!("[SIMULATION] Could not send proposal timeout notice: {}", e);
            }
        }
    }
    Ok(CopulateOutcome::Finished(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptance::Reply;
    use crate::copulate_text::CopulateText;
    use crate::family::{FamilyTree, FamilyTreeMember};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    const AUTHOR: u64 = 1;
    const TARGET: u64 = 2;
    const SIBLING: u64 = 3;
    const PARTNER: u64 = 4;
    const BOT: u64 = 99;
    const CHANNEL: u64 = 10;
    const GUILD: u64 = 500;

    #[derive(Default)]
    struct RecordingOutbox {
        sent: Mutex<Vec<String>>,
        attempts: Mutex<usize>,
        fail_from: Option<usize>,
    }

    impl RecordingOutbox {
        fn failing_from(n: usize) -> Self {
            Self {
                fail_from: Some(n),
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }

        fn attempts(&self) -> usize {
            *self.attempts.lock().unwrap()
        }
    }

    #[async_trait]
    impl Outbox for RecordingOutbox {
        async fn send(&self, text: &str) -> Result<(), SimulationError> {
            let attempt = {
                let mut attempts = self.attempts.lock().unwrap();
                *attempts += 1;
                *attempts
            };
            if self.fail_from.map_or(false, |n| attempt >= n) {
                return Err(SimulationError::Unexpected("send failed".to_string()));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    // Holds its own sender so an empty source waits out the window
    struct ChannelReplies(mpsc::Receiver<Reply>, mpsc::Sender<Reply>);

    #[async_trait]
    impl ReplySource for ChannelReplies {
        async fn next_reply(&mut self) -> Option<Reply> {
            self.0.recv().await
        }
    }

    fn env(pairing_allowed: bool) -> SimulationEnv {
        let tree = FamilyTree::from_members(vec![
            FamilyTreeMember {
                id: 100,
                children: vec![AUTHOR, SIBLING],
                ..Default::default()
            },
            FamilyTreeMember {
                id: AUTHOR,
                partner: Some(PARTNER),
                ..Default::default()
            },
        ]);
        let mut guilds = HashSet::new();
        if pairing_allowed {
            guilds.insert(GuildId(GUILD));
        }
        SimulationEnv {
            oracle: Arc::new(tree),
            text: Arc::new(CopulateText),
            family_pairing_guilds: guilds,
            proposal_timeout: Duration::from_millis(50),
        }
    }

    fn invocation(target: Option<u64>, nsfw: bool) -> Invocation {
        Invocation {
            author: Participant::new(UserId(AUTHOR), false),
            target: target.map(|id| Participant::new(UserId(id), id == BOT)),
            channel: ChannelId(CHANNEL),
            guild: Some(GuildId(GUILD)),
            nsfw,
            bot_id: UserId(BOT),
        }
    }

    fn replies(answers: &[(u64, &str)]) -> ChannelReplies {
        let (tx, rx) = mpsc::channel(16);
        for (author, content) in answers {
            tx.try_send(Reply {
                author: UserId(*author),
                channel: ChannelId(CHANNEL),
                content: content.to_string(),
            })
            .unwrap();
        }
        ChannelReplies(rx, tx)
    }

    #[test]
    fn test_self_target_uses_self_text() {
        let env = env(false);
        let inv = invocation(Some(AUTHOR), false);
        let mut rng = StdRng::seed_from_u64(5);
        let cases = [
            (Verb::Hug, responses::hug("", true)),
            (Verb::Slap, responses::slap("", true)),
            (Verb::Punch, responses::punch("", true)),
            (Verb::Cookie, responses::cookie("", true)),
            (Verb::Poke, responses::poke("", true)),
            (Verb::Stab, responses::stab("", true)),
        ];
        for (verb, self_set) in cases {
            for _ in 0..20 {
                let text = reply(verb, &inv, &env, &mut rng).unwrap();
                assert!(self_set.contains(&text), "{:?} gave {}", verb, text);
            }
        }
        assert_eq!(reply(Verb::Kiss, &inv, &env, &mut rng).unwrap(), responses::KISS_SELF);
    }

    #[test]
    fn test_other_target_mentions_them() {
        let env = env(false);
        let inv = invocation(Some(TARGET), false);
        let mut rng = StdRng::seed_from_u64(8);
        assert_eq!(reply(Verb::Hug, &inv, &env, &mut rng).unwrap(), "*Hugs <@2>*");
        assert_eq!(reply(Verb::Punch, &inv, &env, &mut rng).unwrap(), "*Punches <@2> right in the nose*");
        assert_eq!(reply(Verb::Kiss, &inv, &env, &mut rng).unwrap(), "*Kisses <@2>*");
        let stab = responses::stab("<@2>", false);
        for _ in 0..50 {
            assert!(stab.contains(&reply(Verb::Stab, &inv, &env, &mut rng).unwrap()));
        }
    }

    #[test]
    fn test_kiss_branches_on_relation() {
        let env = env(false);
        let mut rng = StdRng::seed_from_u64(13);
        let family = responses::kiss_family();
        for _ in 0..20 {
            let text = reply(Verb::Kiss, &invocation(Some(SIBLING), false), &env, &mut rng).unwrap();
            assert!(family.contains(&text));
        }
        assert_eq!(
            reply(Verb::Kiss, &invocation(Some(PARTNER), false), &env, &mut rng).unwrap(),
            "*Kisses <@4>*"
        );
    }

    #[test]
    fn test_missing_target() {
        let env = env(false);
        let inv = invocation(None, true);
        let mut rng = StdRng::seed_from_u64(1);
        for verb in [Verb::Hug, Verb::Kiss, Verb::Slap, Verb::Punch, Verb::Cookie, Verb::Poke, Verb::Stab, Verb::Eat] {
            assert!(matches!(
                reply(verb, &inv, &env, &mut rng),
                Err(SimulationError::MissingArgument(_))
            ));
        }
        assert!(kill_and_sleep_work_without_target(&inv, &env, &mut rng));
    }

    fn kill_and_sleep_work_without_target(inv: &Invocation, env: &SimulationEnv, rng: &mut StdRng) -> bool {
        let kill = reply(Verb::Kill, inv, env, rng).unwrap();
        let sleep = reply(Verb::Sleep, inv, env, rng).unwrap();
        responses::kill().contains(&kill) && sleep == responses::SLEEP
    }

    #[test]
    fn test_verb_lookup() {
        assert_eq!(Verb::from_name("SNUGGLE"), Some(Verb::Hug));
        assert_eq!(Verb::from_name("smash"), Some(Verb::Copulate));
        assert_eq!(Verb::from_name("murder"), Some(Verb::Kill));
        assert_eq!(Verb::from_name("dance"), None);
    }

    #[tokio::test]
    async fn test_copulate_missing_target_sends_nothing() {
        let outbox = RecordingOutbox::default();
        let mut source = replies(&[]);
        let mut rng = StdRng::seed_from_u64(1);
        let result = copulate(&invocation(None, true), &env(false), &outbox, &mut source, &mut rng).await;
        assert!(matches!(result, Err(SimulationError::MissingArgument(_))));
        assert!(outbox.sent().is_empty());
    }

    #[tokio::test]
    async fn test_copulate_requires_nsfw() {
        let outbox = RecordingOutbox::default();
        let mut source = replies(&[]);
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = copulate(&invocation(Some(TARGET), false), &env(false), &outbox, &mut source, &mut rng)
            .await
            .unwrap();
        assert_eq!(outcome, CopulateOutcome::NotNsfw);
        assert_eq!(outbox.sent(), vec![responses::NOT_NSFW.to_string()]);
    }

    #[tokio::test]
    async fn test_copulate_blocks_bot_and_self() {
        for target in [BOT, AUTHOR] {
            let outbox = RecordingOutbox::default();
            let mut source = replies(&[]);
            let mut rng = StdRng::seed_from_u64(2);
            let outcome = copulate(&invocation(Some(target), true), &env(false), &outbox, &mut source, &mut rng)
                .await
                .unwrap();
            assert_eq!(outcome, CopulateOutcome::Blocked);
            assert_eq!(outbox.sent().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_family_short_circuits_before_proposal() {
        let outbox = RecordingOutbox::default();
        let mut source = replies(&[(SIBLING, "yes")]);
        let mut rng = StdRng::seed_from_u64(3);
        let outcome = copulate(&invocation(Some(SIBLING), true), &env(false), &outbox, &mut source, &mut rng)
            .await
            .unwrap();
        assert_eq!(outcome, CopulateOutcome::Related);
        let sent = outbox.sent();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].contains("(yes/no)"));
    }

    #[tokio::test]
    async fn test_family_allowed_by_guild_policy() {
        let outbox = RecordingOutbox::default();
        let mut source = replies(&[(SIBLING, "sure")]);
        let mut rng = StdRng::seed_from_u64(3);
        let outcome = copulate(&invocation(Some(SIBLING), true), &env(true), &outbox, &mut source, &mut rng)
            .await
            .unwrap();
        assert_eq!(outcome, CopulateOutcome::Finished(HandshakeState::Accepted));
    }

    #[tokio::test]
    async fn test_accept_and_decline_follow_proposal() {
        for (answer, expected) in [("yes", HandshakeState::Accepted), ("no", HandshakeState::Declined)] {
            let outbox = RecordingOutbox::default();
            let mut source = replies(&[(AUTHOR, "yes"), (TARGET, answer)]);
            let mut rng = StdRng::seed_from_u64(4);
            let outcome = copulate(&invocation(Some(TARGET), true), &env(false), &outbox, &mut source, &mut rng)
                .await
                .unwrap();
            assert_eq!(outcome, CopulateOutcome::Finished(expected));
            let sent = outbox.sent();
            assert_eq!(sent.len(), 2);
            assert!(sent[0].contains("(yes/no)"));
            assert!(!sent[1].contains("(yes/no)"));
        }
    }

    #[tokio::test]
    async fn test_timeout_sends_one_notice() {
        let outbox = RecordingOutbox::default();
        let mut source = replies(&[(TARGET, "maybe")]);
        let mut rng = StdRng::seed_from_u64(6);
        let outcome = copulate(&invocation(Some(TARGET), true), &env(false), &outbox, &mut source, &mut rng)
            .await
            .unwrap();
        assert_eq!(outcome, CopulateOutcome::Finished(HandshakeState::Expired));
        assert_eq!(outbox.attempts(), 2);
        assert_eq!(outbox.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_timeout_notice_failure_is_swallowed() {
        let outbox = RecordingOutbox::failing_from(2);
        let mut source = replies(&[]);
        let mut rng = StdRng::seed_from_u64(6);
        let outcome = copulate(&invocation(Some(TARGET), true), &env(false), &outbox, &mut source, &mut rng)
            .await
            .unwrap();
        assert_eq!(outcome, CopulateOutcome::Finished(HandshakeState::Expired));
        assert_eq!(outbox.attempts(), 2);
        assert_eq!(outbox.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_proposal_propagates_without_waiting() {
        let outbox = RecordingOutbox::failing_from(1);
        let mut source = replies(&[(TARGET, "yes")]);
        let mut rng = StdRng::seed_from_u64(6);
        let result = copulate(&invocation(Some(TARGET), true), &env(false), &outbox, &mut source, &mut rng).await;
        assert!(result.is_err());
        assert_eq!(outbox.attempts(), 1);
    }
}
