// handshake.rs - Propose / await reply / resolve state machine
// A proposal starts in `Proposed` and moves exactly once to one of the three
// terminal states. Expiry is an ordinary transition, not an error.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

use crate::acceptance::{AcceptanceCheck, Answer, Reply};

/// Default time a target has to answer a proposal
pub const PROPOSAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Source of messages posted after a proposal was made
#[async_trait]
pub trait ReplySource: Send {
    /// Next message, or `None` once no more can arrive
    async fn next_reply(&mut self) -> Option<Reply>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Proposed,
    Accepted,
    Declined,
    Expired,
}

#[derive(Debug)]
pub struct Handshake {
    check: AcceptanceCheck,
    state: HandshakeState,
}

impl Handshake {
    pub fn propose(check: AcceptanceCheck) -> Self {
        Self {
            check,
            state: HandshakeState::Proposed,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn is_resolved(&self) -> bool {
        self.state != HandshakeState::Proposed
    }

    /// Feed a reply in. Returns true if it resolved the proposal.
    pub fn offer(&mut self, reply: &Reply) -> bool {
        if self.is_resolved() {
            return false;
        }
        match self.check.check(reply) {
            Some(Answer::Yes) => self.state = HandshakeState::Accepted,
            Some(Answer::No) => self.state = HandshakeState::Declined,
            None => return false,
        }
        true
    }

    /// Close an unanswered proposal
    pub fn expire(&mut self) {
        if !self.is_resolved() {
            self.state = HandshakeState::Expired;
        }
    }
}

/// Drive a proposal until it is answered, the window closes, or the
/// source runs dry.
pub async fn await_answer<S>(mut handshake: Handshake, replies: &mut S, window: Duration) -> HandshakeState
where
    S: ReplySource + ?Sized,
{
    let deadline = Instant::now() + window;
    let waited = tokio::time::timeout_at(deadline, async {
        while let Some(reply) = replies.next_reply().await {
            if handshake.offer(&reply) {
                break;
            }
        }
    })
    .await;

    if waited.is_err() {
        log::debug!("[HANDSHAKE] No answer from {} within {:?}", handshake.check.responder(), window);
    }
    handshake.expire();
    handshake.state()
}
