// acceptance.rs - Consent check for the copulate handshake
// Decides whether a message is a yes or a no from the person who was asked.

use once_cell::sync::Lazy;
use regex::Regex;
use serenity::model::id::{ChannelId, UserId};

static TRAILING_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s.!?~,]+$").expect("static regex"));

const YES: &[&str] = &[
    "yes", "yeah", "yea", "ye", "yep", "yup", "sure", "ok", "okay", "y", "accept", "i accept",
    "i do", "of course", "absolutely",
];

const NO: &[&str] = &[
    "no", "nah", "nope", "n", "deny", "decline", "i decline", "no thanks", "never",
];

/// A message seen while waiting on a proposal
#[derive(Debug, Clone)]
pub struct Reply {
    pub author: UserId,
    pub channel: ChannelId,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

/// Decides whether a reply answers a proposal made to `responder` in `channel`
#[derive(Debug, Clone, Copy)]
pub struct AcceptanceCheck {
    responder: UserId,
    channel: ChannelId,
}

impl AcceptanceCheck {
    pub fn new(responder: UserId, channel: ChannelId) -> Self {
        Self { responder, channel }
    }

    pub fn responder(&self) -> UserId {
        self.responder
    }

    /// `None` when the reply doesn't qualify as an answer
    pub fn check(&self, reply: &Reply) -> Option<Answer> {
        if reply.author != self.responder || reply.channel != self.channel {
            return None;
        }
        let lowered = reply.content.trim().to_lowercase();
        let stripped = TRAILING_PUNCTUATION.replace(&lowered, "");
        let normalized: &str = &stripped;
        if YES.contains(&normalized) {
            Some(Answer::Yes)
        } else if NO.contains(&normalized) {
            Some(Answer::No)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(author: u64, channel: u64, content: &str) -> Reply {
        Reply {
            author: UserId(author),
            channel: ChannelId(channel),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_answers() {
        let check = AcceptanceCheck::new(UserId(2), ChannelId(10));
        assert_eq!(check.check(&reply(2, 10, "Yes!")), Some(Answer::Yes));
        assert_eq!(check.check(&reply(2, 10, "  of course...")), Some(Answer::Yes));
        assert_eq!(check.check(&reply(2, 10, "NOPE")), Some(Answer::No));
        assert_eq!(check.check(&reply(2, 10, "no thanks.")), Some(Answer::No));
    }

    #[test]
    fn test_non_answers() {
        let check = AcceptanceCheck::new(UserId(2), ChannelId(10));
        assert_eq!(check.check(&reply(2, 10, "what?")), None);
        assert_eq!(check.check(&reply(2, 10, "yesterday")), None);
        assert_eq!(check.check(&reply(3, 10, "yes")), None);
        assert_eq!(check.check(&reply(2, 11, "yes")), None);
    }
}
