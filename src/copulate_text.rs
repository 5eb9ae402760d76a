// copulate_text.rs - Text provider for the copulate handshake
// Supplies the early-exit catches and one message per handshake outcome.

use rand::RngCore;
use serenity::model::id::UserId;

use crate::responses::choose;
use crate::simulation::Participant;

/// Messages used by the copulate handshake
pub trait HandshakeText: Send + Sync {
    /// Text for targets that can never accept (the bot, yourself, other bots)
    fn process(&self, author: &Participant, target: &Participant, bot_id: UserId, rng: &mut dyn RngCore) -> Option<String>;
    fn target_is_relation(&self, author: &Participant, target: &Participant, rng: &mut dyn RngCore) -> String;
    fn valid_target(&self, author: &Participant, target: &Participant, rng: &mut dyn RngCore) -> String;
    fn proposal_timed_out(&self, author: &Participant, target: &Participant, rng: &mut dyn RngCore) -> String;
    fn request_denied(&self, author: &Participant, target: &Participant, rng: &mut dyn RngCore) -> String;
    fn request_accepted(&self, author: &Participant, target: &Participant, rng: &mut dyn RngCore) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CopulateText;

impl HandshakeText for CopulateText {
    fn process(&self, author: &Participant, target: &Participant, bot_id: UserId, rng: &mut dyn RngCore) -> Option<String> {
        let lines = if target.id == bot_id {
            vec![
                "Nice try, but I'm not that kind of bot.".to_string(),
                "Flattered, really. Still no.".to_string(),
                "I'm a bot. That's not how any of this works.".to_string(),
            ]
        } else if target.id == author.id {
            vec![
                "How would you even manage to do that?".to_string(),
                "You do that on your own time.".to_string(),
                "Just... don't.".to_string(),
            ]
        } else if target.bot {
            vec![
                format!("{} is a bot. Robots don't do that.", target.mention),
                "I don't think bots can consent.".to_string(),
            ]
        } else {
            return None;
        };
        Some(choose(&lines, rng))
    }

    fn target_is_relation(&self, _author: &Participant, target: &Participant, rng: &mut dyn RngCore) -> String {
        choose(
            &[
                format!("Woah woah, {} is family. This server doesn't allow that.", target.mention),
                "You two are related. Not happening here.".to_string(),
                "Family members? In this server? No.".to_string(),
            ],
            rng,
        )
    }

    fn valid_target(&self, author: &Participant, target: &Participant, rng: &mut dyn RngCore) -> String {
        choose(
            &[
                format!("{}, {} is asking if you'd like to... you know. Do you accept? (yes/no)", target.mention, author.mention),
                format!("Hey {}, {} wants to get frisky with you. What do you say? (yes/no)", target.mention, author.mention),
                format!("{}, looks like {} has their eye on you. Are you up for it? (yes/no)", target.mention, author.mention),
            ],
            rng,
        )
    }

    fn proposal_timed_out(&self, author: &Participant, target: &Participant, rng: &mut dyn RngCore) -> String {
        choose(
            &[
                format!("{}, looks like {} isn't interested right now. Maybe later.", author.mention, target.mention),
                format!("{} never answered, {}. Better luck next time.", target.mention, author.mention),
            ],
            rng,
        )
    }

    fn request_denied(&self, author: &Participant, target: &Participant, rng: &mut dyn RngCore) -> String {
        choose(
            &[
                format!("Sorry {}, {} said no.", author.mention, target.mention),
                format!("{} turned you down, {}. Ouch.", target.mention, author.mention),
                "Rejected. That's rough, buddy.".to_string(),
            ],
            rng,
        )
    }

    fn request_accepted(&self, author: &Participant, target: &Participant, rng: &mut dyn RngCore) -> String {
        choose(
            &[
                format!("{} and {} disappear into a room together... :smirk:", author.mention, target.mention),
                format!("*{} and {} go off somewhere private.*", author.mention, target.mention),
                format!("Looks like {} said yes! Have fun, {}.", target.mention, author.mention),
            ],
            rng,
        )
    }
}
