// responses.rs - Canned response templates for the simulation commands
// Every reply a simulation command can send is built here from a static
// template set. Selection is a pure function of the set and an RNG so tests can
// seed it.

use rand::seq::SliceRandom;
use rand::Rng;

/// Pick one template uniformly at random.
/// An empty set yields an empty string; every set defined here is non-empty.
pub fn choose<R: Rng + ?Sized>(templates: &[String], rng: &mut R) -> String {
    templates.choose(rng).cloned().unwrap_or_default()
}

pub fn hug(target: &str, is_self: bool) -> Vec<String> {
    if is_self {
        vec!["*You hug yourself... and start crying.*".to_string()]
    } else {
        vec![format!("*Hugs {}*", target)]
    }
}

pub const KISS_SELF: &str = "How would you even manage to do that?";

pub fn kiss(target: &str) -> Vec<String> {
    vec![format!("*Kisses {}*", target)]
}

pub fn kiss_family() -> Vec<String> {
    vec![
        "Woah woah, you two are family!".to_string(),
        "Incest is wincest, I guess.".to_string(),
        "You two are related but go off I guess.".to_string(),
    ]
}

pub fn slap(target: &str, is_self: bool) -> Vec<String> {
    if is_self {
        vec!["*You slapped yourself... for some reason.*".to_string()]
    } else {
        vec![format!("*Slaps {}*", target)]
    }
}

pub fn punch(target: &str, is_self: bool) -> Vec<String> {
    if is_self {
        vec!["*You punched yourself... for some reason.*".to_string()]
    } else {
        vec![format!("*Punches {} right in the nose*", target)]
    }
}

pub fn cookie(target: &str, is_self: bool) -> Vec<String> {
    if is_self {
        vec!["*You gave yourself a cookie.*".to_string()]
    } else {
        vec![format!("*Gives {} a cookie*", target)]
    }
}

pub fn poke(target: &str, is_self: bool) -> Vec<String> {
    if is_self {
        vec!["You poke yourself.".to_string()]
    } else {
        vec![format!("*Pokes {}.*", target)]
    }
}

pub fn stab(target: &str, is_self: bool) -> Vec<String> {
    if is_self {
        vec![
            "You stab yourself.".to_string(),
            "Looks like you don't have a knife, oops!".to_string(),
            "No.".to_string(),
        ]
    } else {
        vec![
            format!("You stab {}.", target),
            format!("{} has been stabbed.", target),
            format!("*stabs {}.*", target),
            "Looks like you don't have a knife, oops!".to_string(),
            "You can't legally stab someone without their consent.".to_string(),
            "Stab? Isn't that, like, illegal?".to_string(),
            "I wouldn't recommend doing that tbh.".to_string(),
        ]
    }
}

pub fn kill() -> Vec<String> {
    vec![
        "That would violate at least one of the laws of robotics.".to_string(),
        "I am a text-based bot. I cannot kill.".to_string(),
        "Unfortunately, murder isn't supported in this version of the bot.".to_string(),
        "Haha good joke there, but I'd never kill a person! >.>".to_string(),
        "To my knowledge, you can't kill via the internet. Let me know when that changes.".to_string(),
        "I am designed to bring people together, not murder them.".to_string(),
    ]
}

pub fn eat(target: &str) -> Vec<String> {
    vec![
        format!("You swallowed {}... through the wrong hole.", target),
        format!("You've eaten {}. Gross.", target),
        format!("Are you into this or something? You've eaten {}.", target),
        format!("I guess lunch wasnt good enough. You eat {}.", target),
        format!("You insert {} into your mouth and proceed to digest them.", target),
    ]
}

pub const SLEEP: &str = "You sleep for a while and when you wake up you're in a cart \
                         with your hands bound. A man says \"Hey, you. You're finally \
                         awake. You were trying to cross the border, right?\"";

pub const NOT_NSFW: &str = "This command can't be run in a non-NSFW channel.";
