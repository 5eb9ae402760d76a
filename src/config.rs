// config.rs - Bot configuration
// Reads botconfig.txt (KEY=VALUE) from the usual locations into a typed BotConfig.

use serenity::model::id::{GuildId, UserId};
use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::time::Duration;

use crate::handshake::PROPOSAL_TIMEOUT;

const CONFIG_PATHS: [&str; 4] = [
    "botconfig.txt",
    "../botconfig.txt",
    "../../botconfig.txt",
    "src/botconfig.txt",
];

pub const DEFAULT_PREFIX: &str = "^";
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Settings read from botconfig.txt
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub prefix: String,
    pub owners: HashSet<UserId>,
    pub cooldown: Duration,
    pub proposal_timeout: Duration,
    pub family_pairing_guilds: HashSet<GuildId>,
    pub family_tree_file: Option<String>,
}

impl BotConfig {
    pub fn from_map(config: &HashMap<String, String>) -> Result<Self, String> {
        let token = match config.get("DISCORD_TOKEN") {
            Some(token) if token == "YOUR_BOT_TOKEN_HERE" || token.is_empty() => {
                return Err("DISCORD_TOKEN in botconfig.txt is set to placeholder value".to_string());
            }
            Some(token) => token.clone(),
            None => return Err("DISCORD_TOKEN not found in botconfig.txt file".to_string()),
        };

        let prefix = config
            .get("PREFIX")
            .filter(|p| !p.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        let owners = parse_ids(config.get("BOT_OWNER_ID"), "BOT_OWNER_ID")?
            .into_iter()
            .map(UserId)
            .collect();
        let family_pairing_guilds = parse_ids(config.get("FAMILY_PAIRING_GUILDS"), "FAMILY_PAIRING_GUILDS")?
            .into_iter()
            .map(GuildId)
            .collect();

        let cooldown = parse_seconds(config.get("COOLDOWN_SECONDS"), "COOLDOWN_SECONDS")?
            .unwrap_or(DEFAULT_COOLDOWN);
        let proposal_timeout = parse_seconds(config.get("PROPOSAL_TIMEOUT_SECONDS"), "PROPOSAL_TIMEOUT_SECONDS")?
            .unwrap_or(PROPOSAL_TIMEOUT);

        let family_tree_file = config
            .get("FAMILY_TREE_FILE")
            .filter(|path| !path.is_empty())
            .cloned();

        Ok(Self {
            token,
            prefix,
            owners,
            cooldown,
            proposal_timeout,
            family_pairing_guilds,
            family_tree_file,
        })
    }

    pub fn is_owner(&self, user: UserId) -> bool {
        self.owners.contains(&user)
    }
}

/// Parse KEY=VALUE lines, skipping blanks and `#` comments
pub fn parse_config(content: &str) -> HashMap<String, String> {
    // Remove BOM if present
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut config = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(equals_pos) = line.find('=') {
            let key = line[..equals_pos].trim().to_string();
            let value = line[equals_pos + 1..].trim().to_string();
            config.insert(key, value);
        }
    }

    config
}

/// Read botconfig.txt with multi-path fallback and export its keys to the environment
pub fn load_bot_config() -> Result<BotConfig, String> {
    // Clear any existing relevant environment variables
    env::remove_var("DISCORD_TOKEN");
    env::remove_var("PREFIX");
    env::remove_var("RUST_LOG");

    for config_path in &CONFIG_PATHS {
        let content = match fs::read_to_string(config_path) {
            Ok(content) => content,
            Err(_) => continue,
        };

        let config = parse_config(&content);
        // Set environment variables for compatibility (env_logger reads RUST_LOG)
        for (key, value) in &config {
            env::set_var(key, value);
        }

        println!("✅ Configuration loaded from {}", config_path);
        return BotConfig::from_map(&config);
    }

    Err("No botconfig.txt file found in any expected location (., .., ../.., src/)".to_string())
}

fn parse_ids(value: Option<&String>, key: &str) -> Result<Vec<u64>, String> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<u64>()
                .map_err(|_| format!("{} contains an invalid id: '{}'", key, id))
        })
        .collect()
}

fn parse_seconds(value: Option<&String>, key: &str) -> Result<Option<Duration>, String> {
    match value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| format!("{} must be a whole number of seconds, got '{}'", key, v)),
    }
}
