mod acceptance;
mod commands;
mod config;
mod copulate_text;
mod error;
mod family;
mod handshake;
mod responses;
mod simulation;

use serenity::{
    async_trait,
    client::{Client, Context, EventHandler},
    framework::standard::{buckets::LimitedFor, macros::group, StandardFramework},
    model::gateway::Ready,
    prelude::GatewayIntents,
    prelude::TypeMapKey,
};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;

use crate::config::BotConfig;
use crate::copulate_text::CopulateText;
use crate::family::FamilyTree;
use crate::simulation::SimulationEnv;

// Startup progress shared between the gateway handler, the readiness check and the console
pub struct BotStatus {
    tree_loaded: AtomicBool,
    connected: AtomicBool,
    ready_at: Mutex<Option<DateTime<Utc>>>,
}

impl BotStatus {
    pub fn new() -> Self {
        Self {
            tree_loaded: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            ready_at: Mutex::new(None),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.tree_loaded.load(Ordering::SeqCst) && self.connected.load(Ordering::SeqCst)
    }

    fn mark_tree_loaded(&self) {
        self.tree_loaded.store(true, Ordering::SeqCst);
    }

    fn mark_connected(&self) {
        self.connected.store(true, Ordering::SeqCst);
        if let Ok(mut ready_at) = self.ready_at.lock() {
            ready_at.get_or_insert_with(Utc::now);
        }
    }

    fn ready_at(&self) -> Option<DateTime<Utc>> {
        self.ready_at.lock().ok().and_then(|r| *r)
    }
}

// TypeMap key for the loaded configuration
pub struct BotConfigKey;
impl TypeMapKey for BotConfigKey {
    type Value = Arc<BotConfig>;
}

// TypeMap key for the simulation command dependencies
pub struct SimulationEnvKey;
impl TypeMapKey for SimulationEnvKey {
    type Value = Arc<SimulationEnv>;
}

// TypeMap key for startup progress
pub struct BotStatusKey;
impl TypeMapKey for BotStatusKey {
    type Value = Arc<BotStatus>;
}

// Import all command constants generated by the #[command] macro
use crate::commands::help::HELP_COMMAND;
use crate::commands::simulation::{
    COOKIE_COMMAND, COPULATE_COMMAND, EAT_COMMAND, HUG_COMMAND, KILL_COMMAND, KISS_COMMAND,
    POKE_COMMAND, PUNCH_COMMAND, SLAP_COMMAND, SLEEP_COMMAND, STAB_COMMAND,
};

// Command group declaration - includes all available commands
#[group]
#[owner_privilege(false)]
#[commands(hug, kiss, slap, punch, cookie, poke, stab, kill, eat, sleep, copulate, help)]
struct Simulation;

// Event handler implementation
struct Handler {
    status: Arc<BotStatus>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _: Context, ready: Ready) {
        self.status.mark_connected();
        log::info!("✅ Bot connected as {} to {} guilds", ready.user.name, ready.guilds.len());
        println!("✅ Bot connected as {}!", ready.user.name);
    }
}

fn load_family_tree(config: &BotConfig) -> FamilyTree {
    let Some(path) = &config.family_tree_file else {
        println!("🌳 No FAMILY_TREE_FILE configured - starting with an empty family tree");
        return FamilyTree::new();
    };
    match FamilyTree::load(path) {
        Ok(tree) => {
            if tree.is_empty() {
                log::warn!("[FAMILY] Family tree file {} has no members", path);
            }
            println!("🌳 Loaded {} family tree members from {}", tree.len(), path);
            tree
        }
        Err(e) => {
            log::error!("❌ Failed to load family tree from {}: {}", path, e);
            eprintln!("⚠️  Failed to load family tree from {}: {}", path, e);
            eprintln!("🔧 Starting with an empty family tree");
            FamilyTree::new()
        }
    }
}

async fn handle_command_line(shutdown_tx: mpsc::Sender<String>, status: Arc<BotStatus>) {
    use tokio::io::AsyncWriteExt;
    use tokio::time::{sleep, Duration};

    println!("📝 Command line interface active. Type 'help' for available commands.");

    // Wait for bot to connect and show connection messages before showing prompt
    sleep(Duration::from_millis(1500)).await;

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin).lines();
    let mut stdout = io::stdout();

    if stdout.write_all(b"\n> ").await.is_err() || stdout.flush().await.is_err() {
        eprintln!("❌ Failed to write initial prompt");
        return;
    }

    loop {
        match reader.next_line().await {
            Ok(Some(line)) => {
                let command = line.trim().to_lowercase();

                match command.as_str() {
                    "quit" | "q" | "exit" => {
                        println!("⏹️  Shutting down bot...");
                        if shutdown_tx.send("quit".to_string()).await.is_err() {
                            eprintln!("❌ Failed to send shutdown signal");
                        }
                        break;
                    }
                    "help" | "h" => {
                        println!("🤖 Available commands:");
                        println!("  quit, q, exit  - Stop the bot gracefully");
                        println!("  help, h        - Show this help message");
                        println!("  status         - Show bot status");
                    }
                    "status" => {
                        if status.is_ready() {
                            println!("🤖 Bot Status: Ready");
                        } else {
                            println!("🤖 Bot Status: Starting");
                        }
                        match status.ready_at() {
                            Some(at) => println!("📡 Discord connection: Active since {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
                            None => println!("📡 Discord connection: Not connected yet"),
                        }
                        println!("💬 Command interface: Active");
                    }
                    "" => {}
                    _ => {
                        println!("❓ Unknown command: '{}'. Type 'help' for available commands.", command);
                    }
                }

                if stdout.write_all(b"> ").await.is_err() || stdout.flush().await.is_err() {
                    eprintln!("❌ Failed to write prompt");
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("❌ Error reading command line: {}", e);
                break;
            }
        }
    }
}

#[tokio::main]
async fn main() {
    // Load configuration first so RUST_LOG from botconfig.txt reaches the logger
    let config = match config::load_bot_config() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("❌ Failed to load botconfig.txt: {}", error);
            eprintln!("Create a botconfig.txt file in the project root with: DISCORD_TOKEN=your_token_here and PREFIX=^");
            return;
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error"))
        .format_timestamp_secs()
        .init();

    println!("🤖 Starting bot with prefix: '{}'", config.prefix);

    let status = Arc::new(BotStatus::new());
    let tree = load_family_tree(&config);
    status.mark_tree_loaded();

    let env = SimulationEnv {
        oracle: Arc::new(tree),
        text: Arc::new(CopulateText),
        family_pairing_guilds: config.family_pairing_guilds.clone(),
        proposal_timeout: config.proposal_timeout,
    };

    let prefix = config.prefix.clone();
    let owners = config.owners.clone();
    let cooldown_secs = config.cooldown.as_secs();

    let framework = StandardFramework::new()
        .configure(|c| {
            c.prefix(&prefix)
                // Owners hit the bucket and checks like everyone else
                // (`#[owner_privilege(false)]` on the group);
                // hooks::handle_error re-runs their cooldown-limited commands.
                .owners(owners)
                .case_insensitivity(true)
                .with_whitespace(true)
        })
        .bucket("simulation", |b| b.delay(cooldown_secs).limit_for(LimitedFor::User))
        .await
        .after(|ctx, msg, command_name, result| Box::pin(commands::hooks::after(ctx, msg, command_name, result)))
        .on_dispatch_error(|ctx, msg, error, command_name| {
            Box::pin(commands::hooks::dispatch_error(ctx, msg, error, command_name))
        })
        .unrecognised_command(|ctx, msg, command_name| Box::pin(commands::hooks::unrecognised(ctx, msg, command_name)))
        .group(&SIMULATION_GROUP);

    // Configure bot intents
    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;

    let token = config.token.clone();
    let mut client = match Client::builder(token, intents)
        .event_handler(Handler {
            status: status.clone(),
        })
        .framework(framework)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Error creating Discord client: {:?}", e);
            eprintln!("❌ Error creating Discord client: {:?}", e);
            eprintln!("Check your token in botconfig.txt file");
            return;
        }
    };

    {
        let mut data = client.data.write().await;
        data.insert::<BotConfigKey>(Arc::new(config));
        data.insert::<SimulationEnvKey>(Arc::new(env));
        data.insert::<BotStatusKey>(status.clone());
    }

    // Set up command line interface for graceful shutdown
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<String>(1);
    let cmd_task = tokio::spawn(handle_command_line(shutdown_tx, status));

    println!("🚀 Bot is running...");
    println!("💡 Use 'quit' command to stop gracefully, or press Ctrl+C");
    tokio::select! {
        _ = signal::ctrl_c() => {
            println!("\n⏹️ Stopping bot gracefully...");
        }
        shutdown_signal = shutdown_rx.recv() => {
            if let Some(signal) = shutdown_signal {
                println!("📡 Received '{}' command, stopping bot gracefully...", signal);
            }
        }
        result = client.start() => {
            if let Err(why) = result {
                log::error!("❌ Client error: {:?}", why);
                eprintln!("❌ Client error: {:?}", why);
            }
        }
    }

    cmd_task.abort();
    println!("✅ Bot stopped");
}
