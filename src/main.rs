use anyhow::Result;
use clap::{Parser, Subcommand};

use nexus_dash::activity::ActivityLog;
use nexus_dash::cli::{self, OutputFormat};
use nexus_dash::{config, watch, web};

#[derive(Debug, Parser)]
#[command(name = "nexus-dash")]
#[command(about = "Dashboard for the Nexus AGI agent: chat, memory, learning and tools")]
struct App {
    /// Backend base URL (overrides config and NEXUS_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive terminal dashboard (default)
    Watch,
    /// Serve the browser dashboard
    Web {
        /// Address to bind (default: web.bind from config)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open a browser window
        #[arg(long)]
        no_open: bool,
    },
    /// Check backend connectivity and local configuration
    Health {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Send one message to the agent
    Chat {
        #[arg(required = true)]
        message: Vec<String>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Search or inspect the agent's memory
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
    /// Show detected patterns and learned skills
    Learning {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show backend statistics
    Stats {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List the agent's tools
    Tools {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show recent request outcomes from the activity log
    Log {
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum MemoryAction {
    /// Vector search over stored memories
    Search {
        #[arg(required = true)]
        query: Vec<String>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Recent conversation episodes
    Episodes {
        /// Number of episodes (default: memory.episode_count)
        #[arg(short, long)]
        n: Option<u32>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Delete every stored memory
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config to ~/.nexus-dash/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value, e.g. `api.base_url http://agent:8000`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    let mut config = config::load();
    if let Some(url) = app.api_url {
        config.api.base_url = url;
    }
    let fmt = |format: &str| OutputFormat::from_str_opt(Some(format));

    match app.command.unwrap_or(Commands::Watch) {
        Commands::Watch => watch::run(&config, ActivityLog::from_config(&config.logging)),
        Commands::Web { addr, no_open } => {
            if no_open {
                config.web.open_browser = false;
            }
            let addr = addr.unwrap_or_else(|| config.web.bind.clone());
            web::serve(&config, &addr, ActivityLog::from_config(&config.logging))
        }
        Commands::Health { format } => cli::run_health(&config, fmt(&format)),
        Commands::Chat { message, format } => {
            cli::run_chat(&config, &message.join(" "), fmt(&format))
        }
        Commands::Memory { action } => match action {
            MemoryAction::Search { query, format } => {
                cli::run_memory_search(&config, &query.join(" "), fmt(&format))
            }
            MemoryAction::Episodes { n, format } => {
                cli::run_memory_episodes(&config, n, fmt(&format))
            }
            MemoryAction::Clear { yes } => cli::run_memory_clear(&config, yes),
        },
        Commands::Learning { format } => cli::run_learning(&config, fmt(&format)),
        Commands::Stats { format } => cli::run_stats(&config, fmt(&format)),
        Commands::Tools { format } => cli::run_tools(&config, fmt(&format)),
        Commands::Log { limit, format } => cli::run_log(&config, limit, fmt(&format)),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
