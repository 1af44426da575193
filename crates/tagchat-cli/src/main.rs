use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tagchat_infrastructure::TagchatPaths;

mod commands;
mod logging;
mod renderer;

#[derive(Parser)]
#[command(name = "tagchat")]
#[command(about = "tagchat - assistant conversations seeded from tagged notes", long_about = None)]
struct Cli {
    /// Directory holding the notes and templates
    #[arg(long, global = true, default_value = ".")]
    vault: PathBuf,

    /// State file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Chat-completion endpoint of an OpenAI-compatible gateway
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a document: reuse its session or start one from its tags
    Open {
        /// Document path relative to the vault
        doc: String,
    },
    /// Send a message on a document's session
    Send { doc: String, text: String },
    /// Print a document's session
    Show { doc: String },
    /// List stored sessions
    List,
    /// Evict sessions older than the retention
    Sweep,
    /// Interactive chat view
    Chat {
        /// Document to open first
        doc: Option<String>,
    },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Import the settings and sessions of the legacy plugin's data.json
    Import { path: PathBuf },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current settings
    Show,
    /// Change one setting
    Set {
        #[arg(value_enum)]
        field: ConfigField,
        value: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ConfigField {
    ApiKey,
    /// Comma separated tags
    Tags,
    /// Comma separated template paths, positionally bound to the tags
    Templates,
    Behavior,
    Retention,
    Model,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A custom state file keeps its logs next to it.
    let (state_file, logs_dir) = match cli.config {
        Some(path) => {
            let logs_dir = path.parent().map(|dir| dir.join("logs"));
            (path, logs_dir)
        }
        None => (
            TagchatPaths::state_file().context("Cannot resolve the config directory")?,
            TagchatPaths::logs_dir().ok(),
        ),
    };
    let _log_guard = logging::init(logs_dir.as_deref());

    let env = commands::Env {
        vault: cli.vault,
        state_file,
        endpoint: cli.endpoint,
    };

    match cli.command {
        Commands::Open { doc } => commands::documents::open(&env, &doc).await?,
        Commands::Send { doc, text } => commands::documents::send(&env, &doc, &text).await?,
        Commands::Show { doc } => commands::documents::show(&env, &doc).await?,
        Commands::List => commands::documents::list(&env).await?,
        Commands::Sweep => commands::documents::sweep(&env).await?,
        Commands::Chat { doc } => commands::chat::run(&env, doc.as_deref()).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&env).await?,
            ConfigAction::Set { field, value } => {
                commands::config::set(&env, field, &value).await?
            }
        },
        Commands::Import { path } => commands::config::import(&env, &path)?,
    }

    Ok(())
}
