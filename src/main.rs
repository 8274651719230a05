use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use clipshare_lib::config::Config;
use clipshare_lib::sync::Session;
use clipshare_lib::{identity_resolver, logging, ClipShare};

#[derive(Parser)]
#[command(name = "clipshare")]
#[command(about = "Share your clipboard across devices", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the raw platform tag and where the log is written
    Platform,
    /// Print this device's id, or store a new one
    DeviceId {
        /// Id to store for this device
        #[arg(long)]
        set: Option<String>,
    },
    /// List the clipboard entries shared by a user's devices
    Feed {
        #[arg(short, long)]
        user: String,
    },
    /// Share the current clipboard as this device's latest text
    Share {
        #[arg(short, long)]
        user: String,
    },
    /// Copy one feed entry to the clipboard
    Copy {
        #[arg(short, long)]
        user: String,
        /// Position in the feed (0-based)
        #[arg(short, long)]
        index: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration")?;
    logging::init(&config.data_dir);

    match cli.command {
        Commands::Platform => {
            println!("{}", config.platform);
            if let Some(path) = logging::log_path() {
                println!("log: {}", path);
            }
        }
        Commands::DeviceId { set } => {
            let resolver = identity_resolver(&config)?;
            if let Some(id) = set {
                resolver.persist(&id).await;
            }
            match resolver.resolve().await {
                Some(identity) => println!("{}", identity.id),
                None => return Err(anyhow!("device id unavailable")),
            }
        }
        Commands::Feed { user } => {
            let app = connect(config, &user).await?;
            let entries = app.home().entries().await;
            if entries.is_empty() {
                println!("(no clipboard entries)");
            }
            for (i, entry) in entries.iter().enumerate() {
                println!("[{}] {}: {}", i, entry.device, entry.copied_text);
            }
        }
        Commands::Share { user } => {
            let app = ClipShare::new(config)?;
            app.set_session_token(app.config().id_token.clone()).await;
            let text = app.share_clipboard(&user).await?;
            println!("Shared {} chars", text.chars().count());
        }
        Commands::Copy { user, index } => {
            let app = connect(config, &user).await?;
            let mut home = app.home();
            let entries = home.entries().await;
            let entry = entries
                .get(index)
                .ok_or_else(|| anyhow!("no entry at index {} ({} entries)", index, entries.len()))?;
            home.show(entry);
            home.copy_shown()?;
            println!("Copied text from {}", entry.device);
        }
    }

    Ok(())
}

fn session(app: &ClipShare, user: &str) -> Session {
    Session {
        user_id: user.to_string(),
        id_token: app.config().id_token.clone(),
    }
}

async fn connect(config: Config, user: &str) -> Result<ClipShare> {
    let app = ClipShare::new(config)?;
    if !app.sign_in(session(&app, user)).await {
        log::warn!("Feed could not be refreshed, showing what is available");
    }
    Ok(app)
}
