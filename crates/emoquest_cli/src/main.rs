mod app;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "EMOQUEST_CONFIG", default_value = "emoquest.toml")]
    config: String,

    /// Override the database path from config
    #[arg(long)]
    db: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Run the HTTP gateway
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Classify text for a user and apply the reward
    Analyze {
        #[arg(short, long)]
        user: String,
        /// Text to analyze (joined with spaces)
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Show the user's recent emotion trend
    History {
        #[arg(short, long)]
        user: String,
    },
    /// Show the user's experience and level
    Status {
        #[arg(short, long)]
        user: String,
    },
    /// List every quest the user has been awarded
    Quests {
        #[arg(short, long)]
        user: String,
    },
    /// Create a zeroed progress record for a new user
    Init {
        #[arg(short, long)]
        user: String,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.log_json);

    let mut config = emoquest_core::EmoquestConfig::load_or_default(&args.config);
    if let Some(db) = args.db {
        config.storage.db_path = db;
    }

    app::run(config, args.command).await
}
