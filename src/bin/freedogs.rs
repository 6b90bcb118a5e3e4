use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use freedogs_farmer::api::HttpGameApi;
use freedogs_farmer::auth::SessionManager;
use freedogs_farmer::config::{AppConfig, CONFIG_PATH};
use freedogs_farmer::credentials::load_credentials;
use freedogs_farmer::poller::{LoopOutcome, Poller};
use freedogs_farmer::reporter;
use freedogs_farmer::token_store::TokenStore;

#[derive(Parser)]
#[command(name = "freedogs", about = "FreeDogs mini-app collect and task bot")]
struct Args {
    /// Config file (optional; defaults apply when missing)
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Credential file, one account per line
    #[arg(long)]
    data: Option<PathBuf>,

    /// Token cache file
    #[arg(long)]
    tokens: Option<PathBuf>,

    /// Seconds to wait between passes over the accounts
    #[arg(long)]
    cooldown_secs: Option<u64>,

    /// Run a single pass over the accounts and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    reporter::init_logging("info");

    if let Err(e) = run(Args::parse()).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = AppConfig::load_or_default(&args.config)?;
    if let Some(data) = args.data {
        config.files.data = data;
    }
    if let Some(tokens) = args.tokens {
        config.files.tokens = tokens;
    }
    if let Some(secs) = args.cooldown_secs {
        config.settings.cooldown_secs = secs;
    }

    let accounts = load_credentials(&config.files.data)?;
    info!(
        "Loaded {} account(s) from {}",
        accounts.len(),
        config.files.data.display()
    );

    let store = TokenStore::new(&config.files.tokens);
    let sessions = SessionManager::open(store)?;
    info!(
        "Loaded {} cached token(s) from {}",
        sessions.tokens().len(),
        config.files.tokens.display()
    );

    let api = HttpGameApi::new(&config.api).context("failed to set up API client")?;
    let mut poller = Poller::new(api, sessions, accounts, config.settings);

    if args.once {
        poller.run_pass().await;
        return Ok(());
    }

    match poller.run().await {
        LoopOutcome::Exhausted => info!(
            "Finished after {} pass(es)",
            poller.state().passes
        ),
        LoopOutcome::Interrupted => info!("Stopped before every account was exhausted"),
    }
    Ok(())
}
