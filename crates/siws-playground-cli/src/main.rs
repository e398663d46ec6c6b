/*
[INPUT]:  CLI arguments, process environment, OS shutdown signals
[OUTPUT]: Playground actions (balance, sign-in, signing, explorer links, local wallets)
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, subcommands, or startup flow
*/

mod commands;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "siws-playground", version, about = "Sign-In-With-Solana playground")]
struct Cli {
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    /// Directory holding local keypair files
    #[arg(long = "key-dir", value_name = "PATH", global = true)]
    key_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the SOL balance of an address
    Balance { address: String },
    /// Sign in with a local keypair
    SignIn {
        #[command(flatten)]
        wallet: WalletArgs,
        /// Verify in-process instead of calling the auth backend
        #[arg(long)]
        local: bool,
    },
    /// Sign a UTF-8 message and print the base58 signature
    SignMessage {
        #[command(flatten)]
        wallet: WalletArgs,
        message: String,
    },
    /// Print the explorer link for a path on the configured cluster
    Explorer { path: String },
    /// Validate the environment and print it with secrets redacted
    EnvCheck,
    /// Manage local keypair wallets
    Wallet {
        #[command(subcommand)]
        command: WalletCommand,
    },
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    /// Create a named keypair if it does not exist
    New { name: String },
    /// List stored keypairs
    List,
}

#[derive(Args, Debug, Clone)]
struct WalletArgs {
    /// Name of a stored keypair
    #[arg(long = "wallet", value_name = "NAME", default_value = "default")]
    name: String,
    /// Base58 private key, used instead of a stored keypair
    #[arg(long = "keypair", value_name = "BASE58", conflicts_with = "name")]
    keypair: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let key_dir = match args.key_dir {
        Some(dir) => dir,
        None => default_key_dir()?,
    };

    match args.command {
        Command::Balance { address } => {
            let ctx = commands::load_context()?;
            println!("{}", commands::balance::run(&ctx, &address).await?);
        }
        Command::SignIn { wallet, local } => {
            let wallet = commands::wallet::resolve(&key_dir, &wallet.name, wallet.keypair.as_deref())?;
            let ctx = if local {
                commands::load_local_context()?
            } else {
                commands::load_context()?
            };
            let shutdown = CancellationToken::new();
            setup_signal_handlers(shutdown.clone());
            let session = commands::sign_in::run(&ctx, Arc::new(wallet), shutdown).await?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        Command::SignMessage { wallet, message } => {
            let wallet = commands::wallet::resolve(&key_dir, &wallet.name, wallet.keypair.as_deref())?;
            let ctx = commands::load_local_context()?;
            println!("{}", commands::sign_in::sign_message(&ctx, &wallet, &message).await?);
        }
        Command::Explorer { path } => {
            let ctx = commands::load_local_context()?;
            println!("{}", ctx.explorer_url(&path));
        }
        Command::EnvCheck => {
            let ctx = commands::load_local_context()?;
            println!("{:#?}", ctx.env());
        }
        Command::Wallet { command } => match command {
            WalletCommand::New { name } => {
                let wallet = commands::wallet::create(&key_dir, &name)?;
                println!("{name}: {}", wallet.address());
            }
            WalletCommand::List => {
                for line in commands::wallet::list(&key_dir) {
                    println!("{line}");
                }
            }
        },
    }

    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn default_key_dir() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .ok_or_else(|| anyhow!("could not determine data directory"))?
        .join("siws-playground")
        .join("keys");
    Ok(dir)
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown.cancel();
    });
}
