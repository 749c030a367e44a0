mod commands;
mod markets;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use chzswap_config::Config;
use chzswap_logger::init_logger;
use tracing::Level;

#[derive(Parser)]
#[command(name = "chzswap", about = "Swap and liquidity workflows for Chiliz-chain pools")]
struct Cli {
    /// Path to the JSON config file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the known tokens.
    Tokens,
    /// Show balances for every known token.
    Balances,
    /// Price an exact-input swap without sending anything.
    Quote {
        /// Input token, by symbol or address.
        #[arg(long)]
        from: String,
        /// Output token, by symbol or address.
        #[arg(long)]
        to: String,
        /// Input amount in display units, e.g. "1.5".
        #[arg(long)]
        amount: String,
    },
    /// Quote, approve if needed, and execute an exact-input swap.
    Swap {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },
    /// Deposit two tokens into their pool.
    AddLiquidity {
        #[arg(long)]
        token_a: String,
        #[arg(long)]
        amount_a: String,
        #[arg(long)]
        token_b: String,
        #[arg(long)]
        amount_b: String,
    },
    /// Burn LP tokens and withdraw both sides of a position.
    RemoveLiquidity {
        #[arg(long)]
        token_a: String,
        #[arg(long)]
        token_b: String,
        /// LP amount to burn, in display units.
        #[arg(long)]
        amount: String,
    },
    /// List pools where the account holds liquidity.
    Positions,
    /// Print the chart URL for a market.
    Chart {
        /// Pool address or market label; unknown values chart the default.
        #[arg(long)]
        market: Option<String>,
        #[arg(long, default_value = "price")]
        chart_type: String,
        #[arg(long, default_value = "1D")]
        resolution: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_logger(Level::INFO);

    let cli = Cli::parse();
    let config = Config::load(cli.config)?;
    commands::run(config, cli.command).await
}
