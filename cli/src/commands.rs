use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::providers::{Provider, ProviderBuilder, WsConnect};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{bail, Context, Result};
use chzswap_chain::{fetch_balances, ChainClient, RpcChainClient};
use chzswap_common::Token;
use chzswap_config::Config;
use chzswap_flows::{
    fetch_positions, AddLiquidityFlow, FlowStage, RemoveLiquidityFlow, RouteResolver, Session,
    Side, SideStage, SwapFlow,
};
use chzswap_math::units;
use chzswap_tokens::TokenRegistry;

use crate::{markets, Command};

const KEY_ENV: &str = "CHZSWAP_PRIVATE_KEY";

pub async fn run(config: Config, command: Command) -> Result<()> {
    let registry = TokenRegistry::new(config.token_list_url.clone());

    match command {
        Command::Tokens => {
            for token in registry.all().await {
                println!("{:<10} {}  ({} decimals)", token.symbol, token.address, token.decimals);
            }
            Ok(())
        }
        Command::Balances => {
            let (chain, session) = connect(&config).await?;
            let tokens = registry.all().await;
            let balances = fetch_balances(chain.as_ref(), session.account, &tokens).await;
            for (token, balance) in tokens.iter().zip(balances) {
                println!(
                    "{:<10} {}",
                    token.symbol,
                    units::format_amount(balance, token.decimals)
                );
            }
            Ok(())
        }
        Command::Quote { from, to, amount } => {
            let (chain, _session) = connect(&config).await?;
            let token_in = lookup(&registry, &from).await?;
            let token_out = lookup(&registry, &to).await?;
            let amount_in = units::parse_amount(&amount, token_in.decimals)?;

            let resolver = RouteResolver::new(chain, config.wrapped_native);
            let quote = resolver.quote(&token_in, &token_out, amount_in).await?;

            println!(
                "{} {} -> {} {}",
                amount,
                token_in.symbol,
                units::format_amount(quote.amount_out, token_out.decimals),
                token_out.symbol
            );
            println!(
                "price {:.6} {}/{}  impact {:.2}%  min received {}",
                quote.execution_price,
                token_out.symbol,
                token_in.symbol,
                quote.price_impact_pct,
                units::format_amount(
                    quote.min_amount_out(config.tx.slippage_bps),
                    token_out.decimals
                )
            );
            Ok(())
        }
        Command::Swap { from, to, amount } => {
            let (chain, session) = connect(&config).await?;
            let token_in = lookup(&registry, &from).await?;
            let token_out = lookup(&registry, &to).await?;

            let mut flow = SwapFlow::new(chain, &config.address_book(), config.tx);
            flow.set_token_in(token_in.clone());
            flow.set_token_out(token_out.clone());
            flow.set_amount_in(&amount)?;
            flow.refresh_quote().await?;

            let Some(quote) = flow.quote().cloned() else {
                bail!("no quote available for {}/{}", token_in.symbol, token_out.symbol);
            };
            println!(
                "quoted {} {} (impact {:.2}%)",
                units::format_amount(quote.amount_out, token_out.decimals),
                token_out.symbol,
                quote.price_impact_pct
            );

            if *flow.sync_approval(&session).await? == FlowStage::AwaitingApproval {
                println!("approving {} for the router", token_in.symbol);
                flow.approve(&session).await?;
            }

            let settlement = flow.execute(&session).await?;
            println!("swap confirmed: {}", settlement.receipt.tx_hash);
            Ok(())
        }
        Command::AddLiquidity {
            token_a,
            amount_a,
            token_b,
            amount_b,
        } => {
            let (chain, session) = connect(&config).await?;
            let a = lookup(&registry, &token_a).await?;
            let b = lookup(&registry, &token_b).await?;

            let mut flow = AddLiquidityFlow::new(chain, &config.address_book(), config.tx);
            flow.set_side(Side::A, a.clone(), &amount_a)?;
            flow.set_side(Side::B, b.clone(), &amount_b)?;
            flow.sync_approvals(&session).await?;

            for (side, token) in [(Side::A, &a), (Side::B, &b)] {
                if flow.side_stage(side) == SideStage::AwaitingApproval {
                    println!("approving {} for the router", token.symbol);
                    flow.approve_side(&session, side).await?;
                }
            }

            let settlement = flow.execute(&session).await?;
            println!("liquidity added: {}", settlement.receipt.tx_hash);
            Ok(())
        }
        Command::RemoveLiquidity {
            token_a,
            token_b,
            amount,
        } => {
            let (chain, session) = connect(&config).await?;
            let a = lookup(&registry, &token_a).await?;
            let b = lookup(&registry, &token_b).await?;

            let positions =
                fetch_positions(chain.as_ref(), session.account, &[a.clone(), b.clone()]).await;
            let Some(position) = positions.into_iter().next() else {
                bail!("no liquidity position for {}/{}", a.symbol, b.symbol);
            };

            let mut flow = RemoveLiquidityFlow::new(chain, config.tx, position)?;
            flow.set_amount(&amount)?;
            let settlement = flow.execute(&session).await?;
            println!("liquidity removed: {}", settlement.receipt.tx_hash);
            Ok(())
        }
        Command::Positions => {
            let (chain, session) = connect(&config).await?;
            let tokens = registry.all().await;
            let positions = fetch_positions(chain.as_ref(), session.account, &tokens).await;
            if positions.is_empty() {
                println!("no liquidity positions");
                return Ok(());
            }
            for position in positions {
                println!(
                    "{}/{}: {} LP  =  {} {} + {} {}",
                    position.token_a.symbol,
                    position.token_b.symbol,
                    units::format_amount(position.lp_balance, 18),
                    units::format_amount(position.amount_a, position.token_a.decimals),
                    position.token_a.symbol,
                    units::format_amount(position.amount_b, position.token_b.decimals),
                    position.token_b.symbol
                );
            }
            Ok(())
        }
        Command::Chart {
            market,
            chart_type,
            resolution,
        } => {
            let market = markets::select(market.as_deref());
            println!("{}", market.label);
            println!("{}", markets::chart_url(market, &chart_type, &resolution));
            Ok(())
        }
    }
}

async fn lookup(registry: &TokenRegistry, query: &str) -> Result<Token> {
    registry
        .find(query)
        .await
        .with_context(|| format!("unknown token: {query}"))
}

/// Wallet-backed chain client plus the session it signs for.
async fn connect(config: &Config) -> Result<(Arc<dyn ChainClient>, Session)> {
    let signer: PrivateKeySigner = std::env::var(KEY_ENV)
        .with_context(|| format!("{KEY_ENV} is not set"))?
        .parse()
        .with_context(|| format!("{KEY_ENV} is not a valid private key"))?;
    let account = signer.address();

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .on_ws(WsConnect::new(&config.rpc_url))
        .await
        .context("websocket connection failed")?;

    let connected = provider
        .get_chain_id()
        .await
        .context("chain id query failed")?;
    ensure_expected_chain(config.chain_id, connected)?;

    let chain = Arc::new(RpcChainClient::new(provider, config.address_book()));
    Ok((
        chain,
        Session {
            account,
            chain_id: connected,
        },
    ))
}

/// Signing transactions against the wrong network would target contracts
/// that do not exist there; refuse the session outright.
fn ensure_expected_chain(expected: u64, connected: u64) -> Result<()> {
    if expected != connected {
        bail!("rpc endpoint is on chain {connected}, config expects chain {expected}");
    }
    Ok(())
}
