use alloy::primitives::{Address, U256};
use chzswap_chain::ChainClient;
use chzswap_common::Token;

/// A user's stake in one pool: the LP balance and what it currently
/// redeems for, `balance * reserve / total_supply` per side.
#[derive(Debug, Clone)]
pub struct LiquidityPosition {
    pub pair: Address,
    /// Pool tokens in the pair contract's token0/token1 order.
    pub token_a: Token,
    pub token_b: Token,
    pub lp_balance: U256,
    pub amount_a: U256,
    pub amount_b: U256,
}

/// Scan the known token pairs for pools where `account` holds liquidity.
///
/// Pair lookups run in parallel; a pool that fails to load is skipped, not
/// fatal. Pools without a pair contract or with a zero LP balance are
/// filtered out, so the remove-liquidity surface never sees an empty
/// position.
pub async fn fetch_positions(
    chain: &dyn ChainClient,
    account: Address,
    tokens: &[Token],
) -> Vec<LiquidityPosition> {
    let mut pairs = Vec::new();
    for (i, a) in tokens.iter().enumerate() {
        for b in tokens.iter().skip(i + 1) {
            if a.is_native() || b.is_native() || a.address == b.address {
                continue;
            }
            // orient to the pair contract's token0/token1 order
            if a.address < b.address {
                pairs.push((a.clone(), b.clone()));
            } else {
                pairs.push((b.clone(), a.clone()));
            }
        }
    }

    let lookups = pairs
        .into_iter()
        .map(|(token_a, token_b)| load_position(chain, account, token_a, token_b));
    futures::future::join_all(lookups)
        .await
        .into_iter()
        .flatten()
        .collect()
}

async fn load_position(
    chain: &dyn ChainClient,
    account: Address,
    token_a: Token,
    token_b: Token,
) -> Option<LiquidityPosition> {
    let pair = match chain.pair_address(token_a.address, token_b.address).await {
        Ok(found) => found?,
        Err(err) => {
            tracing::debug!(
                "pair lookup failed for {}/{}: {err}",
                token_a.symbol,
                token_b.symbol
            );
            return None;
        }
    };

    let lp_balance = chain.lp_balance(pair, account).await;
    if lp_balance.is_zero() {
        return None;
    }

    let (reserves, total_supply) = match chain.pair_state(pair).await {
        Ok(state) => state,
        Err(err) => {
            tracing::debug!("pair state fetch failed for {pair}: {err}");
            return None;
        }
    };
    if total_supply.is_zero() {
        return None;
    }

    Some(LiquidityPosition {
        pair,
        amount_a: share(lp_balance, reserves.0, total_supply),
        amount_b: share(lp_balance, reserves.1, total_supply),
        token_a,
        token_b,
        lp_balance,
    })
}

fn share(balance: U256, reserve: U256, total_supply: U256) -> U256 {
    balance
        .checked_mul(reserve)
        .map(|product| product / total_supply)
        .unwrap_or(U256::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_is_proportional() {
        // 10% of supply redeems 10% of each reserve
        let tenth = share(
            U256::from(100u64),
            U256::from(5_000u64),
            U256::from(1_000u64),
        );
        assert_eq!(tenth, U256::from(500u64));

        assert_eq!(
            share(U256::ZERO, U256::from(5_000u64), U256::from(1_000u64)),
            U256::ZERO
        );
    }
}
