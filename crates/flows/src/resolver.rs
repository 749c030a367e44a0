use std::sync::Arc;

use alloy::primitives::{Address, U256};
use chzswap_chain::ChainClient;
use chzswap_common::{DexError, Token};
use chzswap_math::cpmm;

/// Snapshot-bound quote for an exact-input trade. Advisory only: it goes
/// stale the next block, and the swap's own min-out guard is what binds.
#[derive(Debug, Clone)]
pub struct Quote {
    pub token_in: Token,
    pub token_out: Token,
    pub amount_in: U256,
    pub amount_out: U256,
    /// Output units per input unit, decimal-adjusted.
    pub execution_price: f64,
    pub price_impact_pct: f64,
}

impl Quote {
    /// Minimum acceptable output after slippage tolerance.
    pub fn min_amount_out(&self, slippage_bps: u32) -> U256 {
        let keep = U256::from(10_000u64 - u64::from(slippage_bps.min(10_000)));
        self.amount_out * keep / U256::from(10_000u64)
    }
}

/// Derives a route and quote from the current on-chain reserves. Nothing is
/// cached: reserves change every block, so every call re-fetches.
pub struct RouteResolver {
    chain: Arc<dyn ChainClient>,
    wrapped_native: Address,
}

impl RouteResolver {
    pub fn new(chain: Arc<dyn ChainClient>, wrapped_native: Address) -> Self {
        Self {
            chain,
            wrapped_native,
        }
    }

    /// Router-facing address of a token: native trades through the wrapper.
    pub fn wrap(&self, token: &Token) -> Address {
        if token.is_native() {
            self.wrapped_native
        } else {
            token.address
        }
    }

    pub async fn quote(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount_in: U256,
    ) -> Result<Quote, DexError> {
        let addr_in = self.wrap(token_in);
        let addr_out = self.wrap(token_out);
        if addr_in == addr_out {
            return Err(DexError::InvalidRoute);
        }
        if amount_in.is_zero() {
            return Err(DexError::InvalidAmount("zero input".into()));
        }

        // A failed pair fetch is reported as missing liquidity, not as a
        // transport error: the caller cannot act on the difference.
        let reserves = self
            .chain
            .reserves_for(addr_in, addr_out)
            .await
            .map_err(|err| {
                if !matches!(err, DexError::NoLiquidity) {
                    tracing::warn!("reserve fetch failed for {addr_in}/{addr_out}: {err}");
                }
                DexError::NoLiquidity
            })?;

        let amount_out = cpmm::amount_out(amount_in, &reserves)?;
        if amount_out.is_zero() {
            return Err(DexError::NoLiquidity);
        }

        let mid = cpmm::mid_price(&reserves, token_in.decimals, token_out.decimals);
        let execution_price =
            cpmm::execution_price(amount_in, amount_out, token_in.decimals, token_out.decimals);

        Ok(Quote {
            token_in: token_in.clone(),
            token_out: token_out.clone(),
            amount_in,
            amount_out,
            execution_price,
            price_impact_pct: cpmm::price_impact_pct(mid, execution_price),
        })
    }
}
