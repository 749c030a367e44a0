use alloy::primitives::{Address, U256};
use chzswap_common::{
    AddLiquidityParams, DexError, RemoveLiquidityParams, Reserves, SwapParams, Token, TxReceipt,
};

pub mod rpc;

pub use rpc::RpcChainClient;

/// Read/write surface against the ledger.
///
/// Balance and allowance reads never fail: transport problems degrade to
/// zero so a flaky RPC cannot block the caller. Writes always surface
/// rejection and revert errors to the initiating flow.
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    async fn native_balance(&self, account: Address) -> U256;

    async fn token_balance(&self, token: Address, account: Address) -> U256;

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256;

    /// Pair contract for an unordered token pair, if the factory knows one.
    async fn pair_address(
        &self,
        token_a: Address,
        token_b: Address,
    ) -> Result<Option<Address>, DexError>;

    /// Current reserves oriented as (reserve of token_in, reserve of token_out).
    async fn reserves_for(
        &self,
        token_in: Address,
        token_out: Address,
    ) -> Result<Reserves, DexError>;

    /// Reserves in the pair's own token0/token1 order plus LP total supply.
    async fn pair_state(&self, pair: Address) -> Result<(Reserves, U256), DexError>;

    async fn lp_balance(&self, pair: Address, account: Address) -> U256;

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
        gas_limit: u64,
    ) -> Result<TxReceipt, DexError>;

    async fn swap(&self, params: SwapParams) -> Result<TxReceipt, DexError>;

    async fn add_liquidity(&self, params: AddLiquidityParams) -> Result<TxReceipt, DexError>;

    async fn remove_liquidity(&self, params: RemoveLiquidityParams) -> Result<TxReceipt, DexError>;
}

/// Balance of one token, native or ERC-20.
pub async fn balance_of(chain: &dyn ChainClient, token: &Token, account: Address) -> U256 {
    if token.is_native() {
        chain.native_balance(account).await
    } else {
        chain.token_balance(token.address, account).await
    }
}

/// Balances for several tokens, fetched in parallel and joined.
pub async fn fetch_balances(
    chain: &dyn ChainClient,
    account: Address,
    tokens: &[Token],
) -> Vec<U256> {
    let futures = tokens.iter().map(|token| balance_of(chain, token, account));
    futures::future::join_all(futures).await
}
