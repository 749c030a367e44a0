use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    rpc::types::TransactionReceipt,
};
use chzswap_abi::{IUniswapV2Factory, IUniswapV2Pair, IUniswapV2Router02, IERC20};
use chzswap_common::{
    AddLiquidityParams, AddressBook, DexError, RemoveLiquidityParams, Reserves, SwapKind,
    SwapParams, TxReceipt,
};

use crate::ChainClient;

/// `ChainClient` backed by an alloy provider with a wallet filler attached.
#[derive(Clone)]
pub struct RpcChainClient<P> {
    provider: P,
    book: AddressBook,
}

impl<P: Provider + Clone + Send + Sync + 'static> RpcChainClient<P> {
    pub fn new(provider: P, book: AddressBook) -> Self {
        Self { provider, book }
    }

    pub fn address_book(&self) -> &AddressBook {
        &self.book
    }

    fn convert(receipt: TransactionReceipt) -> Result<TxReceipt, DexError> {
        if !receipt.status() {
            return Err(DexError::Reverted(format!(
                "transaction {} reverted",
                receipt.transaction_hash
            )));
        }
        Ok(TxReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }
}

#[async_trait::async_trait]
impl<P: Provider + Clone + Send + Sync + 'static> ChainClient for RpcChainClient<P> {
    async fn native_balance(&self, account: Address) -> U256 {
        match self.provider.get_balance(account).await {
            Ok(balance) => balance,
            Err(err) => {
                tracing::warn!("native balance read failed for {account}: {err}");
                U256::ZERO
            }
        }
    }

    async fn token_balance(&self, token: Address, account: Address) -> U256 {
        let instance = IERC20::new(token, self.provider.clone());
        match instance.balanceOf(account).call().await {
            Ok(balance) => balance._0,
            Err(err) => {
                tracing::warn!("balanceOf failed for token {token}: {err}");
                U256::ZERO
            }
        }
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        let instance = IERC20::new(token, self.provider.clone());
        match instance.allowance(owner, spender).call().await {
            Ok(allowance) => allowance._0,
            Err(err) => {
                tracing::warn!("allowance read failed for token {token}: {err}");
                U256::ZERO
            }
        }
    }

    async fn pair_address(
        &self,
        token_a: Address,
        token_b: Address,
    ) -> Result<Option<Address>, DexError> {
        let factory = IUniswapV2Factory::new(self.book.factory, self.provider.clone());
        let pair = factory
            .getPair(token_a, token_b)
            .call()
            .await
            .map_err(|err| DexError::Rpc(err.to_string()))?
            .pair;

        Ok((pair != Address::ZERO).then_some(pair))
    }

    async fn reserves_for(
        &self,
        token_in: Address,
        token_out: Address,
    ) -> Result<Reserves, DexError> {
        let pair = self
            .pair_address(token_in, token_out)
            .await?
            .ok_or(DexError::NoLiquidity)?;

        let instance = IUniswapV2Pair::new(pair, self.provider.clone());
        let reserves = instance
            .getReserves()
            .call()
            .await
            .map_err(|err| DexError::Rpc(err.to_string()))?;

        let (r0, r1) = (
            U256::from(reserves.reserve0),
            U256::from(reserves.reserve1),
        );
        // pair token0 is the numerically lower address
        match token_in < token_out {
            true => Ok(Reserves(r0, r1)),
            false => Ok(Reserves(r1, r0)),
        }
    }

    async fn pair_state(&self, pair: Address) -> Result<(Reserves, U256), DexError> {
        let instance = IUniswapV2Pair::new(pair, self.provider.clone());
        let reserves = instance
            .getReserves()
            .call()
            .await
            .map_err(|err| DexError::Rpc(err.to_string()))?;
        let supply = instance
            .totalSupply()
            .call()
            .await
            .map_err(|err| DexError::Rpc(err.to_string()))?
            ._0;

        Ok((
            Reserves(U256::from(reserves.reserve0), U256::from(reserves.reserve1)),
            supply,
        ))
    }

    async fn lp_balance(&self, pair: Address, account: Address) -> U256 {
        let instance = IUniswapV2Pair::new(pair, self.provider.clone());
        match instance.balanceOf(account).call().await {
            Ok(balance) => balance._0,
            Err(err) => {
                tracing::warn!("lp balance read failed for pair {pair}: {err}");
                U256::ZERO
            }
        }
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
        gas_limit: u64,
    ) -> Result<TxReceipt, DexError> {
        let instance = IERC20::new(token, self.provider.clone());
        let pending = instance
            .approve(spender, amount)
            .gas(gas_limit)
            .send()
            .await
            .map_err(classify_send_error)?;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|err| DexError::Rpc(err.to_string()))?;

        tracing::info!(%token, %spender, tx = %receipt.transaction_hash, "approval confirmed");
        Self::convert(receipt)
    }

    async fn swap(&self, params: SwapParams) -> Result<TxReceipt, DexError> {
        let router = IUniswapV2Router02::new(self.book.router, self.provider.clone());
        let deadline = U256::from(params.deadline);

        let pending = match params.kind {
            SwapKind::TokenToToken => {
                router
                    .swapExactTokensForTokens(
                        params.amount_in,
                        params.amount_out_min,
                        params.path.clone(),
                        params.recipient,
                        deadline,
                    )
                    .gas(params.gas_limit)
                    .send()
                    .await
            }
            SwapKind::NativeToToken => {
                router
                    .swapExactETHForTokens(
                        params.amount_out_min,
                        params.path.clone(),
                        params.recipient,
                        deadline,
                    )
                    .value(params.amount_in)
                    .gas(params.gas_limit)
                    .send()
                    .await
            }
            SwapKind::TokenToNative => {
                router
                    .swapExactTokensForETH(
                        params.amount_in,
                        params.amount_out_min,
                        params.path.clone(),
                        params.recipient,
                        deadline,
                    )
                    .gas(params.gas_limit)
                    .send()
                    .await
            }
        }
        .map_err(classify_send_error)?;

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|err| DexError::Rpc(err.to_string()))?;

        tracing::info!(tx = %receipt.transaction_hash, "swap confirmed");
        Self::convert(receipt)
    }

    async fn add_liquidity(&self, params: AddLiquidityParams) -> Result<TxReceipt, DexError> {
        let router = IUniswapV2Router02::new(self.book.router, self.provider.clone());
        let pending = router
            .addLiquidity(
                params.token_a,
                params.token_b,
                params.amount_a_desired,
                params.amount_b_desired,
                params.amount_a_min,
                params.amount_b_min,
                params.recipient,
                U256::from(params.deadline),
            )
            .gas(params.gas_limit)
            .send()
            .await
            .map_err(classify_send_error)?;

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|err| DexError::Rpc(err.to_string()))?;

        tracing::info!(tx = %receipt.transaction_hash, "liquidity added");
        Self::convert(receipt)
    }

    async fn remove_liquidity(&self, params: RemoveLiquidityParams) -> Result<TxReceipt, DexError> {
        let router = IUniswapV2Router02::new(self.book.router, self.provider.clone());
        let pending = router
            .removeLiquidity(
                params.token_a,
                params.token_b,
                params.liquidity,
                params.amount_a_min,
                params.amount_b_min,
                params.recipient,
                U256::from(params.deadline),
            )
            .gas(params.gas_limit)
            .send()
            .await
            .map_err(classify_send_error)?;

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|err| DexError::Rpc(err.to_string()))?;

        tracing::info!(tx = %receipt.transaction_hash, "liquidity removed");
        Self::convert(receipt)
    }
}

/// Split a failed send into the taxonomy the flows care about: a declined
/// signature, a contract revert, or plain transport trouble.
fn classify_send_error(err: alloy::contract::Error) -> DexError {
    let text = err.to_string();
    let lowered = text.to_lowercase();

    if lowered.contains("user denied")
        || lowered.contains("user rejected")
        || lowered.contains("code: 4001")
    {
        return DexError::UserRejected;
    }
    if lowered.contains("revert") {
        return DexError::Reverted(text);
    }
    DexError::Rpc(text)
}
