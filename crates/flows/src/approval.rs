use std::sync::Arc;

use alloy::primitives::{Address, U256};
use chzswap_chain::ChainClient;
use chzswap_common::{DexError, Token, TxReceipt};

use crate::Session;

/// Decides whether a spender may move a user's tokens, and issues the
/// approval transaction when it may not.
///
/// Policy: approvals request the maximum representable amount, trading
/// standing exposure for one approval per token instead of one per trade.
/// `approve_exact` is the deliberate opt-out. The native asset never needs
/// approval.
pub struct ApprovalGate {
    chain: Arc<dyn ChainClient>,
    spender: Address,
    gas_limit: u64,
}

impl ApprovalGate {
    pub fn new(chain: Arc<dyn ChainClient>, spender: Address, gas_limit: u64) -> Self {
        Self {
            chain,
            spender,
            gas_limit,
        }
    }

    pub fn spender(&self) -> Address {
        self.spender
    }

    pub async fn is_approved(&self, session: &Session, token: &Token, required: U256) -> bool {
        if token.is_native() {
            return true;
        }
        let allowance = self
            .chain
            .allowance(token.address, session.account, self.spender)
            .await;
        allowance >= required
    }

    /// Unlimited approval (the default policy).
    pub async fn approve(&self, session: &Session, token: &Token) -> Result<TxReceipt, DexError> {
        self.approve_exact(session, token, U256::MAX).await
    }

    pub async fn approve_exact(
        &self,
        session: &Session,
        token: &Token,
        amount: U256,
    ) -> Result<TxReceipt, DexError> {
        if token.is_native() {
            return Err(DexError::NotReady("native asset needs no approval"));
        }

        tracing::info!(
            account = %session.account,
            token = %token.symbol,
            spender = %self.spender,
            "requesting approval"
        );
        self.chain
            .approve(token.address, self.spender, amount, self.gas_limit)
            .await
    }
}
