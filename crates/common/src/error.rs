/// Failure taxonomy for the whole workflow.
///
/// Read paths absorb transport problems into zero/empty defaults before they
/// reach this type; anything here was either a rejected input or a failed
/// write that the initiating flow must surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DexError {
    /// The wallet owner declined to sign. Informational: the flow returns
    /// to its pre-action stage.
    #[error("signature rejected by user")]
    UserRejected,

    /// No reserve pair exists for the requested route. Distinct from
    /// transport failures by contract.
    #[error("insufficient liquidity for this pair")]
    NoLiquidity,

    /// The chain accepted the transaction and reverted it.
    #[error("transaction reverted: {0}")]
    Reverted(String),

    /// RPC-level failure on a write path.
    #[error("rpc failure: {0}")]
    Rpc(String),

    /// Malformed amount, rejected before any chain call.
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),

    /// Route endpoints are missing or identical.
    #[error("invalid route")]
    InvalidRoute,

    /// Remove-liquidity attempted with no liquidity tokens to burn.
    #[error("no liquidity position to remove")]
    NothingToRemove,

    /// Operation invoked while its flow is in the wrong stage.
    #[error("flow not ready: {0}")]
    NotReady(&'static str),
}

impl DexError {
    /// User-declined failures roll a flow back instead of poisoning it.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, DexError::UserRejected)
    }
}
