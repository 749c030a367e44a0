//! Swap & liquidity orchestration: quote, approval gating, and execution
//! state machines driven against a [`chzswap_chain::ChainClient`].

use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::Address;
use chzswap_common::{DexError, Token, TxReceipt};

pub mod approval;
pub mod liquidity;
pub mod positions;
pub mod resolver;
pub mod swap;

pub use approval::ApprovalGate;
pub use liquidity::{AddLiquidityFlow, RemoveLiquidityFlow, Side, SideStage};
pub use positions::{fetch_positions, LiquidityPosition};
pub use resolver::{Quote, RouteResolver};
pub use swap::{QuoteOutcome, QuoteTicket, SwapFlow};

/// Explicit session handle: the connected account and its network.
///
/// Passed to every chain-touching operation instead of living in ambient
/// state; the signing capability itself sits behind the chain client's
/// wallet.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub account: Address,
    pub chain_id: u64,
}

/// One authoritative stage per flow instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStage {
    Idle,
    Quoting,
    AwaitingApproval,
    Approving,
    Approved,
    Executing,
    Settled,
    Failed(DexError),
}

impl FlowStage {
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, FlowStage::Failed(_))
    }
}

/// Outcome of a settled write: the confirmed receipt plus the tokens whose
/// balances dependent views should re-fetch.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub receipt: TxReceipt,
    pub refresh: Vec<Token>,
}

/// Absolute router deadline, `minutes` from now. The receiving contract is
/// the only party that enforces it.
pub fn deadline_timestamp(minutes: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    now + minutes * 60
}
