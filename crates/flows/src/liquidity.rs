use std::sync::Arc;

use alloy::primitives::U256;
use chzswap_chain::ChainClient;
use chzswap_common::{
    AddLiquidityParams, AddressBook, DexError, RemoveLiquidityParams, Token,
};
use chzswap_config::TxSettings;
use chzswap_math::units;

use crate::{
    deadline_timestamp, ApprovalGate, FlowStage, LiquidityPosition, Session, Settlement,
};

const BPS: u64 = 10_000;

fn less_slippage(amount: U256, slippage_bps: u32) -> U256 {
    let keep = U256::from(BPS - u64::from(slippage_bps.min(10_000)));
    amount * keep / U256::from(BPS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

/// Approval sub-flow stage for one deposit side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideStage {
    Unchecked,
    AwaitingApproval,
    Approving,
    Approved,
}

#[derive(Debug, Clone)]
struct Deposit {
    token: Token,
    amount: U256,
    stage: SideStage,
}

/// Add-liquidity flow: two independent approval sub-flows, one per token,
/// both of which must reach Approved before the combined add is sent.
pub struct AddLiquidityFlow {
    chain: Arc<dyn ChainClient>,
    gate: ApprovalGate,
    settings: TxSettings,
    side_a: Option<Deposit>,
    side_b: Option<Deposit>,
    stage: FlowStage,
}

impl AddLiquidityFlow {
    pub fn new(chain: Arc<dyn ChainClient>, book: &AddressBook, settings: TxSettings) -> Self {
        Self {
            gate: ApprovalGate::new(chain.clone(), book.router, settings.gas_limit),
            chain,
            settings,
            side_a: None,
            side_b: None,
            stage: FlowStage::Idle,
        }
    }

    pub fn stage(&self) -> &FlowStage {
        &self.stage
    }

    pub fn side_stage(&self, side: Side) -> SideStage {
        self.deposit(side)
            .map(|d| d.stage.clone())
            .unwrap_or(SideStage::Unchecked)
    }

    /// Set one deposit side from typed input. Pools hold the wrapped token,
    /// so the native sentinel is not a valid deposit.
    pub fn set_side(&mut self, side: Side, token: Token, amount_text: &str) -> Result<(), DexError> {
        if token.is_native() {
            return Err(DexError::InvalidRoute);
        }
        let amount = units::parse_amount(amount_text, token.decimals)?;
        if amount.is_zero() {
            return Err(DexError::InvalidAmount(amount_text.to_string()));
        }

        let deposit = Deposit {
            token,
            amount,
            stage: SideStage::Unchecked,
        };
        match side {
            Side::A => self.side_a = Some(deposit),
            Side::B => self.side_b = Some(deposit),
        }
        self.stage = FlowStage::Idle;
        Ok(())
    }

    /// Recompute both derived approval stages from live allowances.
    pub async fn sync_approvals(&mut self, session: &Session) -> Result<(), DexError> {
        for side in [Side::A, Side::B] {
            let (token, amount) = {
                let deposit = self
                    .deposit(side)
                    .ok_or(DexError::NotReady("both deposit sides must be set"))?;
                (deposit.token.clone(), deposit.amount)
            };
            let approved = self.gate.is_approved(session, &token, amount).await;
            if let Some(deposit) = self.deposit_mut(side) {
                // an in-flight approval is not overwritten by a re-check
                if deposit.stage != SideStage::Approving {
                    deposit.stage = if approved {
                        SideStage::Approved
                    } else {
                        SideStage::AwaitingApproval
                    };
                }
            }
        }
        Ok(())
    }

    /// User-triggered approval for one side; the other side is untouched.
    pub async fn approve_side(&mut self, session: &Session, side: Side) -> Result<(), DexError> {
        let token = {
            let deposit = self
                .deposit(side)
                .ok_or(DexError::NotReady("deposit side not set"))?;
            if deposit.stage != SideStage::AwaitingApproval {
                return Err(DexError::NotReady("approval not pending for this side"));
            }
            deposit.token.clone()
        };

        self.set_side_stage(side, SideStage::Approving);
        match self.gate.approve(session, &token).await {
            Ok(_) => {
                self.set_side_stage(side, SideStage::Approved);
                Ok(())
            }
            Err(err) if err.is_user_rejection() => {
                self.set_side_stage(side, SideStage::AwaitingApproval);
                Err(err)
            }
            Err(err) => {
                self.stage = FlowStage::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Send the combined add once both sides are approved.
    pub async fn execute(&mut self, session: &Session) -> Result<Settlement, DexError> {
        let (a, b) = match (&self.side_a, &self.side_b) {
            (Some(a), Some(b)) => (a.clone(), b.clone()),
            _ => return Err(DexError::NotReady("both deposit sides must be set")),
        };
        if a.stage != SideStage::Approved || b.stage != SideStage::Approved {
            return Err(DexError::NotReady("both tokens must be approved"));
        }
        if a.token.address == b.token.address {
            return Err(DexError::InvalidRoute);
        }

        let params = AddLiquidityParams {
            token_a: a.token.address,
            token_b: b.token.address,
            amount_a_desired: a.amount,
            amount_b_desired: b.amount,
            amount_a_min: less_slippage(a.amount, self.settings.slippage_bps),
            amount_b_min: less_slippage(b.amount, self.settings.slippage_bps),
            recipient: session.account,
            deadline: deadline_timestamp(self.settings.deadline_minutes),
            gas_limit: self.settings.gas_limit,
        };

        self.stage = FlowStage::Executing;
        match self.chain.add_liquidity(params).await {
            Ok(receipt) => {
                self.stage = FlowStage::Settled;
                self.side_a = None;
                self.side_b = None;
                Ok(Settlement {
                    receipt,
                    refresh: vec![a.token, b.token],
                })
            }
            Err(err) if err.is_user_rejection() => {
                self.stage = FlowStage::Idle;
                Err(err)
            }
            Err(err) => {
                self.stage = FlowStage::Failed(err.clone());
                Err(err)
            }
        }
    }

    fn deposit(&self, side: Side) -> Option<&Deposit> {
        match side {
            Side::A => self.side_a.as_ref(),
            Side::B => self.side_b.as_ref(),
        }
    }

    fn deposit_mut(&mut self, side: Side) -> Option<&mut Deposit> {
        match side {
            Side::A => self.side_a.as_mut(),
            Side::B => self.side_b.as_mut(),
        }
    }

    fn set_side_stage(&mut self, side: Side, stage: SideStage) {
        if let Some(deposit) = self.deposit_mut(side) {
            deposit.stage = stage;
        }
    }
}

/// Remove-liquidity flow. Burning LP tokens through the router needs no
/// approval step, so the machine is Idle -> Executing -> Settled.
///
/// Minimum-amount guards are derived from the position's current
/// redeemable amounts less slippage tolerance; sending zero minimums would
/// let a sandwiching trade drain the withdrawal.
pub struct RemoveLiquidityFlow {
    chain: Arc<dyn ChainClient>,
    settings: TxSettings,
    position: LiquidityPosition,
    amount: Option<U256>,
    stage: FlowStage,
}

impl RemoveLiquidityFlow {
    /// Refuses a position with nothing to burn: the caller must not offer
    /// a remove action for an empty balance.
    pub fn new(
        chain: Arc<dyn ChainClient>,
        settings: TxSettings,
        position: LiquidityPosition,
    ) -> Result<Self, DexError> {
        if position.lp_balance.is_zero() {
            return Err(DexError::NothingToRemove);
        }
        Ok(Self {
            chain,
            settings,
            position,
            amount: None,
            stage: FlowStage::Idle,
        })
    }

    pub fn stage(&self) -> &FlowStage {
        &self.stage
    }

    pub fn position(&self) -> &LiquidityPosition {
        &self.position
    }

    /// LP amount to burn; LP tokens always carry 18 decimals.
    pub fn set_amount(&mut self, text: &str) -> Result<(), DexError> {
        let amount = units::parse_amount(text, 18)?;
        if amount.is_zero() || amount > self.position.lp_balance {
            return Err(DexError::InvalidAmount(text.to_string()));
        }
        self.amount = Some(amount);
        self.stage = FlowStage::Idle;
        Ok(())
    }

    pub async fn execute(&mut self, session: &Session) -> Result<Settlement, DexError> {
        let amount = self.amount.ok_or(DexError::NotReady("no burn amount"))?;

        // expected redemption for the burned share, from the live pool state
        let (reserves, total_supply) = self.chain.pair_state(self.position.pair).await?;
        if total_supply.is_zero() {
            return Err(DexError::NoLiquidity);
        }
        let expected_a = amount * reserves.0 / total_supply;
        let expected_b = amount * reserves.1 / total_supply;

        let params = RemoveLiquidityParams {
            token_a: self.position.token_a.address,
            token_b: self.position.token_b.address,
            liquidity: amount,
            amount_a_min: less_slippage(expected_a, self.settings.slippage_bps),
            amount_b_min: less_slippage(expected_b, self.settings.slippage_bps),
            recipient: session.account,
            deadline: deadline_timestamp(self.settings.deadline_minutes),
            gas_limit: self.settings.gas_limit,
        };

        self.stage = FlowStage::Executing;
        match self.chain.remove_liquidity(params).await {
            Ok(receipt) => {
                self.stage = FlowStage::Settled;
                self.amount = None;
                Ok(Settlement {
                    receipt,
                    refresh: vec![
                        self.position.token_a.clone(),
                        self.position.token_b.clone(),
                    ],
                })
            }
            Err(err) if err.is_user_rejection() => {
                self.stage = FlowStage::Idle;
                Err(err)
            }
            Err(err) => {
                self.stage = FlowStage::Failed(err.clone());
                Err(err)
            }
        }
    }
}
