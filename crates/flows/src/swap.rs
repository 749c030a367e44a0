use std::sync::Arc;

use alloy::primitives::U256;
use chzswap_chain::ChainClient;
use chzswap_common::{AddressBook, DexError, SwapKind, SwapParams, Token};
use chzswap_config::TxSettings;
use chzswap_math::units;

use crate::{
    deadline_timestamp, ApprovalGate, FlowStage, Quote, RouteResolver, Session, Settlement,
};

/// Marker for one in-flight quote request. Any input change after
/// `begin_quote` invalidates the ticket, so a slow result for an old amount
/// is discarded instead of overwriting the live quote.
#[derive(Debug, Clone)]
pub struct QuoteTicket {
    epoch: u64,
    pub token_in: Token,
    pub token_out: Token,
    pub amount_in: U256,
}

#[derive(Debug, PartialEq, Eq)]
pub enum QuoteOutcome {
    Applied,
    Stale,
}

/// Exact-input swap flow.
///
/// Stages: Idle -> Quoting -> (AwaitingApproval -> Approving ->) Approved
/// -> Executing -> Settled, with Failed reachable from any non-terminal
/// stage. Approval need is derived state, recomputed from the live
/// allowance whenever inputs change, never toggled directly.
pub struct SwapFlow {
    chain: Arc<dyn ChainClient>,
    resolver: RouteResolver,
    gate: ApprovalGate,
    settings: TxSettings,
    token_in: Option<Token>,
    token_out: Option<Token>,
    amount_in: Option<U256>,
    quote: Option<Quote>,
    stage: FlowStage,
    epoch: u64,
}

impl SwapFlow {
    pub fn new(chain: Arc<dyn ChainClient>, book: &AddressBook, settings: TxSettings) -> Self {
        Self {
            resolver: RouteResolver::new(chain.clone(), book.wrapped_native),
            gate: ApprovalGate::new(chain.clone(), book.router, settings.gas_limit),
            chain,
            settings,
            token_in: None,
            token_out: None,
            amount_in: None,
            quote: None,
            stage: FlowStage::Idle,
            epoch: 0,
        }
    }

    pub fn stage(&self) -> &FlowStage {
        &self.stage
    }

    pub fn quote(&self) -> Option<&Quote> {
        self.quote.as_ref()
    }

    pub fn token_in(&self) -> Option<&Token> {
        self.token_in.as_ref()
    }

    pub fn token_out(&self) -> Option<&Token> {
        self.token_out.as_ref()
    }

    pub fn amount_in(&self) -> Option<U256> {
        self.amount_in
    }

    pub fn set_token_in(&mut self, token: Token) {
        self.token_in = Some(token);
        self.invalidate();
    }

    pub fn set_token_out(&mut self, token: Token) {
        self.token_out = Some(token);
        self.invalidate();
    }

    /// Swap trade direction (the arrow button).
    pub fn flip_direction(&mut self) {
        std::mem::swap(&mut self.token_in, &mut self.token_out);
        self.invalidate();
    }

    /// Validate and set the typed input amount. Malformed text is rejected
    /// here, before any chain call; an empty/zero amount clears the quote.
    pub fn set_amount_in(&mut self, text: &str) -> Result<(), DexError> {
        let token = self
            .token_in
            .as_ref()
            .ok_or(DexError::NotReady("select an input token first"))?;

        if text.trim().is_empty() {
            self.amount_in = None;
            self.invalidate();
            return Ok(());
        }

        let amount = units::parse_amount(text, token.decimals)?;
        self.amount_in = (!amount.is_zero()).then_some(amount);
        self.invalidate();
        Ok(())
    }

    /// Start a quote: captures the current inputs into a ticket and moves
    /// the flow to Quoting.
    pub fn begin_quote(&mut self) -> Result<QuoteTicket, DexError> {
        let token_in = self
            .token_in
            .clone()
            .ok_or(DexError::NotReady("input token not selected"))?;
        let token_out = self
            .token_out
            .clone()
            .ok_or(DexError::NotReady("output token not selected"))?;
        let amount_in = self
            .amount_in
            .ok_or(DexError::NotReady("no input amount"))?;

        self.stage = FlowStage::Quoting;
        Ok(QuoteTicket {
            epoch: self.epoch,
            token_in,
            token_out,
            amount_in,
        })
    }

    pub async fn fetch_quote(&self, ticket: &QuoteTicket) -> Result<Quote, DexError> {
        self.resolver
            .quote(&ticket.token_in, &ticket.token_out, ticket.amount_in)
            .await
    }

    /// Apply a finished quote. A ticket from a superseded input epoch is
    /// discarded: the displayed quote always matches the latest request.
    pub fn apply_quote(
        &mut self,
        ticket: QuoteTicket,
        result: Result<Quote, DexError>,
    ) -> QuoteOutcome {
        if ticket.epoch != self.epoch {
            tracing::debug!("discarding stale quote result");
            return QuoteOutcome::Stale;
        }

        match result {
            Ok(quote) => {
                self.quote = Some(quote);
                self.stage = FlowStage::Idle;
            }
            Err(err) => {
                self.quote = None;
                self.stage = FlowStage::Failed(err);
            }
        }
        QuoteOutcome::Applied
    }

    /// Quote in one step; staleness cannot occur while the flow is held
    /// exclusively, so the ticket round-trip collapses.
    pub async fn refresh_quote(&mut self) -> Result<(), DexError> {
        let ticket = self.begin_quote()?;
        let result = self.fetch_quote(&ticket).await;
        self.apply_quote(ticket, result);
        match &self.stage {
            FlowStage::Failed(err) => Err(err.clone()),
            _ => Ok(()),
        }
    }

    /// Recompute the derived approval stage from the live allowance.
    pub async fn sync_approval(&mut self, session: &Session) -> Result<&FlowStage, DexError> {
        let (token, amount) = match (&self.token_in, self.amount_in) {
            (Some(token), Some(amount)) if self.quote.is_some() => (token.clone(), amount),
            _ => return Err(DexError::NotReady("quote first")),
        };

        if self.gate.is_approved(session, &token, amount).await {
            self.stage = FlowStage::Approved;
        } else {
            self.stage = FlowStage::AwaitingApproval;
        }
        Ok(&self.stage)
    }

    /// User-triggered approval step.
    pub async fn approve(&mut self, session: &Session) -> Result<(), DexError> {
        if self.stage != FlowStage::AwaitingApproval {
            return Err(DexError::NotReady("approval not pending"));
        }
        let token = self
            .token_in
            .clone()
            .ok_or(DexError::NotReady("input token not selected"))?;

        self.stage = FlowStage::Approving;
        match self.gate.approve(session, &token).await {
            Ok(_) => {
                self.stage = FlowStage::Approved;
                Ok(())
            }
            Err(err) if err.is_user_rejection() => {
                self.stage = FlowStage::AwaitingApproval;
                Err(err)
            }
            Err(err) => {
                self.stage = FlowStage::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Send the swap and wait for confirmation. On settlement the inputs
    /// reset and dependent balances are flagged for refresh.
    pub async fn execute(&mut self, session: &Session) -> Result<Settlement, DexError> {
        if self.stage != FlowStage::Approved {
            return Err(DexError::NotReady("not approved"));
        }
        let quote = self
            .quote
            .clone()
            .ok_or(DexError::NotReady("no quote"))?;

        let kind = match (quote.token_in.is_native(), quote.token_out.is_native()) {
            (true, _) => SwapKind::NativeToToken,
            (_, true) => SwapKind::TokenToNative,
            _ => SwapKind::TokenToToken,
        };
        let params = SwapParams {
            kind,
            path: vec![
                self.resolver.wrap(&quote.token_in),
                self.resolver.wrap(&quote.token_out),
            ],
            amount_in: quote.amount_in,
            amount_out_min: quote.min_amount_out(self.settings.slippage_bps),
            recipient: session.account,
            deadline: deadline_timestamp(self.settings.deadline_minutes),
            gas_limit: self.settings.gas_limit,
        };

        self.stage = FlowStage::Executing;
        match self.chain.swap(params).await {
            Ok(receipt) => {
                self.stage = FlowStage::Settled;
                self.amount_in = None;
                self.quote = None;
                self.epoch += 1;
                Ok(Settlement {
                    receipt,
                    refresh: vec![quote.token_in, quote.token_out],
                })
            }
            Err(err) if err.is_user_rejection() => {
                self.stage = FlowStage::Approved;
                Err(err)
            }
            Err(err) => {
                self.stage = FlowStage::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Leave a Failed or Settled stage and start over with the same tokens.
    pub fn reset(&mut self) {
        self.amount_in = None;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.epoch += 1;
        self.quote = None;
        self.stage = FlowStage::Idle;
    }
}
