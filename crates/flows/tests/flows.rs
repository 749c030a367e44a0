use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::primitives::{address, Address, B256, U256};
use chzswap_chain::ChainClient;
use chzswap_common::{
    AddLiquidityParams, AddressBook, DexError, RemoveLiquidityParams, Reserves, SwapParams, Token,
    TxReceipt, NATIVE_ADDRESS,
};
use chzswap_config::TxSettings;
use chzswap_flows::{
    AddLiquidityFlow, ApprovalGate, FlowStage, LiquidityPosition, QuoteOutcome,
    RemoveLiquidityFlow, Session, Side, SideStage, SwapFlow,
};

const WAD: u128 = 1_000_000_000_000_000_000;

const TOKEN_A: Address = address!("0x0000000000000000000000000000000000000aaa");
const TOKEN_B: Address = address!("0x0000000000000000000000000000000000000bbb");
const WRAPPED: Address = address!("0x677F7e16C7Dd57be1D4C8aD1244883214953DC47");
const ROUTER: Address = address!("0xC4E14363A01B7725532e099a67DbD17617FB7485");
const FACTORY: Address = address!("0xBDd9c322Ecf401E09C9D2Dca3be46a7E45d48BB1");
const ACCOUNT: Address = address!("0x00000000000000000000000000000000000000e0");

fn wad(n: u128) -> U256 {
    U256::from(n * WAD)
}

fn token(symbol: &str, addr: Address) -> Token {
    Token {
        address: addr,
        decimals: 18,
        symbol: symbol.to_string(),
        name: symbol.to_string(),
        logo_uri: None,
    }
}

fn native() -> Token {
    token("CHZ", NATIVE_ADDRESS)
}

fn book() -> AddressBook {
    AddressBook {
        factory: FACTORY,
        router: ROUTER,
        wrapped_native: WRAPPED,
    }
}

fn session() -> Session {
    Session {
        account: ACCOUNT,
        chain_id: 88888,
    }
}

#[derive(Clone)]
struct Pool {
    pair: Address,
    // reserves in sorted-address order
    reserve0: U256,
    reserve1: U256,
    total_supply: U256,
    lp_balances: HashMap<Address, U256>,
}

#[derive(Default)]
struct MockState {
    allowances: HashMap<(Address, Address), U256>,
    pools: HashMap<(Address, Address), Pool>,
    fail_writes: Option<DexError>,
    swaps: Vec<SwapParams>,
    adds: Vec<AddLiquidityParams>,
    removes: Vec<RemoveLiquidityParams>,
}

/// In-memory ledger standing in for the chain.
struct MockChain {
    state: Mutex<MockState>,
}

impl MockChain {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState::default()),
        })
    }

    fn with_pool(self: Arc<Self>, a: Address, b: Address, r_a: U256, r_b: U256) -> Arc<Self> {
        let (key, reserve0, reserve1) = if a < b {
            ((a, b), r_a, r_b)
        } else {
            ((b, a), r_b, r_a)
        };
        let pair = Address::with_last_byte(0x99);
        self.state.lock().unwrap().pools.insert(
            key,
            Pool {
                pair,
                reserve0,
                reserve1,
                total_supply: wad(1000),
                lp_balances: HashMap::new(),
            },
        );
        self
    }

    fn set_allowance(&self, token: Address, amount: U256) {
        self.state
            .lock()
            .unwrap()
            .allowances
            .insert((token, ACCOUNT), amount);
    }

    fn set_lp_balance(&self, a: Address, b: Address, amount: U256) {
        let key = if a < b { (a, b) } else { (b, a) };
        let mut state = self.state.lock().unwrap();
        let pool = state.pools.get_mut(&key).expect("pool not seeded");
        pool.lp_balances.insert(ACCOUNT, amount);
    }

    fn fail_next_write(&self, err: DexError) {
        self.state.lock().unwrap().fail_writes = Some(err);
    }

    fn swaps(&self) -> Vec<SwapParams> {
        self.state.lock().unwrap().swaps.clone()
    }

    fn adds(&self) -> Vec<AddLiquidityParams> {
        self.state.lock().unwrap().adds.clone()
    }

    fn removes(&self) -> Vec<RemoveLiquidityParams> {
        self.state.lock().unwrap().removes.clone()
    }

    fn take_failure(&self) -> Option<DexError> {
        self.state.lock().unwrap().fail_writes.take()
    }

    fn receipt() -> TxReceipt {
        TxReceipt {
            tx_hash: B256::repeat_byte(0x42),
            block_number: Some(1),
        }
    }
}

#[async_trait::async_trait]
impl ChainClient for MockChain {
    async fn native_balance(&self, _account: Address) -> U256 {
        wad(10_000)
    }

    async fn token_balance(&self, _token: Address, _account: Address) -> U256 {
        wad(10_000)
    }

    async fn allowance(&self, token: Address, owner: Address, _spender: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .allowances
            .get(&(token, owner))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    async fn pair_address(
        &self,
        token_a: Address,
        token_b: Address,
    ) -> Result<Option<Address>, DexError> {
        let key = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Ok(self
            .state
            .lock()
            .unwrap()
            .pools
            .get(&key)
            .map(|pool| pool.pair))
    }

    async fn reserves_for(
        &self,
        token_in: Address,
        token_out: Address,
    ) -> Result<Reserves, DexError> {
        let key = if token_in < token_out {
            (token_in, token_out)
        } else {
            (token_out, token_in)
        };
        let state = self.state.lock().unwrap();
        let pool = state.pools.get(&key).ok_or(DexError::NoLiquidity)?;
        if token_in < token_out {
            Ok(Reserves(pool.reserve0, pool.reserve1))
        } else {
            Ok(Reserves(pool.reserve1, pool.reserve0))
        }
    }

    async fn pair_state(&self, pair: Address) -> Result<(Reserves, U256), DexError> {
        let state = self.state.lock().unwrap();
        let pool = state
            .pools
            .values()
            .find(|pool| pool.pair == pair)
            .ok_or(DexError::NoLiquidity)?;
        Ok((Reserves(pool.reserve0, pool.reserve1), pool.total_supply))
    }

    async fn lp_balance(&self, pair: Address, account: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .pools
            .values()
            .find(|pool| pool.pair == pair)
            .and_then(|pool| pool.lp_balances.get(&account).copied())
            .unwrap_or(U256::ZERO)
    }

    async fn approve(
        &self,
        token: Address,
        _spender: Address,
        amount: U256,
        _gas_limit: u64,
    ) -> Result<TxReceipt, DexError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        self.state
            .lock()
            .unwrap()
            .allowances
            .insert((token, ACCOUNT), amount);
        Ok(Self::receipt())
    }

    async fn swap(&self, params: SwapParams) -> Result<TxReceipt, DexError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        self.state.lock().unwrap().swaps.push(params);
        Ok(Self::receipt())
    }

    async fn add_liquidity(&self, params: AddLiquidityParams) -> Result<TxReceipt, DexError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        self.state.lock().unwrap().adds.push(params);
        Ok(Self::receipt())
    }

    async fn remove_liquidity(&self, params: RemoveLiquidityParams) -> Result<TxReceipt, DexError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        self.state.lock().unwrap().removes.push(params);
        Ok(Self::receipt())
    }
}

fn swap_flow(chain: Arc<MockChain>) -> SwapFlow {
    SwapFlow::new(chain, &book(), TxSettings::default())
}

#[tokio::test]
async fn quote_has_positive_output_and_consistent_price() {
    let chain = MockChain::new().with_pool(TOKEN_A, TOKEN_B, wad(1000), wad(2000));
    let mut flow = swap_flow(chain);

    flow.set_token_in(token("AAA", TOKEN_A));
    flow.set_token_out(token("BBB", TOKEN_B));
    flow.set_amount_in("100").unwrap();
    flow.refresh_quote().await.unwrap();

    let quote = flow.quote().unwrap();
    assert!(quote.amount_out > U256::ZERO);

    // ~181.8 pre-fee, fee-adjusted just under it
    let out = chzswap_math::units::to_decimal(quote.amount_out, 18);
    assert!(out > 180.0 && out < 181.82, "amount out: {out}");

    let expected_price = out / 100.0;
    assert!((quote.execution_price - expected_price).abs() < 1e-9);
    assert!(quote.price_impact_pct > 0.0);
}

#[tokio::test]
async fn missing_pair_is_no_liquidity_not_transport() {
    let chain = MockChain::new();
    let mut flow = swap_flow(chain);

    flow.set_token_in(token("AAA", TOKEN_A));
    flow.set_token_out(token("BBB", TOKEN_B));
    flow.set_amount_in("1").unwrap();

    let err = flow.refresh_quote().await.unwrap_err();
    assert_eq!(err, DexError::NoLiquidity);
    assert_eq!(*flow.stage(), FlowStage::Failed(DexError::NoLiquidity));
}

#[tokio::test]
async fn native_input_is_always_approved() {
    let chain = MockChain::new().with_pool(WRAPPED, TOKEN_B, wad(1000), wad(2000));

    let gate = ApprovalGate::new(chain.clone(), ROUTER, 300_000);
    assert!(gate.is_approved(&session(), &native(), U256::MAX).await);

    let mut flow = swap_flow(chain);
    flow.set_token_in(native());
    flow.set_token_out(token("BBB", TOKEN_B));
    flow.set_amount_in("5").unwrap();
    flow.refresh_quote().await.unwrap();

    // no approval round-trip for the native asset
    assert_eq!(*flow.sync_approval(&session()).await.unwrap(), FlowStage::Approved);
}

#[tokio::test]
async fn approval_satisfies_subsequent_checks() {
    let chain = MockChain::new().with_pool(TOKEN_A, TOKEN_B, wad(1000), wad(2000));
    let mut flow = swap_flow(chain.clone());

    flow.set_token_in(token("AAA", TOKEN_A));
    flow.set_token_out(token("BBB", TOKEN_B));
    flow.set_amount_in("100").unwrap();
    flow.refresh_quote().await.unwrap();

    assert_eq!(
        *flow.sync_approval(&session()).await.unwrap(),
        FlowStage::AwaitingApproval
    );

    flow.approve(&session()).await.unwrap();
    assert_eq!(*flow.stage(), FlowStage::Approved);

    // the unlimited approval covers any later amount
    let gate = ApprovalGate::new(chain, ROUTER, 300_000);
    assert!(
        gate.is_approved(&session(), &token("AAA", TOKEN_A), wad(1_000_000))
            .await
    );
}

#[tokio::test]
async fn settled_swap_clears_inputs_and_requests_refresh() {
    let chain = MockChain::new().with_pool(TOKEN_A, TOKEN_B, wad(1000), wad(2000));
    let mut flow = swap_flow(chain.clone());

    flow.set_token_in(token("AAA", TOKEN_A));
    flow.set_token_out(token("BBB", TOKEN_B));
    flow.set_amount_in("100").unwrap();
    flow.refresh_quote().await.unwrap();
    let min_out = flow.quote().unwrap().min_amount_out(50);

    flow.sync_approval(&session()).await.unwrap();
    flow.approve(&session()).await.unwrap();
    let settlement = flow.execute(&session()).await.unwrap();

    assert_eq!(*flow.stage(), FlowStage::Settled);
    assert!(flow.amount_in().is_none());
    assert!(flow.quote().is_none());
    assert_eq!(settlement.refresh.len(), 2);

    let swaps = chain.swaps();
    assert_eq!(swaps.len(), 1);
    assert_eq!(swaps[0].amount_in, wad(100));
    assert_eq!(swaps[0].amount_out_min, min_out);
    assert_eq!(swaps[0].path, vec![TOKEN_A, TOKEN_B]);
    assert_eq!(swaps[0].recipient, ACCOUNT);
    assert!(swaps[0].deadline > 0);
}

#[tokio::test]
async fn stale_quote_result_is_discarded() {
    let chain = MockChain::new().with_pool(TOKEN_A, TOKEN_B, wad(1000), wad(2000));
    let mut flow = swap_flow(chain);

    flow.set_token_in(token("AAA", TOKEN_A));
    flow.set_token_out(token("BBB", TOKEN_B));
    flow.set_amount_in("100").unwrap();

    let ticket = flow.begin_quote().unwrap();
    let result = flow.fetch_quote(&ticket).await;

    // the user retypes the amount while the old quote is in flight
    flow.set_amount_in("50").unwrap();
    assert_eq!(flow.apply_quote(ticket, result), QuoteOutcome::Stale);
    assert!(flow.quote().is_none());

    // the fresh request reflects the latest amount
    flow.refresh_quote().await.unwrap();
    assert_eq!(flow.quote().unwrap().amount_in, wad(50));
}

#[tokio::test]
async fn user_rejection_returns_to_pre_action_stage() {
    let chain = MockChain::new().with_pool(TOKEN_A, TOKEN_B, wad(1000), wad(2000));
    let mut flow = swap_flow(chain.clone());

    flow.set_token_in(token("AAA", TOKEN_A));
    flow.set_token_out(token("BBB", TOKEN_B));
    flow.set_amount_in("100").unwrap();
    flow.refresh_quote().await.unwrap();
    flow.sync_approval(&session()).await.unwrap();

    chain.fail_next_write(DexError::UserRejected);
    assert_eq!(flow.approve(&session()).await.unwrap_err(), DexError::UserRejected);
    assert_eq!(*flow.stage(), FlowStage::AwaitingApproval);

    flow.approve(&session()).await.unwrap();
    chain.fail_next_write(DexError::UserRejected);
    assert_eq!(flow.execute(&session()).await.unwrap_err(), DexError::UserRejected);
    assert_eq!(*flow.stage(), FlowStage::Approved);

    // a retry without interference settles
    flow.execute(&session()).await.unwrap();
    assert_eq!(*flow.stage(), FlowStage::Settled);
}

#[tokio::test]
async fn revert_terminates_the_flow() {
    let chain = MockChain::new().with_pool(TOKEN_A, TOKEN_B, wad(1000), wad(2000));
    let mut flow = swap_flow(chain.clone());

    flow.set_token_in(token("AAA", TOKEN_A));
    flow.set_token_out(token("BBB", TOKEN_B));
    flow.set_amount_in("100").unwrap();
    flow.refresh_quote().await.unwrap();
    flow.sync_approval(&session()).await.unwrap();
    flow.approve(&session()).await.unwrap();

    chain.fail_next_write(DexError::Reverted("EXPIRED".into()));
    let err = flow.execute(&session()).await.unwrap_err();
    assert!(matches!(err, DexError::Reverted(_)));
    assert!(flow.stage().is_terminal_failure());

    // explicit reset is required after a terminal failure
    flow.reset();
    assert_eq!(*flow.stage(), FlowStage::Idle);
}

#[tokio::test]
async fn add_liquidity_waits_for_both_approvals() {
    let chain = MockChain::new().with_pool(TOKEN_A, TOKEN_B, wad(1000), wad(2000));
    // token B already carries a standing approval, token A does not
    chain.set_allowance(TOKEN_B, U256::MAX);

    let mut flow = AddLiquidityFlow::new(chain.clone(), &book(), TxSettings::default());
    flow.set_side(Side::A, token("AAA", TOKEN_A), "50").unwrap();
    flow.set_side(Side::B, token("BBB", TOKEN_B), "100").unwrap();
    flow.sync_approvals(&session()).await.unwrap();

    assert_eq!(flow.side_stage(Side::A), SideStage::AwaitingApproval);
    assert_eq!(flow.side_stage(Side::B), SideStage::Approved);

    // the add must not go out while a side is unapproved
    let err = flow.execute(&session()).await.unwrap_err();
    assert!(matches!(err, DexError::NotReady(_)));
    assert!(chain.adds().is_empty());

    flow.approve_side(&session(), Side::A).await.unwrap();
    let settlement = flow.execute(&session()).await.unwrap();
    assert_eq!(*flow.stage(), FlowStage::Settled);
    assert_eq!(settlement.refresh.len(), 2);

    let adds = chain.adds();
    assert_eq!(adds.len(), 1);
    assert_eq!(adds[0].amount_a_desired, wad(50));
    assert_eq!(adds[0].amount_b_desired, wad(100));
    // 0.5% slippage floors
    assert_eq!(adds[0].amount_a_min, wad(50) * U256::from(9950u64) / U256::from(10_000u64));
}

#[tokio::test]
async fn native_deposit_side_is_rejected() {
    let chain = MockChain::new();
    let mut flow = AddLiquidityFlow::new(chain, &book(), TxSettings::default());
    let err = flow.set_side(Side::A, native(), "10").unwrap_err();
    assert_eq!(err, DexError::InvalidRoute);
}

#[tokio::test]
async fn remove_with_zero_balance_is_refused() {
    let chain = MockChain::new().with_pool(TOKEN_A, TOKEN_B, wad(1000), wad(2000));
    let position = LiquidityPosition {
        pair: Address::with_last_byte(0x99),
        token_a: token("AAA", TOKEN_A),
        token_b: token("BBB", TOKEN_B),
        lp_balance: U256::ZERO,
        amount_a: U256::ZERO,
        amount_b: U256::ZERO,
    };

    let err = RemoveLiquidityFlow::new(chain, TxSettings::default(), position).unwrap_err();
    assert_eq!(err, DexError::NothingToRemove);
}

#[tokio::test]
async fn remove_sends_slippage_protected_minimums() {
    let chain = MockChain::new().with_pool(TOKEN_A, TOKEN_B, wad(1000), wad(2000));
    chain.set_lp_balance(TOKEN_A, TOKEN_B, wad(100));

    let positions =
        chzswap_flows::fetch_positions(chain.as_ref(), ACCOUNT, &[
            token("AAA", TOKEN_A),
            token("BBB", TOKEN_B),
            native(),
        ])
        .await;
    assert_eq!(positions.len(), 1);
    let position = positions[0].clone();
    // 100 of 1000 supply redeems 10% of each reserve
    assert_eq!(position.amount_a, wad(100));
    assert_eq!(position.amount_b, wad(200));

    let mut flow = RemoveLiquidityFlow::new(chain.clone(), TxSettings::default(), position).unwrap();
    flow.set_amount("100").unwrap();
    flow.execute(&session()).await.unwrap();
    assert_eq!(*flow.stage(), FlowStage::Settled);

    let removes = chain.removes();
    assert_eq!(removes.len(), 1);
    assert_eq!(removes[0].liquidity, wad(100));
    // minimums protect the expected redemption less 0.5%
    assert_eq!(
        removes[0].amount_a_min,
        wad(100) * U256::from(9950u64) / U256::from(10_000u64)
    );
    assert_eq!(
        removes[0].amount_b_min,
        wad(200) * U256::from(9950u64) / U256::from(10_000u64)
    );
}

#[tokio::test]
async fn burning_more_than_held_is_invalid() {
    let chain = MockChain::new().with_pool(TOKEN_A, TOKEN_B, wad(1000), wad(2000));
    chain.set_lp_balance(TOKEN_A, TOKEN_B, wad(10));

    let positions = chzswap_flows::fetch_positions(
        chain.as_ref(),
        ACCOUNT,
        &[token("AAA", TOKEN_A), token("BBB", TOKEN_B)],
    )
    .await;
    let mut flow =
        RemoveLiquidityFlow::new(chain, TxSettings::default(), positions[0].clone()).unwrap();

    assert!(matches!(
        flow.set_amount("11").unwrap_err(),
        DexError::InvalidAmount(_)
    ));
    assert!(flow.set_amount("10").is_ok());
}
