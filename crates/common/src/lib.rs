use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

pub mod error;

pub use error::DexError;

/// Sentinel address for the chain's native asset (CHZ).
pub const NATIVE_ADDRESS: Address = Address::ZERO;

/// Token metadata. Two tokens are the same token iff their addresses match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
}

impl Token {
    pub fn is_native(&self) -> bool {
        self.address == NATIVE_ADDRESS
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Token {}

/// Reserve pair for a trade direction: (reserve of token_in, reserve of token_out).
#[derive(Debug, Clone, Copy)]
pub struct Reserves(pub U256, pub U256);

#[derive(Clone, Debug)]
pub struct AddressBook {
    pub factory: Address,
    pub router: Address,
    /// Wrapped-native token the router trades through in place of the sentinel.
    pub wrapped_native: Address,
}

/// Confirmed transaction outcome returned by every write.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapKind {
    TokenToToken,
    NativeToToken,
    TokenToNative,
}

/// Parameters of an exact-input swap send.
#[derive(Debug, Clone)]
pub struct SwapParams {
    pub kind: SwapKind,
    /// Router path of ERC-20 addresses; native endpoints already wrapped.
    pub path: Vec<Address>,
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub recipient: Address,
    /// Unix timestamp after which the router must reject the swap.
    pub deadline: u64,
    pub gas_limit: u64,
}

#[derive(Debug, Clone)]
pub struct AddLiquidityParams {
    pub token_a: Address,
    pub token_b: Address,
    pub amount_a_desired: U256,
    pub amount_b_desired: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub recipient: Address,
    pub deadline: u64,
    pub gas_limit: u64,
}

#[derive(Debug, Clone)]
pub struct RemoveLiquidityParams {
    pub token_a: Address,
    pub token_b: Address,
    pub liquidity: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub recipient: Address,
    pub deadline: u64,
    pub gas_limit: u64,
}
