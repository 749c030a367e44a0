use alloy::primitives::{address, Address};
use anyhow::Result;
use chzswap_common::AddressBook;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Transaction knobs applied to every write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TxSettings {
    /// Slippage tolerance in basis points (50 = 0.5%).
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u32,
    /// Router deadline, minutes from send time.
    #[serde(default = "default_deadline_minutes")]
    pub deadline_minutes: u64,
    /// Fixed gas ceiling per write.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
}

impl Default for TxSettings {
    fn default() -> Self {
        Self {
            slippage_bps: default_slippage_bps(),
            deadline_minutes: default_deadline_minutes(),
            gas_limit: default_gas_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rpc_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_factory")]
    pub factory: Address,
    #[serde(default = "default_router")]
    pub router: Address,
    #[serde(default = "default_wrapped_native")]
    pub wrapped_native: Address,
    #[serde(default = "default_token_list_url")]
    pub token_list_url: String,
    #[serde(default)]
    pub tx: TxSettings,
}

impl Config {
    pub fn load(path: PathBuf) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    pub fn address_book(&self) -> AddressBook {
        AddressBook {
            factory: self.factory,
            router: self.router,
            wrapped_native: self.wrapped_native,
        }
    }
}

fn default_chain_id() -> u64 {
    88888
}

fn default_factory() -> Address {
    address!("0xBDd9c322Ecf401E09C9D2Dca3be46a7E45d48BB1")
}

fn default_router() -> Address {
    address!("0xC4E14363A01B7725532e099a67DbD17617FB7485")
}

fn default_wrapped_native() -> Address {
    address!("0x677F7e16C7Dd57be1D4C8aD1244883214953DC47")
}

fn default_token_list_url() -> String {
    "https://ipfs.io/ipfs/bafkreibn42b7pcjspbzgamdvric52anjfdvpzqpe7wmc3dhhq62dlfagxi".to_string()
}

fn default_slippage_bps() -> u32 {
    50
}

fn default_deadline_minutes() -> u64 {
    20
}

fn default_gas_limit() -> u64 {
    300_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"rpc_url": "wss://rpc.chiliz.example"}"#).unwrap();

        assert_eq!(config.chain_id, 88888);
        assert_eq!(config.router, default_router());
        assert_eq!(config.tx.slippage_bps, 50);
        assert_eq!(config.tx.deadline_minutes, 20);
        assert_eq!(config.tx.gas_limit, 300_000);
    }

    #[test]
    fn explicit_settings_override_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "rpc_url": "wss://rpc.chiliz.example",
                "chain_id": 88882,
                "tx": { "slippage_bps": 100 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.chain_id, 88882);
        assert_eq!(config.tx.slippage_bps, 100);
        // untouched knobs keep defaults
        assert_eq!(config.tx.deadline_minutes, 20);
    }
}
