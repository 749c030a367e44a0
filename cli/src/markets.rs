use alloy::primitives::{address, Address};

/// A pool with a charting page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Market {
    pub label: &'static str,
    pub pool: Address,
}

/// Markets offered on the charts surface. The first entry is the default.
pub const MARKETS: [Market; 4] = [
    Market {
        label: "DSwap/wCHZ",
        pool: address!("0xb0a8310f11be8dfeea4e200b9935b815f3faa2fa"),
    },
    Market {
        label: "PEPPER/DSwap",
        pool: address!("0x3159a90f80fa4aeccc044923b7a504a98417145d"),
    },
    Market {
        label: "CHZ/USDT",
        pool: address!("0x14a634bf2d5be1c6ad7790d958e748174d8a2d43"),
    },
    Market {
        label: "PEPPER/wCHZ",
        pool: address!("0x5f3efab95224dbb5490e8ddc8d2c1daad4c0db37"),
    },
];

/// Pick a market from an optional request. A request that names a pool
/// outside the offered set falls back to the default instead of charting an
/// arbitrary address.
pub fn select(requested: Option<&str>) -> &'static Market {
    let Some(requested) = requested else {
        return &MARKETS[0];
    };
    let by_address = requested
        .parse::<Address>()
        .ok()
        .and_then(|pool| MARKETS.iter().find(|market| market.pool == pool));
    by_address
        .or_else(|| {
            MARKETS
                .iter()
                .find(|market| market.label.eq_ignore_ascii_case(requested))
        })
        .unwrap_or(&MARKETS[0])
}

/// Embedded GeckoTerminal chart for one pool.
pub fn chart_url(market: &Market, chart_type: &str, resolution: &str) -> String {
    format!(
        "https://www.geckoterminal.com/chiliz-chain/pools/{}?embed=1&info=0&swaps=0&chart_type={chart_type}&resolution={resolution}&tv_chart=1",
        market.pool
    )
}
