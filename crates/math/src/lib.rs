pub mod cpmm;
pub mod units;

pub use cpmm::{amount_out, execution_price, mid_price, price_impact_pct, FEE_PER_MILLE};
pub use units::{format_amount, parse_amount, to_decimal};
