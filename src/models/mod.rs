//! Data models for parsed signals and priced trades.

mod priced;
mod trade;

pub use priced::{MarginEstimate, PricedTrade, Quote};
pub use trade::{Entry, OrderSide, SizingMode, TradeIntent};
