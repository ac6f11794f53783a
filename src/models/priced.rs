//! Priced trade: a trade intent sized against a live quote.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TradeIntent;

/// Live bid/ask for a broker symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: Decimal,
    pub ask: Decimal,
}

/// Broker estimate of the margin a position would reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginEstimate {
    pub margin: Decimal,
}

/// Trade intent with every sizing, pip and profit/loss figure filled in.
///
/// All per-TP vectors are parallel to `intent.take_profits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedTrade {
    pub intent: TradeIntent,

    /// Symbol with the broker suffix appended
    pub symbol: String,

    /// Bid for buys, ask for sells
    pub current_entry: Decimal,

    pub stop_loss_pips: Decimal,
    pub take_profit_pips: Vec<Decimal>,

    pub position_size_per_tp: Vec<Decimal>,
    pub potential_loss_per_tp: Vec<Decimal>,
    pub profit_per_tp: Vec<Decimal>,

    /// Sum of per-TP sizes rounded to 2 decimal places
    pub total_position_size: Decimal,
    pub potential_total_loss: Decimal,
    pub total_profit: Decimal,

    pub margin: MarginEstimate,
}

impl PricedTrade {
    /// True when the combined profit target outweighs the combined loss.
    pub fn is_favourable(&self) -> bool {
        self.total_profit > self.potential_total_loss
    }
}
