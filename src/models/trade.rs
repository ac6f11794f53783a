//! Trade intent produced by parsing a signal message.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "Buy",
            OrderSide::Sell => "Sell",
        }
    }

    /// Order type name used by MetaTrader brokers.
    pub fn broker_order_type(&self) -> &'static str {
        match self {
            OrderSide::Buy => "ORDER_TYPE_BUY",
            OrderSide::Sell => "ORDER_TYPE_SELL",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested entry for a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entry {
    /// Explicit entry price from the signal.
    Price(Decimal),
    /// No price given: enter at the live market price.
    Market,
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entry::Price(p) => write!(f, "{}", p.normalize()),
            Entry::Market => f.write_str("NOW"),
        }
    }
}

/// How the total volume of a trade is decided.
///
/// | lot size | max risk | mode                      |
/// |----------|----------|---------------------------|
/// | set      | any      | `LotSize` (split evenly)  |
/// | unset    | set      | `MaxRisk` (fixed amount)  |
/// | unset    | unset    | `RiskFactor` (of balance) |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingMode {
    LotSize(Decimal),
    MaxRisk(Decimal),
    RiskFactor(Decimal),
}

/// A validated trade parsed from a signal, before pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub order_side: OrderSide,

    /// Six-letter instrument code from the allow-list, without broker suffix
    pub symbol: String,

    pub entry: Entry,

    /// Take-profit prices in signal order (never empty)
    pub take_profits: Vec<Decimal>,

    pub stop_loss: Decimal,

    /// Provider name, either tagged in the message or the grammar default
    pub signal_source: String,

    pub signal_received_time: DateTime<Utc>,

    /// Fraction of balance risked per trade
    pub risk_factor: Decimal,

    /// Absolute amount to risk, overriding the risk factor
    #[serde(default)]
    pub max_risk: Option<Decimal>,

    /// Total volume, overriding risk-based sizing
    #[serde(default)]
    pub lot_size: Option<Decimal>,
}

impl TradeIntent {
    /// Resolve which sizing rule applies to this trade.
    pub fn sizing_mode(&self) -> SizingMode {
        match (self.lot_size, self.max_risk) {
            (Some(lots), _) => SizingMode::LotSize(lots),
            (None, Some(amount)) => SizingMode::MaxRisk(amount),
            (None, None) => SizingMode::RiskFactor(self.risk_factor),
        }
    }

    /// ISO-8601 receive time with millisecond precision, e.g. `2024-05-01T09:30:00.000Z`.
    pub fn received_time_iso(&self) -> String {
        self.signal_received_time
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}
