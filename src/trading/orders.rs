//! Order plan: one market order per take-profit of a priced trade.
//!
//! Sending the orders is left to the broker integration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::models::{OrderSide, PricedTrade};

use super::ExecutionConfig;

/// Broker comments are cut to this many characters.
pub const MAX_COMMENT_LEN: usize = 31;

/// Distance kept between the trailing stop and its activation threshold.
const TRAILING_STOP_GAP_PIPS: Decimal = dec!(2);

/// Trailing stop attached to follow-up orders once TP1 is reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrailingStop {
    /// Pips of favourable movement that activate the trail
    pub threshold_pips: Decimal,
    /// Pips behind the price at which the stop then sits
    pub stop_loss_pips: Decimal,
    pub units: String,
    pub stop_price_base: &'static str,
}

/// A market order ready for the broker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub side: OrderSide,
    /// MetaTrader order type, e.g. `ORDER_TYPE_BUY`
    pub order_type: &'static str,
    pub symbol: String,
    pub volume: Decimal,
    pub stop_loss: Decimal,
    /// `None` when the order is closed only by its (trailing) stop
    pub take_profit: Option<Decimal>,
    pub comment: String,
    pub trailing_stop: Option<TrailingStop>,
}

/// Build the orders for `trade`, one per take-profit in signal order.
///
/// TP1 always carries its take-profit. Later orders get the trailing stop when
/// enabled, and drop their take-profit when trades close on stop-loss only.
pub fn plan_orders(trade: &PricedTrade, config: &ExecutionConfig) -> Vec<OrderRequest> {
    let trailing_stop = match (config.enable_trailing_stop, trade.take_profit_pips.first()) {
        (true, Some(first_tp_pips)) => Some(TrailingStop {
            threshold_pips: *first_tp_pips,
            stop_loss_pips: *first_tp_pips - TRAILING_STOP_GAP_PIPS,
            units: config.trailing_stop_units.clone(),
            stop_price_base: "CURRENT_PRICE",
        }),
        _ => None,
    };

    trade
        .intent
        .take_profits
        .iter()
        .zip(&trade.position_size_per_tp)
        .enumerate()
        .map(|(i, (tp, volume))| {
            let follow_up = i > 0;
            OrderRequest {
                side: trade.intent.order_side,
                order_type: trade.intent.order_side.broker_order_type(),
                symbol: trade.symbol.clone(),
                volume: *volume,
                stop_loss: trade.intent.stop_loss,
                take_profit: if follow_up && config.close_trailing_trade_on_sl_only {
                    None
                } else {
                    Some(*tp)
                },
                comment: order_comment(&trade.intent.signal_source, i + 1),
                trailing_stop: if follow_up { trailing_stop.clone() } else { None },
            }
        })
        .collect()
}

/// `"<source> TP<n>"`, cut to [`MAX_COMMENT_LEN`] characters.
pub fn order_comment(source: &str, tp_number: usize) -> String {
    format!("{} TP{}", source, tp_number)
        .chars()
        .take(MAX_COMMENT_LEN)
        .collect()
}
