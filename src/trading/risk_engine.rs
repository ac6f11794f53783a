//! Pricing engine: turns a trade intent into a fully sized trade.
//!
//! Steps, in order:
//! 1. Append the broker suffix to the symbol.
//! 2. Take the live entry (bid for buys, ask for sells).
//! 3. Measure stop-loss and take-profit distances in pips.
//! 4. Split the risk budget across take-profits and size each one.
//! 5. Sum losses and profits, then ask the broker for the margin.
//!
//! Quote or margin failures abort the whole pricing; nothing is retried here.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info};

use crate::broker::{MarginProvider, QuoteProvider};
use crate::error::PricingError;
use crate::models::{OrderSide, PricedTrade, TradeIntent};

use super::position_sizer::{pip_unit, pips_between};
use super::{PositionSizer, RiskConfig};

/// Prices trade intents under a fixed risk configuration.
pub struct RiskEngine {
    sizer: PositionSizer,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            sizer: PositionSizer::new(config),
        }
    }

    pub fn config(&self) -> &RiskConfig {
        self.sizer.config()
    }

    /// Size `intent` against `balance` using live broker data.
    pub async fn price<Q, M>(
        &self,
        intent: &TradeIntent,
        balance: Decimal,
        quotes: &Q,
        margins: &M,
    ) -> Result<PricedTrade, PricingError>
    where
        Q: QuoteProvider + ?Sized,
        M: MarginProvider + ?Sized,
    {
        let config = self.sizer.config();
        let symbol = format!("{}{}", intent.symbol, config.symbol_suffix);

        let quote = quotes
            .quote(&symbol)
            .await
            .map_err(|source| PricingError::Quote {
                symbol: symbol.clone(),
                source,
            })?;

        if quote.bid <= Decimal::ZERO || quote.ask <= Decimal::ZERO {
            return Err(PricingError::InvalidQuote {
                symbol,
                bid: quote.bid.to_string(),
                ask: quote.ask.to_string(),
            });
        }

        let current_entry = match intent.order_side {
            OrderSide::Buy => quote.bid,
            OrderSide::Sell => quote.ask,
        };

        let overflow = || PricingError::Overflow {
            symbol: symbol.clone(),
        };

        let pip = pip_unit(&symbol);
        let stop_loss_pips =
            pips_between(intent.stop_loss, current_entry, pip).ok_or_else(overflow)?;
        if stop_loss_pips.is_zero() {
            return Err(PricingError::ZeroStopDistance {
                stop_loss: intent.stop_loss.to_string(),
                entry: current_entry.to_string(),
            });
        }

        let mode = intent.sizing_mode();
        let tp_count = intent.take_profits.len();
        let position_size_per_tp = self
            .sizer
            .size_per_tp(mode, balance, tp_count, stop_loss_pips)
            .ok_or_else(overflow)?;

        debug!(
            symbol = %symbol,
            mode = ?mode,
            stop_loss_pips = %stop_loss_pips,
            sizes = ?position_size_per_tp,
            "Sized take-profits"
        );

        let pip_value = config.pip_value;
        let potential_loss_per_tp = position_size_per_tp
            .iter()
            .map(|size| size.checked_mul(pip_value)?.checked_mul(stop_loss_pips))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(overflow)?;
        let potential_total_loss = checked_sum(&potential_loss_per_tp).ok_or_else(overflow)?;

        let take_profit_pips = intent
            .take_profits
            .iter()
            .map(|tp| pips_between(*tp, current_entry, pip))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(overflow)?;
        let profit_per_tp = position_size_per_tp
            .iter()
            .zip(&take_profit_pips)
            .map(|(size, pips)| size.checked_mul(pip_value)?.checked_mul(*pips))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(overflow)?;
        let total_profit = checked_sum(&profit_per_tp).ok_or_else(overflow)?;

        let total_position_size = checked_sum(&position_size_per_tp)
            .ok_or_else(overflow)?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let margin = margins
            .margin(&symbol, intent.order_side, total_position_size, current_entry)
            .await
            .map_err(|source| PricingError::Margin {
                symbol: symbol.clone(),
                source,
            })?;

        info!(
            symbol = %symbol,
            side = %intent.order_side,
            entry = %current_entry,
            total_size = %total_position_size,
            total_loss = %potential_total_loss,
            total_profit = %total_profit,
            "Priced trade"
        );

        Ok(PricedTrade {
            intent: intent.clone(),
            symbol,
            current_entry,
            stop_loss_pips,
            take_profit_pips,
            position_size_per_tp,
            potential_loss_per_tp,
            profit_per_tp,
            total_position_size,
            potential_total_loss,
            total_profit,
            margin,
        })
    }
}

fn checked_sum(values: &[Decimal]) -> Option<Decimal> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(*value))
}
