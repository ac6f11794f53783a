//! Plain-text reports sent back to the chat.
//!
//! Output is deterministic for identical inputs. Money, pips and percentages
//! are shown with two decimals (half away from zero); prices and sizes are
//! shown without trailing zeros.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::PricedTrade;
use crate::trading::{ExecutionConfig, RiskConfig};

/// Shown when a message matches no signal grammar.
pub const FORMAT_HELP: &str = "\
Please send the trade in the following format:

BUY/SELL SYMBOL @ EntryPrice
TP1: TakeProfit1
TP2: TakeProfit2
TP3: TakeProfit3
SL: StopLoss

Optional lines:
MaxRisk: amount to risk on this trade
LotSize: total lot size for the trade
Source: signal provider name

Example:
Source: 1000pipBuilder
BUY EURUSD @ 1.1200
TP1: 1.1250
TP2: 1.1300
TP3: 1.1350
SL: 1.1150
MaxRisk: 20
LotSize: 0.5

Notes:
- Without MaxRisk or LotSize the configured risk factor is used.
- LotSize takes precedence over MaxRisk.
- Leave out the @ price to enter at the market price.";

/// Full trade report for a priced trade.
pub struct TradeReport<'a> {
    trade: &'a PricedTrade,
    balance: Decimal,
    currency: &'a str,
}

impl<'a> TradeReport<'a> {
    pub fn new(trade: &'a PricedTrade, balance: Decimal, config: &'a RiskConfig) -> Self {
        Self {
            trade,
            balance,
            currency: &config.currency_symbol,
        }
    }

    fn money(&self, value: Decimal) -> String {
        format!("{}{}", self.currency, two_dp(value))
    }
}

impl fmt::Display for TradeReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trade = self.trade;
        let intent = &trade.intent;

        writeln!(f, "Signal Details")?;
        writeln!(f, "==============")?;
        writeln!(f, "Source: {}", intent.signal_source)?;
        writeln!(f, "Received Time: {}", intent.received_time_iso())?;
        writeln!(f, "Trade Type: {}", intent.order_side)?;
        writeln!(f, "Entry: {}", intent.entry)?;
        for (i, tp) in intent.take_profits.iter().enumerate() {
            writeln!(f, "TP{}: {}", i + 1, tp.normalize())?;
        }
        writeln!(f, "SL: {}", intent.stop_loss.normalize())?;
        writeln!(f)?;

        writeln!(f, "Trade Information")?;
        writeln!(f, "=================")?;
        writeln!(f, "Order Type: {}", intent.order_side)?;
        writeln!(f, "Symbol: {}", trade.symbol)?;
        writeln!(f, "Current Entry: {}", trade.current_entry.normalize())?;
        writeln!(f, "Stop Loss: {} pips", two_dp(trade.stop_loss_pips))?;
        writeln!(f, "Risk Factor: {}%", two_dp(intent.risk_factor * Decimal::ONE_HUNDRED))?;
        if let Some(max_risk) = intent.max_risk {
            writeln!(f, "Max Risk: {}", self.money(max_risk))?;
        }
        if let Some(lot_size) = intent.lot_size {
            writeln!(f, "Lot Size: {}", lot_size.normalize())?;
        }
        writeln!(f, "Balance: {}", self.money(self.balance))?;
        writeln!(f, "Margin Required: {}", self.money(trade.margin.margin))?;
        writeln!(f, "Total Position Size: {}", trade.total_position_size.normalize())?;
        writeln!(f)?;

        writeln!(f, "Position Sizes and Potential Loss per TP:")?;
        for (i, (size, loss)) in trade
            .position_size_per_tp
            .iter()
            .zip(&trade.potential_loss_per_tp)
            .enumerate()
        {
            writeln!(
                f,
                "TP{}: Position Size: {}, Potential Loss: {}",
                i + 1,
                size.normalize(),
                self.money(*loss)
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Total Potential Loss: {}", self.money(trade.potential_total_loss))?;
        writeln!(f)?;

        writeln!(f, "Potential Profit per TP:")?;
        for (i, (pips, profit)) in trade
            .take_profit_pips
            .iter()
            .zip(&trade.profit_per_tp)
            .enumerate()
        {
            writeln!(
                f,
                "TP{}: {} pips, Profit: {}",
                i + 1,
                two_dp(*pips),
                self.money(*profit)
            )?;
        }
        writeln!(f)?;
        write!(f, "Total Potential Profit: {}", self.money(trade.total_profit))
    }
}

/// Render the report for `trade`.
pub fn format_trade_report(trade: &PricedTrade, balance: Decimal, config: &RiskConfig) -> String {
    TradeReport::new(trade, balance, config).to_string()
}

/// Non-secret configuration, one setting per line.
pub fn format_config_summary(risk: &RiskConfig, execution: &ExecutionConfig) -> String {
    let rounding = match risk.rounding_factor {
        Some(step) => step.normalize().to_string(),
        None => format!("{} (derived)", risk.effective_rounding_factor().normalize()),
    };
    let providers = if risk.signal_providers.is_empty() {
        "(none)".to_string()
    } else {
        risk.signal_providers.join(", ")
    };

    let lines = [
        "Current Configuration:".to_string(),
        "======================".to_string(),
        format!("- RISK_FACTOR: {}", risk.risk_factor.normalize()),
        format!("- PIP_VALUE: {}", risk.pip_value.normalize()),
        format!("- MIN_POSITION_SIZE: {}", risk.min_position_size.normalize()),
        format!("- MAX_POSITION_SIZE: {}", risk.max_position_size.normalize()),
        format!("- ROUND_POSITION_SIZE: {}", risk.round_position_size),
        format!("- ROUND_POSITION_SIZE_FACTOR: {}", rounding),
        format!("- CURRENCY_NAME: {}", risk.currency_name),
        format!("- CURRENCY_SYMBOL: {}", risk.currency_symbol),
        format!("- TRADE_SYMBOL_SUFFIX: {}", risk.symbol_suffix),
        format!("- SIGNAL_PROVIDERS: {}", providers),
        format!("- ALLOWED_SYMBOLS: {}", risk.allowed_symbols.join(", ")),
        format!("- ENABLE_TRADE_EXECUTION: {}", execution.enable_trade_execution),
        format!("- ENABLE_TRAILING_STOP_POSITION: {}", execution.enable_trailing_stop),
        format!("- TRAILING_STOP_DISTANCE: {}", execution.trailing_stop_distance.normalize()),
        format!("- TRAILING_STOP_UNITS: {}", execution.trailing_stop_units),
        format!(
            "- CLOSE_TRAILING_TRADE_ON_SL_ONLY: {}",
            execution.close_trailing_trade_on_sl_only
        ),
    ];
    lines.join("\n")
}

fn two_dp(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Entry, MarginEstimate, OrderSide, TradeIntent};
    use chrono::DateTime;
    use rust_decimal_macros::dec;

    fn priced() -> PricedTrade {
        PricedTrade {
            intent: TradeIntent {
                order_side: OrderSide::Buy,
                symbol: "EURUSD".to_string(),
                entry: Entry::Price(dec!(1.1000)),
                take_profits: vec![dec!(1.1100), dec!(1.1200)],
                stop_loss: dec!(1.0900),
                signal_source: "1000pipBuilder".to_string(),
                signal_received_time: DateTime::from_timestamp(1_714_555_800, 0).unwrap(),
                risk_factor: dec!(0.01),
                max_risk: None,
                lot_size: None,
            },
            symbol: "EURUSD_SB".to_string(),
            current_entry: dec!(1.1005),
            stop_loss_pips: dec!(105),
            take_profit_pips: vec![dec!(95), dec!(195)],
            position_size_per_tp: vec![dec!(0.4), dec!(0.4)],
            potential_loss_per_tp: vec![dec!(42.0), dec!(42.0)],
            profit_per_tp: vec![dec!(38.0), dec!(78.0)],
            total_position_size: dec!(0.80),
            potential_total_loss: dec!(84.0),
            total_profit: dec!(116.0),
            margin: MarginEstimate { margin: dec!(293.4665) },
        }
    }

    #[test]
    fn test_trade_report_golden() {
        let report = format_trade_report(&priced(), dec!(10000), &RiskConfig::default());

        let expected = "\
Signal Details
==============
Source: 1000pipBuilder
Received Time: 2024-05-01T09:30:00.000Z
Trade Type: Buy
Entry: 1.1
TP1: 1.11
TP2: 1.12
SL: 1.09

Trade Information
=================
Order Type: Buy
Symbol: EURUSD_SB
Current Entry: 1.1005
Stop Loss: 105.00 pips
Risk Factor: 1.00%
Balance: £10000.00
Margin Required: £293.47
Total Position Size: 0.8

Position Sizes and Potential Loss per TP:
TP1: Position Size: 0.4, Potential Loss: £42.00
TP2: Position Size: 0.4, Potential Loss: £42.00

Total Potential Loss: £84.00

Potential Profit per TP:
TP1: 95.00 pips, Profit: £38.00
TP2: 195.00 pips, Profit: £78.00

Total Potential Profit: £116.00";

        assert_eq!(report, expected);
    }

    #[test]
    fn test_report_is_stable() {
        let trade = priced();
        let config = RiskConfig::default();
        assert_eq!(
            format_trade_report(&trade, dec!(10000), &config),
            format_trade_report(&trade, dec!(10000), &config)
        );
    }

    #[test]
    fn test_report_lists_overrides() {
        let mut trade = priced();
        trade.intent.max_risk = Some(dec!(20));
        trade.intent.lot_size = Some(dec!(0.5));
        let report = format_trade_report(&trade, dec!(10000), &RiskConfig::default());

        assert!(report.contains("Max Risk: £20.00\n"));
        assert!(report.contains("Lot Size: 0.5\n"));
    }

    #[test]
    fn test_market_entry_shown_as_now() {
        let mut trade = priced();
        trade.intent.entry = Entry::Market;
        let report = format_trade_report(&trade, dec!(10000), &RiskConfig::default());
        assert!(report.contains("Entry: NOW\n"));
    }

    #[test]
    fn test_two_dp_rounds_half_away_from_zero() {
        assert_eq!(two_dp(dec!(1.005)), "1.01");
        assert_eq!(two_dp(dec!(2)), "2.00");
        assert_eq!(two_dp(dec!(-0.125)), "-0.13");
    }

    #[test]
    fn test_config_summary() {
        let summary = format_config_summary(&RiskConfig::default(), &ExecutionConfig::default());
        assert!(summary.starts_with("Current Configuration:\n"));
        assert!(summary.contains("- ROUND_POSITION_SIZE_FACTOR: 0.1 (derived)"));
        assert!(summary.contains("- SIGNAL_PROVIDERS: (none)"));
        assert!(summary.contains("- ENABLE_TRADE_EXECUTION: false"));
    }
}
