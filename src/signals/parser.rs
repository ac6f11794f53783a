//! Signal parser: turns a raw message into a [`TradeIntent`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::ParseError;
use crate::models::TradeIntent;
use crate::trading::RiskConfig;

use super::grammar::{leading_number, GrammarRegistry};

const SOURCE_LABEL: &str = "SOURCE:";
const MAX_RISK_LABEL: &str = "MAXRISK:";
const LOT_SIZE_LABEL: &str = "LOTSIZE:";

/// Parses signal messages with an ordered grammar registry.
pub struct SignalParser {
    config: RiskConfig,
    registry: GrammarRegistry,
}

impl SignalParser {
    /// Parser with the standard grammar order.
    pub fn new(config: RiskConfig) -> Self {
        let registry = GrammarRegistry::from_config(&config);
        Self { config, registry }
    }

    /// Parser with a caller-chosen grammar order.
    pub fn with_registry(config: RiskConfig, registry: GrammarRegistry) -> Self {
        Self { config, registry }
    }

    pub fn registry(&self) -> &GrammarRegistry {
        &self.registry
    }

    /// Parse `text` received at `received_at`.
    ///
    /// A `Source:` line anywhere in the message names the provider and is
    /// removed before grammars run. `MaxRisk:` and `LotSize:` lines are
    /// optional; malformed values are ignored.
    pub fn parse(&self, text: &str, received_at: DateTime<Utc>) -> Result<TradeIntent, ParseError> {
        let mut lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let tagged_source = take_source(&mut lines);

        let Some(matched) = self.registry.first_match(&lines, &self.config) else {
            info!(lines = lines.len(), "No signal grammar matched");
            return Err(ParseError::NoMatchingGrammar);
        };

        let signal = matched.signal;
        let signal_source = tagged_source.unwrap_or_else(|| matched.default_source.to_string());

        let intent = TradeIntent {
            order_side: signal.order_side,
            symbol: signal.symbol,
            entry: signal.entry,
            take_profits: signal.take_profits,
            stop_loss: signal.stop_loss,
            signal_source,
            signal_received_time: received_at,
            risk_factor: self.config.risk_factor,
            max_risk: optional_amount(&lines, MAX_RISK_LABEL),
            lot_size: optional_amount(&lines, LOT_SIZE_LABEL),
        };

        info!(
            grammar = matched.grammar.name(),
            source = %intent.signal_source,
            side = %intent.order_side,
            symbol = %intent.symbol,
            tps = intent.take_profits.len(),
            "Parsed trade signal"
        );

        Ok(intent)
    }
}

/// Remove the first `Source:` line and return its value, if non-empty.
fn take_source(lines: &mut Vec<&str>) -> Option<String> {
    let index = lines
        .iter()
        .position(|line| strip_label(line, SOURCE_LABEL).is_some())?;
    let line = lines.remove(index);

    let value = strip_label(line, SOURCE_LABEL)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Positive number on the first line labelled `label`.
fn optional_amount(lines: &[&str], label: &str) -> Option<Decimal> {
    let (line, rest) = lines
        .iter()
        .find_map(|line| strip_label(line, label).map(|rest| (*line, rest)))?;

    match leading_number(rest) {
        Some(value) if value > Decimal::ZERO => Some(value),
        _ => {
            warn!(line = %line, "Ignoring malformed optional field");
            None
        }
    }
}

/// Text after `label` when `line` starts with it, ignoring ASCII case.
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let prefix = line.get(..label.len())?;
    prefix
        .eq_ignore_ascii_case(label)
        .then(|| &line[label.len()..])
}

/// Receive time from a Unix timestamp in seconds (as sent by Telegram).
pub fn received_at_from_unix(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Entry, OrderSide};
    use crate::signals::{Grammar, RegistryEntry};
    use rust_decimal_macros::dec;

    fn received() -> DateTime<Utc> {
        received_at_from_unix(1_714_555_800).unwrap()
    }

    fn parser() -> SignalParser {
        SignalParser::new(RiskConfig {
            signal_providers: vec![
                "Provider One".into(),
                "Provider Two".into(),
                "Provider Three".into(),
            ],
            ..Default::default()
        })
    }

    #[test]
    fn test_parse_directive_signal() {
        let intent = parser()
            .parse("BUY EURUSD @ 1.1000\nTP1: 1.1100\nTP2: 1.1200\nSL: 1.0900", received())
            .unwrap();

        assert_eq!(intent.order_side, OrderSide::Buy);
        assert_eq!(intent.symbol, "EURUSD");
        assert_eq!(intent.entry, Entry::Price(dec!(1.1)));
        assert_eq!(intent.take_profits, vec![dec!(1.11), dec!(1.12)]);
        assert_eq!(intent.stop_loss, dec!(1.09));
        assert_eq!(intent.signal_source, "Provider One");
        assert_eq!(intent.signal_received_time, received());
        assert_eq!(intent.risk_factor, dec!(0.01));
        assert_eq!(intent.max_risk, None);
        assert_eq!(intent.lot_size, None);
    }

    #[test]
    fn test_parse_directional_signal() {
        let intent = parser()
            .parse(
                "LONG GBPUSD\nOpen Price: 1.2500\nSL: 1.2400\nStart Exit Zone TP: 1.2550\nEnd Exit Zone TP: 1.2600",
                received(),
            )
            .unwrap();

        assert_eq!(intent.order_side, OrderSide::Buy);
        assert_eq!(intent.symbol, "GBPUSD");
        assert_eq!(intent.entry, Entry::Price(dec!(1.25)));
        assert_eq!(intent.take_profits, vec![dec!(1.255), dec!(1.26)]);
        assert_eq!(intent.stop_loss, dec!(1.24));
        assert_eq!(intent.signal_source, "Provider Two");
    }

    #[test]
    fn test_source_line_removed_and_recorded() {
        let text = "Source: 1000pipBuilder\nBUY EURUSD @ 1.1200\nTP1: 1.1250\nTP2: 1.1300\nTP3: 1.1350\nSL: 1.1150\nMaxRisk: 20\nLotSize: 0.5";
        let intent = parser().parse(text, received()).unwrap();

        assert_eq!(intent.signal_source, "1000pipBuilder");
        assert_eq!(intent.take_profits.len(), 3);
        assert_eq!(intent.max_risk, Some(dec!(20)));
        assert_eq!(intent.lot_size, Some(dec!(0.5)));
    }

    #[test]
    fn test_source_line_at_end() {
        let text = "SELL USDJPY\nTP1: 150.00\nSL: 152.00\nsource: Tokyo Desk";
        let intent = parser().parse(text, received()).unwrap();
        assert_eq!(intent.signal_source, "Tokyo Desk");
        assert_eq!(intent.entry, Entry::Market);
    }

    #[test]
    fn test_untagged_header_uses_third_provider() {
        let text = "VIP Room\nSELL EURGBP @ 0.8550\nTP1: 0.8500\nSL: 0.8600";
        let intent = parser().parse(text, received()).unwrap();
        assert_eq!(intent.symbol, "EURGBP");
        assert_eq!(intent.signal_source, "Provider Three");
    }

    #[test]
    fn test_no_order_keyword_fails() {
        let err = parser()
            .parse("EURUSD looks strong today\nTP1: 1.2\nSL: 1.0", received())
            .unwrap_err();
        assert_eq!(err, ParseError::NoMatchingGrammar);
        assert!(parser().parse("", received()).is_err());
    }

    #[test]
    fn test_unlisted_symbol_fails() {
        let result = parser().parse("BUY ZZZZZZ @ 1.1\nTP1: 1.2\nSL: 1.0", received());
        assert_eq!(result, Err(ParseError::NoMatchingGrammar));
    }

    #[test]
    fn test_zero_take_profits_fails() {
        let result = parser().parse("BUY EURUSD @ 1.1\nSL: 1.0", received());
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_tp_falls_through_to_next_grammar() {
        // The directive grammar reads line two as a TP with no number and gives
        // up; the prefixed grammar takes line two as the order line instead.
        let text = "BUY EURUSD\nBUY EURUSD @ 1.1000 TP: see below\nTP1: 1.1100\nSL: 1.0900";
        let intent = parser().parse(text, received()).unwrap();

        assert_eq!(intent.signal_source, "Provider Three");
        assert_eq!(intent.entry, Entry::Price(dec!(1.1)));
        assert_eq!(intent.take_profits, vec![dec!(1.11)]);
    }

    #[test]
    fn test_registry_order_is_precedence() {
        let registry = GrammarRegistry::with_order(vec![RegistryEntry {
            grammar: Grammar::DirectionalKeyword,
            default_source: "Zones".into(),
        }]);
        let parser = SignalParser::with_registry(RiskConfig::default(), registry);

        assert!(parser
            .parse("BUY EURUSD @ 1.1\nTP1: 1.11\nSL: 1.09", received())
            .is_err());
        let intent = parser
            .parse("SHORT EURUSD\nSL: 1.11\nEnd Exit Zone TP: 1.09", received())
            .unwrap();
        assert_eq!(intent.signal_source, "Zones");
        assert_eq!(intent.order_side, OrderSide::Sell);
    }

    #[test]
    fn test_malformed_optional_fields_ignored() {
        let text = "BUY EURUSD\nTP1: 1.11\nSL: 1.09\nMaxRisk: lots\nLotSize: 0";
        let intent = parser().parse(text, received()).unwrap();
        assert_eq!(intent.max_risk, None);
        assert_eq!(intent.lot_size, None);
    }

    #[test]
    fn test_received_at_from_unix() {
        let intent = parser().parse("BUY EURUSD\nTP1: 1.11\nSL: 1.09", received()).unwrap();
        assert_eq!(intent.received_time_iso(), "2024-05-01T09:30:00.000Z");
    }
}
