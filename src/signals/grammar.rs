//! Provider-specific signal grammars and the ordered registry that tries them.
//!
//! Each grammar is a pure function from trimmed message lines to a
//! [`ParsedSignal`]. A grammar that does not recognise the message returns
//! `None`, which lets the next grammar in the registry try.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{Entry, OrderSide};
use crate::trading::RiskConfig;

static SYMBOL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]{6}").unwrap());
static AT_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\s*([\d.]+)").unwrap());
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+))").unwrap());
static OPEN_PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Open Price:\s*([\d.]+)").unwrap());
static SL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)SL:\s*([\d.]+)").unwrap());

/// Labelled take-profit lines of the directional-keyword format, in the order
/// they are checked on each line.
static ZONE_TP_RES: LazyLock<[(Regex, Regex); 3]> = LazyLock::new(|| {
    ["Start Exit Zone TP:", "1:1 Risk:Reward TP:", "End Exit Zone TP:"].map(|label| {
        (
            Regex::new(&format!("(?i){}", regex::escape(label))).unwrap(),
            Regex::new(&format!(r"(?i){}\s*([\d.]+)", regex::escape(label))).unwrap(),
        )
    })
});

/// Trade fields a grammar extracts from the message body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSignal {
    pub order_side: OrderSide,
    pub symbol: String,
    pub entry: Entry,
    pub take_profits: Vec<Decimal>,
    pub stop_loss: Decimal,
}

/// Known signal layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// `BUY EURUSD @ 1.1000` then `TP<n>: value` and `SL: value` lines.
    Directive,
    /// `LONG GBPUSD`, `Open Price:`, `SL:` and labelled exit-zone TPs.
    DirectionalKeyword,
    /// Directive layout below a provider header line.
    SourcePrefixedDirective,
}

impl Grammar {
    pub fn name(&self) -> &'static str {
        match self {
            Grammar::Directive => "directive",
            Grammar::DirectionalKeyword => "directional-keyword",
            Grammar::SourcePrefixedDirective => "source-prefixed-directive",
        }
    }

    /// Try to read `lines` with this grammar.
    pub fn parse(&self, lines: &[&str], config: &RiskConfig) -> Option<ParsedSignal> {
        match self {
            Grammar::Directive => parse_directive(lines, 0, config),
            Grammar::DirectionalKeyword => parse_directional(lines, config),
            Grammar::SourcePrefixedDirective => parse_directive(lines, 1, config),
        }
    }
}

/// A grammar paired with the source label used when the message has no
/// `Source:` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub grammar: Grammar,
    pub default_source: String,
}

/// Result of the first grammar that accepted a message.
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarMatch<'a> {
    pub signal: ParsedSignal,
    pub grammar: Grammar,
    pub default_source: &'a str,
}

/// Ordered fallback chain of grammars. The first grammar that accepts a
/// message wins; order is precedence.
#[derive(Debug, Clone)]
pub struct GrammarRegistry {
    entries: Vec<RegistryEntry>,
}

impl GrammarRegistry {
    /// Standard order, labelled with the configured providers in turn.
    pub fn from_config(config: &RiskConfig) -> Self {
        let order = [
            Grammar::Directive,
            Grammar::DirectionalKeyword,
            Grammar::SourcePrefixedDirective,
        ];
        Self::with_order(
            order
                .iter()
                .enumerate()
                .map(|(i, grammar)| RegistryEntry {
                    grammar: *grammar,
                    default_source: config.provider_label(i).to_string(),
                })
                .collect(),
        )
    }

    /// Custom precedence.
    pub fn with_order(entries: Vec<RegistryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Run grammars in order and return the first match.
    pub fn first_match(&self, lines: &[&str], config: &RiskConfig) -> Option<GrammarMatch<'_>> {
        self.entries.iter().find_map(|entry| {
            let signal = entry.grammar.parse(lines, config);
            debug!(
                grammar = entry.grammar.name(),
                matched = signal.is_some(),
                "Tried signal grammar"
            );
            signal.map(|signal| GrammarMatch {
                signal,
                grammar: entry.grammar,
                default_source: &entry.default_source,
            })
        })
    }
}

/// Leading decimal of `text`, ignoring whatever follows it.
pub(crate) fn leading_number(text: &str) -> Option<Decimal> {
    let caps = NUMBER_RE.captures(text)?;
    Decimal::from_str(caps.get(1)?.as_str()).ok()
}

fn captured_number(re: &Regex, line: &str) -> Option<Decimal> {
    let caps = re.captures(line)?;
    leading_number(caps.get(1)?.as_str())
}

/// Order side from `keywords` (buy word, sell word) and an allow-listed symbol.
fn side_and_symbol(
    header: &str,
    keywords: (&str, &str),
    config: &RiskConfig,
) -> Option<(OrderSide, String)> {
    let upper = header.to_uppercase();
    let side = if upper.contains(keywords.0) {
        OrderSide::Buy
    } else if upper.contains(keywords.1) {
        OrderSide::Sell
    } else {
        return None;
    };

    let symbol = SYMBOL_RE.find(&upper)?.as_str().to_string();
    if !config.is_symbol_allowed(&symbol) {
        return None;
    }
    Some((side, symbol))
}

/// Directive layout with the order line at `header_index`.
fn parse_directive(
    lines: &[&str],
    header_index: usize,
    config: &RiskConfig,
) -> Option<ParsedSignal> {
    let header = lines.get(header_index)?;
    let (order_side, symbol) = side_and_symbol(header, ("BUY", "SELL"), config)?;

    let entry = AT_PRICE_RE
        .captures(&header.to_uppercase())
        .and_then(|caps| leading_number(caps.get(1)?.as_str()))
        .map_or(Entry::Market, Entry::Price);

    let mut take_profits = Vec::new();
    let mut stop_loss = None;
    for line in &lines[header_index + 1..] {
        let upper = line.to_uppercase();
        if upper.contains("TP") {
            take_profits.push(value_after_colon(line)?);
        } else if upper.contains("SL") {
            stop_loss = Some(value_after_colon(line)?);
        }
    }

    if take_profits.is_empty() {
        return None;
    }

    Some(ParsedSignal {
        order_side,
        symbol,
        entry,
        take_profits,
        stop_loss: stop_loss?,
    })
}

/// Number between the first and second colon of `line`.
fn value_after_colon(line: &str) -> Option<Decimal> {
    leading_number(line.split(':').nth(1)?)
}

fn parse_directional(lines: &[&str], config: &RiskConfig) -> Option<ParsedSignal> {
    let header = lines.first()?;
    let (order_side, symbol) = side_and_symbol(header, ("LONG", "SHORT"), config)?;

    let entry = match find_prefixed(lines, "OPEN PRICE:") {
        Some(line) => Entry::Price(captured_number(&OPEN_PRICE_RE, line)?),
        None => Entry::Market,
    };

    let stop_loss = captured_number(&SL_RE, find_prefixed(lines, "SL:")?)?;

    let mut take_profits = Vec::new();
    for line in lines {
        if let Some((_, value_re)) = ZONE_TP_RES.iter().find(|(label, _)| label.is_match(line)) {
            take_profits.push(captured_number(value_re, line)?);
        }
    }

    if take_profits.is_empty() {
        return None;
    }

    Some(ParsedSignal {
        order_side,
        symbol,
        entry,
        take_profits,
        stop_loss,
    })
}

/// First line whose upper-cased text starts with `prefix`.
fn find_prefixed<'a>(lines: &[&'a str], prefix: &str) -> Option<&'a str> {
    lines
        .iter()
        .copied()
        .find(|line| line.to_uppercase().starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lines(text: &str) -> Vec<&str> {
        text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number(" 1.1100"), Some(dec!(1.1100)));
        assert_eq!(leading_number("1.25 pips"), Some(dec!(1.25)));
        assert_eq!(leading_number(".5"), Some(dec!(0.5)));
        assert_eq!(leading_number("abc"), None);
        assert_eq!(leading_number(""), None);
    }

    #[test]
    fn test_directive_grammar() {
        let config = RiskConfig::default();
        let text = "SELL gbpjpy @ 190.50\nTP1: 190.00\nSL: 191.00\nTP2: 189.50";
        let signal = Grammar::Directive.parse(&lines(text), &config).unwrap();

        assert_eq!(signal.order_side, OrderSide::Sell);
        assert_eq!(signal.symbol, "GBPJPY");
        assert_eq!(signal.entry, Entry::Price(dec!(190.50)));
        assert_eq!(signal.take_profits, vec![dec!(190.00), dec!(189.50)]);
        assert_eq!(signal.stop_loss, dec!(191.00));
    }

    #[test]
    fn test_directive_without_price_enters_at_market() {
        let config = RiskConfig::default();
        let signal = Grammar::Directive
            .parse(&lines("BUY EURUSD\nTP1: 1.11\nSL: 1.09"), &config)
            .unwrap();
        assert_eq!(signal.entry, Entry::Market);
    }

    #[test]
    fn test_directive_requires_stop_loss_and_tp() {
        let config = RiskConfig::default();
        assert!(Grammar::Directive
            .parse(&lines("BUY EURUSD @ 1.1\nTP1: 1.2"), &config)
            .is_none());
        assert!(Grammar::Directive
            .parse(&lines("BUY EURUSD @ 1.1\nSL: 1.0"), &config)
            .is_none());
    }

    #[test]
    fn test_directive_non_numeric_value_rejects() {
        let config = RiskConfig::default();
        assert!(Grammar::Directive
            .parse(&lines("BUY EURUSD @ 1.1\nTP1: open\nSL: 1.0"), &config)
            .is_none());
        assert!(Grammar::Directive
            .parse(&lines("BUY EURUSD @ 1.1\nTP1 1.2\nSL: 1.0"), &config)
            .is_none());
    }

    #[test]
    fn test_unlisted_symbol_rejected() {
        let config = RiskConfig::default();
        assert!(Grammar::Directive
            .parse(&lines("BUY ZZZZZZ @ 1.1\nTP1: 1.2\nSL: 1.0"), &config)
            .is_none());
    }

    #[test]
    fn test_directional_grammar() {
        let config = RiskConfig::default();
        let text = "SHORT AUDUSD\nOpen Price: 0.6650\nSL: 0.6700\n1:1 Risk:Reward TP: 0.6600\nEnd Exit Zone TP: 0.6550";
        let signal = Grammar::DirectionalKeyword.parse(&lines(text), &config).unwrap();

        assert_eq!(signal.order_side, OrderSide::Sell);
        assert_eq!(signal.symbol, "AUDUSD");
        assert_eq!(signal.entry, Entry::Price(dec!(0.6650)));
        assert_eq!(signal.take_profits, vec![dec!(0.6600), dec!(0.6550)]);
        assert_eq!(signal.stop_loss, dec!(0.6700));
    }

    #[test]
    fn test_directional_needs_labelled_tp() {
        let config = RiskConfig::default();
        let text = "LONG GBPUSD\nOpen Price: 1.2500\nSL: 1.2400\nTP1: 1.2600";
        assert!(Grammar::DirectionalKeyword.parse(&lines(text), &config).is_none());
    }

    #[test]
    fn test_directional_without_open_price_enters_at_market() {
        let config = RiskConfig::default();
        let text = "LONG GBPUSD\nSL: 1.2400\nStart Exit Zone TP: 1.2550";
        let signal = Grammar::DirectionalKeyword.parse(&lines(text), &config).unwrap();
        assert_eq!(signal.entry, Entry::Market);
    }

    #[test]
    fn test_source_prefixed_skips_header() {
        let config = RiskConfig::default();
        let text = "Gold Signals VIP\nBUY XAUUSD @ 2350.5\nTP1: 2360\nTP2: 2370\nSL: 2340";
        assert!(Grammar::Directive.parse(&lines(text), &config).is_none());

        let signal = Grammar::SourcePrefixedDirective.parse(&lines(text), &config).unwrap();
        assert_eq!(signal.symbol, "XAUUSD");
        assert_eq!(signal.take_profits, vec![dec!(2360), dec!(2370)]);
    }

    #[test]
    fn test_registry_order_and_labels() {
        let config = RiskConfig {
            signal_providers: vec!["Alpha".into(), "Beta".into()],
            ..Default::default()
        };
        let registry = GrammarRegistry::from_config(&config);
        let labels: Vec<_> = registry.entries().iter().map(|e| e.default_source.as_str()).collect();
        assert_eq!(labels, vec!["Alpha", "Beta", "Unknown"]);

        let m = registry
            .first_match(&lines("LONG EURUSD\nSL: 1.09\nEnd Exit Zone TP: 1.12"), &config)
            .unwrap();
        assert_eq!(m.grammar, Grammar::DirectionalKeyword);
        assert_eq!(m.default_source, "Beta");
    }

    #[test]
    fn test_custom_precedence() {
        let config = RiskConfig::default();
        let registry = GrammarRegistry::with_order(vec![
            RegistryEntry {
                grammar: Grammar::SourcePrefixedDirective,
                default_source: "Prefixed".into(),
            },
            RegistryEntry {
                grammar: Grammar::Directive,
                default_source: "Plain".into(),
            },
        ]);

        // The header line is a valid directive too, but the prefixed grammar
        // reads the second line first and fails, so the plain one wins.
        let m = registry
            .first_match(&lines("BUY EURUSD\nTP1: 1.11\nSL: 1.09"), &config)
            .unwrap();
        assert_eq!(m.grammar, Grammar::Directive);
        assert_eq!(m.default_source, "Plain");
    }
}
