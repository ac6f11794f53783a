//! Error types for signal parsing, pricing, and configuration.

use thiserror::Error;

/// A signal message that no grammar could turn into a trade.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Every registered grammar rejected the message.
    #[error("no signal grammar matched the message")]
    NoMatchingGrammar,
}

/// Pricing a parsed trade failed. No partial result is produced.
#[derive(Debug, Error)]
pub enum PricingError {
    /// The quote provider could not price the symbol.
    #[error("quote lookup failed for {symbol}: {source}")]
    Quote {
        symbol: String,
        #[source]
        source: anyhow::Error,
    },

    /// The margin provider could not estimate the margin.
    #[error("margin calculation failed for {symbol}: {source}")]
    Margin {
        symbol: String,
        #[source]
        source: anyhow::Error,
    },

    /// The quote contained a non-positive price.
    #[error("invalid quote for {symbol}: bid {bid}, ask {ask}")]
    InvalidQuote {
        symbol: String,
        bid: String,
        ask: String,
    },

    /// A price distance, size, loss or profit does not fit a `Decimal`.
    #[error("arithmetic overflow while pricing {symbol}")]
    Overflow { symbol: String },

    /// Stop-loss sits exactly on the live entry price.
    #[error("stop-loss {stop_loss} is zero pips from entry {entry}")]
    ZeroStopDistance { stop_loss: String, entry: String },
}

/// Malformed configuration, reported once at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A value could not be read as a number.
    #[error("{key} must be numeric, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    /// A value could not be read as a boolean.
    #[error("{key} must be true or false, got '{value}'")]
    InvalidBool { key: &'static str, value: String },

    /// A value parsed but violates a constraint.
    #[error("{key} is out of range: {reason}")]
    OutOfRange { key: &'static str, reason: String },
}
