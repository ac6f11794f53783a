//! Risk and execution configuration.
//!
//! Values come from environment variables (after an optional `.env` file) and
//! are validated once at startup. A malformed value is a [`ConfigError`], never
//! a per-message failure.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Symbols accepted when `ALLOWED_SYMBOLS` is not set.
pub const DEFAULT_ALLOWED_SYMBOLS: [&str; 30] = [
    "AUDCAD", "AUDCHF", "AUDJPY", "AUDNZD", "AUDUSD", "CADCHF", "CADJPY", "CHFJPY", "EURAUD",
    "EURCAD", "EURCHF", "EURGBP", "EURJPY", "EURNZD", "EURUSD", "GBPAUD", "GBPCAD", "GBPCHF",
    "GBPJPY", "GBPNZD", "GBPUSD", "NZDCAD", "NZDCHF", "NZDJPY", "NZDUSD", "USDCAD", "USDCHF",
    "USDJPY", "XAGUSD", "XAUUSD",
];

/// Configuration for signal parsing and position sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Fraction of balance risked per trade (0.0 to 1.0)
    pub risk_factor: Decimal,

    /// Account-currency value of one pip per lot
    pub pip_value: Decimal,

    /// Smallest position size per take-profit
    pub min_position_size: Decimal,

    /// Largest position size per take-profit
    pub max_position_size: Decimal,

    /// Floor sizes to the rounding factor
    pub round_position_size: bool,

    /// Explicit rounding step; derived from the minimum size when unset
    pub rounding_factor: Option<Decimal>,

    pub currency_name: String,
    pub currency_symbol: String,

    /// Broker-specific suffix appended to symbols before pricing
    pub symbol_suffix: String,

    /// Upper-case six-letter instruments a signal may trade
    pub allowed_symbols: Vec<String>,

    /// Default source labels, one per grammar in registry order
    pub signal_providers: Vec<String>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_factor: dec!(0.01),
            pip_value: dec!(1),
            min_position_size: dec!(0.1),
            max_position_size: dec!(1),
            round_position_size: true,
            rounding_factor: None,
            currency_name: "GBP".to_string(),
            currency_symbol: "£".to_string(),
            symbol_suffix: "_SB".to_string(),
            allowed_symbols: DEFAULT_ALLOWED_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            signal_providers: Vec::new(),
        }
    }
}

impl RiskConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names. Unset or empty
    /// variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("RISK_FACTOR") {
            config.risk_factor = parse_decimal("RISK_FACTOR", &v)?;
        }
        if let Some(v) = get("PIP_VALUE") {
            config.pip_value = parse_decimal("PIP_VALUE", &v)?;
        }
        if let Some(v) = get("MIN_POSITION_SIZE") {
            config.min_position_size = parse_decimal("MIN_POSITION_SIZE", &v)?;
        }
        if let Some(v) = get("MAX_POSITION_SIZE") {
            config.max_position_size = parse_decimal("MAX_POSITION_SIZE", &v)?;
        }
        if let Some(v) = get("ROUND_POSITION_SIZE") {
            config.round_position_size = parse_bool("ROUND_POSITION_SIZE", &v)?;
        }
        if let Some(v) = get("ROUND_POSITION_SIZE_FACTOR") {
            config.rounding_factor = Some(parse_decimal("ROUND_POSITION_SIZE_FACTOR", &v)?);
        }
        if let Some(v) = get("CURRENCY_NAME") {
            config.currency_name = v.trim().to_string();
        }
        if let Some(v) = get("CURRENCY_SYMBOL") {
            config.currency_symbol = v.trim().to_string();
        }
        if let Some(v) = get("TRADE_SYMBOL_SUFFIX") {
            config.symbol_suffix = v.trim().to_string();
        }
        if let Some(v) = get("ALLOWED_SYMBOLS") {
            config.allowed_symbols = split_list(&v).map(|s| s.to_uppercase()).collect();
        }
        if let Some(v) = get("SIGNAL_PROVIDERS") {
            config.signal_providers = split_list(&v).map(str::to_string).collect();
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make sizing meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.risk_factor <= Decimal::ZERO || self.risk_factor > Decimal::ONE {
            return Err(out_of_range("RISK_FACTOR", "must be in (0, 1]"));
        }
        if self.pip_value <= Decimal::ZERO {
            return Err(out_of_range("PIP_VALUE", "must be positive"));
        }
        if self.min_position_size <= Decimal::ZERO {
            return Err(out_of_range("MIN_POSITION_SIZE", "must be positive"));
        }
        if self.max_position_size < self.min_position_size {
            return Err(out_of_range(
                "MAX_POSITION_SIZE",
                "must not be below MIN_POSITION_SIZE",
            ));
        }
        if let Some(factor) = self.rounding_factor {
            if factor <= Decimal::ZERO {
                return Err(out_of_range("ROUND_POSITION_SIZE_FACTOR", "must be positive"));
            }
        }
        if self.allowed_symbols.is_empty() {
            return Err(out_of_range("ALLOWED_SYMBOLS", "must list at least one symbol"));
        }
        Ok(())
    }

    /// Step that position sizes are floored to.
    pub fn effective_rounding_factor(&self) -> Decimal {
        self.rounding_factor.unwrap_or(if self.min_position_size < Decimal::ONE {
            dec!(0.1)
        } else {
            Decimal::ONE
        })
    }

    /// Case-insensitive allow-list check.
    pub fn is_symbol_allowed(&self, symbol: &str) -> bool {
        self.allowed_symbols
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(symbol))
    }

    /// Default source label for the grammar at `index`.
    pub fn provider_label(&self, index: usize) -> &str {
        self.signal_providers
            .get(index)
            .map(String::as_str)
            .unwrap_or("Unknown")
    }
}

/// Settings for turning a priced trade into broker orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Whether orders may be sent at all
    pub enable_trade_execution: bool,

    /// Attach a trailing stop to every order after the first
    pub enable_trailing_stop: bool,

    pub trailing_stop_distance: Decimal,
    pub trailing_stop_units: String,

    /// Leave take-profit off the trailing orders so only the stop closes them
    pub close_trailing_trade_on_sl_only: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            enable_trade_execution: false,
            enable_trailing_stop: false,
            trailing_stop_distance: dec!(10),
            trailing_stop_units: "RELATIVE_PIPS".to_string(),
            close_trailing_trade_on_sl_only: false,
        }
    }
}

impl ExecutionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("ENABLE_TRADE_EXECUTION") {
            config.enable_trade_execution = parse_bool("ENABLE_TRADE_EXECUTION", &v)?;
        }
        if let Some(v) = get("ENABLE_TRAILING_STOP_POSITION") {
            config.enable_trailing_stop = parse_bool("ENABLE_TRAILING_STOP_POSITION", &v)?;
        }
        if let Some(v) = get("TRAILING_STOP_DISTANCE") {
            config.trailing_stop_distance = parse_decimal("TRAILING_STOP_DISTANCE", &v)?;
        }
        if let Some(v) = get("TRAILING_STOP_UNITS") {
            config.trailing_stop_units = v.trim().to_string();
        }
        if let Some(v) = get("CLOSE_TRAILING_TRADE_ON_SL_ONLY") {
            config.close_trailing_trade_on_sl_only =
                parse_bool("CLOSE_TRAILING_TRADE_ON_SL_ONLY", &v)?;
        }

        Ok(config)
    }
}

fn parse_decimal(key: &'static str, value: &str) -> Result<Decimal, ConfigError> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key,
            value: value.to_string(),
        }),
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn out_of_range(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::OutOfRange {
        key,
        reason: reason.to_string(),
    }
}
