//! Signal Sorcerer
//!
//! Parses free-text FX trading signals into trade intents and sizes each
//! take-profit against a live quote under a configurable risk policy.
//!
//! ```text
//! text --SignalParser--> TradeIntent --RiskEngine--> PricedTrade --report--> text
//! ```

pub mod broker;
pub mod error;
pub mod models;
pub mod report;
pub mod signals;
pub mod trading;

pub use error::{ConfigError, ParseError, PricingError};
pub use models::{Entry, MarginEstimate, OrderSide, PricedTrade, Quote, TradeIntent};
pub use report::{format_trade_report, FORMAT_HELP};
pub use signals::SignalParser;
pub use trading::{ExecutionConfig, RiskConfig, RiskEngine};
