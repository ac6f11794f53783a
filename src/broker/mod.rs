//! Broker seams consumed by the pricing engine.
//!
//! Connecting to an account, retrying and placing orders belong to the broker
//! integration; pricing only needs a quote and a margin estimate.

mod fixed;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::{MarginEstimate, OrderSide, Quote};

pub use fixed::FixedQuoteBroker;

/// Source of live prices.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<Quote>;
}

/// Source of margin requirements.
#[async_trait]
pub trait MarginProvider: Send + Sync {
    async fn margin(
        &self,
        symbol: &str,
        side: OrderSide,
        volume: Decimal,
        open_price: Decimal,
    ) -> Result<MarginEstimate>;
}
