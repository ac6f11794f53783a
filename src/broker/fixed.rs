//! Broker stand-in that answers with a fixed quote and margin rate.

use anyhow::{bail, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{MarginEstimate, OrderSide, Quote};

use super::{MarginProvider, QuoteProvider};

/// Serves one quote for every symbol and estimates margin as
/// `volume * contract_size * open_price * margin_rate`.
#[derive(Debug, Clone)]
pub struct FixedQuoteBroker {
    quote: Quote,
    contract_size: Decimal,
    margin_rate: Decimal,
}

impl FixedQuoteBroker {
    pub fn new(quote: Quote, contract_size: Decimal, margin_rate: Decimal) -> Self {
        Self {
            quote,
            contract_size,
            margin_rate,
        }
    }
}

#[async_trait]
impl QuoteProvider for FixedQuoteBroker {
    async fn quote(&self, symbol: &str) -> Result<Quote> {
        debug!(
            symbol = %symbol,
            bid = %self.quote.bid,
            ask = %self.quote.ask,
            "Serving fixed quote"
        );
        Ok(self.quote)
    }
}

#[async_trait]
impl MarginProvider for FixedQuoteBroker {
    async fn margin(
        &self,
        symbol: &str,
        side: OrderSide,
        volume: Decimal,
        open_price: Decimal,
    ) -> Result<MarginEstimate> {
        if volume < Decimal::ZERO {
            bail!("negative volume {} for {} {}", volume, side, symbol);
        }
        Ok(MarginEstimate {
            margin: volume * self.contract_size * open_price * self.margin_rate,
        })
    }
}
