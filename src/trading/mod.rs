//! Trading logic: risk configuration, position sizing, pricing, order plans.

mod config;
mod orders;
mod position_sizer;
mod risk_engine;

pub use config::{ExecutionConfig, RiskConfig, DEFAULT_ALLOWED_SYMBOLS};
pub use orders::{order_comment, plan_orders, OrderRequest, TrailingStop, MAX_COMMENT_LEN};
pub use position_sizer::{
    pip_unit, pips_between, risk_proportions, PositionSizer, LAST_TP_RISK_SHARE,
};
pub use risk_engine::RiskEngine;
