//! Position sizing: risk split across take-profits, volume per TP, rounding.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::SizingMode;
use super::RiskConfig;

/// Share of total risk carried by the final take-profit.
pub const LAST_TP_RISK_SHARE: Decimal = dec!(0.5);

/// Pip size for a (possibly suffixed) broker symbol.
pub fn pip_unit(symbol: &str) -> Decimal {
    if symbol.contains("JPY") {
        dec!(0.01)
    } else {
        dec!(0.0001)
    }
}

/// Distance between two prices in pips, or `None` if it does not fit a `Decimal`.
pub fn pips_between(a: Decimal, b: Decimal, pip_unit: Decimal) -> Option<Decimal> {
    a.checked_sub(b)?.abs().checked_div(pip_unit)
}

/// Fractions of total risk assigned to each take-profit.
///
/// The last TP carries [`LAST_TP_RISK_SHARE`], the rest is split evenly over
/// the others. A single TP carries everything.
pub fn risk_proportions(tp_count: usize) -> Vec<Decimal> {
    match tp_count {
        0 => Vec::new(),
        1 => vec![Decimal::ONE],
        n => {
            let others = Decimal::from(n - 1);
            let per_other = (Decimal::ONE - LAST_TP_RISK_SHARE) / others;
            let mut shares = vec![per_other; n - 1];
            shares.push(LAST_TP_RISK_SHARE);
            shares
        }
    }
}

/// Calculator for per-TP position sizes.
pub struct PositionSizer {
    config: RiskConfig,
}

impl PositionSizer {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Amount of account currency at risk across the whole trade.
    ///
    /// `None` when the trade is sized by explicit lot size.
    pub fn total_risk_amount(&self, mode: SizingMode, balance: Decimal) -> Option<Decimal> {
        match mode {
            SizingMode::LotSize(_) => None,
            SizingMode::MaxRisk(amount) => Some(amount),
            SizingMode::RiskFactor(factor) => Some(balance * factor),
        }
    }

    /// Raw, unrounded sizes for each take-profit.
    ///
    /// `stop_loss_pips` must be positive. Returns `None` when a size does not
    /// fit a `Decimal`.
    pub fn raw_sizes(
        &self,
        mode: SizingMode,
        balance: Decimal,
        tp_count: usize,
        stop_loss_pips: Decimal,
    ) -> Option<Vec<Decimal>> {
        if tp_count == 0 {
            return Some(Vec::new());
        }

        match mode {
            SizingMode::LotSize(lots) => Some(vec![lots / Decimal::from(tp_count); tp_count]),
            SizingMode::MaxRisk(_) | SizingMode::RiskFactor(_) => {
                let total_risk = self.total_risk_amount(mode, balance).unwrap_or_default();
                let risk_per_lot = stop_loss_pips.checked_mul(self.config.pip_value)?;
                risk_proportions(tp_count)
                    .into_iter()
                    .map(|share| total_risk.checked_mul(share)?.checked_div(risk_per_lot))
                    .collect()
            }
        }
    }

    /// Apply the configured minimum, rounding step and maximum.
    ///
    /// Below the minimum a size is raised to it; otherwise it is floored to the
    /// rounding step (when rounding is on). The result never leaves
    /// `[min_position_size, max_position_size]`, and applying this twice gives
    /// the same value as applying it once.
    pub fn clamp_size(&self, size: Decimal) -> Decimal {
        let min = self.config.min_position_size;
        let max = self.config.max_position_size;

        let mut clamped = if size < min {
            min
        } else if self.config.round_position_size {
            let step = self.config.effective_rounding_factor();
            size.checked_div(step).map_or(max, |steps| steps.floor() * step).max(min)
        } else {
            size
        };

        clamped = clamped.min(max);
        clamped.normalize()
    }

    /// Final per-TP sizes for a trade.
    pub fn size_per_tp(
        &self,
        mode: SizingMode,
        balance: Decimal,
        tp_count: usize,
        stop_loss_pips: Decimal,
    ) -> Option<Vec<Decimal>> {
        let raw = self.raw_sizes(mode, balance, tp_count, stop_loss_pips)?;
        Some(raw.into_iter().map(|size| self.clamp_size(size)).collect())
    }
}
