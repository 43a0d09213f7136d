//! Regressive income tax on fixed-income profit.
//!
//! The rate falls as the holding period grows. Brackets use inclusive upper
//! bounds expressed in calendar days.

use serde::Serialize;

/// Average month length used to turn a month count into elapsed days.
pub const DAYS_PER_MONTH: f64 = 365.25 / 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxTier {
    /// Inclusive upper bound; `None` marks the open-ended final bracket.
    pub max_days: Option<u32>,
    pub rate: f64,
}

pub const REGRESSIVE_TAX_TIERS: [TaxTier; 4] = [
    TaxTier {
        max_days: Some(180),
        rate: 0.225,
    },
    TaxTier {
        max_days: Some(360),
        rate: 0.20,
    },
    TaxTier {
        max_days: Some(720),
        rate: 0.175,
    },
    TaxTier {
        max_days: None,
        rate: 0.15,
    },
];

pub fn resolve_rate(elapsed_days: f64) -> f64 {
    let last = REGRESSIVE_TAX_TIERS[REGRESSIVE_TAX_TIERS.len() - 1];
    REGRESSIVE_TAX_TIERS
        .iter()
        .find(|tier| tier.max_days.is_none_or(|max| elapsed_days <= f64::from(max)))
        .unwrap_or(&last)
        .rate
}

pub fn elapsed_days_for_months(months: u32) -> f64 {
    f64::from(months) * DAYS_PER_MONTH
}

/// Tax owed on `gross_profit` after `elapsed_days`. Losses are taxed at the
/// same rate, which yields a negative amount rather than a clamp.
pub fn tax_on_profit(gross_profit: f64, elapsed_days: f64) -> f64 {
    gross_profit * resolve_rate(elapsed_days)
}
