use chrono::NaiveDate;
use serde::Serialize;

use super::rates::RateSpec;

pub const DEFAULT_HORIZON_DAYS: [u32; 4] = [180, 360, 720, 1080];
pub const HORIZON_CAP_MONTHS: u32 = 12 * 30;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BetterOption {
    Exempt,
    Taxed,
}

#[derive(Debug, Clone)]
pub struct ComparisonInputs {
    pub principal: f64,
    pub exempt_rate: RateSpec,
    pub taxed_rate: RateSpec,
    pub horizon_days: Vec<u32>,
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExemptLeg {
    pub total: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxedLeg {
    pub gross_profit: f64,
    pub tax_paid: f64,
    pub net_profit: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub horizon_days: u32,
    pub horizon_years: f64,
    pub tax_rate: f64,
    pub exempt: ExemptLeg,
    pub taxed: TaxedLeg,
    pub difference: f64,
    pub better_option: BetterOption,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maturity_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactConfig {
    pub target_difference: f64,
    pub initial_capital: f64,
    pub monthly_contribution: f64,
    pub benchmark_rate: f64,
    pub exempt_multiplier: f64,
    pub taxed_multiplier: f64,
}

impl ImpactConfig {
    pub fn exempt_rate(&self) -> RateSpec {
        RateSpec::of_benchmark(self.benchmark_rate, self.exempt_multiplier)
    }

    pub fn taxed_rate(&self) -> RateSpec {
        RateSpec::of_benchmark(self.benchmark_rate, self.taxed_multiplier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSummary {
    pub months: u32,
    pub years: u32,
    pub remainder_months: u32,
    pub final_exempt_value: f64,
    pub final_taxed_net_value: f64,
    pub final_difference: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactShortfall {
    pub horizon_cap_months: u32,
    pub horizon_cap_years: u32,
    /// Difference in the last simulated month.
    pub final_difference: f64,
    /// Largest difference seen in any month of the run.
    pub max_difference: f64,
}

/// Callers must match on the variant before reading any balances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ImpactOutcome {
    Reached(ImpactSummary),
    NotReached(ImpactShortfall),
}

impl ImpactOutcome {
    pub fn is_reached(&self) -> bool {
        matches!(self, Self::Reached(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactMonthPoint {
    pub month: u32,
    pub elapsed_days: f64,
    pub tax_rate: f64,
    pub exempt_value: f64,
    pub taxed_gross_value: f64,
    pub taxed_principal: f64,
    pub taxed_net_value: f64,
    pub difference: f64,
}
