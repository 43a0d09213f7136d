mod engine;
mod error;
mod rates;
mod solver;
mod tax;
mod types;

pub use engine::{better_option, run_comparison};
pub use error::EngineError;
pub use rates::{
    DAYS_PER_YEAR, RateSpec, effective_period_rate, horizon_years, simple_horizon_value,
};
pub use solver::{solve_impact, solve_impact_with_trace, trace_impact};
pub use tax::{
    DAYS_PER_MONTH, REGRESSIVE_TAX_TIERS, TaxTier, elapsed_days_for_months, resolve_rate,
    tax_on_profit,
};
pub use types::{
    BetterOption, ComparisonInputs, ComparisonRow, DEFAULT_HORIZON_DAYS, ExemptLeg,
    HORIZON_CAP_MONTHS, ImpactConfig, ImpactMonthPoint, ImpactOutcome, ImpactShortfall,
    ImpactSummary, TaxedLeg,
};
