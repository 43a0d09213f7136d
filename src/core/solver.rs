use super::error::{EngineError, require_finite};
use super::rates::effective_period_rate;
use super::tax::{elapsed_days_for_months, resolve_rate};
use super::types::{
    HORIZON_CAP_MONTHS, ImpactConfig, ImpactMonthPoint, ImpactOutcome, ImpactShortfall,
    ImpactSummary,
};

const MONTHS_PER_YEAR: u32 = 12;

#[derive(Debug, Clone, Copy)]
struct MonthlyRates {
    exempt: f64,
    taxed: f64,
}

impl MonthlyRates {
    fn from_config(config: &ImpactConfig) -> Self {
        let periods = f64::from(MONTHS_PER_YEAR);
        Self {
            exempt: effective_period_rate(config.exempt_rate().annual_percent(), periods),
            taxed: effective_period_rate(config.taxed_rate().annual_percent(), periods),
        }
    }
}

#[derive(Debug)]
struct SimulationState {
    month: u32,
    exempt_value: f64,
    taxed_gross_value: f64,
    taxed_principal: f64,
    difference: f64,
    max_difference: f64,
}

impl SimulationState {
    fn new(initial_capital: f64) -> Self {
        Self {
            month: 0,
            exempt_value: initial_capital,
            taxed_gross_value: initial_capital,
            taxed_principal: initial_capital,
            difference: 0.0,
            max_difference: 0.0,
        }
    }

    fn should_continue(&self, target_difference: f64) -> bool {
        self.difference < target_difference && self.month < HORIZON_CAP_MONTHS
    }

    /// Contributions land at the start of every month but the first, before
    /// that month's growth.
    fn advance(&mut self, rates: MonthlyRates, monthly_contribution: f64) -> ImpactMonthPoint {
        if self.month > 0 {
            self.exempt_value += monthly_contribution;
            self.taxed_gross_value += monthly_contribution;
            self.taxed_principal += monthly_contribution;
        }

        self.exempt_value *= 1.0 + rates.exempt;
        self.taxed_gross_value *= 1.0 + rates.taxed;
        self.month += 1;

        let elapsed_days = elapsed_days_for_months(self.month);
        let tax_rate = resolve_rate(elapsed_days);
        let tax_paid = (self.taxed_gross_value - self.taxed_principal) * tax_rate;
        let taxed_net_value = self.taxed_gross_value - tax_paid;

        self.difference = (self.exempt_value - taxed_net_value).abs();
        self.max_difference = self.max_difference.max(self.difference);

        ImpactMonthPoint {
            month: self.month,
            elapsed_days,
            tax_rate,
            exempt_value: self.exempt_value,
            taxed_gross_value: self.taxed_gross_value,
            taxed_principal: self.taxed_principal,
            taxed_net_value,
            difference: self.difference,
        }
    }
}

pub fn solve_impact(config: &ImpactConfig) -> Result<ImpactOutcome, EngineError> {
    let mut last = None;
    let state = simulate(config, |point| last = Some(point))?;
    Ok(build_outcome(config, &state, last))
}

/// Month-by-month trajectory of the same run `solve_impact` performs.
pub fn trace_impact(config: &ImpactConfig) -> Result<Vec<ImpactMonthPoint>, EngineError> {
    solve_impact_with_trace(config).map(|(_, points)| points)
}

/// Outcome and trajectory from a single pass over the months.
pub fn solve_impact_with_trace(
    config: &ImpactConfig,
) -> Result<(ImpactOutcome, Vec<ImpactMonthPoint>), EngineError> {
    let mut points = Vec::new();
    let state = simulate(config, |point| points.push(point))?;
    let outcome = build_outcome(config, &state, points.last().copied());
    Ok((outcome, points))
}

fn simulate(
    config: &ImpactConfig,
    mut on_month: impl FnMut(ImpactMonthPoint),
) -> Result<SimulationState, EngineError> {
    validate_config(config)?;

    let rates = MonthlyRates::from_config(config);
    let mut state = SimulationState::new(config.initial_capital);
    while state.should_continue(config.target_difference) {
        let point = state.advance(rates, config.monthly_contribution);
        if !balances_are_finite(&point) {
            return Err(EngineError::BalanceOverflow { month: point.month });
        }
        on_month(point);
    }
    Ok(state)
}

fn balances_are_finite(point: &ImpactMonthPoint) -> bool {
    [
        point.exempt_value,
        point.taxed_gross_value,
        point.taxed_principal,
        point.taxed_net_value,
        point.difference,
    ]
    .iter()
    .all(|value| value.is_finite())
}

fn build_outcome(
    config: &ImpactConfig,
    state: &SimulationState,
    last: Option<ImpactMonthPoint>,
) -> ImpactOutcome {
    if state.difference >= config.target_difference {
        // A zero target is met before the first month runs.
        let final_taxed_net_value = last.map_or(state.taxed_gross_value, |p| p.taxed_net_value);
        ImpactOutcome::Reached(ImpactSummary {
            months: state.month,
            years: state.month / MONTHS_PER_YEAR,
            remainder_months: state.month % MONTHS_PER_YEAR,
            final_exempt_value: state.exempt_value,
            final_taxed_net_value,
            final_difference: state.difference,
        })
    } else {
        ImpactOutcome::NotReached(ImpactShortfall {
            horizon_cap_months: HORIZON_CAP_MONTHS,
            horizon_cap_years: HORIZON_CAP_MONTHS / MONTHS_PER_YEAR,
            final_difference: state.difference,
            max_difference: state.max_difference,
        })
    }
}

fn validate_config(config: &ImpactConfig) -> Result<(), EngineError> {
    require_finite("target_difference", config.target_difference)?;
    require_finite("initial_capital", config.initial_capital)?;
    require_finite("monthly_contribution", config.monthly_contribution)?;
    require_finite("benchmark_rate", config.benchmark_rate)?;
    require_finite("exempt_multiplier", config.exempt_multiplier)?;
    require_finite("taxed_multiplier", config.taxed_multiplier)?;

    if config.target_difference < 0.0 {
        return Err(EngineError::invalid("target_difference", "must be >= 0"));
    }
    for (field, annual) in [
        ("exempt_multiplier", config.exempt_rate().annual_percent()),
        ("taxed_multiplier", config.taxed_rate().annual_percent()),
    ] {
        if !annual.is_finite() || annual <= -100.0 {
            return Err(EngineError::invalid(
                field,
                "resulting annual rate must be > -100%",
            ));
        }
    }
    Ok(())
}
