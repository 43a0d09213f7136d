use chrono::{Days, NaiveDate};

use super::error::{EngineError, require_finite};
use super::rates::{horizon_years, simple_horizon_value};
use super::tax::{resolve_rate, tax_on_profit};
use super::types::{BetterOption, ComparisonInputs, ComparisonRow, ExemptLeg, TaxedLeg};

pub fn run_comparison(inputs: &ComparisonInputs) -> Result<Vec<ComparisonRow>, EngineError> {
    validate_inputs(inputs)?;

    let exempt_annual = inputs.exempt_rate.annual_percent();
    let taxed_annual = inputs.taxed_rate.annual_percent();

    let mut rows = Vec::with_capacity(inputs.horizon_days.len());
    for &days in &inputs.horizon_days {
        let mut row = evaluate_horizon(inputs.principal, exempt_annual, taxed_annual, days);
        row.maturity_date = match inputs.start_date {
            Some(start) => Some(maturity_date(start, days)?),
            None => None,
        };
        rows.push(row);
    }
    Ok(rows)
}

fn evaluate_horizon(
    principal: f64,
    exempt_annual_percent: f64,
    taxed_annual_percent: f64,
    horizon_days: u32,
) -> ComparisonRow {
    let years = horizon_years(horizon_days);

    let exempt_total = simple_horizon_value(principal, exempt_annual_percent, years);
    let exempt = ExemptLeg {
        total: exempt_total,
        profit: exempt_total - principal,
    };

    let gross_profit = simple_horizon_value(principal, taxed_annual_percent, years) - principal;
    let days = f64::from(horizon_days);
    let tax_paid = tax_on_profit(gross_profit, days);
    let net_profit = gross_profit - tax_paid;
    let taxed = TaxedLeg {
        gross_profit,
        tax_paid,
        net_profit,
        total: principal + net_profit,
    };

    ComparisonRow {
        horizon_days,
        horizon_years: years,
        tax_rate: resolve_rate(days),
        exempt,
        taxed,
        difference: (taxed.total - exempt.total).abs(),
        better_option: better_option(exempt.total, taxed.total),
        maturity_date: None,
    }
}

/// Strict comparison: the exempt vehicle only wins when it nets strictly more.
pub fn better_option(exempt_total: f64, taxed_net_total: f64) -> BetterOption {
    if exempt_total > taxed_net_total {
        BetterOption::Exempt
    } else {
        BetterOption::Taxed
    }
}

fn maturity_date(start: NaiveDate, horizon_days: u32) -> Result<NaiveDate, EngineError> {
    start
        .checked_add_days(Days::new(u64::from(horizon_days)))
        .ok_or_else(|| EngineError::invalid("start_date", "maturity date is out of range"))
}

fn validate_inputs(inputs: &ComparisonInputs) -> Result<(), EngineError> {
    require_finite("principal", inputs.principal)?;
    require_finite("exempt_rate", inputs.exempt_rate.annual_percent())?;
    require_finite("taxed_rate", inputs.taxed_rate.annual_percent())?;
    if inputs.horizon_days.is_empty() {
        return Err(EngineError::invalid(
            "horizon_days",
            "at least one horizon is required",
        ));
    }
    Ok(())
}
