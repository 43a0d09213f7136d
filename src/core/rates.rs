use serde::{Deserialize, Serialize};

/// Day-count basis for the fixed-horizon comparison.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// An annual rate in percent, either quoted directly or as a share of a
/// benchmark such as the CDI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RateSpec {
    Annual {
        percent: f64,
    },
    #[serde(rename_all = "camelCase")]
    BenchmarkMultiple {
        benchmark_percent: f64,
        multiplier_percent: f64,
    },
}

impl RateSpec {
    pub fn of_benchmark(benchmark_percent: f64, multiplier_percent: f64) -> Self {
        Self::BenchmarkMultiple {
            benchmark_percent,
            multiplier_percent,
        }
    }

    pub fn annual_percent(self) -> f64 {
        match self {
            Self::Annual { percent } => percent,
            Self::BenchmarkMultiple {
                benchmark_percent,
                multiplier_percent,
            } => benchmark_percent * multiplier_percent / 100.0,
        }
    }
}

/// Geometric conversion of an annual rate into the equivalent rate for one of
/// `periods_per_year` compounding periods.
pub fn effective_period_rate(annual_rate_percent: f64, periods_per_year: f64) -> f64 {
    (1.0 + annual_rate_percent / 100.0).powf(1.0 / periods_per_year) - 1.0
}

/// Simple-interest projection of `principal` over `years`.
pub fn simple_horizon_value(principal: f64, annual_rate_percent: f64, years: f64) -> f64 {
    principal * (1.0 + (annual_rate_percent / 100.0) * years)
}

pub fn horizon_years(days: u32) -> f64 {
    f64::from(days) / DAYS_PER_YEAR
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    fn assert_approx(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn benchmark_multiple_scales_the_benchmark() {
        assert_approx(RateSpec::of_benchmark(14.9, 95.0).annual_percent(), 14.155, 1e-12);
        assert_approx(RateSpec::of_benchmark(14.9, 110.0).annual_percent(), 16.39, 1e-12);
        assert_eq!(RateSpec::Annual { percent: 6.0 }.annual_percent(), 6.0);
    }

    #[test]
    fn monthly_rate_is_geometric_not_divided() {
        let monthly = effective_period_rate(12.0, 12.0);
        assert!(monthly < 0.01);
        assert_approx(monthly, 1.12f64.powf(1.0 / 12.0) - 1.0, 1e-15);
    }

    #[test]
    fn one_period_per_year_is_the_annual_rate() {
        assert_approx(effective_period_rate(14.9, 1.0), 0.149, 1e-12);
    }

    #[test]
    fn simple_projection_is_linear_in_time() {
        assert_approx(simple_horizon_value(10_000.0, 10.0, 1.0), 11_000.0, 1e-9);
        assert_approx(simple_horizon_value(10_000.0, 10.0, 2.0), 12_000.0, 1e-9);
        assert_approx(simple_horizon_value(10_000.0, 10.0, 0.0), 10_000.0, 1e-9);
        assert_approx(simple_horizon_value(0.0, 10.0, 3.0), 0.0, 1e-9);
        assert_approx(simple_horizon_value(-1_000.0, 10.0, 1.0), -1_100.0, 1e-9);
    }

    #[test]
    fn horizon_years_uses_a_365_day_year() {
        assert_approx(horizon_years(365), 1.0, 1e-12);
        assert_approx(horizon_years(730), 2.0, 1e-12);
        assert_approx(horizon_years(360), 360.0 / 365.0, 1e-12);
    }

    #[test]
    fn rate_spec_deserializes_both_forms() {
        let direct: RateSpec =
            serde_json::from_str(r#"{"kind":"annual","percent":6.5}"#).expect("annual form");
        assert_eq!(direct, RateSpec::Annual { percent: 6.5 });

        let multiple: RateSpec = serde_json::from_str(
            r#"{"kind":"benchmarkMultiple","benchmarkPercent":14.9,"multiplierPercent":95}"#,
        )
        .expect("benchmark form");
        assert_eq!(multiple, RateSpec::of_benchmark(14.9, 95.0));
    }

    proptest! {
        #[test]
        fn prop_period_rate_compounds_back_to_annual(
            rate_bp in -5_000i32..10_000,
            periods in 1u32..400
        ) {
            let annual = f64::from(rate_bp) / 100.0;
            let n = f64::from(periods);
            let period_rate = effective_period_rate(annual, n);
            let compounded = (1.0 + period_rate).powf(n) - 1.0;
            prop_assert!((compounded - annual / 100.0).abs() < 1e-9);
        }

        #[test]
        fn prop_period_rate_never_exceeds_simple_split(
            rate_bp in 0i32..10_000,
            periods in 1u32..400
        ) {
            let annual = f64::from(rate_bp) / 100.0;
            let n = f64::from(periods);
            prop_assert!(effective_period_rate(annual, n) <= annual / 100.0 / n + 1e-15);
        }
    }
}
