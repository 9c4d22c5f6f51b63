use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use super::error::ProjectionError;
use super::types::{
    DayPoint, Difference, ProjectionResult, RealisticResult, SeriesResult, SimulationParams,
};

/// Runs a projection with a fresh entropy-seeded generator.
pub fn project(params: &SimulationParams) -> Result<ProjectionResult, ProjectionError> {
    let mut rng = StdRng::from_entropy();
    project_with_rng(params, &mut rng)
}

pub fn project_seeded(
    params: &SimulationParams,
    seed: u64,
) -> Result<ProjectionResult, ProjectionError> {
    let mut rng = StdRng::seed_from_u64(seed);
    project_with_rng(params, &mut rng)
}

/// Day-by-day compounding of an ideal (fixed rate) and a realistic
/// (uniformly perturbed rate) balance over `1..=duration_days`.
///
/// Exactly one sample is drawn from `rng` per simulated day, so the ideal
/// path never depends on the generator and chart sampling never shifts the
/// realistic path.
pub fn project_with_rng<R: Rng + ?Sized>(
    params: &SimulationParams,
    rng: &mut R,
) -> Result<ProjectionResult, ProjectionError> {
    validate(params)?;

    let principal = params.principal;
    let days = params.duration_days;
    let interval = chart_interval(days, params.max_chart_points);
    let capacity = (days / interval) as usize + 2;

    let mut ideal = principal;
    let mut real = principal;
    let mut total_contributions = principal;

    let mut ideal_series = Vec::with_capacity(capacity);
    let mut real_series = Vec::with_capacity(capacity);
    ideal_series.push(DayPoint::new(0, principal));
    real_series.push(DayPoint::new(0, principal));

    let mut worst_day = DayPoint::new(0, principal);
    let mut best_day = DayPoint::new(0, principal);
    let mut anomalous_days = 0_u32;

    for day in 1..=days {
        if params.deposits_enabled() && day % params.deposit_interval_days == 0 {
            ideal += params.deposit_amount;
            real += params.deposit_amount;
            total_contributions += params.deposit_amount;
        }

        ideal *= 1.0 + params.daily_rate;

        let shock: f64 = rng.gen_range(-1.0..=1.0);
        real *= 1.0 + params.daily_rate + shock * params.volatility;

        let ideal_reset = reset_if_non_finite(&mut ideal, principal);
        let real_reset = reset_if_non_finite(&mut real, principal);
        if ideal_reset || real_reset {
            anomalous_days += 1;
        }

        if real < worst_day.amount {
            worst_day = DayPoint::new(day, real);
        }
        if real > best_day.amount {
            best_day = DayPoint::new(day, real);
        }

        if day % interval == 0 || day == days {
            ideal_series.push(DayPoint::new(day, ideal));
            real_series.push(DayPoint::new(day, real));
        }
    }

    if anomalous_days > 0 {
        warn!(
            anomalous_days,
            daily_rate = params.daily_rate,
            volatility = params.volatility,
            "non-finite balance reset to principal"
        );
    }

    let ideal_result = summarize(ideal, total_contributions, ideal_series);
    let real_result = RealisticResult {
        summary: summarize(real, total_contributions, real_series),
        worst_day,
        best_day,
    };

    let difference_amount = real - ideal;
    let difference = Difference {
        amount: difference_amount,
        percentage: safe_ratio(difference_amount, ideal),
    };

    debug!(
        days,
        chart_interval = interval,
        ideal_final = ideal,
        real_final = real,
        total_contributions,
        "projection complete"
    );

    Ok(ProjectionResult {
        ideal: ideal_result,
        real: real_result,
        difference,
        total_contributions,
        numeric_anomaly: anomalous_days > 0,
    })
}

/// Closed-form ideal balance without deposits, as quoted before a run.
pub fn estimated_final_amount(principal: f64, daily_rate: f64, days: u32) -> f64 {
    principal * (1.0 + daily_rate).powf(f64::from(days))
}

/// Day stride between retained chart points. Ceiling division keeps the
/// number of interior points at or below `max_chart_points`.
pub fn chart_interval(duration_days: u32, max_chart_points: u32) -> u32 {
    duration_days.div_ceil(max_chart_points.max(1)).max(1)
}

fn validate(params: &SimulationParams) -> Result<(), ProjectionError> {
    if !params.principal.is_finite() || params.principal <= 0.0 {
        return Err(ProjectionError::invalid(
            "principal",
            format!("must be a finite amount > 0, got {}", params.principal),
        ));
    }

    if params.duration_days < 1 {
        return Err(ProjectionError::invalid("duration_days", "must be >= 1"));
    }

    Ok(())
}

fn reset_if_non_finite(amount: &mut f64, fallback: f64) -> bool {
    if amount.is_finite() {
        return false;
    }
    *amount = fallback;
    true
}

fn summarize(final_amount: f64, total_contributions: f64, series: Vec<DayPoint>) -> SeriesResult {
    let total_gain = final_amount - total_contributions;
    SeriesResult {
        final_amount,
        total_gain,
        return_rate: safe_ratio(total_gain, total_contributions),
        series,
    }
}

fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    numerator / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS * expected.abs().max(1.0),
            "expected {expected}, got {actual}"
        );
    }

    fn sample_params() -> SimulationParams {
        SimulationParams {
            principal: 1_000.0,
            daily_rate: 0.0004,
            volatility: 0.002,
            duration_days: 90,
            deposit_amount: 100.0,
            deposit_interval_days: 7,
            max_chart_points: 20,
        }
    }

    fn flat_params(duration_days: u32, deposit_amount: f64, interval: u32) -> SimulationParams {
        SimulationParams {
            daily_rate: 0.0,
            volatility: 0.0,
            duration_days,
            deposit_amount,
            deposit_interval_days: interval,
            ..sample_params()
        }
    }

    #[test]
    fn weekly_deposits_accumulate_without_growth() {
        let result = project_seeded(&flat_params(30, 100.0, 7), 1).expect("valid params");

        assert_eq!(result.ideal.final_amount, 1_400.0);
        assert_eq!(result.real.summary.final_amount, 1_400.0);
        assert_eq!(result.total_contributions, 1_400.0);
        assert_eq!(result.ideal.total_gain, 0.0);
        assert_eq!(result.ideal.return_rate, 0.0);
        assert_eq!(result.difference.amount, 0.0);
        assert_eq!(result.difference.percentage, 0.0);
    }

    #[test]
    fn zero_interval_ignores_deposit_amount() {
        let result = project_seeded(&flat_params(60, 250.0, 0), 4).expect("valid params");

        assert_eq!(result.total_contributions, 1_000.0);
        assert_eq!(result.ideal.final_amount, 1_000.0);
        assert_eq!(result.real.summary.final_amount, 1_000.0);
    }

    #[test]
    fn flat_path_keeps_extrema_on_day_zero() {
        let result = project_seeded(&flat_params(45, 0.0, 0), 9).expect("valid params");

        assert_eq!(result.real.worst_day, DayPoint::new(0, 1_000.0));
        assert_eq!(result.real.best_day, DayPoint::new(0, 1_000.0));
    }

    #[test]
    fn extrema_day_reflects_last_deposit() {
        let result = project_seeded(&flat_params(30, 100.0, 7), 3).expect("valid params");

        assert_eq!(result.real.worst_day, DayPoint::new(0, 1_000.0));
        assert_eq!(result.real.best_day, DayPoint::new(28, 1_400.0));
    }

    #[test]
    fn ideal_compounding_matches_closed_form() {
        let params = SimulationParams {
            deposit_amount: 0.0,
            deposit_interval_days: 0,
            ..sample_params()
        };
        let result = project_seeded(&params, 11).expect("valid params");
        let expected = estimated_final_amount(1_000.0, 0.0004, 90);

        assert_approx(result.ideal.final_amount, expected);
        assert_approx(result.ideal.total_gain, expected - 1_000.0);
        assert_approx(result.ideal.return_rate, (expected - 1_000.0) / 1_000.0);
    }

    #[test]
    fn deposit_lands_before_growth_on_its_day() {
        let params = SimulationParams {
            principal: 1_000.0,
            daily_rate: 0.01,
            volatility: 0.0,
            duration_days: 2,
            deposit_amount: 100.0,
            deposit_interval_days: 2,
            max_chart_points: 20,
        };
        let result = project_seeded(&params, 5).expect("valid params");

        assert_approx(result.ideal.final_amount, (1_000.0 * 1.01 + 100.0) * 1.01);
        assert_approx(result.total_contributions, 1_100.0);
    }

    #[test]
    fn rejects_non_positive_principal() {
        for principal in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let params = SimulationParams {
                principal,
                ..sample_params()
            };
            let err = project_seeded(&params, 1).expect_err("must reject principal");
            assert!(matches!(
                err,
                ProjectionError::InvalidInput {
                    field: "principal",
                    ..
                }
            ));
        }
    }

    #[test]
    fn rejects_zero_duration() {
        let params = SimulationParams {
            duration_days: 0,
            ..sample_params()
        };
        let err = project(&params).expect_err("must reject duration");
        assert!(err.to_string().contains("duration_days"));
    }

    #[test]
    fn infinite_volatility_is_clamped_and_flagged() {
        let params = SimulationParams {
            volatility: f64::INFINITY,
            ..sample_params()
        };
        let result = project_seeded(&params, 17).expect("valid params");

        assert!(result.numeric_anomaly);
        assert!(result.real.summary.final_amount.is_finite());
        assert!(
            result
                .real
                .summary
                .series
                .iter()
                .all(|point| point.amount.is_finite())
        );
    }

    #[test]
    fn ordinary_run_reports_no_anomaly() {
        let result = project_seeded(&sample_params(), 17).expect("valid params");
        assert!(!result.numeric_anomaly);
    }

    #[test]
    fn same_seed_reproduces_realistic_path() {
        let a = project_seeded(&sample_params(), 2024).expect("valid params");
        let b = project_seeded(&sample_params(), 2024).expect("valid params");
        assert_eq!(a, b);
    }

    #[test]
    fn chart_interval_covers_small_and_uneven_windows() {
        assert_eq!(chart_interval(30, 20), 2);
        assert_eq!(chart_interval(20, 20), 1);
        assert_eq!(chart_interval(5, 20), 1);
        assert_eq!(chart_interval(365, 20), 19);
        assert_eq!(chart_interval(10, 0), 10);
    }

    #[test]
    fn series_keeps_final_day_off_the_interval() {
        let params = SimulationParams {
            duration_days: 365,
            ..sample_params()
        };
        let result = project_seeded(&params, 8).expect("valid params");
        let days: Vec<u32> = result.ideal.series.iter().map(|p| p.day).collect();

        assert_eq!(days.first(), Some(&0));
        assert_eq!(days.last(), Some(&365));
        assert_eq!(days[1], 19);
        assert_eq!(days.len(), 21);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_ideal_path_is_independent_of_randomness(
            principal in 1.0f64..1_000_000.0,
            daily_rate in -0.01f64..0.01,
            volatility in 0.0f64..0.05,
            duration_days in 1u32..730,
            deposit_amount in 0.0f64..5_000.0,
            deposit_interval_days in 0u32..60,
            seed_a in 0u64..u64::MAX,
            seed_b in 0u64..u64::MAX,
        ) {
            let params = SimulationParams {
                principal,
                daily_rate,
                volatility,
                duration_days,
                deposit_amount,
                deposit_interval_days,
                max_chart_points: 20,
            };
            let a = project_seeded(&params, seed_a).expect("valid params");
            let b = project_seeded(&params, seed_b).expect("valid params");
            prop_assert_eq!(a.ideal, b.ideal);
            prop_assert_eq!(a.total_contributions, b.total_contributions);
        }

        #[test]
        fn prop_positive_rate_without_deposits_strictly_increases(
            principal in 1.0f64..1_000_000.0,
            daily_rate in 0.0001f64..0.01,
            duration_days in 1u32..730,
            max_chart_points in 1u32..50,
            deposit_amount in 0.0f64..5_000.0,
        ) {
            let params = SimulationParams {
                principal,
                daily_rate,
                volatility: 0.01,
                duration_days,
                deposit_amount,
                deposit_interval_days: 0,
                max_chart_points,
            };
            let result = project(&params).expect("valid params");
            for pair in result.ideal.series.windows(2) {
                prop_assert!(pair[1].amount > pair[0].amount);
            }
            prop_assert_eq!(result.total_contributions, principal);
        }

        #[test]
        fn prop_flat_rates_only_accumulate_deposits(
            principal in 1u32..100_000,
            duration_days in 1u32..730,
            deposit_amount in 0u32..5_000,
            deposit_interval_days in 1u32..60,
            seed in 0u64..u64::MAX,
        ) {
            let params = SimulationParams {
                principal: f64::from(principal),
                daily_rate: 0.0,
                volatility: 0.0,
                duration_days,
                deposit_amount: f64::from(deposit_amount),
                deposit_interval_days,
                max_chart_points: 20,
            };
            let expected = f64::from(principal)
                + f64::from(params.deposit_count()) * f64::from(deposit_amount);
            let result = project_seeded(&params, seed).expect("valid params");
            prop_assert_eq!(result.ideal.final_amount, expected);
            prop_assert_eq!(result.real.summary.final_amount, expected);
        }

        #[test]
        fn prop_extreme_volatility_never_leaks_non_finite_values(
            principal in 1.0f64..1e12,
            daily_rate in -10.0f64..10.0,
            volatility_exp in 0i32..308,
            duration_days in 1u32..400,
            seed in 0u64..u64::MAX,
        ) {
            let params = SimulationParams {
                principal,
                daily_rate,
                volatility: 10f64.powi(volatility_exp),
                duration_days,
                deposit_amount: 10.0,
                deposit_interval_days: 3,
                max_chart_points: 20,
            };
            let result = project_seeded(&params, seed).expect("valid params");
            for point in result.ideal.series.iter().chain(result.real.summary.series.iter()) {
                prop_assert!(point.amount.is_finite());
            }
            prop_assert!(result.real.worst_day.amount.is_finite());
            prop_assert!(result.real.best_day.amount.is_finite());
        }

        #[test]
        fn prop_extrema_bound_every_daily_value(
            daily_rate in -0.005f64..0.005,
            volatility in 0.0f64..0.05,
            duration_days in 1u32..400,
            max_chart_points in 1u32..30,
            seed in 0u64..u64::MAX,
        ) {
            let sparse = SimulationParams {
                daily_rate,
                volatility,
                duration_days,
                max_chart_points,
                ..sample_params()
            };
            let dense = SimulationParams {
                max_chart_points: duration_days,
                ..sparse.clone()
            };
            let sparse_result = project_seeded(&sparse, seed).expect("valid params");
            let dense_result = project_seeded(&dense, seed).expect("valid params");

            // One point per day, same draws.
            prop_assert_eq!(dense_result.real.summary.series.len(), duration_days as usize + 1);
            for point in &dense_result.real.summary.series {
                prop_assert!(sparse_result.real.worst_day.amount <= point.amount);
                prop_assert!(sparse_result.real.best_day.amount >= point.amount);
            }
            prop_assert_eq!(sparse_result.real.worst_day, dense_result.real.worst_day);
            prop_assert_eq!(sparse_result.real.best_day, dense_result.real.best_day);
        }

        #[test]
        fn prop_chart_points_are_capped_and_end_on_final_day(
            duration_days in 1u32..2_000,
            max_chart_points in 0u32..60,
        ) {
            let params = SimulationParams {
                duration_days,
                max_chart_points,
                ..sample_params()
            };
            let result = project(&params).expect("valid params");
            for series in [&result.ideal.series, &result.real.summary.series] {
                prop_assert!(series.len() <= max_chart_points as usize + 2);
                prop_assert_eq!(series.first().map(|p| p.day), Some(0));
                prop_assert_eq!(series.last().map(|p| p.day), Some(duration_days));
                for pair in series.windows(2) {
                    prop_assert!(pair[0].day < pair[1].day);
                }
            }
        }

        #[test]
        fn prop_difference_matches_finals_with_consistent_sign(
            daily_rate in -0.01f64..0.01,
            volatility in 0.0f64..0.05,
            duration_days in 1u32..400,
            seed in 0u64..u64::MAX,
        ) {
            let params = SimulationParams {
                daily_rate,
                volatility,
                duration_days,
                ..sample_params()
            };
            let result = project_seeded(&params, seed).expect("valid params");
            let expected = result.real.summary.final_amount - result.ideal.final_amount;
            prop_assert_eq!(result.difference.amount, expected);
            prop_assert!(result.ideal.final_amount > 0.0);
            prop_assert!(
                result.difference.amount == 0.0
                    || result.difference.percentage.signum() == result.difference.amount.signum()
            );
            prop_assert_eq!(
                result.ideal.total_gain,
                result.ideal.final_amount - result.total_contributions
            );
        }
    }
}
