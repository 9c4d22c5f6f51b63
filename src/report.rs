use std::fmt;

use crate::core::{Product, ProjectionResult, SimulationParams};

const CURRENCY: &str = "GH₵";

/// `GH₵ 1,234.56`. NaN and infinities render as zero; amounts that round
/// to zero carry no sign.
pub fn format_currency(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let fixed = format!("{amount:.2}");
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) if rest.bytes().any(|b| matches!(b, b'1'..=b'9')) => ("-", rest),
        Some(rest) => ("", rest),
        None => ("", fixed.as_str()),
    };
    let (whole, cents) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{CURRENCY} {sign}{grouped}.{cents}")
}

pub fn format_percent(ratio: f64) -> String {
    format!("{:+.2}%", ratio * 100.0)
}

/// Plain-text summary of a projection for terminal output.
pub struct Report<'a> {
    pub product: &'a Product,
    pub params: &'a SimulationParams,
    pub result: &'a ProjectionResult,
}

impl<'a> Report<'a> {
    pub fn new(
        product: &'a Product,
        params: &'a SimulationParams,
        result: &'a ProjectionResult,
    ) -> Self {
        Self {
            product,
            params,
            result,
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Report {
            product,
            params,
            result,
        } = self;

        writeln!(f, "{} ({})", product.label, product.description)?;
        writeln!(
            f,
            "Invested {} over {} days",
            format_currency(params.principal),
            params.duration_days
        )?;
        if params.deposits_enabled() && params.deposit_amount > 0.0 {
            writeln!(
                f,
                "Top-ups: {} every {} days",
                format_currency(params.deposit_amount),
                params.deposit_interval_days
            )?;
        }
        writeln!(
            f,
            "Total contributions: {}",
            format_currency(result.total_contributions)
        )?;
        writeln!(f)?;

        let real = &result.real.summary;
        for (label, summary) in [("Ideal", &result.ideal), ("Realistic", real)] {
            writeln!(
                f,
                "{label:<10} final {}  gain {}  return {}",
                format_currency(summary.final_amount),
                format_currency(summary.total_gain),
                format_percent(summary.return_rate)
            )?;
        }
        writeln!(
            f,
            "Lowest point {} on day {}, highest {} on day {}",
            format_currency(result.real.worst_day.amount),
            result.real.worst_day.day,
            format_currency(result.real.best_day.amount),
            result.real.best_day.day
        )?;
        writeln!(
            f,
            "Realistic vs ideal: {} ({})",
            format_currency(result.difference.amount),
            format_percent(result.difference.percentage)
        )?;
        if result.numeric_anomaly {
            writeln!(f, "warning: some balances overflowed and were reset")?;
        }

        writeln!(f)?;
        writeln!(f, "{:>6}  {:>16}  {:>16}", "day", "ideal", "realistic")?;
        for (ideal, real) in result.ideal.series.iter().zip(real.series.iter()) {
            writeln!(
                f,
                "{:>6}  {:>16}  {:>16}",
                ideal.day,
                format_currency(ideal.amount),
                format_currency(real.amount)
            )?;
        }
        Ok(())
    }
}
