const PERCENT_DIVISOR: u64 = 100;
const RATE_SCALE: u128 = 10_000;

/// Nearest-rank percentile over sorted values: `sorted[ceil(n * p / 100) - 1]`,
/// clamped to the slice. Empty input yields 0.
#[must_use]
pub fn percentile(sorted: &[u64], percent: u64) -> u64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return 0;
    };
    let count = u64::try_from(sorted.len()).unwrap_or(u64::MAX);
    let rank = count
        .saturating_mul(percent)
        .div_ceil(PERCENT_DIVISOR)
        .saturating_sub(1);
    let index = usize::try_from(rank).unwrap_or(last).min(last);
    sorted.get(index).copied().unwrap_or(0)
}

/// Integer mean, truncated. Empty input yields 0.
#[must_use]
pub fn average(values: &[u64]) -> u64 {
    let count = u64::try_from(values.len()).unwrap_or(u64::MAX);
    let sum = values
        .iter()
        .fold(0u128, |acc, value| acc.saturating_add(u128::from(*value)));
    sum.checked_div(u128::from(count))
        .and_then(|mean| u64::try_from(mean).ok())
        .unwrap_or(0)
}

/// `numerator / denominator` as a percentage with two implied decimals;
/// `7_500` is 75.00%. A zero denominator yields 0.
#[must_use]
pub fn rate_x100(numerator: u64, denominator: u64) -> u64 {
    let scaled = u128::from(numerator)
        .saturating_mul(RATE_SCALE)
        .checked_div(u128::from(denominator))
        .unwrap_or(0);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Renders a value with two implied decimals, e.g. `1234` as `12.34`.
#[must_use]
pub fn format_x100(value: u64) -> String {
    format!("{}.{:02}", value / PERCENT_DIVISOR, value % PERCENT_DIVISOR)
}
