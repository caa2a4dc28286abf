/// Folds `new_value` into an average taken over `count` previous samples,
/// rounding to the nearest whole number.
pub fn running_average(old_avg: u32, count: u32, new_value: u32) -> u32 {
    let total = old_avg as f64 * count as f64 + new_value as f64;
    (total / (count as f64 + 1.0)).round() as u32
}

/// Rounded `total / count`, zero when there are no samples.
pub fn rounded_mean(total: u64, count: u32) -> u32 {
    match count {
        0 => 0,
        n => (total as f64 / n as f64).round() as u32,
    }
}
