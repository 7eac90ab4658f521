pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    match (mean(data), data.len()) {
        (Some(data_mean), count) if count > 0 => {
            let variance = data
                .iter()
                .map(|value| {
                    let diff = data_mean - *value;

                    diff * diff
                })
                .sum::<f64>()
                / count as f64;

            Some(variance.sqrt())
        }
        _ => None,
    }
}

/// Largest value, ignoring NaNs
pub fn max(data: &[f64]) -> Option<f64> {
    data.iter().copied().filter(|v| !v.is_nan()).reduce(f64::max)
}

/// Smallest value, ignoring NaNs
pub fn min(data: &[f64]) -> Option<f64> {
    data.iter().copied().filter(|v| !v.is_nan()).reduce(f64::min)
}
