/// Fixed two-decimal rendering used for time, wpm and accuracy
pub fn two_decimals(val: f64) -> String {
    format!("{val:.2}")
}

pub fn percent(val: f64) -> String {
    format!("{}%", two_decimals(val))
}

/// Cosmetic elapsed-time line shown while a test runs
pub fn timer_text(elapsed_secs: f64) -> String {
    format!("Time: {} seconds", two_decimals(elapsed_secs))
}

pub fn result_text(time_secs: f64, wpm: f64, accuracy: f64) -> String {
    format!(
        "Time taken: {} seconds. Words per minute: {}. Accuracy: {}",
        two_decimals(time_secs),
        two_decimals(wpm),
        percent(accuracy)
    )
}

pub const MISMATCH_TEXT: &str = "Text does not match. Please try again.";
