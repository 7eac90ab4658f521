/// Word-level accuracy of `typed` against `original`, as a percentage in [0, 100].
///
/// Both strings are split on runs of whitespace; the word at each index of the
/// original counts as correct only if the typed word at the same index is
/// exactly equal (case and punctuation included). An original with no words
/// scores 0.
pub fn calculate_accuracy(original: &str, typed: &str) -> f64 {
    let original_words: Vec<&str> = original.split_whitespace().collect();
    if original_words.is_empty() {
        return 0.0;
    }

    let typed_words: Vec<&str> = typed.split_whitespace().collect();
    let correct_words = original_words
        .iter()
        .enumerate()
        .filter(|(idx, word)| typed_words.get(*idx) == Some(*word))
        .count();

    (correct_words as f64 / original_words.len() as f64) * 100.0
}

/// Number of whitespace-delimited words in `text`
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Words per minute for `words` typed over `elapsed_secs`.
///
/// A zero (or negative) duration yields 0.0 instead of infinity.
pub fn words_per_minute(words: usize, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    (words as f64 / elapsed_secs) * 60.0
}

/// Scored result of a submitted attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub time_secs: f64,
    pub wpm: f64,
    pub accuracy: f64,
}

impl Metrics {
    /// Score `typed` against `passage` for an attempt that took `time_secs`.
    /// The typed text is trimmed before counting words and comparing.
    pub fn score(passage: &str, typed: &str, time_secs: f64) -> Self {
        let typed = typed.trim();
        Self {
            time_secs,
            wpm: words_per_minute(count_words(typed), time_secs),
            accuracy: calculate_accuracy(passage, typed),
        }
    }
}
