//! Page dwell time derived from page text

use std::time::Duration;

/// Minimum time a page stays on screen
pub const MIN_PAGE_DURATION_MS: u64 = 5_000;

/// Reading time granted per word
pub const MS_PER_WORD: u64 = 400;

/// Estimates how long a page should be presented from its word count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationEstimator {
    min_ms: u64,
    ms_per_word: u64,
}

impl Default for DurationEstimator {
    fn default() -> Self {
        Self {
            min_ms: MIN_PAGE_DURATION_MS,
            ms_per_word: MS_PER_WORD,
        }
    }
}

impl DurationEstimator {
    pub fn new(min_ms: u64, ms_per_word: u64) -> Self {
        Self { min_ms, ms_per_word }
    }

    pub fn min_ms(&self) -> u64 {
        self.min_ms
    }

    /// `max(min, words * per_word)`; words are whitespace-delimited
    pub fn estimate_ms(&self, text: &str) -> u64 {
        let words = text.split_whitespace().count() as u64;
        words.saturating_mul(self.ms_per_word).max(self.min_ms)
    }

    pub fn estimate(&self, text: &str) -> Duration {
        Duration::from_millis(self.estimate_ms(text))
    }
}

/// Presentation duration for `text` using the default floor and per-word rate
pub fn estimate_duration(text: &str) -> Duration {
    DurationEstimator::default().estimate(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_floor_applies_to_short_text() {
        assert_eq!(estimate_duration(&words(10)), Duration::from_millis(5_000));
        assert_eq!(estimate_duration(&words(12)), Duration::from_millis(5_000));
    }

    #[test]
    fn test_scales_with_word_count() {
        assert_eq!(estimate_duration(&words(20)), Duration::from_millis(8_000));
        assert_eq!(estimate_duration(&words(13)), Duration::from_millis(5_200));
    }

    #[test]
    fn test_empty_and_whitespace_text_use_floor() {
        assert_eq!(estimate_duration(""), Duration::from_millis(5_000));
        assert_eq!(estimate_duration("  \n\t "), Duration::from_millis(5_000));
    }

    #[test]
    fn test_irregular_whitespace_counts_words_only() {
        let text = "  The   robot\tspun\naround  ";
        assert_eq!(DurationEstimator::new(0, 400).estimate_ms(text), 1_600);
    }

    #[test]
    fn test_result_never_below_floor() {
        for n in 0..40 {
            let ms = DurationEstimator::default().estimate_ms(&words(n));
            assert!(ms >= MIN_PAGE_DURATION_MS);
            assert_eq!(ms, (n as u64 * MS_PER_WORD).max(MIN_PAGE_DURATION_MS));
        }
    }
}
