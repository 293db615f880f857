use crate::session::{Mode, TIME_LIMIT_MS};

/// Characters per "word" for WPM purposes.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Snapshot of the live numbers shown while typing and on the results screen.
///
/// Always derived from a session, never mutated on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
    pub wpm: u32,
    pub accuracy: u32,
    /// Countdown in timed mode, count-up in passage mode.
    pub display_elapsed_ms: u64,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            wpm: 0,
            accuracy: 100,
            display_elapsed_ms: 0,
            correct_chars: 0,
            incorrect_chars: 0,
        }
    }
}

impl Metrics {
    pub fn compute(typed_len: usize, error_count: usize, elapsed_ms: u64, mode: Mode) -> Self {
        Self {
            wpm: gross_wpm(typed_len, elapsed_ms),
            accuracy: accuracy(typed_len, error_count),
            display_elapsed_ms: display_elapsed_ms(elapsed_ms, mode),
            // errors survive backspace, so they can outnumber what is currently typed
            correct_chars: typed_len.saturating_sub(error_count),
            incorrect_chars: error_count,
        }
    }
}

/// Gross words per minute: every typed character counts, errors are not subtracted.
pub fn gross_wpm(typed_len: usize, elapsed_ms: u64) -> u32 {
    let elapsed_minutes = elapsed_ms as f64 / 60_000.0;
    if elapsed_minutes > 0.0 {
        (typed_len as f64 / CHARS_PER_WORD / elapsed_minutes).round() as u32
    } else {
        0
    }
}

/// Percentage of typed characters never flagged as an error, in `[0, 100]`.
pub fn accuracy(typed_len: usize, error_count: usize) -> u32 {
    if typed_len == 0 {
        return 100;
    }

    let ratio = (typed_len as f64 - error_count as f64) / typed_len as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u32
}

pub fn display_elapsed_ms(elapsed_ms: u64, mode: Mode) -> u64 {
    match mode {
        Mode::Timed => TIME_LIMIT_MS.saturating_sub(elapsed_ms),
        Mode::Passage => elapsed_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metrics() {
        let m = Metrics::default();
        assert_eq!(m.wpm, 0);
        assert_eq!(m.accuracy, 100);
        assert_eq!(m.correct_chars, 0);
    }

    #[test]
    fn test_accuracy_no_input() {
        assert_eq!(accuracy(0, 0), 100);
        // historical errors with nothing typed still read as 100
        assert_eq!(accuracy(0, 3), 100);
    }

    #[test]
    fn test_accuracy_rounds() {
        assert_eq!(accuracy(3, 1), 67);
        assert_eq!(accuracy(3, 2), 33);
        assert_eq!(accuracy(8, 1), 88); // 87.5 rounds up
        assert_eq!(accuracy(4, 0), 100);
    }

    #[test]
    fn test_accuracy_clamped_when_errors_exceed_typed() {
        assert_eq!(accuracy(1, 2), 0);
        assert_eq!(accuracy(2, 2), 0);
    }

    #[test]
    fn test_wpm_zero_without_elapsed_time() {
        assert_eq!(gross_wpm(0, 0), 0);
        assert_eq!(gross_wpm(120, 0), 0);
    }

    #[test]
    fn test_wpm_full_minute() {
        assert_eq!(gross_wpm(200, 60_000), 40);
        assert_eq!(gross_wpm(203, 60_000), 41); // 40.6
    }

    #[test]
    fn test_wpm_partial_minute() {
        // 50 chars in 30s = 10 words / 0.5 min
        assert_eq!(gross_wpm(50, 30_000), 20);
    }

    #[test]
    fn test_display_elapsed_countdown() {
        assert_eq!(display_elapsed_ms(0, Mode::Timed), 60_000);
        assert_eq!(display_elapsed_ms(15_250, Mode::Timed), 44_750);
        assert_eq!(display_elapsed_ms(60_000, Mode::Timed), 0);
        assert_eq!(display_elapsed_ms(75_000, Mode::Timed), 0);
    }

    #[test]
    fn test_display_elapsed_count_up() {
        assert_eq!(display_elapsed_ms(15_250, Mode::Passage), 15_250);
    }

    #[test]
    fn test_compute_counts() {
        let m = Metrics::compute(10, 2, 60_000, Mode::Passage);
        assert_eq!(m.correct_chars, 8);
        assert_eq!(m.incorrect_chars, 2);
        assert_eq!(m.accuracy, 80);
        assert_eq!(m.wpm, 2);
        assert_eq!(m.display_elapsed_ms, 60_000);
    }

    #[test]
    fn test_compute_saturates_correct_chars() {
        let m = Metrics::compute(1, 3, 1_000, Mode::Timed);
        assert_eq!(m.correct_chars, 0);
        assert_eq!(m.incorrect_chars, 3);
        assert_eq!(m.accuracy, 0);
    }
}
