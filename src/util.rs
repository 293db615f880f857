use crate::session::Mode;

/// `m:ss` for the stats bar. A countdown rounds partial seconds up so it
/// reads 1:00 before the first tick and only hits 0:00 at the very end.
pub fn format_clock(ms: u64, mode: Mode) -> String {
    let secs = match mode {
        Mode::Timed => ms.div_ceil(1000),
        Mode::Passage => ms / 1000,
    };
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_clock() {
        assert_eq!(format_clock(60_000, Mode::Timed), "1:00");
        assert_eq!(format_clock(59_750, Mode::Timed), "1:00");
        assert_eq!(format_clock(59_000, Mode::Timed), "0:59");
        assert_eq!(format_clock(250, Mode::Timed), "0:01");
        assert_eq!(format_clock(0, Mode::Timed), "0:00");
    }

    #[test]
    fn test_count_up_clock() {
        assert_eq!(format_clock(0, Mode::Passage), "0:00");
        assert_eq!(format_clock(999, Mode::Passage), "0:00");
        assert_eq!(format_clock(61_500, Mode::Passage), "1:01");
        assert_eq!(format_clock(600_000, Mode::Passage), "10:00");
    }
}
