//! Interval presets, custom-duration validation and the retry policy.

use crate::error::ValidationError;

/// Preset intervals in minutes, longest first.
pub const DEFAULT_PRESETS: [u32; 4] = [45, 30, 15, 5];

/// Smallest accepted custom duration, in minutes.
pub const MIN_CUSTOM_MINUTES: u32 = 1;
/// Largest accepted custom duration, in minutes.
pub const MAX_CUSTOM_MINUTES: u32 = 120;

/// Parse user-entered custom minutes.
///
/// Accepts whole numbers in `1..=120` (surrounding whitespace ignored).
pub fn parse_custom_minutes(input: &str) -> Result<u32, ValidationError> {
    let trimmed = input.trim();
    let minutes: i64 = trimmed
        .parse()
        .map_err(|_| ValidationError::NotANumber(trimmed.to_string()))?;
    if minutes < i64::from(MIN_CUSTOM_MINUTES) || minutes > i64::from(MAX_CUSTOM_MINUTES) {
        return Err(ValidationError::DurationOutOfRange {
            minutes,
            min: MIN_CUSTOM_MINUTES,
            max: MAX_CUSTOM_MINUTES,
        });
    }
    Ok(minutes as u32)
}

/// Interval to use after an unsuccessful attempt.
///
/// Steps to the preset after `current` in list order. At the last preset, or
/// for a duration that is not a preset at all, `current` is reused.
pub fn retry_minutes(presets: &[u32], current: u32) -> u32 {
    presets
        .iter()
        .position(|&p| p == current)
        .and_then(|i| presets.get(i + 1))
        .copied()
        .unwrap_or(current)
}

pub fn minutes_to_secs(minutes: u32) -> u64 {
    u64::from(minutes) * 60
}

/// `mm:ss`, with minutes allowed past 59.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_out_of_range_and_garbage() {
        for input in ["0", "-5", "121", "abc", "", "2.5"] {
            assert!(parse_custom_minutes(input).is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn accepts_bounds() {
        assert_eq!(parse_custom_minutes("1"), Ok(1));
        assert_eq!(parse_custom_minutes("120"), Ok(120));
        assert_eq!(parse_custom_minutes(" 42\n"), Ok(42));
    }

    #[test]
    fn reports_reason() {
        assert_eq!(
            parse_custom_minutes("abc"),
            Err(ValidationError::NotANumber("abc".into()))
        );
        assert!(matches!(
            parse_custom_minutes("-5"),
            Err(ValidationError::DurationOutOfRange { minutes: -5, .. })
        ));
    }

    #[test]
    fn retry_steps_down_then_sticks() {
        let presets = DEFAULT_PRESETS;
        assert_eq!(retry_minutes(&presets, 45), 30);
        assert_eq!(retry_minutes(&presets, 30), 15);
        assert_eq!(retry_minutes(&presets, 15), 5);
        assert_eq!(retry_minutes(&presets, 5), 5);
    }

    #[test]
    fn retry_keeps_custom_duration() {
        assert_eq!(retry_minutes(&DEFAULT_PRESETS, 17), 17);
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(7200), "120:00");
    }

    proptest! {
        #[test]
        fn in_range_integers_round_trip(m in 1u32..=120) {
            prop_assert_eq!(parse_custom_minutes(&m.to_string()), Ok(m));
        }

        #[test]
        fn out_of_range_integers_rejected(m in prop_oneof![i64::MIN..1i64, 121i64..i64::MAX]) {
            prop_assert!(parse_custom_minutes(&m.to_string()).is_err());
        }
    }
}
