//! Duration parsing and display formatting
//!
//! Free-form input ("10m", "2h 3m 4s", "01:30", "90") becomes whole
//! seconds; seconds become a padded clock string according to the
//! configured display format. Both directions are total: parsing never
//! fails (invalid input is 0) and formatting clamps instead of erroring.

use serde::{Deserialize, Serialize};

/// Panel display format for the remaining time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayFormat {
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "mm:ss")]
    MmSs,
    #[serde(rename = "hh:mm:ss")]
    HhMmSs,
    #[serde(rename = "hide-hours-if-zero")]
    HideHoursIfZero,
}

/// Parse a duration string into seconds. Invalid or empty input yields 0.
///
/// Accepted forms, first match wins:
/// 1. `hh:mm` or `hh:mm:ss` (minute/second fields of 1-2 digits; a minute
///    or second of 60 or more rejects the whole input)
/// 2. a bare integer, read as seconds
/// 3. free-form unit tokens anywhere in the string, in any order:
///    `2h 30m`, `45s`, `1h30`, `10 minutes`
pub fn parse_duration(input: &str) -> u64 {
    let input = input.trim();
    if input.is_empty() {
        return 0;
    }
    if let Some(total) = parse_clock_format(input) {
        return total;
    }
    if input.bytes().all(|b| b.is_ascii_digit()) {
        return input.parse().unwrap_or(0);
    }
    parse_free_units(input)
}

fn parse_clock_format(input: &str) -> Option<u64> {
    let fields: Vec<&str> = input.split(':').collect();
    if fields.len() < 2 || fields.len() > 3 {
        return None;
    }
    if fields[0].is_empty() || !fields[0].bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    for field in &fields[1..] {
        if field.is_empty() || field.len() > 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    let hours: u64 = fields[0].parse().ok()?;
    let minutes: u64 = fields[1].parse().ok()?;
    let seconds: u64 = match fields.get(2) {
        Some(f) => f.parse().ok()?,
        None => 0,
    };

    // No partial credit: an out-of-range field rejects the whole input.
    if minutes >= 60 || seconds >= 60 {
        return Some(0);
    }
    Some(
        hours
            .saturating_mul(3600)
            .saturating_add(minutes * 60)
            .saturating_add(seconds),
    )
}

fn parse_free_units(input: &str) -> u64 {
    let chars: Vec<char> = input.chars().collect();
    let mut total: u64 = 0;
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        let value: u64 = chars[start..i].iter().collect::<String>().parse().unwrap_or(0);

        let mut j = i;
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }
        if j >= chars.len() {
            break;
        }

        // A unit word is classified by its first letter; anything else is
        // skipped, matching tokens like "2x" being ignored.
        let multiplier = match chars[j].to_ascii_lowercase() {
            'h' => Some(3600),
            'm' => Some(60),
            's' => Some(1),
            _ => None,
        };
        if let Some(multiplier) = multiplier {
            total = total.saturating_add(value.saturating_mul(multiplier));
            while j < chars.len() && chars[j].is_ascii_alphabetic() {
                j += 1;
            }
            i = j;
        }
    }

    total
}

/// Render remaining seconds according to the display format. Fields are
/// zero-padded to a minimum of two digits; hours may grow wider.
///
/// In `mm:ss` the hour component is omitted rather than folded into the
/// minutes (1h05m renders "05:00"); the output always stays two fields
/// wide.
pub fn format_remaining(remaining_seconds: u64, format: DisplayFormat) -> String {
    let h = remaining_seconds / 3600;
    let m = (remaining_seconds % 3600) / 60;
    let s = remaining_seconds % 60;

    match format {
        DisplayFormat::MmSs => format!("{m:02}:{s:02}"),
        DisplayFormat::HhMmSs => format!("{h:02}:{m:02}:{s:02}"),
        DisplayFormat::Auto | DisplayFormat::HideHoursIfZero => {
            if h > 0 {
                format!("{h:02}:{m:02}:{s:02}")
            } else {
                format!("{m:02}:{s:02}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_empty_and_garbage_to_zero() {
        assert_eq!(parse_duration(""), 0);
        assert_eq!(parse_duration("   "), 0);
        assert_eq!(parse_duration("abc"), 0);
        assert_eq!(parse_duration("::"), 0);
        assert_eq!(parse_duration("1:234"), 0);
    }

    #[test]
    fn parses_bare_integer_as_seconds() {
        assert_eq!(parse_duration("15"), 15);
        assert_eq!(parse_duration("90"), 90);
        assert_eq!(parse_duration(" 45 "), 45);
    }

    #[test]
    fn parses_clock_formats() {
        assert_eq!(parse_duration("01:02"), 3720);
        assert_eq!(parse_duration("00:01:02"), 62);
        assert_eq!(parse_duration("1:02:03"), 3723);
        assert_eq!(parse_duration("123:4"), 123 * 3600 + 4 * 60);
    }

    #[test]
    fn rejects_out_of_range_clock_fields_entirely() {
        assert_eq!(parse_duration("61:00"), 0);
        assert_eq!(parse_duration("1:60"), 0);
        assert_eq!(parse_duration("1:02:60"), 0);
    }

    #[test]
    fn parses_free_units_in_any_order() {
        assert_eq!(parse_duration("2h 3m 4s"), 7384);
        assert_eq!(parse_duration("4s 2h 3m"), 7384);
        assert_eq!(parse_duration("10m"), 600);
        assert_eq!(parse_duration("45s"), 45);
        assert_eq!(parse_duration("2H 30M"), 2 * 3600 + 30 * 60);
        assert_eq!(parse_duration("1 hour 30 minutes"), 5400);
        assert_eq!(parse_duration("5 min"), 300);
    }

    #[test]
    fn ignores_tokens_without_a_known_unit() {
        assert_eq!(parse_duration("2x 3m"), 180);
        assert_eq!(parse_duration("soon"), 0);
        // trailing digits with no unit contribute nothing
        assert_eq!(parse_duration("1h30"), 3600);
    }

    #[test]
    fn formats_hh_mm_ss() {
        assert_eq!(format_remaining(3665, DisplayFormat::HhMmSs), "01:01:05");
        assert_eq!(format_remaining(0, DisplayFormat::HhMmSs), "00:00:00");
    }

    #[test]
    fn formats_mm_ss_dropping_hours() {
        assert_eq!(format_remaining(65, DisplayFormat::MmSs), "01:05");
        // observed behavior: the hour magnitude is lost, not folded
        assert_eq!(format_remaining(3665, DisplayFormat::MmSs), "01:05");
        assert_eq!(format_remaining(3900, DisplayFormat::MmSs), "05:00");
    }

    #[test]
    fn auto_hides_hours_only_when_zero() {
        assert_eq!(format_remaining(59, DisplayFormat::Auto), "00:59");
        assert_eq!(format_remaining(3600, DisplayFormat::Auto), "01:00:00");
        assert_eq!(
            format_remaining(3600, DisplayFormat::HideHoursIfZero),
            "01:00:00"
        );
        assert_eq!(format_remaining(59, DisplayFormat::HideHoursIfZero), "00:59");
    }

    #[test]
    fn hours_are_not_truncated() {
        assert_eq!(
            format_remaining(100 * 3600 + 62, DisplayFormat::HhMmSs),
            "100:01:02"
        );
    }

    #[test]
    fn display_format_uses_the_settings_strings() {
        let parsed: DisplayFormat = serde_json::from_str("\"hide-hours-if-zero\"").unwrap();
        assert_eq!(parsed, DisplayFormat::HideHoursIfZero);
        let parsed: DisplayFormat = serde_json::from_str("\"mm:ss\"").unwrap();
        assert_eq!(parsed, DisplayFormat::MmSs);
        assert_eq!(
            serde_json::to_string(&DisplayFormat::Auto).unwrap(),
            "\"auto\""
        );
    }
}
