// ── Status-string parsing helpers ──
//
// The controller encodes units only inside the human-readable status
// string ("57.3 F", "12 kW Hours"), and timestamps in a millisecond
// epoch wrapper ("/Date(1594588950824)/").

use chrono::{DateTime, Utc};

/// Sentinel the controller emits for "never changed" (0001-01-01 UTC
/// as milliseconds).
const NEVER_CHANGED_MS: &str = "-62135596800000";

/// A measurement unit recognized in device status strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Amperes,
    Celsius,
    Fahrenheit,
    KilowattHours,
    Kilowatts,
    Lux,
    Percentage,
    Volts,
    Watts,
}

impl Unit {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Amperes => "A",
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
            Self::KilowattHours => "kWh",
            Self::Kilowatts => "kW",
            Self::Lux => "lx",
            Self::Percentage => "%",
            Self::Volts => "V",
            Self::Watts => "W",
        }
    }
}

// Token table in match order. Longer tokens ("kW Hours") sit before
// their prefixes ("kW"), and word tokens before single letters, so the
// first substring hit is the most specific one.
const UNIT_TOKENS: &[(&str, Unit)] = &[
    ("Amperes", Unit::Amperes),
    ("A", Unit::Amperes),
    ("C", Unit::Celsius),
    ("F", Unit::Fahrenheit),
    ("kW Hours", Unit::KilowattHours),
    ("kW", Unit::Kilowatts),
    ("Lux", Unit::Lux),
    ("%", Unit::Percentage),
    ("Volts", Unit::Volts),
    ("V", Unit::Volts),
    ("Watts", Unit::Watts),
    ("W", Unit::Watts),
];

/// Extract a measurement unit from a status string, if one is present.
pub fn unit_from_status(status: &str) -> Option<Unit> {
    UNIT_TOKENS
        .iter()
        .find(|(token, _)| status.contains(token))
        .map(|&(_, unit)| unit)
}

/// Parse the controller's `/Date(ms)/` timestamp wrapper.
///
/// Returns `None` for the never-changed sentinel, malformed input, or
/// timestamps outside chrono's representable range. Trailing timezone
/// offsets (`/Date(1594588950824-0500)/`) are ignored; the payload is
/// already UTC milliseconds.
pub fn parse_last_change(raw: &str) -> Option<DateTime<Utc>> {
    let inner = raw.strip_prefix("/Date(")?.strip_suffix(")/")?;
    if inner == NEVER_CHANGED_MS {
        return None;
    }
    // Keep the leading epoch value, dropping any offset suffix.
    let head = inner.split(['-', '+']).next()?;
    let digits: String = head.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let millis: i64 = digits.parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn units_match_most_specific_token_first() {
        assert_eq!(unit_from_status("57.3 F"), Some(Unit::Fahrenheit));
        assert_eq!(unit_from_status("12 kW Hours"), Some(Unit::KilowattHours));
        assert_eq!(unit_from_status("1.2 kW"), Some(Unit::Kilowatts));
        assert_eq!(unit_from_status("80 %"), Some(Unit::Percentage));
        assert_eq!(unit_from_status("230 Volts"), Some(Unit::Volts));
        assert_eq!(unit_from_status("On"), None);
    }

    #[test]
    fn last_change_parses_epoch_millis() {
        let parsed = parse_last_change("/Date(1594588950824)/").unwrap();
        let expected = Utc.timestamp_millis_opt(1_594_588_950_824).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn last_change_ignores_offset_suffix() {
        let parsed = parse_last_change("/Date(1594588950824-0500)/").unwrap();
        let expected = Utc.timestamp_millis_opt(1_594_588_950_824).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn never_changed_sentinel_is_none() {
        assert_eq!(parse_last_change("/Date(-62135596800000)/"), None);
    }

    #[test]
    fn malformed_timestamps_are_none() {
        assert_eq!(parse_last_change("2020-07-12T21:22:30Z"), None);
        assert_eq!(parse_last_change("/Date()/"), None);
        assert_eq!(parse_last_change("/Date(abc)/"), None);
    }
}
