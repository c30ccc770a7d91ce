use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A wall-clock time of day, always rendered as zero-padded `HH:MM`.
///
/// Construction is range-checked, so a `ClockTime` never carries an hour of 24
/// or more or a minute of 60 or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

/// Error returned when a string is not a valid `HH:MM` time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid clock time {0:?}, expected HH:MM with HH < 24 and MM < 60")]
pub struct InvalidClockTime(pub String);

impl ClockTime {
    /// Build a time from an hour and minute, rejecting out-of-range values
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self {
                hour: hour as u8,
                minute: minute as u8,
            })
        } else {
            None
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = InvalidClockTime;

    /// Accepts `H:MM` or `HH:MM`; the minute must be exactly two digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidClockTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;

        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(h) || h.len() > 2 || !digits(m) || m.len() != 2 {
            return Err(invalid());
        }

        let hour: u32 = h.parse().map_err(|_| invalid())?;
        let minute: u32 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_zero_padded() {
        assert_eq!(ClockTime::new(9, 5).unwrap().to_string(), "09:05");
        assert_eq!(ClockTime::new(23, 59).unwrap().to_string(), "23:59");
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(ClockTime::new(24, 0).is_none());
        assert!(ClockTime::new(0, 60).is_none());
    }

    #[test]
    fn test_parse_accepts_single_digit_hour() {
        let t: ClockTime = "7:30".parse().unwrap();
        assert_eq!(t.to_string(), "07:30");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<ClockTime>().is_err());
        assert!("12".parse::<ClockTime>().is_err());
        assert!("12:5".parse::<ClockTime>().is_err());
        assert!("24:00".parse::<ClockTime>().is_err());
        assert!("ab:cd".parse::<ClockTime>().is_err());
        assert!("123:45".parse::<ClockTime>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let t = ClockTime::new(20, 26).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"20:26\"");

        let back: ClockTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<ClockTime>("\"25:00\"").is_err());
    }
}
