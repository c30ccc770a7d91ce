//! Jet2 day format, `DDMMMYY` (e.g. `25MAY25`)

use chrono::{Datelike, NaiveDate};

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// `YYYY-MM-DD` → `DDMMMYY`
pub fn to_jet2(iso: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(iso.trim(), "%Y-%m-%d").ok()?;
    Some(format_jet2(date))
}

pub fn format_jet2(date: NaiveDate) -> String {
    format!(
        "{:02}{}{:02}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year().rem_euclid(100)
    )
}

/// `DDMMMYY` → `YYYY-MM-DD`; two-digit years are in the 2000s
pub fn from_jet2(jet2: &str) -> Option<String> {
    parse_jet2(jet2).map(|d| d.format("%Y-%m-%d").to_string())
}

pub fn parse_jet2(jet2: &str) -> Option<NaiveDate> {
    let jet2 = jet2.trim();
    if jet2.len() != 7 || !jet2.is_ascii() {
        return None;
    }

    let day: u32 = jet2[..2].parse().ok()?;
    let month = MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(&jet2[2..5]))? as u32
        + 1;
    let year: i32 = jet2[5..].parse().ok()?;

    NaiveDate::from_ymd_opt(2000 + year, month, day)
}
