//! Date extraction for invoice headers.

use chrono::NaiveDate;

use super::patterns::DATE_TOKEN;

/// First valid date-shaped token in `text`.
///
/// Accepts `DD/MM/YYYY`, `DD-MM-YYYY`, `DD.MM.YYYY` (two- or four-digit
/// years) and `YYYY-MM-DD`. Tokens that are not real calendar dates are
/// skipped.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    DATE_TOKEN.captures_iter(text).find_map(|caps| {
        let (year, month, day) = if let Some(year) = caps.name("iy") {
            (
                year.as_str().parse().ok()?,
                caps.name("im")?.as_str().parse().ok()?,
                caps.name("id")?.as_str().parse().ok()?,
            )
        } else {
            (
                parse_year(caps.name("y")?.as_str())?,
                caps.name("m")?.as_str().parse().ok()?,
                caps.name("d")?.as_str().parse().ok()?,
            )
        };
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// First valid date in `text` as ISO `YYYY-MM-DD`, or empty.
pub fn find_iso_date(text: &str) -> String {
    find_date(text)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    if s.len() == 2 {
        // Same pivot as strptime's %y: 69-99 is the 1900s.
        Some(if year < 69 { 2000 + year } else { 1900 + year })
    } else {
        Some(year)
    }
}
