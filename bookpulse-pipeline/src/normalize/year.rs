//! Publication year parsing
//!
//! Sources send years as bare integers, ISO dates ("2022-05-01"), or free
//! text ("c. 1999"). Anything unparseable becomes `Year::Unknown` rather
//! than failing the record.

use bookpulse_common::types::{Year, MIN_PLAUSIBLE_YEAR};
use chrono::Datelike;

/// Upper plausibility bound: next calendar year covers pre-announced titles
pub fn max_plausible_year() -> i32 {
    chrono::Utc::now().year() + 1
}

/// Parse a year from varied source formats
pub fn parse_year(text: &str) -> Year {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Year::Unknown;
    }

    if let Ok(year) = trimmed.parse::<i32>() {
        return bounded(year);
    }

    // Scan for the first plausible 4-digit run ("2022-05-01", "c. 1999")
    let mut run = String::new();
    for c in trimmed.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_digit() {
            run.push(c);
        } else {
            if run.len() == 4 {
                if let Ok(year) = run.parse::<i32>() {
                    if let Year::Known(y) = bounded(year) {
                        return Year::Known(y);
                    }
                }
            }
            run.clear();
        }
    }

    Year::Unknown
}

fn bounded(year: i32) -> Year {
    if (MIN_PLAUSIBLE_YEAR..=max_plausible_year()).contains(&year) {
        Year::Known(year)
    } else {
        Year::Unknown
    }
}
