//! Western zodiac lookup by birth month and day.

use chrono::{Datelike, NaiveDate};

/// (label, start month, start day, end month, end day)
const SIGNS: [(&str, u32, u32, u32, u32); 12] = [
    ("白羊座", 3, 21, 4, 19),
    ("金牛座", 4, 20, 5, 20),
    ("双子座", 5, 21, 6, 21),
    ("巨蟹座", 6, 22, 7, 22),
    ("狮子座", 7, 23, 8, 22),
    ("处女座", 8, 23, 9, 22),
    ("天秤座", 9, 23, 10, 23),
    ("天蝎座", 10, 24, 11, 22),
    ("射手座", 11, 23, 12, 21),
    ("摩羯座", 12, 22, 1, 19),
    ("水瓶座", 1, 20, 2, 18),
    ("双鱼座", 2, 19, 3, 20),
];

/// All twelve labels, in table order.
pub fn labels() -> impl Iterator<Item = &'static str> {
    SIGNS.iter().map(|(name, ..)| *name)
}

/// Sign for a calendar month and day. The year never matters.
pub fn sign_for(month: u32, day: u32) -> Option<&'static str> {
    SIGNS
        .iter()
        .find(|(_, sm, sd, em, ed)| (month == *sm && day >= *sd) || (month == *em && day <= *ed))
        .map(|(name, ..)| *name)
}

/// Derive the sign from a `YYYY-MM-DD` date string.
///
/// Malformed or impossible dates yield an empty string rather than an error.
pub fn zodiac_for_date(date: &str) -> String {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| sign_for(d.month(), d.day()))
        .unwrap_or_default()
        .to_string()
}
