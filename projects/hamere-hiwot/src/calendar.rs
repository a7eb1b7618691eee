//! Gregorian to Ethiopian calendar conversion for display.
//!
//! Conversion goes through Julian day numbers. The Ethiopian year has twelve
//! 30-day months followed by Pagume (5 days, 6 in the year before a
//! Gregorian leap year).

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::i18n::Language;

/// JDN offset of the Amete Mihret era.
const AMETE_MIHRET_EPOCH: i64 = 1_723_856;
/// `NaiveDate::num_days_from_ce` of 0001-01-01 is 1, whose JDN is 1_721_426.
const CE_TO_JDN: i64 = 1_721_425;

const MONTHS_EN: [&str; 13] = [
    "Meskerem", "Tikimt", "Hidar", "Tahsas", "Tir", "Yekatit", "Megabit",
    "Miazia", "Ginbot", "Sene", "Hamle", "Nehase", "Pagume",
];

const MONTHS_AM: [&str; 13] = [
    "መስከረም", "ጥቅምት", "ኅዳር", "ታኅሣሥ", "ጥር", "የካቲት", "መጋቢት",
    "ሚያዝያ", "ግንቦት", "ሰኔ", "ሐምሌ", "ነሐሴ", "ጳጉሜን",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EthiopianDate {
    pub year: i64,
    pub month: u8,
    pub day: u8,
}

pub fn to_ethiopian(date: NaiveDate) -> EthiopianDate {
    let jdn = date.num_days_from_ce() as i64 + CE_TO_JDN;
    let since_epoch = jdn - AMETE_MIHRET_EPOCH;
    let cycle = since_epoch.div_euclid(1461);
    let r = since_epoch.rem_euclid(1461);
    let n = r % 365 + 365 * (r / 1460);

    EthiopianDate {
        year: 4 * cycle + r / 365 - r / 1460,
        month: (n / 30 + 1) as u8,
        day: (n % 30 + 1) as u8,
    }
}

pub fn format_ethiopian(date: NaiveDate, lang: Language) -> String {
    let et = to_ethiopian(date);
    let idx = (et.month - 1) as usize;
    match lang {
        Language::En => format!("{} {}, {}", MONTHS_EN[idx], et.day, et.year),
        Language::Am => format!("{} {} ቀን {} ዓ.ም.", MONTHS_AM[idx], et.day, et.year),
    }
}

/// Formats an ISO date (or RFC 3339 timestamp) string; anything unparseable
/// is handed back unchanged.
pub fn format_ethiopian_str(input: &str, lang: Language) -> String {
    parse_date(input)
        .map(|d| format_ethiopian(d, lang))
        .unwrap_or_else(|| input.to_string())
}

pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let s = input.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
        chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.date_naive())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_ethiopian_new_year() {
        assert_eq!(to_ethiopian(d(2024, 9, 11)), EthiopianDate { year: 2017, month: 1, day: 1 });
        assert_eq!(to_ethiopian(d(2023, 9, 12)), EthiopianDate { year: 2016, month: 1, day: 1 });
    }

    #[test]
    fn test_leap_pagume_sixth() {
        // 2023-09-11 is the sixth day of Pagume 2015.
        assert_eq!(to_ethiopian(d(2023, 9, 11)), EthiopianDate { year: 2015, month: 13, day: 6 });
    }

    #[test]
    fn test_mid_year_date() {
        // Ginbot 11, 2016
        assert_eq!(to_ethiopian(d(2024, 5, 19)), EthiopianDate { year: 2016, month: 9, day: 11 });
    }

    #[test]
    fn test_format_in_both_languages() {
        assert_eq!(format_ethiopian(d(2024, 9, 11), Language::En), "Meskerem 1, 2017");
        assert_eq!(format_ethiopian(d(2024, 9, 11), Language::Am), "መስከረም 1 ቀን 2017 ዓ.ም.");
    }

    #[test]
    fn test_unparseable_input_is_returned_as_is() {
        assert_eq!(format_ethiopian_str("not a date", Language::En), "not a date");
        assert_eq!(format_ethiopian_str("2024-05-19", Language::En), "Ginbot 11, 2016");
        assert_eq!(
            format_ethiopian_str("2024-05-19T10:00:00+00:00", Language::En),
            "Ginbot 11, 2016"
        );
    }
}
