//! pt-BR display formatting for dates, money, plain numbers and weights.
//!
//! Output matches what the console shows on screen: `.` groups thousands,
//! `,` separates decimals, dates are `dd/mm/yyyy` and times `HH:MM:SS`.
//! Rounding is half away from zero on the shortest decimal form of the
//! value, so `2.675` becomes `2,68` and `1.005` becomes `1,01`. Negative
//! values keep their sign even when they round to zero (`-0,00`).

use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use rust_decimal::{Decimal, RoundingStrategy};

/// Currency symbol for Brazilian reais.
pub const CURRENCY_SYMBOL: &str = "R$";

/// What [`format_currency`] shows for a missing amount.
pub const ZERO_CURRENCY: &str = "R$ 0,00";

/// What [`format_weight`] shows for a missing weight.
pub const ZERO_WEIGHT: &str = "0 kg";

/// Unit suffix for weights.
pub const WEIGHT_UNIT: &str = "kg";

const THOUSANDS_SEPARATOR: char = '.';
const DECIMAL_SEPARATOR: char = ',';
const MAX_FRACTION_DIGITS: u32 = 20;
const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Format an amount as reais, e.g. `R$ 1.234,56` or `-R$ 7,50`.
pub fn format_currency(value: Option<f64>) -> String {
    let Some(value) = value else {
        return ZERO_CURRENCY.to_string();
    };
    let body = localize(value, 2);
    match body.strip_prefix('-') {
        Some(magnitude) => format!("-{CURRENCY_SYMBOL} {magnitude}"),
        None => format!("{CURRENCY_SYMBOL} {body}"),
    }
}

/// Format a number with thousands grouping and exactly `decimals` fraction digits.
pub fn format_number(value: Option<f64>, decimals: u32) -> String {
    match value {
        Some(value) => localize(value, decimals),
        None => "0".to_string(),
    }
}

/// Format a weight in kilograms with two decimals, e.g. `1.500,25 kg`.
pub fn format_weight(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{} {WEIGHT_UNIT}", localize(value, 2)),
        None => ZERO_WEIGHT.to_string(),
    }
}

/// Format a timestamp string as `dd/mm/yyyy`.
///
/// Empty input yields an empty string; input that is not a recognizable
/// date is returned unchanged.
pub fn format_date(input: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        return String::new();
    }
    match parse_wall_clock(input) {
        Some(moment) => moment.format(DATE_FORMAT).to_string(),
        None => input.to_string(),
    }
}

/// Format a timestamp string as `dd/mm/yyyy HH:MM:SS`.
pub fn format_date_time(input: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        return String::new();
    }
    match parse_wall_clock(input) {
        Some(moment) => format_wall_clock(&moment),
        None => input.to_string(),
    }
}

/// Date half of a local wall-clock moment.
pub fn date_of(moment: &NaiveDateTime) -> String {
    moment.format(DATE_FORMAT).to_string()
}

/// Time half of a local wall-clock moment.
pub fn time_of(moment: &NaiveDateTime) -> String {
    moment.format(TIME_FORMAT).to_string()
}

fn format_wall_clock(moment: &NaiveDateTime) -> String {
    format!("{} {}", date_of(moment), time_of(moment))
}

/// Parse the timestamp shapes the backend emits into local wall-clock time.
///
/// Offset-carrying timestamps are converted to the local zone; naive
/// timestamps and bare dates are taken as already local.
pub fn parse_wall_clock(input: &str) -> Option<NaiveDateTime> {
    if let Ok(moment) = DateTime::parse_from_rfc3339(input) {
        return Some(moment.with_timezone(&Local).naive_local());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(moment) = NaiveDateTime::parse_from_str(input, pattern) {
            return Some(moment);
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
}

/// Render any zone-aware moment in local wall-clock time.
pub fn local_wall_clock<Tz: TimeZone>(moment: &DateTime<Tz>) -> NaiveDateTime {
    moment.with_timezone(&Local).naive_local()
}

fn localize(value: f64, decimals: u32) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞" } else { "-∞" }.to_string();
    }

    let decimals = decimals.min(MAX_FRACTION_DIGITS);
    let magnitude = value.abs();
    // `f64` display is the shortest text that reads back as the same value.
    let fixed = match Decimal::from_str(&magnitude.to_string()) {
        Ok(shortest) => shortest
            .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
            .to_string(),
        Err(_) => format!("{magnitude:.prec$}", prec = decimals as usize),
    };
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut fraction = fraction.to_string();
    fraction.truncate(decimals as usize);
    while fraction.len() < decimals as usize {
        fraction.push('0');
    }

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 2);
    if value.is_sign_negative() {
        out.push('-');
    }
    out.push_str(&group_thousands(integer));
    if decimals > 0 {
        out.push(DECIMAL_SEPARATOR);
        out.push_str(&fraction);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(THOUSANDS_SEPARATOR);
        }
        grouped.push(ch);
    }
    grouped
}
