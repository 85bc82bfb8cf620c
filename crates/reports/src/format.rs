#![forbid(unsafe_code)]

use time::OffsetDateTime;
use time::macros::format_description;

/// `1234567` → `"1,234,567"`.
pub fn format_count(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Two decimals and a percent sign, e.g. `"66.67%"`.
pub fn format_percentage(value: f64) -> String {
    format!("{value:.2}%")
}

pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second] UTC"
    ))
    .unwrap_or_else(|_| "0000-00-00 00:00:00 UTC".to_string())
}

/// Second-granular stamp used in report file names.
pub(crate) fn file_stamp(at: OffsetDateTime) -> String {
    at.format(format_description!(
        "[year][month][day]_[hour][minute][second]"
    ))
    .unwrap_or_else(|_| "00000000_000000".to_string())
}

/// Cuts `text` to at most `max_chars` characters, marking the cut with `...`.
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
