//! `HH:MM:SS,mmm` timestamps, as written in SRT files.

use chrono::TimeDelta;

use crate::entry::Millis;
use crate::error::ParseError;

/// Render `ms` as `HH:MM:SS,mmm`. Hours are not wrapped at 24; negative
/// values get a leading `-`.
pub fn format_timestamp(ms: Millis) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let delta = TimeDelta::milliseconds(ms.saturating_abs());
    let hours = delta.num_hours();
    let minutes = delta.num_minutes() % 60;
    let seconds = delta.num_seconds() % 60;
    let millis = delta.num_milliseconds() % 1000;
    format!("{sign}{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Parse `HH:MM:SS,mmm` (`.` is accepted in place of `,`), `MM:SS,mmm`, or
/// a bare millisecond count.
pub fn parse_timestamp(input: &str) -> Result<Millis, ParseError> {
    let text = input.trim();
    let invalid = || ParseError::InvalidTimestamp(input.to_string());

    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        return text.parse().map_err(|_| invalid());
    }

    let (clock, fraction) = match text.split_once([',', '.']) {
        Some((clock, fraction)) => (clock, fraction),
        None => (text, "0"),
    };
    if fraction.is_empty() || fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }
    // "5" after the separator means 500ms.
    let millis: i64 = format!("{fraction:0<3}").parse().map_err(|_| invalid())?;

    let fields: Vec<i64> = clock
        .split(':')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                Err(invalid())
            } else {
                part.parse::<i64>().map_err(|_| invalid())
            }
        })
        .collect::<Result<_, _>>()?;

    let (hours, minutes, seconds) = match fields.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => (0, *m, *s),
        _ => return Err(invalid()),
    };
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }

    let delta = TimeDelta::try_hours(hours)
        .and_then(|d| d.checked_add(&TimeDelta::try_minutes(minutes)?))
        .and_then(|d| d.checked_add(&TimeDelta::try_seconds(seconds)?))
        .and_then(|d| d.checked_add(&TimeDelta::try_milliseconds(millis)?))
        .ok_or_else(invalid)?;
    Ok(delta.num_milliseconds())
}
