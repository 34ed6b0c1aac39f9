pub mod at;
pub mod config;
pub mod inspect;
pub mod play;

use subcue_core::timefmt::format_timestamp;
use subcue_core::Entry;

/// Body on one line, entry lines joined with ` / `.
pub fn one_line(body: &str) -> String {
    body.lines().collect::<Vec<_>>().join(" / ")
}

/// `  12  00:00:01,000 --> 00:00:02,500  text`
pub fn entry_line(entry: &Entry) -> String {
    format!(
        "{:>4}  {} --> {}  {}",
        entry.id,
        format_timestamp(entry.begin_ms),
        format_timestamp(entry.end_ms),
        one_line(&entry.body)
    )
}
