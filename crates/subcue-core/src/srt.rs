//! SubRip (`.srt`) parsing.
//!
//! Each call builds its own [`Subtitles`]; there is no shared parser
//! state. A block is an id line, a timing line and one or more body lines,
//! separated from the next block by a blank line:
//!
//! ```text
//! 12
//! 00:01:02,000 --> 00:01:04,500
//! First line
//! second line
//! ```
//!
//! A body beginning with `{\an8}` is an overlay: the tag is stripped and
//! the entry is attached to the most recent primary entry instead of being
//! added to the timeline.

use std::path::Path;

use tracing::{debug, warn};

use crate::entry::{Entry, Subtitles};
use crate::error::ParseError;
use crate::timefmt::parse_timestamp;

const OVERLAY_TAG: &str = "{\\an8}";

/// Parse SRT text into a store.
///
/// Malformed blocks are skipped. Fails only when nothing usable remains.
pub fn parse(text: &str) -> Result<Subtitles, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut subtitles = Subtitles::new();
    let mut last_primary: Option<u32> = None;
    let mut block: Vec<&str> = Vec::new();

    for line in text.lines().chain(std::iter::once("")) {
        let line = line.trim_end_matches('\r');
        if !line.trim().is_empty() {
            block.push(line);
            continue;
        }
        if block.is_empty() {
            continue;
        }
        if let Some(entry) = parse_block(&block) {
            if let Some(body) = entry.body.strip_prefix(OVERLAY_TAG) {
                let overlay = Entry {
                    body: body.to_string(),
                    ..entry
                };
                match last_primary {
                    Some(primary_id) => subtitles.attach_overlay(primary_id, overlay),
                    None => warn!(id = overlay.id, "overlay entry before any primary entry, skipped"),
                }
            } else {
                if let Some(previous) = subtitles.entries().last() {
                    if entry.begin_ms < previous.end_ms {
                        warn!(
                            id = entry.id,
                            previous = previous.id,
                            "entry overlaps or precedes the previous one"
                        );
                    }
                }
                last_primary = Some(entry.id);
                subtitles.push(entry);
            }
        }
        block.clear();
    }

    if subtitles.entries().is_empty() {
        return Err(ParseError::Empty);
    }
    debug!(
        entries = subtitles.entries().len(),
        overlays = subtitles.overlay_count(),
        "parsed srt"
    );
    Ok(subtitles)
}

/// Read and parse an SRT file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Subtitles, ParseError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ParseError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}

fn parse_block(lines: &[&str]) -> Option<Entry> {
    if lines.len() < 3 {
        debug!(lines = lines.len(), "short block skipped");
        return None;
    }
    let id = leading_number(lines[0]);
    let Some((timing_at, (begin_ms, end_ms))) = lines
        .iter()
        .enumerate()
        .find_map(|(i, line)| parse_timing(line).map(|span| (i, span)))
    else {
        debug!(id, "block without timing line skipped");
        return None;
    };
    let body = lines[timing_at + 1..].join("\n");
    Some(Entry::new(id, begin_ms, end_ms, body))
}

/// `00:00:01,000 --> 00:00:02,500`, ignoring anything after the end time.
fn parse_timing(line: &str) -> Option<(i64, i64)> {
    let (begin, rest) = line.split_once("-->")?;
    let end = rest.split_whitespace().next()?;
    let begin_ms = parse_timestamp(begin).ok()?;
    let end_ms = parse_timestamp(end).ok()?;
    Some((begin_ms, end_ms))
}

/// First run of ASCII digits in `line`, or 0.
fn leading_number(line: &str) -> u32 {
    line.trim_start_matches(|c: char| !c.is_ascii_digit())
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}
