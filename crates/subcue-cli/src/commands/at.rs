use std::path::PathBuf;

use clap::Args;
use serde_json::json;
use subcue_core::timefmt::{format_timestamp, parse_timestamp};
use subcue_core::{search, srt, EntryStore};

use super::entry_line;

#[derive(Args)]
pub struct AtArgs {
    /// Path to an .srt file
    file: PathBuf,
    /// Instant to look up (HH:MM:SS,mmm or milliseconds)
    instant: String,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: AtArgs) -> Result<(), Box<dyn std::error::Error>> {
    let subtitles = srt::parse_file(&args.file)?;
    let instant = parse_timestamp(&args.instant)?;
    let found = search::locate_index(&subtitles, instant);

    if args.json {
        let entry = found.and_then(|index| subtitles.get(index));
        let overlay = entry.and_then(|e| subtitles.related_overlay(e.id));
        let value = json!({
            "instant_ms": instant,
            "index": found,
            "entry": entry,
            "overlay": overlay.map(|o| o.body.as_str()),
            "previous_index": search::nearest_index(&subtitles, instant),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let at = format_timestamp(instant);
    match found.and_then(|index| subtitles.get(index)) {
        Some(entry) => {
            println!("{}", entry_line(entry));
            if let Some(overlay) = subtitles.related_overlay(entry.id) {
                println!("{:>4}  ^ {}", "", overlay.body);
            }
        }
        None => match search::nearest_index(&subtitles, instant).and_then(|i| subtitles.get(i)) {
            Some(previous) => println!("no entry at {at} (after #{})", previous.id),
            None => println!("no entry at {at}"),
        },
    }
    Ok(())
}
