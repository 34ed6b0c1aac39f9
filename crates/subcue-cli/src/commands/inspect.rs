use std::path::PathBuf;

use clap::Args;
use subcue_core::timefmt::format_timestamp;
use subcue_core::{srt, EntryStore};

use super::{entry_line, one_line};

#[derive(Args)]
pub struct InspectArgs {
    /// Path to an .srt file
    file: PathBuf,
    /// Print entries as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: InspectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let subtitles = srt::parse_file(&args.file)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(subtitles.entries())?);
        return Ok(());
    }

    for entry in subtitles.entries() {
        println!("{}", entry_line(entry));
        if let Some(overlay) = subtitles.related_overlay(entry.id) {
            println!("{:>4}  ^ {}", "", one_line(&overlay.body));
        }
    }
    let (begin, end) = subtitles.total_span();
    println!(
        "{} entries, {} overlays, {} - {}",
        subtitles.count(),
        subtitles.overlay_count(),
        format_timestamp(begin),
        format_timestamp(end)
    );
    Ok(())
}
