use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use subcue_core::timefmt::{format_timestamp, parse_timestamp};
use subcue_core::{
    srt, Config, Director, DirectorState, Event, EventLog, Millis, PlayerConfig, Subtitles,
    SystemClock,
};
use tracing::{debug, info};

use super::one_line;

#[derive(Args)]
pub struct PlayArgs {
    /// Path to an .srt file
    file: PathBuf,
    /// Start instant (HH:MM:SS,mmm or milliseconds)
    #[arg(long, default_value = "0")]
    start: String,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
    /// Also print ticks and status changes
    #[arg(long)]
    verbose: bool,
    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn run(args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;
    let subtitles = srt::parse_file(&args.file)?;
    let start_ms = parse_timestamp(&args.start)?;
    let printer = Printer {
        json: args.json,
        verbose: args.verbose,
        player: config.player.clone(),
        instant_ms: start_ms,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(play(subtitles, start_ms, config, printer))
}

fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()?,
    };
    Ok(Config::load_from(&path)?)
}

async fn play(
    subtitles: Subtitles,
    start_ms: Millis,
    config: Config,
    mut printer: Printer,
) -> Result<(), Box<dyn std::error::Error>> {
    let log = EventLog::new();
    let mut director = Director::new(SystemClock::new(), log.clone(), config.director);
    director.start(subtitles, start_ms)?;
    printer.flush(&log)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while director.state() != DirectorState::Finished {
        let Some(deadline) = director.next_deadline() else {
            debug!(state = %director.state(), "no pending deadline, stopping");
            break;
        };
        let wait = deadline.saturating_sub(director.scheduler().now_ms());
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(wait)) => {
                director.poll();
            }
            _ = &mut ctrl_c => {
                info!(at = %format_timestamp(director.current_instant()), "interrupted");
                director.stop();
            }
        }
        printer.flush(&log)?;
    }
    Ok(())
}

struct Printer {
    json: bool,
    verbose: bool,
    player: PlayerConfig,
    /// Last instant reported by a tick; used to stamp text output.
    instant_ms: Millis,
}

impl Printer {
    fn flush(&mut self, log: &EventLog) -> Result<(), serde_json::Error> {
        for event in log.take() {
            if let Event::Tick { instant_ms } = event {
                self.instant_ms = instant_ms;
            }
            if !self.verbose && !event.is_visible() {
                continue;
            }
            if self.json {
                println!("{}", serde_json::to_string(&event)?);
            } else {
                self.print_text(&event);
            }
        }
        Ok(())
    }

    fn print_text(&self, event: &Event) {
        let at = format_timestamp(self.instant_ms);
        match event {
            Event::Started => println!("[{at}] started"),
            Event::Display { text, overlay } => {
                if self.player.show_overlay && !overlay.is_empty() {
                    println!("[{at}] ^ {}", one_line(overlay));
                }
                println!("[{at}] {}", one_line(text));
            }
            Event::Waiting { delay_ms } => {
                if self.player.clear_on_wait {
                    println!();
                }
                if self.verbose {
                    println!("[{at}] waiting {delay_ms}ms");
                }
            }
            Event::Loss { start_index, count } => {
                println!("[{at}] lost {count} entry at index {start_index}")
            }
            Event::Finished => println!("[{at}] finished"),
            Event::StatusChanged { from, to } => println!("[{at}] {from} -> {to}"),
            Event::Tick { .. } => println!("[{at}] tick"),
        }
    }
}
