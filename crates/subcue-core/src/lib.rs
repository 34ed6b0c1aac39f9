//! # subcue Core Library
//!
//! This library drives the timed display of subtitle entries against a
//! playback clock that is either simulated internally or read from an
//! outside source such as a media player's position.
//!
//! ## Architecture
//!
//! - **Entries**: an ordered, indexable store of time-bounded cues plus an
//!   overlay lookup keyed by primary entry id
//! - **Search**: binary search that locates the entry at an instant, or the
//!   nearest one before a gap
//! - **Timer**: a poll-driven single-slot scheduler over an injected clock;
//!   the caller invokes `poll()` once the deadline passes
//! - **Director**: the state machine (start, stop, pause, resume, sleep,
//!   wake, seek) with drift-corrected rescheduling
//!
//! ## Key Components
//!
//! - [`Director`]: Core subtitle state machine
//! - [`Subtitles`]: Vec-backed [`EntryStore`]
//! - [`srt::parse`]: SubRip parser producing a [`Subtitles`]
//! - [`Config`]: TOML configuration
//! - [`EventLog`]: Observer that records [`Event`]s

pub mod config;
pub mod director;
pub mod entry;
pub mod error;
pub mod events;
pub mod search;
pub mod srt;
pub mod timefmt;
pub mod timer;

pub use config::{Config, DirectorConfig, PlayerConfig};
pub use director::{Director, DirectorObserver, DirectorState, ExternalClock, NoopObserver};
pub use entry::{Entry, EntryStore, Millis, Subtitles};
pub use error::{ConfigError, CoreError, DirectorError, ParseError};
pub use events::{Event, EventLog};
pub use timer::{Clock, ManualClock, SystemClock, TimerMode};
