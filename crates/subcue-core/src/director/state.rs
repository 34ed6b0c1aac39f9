use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a [`Director`](super::Director).
///
/// ```text
/// NotStarted -> Running <-> Paused
///                  |   \      |
///                  |    Sleeping
///                  v
///               Finished --(backward seek)--> Running
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectorState {
    #[default]
    NotStarted,
    Running,
    Paused,
    Sleeping,
    Finished,
}

impl DirectorState {
    /// Started and not yet finished.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused | Self::Sleeping)
    }
}

impl fmt::Display for DirectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Sleeping => "sleeping",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}
