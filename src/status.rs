use serde::Serialize;
use std::fmt;

/// Last known lifecycle outcome of a supervised broker
///
/// This is not a live health check: it reflects only the most recent
/// start or stop performed by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "cause", rename_all = "snake_case")]
pub enum BrokerStatus {
    /// No broker instance is held
    #[default]
    Stopped,
    /// The last start succeeded and no stop has happened since
    Running,
    /// The last start failed with the given cause
    Failed(String),
}

impl BrokerStatus {
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Failure cause of the last start, if it failed
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(cause) => Some(cause),
            _ => None,
        }
    }
}

impl fmt::Display for BrokerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Running => write!(f, "running"),
            Self::Failed(cause) => write!(f, "failed: {cause}"),
        }
    }
}
