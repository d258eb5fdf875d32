//! Opportunity and run status enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::format_display;

/// Outreach status of an opportunity.
///
/// Only `New` has meaning to the discovery pipeline. Everything else is set
/// by the operator, so unknown labels are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OpportunityStatus {
    /// Freshly discovered, not yet triaged.
    New,
    /// The site owner has been contacted.
    Contacted,
    /// The mention has been turned into a link.
    Linked,
    /// Not worth pursuing.
    Rejected,
    /// Any other operator-defined label.
    Other(String),
}

impl Default for OpportunityStatus {
    fn default() -> Self {
        Self::New
    }
}

impl fmt::Display for OpportunityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "New"),
            Self::Contacted => write!(f, "Contacted"),
            Self::Linked => write!(f, "Linked"),
            Self::Rejected => write!(f, "Rejected"),
            Self::Other(label) => write!(f, "{label}"),
        }
    }
}

impl FromStr for OpportunityStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "New" => Self::New,
            "Contacted" => Self::Contacted,
            "Linked" => Self::Linked,
            "Rejected" => Self::Rejected,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<String> for OpportunityStatus {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl From<OpportunityStatus> for String {
    fn from(value: OpportunityStatus) -> Self {
        value.to_string()
    }
}

impl OpportunityStatus {
    /// Returns true for the status every new finding starts with.
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New)
    }
}

/// Operator-facing status of a discovery run.
///
/// The rendered text is what lands in the status location of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// The run has started.
    Running,
    /// The run is working through a query.
    Searching {
        /// Query text.
        query: String,
    },
    /// The run finished.
    Complete {
        /// Completion time.
        finished_at: DateTime<Utc>,
    },
    /// The run aborted.
    Error {
        /// Error message.
        message: String,
    },
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "Running..."),
            Self::Searching { query } => write!(f, "Digging deeper for query: \"{query}\""),
            Self::Complete { finished_at } => {
                write!(f, "Complete. Last run: {}", format_display(finished_at))
            }
            Self::Error { message } => write!(f, "Error! Check logs. Message: {message}"),
        }
    }
}
