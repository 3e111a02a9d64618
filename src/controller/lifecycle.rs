//! Controller lifecycle phases

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a controller is in its install/activate lifecycle
///
/// ```text
/// Parsed -> Installing -> Installed -> Activating -> Activated
///               |                          |
///               +-> Redundant              +-> Installed (retry)
/// ```
///
/// Any phase may move to `Redundant` when a newer controller replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Created, nothing fetched yet
    Parsed,
    /// Fetching the manifest
    Installing,
    /// Bucket populated, waiting to take over
    Installed,
    /// Purging stale buckets
    Activating,
    /// Current controller, answering fetches
    Activated,
    /// Failed install or replaced by a newer version
    Redundant,
}

impl Phase {
    /// Whether the controller may answer fetches
    pub fn is_serving(&self) -> bool {
        matches!(self, Self::Activated)
    }

    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Self::Parsed, Self::Installing)
                | (Self::Installing, Self::Installed)
                | (Self::Installing, Self::Redundant)
                | (Self::Installed, Self::Activating)
                | (Self::Activating, Self::Activated)
                | (Self::Activating, Self::Installed)
                | (_, Self::Redundant)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        f.write_str(name)
    }
}
