//! # Triage State Machine
//!
//! ```text
//! ┌─────┐    ┌─────────┐    ┌───────────────┐    ┌─────────┐    ┌──────────┐
//! │ NEW │───→│ TRIAGED │───→│ PATCH_PLANNED │───→│ PATCHED │───→│ VERIFIED │
//! └─────┘    └─────────┘    └───────────────┘    └─────────┘    └──────────┘
//! ```
//!
//! Exactly one forward successor per state; `VERIFIED` is terminal. There
//! are no skips, no backward moves and no self-transitions.

use crate::error::TriageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a triaged drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriageState {
    New,
    Triaged,
    PatchPlanned,
    Patched,
    Verified,
}

impl TriageState {
    /// Every state, in lifecycle order.
    pub const ALL: [TriageState; 5] = [
        TriageState::New,
        TriageState::Triaged,
        TriageState::PatchPlanned,
        TriageState::Patched,
        TriageState::Verified,
    ];

    /// The single state this one may move to.
    #[must_use]
    pub const fn next(self) -> Option<TriageState> {
        match self {
            TriageState::New => Some(TriageState::Triaged),
            TriageState::Triaged => Some(TriageState::PatchPlanned),
            TriageState::PatchPlanned => Some(TriageState::Patched),
            TriageState::Patched => Some(TriageState::Verified),
            TriageState::Verified => None,
        }
    }

    #[must_use]
    pub fn can_transition_to(self, to: TriageState) -> bool {
        self.next() == Some(to)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, TriageState::Verified)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TriageState::New => "NEW",
            TriageState::Triaged => "TRIAGED",
            TriageState::PatchPlanned => "PATCH_PLANNED",
            TriageState::Patched => "PATCHED",
            TriageState::Verified => "VERIFIED",
        }
    }
}

impl fmt::Display for TriageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriageState {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TriageState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| TriageError::UnknownState(s.to_string()))
    }
}
