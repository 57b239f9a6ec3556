use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Reason a check could not be answered from a complete grant snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessErrorKind {
    /// Grants could not be fetched; the caller may retry.
    StoreUnavailable,
    /// The user id did not resolve; every check denies by default.
    UnknownActor,
    /// Storage rows lacking category or action were skipped.
    MalformedGrant,
}

impl AccessErrorKind {
    /// Returns a stable machine-readable value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StoreUnavailable => "store_unavailable",
            Self::UnknownActor => "unknown_actor",
            Self::MalformedGrant => "malformed_grant",
        }
    }
}

impl Display for AccessErrorKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Outcome of one permission check as seen by callers.
///
/// `loading` and `error` are distinct from denial: a caller must never treat
/// either as granted, and should not present them as a refusal either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether access is granted.
    pub granted: bool,
    /// Whether grants for the actor are still being fetched.
    pub loading: bool,
    /// Store-level failure, when the grants could not be fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AccessErrorKind>,
}

impl Verdict {
    /// Access is granted.
    #[must_use]
    pub const fn granted() -> Self {
        Self {
            granted: true,
            loading: false,
            error: None,
        }
    }

    /// Access is denied.
    #[must_use]
    pub const fn denied() -> Self {
        Self {
            granted: false,
            loading: false,
            error: None,
        }
    }

    /// Grants are still in flight.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            granted: false,
            loading: true,
            error: None,
        }
    }

    /// Grants could not be fetched.
    #[must_use]
    pub const fn errored(kind: AccessErrorKind) -> Self {
        Self {
            granted: false,
            loading: false,
            error: Some(kind),
        }
    }

    /// Creates a settled verdict from a boolean decision.
    #[must_use]
    pub const fn from_decision(granted: bool) -> Self {
        if granted {
            Self::granted()
        } else {
            Self::denied()
        }
    }

    /// Returns the state-machine view of this verdict.
    #[must_use]
    pub fn state(&self) -> VerdictState {
        if self.loading {
            VerdictState::Pending
        } else if let Some(kind) = self.error {
            VerdictState::Errored(kind)
        } else if self.granted {
            VerdictState::Granted
        } else {
            VerdictState::Denied
        }
    }
}

/// Per-evaluation state: `Pending` moves to exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum VerdictState {
    /// Grants are in flight.
    Pending,
    /// Access is granted.
    Granted,
    /// Access is denied.
    Denied,
    /// Grants could not be fetched.
    Errored(AccessErrorKind),
}

#[cfg(test)]
mod tests {
    use super::{AccessErrorKind, Verdict, VerdictState};

    #[test]
    fn loading_verdict_is_pending_not_denied() {
        let verdict = Verdict::loading();
        assert!(!verdict.granted);
        assert_eq!(verdict.state(), VerdictState::Pending);
    }

    #[test]
    fn errored_verdict_keeps_its_kind() {
        let verdict = Verdict::errored(AccessErrorKind::StoreUnavailable);
        assert_eq!(
            verdict.state(),
            VerdictState::Errored(AccessErrorKind::StoreUnavailable)
        );
    }

    #[test]
    fn settled_verdicts_map_to_terminal_states() {
        assert_eq!(Verdict::from_decision(true).state(), VerdictState::Granted);
        assert_eq!(Verdict::from_decision(false).state(), VerdictState::Denied);
    }
}
