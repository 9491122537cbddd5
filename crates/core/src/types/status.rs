//! Listing lifecycle states and review decisions.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a game listing.
///
/// A listing is born `Pending` and moves exactly once, to either `Approved`
/// or `Rejected`. Both outcomes are terminal; a resubmission is a new
/// listing. Transitions happen only through [`ListingStatus::decide`], so an
/// illegal move is a [`TransitionError`], never a silent overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "listing_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    /// Submitted, awaiting admin review. Invisible to the public catalog.
    Pending,
    /// Reviewed and published to the catalog.
    Approved,
    /// Reviewed and declined; carries a rejection reason.
    Rejected,
}

impl ListingStatus {
    /// Whether this state accepts no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Apply an admin review decision.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] unless the current state is `Pending`.
    pub const fn decide(self, decision: ReviewDecision) -> Result<Self, TransitionError> {
        match self {
            Self::Pending => Ok(match decision {
                ReviewDecision::Approve => Self::Approved,
                ReviewDecision::Reject => Self::Rejected,
            }),
            from => Err(TransitionError { from }),
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid listing status: {s}")),
        }
    }
}

/// The outcome an admin selects when reviewing a pending listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// Attempted review of a listing that is no longer pending.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("listing is already {from}; only pending listings can be reviewed")]
pub struct TransitionError {
    /// The (terminal) state the listing was in.
    pub from: ListingStatus,
}

/// How a game build is delivered to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "download_kind", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum DownloadKind {
    /// A build uploaded to the asset store; downloads go through a signed URL.
    File,
    /// An external link (itch.io page, Drive folder, ...); downloads redirect.
    Link,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_approves() {
        let next = ListingStatus::Pending
            .decide(ReviewDecision::Approve)
            .unwrap();
        assert_eq!(next, ListingStatus::Approved);
    }

    #[test]
    fn test_pending_rejects() {
        let next = ListingStatus::Pending
            .decide(ReviewDecision::Reject)
            .unwrap();
        assert_eq!(next, ListingStatus::Rejected);
    }

    #[test]
    fn test_terminal_states_refuse_review() {
        for from in [ListingStatus::Approved, ListingStatus::Rejected] {
            for decision in [ReviewDecision::Approve, ReviewDecision::Reject] {
                let err = from.decide(decision).unwrap_err();
                assert_eq!(err.from, from);
            }
        }
    }

    #[test]
    fn test_terminality() {
        assert!(!ListingStatus::Pending.is_terminal());
        assert!(ListingStatus::Approved.is_terminal());
        assert!(ListingStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_serde_wire_format() {
        let json = serde_json::to_string(&ListingStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        let parsed: ListingStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(parsed, ListingStatus::Rejected);
    }
}
