//! Event classification: kind → human-readable action label + legend key.
//!
//! [`classify`] is a pure, total function over the closed [`EventKind`]
//! catalog. Every kind maps to exactly one (action, category) pair; the
//! `Other` arm is the required default for kinds added upstream before this
//! catalog learns about them.

use serde::Serialize;
use std::fmt;

use crate::event::{EventKind, RawEvent};

/// Category tag ("legend key") grouping related event kinds for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Purchase, transfer, reassignment.
    Ownership,
    /// Lease window and undername allowance.
    Lease,
    /// Record / content-hash changes.
    Records,
    /// Controller grants.
    Controllers,
    /// Ticker, description, keywords.
    Metadata,
    /// Full-state syncs and anything unrecognized.
    MultipleChanges,
}

impl Category {
    /// The stable string tag used by the presentation legend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ownership => "ownership",
            Self::Lease => "lease",
            Self::Records => "records",
            Self::Controllers => "controllers",
            Self::Metadata => "metadata",
            Self::MultipleChanges => "multiple-changes",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (action label, category) pair a kind classifies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Human-readable action label.
    pub action: &'static str,
    /// Legend key.
    pub category: Category,
}

/// Classify an event kind. Total and side-effect free; never panics.
#[must_use]
pub const fn classify(kind: EventKind) -> Classification {
    let (action, category) = match kind {
        EventKind::Purchase => ("Purchased", Category::Ownership),
        EventKind::Transfer => ("Ownership Transferred", Category::Ownership),
        EventKind::ExtendLease => ("Lease Extended", Category::Lease),
        EventKind::IncreaseUndernameLimit => ("Undername Limit Increased", Category::Lease),
        EventKind::SetRecord => ("Record Updated", Category::Records),
        EventKind::AddController => ("Controller Added", Category::Controllers),
        EventKind::Reassign => ("Name Reassigned", Category::Ownership),
        EventKind::SetTicker => ("Ticker Updated", Category::Metadata),
        EventKind::SetDescription => ("Description Updated", Category::Metadata),
        EventKind::SetKeywords => ("Keywords Updated", Category::Metadata),
        EventKind::Sync => ("State Synced", Category::MultipleChanges),
        EventKind::Other => ("Unknown Event", Category::MultipleChanges),
    };
    Classification { action, category }
}

/// Derived view of a [`RawEvent`]: classification plus the envelope fields
/// the presentation layer reads, with the raw event retained.
///
/// One `ClassifiedEvent` per `RawEvent`, order-aligned with arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    /// Human-readable action label.
    pub action: &'static str,
    /// Legend key.
    pub category: Category,
    /// Address that initiated the event.
    pub actor: String,
    /// Event timestamp, seconds since epoch.
    pub ts: i64,
    /// Identity of the producing transaction; dedup key.
    pub tx_id: String,
    /// The underlying raw event.
    pub event: RawEvent,
}

impl ClassifiedEvent {
    /// Classify a raw event, taking ownership of it.
    #[must_use]
    pub fn from_event(event: RawEvent) -> Self {
        let Classification { action, category } = classify(event.kind());
        Self {
            action,
            category,
            actor: event.initiator.clone(),
            ts: event.ts,
            tx_id: event.tx_id.clone(),
            event,
        }
    }
}
