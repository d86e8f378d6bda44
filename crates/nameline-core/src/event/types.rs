//! Event kind catalog covering the known name-history event kinds.
//!
//! Each kind corresponds to one upstream mutation of a name. The string
//! representation uses the `name.<verb>` dotted format carried on the wire.
//! Kinds the catalog does not recognize map to [`EventKind::Other`] so the
//! pipeline stays total: an unknown kind classifies as "Unknown Event" and
//! folds as a no-op instead of aborting the stream.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The event kinds in the nameline catalog, plus the `Other` catch-all.
///
/// String representation follows the `name.<verb>` convention of the
/// upstream event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Initial purchase of the name (owner, price, lease window).
    Purchase,
    /// Ownership handover to a new address.
    Transfer,
    /// Push the lease expiry further out.
    ExtendLease,
    /// Raise the number of undernames the name may hold.
    IncreaseUndernameLimit,
    /// Point a label (apex `@` or an undername) at a content id.
    SetRecord,
    /// Grant a controller address.
    AddController,
    /// Reassign the name to a different managing process.
    Reassign,
    /// Update the ticker symbol.
    SetTicker,
    /// Update the description text.
    SetDescription,
    /// Update the keyword list.
    SetKeywords,
    /// Full-state synchronization emitted by the managing process.
    Sync,
    /// Any kind the catalog does not recognize. The original kind string
    /// is preserved on the payload, not here.
    Other,
}

impl EventKind {
    /// All recognized kinds in catalog order (`Other` excluded).
    pub const KNOWN: [Self; 11] = [
        Self::Purchase,
        Self::Transfer,
        Self::ExtendLease,
        Self::IncreaseUndernameLimit,
        Self::SetRecord,
        Self::AddController,
        Self::Reassign,
        Self::SetTicker,
        Self::SetDescription,
        Self::SetKeywords,
        Self::Sync,
    ];

    /// Return the canonical `name.<verb>` string representation.
    ///
    /// `Other` renders as the placeholder `name.other`; the wire-level kind
    /// string of an unrecognized event lives on its payload.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "name.purchase",
            Self::Transfer => "name.transfer",
            Self::ExtendLease => "name.extend-lease",
            Self::IncreaseUndernameLimit => "name.increase-undername-limit",
            Self::SetRecord => "name.set-record",
            Self::AddController => "name.add-controller",
            Self::Reassign => "name.reassign",
            Self::SetTicker => "name.set-ticker",
            Self::SetDescription => "name.set-description",
            Self::SetKeywords => "name.set-keywords",
            Self::Sync => "name.sync",
            Self::Other => "name.other",
        }
    }

    /// Total parse: any string the catalog does not recognize yields
    /// [`EventKind::Other`]. This is deliberate — the ingestion pipeline
    /// must never reject an event for carrying a new kind.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "name.purchase" => Self::Purchase,
            "name.transfer" => Self::Transfer,
            "name.extend-lease" => Self::ExtendLease,
            "name.increase-undername-limit" => Self::IncreaseUndernameLimit,
            "name.set-record" => Self::SetRecord,
            "name.add-controller" => Self::AddController,
            "name.reassign" => Self::Reassign,
            "name.set-ticker" => Self::SetTicker,
            "name.set-description" => Self::SetDescription,
            "name.set-keywords" => Self::SetKeywords,
            "name.sync" => Self::Sync,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Custom serde: serialize as the `name.<verb>` string.
impl Serialize for EventKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_all_known_kinds() {
        let expected = [
            (EventKind::Purchase, "name.purchase"),
            (EventKind::Transfer, "name.transfer"),
            (EventKind::ExtendLease, "name.extend-lease"),
            (
                EventKind::IncreaseUndernameLimit,
                "name.increase-undername-limit",
            ),
            (EventKind::SetRecord, "name.set-record"),
            (EventKind::AddController, "name.add-controller"),
            (EventKind::Reassign, "name.reassign"),
            (EventKind::SetTicker, "name.set-ticker"),
            (EventKind::SetDescription, "name.set-description"),
            (EventKind::SetKeywords, "name.set-keywords"),
            (EventKind::Sync, "name.sync"),
        ];
        for (kind, s) in expected {
            assert_eq!(kind.to_string(), s);
        }
    }

    #[test]
    fn parse_roundtrips_known_kinds() {
        for kind in EventKind::KNOWN {
            assert_eq!(EventKind::parse(kind.as_str()), kind);
        }
    }

    #[test]
    fn parse_is_total() {
        assert_eq!(EventKind::parse("name.burn"), EventKind::Other);
        assert_eq!(EventKind::parse(""), EventKind::Other);
        assert_eq!(EventKind::parse("item.create"), EventKind::Other);
    }

    #[test]
    fn serde_uses_dotted_strings() {
        let json = serde_json::to_string(&EventKind::SetRecord).unwrap();
        assert_eq!(json, "\"name.set-record\"");
        let back: EventKind = serde_json::from_str("\"name.sync\"").unwrap();
        assert_eq!(back, EventKind::Sync);
        let unknown: EventKind = serde_json::from_str("\"name.burn\"").unwrap();
        assert_eq!(unknown, EventKind::Other);
    }
}
