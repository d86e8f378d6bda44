//! Typed payload data structs for each event kind.
//!
//! Each recognized kind has a corresponding data struct defining its JSON
//! payload schema. The discriminant is external to the payload (the `kind`
//! field of the event envelope), so [`EventPayload`] implements `Serialize`
//! manually and is deserialized via [`EventPayload::deserialize_for`] with
//! the known kind string.
//!
//! Fields the upstream source resolves asynchronously are modeled as source
//! enums ([`PriceSource`], [`RecordsSource`]): either an inline value that
//! resolves synchronously, or a reference the delta computer hands to a
//! [`Resolver`](crate::delta::Resolver).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::types::EventKind;

// ---------------------------------------------------------------------------
// Asynchronous field sources
// ---------------------------------------------------------------------------

/// A currency amount: either already a base-unit integer, or a quote id
/// that must be resolved through the lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceSource {
    /// Inline base-unit amount; resolves without any lookup.
    Inline(u64),
    /// Reference to a quote object held by the pricing service.
    Quote {
        /// Quote identifier understood by the resolver.
        quote: String,
    },
}

/// A record list: either an inline label → content-id map, or a manifest
/// id that must be expanded through the lookup service.
///
/// Variant order matters for untagged deserialization: the `Manifest`
/// shape (exactly one `manifest` key) is tried before the general map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordsSource {
    /// Reference to a record manifest held by the registry.
    Manifest {
        /// Manifest identifier understood by the resolver.
        manifest: String,
    },
    /// Inline label → content-id map; resolves without any lookup.
    Inline(BTreeMap<String, String>),
}

// ---------------------------------------------------------------------------
// Per-kind payload structs
// ---------------------------------------------------------------------------

/// Payload for `name.purchase`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseData {
    /// Address that bought the name; becomes the owner.
    pub buyer: String,
    /// Purchase price, possibly needing quote resolution.
    pub price: PriceSource,
    /// Lease start, seconds since epoch. Zero means "not emitted".
    #[serde(default)]
    pub start_ts: i64,
    /// Lease end, seconds since epoch. Absent for permanent purchases.
    #[serde(default)]
    pub expiry_ts: Option<i64>,
    /// Undername allowance granted at purchase.
    #[serde(default)]
    pub undername_limit: Option<u64>,
}

/// Payload for `name.transfer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferData {
    /// Address receiving ownership.
    pub recipient: String,
}

/// Payload for `name.extend-lease`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendLeaseData {
    /// New lease end, seconds since epoch.
    pub expiry_ts: i64,
}

/// Payload for `name.increase-undername-limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndernameLimitData {
    /// New undername allowance.
    pub limit: u64,
    /// Label being provisioned under the raised allowance, when the
    /// upstream event carries one. Registers the undername immediately,
    /// before any record points at it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Payload for `name.set-record`. Exactly one label per event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRecordData {
    /// The touched label: `@` for the apex record, anything else is an
    /// undername.
    pub label: String,
    /// Content identifier the label now points at.
    pub content_id: String,
    /// Record TTL in seconds. Zero means "not emitted".
    #[serde(default)]
    pub ttl_secs: u64,
}

/// Payload for `name.add-controller`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerData {
    /// Address granted control.
    pub controller: String,
}

/// Payload for `name.reassign`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignData {
    /// Identifier of the new managing process.
    pub process_id: String,
}

/// Payload for `name.set-ticker`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerData {
    /// New ticker symbol.
    pub ticker: String,
}

/// Payload for `name.set-description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionData {
    /// New description text.
    pub description: String,
}

/// Payload for `name.set-keywords`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordsData {
    /// Keyword labels to add.
    pub keywords: Vec<String>,
}

/// Payload for `name.sync` — a full-state replacement emitted by the
/// managing process. Folds in authoritative mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncData {
    /// Current owner, if the process reports one.
    #[serde(default)]
    pub owner: Option<String>,
    /// Full controller set.
    #[serde(default)]
    pub controllers: Vec<String>,
    /// Current lease end, seconds since epoch.
    #[serde(default)]
    pub expiry_ts: Option<i64>,
    /// Current record TTL in seconds.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
    /// Full record list, possibly needing manifest expansion.
    pub records: RecordsSource,
    /// Recorded purchase price, possibly needing quote resolution.
    #[serde(default)]
    pub price: Option<PriceSource>,
}

// ---------------------------------------------------------------------------
// EventPayload — the unified payload enum
// ---------------------------------------------------------------------------

/// Typed payload for an event. The discriminant comes from the envelope's
/// kind string, not from the JSON itself.
///
/// **Serde note:** `EventPayload` implements `Serialize` manually
/// (dispatching to the inner struct) but does **not** implement
/// `Deserialize` directly. Use [`EventPayload::deserialize_for`] with the
/// wire kind string; [`RawEvent`](super::RawEvent) does this in its custom
/// `Deserialize` impl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    /// Payload for `name.purchase`.
    Purchase(PurchaseData),
    /// Payload for `name.transfer`.
    Transfer(TransferData),
    /// Payload for `name.extend-lease`.
    ExtendLease(ExtendLeaseData),
    /// Payload for `name.increase-undername-limit`.
    IncreaseUndernameLimit(UndernameLimitData),
    /// Payload for `name.set-record`.
    SetRecord(SetRecordData),
    /// Payload for `name.add-controller`.
    AddController(ControllerData),
    /// Payload for `name.reassign`.
    Reassign(ReassignData),
    /// Payload for `name.set-ticker`.
    SetTicker(TickerData),
    /// Payload for `name.set-description`.
    SetDescription(DescriptionData),
    /// Payload for `name.set-keywords`.
    SetKeywords(KeywordsData),
    /// Payload for `name.sync`.
    Sync(SyncData),
    /// Unrecognized kind: the wire kind string and raw payload are kept
    /// verbatim so the event still appears on the timeline.
    Other {
        /// The wire kind string as received.
        kind: String,
        /// The raw payload as received.
        data: serde_json::Value,
    },
}

impl EventPayload {
    /// The catalog kind of this payload.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Purchase(_) => EventKind::Purchase,
            Self::Transfer(_) => EventKind::Transfer,
            Self::ExtendLease(_) => EventKind::ExtendLease,
            Self::IncreaseUndernameLimit(_) => EventKind::IncreaseUndernameLimit,
            Self::SetRecord(_) => EventKind::SetRecord,
            Self::AddController(_) => EventKind::AddController,
            Self::Reassign(_) => EventKind::Reassign,
            Self::SetTicker(_) => EventKind::SetTicker,
            Self::SetDescription(_) => EventKind::SetDescription,
            Self::SetKeywords(_) => EventKind::SetKeywords,
            Self::Sync(_) => EventKind::Sync,
            Self::Other { .. } => EventKind::Other,
        }
    }

    /// The wire kind string: the catalog string for recognized kinds, or
    /// the preserved original string for `Other`.
    #[must_use]
    pub fn kind_str(&self) -> &str {
        match self {
            Self::Other { kind, .. } => kind.as_str(),
            _ => self.kind().as_str(),
        }
    }

    /// Deserialize a JSON payload into the correct variant for the given
    /// wire kind string.
    ///
    /// Unrecognized kind strings never fail: they yield
    /// [`EventPayload::Other`] with the payload preserved verbatim.
    ///
    /// # Errors
    ///
    /// Returns a [`PayloadParseError`] if the payload does not match the
    /// schema of a recognized kind.
    pub fn deserialize_for(
        kind: &str,
        data: serde_json::Value,
    ) -> Result<Self, PayloadParseError> {
        let known = EventKind::parse(kind);
        let result = match known {
            EventKind::Purchase => {
                serde_json::from_value::<PurchaseData>(data).map(EventPayload::Purchase)
            }
            EventKind::Transfer => {
                serde_json::from_value::<TransferData>(data).map(EventPayload::Transfer)
            }
            EventKind::ExtendLease => {
                serde_json::from_value::<ExtendLeaseData>(data).map(EventPayload::ExtendLease)
            }
            EventKind::IncreaseUndernameLimit => {
                serde_json::from_value::<UndernameLimitData>(data)
                    .map(EventPayload::IncreaseUndernameLimit)
            }
            EventKind::SetRecord => {
                serde_json::from_value::<SetRecordData>(data).map(EventPayload::SetRecord)
            }
            EventKind::AddController => {
                serde_json::from_value::<ControllerData>(data).map(EventPayload::AddController)
            }
            EventKind::Reassign => {
                serde_json::from_value::<ReassignData>(data).map(EventPayload::Reassign)
            }
            EventKind::SetTicker => {
                serde_json::from_value::<TickerData>(data).map(EventPayload::SetTicker)
            }
            EventKind::SetDescription => {
                serde_json::from_value::<DescriptionData>(data).map(EventPayload::SetDescription)
            }
            EventKind::SetKeywords => {
                serde_json::from_value::<KeywordsData>(data).map(EventPayload::SetKeywords)
            }
            EventKind::Sync => serde_json::from_value::<SyncData>(data).map(EventPayload::Sync),
            EventKind::Other => {
                return Ok(EventPayload::Other {
                    kind: kind.to_string(),
                    data,
                });
            }
        };

        result.map_err(|source| PayloadParseError {
            kind: known,
            source,
        })
    }
}

impl Serialize for EventPayload {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Purchase(d) => d.serialize(serializer),
            Self::Transfer(d) => d.serialize(serializer),
            Self::ExtendLease(d) => d.serialize(serializer),
            Self::IncreaseUndernameLimit(d) => d.serialize(serializer),
            Self::SetRecord(d) => d.serialize(serializer),
            Self::AddController(d) => d.serialize(serializer),
            Self::Reassign(d) => d.serialize(serializer),
            Self::SetTicker(d) => d.serialize(serializer),
            Self::SetDescription(d) => d.serialize(serializer),
            Self::SetKeywords(d) => d.serialize(serializer),
            Self::Sync(d) => d.serialize(serializer),
            Self::Other { data, .. } => data.serialize(serializer),
        }
    }
}

// ---------------------------------------------------------------------------
// PayloadParseError
// ---------------------------------------------------------------------------

/// Error returned when deserializing an event's JSON payload fails.
#[derive(Debug)]
pub struct PayloadParseError {
    /// The recognized kind whose schema the payload failed to match.
    pub kind: EventKind,
    /// The underlying JSON parse error.
    pub source: serde_json::Error,
}

impl fmt::Display for PayloadParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} payload: {}", self.kind, self.source)
    }
}

impl std::error::Error for PayloadParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
