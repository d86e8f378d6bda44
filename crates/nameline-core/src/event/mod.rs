//! Event data model for the name-history stream.
//!
//! This module defines the core [`RawEvent`] struct, the [`EventKind`]
//! catalog, and the typed payload structs. An event arrives as a JSON
//! object:
//!
//! ```text
//! { "tx_id": "...", "ts": 1700000000, "initiator": "0x...",
//!   "kind": "name.<verb>", "data": { ... } }
//! ```
//!
//! The `kind` string is external to the payload, so `RawEvent` uses a
//! two-pass `Deserialize`: first the envelope, then the payload decoded
//! against the schema the kind selects. Unrecognized kinds are preserved
//! as [`EventPayload::Other`] rather than rejected.

pub mod payload;
pub mod types;

pub use payload::{
    ControllerData, DescriptionData, EventPayload, ExtendLeaseData, KeywordsData,
    PayloadParseError, PriceSource, PurchaseData, ReassignData, RecordsSource, SetRecordData,
    SyncData, TickerData, TransferData, UndernameLimitData,
};
pub use types::EventKind;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

/// A single raw event in a name's history.
///
/// Immutable once received. Events are identified by the transaction that
/// produced them; the same `tx_id` arriving twice is a duplicate and is
/// suppressed at the presentation stage, never re-folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Identity of the transaction that produced this event.
    pub tx_id: String,

    /// Event timestamp, seconds since Unix epoch.
    pub ts: i64,

    /// Address that initiated the event.
    pub initiator: String,

    /// Typed payload specific to the event kind.
    pub payload: EventPayload,
}

impl RawEvent {
    /// The catalog kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

impl Serialize for RawEvent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RawEvent", 5)?;
        state.serialize_field("tx_id", &self.tx_id)?;
        state.serialize_field("ts", &self.ts)?;
        state.serialize_field("initiator", &self.initiator)?;
        state.serialize_field("kind", self.payload.kind_str())?;
        state.serialize_field("data", &self.payload)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for RawEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        /// Helper for two-pass deserialization: read the envelope first,
        /// then decode `data` against the schema `kind` selects.
        #[derive(Deserialize)]
        struct Envelope {
            tx_id: String,
            ts: i64,
            initiator: String,
            kind: String,
            #[serde(default)]
            data: serde_json::Value,
        }

        let raw = Envelope::deserialize(deserializer)?;
        let payload = EventPayload::deserialize_for(&raw.kind, raw.data)
            .map_err(serde::de::Error::custom)?;

        Ok(Self {
            tx_id: raw.tx_id,
            ts: raw.ts,
            initiator: raw.initiator,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_json_roundtrip() {
        let event = RawEvent {
            tx_id: "tx-1".to_string(),
            ts: 1_700_000_000,
            initiator: "0xabc".to_string(),
            payload: EventPayload::Transfer(TransferData {
                recipient: "0xdef".to_string(),
            }),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "name.transfer");
        assert_eq!(json["data"]["recipient"], "0xdef");

        let back: RawEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn unknown_kind_roundtrips_verbatim() {
        let json = json!({
            "tx_id": "tx-2",
            "ts": 1_700_000_001,
            "initiator": "0xabc",
            "kind": "name.burn",
            "data": { "reason": "expired" }
        });

        let event: RawEvent = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(event.kind(), EventKind::Other);
        assert_eq!(event.payload.kind_str(), "name.burn");

        let out = serde_json::to_value(&event).unwrap();
        assert_eq!(out, json);
    }

    #[test]
    fn missing_data_defaults_to_null_for_unknown_kinds() {
        let json = json!({
            "tx_id": "tx-3",
            "ts": 1,
            "initiator": "0xabc",
            "kind": "name.noop"
        });
        let event: RawEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.kind(), EventKind::Other);
    }

    #[test]
    fn malformed_known_payload_is_an_error() {
        let json = json!({
            "tx_id": "tx-4",
            "ts": 1,
            "initiator": "0xabc",
            "kind": "name.transfer",
            "data": { "recipient": 42 }
        });
        assert!(serde_json::from_value::<RawEvent>(json).is_err());
    }
}
