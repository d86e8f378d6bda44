//! Partial state updates produced per event.
//!
//! A [`StateDelta`] covers the same field set as
//! [`Snapshot`](super::snapshot::Snapshot), but every field is optional:
//! scalars are `Option`, set/map fields use empty-means-untouched. Absence
//! always means "unknown/unchanged", never "cleared".

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The partial state change attributable to one raw event.
///
/// Produced by the delta computer, sanitized via [`StateDelta::sanitize`],
/// then folded into the running snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateDelta {
    /// New owner address.
    pub owner: Option<String>,
    /// Controller addresses touched by this event.
    pub controllers: Vec<String>,
    /// New lease end, seconds since epoch.
    pub expiry_ts: Option<i64>,
    /// New record TTL in seconds.
    pub ttl_secs: Option<u64>,
    /// New managing process id.
    pub process_id: Option<String>,
    /// New apex (`@`) content id.
    pub target_id: Option<String>,
    /// New undername allowance.
    pub undername_limit: Option<u64>,
    /// Undername labels touched by this event.
    pub undernames: Vec<String>,
    /// Label → content-id entries touched by this event.
    pub records: BTreeMap<String, String>,
    /// New description text.
    pub description: Option<String>,
    /// New ticker symbol.
    pub ticker: Option<String>,
    /// Keyword labels touched by this event.
    pub keywords: Vec<String>,
    /// Last-touched label.
    pub sub_domain: Option<String>,
    /// Purchase price in base units. Zero is a legitimate value here and
    /// is *not* dropped by sanitization.
    pub purchase_price: Option<u64>,
    /// Lease start, seconds since epoch.
    pub start_ts: Option<i64>,
}

impl StateDelta {
    /// True when the delta carries no field at all (identity fold).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Drop values that mean "not emitted by this event" rather than a
    /// real update: empty strings, and zeroes for the lease/limit
    /// timestamps and counters (expiry, ttl, undername limit, start time).
    ///
    /// This is what prevents a kind that doesn't know a field from
    /// blanking state a prior event established.
    #[must_use]
    pub fn sanitize(mut self) -> Self {
        self.owner = non_empty(self.owner);
        self.process_id = non_empty(self.process_id);
        self.target_id = non_empty(self.target_id);
        self.description = non_empty(self.description);
        self.ticker = non_empty(self.ticker);
        self.sub_domain = non_empty(self.sub_domain);

        self.expiry_ts = self.expiry_ts.filter(|v| *v != 0);
        self.ttl_secs = self.ttl_secs.filter(|v| *v != 0);
        self.undername_limit = self.undername_limit.filter(|v| *v != 0);
        self.start_ts = self.start_ts.filter(|v| *v != 0);

        self.controllers.retain(|c| !c.is_empty());
        self.undernames.retain(|u| !u.is_empty());
        self.keywords.retain(|k| !k.is_empty());
        self.records.retain(|k, v| !k.is_empty() && !v.is_empty());

        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
