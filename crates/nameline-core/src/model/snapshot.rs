//! Snapshot state and the fold that advances it.
//!
//! A [`Snapshot`] is the full reconstructed state of a name immediately
//! after some prefix of the event sequence. [`fold`] combines the previous
//! snapshot with one sanitized [`StateDelta`]:
//!
//! - scalar fields are overwrite-if-present in both modes;
//! - set/map fields union in [`FoldMode::Incremental`] (insertion order
//!   preserved, duplicates skipped) and are replaced wholesale in
//!   [`FoldMode::Authoritative`] when the delta carries them.
//!
//! The fold is pure: same inputs, same output, previous snapshot never
//! mutated in place.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::delta::StateDelta;
use crate::event::EventKind;

/// The distinguished root/apex label.
pub const APEX_LABEL: &str = "@";

/// How set/map fields of a delta combine with the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldMode {
    /// Default: set/map fields union with previous values.
    Incremental,
    /// Full-state replacement: set/map fields carried by the delta replace
    /// previous values wholesale. Only `name.sync` folds this way.
    Authoritative,
}

impl FoldMode {
    /// The fold mode an event kind's delta uses.
    #[must_use]
    pub const fn for_kind(kind: EventKind) -> Self {
        match kind {
            EventKind::Sync => Self::Authoritative,
            _ => Self::Incremental,
        }
    }
}

/// The reconstructed state of a name at one point in the event sequence.
///
/// `Snapshot::default()` is the well-defined all-empty state preceding the
/// first event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Current owner address.
    pub owner: Option<String>,
    /// Controller addresses, insertion-ordered, duplicate-free.
    pub controllers: Vec<String>,
    /// Lease end, seconds since epoch.
    pub expiry_ts: Option<i64>,
    /// Record TTL in seconds.
    pub ttl_secs: Option<u64>,
    /// Managing process id.
    pub process_id: Option<String>,
    /// Apex (`@`) content id.
    pub target_id: Option<String>,
    /// Undername allowance.
    pub undername_limit: Option<u64>,
    /// Undername labels, insertion-ordered, duplicate-free.
    pub undernames: Vec<String>,
    /// Label → content-id mapping. Keys are a subset of
    /// undernames ∪ {"@"}; the fold enforces this.
    pub content_hashes: BTreeMap<String, String>,
    /// Description text.
    pub description: Option<String>,
    /// Ticker symbol.
    pub ticker: Option<String>,
    /// Keyword labels, insertion-ordered, duplicate-free.
    pub keywords: Vec<String>,
    /// Last-touched label.
    pub sub_domain: Option<String>,
    /// Purchase price in base units.
    pub purchase_price: Option<u64>,
    /// Lease start, seconds since epoch.
    pub start_ts: Option<i64>,
}

/// Fold a sanitized delta into the previous snapshot, producing the next.
#[must_use]
pub fn fold(prev: &Snapshot, delta: &StateDelta, mode: FoldMode) -> Snapshot {
    let mut next = prev.clone();

    // Scalars: overwrite-if-present, in both modes. Sanitization has
    // already removed present-but-empty values, so a surviving Some is a
    // real update.
    overwrite(&mut next.owner, &delta.owner);
    overwrite(&mut next.process_id, &delta.process_id);
    overwrite(&mut next.target_id, &delta.target_id);
    overwrite(&mut next.description, &delta.description);
    overwrite(&mut next.ticker, &delta.ticker);
    overwrite(&mut next.sub_domain, &delta.sub_domain);
    if let Some(v) = delta.expiry_ts {
        next.expiry_ts = Some(v);
    }
    if let Some(v) = delta.ttl_secs {
        next.ttl_secs = Some(v);
    }
    if let Some(v) = delta.undername_limit {
        next.undername_limit = Some(v);
    }
    if let Some(v) = delta.purchase_price {
        next.purchase_price = Some(v);
    }
    if let Some(v) = delta.start_ts {
        next.start_ts = Some(v);
    }

    match mode {
        FoldMode::Incremental => {
            union_into(&mut next.controllers, &delta.controllers);
            union_into(&mut next.undernames, &delta.undernames);
            union_into(&mut next.keywords, &delta.keywords);
            for (label, content) in &delta.records {
                next.content_hashes
                    .insert(label.clone(), content.clone());
            }
        }
        FoldMode::Authoritative => {
            // Wholesale replacement, but an empty field still means
            // "not emitted" and leaves the previous value standing.
            if !delta.controllers.is_empty() {
                next.controllers = deduped(&delta.controllers);
            }
            if !delta.undernames.is_empty() {
                next.undernames = deduped(&delta.undernames);
            }
            if !delta.keywords.is_empty() {
                next.keywords = deduped(&delta.keywords);
            }
            if !delta.records.is_empty() {
                next.content_hashes = delta.records.clone();
            }
        }
    }

    // Invariant: every content-hash label other than "@" is an undername.
    let missing: Vec<String> = next
        .content_hashes
        .keys()
        .filter(|label| label.as_str() != APEX_LABEL && !next.undernames.contains(label))
        .cloned()
        .collect();
    next.undernames.extend(missing);

    next
}

fn overwrite(slot: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = value {
        *slot = Some(v.clone());
    }
}

/// Append values not already present, preserving insertion order.
fn union_into(target: &mut Vec<String>, values: &[String]) {
    for value in values {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}

fn deduped(values: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(values.len());
    union_into(&mut out, values);
    out
}
