//! Delta computation: resolve the state fields one raw event changed.
//!
//! [`DeltaComputer::compute`] maps each event kind to its fixed field set.
//! Synchronous accessors copy straight out of the payload; asynchronous
//! ones (price quotes, record manifests) go through the injected
//! [`Resolver`]. Where a kind carries more than one asynchronous accessor
//! they are gathered concurrently (`tokio::join!`) and fan back in to a
//! single delta — partial deltas for one event are never emitted.
//!
//! A failed resolution never aborts the stream: the field is dropped with
//! a warning and folding continues with whatever did resolve.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::event::{EventPayload, PriceSource, RawEvent, RecordsSource};
use crate::model::{APEX_LABEL, StateDelta};

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Error from a secondary field lookup. Always absorbed at the delta
/// computer boundary; never propagates into the fold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The lookup backend is not available at all.
    #[error("lookup backend unavailable")]
    Unavailable,

    /// The backend answered but has no value for this reference.
    #[error("no {what} for '{id}'")]
    NotFound {
        /// What was being resolved ("price quote", "record manifest").
        what: &'static str,
        /// The reference that missed.
        id: String,
    },

    /// The backend failed (network, decode, ...).
    #[error("lookup backend error: {0}")]
    Backend(String),
}

/// Secondary lookups the delta computer may need for one event's fields.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve a price quote id to a base-unit amount.
    async fn price_quote(&self, quote: &str) -> Result<u64, ResolveError>;

    /// Expand a record manifest id into a label → content-id mapping.
    async fn record_manifest(
        &self,
        manifest: &str,
    ) -> Result<BTreeMap<String, String>, ResolveError>;
}

/// Resolver with no backend: every reference lookup fails as unavailable.
/// Inline payload values still resolve normally.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

#[async_trait]
impl Resolver for NoopResolver {
    async fn price_quote(&self, _quote: &str) -> Result<u64, ResolveError> {
        Err(ResolveError::Unavailable)
    }

    async fn record_manifest(
        &self,
        _manifest: &str,
    ) -> Result<BTreeMap<String, String>, ResolveError> {
        Err(ResolveError::Unavailable)
    }
}

/// Map-backed resolver for tests and offline replay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticResolver {
    /// Quote id → base-unit amount.
    pub prices: HashMap<String, u64>,
    /// Manifest id → label → content-id.
    pub manifests: HashMap<String, BTreeMap<String, String>>,
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn price_quote(&self, quote: &str) -> Result<u64, ResolveError> {
        self.prices
            .get(quote)
            .copied()
            .ok_or_else(|| ResolveError::NotFound {
                what: "price quote",
                id: quote.to_string(),
            })
    }

    async fn record_manifest(
        &self,
        manifest: &str,
    ) -> Result<BTreeMap<String, String>, ResolveError> {
        self.manifests
            .get(manifest)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound {
                what: "record manifest",
                id: manifest.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// DeltaComputer
// ---------------------------------------------------------------------------

/// Computes the [`StateDelta`] for one raw event.
///
/// Infallible at its boundary: resolution failures degrade to absent
/// fields instead of propagating.
#[derive(Debug, Clone)]
pub struct DeltaComputer<R> {
    resolver: R,
}

impl<R: Resolver> DeltaComputer<R> {
    /// Create a computer around the given resolver.
    pub const fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Resolve the delta for one event. The returned delta is *not* yet
    /// sanitized; callers apply [`StateDelta::sanitize`] before folding.
    pub async fn compute(&self, event: &RawEvent) -> StateDelta {
        let mut delta = StateDelta::default();

        match &event.payload {
            EventPayload::Purchase(d) => {
                delta.owner = Some(d.buyer.clone());
                delta.start_ts = Some(d.start_ts);
                delta.expiry_ts = d.expiry_ts;
                delta.undername_limit = d.undername_limit;
                delta.purchase_price = self.resolve_price(&event.tx_id, &d.price).await;
            }
            EventPayload::Transfer(d) => {
                delta.owner = Some(d.recipient.clone());
            }
            EventPayload::ExtendLease(d) => {
                delta.expiry_ts = Some(d.expiry_ts);
            }
            EventPayload::IncreaseUndernameLimit(d) => {
                delta.undername_limit = Some(d.limit);
                if let Some(label) = &d.label {
                    delta.undernames.push(label.clone());
                }
            }
            EventPayload::SetRecord(d) => {
                delta.sub_domain = Some(d.label.clone());
                delta.ttl_secs = Some(d.ttl_secs);
                delta
                    .records
                    .insert(d.label.clone(), d.content_id.clone());
                if d.label == APEX_LABEL {
                    // Touching the apex record retargets the name itself.
                    delta.target_id = Some(d.content_id.clone());
                } else {
                    delta.undernames.push(d.label.clone());
                }
            }
            EventPayload::AddController(d) => {
                delta.controllers.push(d.controller.clone());
            }
            EventPayload::Reassign(d) => {
                delta.process_id = Some(d.process_id.clone());
            }
            EventPayload::SetTicker(d) => {
                delta.ticker = Some(d.ticker.clone());
            }
            EventPayload::SetDescription(d) => {
                delta.description = Some(d.description.clone());
            }
            EventPayload::SetKeywords(d) => {
                delta.keywords = d.keywords.clone();
            }
            EventPayload::Sync(d) => {
                // Fan out the two reference lookups, fan back in to one
                // delta. The event is not handed to the fold until both
                // settle.
                let (records, price) = tokio::join!(
                    self.resolve_records(&event.tx_id, &d.records),
                    self.resolve_price_opt(&event.tx_id, d.price.as_ref()),
                );

                delta.owner = d.owner.clone();
                delta.controllers = d.controllers.clone();
                delta.expiry_ts = d.expiry_ts;
                delta.ttl_secs = d.ttl_secs;
                delta.purchase_price = price;

                if let Some(map) = records {
                    delta.target_id = map.get(APEX_LABEL).cloned();
                    delta.undernames = map
                        .keys()
                        .filter(|label| label.as_str() != APEX_LABEL)
                        .cloned()
                        .collect();
                    delta.records = map;
                }
            }
            EventPayload::Other { kind, .. } => {
                tracing::debug!(tx_id = %event.tx_id, kind = %kind, "unknown kind, empty delta");
            }
        }

        delta
    }

    async fn resolve_price(&self, tx_id: &str, source: &PriceSource) -> Option<u64> {
        match source {
            PriceSource::Inline(amount) => Some(*amount),
            PriceSource::Quote { quote } => match self.resolver.price_quote(quote).await {
                Ok(amount) => Some(amount),
                Err(err) => {
                    tracing::warn!(
                        tx_id = %tx_id,
                        quote = %quote,
                        error = %err,
                        "price resolution failed, dropping field"
                    );
                    None
                }
            },
        }
    }

    async fn resolve_price_opt(
        &self,
        tx_id: &str,
        source: Option<&PriceSource>,
    ) -> Option<u64> {
        match source {
            Some(source) => self.resolve_price(tx_id, source).await,
            None => None,
        }
    }

    async fn resolve_records(
        &self,
        tx_id: &str,
        source: &RecordsSource,
    ) -> Option<BTreeMap<String, String>> {
        match source {
            RecordsSource::Inline(map) => Some(map.clone()),
            RecordsSource::Manifest { manifest } => {
                match self.resolver.record_manifest(manifest).await {
                    Ok(map) => Some(map),
                    Err(err) => {
                        tracing::warn!(
                            tx_id = %tx_id,
                            manifest = %manifest,
                            error = %err,
                            "record manifest resolution failed, dropping field"
                        );
                        None
                    }
                }
            }
        }
    }
}
