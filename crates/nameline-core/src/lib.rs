//! Core replay engine for reconstructing the history of a decentralized
//! name from its raw event stream.
//!
//! The pipeline is a pull-driven fold: a stream of [`event::RawEvent`]s is
//! classified ([`classify`]), each event is resolved into a
//! [`model::StateDelta`] ([`delta::DeltaComputer`]), and the deltas fold
//! left-to-right into [`model::Snapshot`]s ([`model::fold`]), accumulated
//! by a [`timeline::Timeline`]. [`session`] drives the loop, either
//! one-shot ([`session::replay`]) or live on a background task
//! ([`session::HistorySession`]). Auxiliary registry lookups go through
//! the TTL-aware two-tier [`cache`], the cached [`detail`] client, and the
//! [`gateway`] content locator.

pub mod cache;
pub mod classify;
pub mod delta;
pub mod detail;
pub mod event;
pub mod gateway;
pub mod model;
pub mod session;
pub mod timeline;

pub use classify::{Category, Classification, ClassifiedEvent, classify};
pub use delta::{DeltaComputer, NoopResolver, ResolveError, Resolver, StaticResolver};
pub use event::{EventKind, EventPayload, RawEvent};
pub use model::{APEX_LABEL, FoldMode, Snapshot, StateDelta, fold};
pub use session::{EventStream, EventSupplier, HistorySession, LoadStatus, SessionState, StreamError, replay};
pub use timeline::Timeline;
