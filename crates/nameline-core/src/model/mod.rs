//! State model: snapshots, deltas, and the fold combining them.

pub mod delta;
pub mod snapshot;

pub use delta::StateDelta;
pub use snapshot::{APEX_LABEL, FoldMode, Snapshot, fold};
