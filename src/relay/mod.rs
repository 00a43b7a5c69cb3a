//! Transfer lifecycle
//!
//! The [`RelayOrchestrator`] owns every in-flight [`Transfer`] and moves it
//! through source submission, attestation and destination delivery. Each
//! transfer is guarded on its own, so independent transfers progress in
//! parallel while two callers acting on the same transfer take turns.

mod orchestrator;
mod transfer;

pub use orchestrator::RelayOrchestrator;
pub use transfer::{Transfer, TransferId, TransferParams, TransferState};
