//! Veil market module: a typed action set over the key/value state schema.
//!
//! The module implements:
//!
//! - The sealed-bid batch-auction pipeline (commit → reveal → submit proof →
//!   clear) with zk-proof gating
//! - A native two-asset constant-product AMM
//! - VAI mint/burn under debt-ceiling, epoch-limit, and reserve-backing
//!   invariants
//! - The COL treasury with epoch-capped release and the fee router
//! - Prediction-market lifecycle (create, resolve, dispute)
//!
//! Each action declares a static read/write key set for the host runtime's
//! concurrency planner, validates its payload, mutates state atomically, and
//! emits a typed result.

pub mod actions;
pub mod context;
pub mod error;
pub mod genesis;
pub mod glyph;
pub mod keyset;
pub mod metrics;

pub use actions::{Action, ActionPayload};
pub use context::ExecContext;
pub use error::ActionError;
pub use keyset::{KeySet, Permission};
