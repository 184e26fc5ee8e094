//! Per-transaction execution context injected by the host runtime.

use veil_types::{Address, TxId};

/// Context handed to every action execution.
///
/// Timestamps are injected block times in milliseconds; actions never read
/// the wall clock on the consensus path.
#[derive(Debug, Clone, Copy)]
pub struct ExecContext {
    pub timestamp: i64,
    pub actor: Address,
    pub tx_id: TxId,
}

impl ExecContext {
    pub fn new(timestamp: i64, actor: Address, tx_id: TxId) -> Self {
        Self {
            timestamp,
            actor,
            tx_id,
        }
    }
}
