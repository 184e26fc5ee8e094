//! Market, commitment, batch, and oracle rows.

use veil_types::consts::DISPUTE_VALIDATOR_INDEX;
use veil_types::{Address, MarketId};

use crate::error::StateError;
use crate::keys::{batch_key, commitment_key, dispute_key, market_key, oracle_key};
use crate::store::{StateMut, StateRead};

/// Prediction-market row. The question occupies the slot tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Market {
    pub status: u8,
    pub outcomes: u8,
    pub resolution_time: i64,
    pub resolved_outcome: u8,
    pub question: Vec<u8>,
}

impl Market {
    const MIN_LEN: usize = 11;

    fn encode(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(Self::MIN_LEN + self.question.len());
        v.push(self.status);
        v.push(self.outcomes);
        v.extend_from_slice(&(self.resolution_time as u64).to_be_bytes());
        v.push(self.resolved_outcome);
        v.extend_from_slice(&self.question);
        v
    }

    fn decode(raw: &[u8]) -> Result<Self, StateError> {
        if raw.len() < Self::MIN_LEN {
            return Err(StateError::InvalidMarketRecord(raw.len()));
        }
        let mut time = [0u8; 8];
        time.copy_from_slice(&raw[2..10]);
        Ok(Self {
            status: raw[0],
            outcomes: raw[1],
            resolution_time: u64::from_be_bytes(time) as i64,
            resolved_outcome: raw[10],
            question: raw[11..].to_vec(),
        })
    }
}

pub fn put_market<S: StateMut + ?Sized>(
    store: &mut S,
    market_id: &MarketId,
    market: &Market,
) -> Result<(), StateError> {
    store.insert(market_key(market_id), market.encode())?;
    Ok(())
}

pub fn get_market<S: StateRead + ?Sized>(
    store: &S,
    market_id: &MarketId,
) -> Result<Market, StateError> {
    let raw = store
        .get(&market_key(market_id))?
        .ok_or(StateError::MarketNotFound)?;
    Market::decode(&raw)
}

/// Store a sealed order commitment: `envelope ‖ commitment`.
///
/// Re-submission by the same actor in the same window overwrites.
pub fn put_commitment<S: StateMut + ?Sized>(
    store: &mut S,
    market_id: &MarketId,
    window_id: u64,
    actor: &Address,
    envelope: &[u8],
    commitment: &[u8],
) -> Result<(), StateError> {
    let mut v = Vec::with_capacity(envelope.len() + commitment.len());
    v.extend_from_slice(envelope);
    v.extend_from_slice(commitment);
    store.insert(commitment_key(market_id, window_id, actor), v)?;
    Ok(())
}

/// Terminal batch row: `clear_price ‖ total_volume ‖ fills_hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub clear_price: u64,
    pub total_volume: u64,
    pub fills_hash: Vec<u8>,
}

impl BatchResult {
    const MIN_LEN: usize = 16;

    fn encode(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(Self::MIN_LEN + self.fills_hash.len());
        v.extend_from_slice(&self.clear_price.to_be_bytes());
        v.extend_from_slice(&self.total_volume.to_be_bytes());
        v.extend_from_slice(&self.fills_hash);
        v
    }

    fn decode(raw: &[u8]) -> Result<Self, StateError> {
        if raw.len() < Self::MIN_LEN {
            return Err(StateError::InvalidBatchRecord(raw.len()));
        }
        let mut price = [0u8; 8];
        price.copy_from_slice(&raw[..8]);
        let mut volume = [0u8; 8];
        volume.copy_from_slice(&raw[8..16]);
        Ok(Self {
            clear_price: u64::from_be_bytes(price),
            total_volume: u64::from_be_bytes(volume),
            fills_hash: raw[16..].to_vec(),
        })
    }
}

/// Write the terminal batch row. Presence of this row is the CLEARED state.
pub fn put_batch_result<S: StateMut + ?Sized>(
    store: &mut S,
    market_id: &MarketId,
    window_id: u64,
    result: &BatchResult,
) -> Result<(), StateError> {
    let key = batch_key(market_id, window_id);
    if store.get(&key)?.is_some() {
        return Err(StateError::BatchAlreadyCleared);
    }
    store.insert(key, result.encode())?;
    Ok(())
}

pub fn get_batch<S: StateRead + ?Sized>(
    store: &S,
    market_id: &MarketId,
    window_id: u64,
) -> Result<Option<BatchResult>, StateError> {
    match store.get(&batch_key(market_id, window_id))? {
        Some(raw) => Ok(Some(BatchResult::decode(&raw)?)),
        None => Ok(None),
    }
}

/// Store a decryption share under the oracle slot: `window_id ‖ share`.
///
/// The dispute sentinel index is excluded from reveal semantics by
/// construction.
pub fn put_oracle_share<S: StateMut + ?Sized>(
    store: &mut S,
    market_id: &MarketId,
    validator_index: u32,
    window_id: u64,
    share: &[u8],
) -> Result<(), StateError> {
    if validator_index == DISPUTE_VALIDATOR_INDEX {
        return Err(StateError::ReservedValidatorIndex);
    }
    let mut v = Vec::with_capacity(8 + share.len());
    v.extend_from_slice(&window_id.to_be_bytes());
    v.extend_from_slice(share);
    store.insert(oracle_key(market_id, validator_index), v)?;
    Ok(())
}

/// Store a dispute record under the reserved oracle slot: `bond ‖ evidence`.
pub fn put_dispute<S: StateMut + ?Sized>(
    store: &mut S,
    market_id: &MarketId,
    bond: u64,
    evidence: &[u8],
) -> Result<(), StateError> {
    let mut v = Vec::with_capacity(8 + evidence.len());
    v.extend_from_slice(&bond.to_be_bytes());
    v.extend_from_slice(evidence);
    store.insert(dispute_key(market_id), v)?;
    Ok(())
}
