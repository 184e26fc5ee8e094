//! Constant-product pool rows.

use crate::error::StateError;
use crate::keys::pool_key;
use crate::store::{StateMut, StateRead};

/// On-disk pool record, always keyed and stored under the sorted pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pool {
    pub asset0: u8,
    pub asset1: u8,
    pub fee_bips: u16,
    pub reserve0: u64,
    pub reserve1: u64,
    pub total_lp: u64,
}

impl Pool {
    const MIN_LEN: usize = 1 + 1 + 2 + 8 * 3;

    fn encode(&self) -> Vec<u8> {
        let (a0, a1) = sorted_asset_pair(self.asset0, self.asset1);
        let mut v = Vec::with_capacity(Self::MIN_LEN);
        v.push(a0);
        v.push(a1);
        v.extend_from_slice(&self.fee_bips.to_be_bytes());
        v.extend_from_slice(&self.reserve0.to_be_bytes());
        v.extend_from_slice(&self.reserve1.to_be_bytes());
        v.extend_from_slice(&self.total_lp.to_be_bytes());
        v
    }

    fn decode(raw: &[u8]) -> Result<Self, StateError> {
        if raw.len() < Self::MIN_LEN {
            return Err(StateError::InvalidPoolRecord(raw.len()));
        }
        let mut fee = [0u8; 2];
        fee.copy_from_slice(&raw[2..4]);
        let mut r0 = [0u8; 8];
        r0.copy_from_slice(&raw[4..12]);
        let mut r1 = [0u8; 8];
        r1.copy_from_slice(&raw[12..20]);
        let mut lp = [0u8; 8];
        lp.copy_from_slice(&raw[20..28]);
        Ok(Self {
            asset0: raw[0],
            asset1: raw[1],
            fee_bips: u16::from_be_bytes(fee),
            reserve0: u64::from_be_bytes(r0),
            reserve1: u64::from_be_bytes(r1),
            total_lp: u64::from_be_bytes(lp),
        })
    }
}

/// Canonical `(min, max)` ordering for an asset pair.
pub fn sorted_asset_pair(asset0: u8, asset1: u8) -> (u8, u8) {
    if asset0 <= asset1 {
        (asset0, asset1)
    } else {
        (asset1, asset0)
    }
}

pub fn put_pool<S: StateMut + ?Sized>(store: &mut S, pool: &Pool) -> Result<(), StateError> {
    store.insert(pool_key(pool.asset0, pool.asset1), pool.encode())?;
    Ok(())
}

pub fn get_pool<S: StateRead + ?Sized>(
    store: &S,
    asset0: u8,
    asset1: u8,
) -> Result<Pool, StateError> {
    let raw = store
        .get(&pool_key(asset0, asset1))?
        .ok_or(StateError::PoolNotFound)?;
    Pool::decode(&raw)
}
