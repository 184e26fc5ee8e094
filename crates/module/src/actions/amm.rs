//! Shared AMM helpers: asset validation, pair-orientation mapping, and
//! per-asset balance routing.

use veil_storage::{self as storage, Pool, StateError, StateMut};
use veil_types::consts::{ASSET_VAI, ASSET_VEIL};
use veil_types::Address;

pub const MIN_POOL_FEE_BIPS: u16 = 1;
pub const MAX_POOL_FEE_BIPS: u16 = 1_000;

pub fn is_supported_asset(asset: u8) -> bool {
    asset == ASSET_VEIL || asset == ASSET_VAI
}

pub fn validate_asset_pair(asset0: u8, asset1: u8) -> Result<(), StateError> {
    if !is_supported_asset(asset0) || !is_supported_asset(asset1) {
        return Err(StateError::UnsupportedAsset);
    }
    if asset0 == asset1 {
        return Err(StateError::InvalidAssetPair);
    }
    Ok(())
}

/// Map caller-oriented amounts `(amount_a, amount_b)` for assets
/// `(asset_a, asset_b)` into the pool's `(amount0, amount1)` orientation.
pub fn map_pair_amounts(
    asset_a: u8,
    asset_b: u8,
    amount_a: u64,
    amount_b: u64,
    pool: &Pool,
) -> Result<(u64, u64), StateError> {
    if asset_a == pool.asset0 && asset_b == pool.asset1 {
        Ok((amount_a, amount_b))
    } else if asset_a == pool.asset1 && asset_b == pool.asset0 {
        Ok((amount_b, amount_a))
    } else {
        Err(StateError::InvalidAssetPair)
    }
}

/// Map pool-oriented amounts back to the caller's pair orientation.
pub fn map_pool_amounts_to_pair(
    pool: &Pool,
    asset_a: u8,
    asset_b: u8,
    amount0: u64,
    amount1: u64,
) -> Result<(u64, u64), StateError> {
    if asset_a == pool.asset0 && asset_b == pool.asset1 {
        Ok((amount0, amount1))
    } else if asset_a == pool.asset1 && asset_b == pool.asset0 {
        Ok((amount1, amount0))
    } else {
        Err(StateError::InvalidAssetPair)
    }
}

pub fn sub_asset_balance(
    store: &mut dyn StateMut,
    actor: &Address,
    asset: u8,
    amount: u64,
) -> Result<u64, StateError> {
    match asset {
        a if a == ASSET_VEIL => storage::sub_balance(store, actor, amount),
        a if a == ASSET_VAI => storage::sub_vai_balance(store, actor, amount),
        _ => Err(StateError::UnsupportedAsset),
    }
}

pub fn add_asset_balance(
    store: &mut dyn StateMut,
    actor: &Address,
    asset: u8,
    amount: u64,
) -> Result<u64, StateError> {
    match asset {
        a if a == ASSET_VEIL => storage::add_balance(store, actor, amount),
        a if a == ASSET_VAI => storage::add_vai_balance(store, actor, amount),
        _ => Err(StateError::UnsupportedAsset),
    }
}
