//! State-key layout.
//!
//! Every key is `prefix(1) ‖ identity ‖ chunks(u16 BE)`. The chunk suffix is
//! a storage-layer size hint, opaque to module logic but part of the key.
//! Prefixes are drawn contiguously from `BASE_PREFIX`; identity fields use
//! fixed widths (address 33, id 32, window u64 BE, validator index u32 BE,
//! asset tag u8 with pairs always sorted).

use veil_types::consts::DISPUTE_VALIDATOR_INDEX;
use veil_types::{Address, MarketId, ADDRESS_LEN, ID_LEN};

use crate::pool::sorted_asset_pair;

const BASE_PREFIX: u8 = 0x3;

pub const BALANCE_PREFIX: u8 = BASE_PREFIX;
pub const MARKET_PREFIX: u8 = BASE_PREFIX + 1;
pub const COMMITMENT_PREFIX: u8 = BASE_PREFIX + 2;
pub const BATCH_PREFIX: u8 = BASE_PREFIX + 3;
pub const ORACLE_PREFIX: u8 = BASE_PREFIX + 4;
pub const TREASURY_CONFIG_PREFIX: u8 = BASE_PREFIX + 5;
pub const TREASURY_STATE_PREFIX: u8 = BASE_PREFIX + 6;
pub const FEE_ROUTER_CONFIG_PREFIX: u8 = BASE_PREFIX + 7;
pub const FEE_ROUTER_STATE_PREFIX: u8 = BASE_PREFIX + 8;
pub const VAI_CONFIG_PREFIX: u8 = BASE_PREFIX + 9;
pub const VAI_STATE_PREFIX: u8 = BASE_PREFIX + 10;
pub const VAI_BALANCE_PREFIX: u8 = BASE_PREFIX + 11;
pub const POOL_PREFIX: u8 = BASE_PREFIX + 12;
pub const LP_BALANCE_PREFIX: u8 = BASE_PREFIX + 13;
pub const RISK_CONFIG_PREFIX: u8 = BASE_PREFIX + 14;
pub const RESERVE_STATE_PREFIX: u8 = BASE_PREFIX + 15;
pub const PROOF_CONFIG_PREFIX: u8 = BASE_PREFIX + 16;
pub const BATCH_PROOF_PREFIX: u8 = BASE_PREFIX + 17;
pub const VELLUM_PROOF_PREFIX: u8 = BASE_PREFIX + 18;
pub const BLOODSWORN_PREFIX: u8 = BASE_PREFIX + 19;
pub const GLYPH_PREFIX: u8 = BASE_PREFIX + 20;

pub const BALANCE_CHUNKS: u16 = 1;
pub const MARKET_CHUNKS: u16 = 8;
pub const COMMITMENT_CHUNKS: u16 = 16;
pub const BATCH_CHUNKS: u16 = 4;
pub const ORACLE_CHUNKS: u16 = 8;
pub const TREASURY_CONFIG_CHUNKS: u16 = 4;
pub const TREASURY_STATE_CHUNKS: u16 = 4;
pub const FEE_ROUTER_CONFIG_CHUNKS: u16 = 2;
pub const FEE_ROUTER_STATE_CHUNKS: u16 = 4;
pub const VAI_CONFIG_CHUNKS: u16 = 4;
pub const VAI_STATE_CHUNKS: u16 = 4;
pub const VAI_BALANCE_CHUNKS: u16 = 1;
pub const POOL_CHUNKS: u16 = 4;
pub const LP_BALANCE_CHUNKS: u16 = 1;
pub const RISK_CONFIG_CHUNKS: u16 = 4;
pub const RESERVE_STATE_CHUNKS: u16 = 4;
pub const PROOF_CONFIG_CHUNKS: u16 = 4;
pub const BATCH_PROOF_CHUNKS: u16 = 8;
pub const VELLUM_PROOF_CHUNKS: u16 = 128;
pub const BLOODSWORN_CHUNKS: u16 = 4;
pub const GLYPH_CHUNKS: u16 = 16;

fn addr_key(prefix: u8, addr: &Address, chunks: u16) -> Vec<u8> {
    let mut k = Vec::with_capacity(1 + ADDRESS_LEN + 2);
    k.push(prefix);
    k.extend_from_slice(&addr.0);
    k.extend_from_slice(&chunks.to_be_bytes());
    k
}

fn singleton_key(prefix: u8, chunks: u16) -> Vec<u8> {
    let mut k = Vec::with_capacity(3);
    k.push(prefix);
    k.extend_from_slice(&chunks.to_be_bytes());
    k
}

fn market_window_key(prefix: u8, market: &MarketId, window: u64, chunks: u16) -> Vec<u8> {
    let mut k = Vec::with_capacity(1 + ID_LEN + 8 + 2);
    k.push(prefix);
    k.extend_from_slice(&market.0);
    k.extend_from_slice(&window.to_be_bytes());
    k.extend_from_slice(&chunks.to_be_bytes());
    k
}

pub fn balance_key(addr: &Address) -> Vec<u8> {
    addr_key(BALANCE_PREFIX, addr, BALANCE_CHUNKS)
}

pub fn vai_balance_key(addr: &Address) -> Vec<u8> {
    addr_key(VAI_BALANCE_PREFIX, addr, VAI_BALANCE_CHUNKS)
}

pub fn market_key(market: &MarketId) -> Vec<u8> {
    let mut k = Vec::with_capacity(1 + ID_LEN + 2);
    k.push(MARKET_PREFIX);
    k.extend_from_slice(&market.0);
    k.extend_from_slice(&MARKET_CHUNKS.to_be_bytes());
    k
}

pub fn commitment_key(market: &MarketId, window: u64, actor: &Address) -> Vec<u8> {
    let mut k = Vec::with_capacity(1 + ID_LEN + 8 + ADDRESS_LEN + 2);
    k.push(COMMITMENT_PREFIX);
    k.extend_from_slice(&market.0);
    k.extend_from_slice(&window.to_be_bytes());
    k.extend_from_slice(&actor.0);
    k.extend_from_slice(&COMMITMENT_CHUNKS.to_be_bytes());
    k
}

pub fn batch_key(market: &MarketId, window: u64) -> Vec<u8> {
    market_window_key(BATCH_PREFIX, market, window, BATCH_CHUNKS)
}

pub fn oracle_key(market: &MarketId, validator_index: u32) -> Vec<u8> {
    let mut k = Vec::with_capacity(1 + ID_LEN + 4 + 2);
    k.push(ORACLE_PREFIX);
    k.extend_from_slice(&market.0);
    k.extend_from_slice(&validator_index.to_be_bytes());
    k.extend_from_slice(&ORACLE_CHUNKS.to_be_bytes());
    k
}

/// Dispute records live in the oracle keyspace under the reserved index.
pub fn dispute_key(market: &MarketId) -> Vec<u8> {
    oracle_key(market, DISPUTE_VALIDATOR_INDEX)
}

pub fn pool_key(asset0: u8, asset1: u8) -> Vec<u8> {
    let (a0, a1) = sorted_asset_pair(asset0, asset1);
    let mut k = Vec::with_capacity(5);
    k.push(POOL_PREFIX);
    k.push(a0);
    k.push(a1);
    k.extend_from_slice(&POOL_CHUNKS.to_be_bytes());
    k
}

pub fn lp_balance_key(asset0: u8, asset1: u8, addr: &Address) -> Vec<u8> {
    let (a0, a1) = sorted_asset_pair(asset0, asset1);
    let mut k = Vec::with_capacity(1 + 2 + ADDRESS_LEN + 2);
    k.push(LP_BALANCE_PREFIX);
    k.push(a0);
    k.push(a1);
    k.extend_from_slice(&addr.0);
    k.extend_from_slice(&LP_BALANCE_CHUNKS.to_be_bytes());
    k
}

pub fn treasury_config_key() -> Vec<u8> {
    singleton_key(TREASURY_CONFIG_PREFIX, TREASURY_CONFIG_CHUNKS)
}

pub fn treasury_state_key() -> Vec<u8> {
    singleton_key(TREASURY_STATE_PREFIX, TREASURY_STATE_CHUNKS)
}

pub fn fee_router_config_key() -> Vec<u8> {
    singleton_key(FEE_ROUTER_CONFIG_PREFIX, FEE_ROUTER_CONFIG_CHUNKS)
}

pub fn fee_router_state_key() -> Vec<u8> {
    singleton_key(FEE_ROUTER_STATE_PREFIX, FEE_ROUTER_STATE_CHUNKS)
}

pub fn vai_config_key() -> Vec<u8> {
    singleton_key(VAI_CONFIG_PREFIX, VAI_CONFIG_CHUNKS)
}

pub fn vai_state_key() -> Vec<u8> {
    singleton_key(VAI_STATE_PREFIX, VAI_STATE_CHUNKS)
}

pub fn risk_config_key() -> Vec<u8> {
    singleton_key(RISK_CONFIG_PREFIX, RISK_CONFIG_CHUNKS)
}

pub fn reserve_state_key() -> Vec<u8> {
    singleton_key(RESERVE_STATE_PREFIX, RESERVE_STATE_CHUNKS)
}

pub fn proof_config_key() -> Vec<u8> {
    singleton_key(PROOF_CONFIG_PREFIX, PROOF_CONFIG_CHUNKS)
}

pub fn batch_proof_key(market: &MarketId, window: u64) -> Vec<u8> {
    market_window_key(BATCH_PROOF_PREFIX, market, window, BATCH_PROOF_CHUNKS)
}

pub fn vellum_proof_key(market: &MarketId, window: u64) -> Vec<u8> {
    market_window_key(VELLUM_PROOF_PREFIX, market, window, VELLUM_PROOF_CHUNKS)
}

pub fn bloodsworn_key(addr: &Address) -> Vec<u8> {
    addr_key(BLOODSWORN_PREFIX, addr, BLOODSWORN_CHUNKS)
}

pub fn glyph_key(market: &MarketId, window: u64) -> Vec<u8> {
    market_window_key(GLYPH_PREFIX, market, window, GLYPH_CHUNKS)
}
