//! Canonical public-input binding.
//!
//! The preimage layout is a consensus contract shared with the off-chain
//! prover:
//!
//! ```text
//! tag ‖ market_id(32) ‖ window_id(u64 BE) ‖ clear_price(u64 BE)
//!     ‖ total_volume(u64 BE) ‖ fills_hash_len(u16 BE) ‖ fills_hash
//! ```

use sha2::{Digest, Sha256};

use veil_storage::StateError;
use veil_types::consts::{PROOF_CIRCUIT_CLEAR_HASH_V1, PROOF_CIRCUIT_SHIELDED_LEDGER_V1};
use veil_types::{MarketId, ID_LEN};

pub const CLEAR_INPUTS_DOMAIN_TAG: &str = "VEIL_CLEAR_V1";
pub const SHIELDED_LEDGER_INPUTS_DOMAIN_TAG: &str = "VEIL_SHIELDED_LEDGER_V1";

/// Fills hashes are SHA-256 digests.
pub const EXPECTED_FILLS_HASH_LEN: usize = 32;

fn build_preimage(
    tag: &str,
    market_id: &MarketId,
    window_id: u64,
    clear_price: u64,
    total_volume: u64,
    fills_hash: &[u8],
) -> Vec<u8> {
    let mut preimage =
        Vec::with_capacity(tag.len() + ID_LEN + 8 + 8 + 8 + 2 + fills_hash.len());
    preimage.extend_from_slice(tag.as_bytes());
    preimage.extend_from_slice(&market_id.0);
    preimage.extend_from_slice(&window_id.to_be_bytes());
    preimage.extend_from_slice(&clear_price.to_be_bytes());
    preimage.extend_from_slice(&total_volume.to_be_bytes());
    preimage.extend_from_slice(&(fills_hash.len() as u16).to_be_bytes());
    preimage.extend_from_slice(fills_hash);
    preimage
}

/// Canonical preimage for `clearhash-v1` public inputs.
pub fn build_clear_public_inputs_preimage(
    market_id: &MarketId,
    window_id: u64,
    clear_price: u64,
    total_volume: u64,
    fills_hash: &[u8],
) -> Vec<u8> {
    build_preimage(
        CLEAR_INPUTS_DOMAIN_TAG,
        market_id,
        window_id,
        clear_price,
        total_volume,
        fills_hash,
    )
}

pub fn compute_clear_public_inputs_hash(
    market_id: &MarketId,
    window_id: u64,
    clear_price: u64,
    total_volume: u64,
    fills_hash: &[u8],
) -> [u8; 32] {
    Sha256::digest(build_clear_public_inputs_preimage(
        market_id,
        window_id,
        clear_price,
        total_volume,
        fills_hash,
    ))
    .into()
}

/// Canonical preimage for `shielded-ledger-v1` public inputs.
pub fn build_shielded_ledger_public_inputs_preimage(
    market_id: &MarketId,
    window_id: u64,
    clear_price: u64,
    total_volume: u64,
    fills_hash: &[u8],
) -> Vec<u8> {
    build_preimage(
        SHIELDED_LEDGER_INPUTS_DOMAIN_TAG,
        market_id,
        window_id,
        clear_price,
        total_volume,
        fills_hash,
    )
}

pub fn compute_shielded_ledger_public_inputs_hash(
    market_id: &MarketId,
    window_id: u64,
    clear_price: u64,
    total_volume: u64,
    fills_hash: &[u8],
) -> [u8; 32] {
    Sha256::digest(build_shielded_ledger_public_inputs_preimage(
        market_id,
        window_id,
        clear_price,
        total_volume,
        fills_hash,
    ))
    .into()
}

/// Recompute the expected public-inputs hash for a recovered circuit id.
///
/// An empty circuit id (V1 envelopes, legacy blobs) binds to `clearhash-v1`
/// for backward compatibility.
pub fn compute_expected_public_inputs_hash(
    circuit_id: &str,
    market_id: &MarketId,
    window_id: u64,
    clear_price: u64,
    total_volume: u64,
    fills_hash: &[u8],
) -> Result<[u8; 32], StateError> {
    match circuit_id.trim() {
        "" | PROOF_CIRCUIT_CLEAR_HASH_V1 => Ok(compute_clear_public_inputs_hash(
            market_id,
            window_id,
            clear_price,
            total_volume,
            fills_hash,
        )),
        PROOF_CIRCUIT_SHIELDED_LEDGER_V1 => Ok(compute_shielded_ledger_public_inputs_hash(
            market_id,
            window_id,
            clear_price,
            total_volume,
            fills_hash,
        )),
        _ => Err(StateError::UnsupportedProofCircuit),
    }
}
