//! Glyph derivation.
//!
//! A glyph is a deterministic badge minted when a batch proof is accepted.
//! Entropy comes only from committed inputs, so every node derives the same
//! glyph for the same transaction.

use sha2::{Digest, Sha256};

use veil_storage::Glyph;
use veil_types::{Address, MarketId, TxId, ADDRESS_LEN, ID_LEN};

const GLYPH_DOMAIN_TAG: &str = "VEIL_GLYPH_V1";

pub const GLYPH_RARITY_COMMON: u8 = 1;
pub const GLYPH_RARITY_RARE: u8 = 2;
pub const GLYPH_RARITY_EPIC: u8 = 3;
pub const GLYPH_RARITY_LEGENDARY: u8 = 4;
pub const GLYPH_RARITY_MYTHIC: u8 = 5;

pub const GLYPH_CLASS_ASH: u8 = 1;
pub const GLYPH_CLASS_CROWN: u8 = 2;
pub const GLYPH_CLASS_CIPHER: u8 = 3;
pub const GLYPH_CLASS_ECLIPSE: u8 = 4;
pub const GLYPH_CLASS_AEGIS: u8 = 5;
pub const GLYPH_CLASS_RELIC: u8 = 6;

pub fn derive_glyph(
    tx_id: &TxId,
    market_id: &MarketId,
    window_id: u64,
    prover: &Address,
    proof_commitment: [u8; 32],
    public_inputs_hash: &[u8],
    timestamp: i64,
) -> Glyph {
    let entropy = derive_entropy(
        tx_id,
        market_id,
        window_id,
        prover,
        proof_commitment,
        public_inputs_hash,
    );
    let mut inputs = [0u8; 32];
    let n = public_inputs_hash.len().min(32);
    inputs[..n].copy_from_slice(&public_inputs_hash[..n]);

    Glyph {
        class: derive_class(&entropy),
        rarity: derive_rarity(&entropy),
        created_at_ms: timestamp,
        prover: *prover,
        proof_commitment,
        public_inputs_hash: inputs,
        entropy,
    }
}

fn derive_entropy(
    tx_id: &TxId,
    market_id: &MarketId,
    window_id: u64,
    prover: &Address,
    proof_commitment: [u8; 32],
    public_inputs_hash: &[u8],
) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(
        GLYPH_DOMAIN_TAG.len() + ID_LEN * 2 + 8 + ADDRESS_LEN + 32 + public_inputs_hash.len(),
    );
    preimage.extend_from_slice(GLYPH_DOMAIN_TAG.as_bytes());
    preimage.extend_from_slice(tx_id.as_bytes());
    preimage.extend_from_slice(market_id.as_bytes());
    preimage.extend_from_slice(&window_id.to_be_bytes());
    preimage.extend_from_slice(prover.as_bytes());
    preimage.extend_from_slice(&proof_commitment);
    preimage.extend_from_slice(public_inputs_hash);
    Sha256::digest(&preimage).into()
}

fn derive_class(entropy: &[u8; 32]) -> u8 {
    match entropy[2] % 6 {
        0 => GLYPH_CLASS_ASH,
        1 => GLYPH_CLASS_CROWN,
        2 => GLYPH_CLASS_CIPHER,
        3 => GLYPH_CLASS_ECLIPSE,
        4 => GLYPH_CLASS_AEGIS,
        _ => GLYPH_CLASS_RELIC,
    }
}

fn derive_rarity(entropy: &[u8; 32]) -> u8 {
    let roll = u16::from_be_bytes([entropy[0], entropy[1]]) as u32 * 10_000 / 65_536;
    match roll {
        0..=1 => GLYPH_RARITY_MYTHIC,
        2..=19 => GLYPH_RARITY_LEGENDARY,
        20..=149 => GLYPH_RARITY_EPIC,
        150..=799 => GLYPH_RARITY_RARE,
        _ => GLYPH_RARITY_COMMON,
    }
}
