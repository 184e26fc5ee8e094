//! Proof configuration, batch-proof records, raw proof blobs, and the
//! prover identity rows.

use veil_types::consts::{PROOF_TYPE_GROTH16, PROOF_TYPE_PLONK};
use veil_types::{Address, MarketId, ADDRESS_LEN};

use crate::error::StateError;
use crate::keys::{
    batch_proof_key, bloodsworn_key, glyph_key, proof_config_key, vellum_proof_key,
};
use crate::store::{StateMut, StateRead};

pub const MAX_PUBLIC_INPUTS_HASH_LEN: usize = 32;
pub const MAX_FILLS_HASH_LEN: usize = 64;
pub const MAX_VELLUM_PROOF_BYTES: usize = 131_072;

fn read_u64(raw: &[u8], offset: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&raw[offset..offset + 8]);
    u64::from_be_bytes(b)
}

// ========== Proof config ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProofConfig {
    pub require_proof: bool,
    pub required_proof_type: u8,
    pub batch_window_ms: i64,
    pub proof_deadline_ms: i64,
    pub prover_authority: Address,
}

impl ProofConfig {
    pub fn validate(&self) -> Result<(), StateError> {
        if self.required_proof_type != PROOF_TYPE_GROTH16
            && self.required_proof_type != PROOF_TYPE_PLONK
        {
            return Err(StateError::InvalidProofConfig);
        }
        if self.batch_window_ms <= 0 || self.proof_deadline_ms <= 0 {
            return Err(StateError::InvalidProofConfig);
        }
        if self.prover_authority.is_zero() {
            return Err(StateError::InvalidProofConfig);
        }
        Ok(())
    }
}

pub fn put_proof_config<S: StateMut + ?Sized>(
    store: &mut S,
    cfg: &ProofConfig,
) -> Result<(), StateError> {
    cfg.validate()?;
    let mut v = Vec::with_capacity(1 + 1 + 8 + 8 + ADDRESS_LEN);
    v.push(u8::from(cfg.require_proof));
    v.push(cfg.required_proof_type);
    v.extend_from_slice(&(cfg.batch_window_ms as u64).to_be_bytes());
    v.extend_from_slice(&(cfg.proof_deadline_ms as u64).to_be_bytes());
    v.extend_from_slice(&cfg.prover_authority.0);
    store.insert(proof_config_key(), v)?;
    Ok(())
}

pub fn get_proof_config<S: StateRead + ?Sized>(store: &S) -> Result<ProofConfig, StateError> {
    let raw = store
        .get(&proof_config_key())?
        .ok_or(StateError::InvalidProofConfig)?;
    if raw.len() < 1 + 1 + 8 + 8 + ADDRESS_LEN {
        return Err(StateError::InvalidProofConfig);
    }
    let mut authority = [0u8; ADDRESS_LEN];
    authority.copy_from_slice(&raw[18..18 + ADDRESS_LEN]);
    let cfg = ProofConfig {
        require_proof: raw[0] == 1,
        required_proof_type: raw[1],
        batch_window_ms: read_u64(&raw, 2) as i64,
        proof_deadline_ms: read_u64(&raw, 10) as i64,
        prover_authority: Address(authority),
    };
    cfg.validate()?;
    Ok(cfg)
}

// ========== Batch proof record ==========

/// Metadata registered when a proof is accepted; the raw envelope lives in
/// the vellum row. The two trailing byte fields carry `u16` length prefixes
/// and are offset-scanned on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProofRecord {
    pub proof_type: u8,
    pub submitted_at_ms: i64,
    pub window_close_at_ms: i64,
    pub prover: Address,
    pub proof_commitment: [u8; 32],
    pub public_inputs_hash: Vec<u8>,
    pub fills_hash: Vec<u8>,
}

impl BatchProofRecord {
    const FIXED_LEN: usize = 1 + 8 + 8 + ADDRESS_LEN + 32;

    fn encode(&self) -> Result<Vec<u8>, StateError> {
        if self.public_inputs_hash.is_empty()
            || self.public_inputs_hash.len() > MAX_PUBLIC_INPUTS_HASH_LEN
        {
            return Err(StateError::InvalidProofEnvelope);
        }
        if self.fills_hash.is_empty() || self.fills_hash.len() > MAX_FILLS_HASH_LEN {
            return Err(StateError::InvalidProofEnvelope);
        }
        let mut v = Vec::with_capacity(
            Self::FIXED_LEN + 2 + self.public_inputs_hash.len() + 2 + self.fills_hash.len(),
        );
        v.push(self.proof_type);
        v.extend_from_slice(&(self.submitted_at_ms as u64).to_be_bytes());
        v.extend_from_slice(&(self.window_close_at_ms as u64).to_be_bytes());
        v.extend_from_slice(&self.prover.0);
        v.extend_from_slice(&self.proof_commitment);
        v.extend_from_slice(&(self.public_inputs_hash.len() as u16).to_be_bytes());
        v.extend_from_slice(&self.public_inputs_hash);
        v.extend_from_slice(&(self.fills_hash.len() as u16).to_be_bytes());
        v.extend_from_slice(&self.fills_hash);
        Ok(v)
    }

    fn decode(raw: &[u8]) -> Result<Self, StateError> {
        if raw.len() < Self::FIXED_LEN + 2 + 2 {
            return Err(StateError::InvalidProofEnvelope);
        }
        let proof_type = raw[0];
        let submitted_at_ms = read_u64(raw, 1) as i64;
        let window_close_at_ms = read_u64(raw, 9) as i64;
        let mut offset = 17;
        let mut prover = [0u8; ADDRESS_LEN];
        prover.copy_from_slice(&raw[offset..offset + ADDRESS_LEN]);
        offset += ADDRESS_LEN;
        let mut commitment = [0u8; 32];
        commitment.copy_from_slice(&raw[offset..offset + 32]);
        offset += 32;

        if raw.len() - offset < 2 {
            return Err(StateError::InvalidProofEnvelope);
        }
        let pih_len = u16::from_be_bytes([raw[offset], raw[offset + 1]]) as usize;
        offset += 2;
        if pih_len == 0
            || pih_len > MAX_PUBLIC_INPUTS_HASH_LEN
            || raw.len() - offset < pih_len + 2
        {
            return Err(StateError::InvalidProofEnvelope);
        }
        let public_inputs_hash = raw[offset..offset + pih_len].to_vec();
        offset += pih_len;

        let fills_len = u16::from_be_bytes([raw[offset], raw[offset + 1]]) as usize;
        offset += 2;
        if fills_len == 0 || fills_len > MAX_FILLS_HASH_LEN || raw.len() - offset < fills_len {
            return Err(StateError::InvalidProofEnvelope);
        }
        let fills_hash = raw[offset..offset + fills_len].to_vec();

        Ok(Self {
            proof_type,
            submitted_at_ms,
            window_close_at_ms,
            prover: Address(prover),
            proof_commitment: commitment,
            public_inputs_hash,
            fills_hash,
        })
    }
}

pub fn put_batch_proof_record<S: StateMut + ?Sized>(
    store: &mut S,
    market_id: &MarketId,
    window_id: u64,
    record: &BatchProofRecord,
) -> Result<(), StateError> {
    store.insert(batch_proof_key(market_id, window_id), record.encode()?)?;
    Ok(())
}

pub fn get_batch_proof_record<S: StateRead + ?Sized>(
    store: &S,
    market_id: &MarketId,
    window_id: u64,
) -> Result<BatchProofRecord, StateError> {
    let raw = store
        .get(&batch_proof_key(market_id, window_id))?
        .ok_or(StateError::ProofNotFound)?;
    BatchProofRecord::decode(&raw)
}

// ========== Vellum proof blob ==========

pub fn put_vellum_proof<S: StateMut + ?Sized>(
    store: &mut S,
    market_id: &MarketId,
    window_id: u64,
    proof: &[u8],
) -> Result<(), StateError> {
    if proof.is_empty() || proof.len() > MAX_VELLUM_PROOF_BYTES {
        return Err(StateError::InvalidVellumProof);
    }
    let mut v = Vec::with_capacity(4 + proof.len());
    v.extend_from_slice(&(proof.len() as u32).to_be_bytes());
    v.extend_from_slice(proof);
    store.insert(vellum_proof_key(market_id, window_id), v)?;
    Ok(())
}

pub fn get_vellum_proof<S: StateRead + ?Sized>(
    store: &S,
    market_id: &MarketId,
    window_id: u64,
) -> Result<Vec<u8>, StateError> {
    let raw = store
        .get(&vellum_proof_key(market_id, window_id))?
        .ok_or(StateError::VellumProofNotFound)?;
    if raw.len() < 4 {
        return Err(StateError::InvalidVellumProof);
    }
    let len = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
    if len == 0 || len > MAX_VELLUM_PROOF_BYTES || raw.len() != 4 + len {
        return Err(StateError::InvalidVellumProof);
    }
    Ok(raw[4..].to_vec())
}

// ========== Bloodsworn ==========

/// Per-prover accumulating record of accepted proofs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bloodsworn {
    pub total_accepted_proofs: u64,
    pub active_streak: u64,
    pub last_proof_at_ms: i64,
    pub scar_count: u32,
}

pub fn put_bloodsworn<S: StateMut + ?Sized>(
    store: &mut S,
    addr: &Address,
    record: &Bloodsworn,
) -> Result<(), StateError> {
    let mut v = Vec::with_capacity(8 * 3 + 4);
    v.extend_from_slice(&record.total_accepted_proofs.to_be_bytes());
    v.extend_from_slice(&record.active_streak.to_be_bytes());
    v.extend_from_slice(&(record.last_proof_at_ms as u64).to_be_bytes());
    v.extend_from_slice(&record.scar_count.to_be_bytes());
    store.insert(bloodsworn_key(addr), v)?;
    Ok(())
}

/// Absent rows read as the zero record.
pub fn get_bloodsworn<S: StateRead + ?Sized>(
    store: &S,
    addr: &Address,
) -> Result<Bloodsworn, StateError> {
    let raw = match store.get(&bloodsworn_key(addr))? {
        Some(raw) => raw,
        None => return Ok(Bloodsworn::default()),
    };
    if raw.len() < 8 * 3 + 4 {
        return Err(StateError::InvalidBloodsworn);
    }
    let mut scars = [0u8; 4];
    scars.copy_from_slice(&raw[24..28]);
    Ok(Bloodsworn {
        total_accepted_proofs: read_u64(&raw, 0),
        active_streak: read_u64(&raw, 8),
        last_proof_at_ms: read_u64(&raw, 16) as i64,
        scar_count: u32::from_be_bytes(scars),
    })
}

// ========== Glyph ==========

/// Deterministic, proof-derived badge written at proof acceptance time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub class: u8,
    pub rarity: u8,
    pub created_at_ms: i64,
    pub prover: Address,
    pub proof_commitment: [u8; 32],
    pub public_inputs_hash: [u8; 32],
    pub entropy: [u8; 32],
}

pub fn put_glyph<S: StateMut + ?Sized>(
    store: &mut S,
    market_id: &MarketId,
    window_id: u64,
    glyph: &Glyph,
) -> Result<(), StateError> {
    if glyph.class == 0 || glyph.rarity == 0 || glyph.created_at_ms <= 0 {
        return Err(StateError::InvalidGlyph);
    }
    let mut v = Vec::with_capacity(1 + 1 + 8 + ADDRESS_LEN + 32 * 3);
    v.push(glyph.class);
    v.push(glyph.rarity);
    v.extend_from_slice(&(glyph.created_at_ms as u64).to_be_bytes());
    v.extend_from_slice(&glyph.prover.0);
    v.extend_from_slice(&glyph.proof_commitment);
    v.extend_from_slice(&glyph.public_inputs_hash);
    v.extend_from_slice(&glyph.entropy);
    store.insert(glyph_key(market_id, window_id), v)?;
    Ok(())
}

pub fn get_glyph<S: StateRead + ?Sized>(
    store: &S,
    market_id: &MarketId,
    window_id: u64,
) -> Result<Glyph, StateError> {
    let raw = store
        .get(&glyph_key(market_id, window_id))?
        .ok_or(StateError::GlyphNotFound)?;
    if raw.len() < 1 + 1 + 8 + ADDRESS_LEN + 32 * 3 {
        return Err(StateError::InvalidGlyph);
    }
    let mut offset = 2 + 8;
    let mut prover = [0u8; ADDRESS_LEN];
    prover.copy_from_slice(&raw[offset..offset + ADDRESS_LEN]);
    offset += ADDRESS_LEN;
    let mut commitment = [0u8; 32];
    commitment.copy_from_slice(&raw[offset..offset + 32]);
    offset += 32;
    let mut inputs = [0u8; 32];
    inputs.copy_from_slice(&raw[offset..offset + 32]);
    offset += 32;
    let mut entropy = [0u8; 32];
    entropy.copy_from_slice(&raw[offset..offset + 32]);
    Ok(Glyph {
        class: raw[0],
        rarity: raw[1],
        created_at_ms: read_u64(&raw, 2) as i64,
        prover: Address(prover),
        proof_commitment: commitment,
        public_inputs_hash: inputs,
        entropy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use veil_types::ID_LEN;

    fn addr(b: u8) -> Address {
        Address([b; ADDRESS_LEN])
    }

    fn market_id(b: u8) -> MarketId {
        MarketId([b; ID_LEN])
    }

    fn sample_record() -> BatchProofRecord {
        BatchProofRecord {
            proof_type: PROOF_TYPE_GROTH16,
            submitted_at_ms: 6_000,
            window_close_at_ms: 5_000,
            prover: addr(1),
            proof_commitment: [0xAB; 32],
            public_inputs_hash: vec![0x11; 32],
            fills_hash: vec![0x22; 32],
        }
    }

    #[test]
    fn proof_config_round_trip_and_validation() {
        let mut store = MemStore::new();
        let cfg = ProofConfig {
            require_proof: true,
            required_proof_type: PROOF_TYPE_GROTH16,
            batch_window_ms: 5_000,
            proof_deadline_ms: 10_000,
            prover_authority: addr(2),
        };
        put_proof_config(&mut store, &cfg).unwrap();
        assert_eq!(get_proof_config(&store).unwrap(), cfg);

        let bad = ProofConfig {
            required_proof_type: 3,
            ..cfg
        };
        assert_eq!(
            put_proof_config(&mut store, &bad),
            Err(StateError::InvalidProofConfig)
        );
        let bad = ProofConfig {
            prover_authority: Address::ZERO,
            ..cfg
        };
        assert_eq!(
            put_proof_config(&mut store, &bad),
            Err(StateError::InvalidProofConfig)
        );
    }

    #[test]
    fn batch_proof_record_round_trip() {
        let mut store = MemStore::new();
        let id = market_id(1);
        let record = sample_record();
        put_batch_proof_record(&mut store, &id, 7, &record).unwrap();
        assert_eq!(get_batch_proof_record(&store, &id, 7).unwrap(), record);
        assert_eq!(
            get_batch_proof_record(&store, &id, 8),
            Err(StateError::ProofNotFound)
        );
    }

    #[test]
    fn batch_proof_record_bounds() {
        let mut store = MemStore::new();
        let id = market_id(2);
        let mut record = sample_record();
        record.public_inputs_hash = Vec::new();
        assert_eq!(
            put_batch_proof_record(&mut store, &id, 1, &record),
            Err(StateError::InvalidProofEnvelope)
        );
        let mut record = sample_record();
        record.fills_hash = vec![0u8; MAX_FILLS_HASH_LEN + 1];
        assert_eq!(
            put_batch_proof_record(&mut store, &id, 1, &record),
            Err(StateError::InvalidProofEnvelope)
        );
    }

    #[test]
    fn corrupt_batch_proof_record_rejected() {
        let mut store = MemStore::new();
        let id = market_id(3);
        let record = sample_record();
        put_batch_proof_record(&mut store, &id, 1, &record).unwrap();

        // Truncate the trailing fills hash.
        let key = batch_proof_key(&id, 1);
        let mut raw = store.get(&key).unwrap().unwrap();
        raw.truncate(raw.len() - 1);
        store.insert(key, raw).unwrap();

        assert_eq!(
            get_batch_proof_record(&store, &id, 1),
            Err(StateError::InvalidProofEnvelope)
        );
    }

    #[test]
    fn vellum_proof_round_trip_and_bounds() {
        let mut store = MemStore::new();
        let id = market_id(4);
        let proof = vec![0x5A; 128];
        put_vellum_proof(&mut store, &id, 1, &proof).unwrap();
        assert_eq!(get_vellum_proof(&store, &id, 1).unwrap(), proof);

        assert_eq!(
            put_vellum_proof(&mut store, &id, 2, &[]),
            Err(StateError::InvalidVellumProof)
        );
        assert_eq!(
            put_vellum_proof(&mut store, &id, 2, &vec![0u8; MAX_VELLUM_PROOF_BYTES + 1]),
            Err(StateError::InvalidVellumProof)
        );
        assert_eq!(
            get_vellum_proof(&store, &id, 2),
            Err(StateError::VellumProofNotFound)
        );
    }

    #[test]
    fn vellum_proof_trailing_garbage_rejected() {
        let mut store = MemStore::new();
        let id = market_id(5);
        put_vellum_proof(&mut store, &id, 1, &[1, 2, 3]).unwrap();
        let key = vellum_proof_key(&id, 1);
        let mut raw = store.get(&key).unwrap().unwrap();
        raw.push(0xFF);
        store.insert(key, raw).unwrap();
        assert_eq!(
            get_vellum_proof(&store, &id, 1),
            Err(StateError::InvalidVellumProof)
        );
    }

    #[test]
    fn bloodsworn_defaults_and_round_trip() {
        let mut store = MemStore::new();
        let a = addr(6);
        assert_eq!(get_bloodsworn(&store, &a).unwrap(), Bloodsworn::default());

        let record = Bloodsworn {
            total_accepted_proofs: 10,
            active_streak: 3,
            last_proof_at_ms: 9_000,
            scar_count: 1,
        };
        put_bloodsworn(&mut store, &a, &record).unwrap();
        assert_eq!(get_bloodsworn(&store, &a).unwrap(), record);
    }

    #[test]
    fn glyph_round_trip_and_validation() {
        let mut store = MemStore::new();
        let id = market_id(7);
        let glyph = Glyph {
            class: 3,
            rarity: 2,
            created_at_ms: 12_345,
            prover: addr(8),
            proof_commitment: [1; 32],
            public_inputs_hash: [2; 32],
            entropy: [3; 32],
        };
        put_glyph(&mut store, &id, 1, &glyph).unwrap();
        assert_eq!(get_glyph(&store, &id, 1).unwrap(), glyph);

        let bad = Glyph { class: 0, ..glyph };
        assert_eq!(
            put_glyph(&mut store, &id, 2, &bad),
            Err(StateError::InvalidGlyph)
        );
        assert_eq!(get_glyph(&store, &id, 2), Err(StateError::GlyphNotFound));
    }
}
