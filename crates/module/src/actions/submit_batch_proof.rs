//! Asynchronous batch-proof registration.
//!
//! The proof is verified and registered here; the canonical binding between
//! the proof and the clear inputs is enforced at clear time.

use std::time::Instant;

use sha2::{Digest, Sha256};

use veil_storage::{
    self as storage, batch_proof_key, bloodsworn_key, glyph_key, market_key, proof_config_key,
    vellum_proof_key, BatchProofRecord, StateError, StateMut,
};
use veil_types::consts::{MARKET_STATUS_ACTIVE, SUBMIT_BATCH_PROOF_ID};
use veil_types::{Address, Decoder, Encoder, MarketId};
use veil_zk::{verify_in_consensus, MAX_PROOF_BYTES};

use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::glyph::derive_glyph;
use crate::keyset::{KeySet, Permission};
use crate::metrics;

pub const EXPECTED_PROOF_HASH_SIZE: usize = 32;
pub const EXPECTED_FILLS_HASH_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitBatchProof {
    pub market_id: MarketId,
    pub window_id: u64,
    pub window_close_at_ms: i64,
    pub proof_type: u8,
    pub public_inputs_hash: Vec<u8>,
    pub fills_hash: Vec<u8>,
    pub proof: Vec<u8>,
}

impl Action for SubmitBatchProof {
    const TYPE_ID: u8 = SUBMIT_BATCH_PROOF_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(
            1 + 32
                + 8
                + 8
                + 1
                + 4
                + self.public_inputs_hash.len()
                + 4
                + self.fills_hash.len()
                + 4
                + self.proof.len(),
        );
        enc.put_u8(Self::TYPE_ID);
        enc.put_id(&self.market_id);
        enc.put_u64(self.window_id);
        enc.put_i64(self.window_close_at_ms);
        enc.put_u8(self.proof_type);
        enc.put_bytes(&self.public_inputs_hash);
        enc.put_bytes(&self.fills_hash);
        enc.put_bytes(&self.proof);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let market_id = dec.get_id()?;
        let window_id = dec.get_u64()?;
        let window_close_at_ms = dec.get_i64()?;
        let proof_type = dec.get_u8()?;
        let public_inputs_hash = dec.get_bytes(EXPECTED_PROOF_HASH_SIZE)?;
        let fills_hash = dec.get_bytes(EXPECTED_FILLS_HASH_SIZE)?;
        let proof = dec.get_bytes(MAX_PROOF_BYTES)?;
        dec.finish()?;
        Ok(Self {
            market_id,
            window_id,
            window_close_at_ms,
            proof_type,
            public_inputs_hash,
            fills_hash,
            proof,
        })
    }

    fn state_keys(&self, actor: &Address) -> KeySet {
        KeySet::new()
            .with(market_key(&self.market_id), Permission::Read)
            .with(proof_config_key(), Permission::Read)
            .with(
                batch_proof_key(&self.market_id, self.window_id),
                Permission::All,
            )
            .with(
                vellum_proof_key(&self.market_id, self.window_id),
                Permission::All,
            )
            .with(bloodsworn_key(actor), Permission::All)
            .with(glyph_key(&self.market_id, self.window_id), Permission::All)
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        let start = Instant::now();
        let mut missed_deadline = false;
        let result = self.apply(store, ctx, &mut missed_deadline);
        metrics::collector().record_proof_submit(
            &self.market_id,
            self.window_id,
            self.window_close_at_ms,
            ctx.timestamp,
            start.elapsed(),
            missed_deadline,
            result.as_ref().err().map(|e| e.to_string()).as_deref(),
        );
        result
    }
}

impl SubmitBatchProof {
    fn apply(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
        missed_deadline: &mut bool,
    ) -> Result<Vec<u8>, ActionError> {
        if self.window_close_at_ms <= 0 {
            return Err(StateError::InvalidProofEnvelope.into());
        }
        if self.proof_type == 0 {
            return Err(StateError::InvalidProofEnvelope.into());
        }
        if self.public_inputs_hash.len() != EXPECTED_PROOF_HASH_SIZE {
            return Err(StateError::InvalidProofEnvelope.into());
        }
        if self.fills_hash.len() != EXPECTED_FILLS_HASH_SIZE {
            return Err(StateError::InvalidProofEnvelope.into());
        }
        if self.proof.is_empty() || self.proof.len() > MAX_PROOF_BYTES {
            return Err(StateError::InvalidProofEnvelope.into());
        }

        let market = storage::get_market(store, &self.market_id)?;
        if market.status != MARKET_STATUS_ACTIVE {
            return Err(StateError::MarketNotActive.into());
        }

        let cfg = storage::get_proof_config(store)?;
        if !cfg.require_proof {
            return Err(StateError::InvalidProofConfig.into());
        }
        if ctx.actor != cfg.prover_authority {
            return Err(StateError::Unauthorized.into());
        }
        if self.proof_type != cfg.required_proof_type {
            return Err(StateError::ProofTypeMismatch.into());
        }
        if self.window_close_at_ms % cfg.batch_window_ms != 0 {
            return Err(StateError::InvalidProofEnvelope.into());
        }
        if ctx.timestamp < self.window_close_at_ms {
            *missed_deadline = true;
            return Err(StateError::ProofDeadlineMissed.into());
        }
        if ctx.timestamp > self.window_close_at_ms + cfg.proof_deadline_ms {
            *missed_deadline = true;
            return Err(StateError::ProofDeadlineMissed.into());
        }

        // Exactly-once submission per window.
        match storage::get_batch_proof_record(store, &self.market_id, self.window_id) {
            Ok(_) => return Err(StateError::ProofAlreadySubmitted.into()),
            Err(StateError::ProofNotFound) => {}
            Err(err) => return Err(err.into()),
        }

        verify_in_consensus(
            cfg.required_proof_type,
            &self.proof,
            &self.public_inputs_hash,
        )?;

        // Canonical public-input binding against clear inputs is enforced at
        // clear time.
        let commitment: [u8; 32] = Sha256::digest(&self.proof).into();
        let record = BatchProofRecord {
            proof_type: self.proof_type,
            submitted_at_ms: ctx.timestamp,
            window_close_at_ms: self.window_close_at_ms,
            prover: ctx.actor,
            proof_commitment: commitment,
            public_inputs_hash: self.public_inputs_hash.clone(),
            fills_hash: self.fills_hash.clone(),
        };
        storage::put_batch_proof_record(store, &self.market_id, self.window_id, &record)?;
        storage::put_vellum_proof(store, &self.market_id, self.window_id, &self.proof)?;

        let mut bloodsworn = storage::get_bloodsworn(store, &ctx.actor)?;
        bloodsworn.total_accepted_proofs += 1;
        bloodsworn.active_streak += 1;
        bloodsworn.last_proof_at_ms = ctx.timestamp;
        storage::put_bloodsworn(store, &ctx.actor, &bloodsworn)?;

        let glyph = derive_glyph(
            &ctx.tx_id,
            &self.market_id,
            self.window_id,
            &ctx.actor,
            commitment,
            &self.public_inputs_hash,
            ctx.timestamp,
        );
        storage::put_glyph(store, &self.market_id, self.window_id, &glyph)?;

        Ok(SubmitBatchProofResult {
            submitted_at_ms: record.submitted_at_ms,
            proof_commitment: commitment,
            stored_proof_bytes: self.proof.len() as u32,
            glyph_class: glyph.class,
            glyph_rarity: glyph.rarity,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitBatchProofResult {
    pub submitted_at_ms: i64,
    pub proof_commitment: [u8; 32],
    pub stored_proof_bytes: u32,
    pub glyph_class: u8,
    pub glyph_rarity: u8,
}

impl SubmitBatchProofResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 8 + 4 + 32 + 4 + 2);
        enc.put_u8(SUBMIT_BATCH_PROOF_ID);
        enc.put_i64(self.submitted_at_ms);
        enc.put_bytes(&self.proof_commitment);
        enc.put_u32(self.stored_proof_bytes);
        enc.put_u8(self.glyph_class);
        enc.put_u8(self.glyph_rarity);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(SUBMIT_BATCH_PROOF_ID)?;
        let submitted_at_ms = dec.get_i64()?;
        let commitment_bytes = dec.get_bytes(32)?;
        let mut proof_commitment = [0u8; 32];
        if commitment_bytes.len() != 32 {
            return Err(StateError::InvalidProofEnvelope.into());
        }
        proof_commitment.copy_from_slice(&commitment_bytes);
        let stored_proof_bytes = dec.get_u32()?;
        let glyph_class = dec.get_u8()?;
        let glyph_rarity = dec.get_u8()?;
        dec.finish()?;
        Ok(Self {
            submitted_at_ms,
            proof_commitment,
            stored_proof_bytes,
            glyph_class,
            glyph_rarity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_storage::{
        put_market, put_proof_config, Market, MemStore, ProofConfig,
    };
    use veil_types::consts::{PROOF_TYPE_GROTH16, PROOF_TYPE_PLONK};
    use veil_types::{TxId, ADDRESS_LEN, ID_LEN};

    fn prover() -> Address {
        Address([9; ADDRESS_LEN])
    }

    fn ctx_at(timestamp: i64) -> ExecContext {
        ExecContext::new(timestamp, prover(), TxId([3; ID_LEN]))
    }

    fn setup(store: &mut MemStore) -> SubmitBatchProof {
        let market_id = MarketId([1; ID_LEN]);
        put_market(
            store,
            &market_id,
            &Market {
                status: MARKET_STATUS_ACTIVE,
                outcomes: 2,
                resolution_time: 99_999,
                resolved_outcome: 0,
                question: Vec::new(),
            },
        )
        .unwrap();
        put_proof_config(
            store,
            &ProofConfig {
                require_proof: true,
                required_proof_type: PROOF_TYPE_GROTH16,
                batch_window_ms: 5_000,
                proof_deadline_ms: 10_000,
                prover_authority: prover(),
            },
        )
        .unwrap();

        SubmitBatchProof {
            market_id,
            window_id: 1,
            window_close_at_ms: 5_000,
            proof_type: PROOF_TYPE_GROTH16,
            public_inputs_hash: vec![0x11; 32],
            fills_hash: vec![0x22; 32],
            proof: vec![0xAA, 0xBB, 0xCC],
        }
    }

    #[test]
    fn wire_round_trip() {
        let mut store = MemStore::new();
        let a = setup(&mut store);
        assert_eq!(SubmitBatchProof::decode(&a.encode()).unwrap(), a);
    }

    #[test]
    fn registers_proof_and_mints_glyph() {
        let mut store = MemStore::new();
        let a = setup(&mut store);

        // Permissive mode: no verifier installed in this test process slot.
        let out = a.execute(&mut store, &ctx_at(6_000)).unwrap();
        let result = SubmitBatchProofResult::decode(&out).unwrap();
        assert_eq!(result.submitted_at_ms, 6_000);
        assert_eq!(result.stored_proof_bytes, 3);
        let expected: [u8; 32] = Sha256::digest(&a.proof).into();
        assert_eq!(result.proof_commitment, expected);
        assert!((1..=6).contains(&result.glyph_class));
        assert!((1..=5).contains(&result.glyph_rarity));

        let record =
            storage::get_batch_proof_record(&store, &a.market_id, a.window_id).unwrap();
        assert_eq!(record.prover, prover());
        assert_eq!(record.fills_hash, a.fills_hash);
        assert_eq!(
            storage::get_vellum_proof(&store, &a.market_id, a.window_id).unwrap(),
            a.proof
        );
        let bloodsworn = storage::get_bloodsworn(&store, &prover()).unwrap();
        assert_eq!(bloodsworn.total_accepted_proofs, 1);
        assert_eq!(bloodsworn.active_streak, 1);
        storage::get_glyph(&store, &a.market_id, a.window_id).unwrap();
    }

    #[test]
    fn second_submission_rejected() {
        let mut store = MemStore::new();
        let a = setup(&mut store);
        a.execute(&mut store, &ctx_at(6_000)).unwrap();
        assert_eq!(
            a.execute(&mut store, &ctx_at(6_500)),
            Err(ActionError::State(StateError::ProofAlreadySubmitted))
        );
    }

    #[test]
    fn deadline_window_enforced() {
        let mut store = MemStore::new();
        let a = setup(&mut store);

        // Before the window closes.
        assert_eq!(
            a.execute(&mut store, &ctx_at(4_999)),
            Err(ActionError::State(StateError::ProofDeadlineMissed))
        );
        // Past the deadline.
        assert_eq!(
            a.execute(&mut store, &ctx_at(15_001)),
            Err(ActionError::State(StateError::ProofDeadlineMissed))
        );
        // At the close boundary.
        a.execute(&mut store, &ctx_at(5_000)).unwrap();
    }

    #[test]
    fn window_close_must_align_to_batch_window() {
        let mut store = MemStore::new();
        let mut a = setup(&mut store);
        a.window_close_at_ms = 5_001;
        assert_eq!(
            a.execute(&mut store, &ctx_at(6_000)),
            Err(ActionError::State(StateError::InvalidProofEnvelope))
        );
    }

    #[test]
    fn authority_and_type_enforced() {
        let mut store = MemStore::new();
        let a = setup(&mut store);

        let outsider = ExecContext::new(6_000, Address([8; ADDRESS_LEN]), TxId([3; ID_LEN]));
        assert_eq!(
            a.execute(&mut store, &outsider),
            Err(ActionError::State(StateError::Unauthorized))
        );

        let mut wrong_type = a.clone();
        wrong_type.proof_type = PROOF_TYPE_PLONK;
        assert_eq!(
            wrong_type.execute(&mut store, &ctx_at(6_000)),
            Err(ActionError::State(StateError::ProofTypeMismatch))
        );
    }

    #[test]
    fn input_shape_enforced() {
        let mut store = MemStore::new();
        let base = setup(&mut store);

        let mut a = base.clone();
        a.public_inputs_hash = vec![0x11; 31];
        assert_eq!(
            a.execute(&mut store, &ctx_at(6_000)),
            Err(ActionError::State(StateError::InvalidProofEnvelope))
        );

        let mut a = base.clone();
        a.fills_hash = vec![0x22; 33];
        assert_eq!(
            a.execute(&mut store, &ctx_at(6_000)),
            Err(ActionError::State(StateError::InvalidProofEnvelope))
        );

        let mut a = base;
        a.proof = Vec::new();
        assert_eq!(
            a.execute(&mut store, &ctx_at(6_000)),
            Err(ActionError::State(StateError::InvalidProofEnvelope))
        );
    }
}
