//! Batch clearing, the terminal transition of a window.
//!
//! In proof-gated mode the clear re-derives the canonical public-input hash
//! from its own inputs and re-runs the verifier, so no cleared batch exists
//! without a verifier-accepted proof over the exact
//! `(market, window, price, volume, fills)` tuple.

use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use veil_storage::{
    self as storage, batch_key, batch_proof_key, market_key, proof_config_key, vellum_proof_key,
    BatchResult, StateError, StateMut,
};
use veil_types::consts::{CLEAR_BATCH_ID, MARKET_STATUS_ACTIVE};
use veil_types::{Address, Decoder, Encoder, MarketId};
use veil_zk::{compute_expected_public_inputs_hash, verify_in_consensus, ProofEnvelope};

use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};
use crate::metrics;

pub const MAX_FILLS_HASH_SIZE: usize = 64;
pub const EXPECTED_FILLS_HASH_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearBatch {
    pub market_id: MarketId,
    pub window_id: u64,
    pub clear_price: u64,
    pub total_volume: u64,
    pub fills_hash: Vec<u8>,
}

impl Action for ClearBatch {
    const TYPE_ID: u8 = CLEAR_BATCH_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc =
            Encoder::with_capacity(1 + 32 + 8 + 8 + 8 + 4 + self.fills_hash.len());
        enc.put_u8(Self::TYPE_ID);
        enc.put_id(&self.market_id);
        enc.put_u64(self.window_id);
        enc.put_u64(self.clear_price);
        enc.put_u64(self.total_volume);
        enc.put_bytes(&self.fills_hash);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let market_id = dec.get_id()?;
        let window_id = dec.get_u64()?;
        let clear_price = dec.get_u64()?;
        let total_volume = dec.get_u64()?;
        let fills_hash = dec.get_bytes(MAX_FILLS_HASH_SIZE)?;
        dec.finish()?;
        Ok(Self {
            market_id,
            window_id,
            clear_price,
            total_volume,
            fills_hash,
        })
    }

    fn state_keys(&self, _actor: &Address) -> KeySet {
        KeySet::new()
            .with(market_key(&self.market_id), Permission::Read)
            .with(batch_key(&self.market_id, self.window_id), Permission::All)
            .with(proof_config_key(), Permission::Read)
            .with(
                batch_proof_key(&self.market_id, self.window_id),
                Permission::Read,
            )
            .with(
                vellum_proof_key(&self.market_id, self.window_id),
                Permission::Read,
            )
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        let start = Instant::now();
        let mut missed_deadline = false;
        let mut verify_duration = Duration::ZERO;
        let mut accepted_at_ms = 0;
        let result = self.apply(
            store,
            ctx,
            &mut missed_deadline,
            &mut verify_duration,
            &mut accepted_at_ms,
        );
        metrics::collector().record_clear(
            &self.market_id,
            self.window_id,
            accepted_at_ms,
            verify_duration,
            start.elapsed(),
            missed_deadline,
            result.as_ref().err().map(|e| e.to_string()).as_deref(),
        );
        result
    }
}

impl ClearBatch {
    fn apply(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
        missed_deadline: &mut bool,
        verify_duration: &mut Duration,
        accepted_at_ms: &mut i64,
    ) -> Result<Vec<u8>, ActionError> {
        if self.clear_price == 0 {
            return Err(ActionError::ClearPriceZero);
        }
        if self.fills_hash.is_empty() {
            return Err(ActionError::FillsHashEmpty);
        }
        if self.fills_hash.len() > MAX_FILLS_HASH_SIZE {
            return Err(ActionError::FillsHashTooLarge);
        }
        if self.fills_hash.len() != EXPECTED_FILLS_HASH_SIZE {
            return Err(ActionError::FillsHashWrongSize);
        }

        let market = storage::get_market(store, &self.market_id)?;
        if market.status != MARKET_STATUS_ACTIVE {
            return Err(StateError::MarketNotActive.into());
        }

        let proof_cfg = storage::get_proof_config(store)?;
        if proof_cfg.require_proof {
            // In proof-gated mode only the configured authority may finalize
            // clears.
            if ctx.actor != proof_cfg.prover_authority {
                return Err(StateError::Unauthorized.into());
            }

            let verify_start = Instant::now();

            let record =
                storage::get_batch_proof_record(store, &self.market_id, self.window_id)?;
            if record.proof_type != proof_cfg.required_proof_type {
                *verify_duration = verify_start.elapsed();
                return Err(StateError::ProofTypeMismatch.into());
            }
            if record.submitted_at_ms > record.window_close_at_ms + proof_cfg.proof_deadline_ms {
                *missed_deadline = true;
                *verify_duration = verify_start.elapsed();
                return Err(StateError::ProofDeadlineMissed.into());
            }
            if record.fills_hash != self.fills_hash {
                *verify_duration = verify_start.elapsed();
                return Err(StateError::ProofFillsMismatch.into());
            }

            let proof_bytes =
                storage::get_vellum_proof(store, &self.market_id, self.window_id)?;
            let commitment: [u8; 32] = Sha256::digest(&proof_bytes).into();
            if commitment != record.proof_commitment {
                *verify_duration = verify_start.elapsed();
                return Err(StateError::ProofCommitmentMismatch.into());
            }

            let envelope = ProofEnvelope::parse(&proof_bytes)?;
            let expected_inputs_hash = compute_expected_public_inputs_hash(
                envelope.circuit_id(),
                &self.market_id,
                self.window_id,
                self.clear_price,
                self.total_volume,
                &self.fills_hash,
            )?;
            if record.public_inputs_hash != expected_inputs_hash {
                *verify_duration = verify_start.elapsed();
                return Err(StateError::ProofPublicInputsMismatch.into());
            }

            // The strong consensus check: re-run the verifier against the
            // recomputed binding.
            let verified = verify_in_consensus(
                record.proof_type,
                &proof_bytes,
                &expected_inputs_hash,
            );
            *verify_duration = verify_start.elapsed();
            verified?;
        }

        storage::put_batch_result(
            store,
            &self.market_id,
            self.window_id,
            &BatchResult {
                clear_price: self.clear_price,
                total_volume: self.total_volume,
                fills_hash: self.fills_hash.clone(),
            },
        )?;
        *accepted_at_ms = ctx.timestamp;

        Ok(ClearBatchResult {
            clear_price: self.clear_price,
            total_volume: self.total_volume,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearBatchResult {
    pub clear_price: u64,
    pub total_volume: u64,
}

impl ClearBatchResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 16);
        enc.put_u8(CLEAR_BATCH_ID);
        enc.put_u64(self.clear_price);
        enc.put_u64(self.total_volume);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(CLEAR_BATCH_ID)?;
        let clear_price = dec.get_u64()?;
        let total_volume = dec.get_u64()?;
        dec.finish()?;
        Ok(Self {
            clear_price,
            total_volume,
        })
    }
}
