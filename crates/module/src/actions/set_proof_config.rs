//! Governance update of the batch-proof configuration.

use veil_storage::{
    self as storage, proof_config_key, treasury_config_key, ProofConfig, StateError, StateMut,
};
use veil_types::consts::SET_PROOF_CONFIG_ID;
use veil_types::{Address, Decoder, Encoder};

use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetProofConfig {
    pub require_proof: bool,
    pub required_proof_type: u8,
    pub batch_window_ms: i64,
    pub proof_deadline_ms: i64,
    pub prover_authority: Address,
}

impl Action for SetProofConfig {
    const TYPE_ID: u8 = SET_PROOF_CONFIG_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 1 + 1 + 8 + 8 + 33);
        enc.put_u8(Self::TYPE_ID);
        enc.put_bool(self.require_proof);
        enc.put_u8(self.required_proof_type);
        enc.put_i64(self.batch_window_ms);
        enc.put_i64(self.proof_deadline_ms);
        enc.put_address(&self.prover_authority);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let require_proof = dec.get_bool()?;
        let required_proof_type = dec.get_u8()?;
        let batch_window_ms = dec.get_i64()?;
        let proof_deadline_ms = dec.get_i64()?;
        let prover_authority = dec.get_address()?;
        dec.finish()?;
        Ok(Self {
            require_proof,
            required_proof_type,
            batch_window_ms,
            proof_deadline_ms,
            prover_authority,
        })
    }

    fn state_keys(&self, _actor: &Address) -> KeySet {
        KeySet::new()
            .with(treasury_config_key(), Permission::Read)
            .with(proof_config_key(), Permission::ReadWrite)
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        let treasury_cfg = storage::get_treasury_config(store)?;
        if ctx.actor != treasury_cfg.governance {
            return Err(StateError::Unauthorized.into());
        }

        let cfg = ProofConfig {
            require_proof: self.require_proof,
            required_proof_type: self.required_proof_type,
            batch_window_ms: self.batch_window_ms,
            proof_deadline_ms: self.proof_deadline_ms,
            prover_authority: self.prover_authority,
        };
        storage::put_proof_config(store, &cfg)?;

        Ok(SetProofConfigResult {
            require_proof: cfg.require_proof,
            required_proof_type: cfg.required_proof_type,
            batch_window_ms: cfg.batch_window_ms,
            proof_deadline_ms: cfg.proof_deadline_ms,
            prover_authority: cfg.prover_authority,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetProofConfigResult {
    pub require_proof: bool,
    pub required_proof_type: u8,
    pub batch_window_ms: i64,
    pub proof_deadline_ms: i64,
    pub prover_authority: Address,
}

impl SetProofConfigResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 1 + 1 + 8 + 8 + 33);
        enc.put_u8(SET_PROOF_CONFIG_ID);
        enc.put_bool(self.require_proof);
        enc.put_u8(self.required_proof_type);
        enc.put_i64(self.batch_window_ms);
        enc.put_i64(self.proof_deadline_ms);
        enc.put_address(&self.prover_authority);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(SET_PROOF_CONFIG_ID)?;
        let require_proof = dec.get_bool()?;
        let required_proof_type = dec.get_u8()?;
        let batch_window_ms = dec.get_i64()?;
        let proof_deadline_ms = dec.get_i64()?;
        let prover_authority = dec.get_address()?;
        dec.finish()?;
        Ok(Self {
            require_proof,
            required_proof_type,
            batch_window_ms,
            proof_deadline_ms,
            prover_authority,
        })
    }
}
