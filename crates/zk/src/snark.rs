//! SNARK verification backends over BN254.
//!
//! Groth16 is verified natively. PLONK shares the wire surface and the
//! digest binding but delegates to a registered [`PlonkBackend`]; without
//! one the arm fails closed.

use std::fs;
use std::sync::Arc;

use ark_bn254::{Bn254, Fr};
use ark_ff::{BigInteger, PrimeField};
use ark_groth16::{prepare_verifying_key, Groth16, PreparedVerifyingKey, Proof, VerifyingKey};
use ark_serialize::CanonicalDeserialize;
use thiserror::Error;

use veil_storage::StateError;
use veil_types::consts::{
    PROOF_CIRCUIT_CLEAR_HASH_V1, PROOF_CIRCUIT_SHIELDED_LEDGER_V1, PROOF_TYPE_GROTH16,
    PROOF_TYPE_PLONK,
};

use crate::verifier::BatchProofVerifier;

/// Digest length accepted by the per-byte witness shape.
const DIGEST_WITNESS_LEN: usize = 32;

const FIELD_ELEMENT_LEN: usize = 32;

/// Errors raised while constructing a verifier at startup.
#[derive(Debug, Error)]
pub enum VerifierSetupError {
    #[error("failed to read verifying key: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid verifying key: {0}")]
    InvalidVerifyingKey(String),

    #[error("no verifying key configured")]
    Unavailable,

    #[error("unsupported required circuit id: {0}")]
    UnsupportedCircuit(String),

    #[error("plonk verifying key configured but no plonk backend is registered")]
    PlonkBackendUnavailable,
}

/// External PLONK verification backend.
///
/// The public-input vector handed over has already passed the digest
/// binding against the canonical public-inputs hash.
pub trait PlonkBackend: Send + Sync {
    fn verify(
        &self,
        circuit_id: &str,
        proof: &[u8],
        public_inputs: &[Fr],
    ) -> Result<(), StateError>;
}

#[derive(Debug, Clone, Default)]
pub struct SnarkVerifierConfig {
    pub groth16_verifying_key_path: String,
    pub plonk_verifying_key_path: String,
    pub required_circuit_id: String,
}

/// Verifier over BN254 backed by arkworks Groth16 and an optional PLONK
/// backend.
pub struct SnarkVerifier {
    groth16_vk: Option<PreparedVerifyingKey<Bn254>>,
    plonk: Option<Arc<dyn PlonkBackend>>,
    required_circuit_id: String,
}

impl SnarkVerifier {
    pub fn new(cfg: SnarkVerifierConfig) -> Result<Self, VerifierSetupError> {
        let groth16_vk = match cfg.groth16_verifying_key_path.trim() {
            "" => None,
            path => Some(load_groth16_vk(&fs::read(path)?)?),
        };
        if !cfg.plonk_verifying_key_path.trim().is_empty() {
            return Err(VerifierSetupError::PlonkBackendUnavailable);
        }
        Self::from_parts(groth16_vk, None, &cfg.required_circuit_id)
    }

    /// Build a verifier from verifying-key bytes already in memory.
    pub fn from_groth16_vk_bytes(
        vk_bytes: &[u8],
        required_circuit_id: &str,
    ) -> Result<Self, VerifierSetupError> {
        Self::from_parts(Some(load_groth16_vk(vk_bytes)?), None, required_circuit_id)
    }

    /// Register a PLONK backend for proof type 2.
    pub fn with_plonk_backend(mut self, backend: Arc<dyn PlonkBackend>) -> Self {
        self.plonk = Some(backend);
        self
    }

    fn from_parts(
        groth16_vk: Option<PreparedVerifyingKey<Bn254>>,
        plonk: Option<Arc<dyn PlonkBackend>>,
        required_circuit_id: &str,
    ) -> Result<Self, VerifierSetupError> {
        if groth16_vk.is_none() && plonk.is_none() {
            return Err(VerifierSetupError::Unavailable);
        }
        let required_circuit_id = required_circuit_id.trim().to_string();
        if !required_circuit_id.is_empty() && !is_supported_circuit_id(&required_circuit_id) {
            return Err(VerifierSetupError::UnsupportedCircuit(required_circuit_id));
        }
        Ok(Self {
            groth16_vk,
            plonk,
            required_circuit_id,
        })
    }
}

impl BatchProofVerifier for SnarkVerifier {
    fn verify(
        &self,
        proof_type: u8,
        circuit_id: &str,
        proof: &[u8],
        public_inputs_hash: &[u8],
        public_witness: Option<&[u8]>,
    ) -> Result<(), StateError> {
        let circuit_id = normalize_circuit_id(circuit_id);
        if !self.required_circuit_id.is_empty() && circuit_id != self.required_circuit_id {
            return Err(StateError::ProofCircuitMismatch);
        }
        if !is_supported_circuit_id(circuit_id) {
            return Err(StateError::UnsupportedProofCircuit);
        }

        let inputs = build_public_input_vector(public_inputs_hash, public_witness)?;
        match proof_type {
            PROOF_TYPE_GROTH16 => {
                let vk = self
                    .groth16_vk
                    .as_ref()
                    .ok_or(StateError::ProofVerifierUnavailable)?;
                verify_groth16(vk, proof, &inputs)
            }
            PROOF_TYPE_PLONK => {
                let backend = self
                    .plonk
                    .as_ref()
                    .ok_or(StateError::ProofVerifierUnavailable)?;
                backend.verify(circuit_id, proof, &inputs)
            }
            _ => Err(StateError::ProofTypeMismatch),
        }
    }
}

fn load_groth16_vk(vk_bytes: &[u8]) -> Result<PreparedVerifyingKey<Bn254>, VerifierSetupError> {
    let vk = VerifyingKey::<Bn254>::deserialize_compressed(vk_bytes)
        .map_err(|err| VerifierSetupError::InvalidVerifyingKey(err.to_string()))?;
    Ok(prepare_verifying_key(&vk))
}

fn verify_groth16(
    vk: &PreparedVerifyingKey<Bn254>,
    proof_bytes: &[u8],
    public_inputs: &[Fr],
) -> Result<(), StateError> {
    let proof = Proof::<Bn254>::deserialize_compressed(proof_bytes)
        .map_err(|err| StateError::ProofVerificationFailed(err.to_string()))?;
    let accepted = Groth16::<Bn254>::verify_proof(vk, &proof, public_inputs)
        .map_err(|err| StateError::ProofVerificationFailed(err.to_string()))?;
    if !accepted {
        return Err(StateError::ProofVerificationFailed(
            "groth16 pairing check rejected the proof".to_string(),
        ));
    }
    Ok(())
}

/// Decode the public witness and bind it to the public-inputs digest.
fn build_public_input_vector(
    public_inputs_hash: &[u8],
    public_witness: Option<&[u8]>,
) -> Result<Vec<Fr>, StateError> {
    let witness_bytes = public_witness.ok_or(StateError::InvalidProofEnvelope)?;
    let vec = parse_public_witness(witness_bytes)?;
    validate_digest_vector(public_inputs_hash, &vec)?;
    Ok(vec)
}

/// Canonical witness encoding: `count(u32 BE) ‖ count × 32-byte BE scalars`.
fn parse_public_witness(bytes: &[u8]) -> Result<Vec<Fr>, StateError> {
    if bytes.len() < 4 {
        return Err(StateError::InvalidProofEnvelope);
    }
    let count = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    if count == 0 || bytes.len() != 4 + count * FIELD_ELEMENT_LEN {
        return Err(StateError::InvalidProofEnvelope);
    }
    let mut vec = Vec::with_capacity(count);
    for chunk in bytes[4..].chunks_exact(FIELD_ELEMENT_LEN) {
        vec.push(fr_from_canonical_be(chunk)?);
    }
    Ok(vec)
}

/// Serialize field elements into the canonical witness encoding.
pub fn encode_public_witness(elements: &[Fr]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + elements.len() * FIELD_ELEMENT_LEN);
    out.extend_from_slice(&(elements.len() as u32).to_be_bytes());
    for el in elements {
        out.extend_from_slice(&el.into_bigint().to_bytes_be());
    }
    out
}

fn fr_from_canonical_be(bytes: &[u8]) -> Result<Fr, StateError> {
    let el = Fr::from_be_bytes_mod_order(bytes);
    if el.into_bigint().to_bytes_be() != bytes {
        return Err(StateError::InvalidProofEnvelope);
    }
    Ok(el)
}

fn hash_to_field_element(public_inputs_hash: &[u8]) -> Result<Fr, StateError> {
    if public_inputs_hash.is_empty() {
        return Err(StateError::InvalidProofEnvelope);
    }
    Ok(Fr::from_be_bytes_mod_order(public_inputs_hash))
}

/// Two accepted shapes: a single scalar equal to the digest reduced into the
/// field, or 32 elements each equal to the corresponding digest byte.
fn validate_digest_vector(public_inputs_hash: &[u8], vec: &[Fr]) -> Result<(), StateError> {
    match vec.len() {
        1 => {
            let expected = hash_to_field_element(public_inputs_hash)?;
            if vec[0] != expected {
                return Err(StateError::ProofPublicInputsMismatch);
            }
            Ok(())
        }
        DIGEST_WITNESS_LEN => {
            if public_inputs_hash.len() != DIGEST_WITNESS_LEN {
                return Err(StateError::InvalidProofEnvelope);
            }
            for (el, byte) in vec.iter().zip(public_inputs_hash.iter()) {
                if *el != Fr::from(*byte as u64) {
                    return Err(StateError::ProofPublicInputsMismatch);
                }
            }
            Ok(())
        }
        _ => Err(StateError::InvalidProofEnvelope),
    }
}

fn normalize_circuit_id(circuit_id: &str) -> &str {
    let circuit_id = circuit_id.trim();
    if circuit_id.is_empty() {
        // VZK1 envelopes carry no circuit metadata.
        PROOF_CIRCUIT_CLEAR_HASH_V1
    } else {
        circuit_id
    }
}

fn is_supported_circuit_id(circuit_id: &str) -> bool {
    matches!(
        circuit_id,
        PROOF_CIRCUIT_CLEAR_HASH_V1 | PROOF_CIRCUIT_SHIELDED_LEDGER_V1
    )
}
