//! Process-wide verifier handle and the consensus verification policy.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use veil_storage::StateError;

use crate::envelope::ProofEnvelope;

/// Consensus-critical proof verification.
///
/// Implementations must be safe for concurrent `verify` calls; verifying-key
/// material is read-only after load.
pub trait BatchProofVerifier: Send + Sync {
    fn verify(
        &self,
        proof_type: u8,
        circuit_id: &str,
        proof: &[u8],
        public_inputs_hash: &[u8],
        public_witness: Option<&[u8]>,
    ) -> Result<(), StateError>;
}

#[derive(Clone, Default)]
struct VerifierHandle {
    verifier: Option<Arc<dyn BatchProofVerifier>>,
    strict: bool,
}

static VERIFIER: Lazy<RwLock<VerifierHandle>> =
    Lazy::new(|| RwLock::new(VerifierHandle::default()));

/// Install or clear the process-wide proof verifier.
///
/// With `strict` and no verifier, proof-gated paths fail closed.
pub fn configure_batch_proof_verifier(
    verifier: Option<Arc<dyn BatchProofVerifier>>,
    strict: bool,
) {
    let mut handle = VERIFIER.write();
    handle.verifier = verifier;
    handle.strict = strict;
}

/// Current verifier handle (shared read lock).
pub fn batch_proof_verifier() -> (Option<Arc<dyn BatchProofVerifier>>, bool) {
    let handle = VERIFIER.read();
    (handle.verifier.clone(), handle.strict)
}

/// Consensus policy for a proof blob against the required proof type.
///
/// Enveloped payloads must declare the required type; legacy raw blobs carry
/// no type to compare and skip that check. Absent a verifier the call
/// succeeds unless strict mode is on. Any backend failure other than
/// unavailability surfaces as `ProofVerificationFailed` wrapping the cause.
pub fn verify_in_consensus(
    required_proof_type: u8,
    proof_blob: &[u8],
    public_inputs_hash: &[u8],
) -> Result<(), StateError> {
    let envelope = ProofEnvelope::parse(proof_blob)?;
    if envelope.has_envelope() && envelope.proof_type() != Some(required_proof_type) {
        return Err(StateError::ProofTypeMismatch);
    }

    let (verifier, strict) = batch_proof_verifier();
    let verifier = match verifier {
        Some(verifier) => verifier,
        None if strict => return Err(StateError::ProofVerifierUnavailable),
        None => return Ok(()),
    };

    match verifier.verify(
        required_proof_type,
        envelope.circuit_id(),
        envelope.proof_bytes(),
        public_inputs_hash,
        envelope.witness(),
    ) {
        Ok(()) => Ok(()),
        Err(StateError::ProofVerifierUnavailable) => Err(StateError::ProofVerifierUnavailable),
        Err(err) => Err(StateError::ProofVerificationFailed(err.to_string())),
    }
}
