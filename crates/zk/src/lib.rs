//! Zero-knowledge proof plumbing for batch clearing.
//!
//! This crate carries the consensus-critical proof surface:
//!
//! - Self-describing proof envelopes (`VZK1`, `VZK2`, legacy raw)
//! - The canonical domain-separated public-input binding
//! - The process-wide verifier handle and fail-closed policy
//! - The Groth16/BN254 backend and the BN254 witness digest binding

pub mod envelope;
pub mod inputs;
pub mod options;
pub mod snark;
pub mod verifier;

pub use envelope::{
    build_proof_envelope, build_proof_envelope_with_circuit, ProofEnvelope, MAX_CIRCUIT_ID_LEN,
    MAX_PROOF_BYTES,
};
pub use inputs::{
    build_clear_public_inputs_preimage, build_shielded_ledger_public_inputs_preimage,
    compute_clear_public_inputs_hash, compute_expected_public_inputs_hash,
    compute_shielded_ledger_public_inputs_hash, CLEAR_INPUTS_DOMAIN_TAG,
    EXPECTED_FILLS_HASH_LEN, SHIELDED_LEDGER_INPUTS_DOMAIN_TAG,
};
pub use options::{install_batch_proof_verifier, resolve_zk_options, ZkVerifierOptions};
pub use snark::{
    encode_public_witness, PlonkBackend, SnarkVerifier, SnarkVerifierConfig, VerifierSetupError,
};
pub use verifier::{
    batch_proof_verifier, configure_batch_proof_verifier, verify_in_consensus, BatchProofVerifier,
};
