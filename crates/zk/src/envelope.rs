//! Self-describing proof envelopes.
//!
//! Two canonical layouts, both big-endian:
//!
//! - V1 (`VZK1`): `magic(4) ‖ proof_type(1) ‖ proof_len(u32) ‖ witness_len(u32)
//!   ‖ proof ‖ public_witness`
//! - V2 (`VZK2`): `magic(4) ‖ proof_type(1) ‖ circuit_len(1) ‖ proof_len(u32)
//!   ‖ witness_len(u32) ‖ circuit_id ‖ proof ‖ public_witness`
//!
//! Anything not starting with a recognized magic is treated as a legacy raw
//! proof blob with no type or witness metadata.

use veil_storage::StateError;

pub const ENVELOPE_MAGIC_V1: &[u8; 4] = b"VZK1";
pub const ENVELOPE_MAGIC_V2: &[u8; 4] = b"VZK2";

const V1_HEADER_LEN: usize = 13;
const V2_HEADER_LEN: usize = 14;

pub const MAX_CIRCUIT_ID_LEN: usize = 63;
pub const MAX_PROOF_BYTES: usize = 131_072;

/// Parsed proof payload. The three variants share the downstream verifier
/// interface; the distinction is purely in parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofEnvelope {
    V1 {
        proof_type: u8,
        proof: Vec<u8>,
        witness: Vec<u8>,
    },
    V2 {
        proof_type: u8,
        circuit_id: String,
        proof: Vec<u8>,
        witness: Vec<u8>,
    },
    Raw(Vec<u8>),
}

impl ProofEnvelope {
    /// Parse a proof blob. Unrecognized magic bytes fall back to `Raw`.
    pub fn parse(blob: &[u8]) -> Result<Self, StateError> {
        if blob.len() < ENVELOPE_MAGIC_V1.len() {
            return Ok(Self::Raw(blob.to_vec()));
        }
        match &blob[..4] {
            m if m == ENVELOPE_MAGIC_V1 => parse_v1(blob),
            m if m == ENVELOPE_MAGIC_V2 => parse_v2(blob),
            _ => Ok(Self::Raw(blob.to_vec())),
        }
    }

    pub fn has_envelope(&self) -> bool {
        !matches!(self, Self::Raw(_))
    }

    /// Declared proof type; legacy raw blobs carry none.
    pub fn proof_type(&self) -> Option<u8> {
        match self {
            Self::V1 { proof_type, .. } | Self::V2 { proof_type, .. } => Some(*proof_type),
            Self::Raw(_) => None,
        }
    }

    /// Declared circuit id; empty for V1 and raw payloads.
    pub fn circuit_id(&self) -> &str {
        match self {
            Self::V2 { circuit_id, .. } => circuit_id,
            _ => "",
        }
    }

    pub fn proof_bytes(&self) -> &[u8] {
        match self {
            Self::V1 { proof, .. } | Self::V2 { proof, .. } => proof,
            Self::Raw(blob) => blob,
        }
    }

    pub fn witness(&self) -> Option<&[u8]> {
        match self {
            Self::V1 { witness, .. } | Self::V2 { witness, .. } => Some(witness),
            Self::Raw(_) => None,
        }
    }
}

fn parse_v1(blob: &[u8]) -> Result<ProofEnvelope, StateError> {
    if blob.len() < V1_HEADER_LEN {
        return Err(StateError::InvalidProofEnvelope);
    }
    let proof_type = blob[4];
    let proof_len = u32::from_be_bytes([blob[5], blob[6], blob[7], blob[8]]) as usize;
    let witness_len = u32::from_be_bytes([blob[9], blob[10], blob[11], blob[12]]) as usize;
    if proof_len == 0 || witness_len == 0 {
        return Err(StateError::InvalidProofEnvelope);
    }
    let total_len = V1_HEADER_LEN
        .checked_add(proof_len)
        .and_then(|n| n.checked_add(witness_len))
        .ok_or(StateError::InvalidProofEnvelope)?;
    if blob.len() != total_len {
        return Err(StateError::InvalidProofEnvelope);
    }
    let proof_end = V1_HEADER_LEN + proof_len;
    Ok(ProofEnvelope::V1 {
        proof_type,
        proof: blob[V1_HEADER_LEN..proof_end].to_vec(),
        witness: blob[proof_end..].to_vec(),
    })
}

fn parse_v2(blob: &[u8]) -> Result<ProofEnvelope, StateError> {
    if blob.len() < V2_HEADER_LEN {
        return Err(StateError::InvalidProofEnvelope);
    }
    let proof_type = blob[4];
    let circuit_len = blob[5] as usize;
    let proof_len = u32::from_be_bytes([blob[6], blob[7], blob[8], blob[9]]) as usize;
    let witness_len = u32::from_be_bytes([blob[10], blob[11], blob[12], blob[13]]) as usize;
    if circuit_len == 0 || circuit_len > MAX_CIRCUIT_ID_LEN || proof_len == 0 || witness_len == 0
    {
        return Err(StateError::InvalidProofEnvelope);
    }
    let total_len = V2_HEADER_LEN
        .checked_add(circuit_len)
        .and_then(|n| n.checked_add(proof_len))
        .and_then(|n| n.checked_add(witness_len))
        .ok_or(StateError::InvalidProofEnvelope)?;
    if blob.len() != total_len {
        return Err(StateError::InvalidProofEnvelope);
    }
    let circuit_end = V2_HEADER_LEN + circuit_len;
    let circuit_id = std::str::from_utf8(&blob[V2_HEADER_LEN..circuit_end])
        .map_err(|_| StateError::InvalidProofEnvelope)?
        .to_string();
    if !is_valid_circuit_id(&circuit_id) {
        return Err(StateError::InvalidProofEnvelope);
    }
    let proof_end = circuit_end + proof_len;
    Ok(ProofEnvelope::V2 {
        proof_type,
        circuit_id,
        proof: blob[circuit_end..proof_end].to_vec(),
        witness: blob[proof_end..].to_vec(),
    })
}

/// Build a canonical V1 proof payload.
pub fn build_proof_envelope(
    proof_type: u8,
    proof: &[u8],
    public_witness: &[u8],
) -> Result<Vec<u8>, StateError> {
    if proof_type == 0 || proof.is_empty() || proof.len() > MAX_PROOF_BYTES {
        return Err(StateError::InvalidProofEnvelope);
    }
    if public_witness.is_empty() {
        return Err(StateError::InvalidProofEnvelope);
    }
    if V1_HEADER_LEN + proof.len() + public_witness.len() > MAX_PROOF_BYTES {
        return Err(StateError::InvalidProofEnvelope);
    }

    let mut out = Vec::with_capacity(V1_HEADER_LEN + proof.len() + public_witness.len());
    out.extend_from_slice(ENVELOPE_MAGIC_V1);
    out.push(proof_type);
    out.extend_from_slice(&(proof.len() as u32).to_be_bytes());
    out.extend_from_slice(&(public_witness.len() as u32).to_be_bytes());
    out.extend_from_slice(proof);
    out.extend_from_slice(public_witness);
    Ok(out)
}

/// Build a V2 proof payload carrying a circuit identifier.
pub fn build_proof_envelope_with_circuit(
    proof_type: u8,
    circuit_id: &str,
    proof: &[u8],
    public_witness: &[u8],
) -> Result<Vec<u8>, StateError> {
    let circuit_id = circuit_id.trim();
    if proof_type == 0 || proof.is_empty() || proof.len() > MAX_PROOF_BYTES {
        return Err(StateError::InvalidProofEnvelope);
    }
    if public_witness.is_empty() {
        return Err(StateError::InvalidProofEnvelope);
    }
    if !is_valid_circuit_id(circuit_id) {
        return Err(StateError::InvalidProofEnvelope);
    }
    let total_len = V2_HEADER_LEN + circuit_id.len() + proof.len() + public_witness.len();
    if total_len > MAX_PROOF_BYTES {
        return Err(StateError::InvalidProofEnvelope);
    }

    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(ENVELOPE_MAGIC_V2);
    out.push(proof_type);
    out.push(circuit_id.len() as u8);
    out.extend_from_slice(&(proof.len() as u32).to_be_bytes());
    out.extend_from_slice(&(public_witness.len() as u32).to_be_bytes());
    out.extend_from_slice(circuit_id.as_bytes());
    out.extend_from_slice(proof);
    out.extend_from_slice(public_witness);
    Ok(out)
}

fn is_valid_circuit_id(circuit_id: &str) -> bool {
    if circuit_id.is_empty() || circuit_id.len() > MAX_CIRCUIT_ID_LEN {
        return false;
    }
    circuit_id
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'-' | b'_' | b'.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_types::consts::{PROOF_CIRCUIT_CLEAR_HASH_V1, PROOF_TYPE_GROTH16};

    #[test]
    fn v1_round_trip() {
        let proof = vec![1, 2, 3, 4];
        let witness = vec![9, 8, 7];
        let blob = build_proof_envelope(PROOF_TYPE_GROTH16, &proof, &witness).unwrap();

        let parsed = ProofEnvelope::parse(&blob).unwrap();
        assert!(parsed.has_envelope());
        assert_eq!(parsed.proof_type(), Some(PROOF_TYPE_GROTH16));
        assert_eq!(parsed.circuit_id(), "");
        assert_eq!(parsed.proof_bytes(), proof.as_slice());
        assert_eq!(parsed.witness(), Some(witness.as_slice()));
    }

    #[test]
    fn v2_round_trip() {
        let proof = vec![1, 2, 3, 4];
        let witness = vec![9, 8, 7];
        let blob = build_proof_envelope_with_circuit(
            PROOF_TYPE_GROTH16,
            PROOF_CIRCUIT_CLEAR_HASH_V1,
            &proof,
            &witness,
        )
        .unwrap();

        let parsed = ProofEnvelope::parse(&blob).unwrap();
        assert!(parsed.has_envelope());
        assert_eq!(parsed.proof_type(), Some(PROOF_TYPE_GROTH16));
        assert_eq!(parsed.circuit_id(), PROOF_CIRCUIT_CLEAR_HASH_V1);
        assert_eq!(parsed.proof_bytes(), proof.as_slice());
        assert_eq!(parsed.witness(), Some(witness.as_slice()));
    }

    #[test]
    fn short_buffer_is_legacy_raw() {
        let raw = [0xAA, 0xBB, 0xCC];
        let parsed = ProofEnvelope::parse(&raw).unwrap();
        assert!(!parsed.has_envelope());
        assert_eq!(parsed.proof_type(), None);
        assert_eq!(parsed.circuit_id(), "");
        assert_eq!(parsed.proof_bytes(), &raw);
        assert_eq!(parsed.witness(), None);
    }

    #[test]
    fn unknown_magic_is_legacy_raw() {
        let raw = b"NOPE-not-an-envelope".to_vec();
        let parsed = ProofEnvelope::parse(&raw).unwrap();
        assert_eq!(parsed, ProofEnvelope::Raw(raw));
    }

    #[test]
    fn v1_length_must_match_exactly() {
        let mut blob =
            build_proof_envelope(PROOF_TYPE_GROTH16, &[1, 2, 3], &[4, 5]).unwrap();
        blob.push(0);
        assert_eq!(
            ProofEnvelope::parse(&blob),
            Err(StateError::InvalidProofEnvelope)
        );
    }

    #[test]
    fn v1_rejects_zero_lengths() {
        let mut blob = Vec::new();
        blob.extend_from_slice(ENVELOPE_MAGIC_V1);
        blob.push(PROOF_TYPE_GROTH16);
        blob.extend_from_slice(&0u32.to_be_bytes());
        blob.extend_from_slice(&1u32.to_be_bytes());
        blob.push(7);
        assert_eq!(
            ProofEnvelope::parse(&blob),
            Err(StateError::InvalidProofEnvelope)
        );
    }

    #[test]
    fn v2_rejects_bad_circuit_ids() {
        assert!(build_proof_envelope_with_circuit(
            PROOF_TYPE_GROTH16,
            "bad*id",
            &[1],
            &[2]
        )
        .is_err());
        assert!(build_proof_envelope_with_circuit(PROOF_TYPE_GROTH16, "", &[1], &[2]).is_err());
        assert!(build_proof_envelope_with_circuit(
            PROOF_TYPE_GROTH16,
            &"x".repeat(MAX_CIRCUIT_ID_LEN + 1),
            &[1],
            &[2]
        )
        .is_err());
        // Uppercase is outside the circuit-id charset.
        assert!(
            build_proof_envelope_with_circuit(PROOF_TYPE_GROTH16, "Clearhash", &[1], &[2])
                .is_err()
        );
    }

    #[test]
    fn builders_reject_oversized_payloads() {
        let big = vec![0u8; MAX_PROOF_BYTES + 1];
        assert!(build_proof_envelope(PROOF_TYPE_GROTH16, &big, &[1]).is_err());
        let near = vec![0u8; MAX_PROOF_BYTES - 4];
        assert!(build_proof_envelope(PROOF_TYPE_GROTH16, &near, &[0u8; 32]).is_err());
        assert!(build_proof_envelope(0, &[1], &[2]).is_err());
        assert!(build_proof_envelope(PROOF_TYPE_GROTH16, &[1], &[]).is_err());
    }
}
