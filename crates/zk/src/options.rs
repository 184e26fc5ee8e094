//! Startup configuration for the proof verifier.
//!
//! Operator JSON config with environment-variable overrides. Resolution also
//! applies the local fallback rule: when the verifier is disabled with no
//! key paths but the well-known Groth16 fixture exists on disk, fail closed
//! by default.

use std::env;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::snark::{SnarkVerifier, SnarkVerifierConfig, VerifierSetupError};
use crate::verifier::configure_batch_proof_verifier;

const DEFAULT_LOCAL_GROTH16_VK_PATH: &str = "/var/lib/veil/zk/groth16_clearhash_vk.bin";

const ENV_ENABLED: &str = "VEIL_ZK_VERIFIER_ENABLED";
const ENV_STRICT: &str = "VEIL_ZK_VERIFIER_STRICT";
const ENV_GROTH16_VK_PATH: &str = "VEIL_ZK_GROTH16_VK_PATH";
const ENV_PLONK_VK_PATH: &str = "VEIL_ZK_PLONK_VK_PATH";
const ENV_REQUIRED_CIRCUIT_ID: &str = "VEIL_ZK_REQUIRED_CIRCUIT_ID";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZkVerifierOptions {
    pub enabled: bool,
    pub strict: bool,
    pub groth16_verifying_key_path: String,
    pub plonk_verifying_key_path: String,
    pub required_circuit_id: String,
}

/// Apply environment overrides and the local fallback rule.
pub fn resolve_zk_options(mut opts: ZkVerifierOptions) -> ZkVerifierOptions {
    if let Some(v) = env_bool(ENV_ENABLED) {
        opts.enabled = v;
    }
    if let Some(v) = env_bool(ENV_STRICT) {
        opts.strict = v;
    }
    if let Ok(v) = env::var(ENV_GROTH16_VK_PATH) {
        opts.groth16_verifying_key_path = v;
    }
    if let Ok(v) = env::var(ENV_PLONK_VK_PATH) {
        opts.plonk_verifying_key_path = v;
    }
    if let Ok(v) = env::var(ENV_REQUIRED_CIRCUIT_ID) {
        opts.required_circuit_id = v;
    }

    if !opts.enabled
        && opts.groth16_verifying_key_path.trim().is_empty()
        && opts.plonk_verifying_key_path.trim().is_empty()
        && Path::new(DEFAULT_LOCAL_GROTH16_VK_PATH).exists()
    {
        opts.enabled = true;
        opts.strict = true;
        opts.groth16_verifying_key_path = DEFAULT_LOCAL_GROTH16_VK_PATH.to_string();
        if opts.required_circuit_id.trim().is_empty() {
            opts.required_circuit_id =
                veil_types::consts::PROOF_CIRCUIT_CLEAR_HASH_V1.to_string();
        }
    }
    opts
}

/// Build and install the process-wide verifier from resolved options.
pub fn install_batch_proof_verifier(
    opts: &ZkVerifierOptions,
) -> Result<(), VerifierSetupError> {
    info!(
        enabled = opts.enabled,
        strict = opts.strict,
        groth16_vk_set = !opts.groth16_verifying_key_path.trim().is_empty(),
        plonk_vk_set = !opts.plonk_verifying_key_path.trim().is_empty(),
        required_circuit_id = %opts.required_circuit_id,
        "configuring batch proof verifier"
    );

    if !opts.enabled {
        configure_batch_proof_verifier(None, opts.strict);
        return Ok(());
    }

    let verifier = SnarkVerifier::new(SnarkVerifierConfig {
        groth16_verifying_key_path: opts.groth16_verifying_key_path.clone(),
        plonk_verifying_key_path: opts.plonk_verifying_key_path.clone(),
        required_circuit_id: opts.required_circuit_id.clone(),
    })?;
    configure_batch_proof_verifier(Some(Arc::new(verifier)), opts.strict);
    Ok(())
}

fn env_bool(name: &str) -> Option<bool> {
    let raw = env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_permissive() {
        let opts = ZkVerifierOptions::default();
        assert!(!opts.enabled);
        assert!(!opts.strict);
        assert!(opts.groth16_verifying_key_path.is_empty());
    }

    #[test]
    fn deserializes_operator_json() {
        let opts: ZkVerifierOptions = serde_json::from_str(
            r#"{
                "enabled": true,
                "strict": true,
                "groth16VerifyingKeyPath": "/tmp/vk.bin",
                "requiredCircuitId": "clearhash-v1"
            }"#,
        )
        .unwrap();
        assert!(opts.enabled);
        assert!(opts.strict);
        assert_eq!(opts.groth16_verifying_key_path, "/tmp/vk.bin");
        assert_eq!(opts.required_circuit_id, "clearhash-v1");
        assert!(opts.plonk_verifying_key_path.is_empty());
    }

    #[test]
    fn enabled_without_keys_fails_to_initialize() {
        let opts = ZkVerifierOptions {
            enabled: true,
            ..Default::default()
        };
        assert!(matches!(
            install_batch_proof_verifier(&opts),
            Err(VerifierSetupError::Unavailable)
        ));
    }
}
