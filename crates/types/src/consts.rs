//! Consensus constants shared across the module.
//!
//! The values in this file are part of the wire and state contract and must
//! not change between releases.

// Action type IDs.
pub const TRANSFER_ID: u8 = 0;
pub const CREATE_MARKET_ID: u8 = 1;
pub const COMMIT_ORDER_ID: u8 = 2;
pub const REVEAL_BATCH_ID: u8 = 3;
pub const CLEAR_BATCH_ID: u8 = 4;
pub const RESOLVE_MARKET_ID: u8 = 5;
pub const DISPUTE_ID: u8 = 6;
pub const ROUTE_FEES_ID: u8 = 7;
pub const RELEASE_COL_TRANCHE_ID: u8 = 8;
pub const MINT_VAI_ID: u8 = 9;
pub const BURN_VAI_ID: u8 = 10;
pub const CREATE_POOL_ID: u8 = 11;
pub const ADD_LIQUIDITY_ID: u8 = 12;
pub const REMOVE_LIQUIDITY_ID: u8 = 13;
pub const SWAP_EXACT_IN_ID: u8 = 14;
pub const UPDATE_RESERVE_STATE_ID: u8 = 15;
pub const SET_RISK_PARAMS_ID: u8 = 16;
pub const SUBMIT_BATCH_PROOF_ID: u8 = 17;
pub const SET_PROOF_CONFIG_ID: u8 = 18;

// Proof types.
pub const PROOF_TYPE_GROTH16: u8 = 1;
pub const PROOF_TYPE_PLONK: u8 = 2;

// Supported proof circuits.
pub const PROOF_CIRCUIT_CLEAR_HASH_V1: &str = "clearhash-v1";
pub const PROOF_CIRCUIT_SHIELDED_LEDGER_V1: &str = "shielded-ledger-v1";

// Asset tags.
pub const ASSET_VEIL: u8 = 0;
pub const ASSET_VAI: u8 = 1;

// Market lifecycle statuses.
pub const MARKET_STATUS_ACTIVE: u8 = 0;
pub const MARKET_STATUS_RESOLVED: u8 = 1;
pub const MARKET_STATUS_DISPUTED: u8 = 2;

/// Oracle slot reserved for the dispute record of a market.
pub const DISPUTE_VALIDATOR_INDEX: u32 = u32::MAX;

/// Basis-point denominator used by every bips-scaled quantity.
pub const BIPS_DENOMINATOR: u64 = 10_000;
