//! Typed state schema for the veil market module.
//!
//! Every entity lives under a one-byte prefix followed by its fixed-width
//! identity and a two-byte chunk-size hint. Values serialize as big-endian
//! fixed-width fields; bounded variable-length fields either carry their own
//! length prefix or occupy the slot tail. All balance-like arithmetic goes
//! through the overflow-checked helpers in [`math`].

pub mod balances;
pub mod error;
pub mod keys;
pub mod market;
pub mod math;
pub mod pool;
pub mod proof;
pub mod store;
pub mod tokenomics;

pub use balances::{
    add_balance, add_lp_balance, add_vai_balance, get_balance, get_lp_balance, get_vai_balance,
    sub_balance, sub_lp_balance, sub_vai_balance,
};
pub use error::{StateError, StoreError};
pub use keys::*;
pub use market::{
    get_batch, get_market, put_batch_result, put_commitment, put_dispute, put_market,
    put_oracle_share, BatchResult, Market,
};
pub use pool::{get_pool, put_pool, sorted_asset_pair, Pool};
pub use proof::{
    get_batch_proof_record, get_bloodsworn, get_glyph, get_proof_config, get_vellum_proof,
    put_batch_proof_record, put_bloodsworn, put_glyph, put_proof_config, put_vellum_proof,
    BatchProofRecord, Bloodsworn, Glyph, ProofConfig, MAX_FILLS_HASH_LEN,
    MAX_PUBLIC_INPUTS_HASH_LEN, MAX_VELLUM_PROOF_BYTES,
};
pub use store::{MemStore, StateRead, StateMut};
pub use tokenomics::{
    get_fee_router_config, get_fee_router_state, get_reserve_state, get_risk_config,
    get_treasury_config, get_treasury_state, get_vai_config, get_vai_state, put_fee_router_config,
    put_fee_router_state, put_reserve_state, put_risk_config, put_treasury_config,
    put_treasury_state, put_vai_config, put_vai_state, FeeRouterConfig, FeeRouterState,
    ReserveState, RiskConfig, TreasuryConfig, TreasuryState, VaiConfig, VaiState,
};
