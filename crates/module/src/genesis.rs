//! Genesis seeding of balances and tokenomics singletons.

use serde::{Deserialize, Serialize};
use tracing::info;

use veil_storage::{
    self as storage, math, FeeRouterConfig, FeeRouterState, ProofConfig, ReserveState,
    RiskConfig, StateError, StateMut, TreasuryConfig, TreasuryState, VaiConfig, VaiState,
};
use veil_types::consts::{BIPS_DENOMINATOR, PROOF_TYPE_GROTH16, PROOF_TYPE_PLONK};
use veil_types::Address;

/// Initial balance allocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CustomAllocation {
    pub address: Address,
    pub balance: u64,
}

/// Tokenomics block seeding every singleton.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tokenomics {
    pub total_supply: u64,

    pub governance: Address,
    pub operations: Address,
    pub mint_authority: Address,

    pub col_vault_locked: u64,
    pub col_vault_live: u64,

    pub max_release_bips: u16,
    pub release_epoch_seconds: i64,

    pub fee_router_msrb_bips: u16,
    pub fee_router_col_bips: u16,
    pub fee_router_ops_bips: u16,

    pub vai_debt_ceiling: u64,
    pub vai_epoch_mint_limit: u64,
    pub vai_mint_epoch_seconds: i64,

    pub backing_floor_bips: u32,

    pub veil_ltv_bips: u16,
    pub w_veil_ltv_bips: u16,
    pub ws_veil_ltv_bips: u16,

    pub veil_haircut_bips: u16,
    pub w_veil_haircut_bips: u16,
    pub ws_veil_haircut_bips: u16,

    pub exogenous_reserve_init: u64,
    pub vai_buffer_init: u64,

    pub require_batch_proof: bool,
    pub required_proof_type: u8,
    pub batch_window_ms: i64,
    pub proof_deadline_ms: i64,
    pub prover_authority: Address,
}

/// Genesis document: allocations plus the tokenomics block. Protocol rules
/// (validity windows, gas dimensions) belong to the host runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Genesis {
    pub custom_allocation: Vec<CustomAllocation>,
    pub tokenomics: Option<Tokenomics>,
}

#[derive(Debug, thiserror::Error)]
pub enum GenesisError {
    #[error("invalid genesis json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("supply mismatch: allocations + COL vault = {got}, total supply = {want}")]
    SupplyMismatch { got: u64, want: u64 },

    #[error(transparent)]
    State(#[from] StateError),
}

impl Genesis {
    pub fn from_json(bytes: &[u8]) -> Result<Self, GenesisError> {
        let mut genesis: Genesis = serde_json::from_slice(bytes)?;
        if genesis.tokenomics.is_some() {
            genesis.apply_tokenomics_defaults();
        }
        Ok(genesis)
    }

    /// Fill unset tokenomics fields with the launch defaults.
    pub fn apply_tokenomics_defaults(&mut self) {
        let Some(t) = self.tokenomics.as_mut() else {
            return;
        };
        if let Some(first) = self.custom_allocation.first() {
            if t.governance.is_zero() {
                t.governance = first.address;
            }
            if t.operations.is_zero() {
                t.operations = first.address;
            }
            if t.mint_authority.is_zero() {
                t.mint_authority = first.address;
            }
        }
        if t.max_release_bips == 0 {
            t.max_release_bips = 15; // 0.15%
        }
        if t.release_epoch_seconds == 0 {
            t.release_epoch_seconds = 86_400;
        }
        if t.fee_router_msrb_bips == 0 && t.fee_router_col_bips == 0 && t.fee_router_ops_bips == 0
        {
            t.fee_router_msrb_bips = 7_000;
            t.fee_router_col_bips = 2_000;
            t.fee_router_ops_bips = 1_000;
        }
        if t.vai_mint_epoch_seconds == 0 {
            t.vai_mint_epoch_seconds = 3_600;
        }
        if t.vai_epoch_mint_limit == 0 {
            t.vai_epoch_mint_limit = t.vai_debt_ceiling;
        }
        if t.backing_floor_bips == 0 {
            t.backing_floor_bips = 10_000;
        }
        if t.veil_ltv_bips == 0 {
            t.veil_ltv_bips = 3_000;
        }
        if t.w_veil_ltv_bips == 0 {
            t.w_veil_ltv_bips = 3_500;
        }
        t.ws_veil_ltv_bips = 0;
        if t.veil_haircut_bips == 0 {
            t.veil_haircut_bips = 6_000;
        }
        if t.w_veil_haircut_bips == 0 {
            t.w_veil_haircut_bips = 5_500;
        }
        if t.ws_veil_haircut_bips == 0 {
            t.ws_veil_haircut_bips = 10_000;
        }
        if t.exogenous_reserve_init == 0 {
            t.exogenous_reserve_init = t.vai_debt_ceiling;
        }
        if t.required_proof_type == 0 {
            t.require_batch_proof = true;
            t.required_proof_type = PROOF_TYPE_GROTH16;
        }
        if t.batch_window_ms == 0 {
            t.batch_window_ms = 5_000;
        }
        if t.proof_deadline_ms == 0 {
            t.proof_deadline_ms = 10_000;
        }
        if t.prover_authority.is_zero() {
            t.prover_authority = t.governance;
        }
    }

    pub fn validate(&self) -> Result<(), GenesisError> {
        let Some(t) = self.tokenomics.as_ref() else {
            return Ok(());
        };
        if t.release_epoch_seconds <= 0 {
            return Err(StateError::InvalidTokenomicsConfig.into());
        }
        if t.max_release_bips == 0 || t.max_release_bips as u64 > BIPS_DENOMINATOR {
            return Err(StateError::InvalidTokenomicsConfig.into());
        }
        if t.vai_mint_epoch_seconds <= 0 {
            return Err(StateError::InvalidTokenomicsConfig.into());
        }
        if t.vai_debt_ceiling == 0 {
            return Err(StateError::InvalidTokenomicsConfig.into());
        }
        if t.vai_epoch_mint_limit == 0 || t.vai_epoch_mint_limit > t.vai_debt_ceiling {
            return Err(StateError::InvalidTokenomicsConfig.into());
        }
        if t.backing_floor_bips == 0 {
            return Err(StateError::InvalidRiskConfig.into());
        }
        // v1 hard rule.
        if t.ws_veil_ltv_bips != 0 {
            return Err(StateError::InvalidRiskConfig.into());
        }
        let ltvs = [t.veil_ltv_bips, t.w_veil_ltv_bips, t.ws_veil_ltv_bips];
        let haircuts = [
            t.veil_haircut_bips,
            t.w_veil_haircut_bips,
            t.ws_veil_haircut_bips,
        ];
        if ltvs
            .iter()
            .chain(haircuts.iter())
            .any(|b| *b as u64 > BIPS_DENOMINATOR)
        {
            return Err(StateError::InvalidRiskConfig.into());
        }
        if t.required_proof_type != PROOF_TYPE_GROTH16 && t.required_proof_type != PROOF_TYPE_PLONK
        {
            return Err(StateError::InvalidProofConfig.into());
        }
        if t.batch_window_ms <= 0 || t.proof_deadline_ms <= 0 {
            return Err(StateError::InvalidProofConfig.into());
        }
        if t.prover_authority.is_zero() {
            return Err(StateError::InvalidProofConfig.into());
        }
        let fee_sum = t.fee_router_msrb_bips as u64
            + t.fee_router_col_bips as u64
            + t.fee_router_ops_bips as u64;
        if fee_sum != BIPS_DENOMINATOR {
            return Err(StateError::InvalidFeeRouterConfig.into());
        }

        let mut circulating = 0u64;
        for alloc in &self.custom_allocation {
            circulating = math::add_u64(circulating, alloc.balance)?;
        }
        let accounted = math::add_u64(
            math::add_u64(circulating, t.col_vault_locked)?,
            t.col_vault_live,
        )?;
        if accounted != t.total_supply {
            return Err(GenesisError::SupplyMismatch {
                got: accounted,
                want: t.total_supply,
            });
        }
        Ok(())
    }

    /// Write allocations and singletons into a fresh store.
    pub fn initialize_state(&self, store: &mut dyn StateMut) -> Result<(), GenesisError> {
        for alloc in &self.custom_allocation {
            storage::add_balance(store, &alloc.address, alloc.balance)?;
        }
        let Some(t) = self.tokenomics.as_ref() else {
            return Ok(());
        };
        self.validate()?;

        storage::put_treasury_config(
            store,
            &TreasuryConfig {
                governance: t.governance,
                operations: t.operations,
                max_release_bips: t.max_release_bips,
                release_epoch_seconds: t.release_epoch_seconds,
            },
        )?;
        storage::put_treasury_state(
            store,
            &TreasuryState {
                locked: t.col_vault_locked,
                live: t.col_vault_live,
                released: 0,
                last_release_unix_ms: 0,
            },
        )?;
        storage::put_fee_router_config(
            store,
            &FeeRouterConfig {
                msrb_bips: t.fee_router_msrb_bips,
                col_bips: t.fee_router_col_bips,
                ops_bips: t.fee_router_ops_bips,
            },
        )?;
        storage::put_fee_router_state(store, &FeeRouterState::default())?;
        storage::put_vai_config(
            store,
            &VaiConfig {
                mint_authority: t.mint_authority,
                debt_ceiling: t.vai_debt_ceiling,
                epoch_mint_limit: t.vai_epoch_mint_limit,
                mint_epoch_seconds: t.vai_mint_epoch_seconds,
            },
        )?;
        storage::put_vai_state(store, &VaiState::default())?;
        storage::put_risk_config(
            store,
            &RiskConfig {
                backing_floor_bips: t.backing_floor_bips,
                veil_ltv_bips: t.veil_ltv_bips,
                wveil_ltv_bips: t.w_veil_ltv_bips,
                wsveil_ltv_bips: t.ws_veil_ltv_bips,
                veil_haircut_bips: t.veil_haircut_bips,
                wveil_haircut_bips: t.w_veil_haircut_bips,
                wsveil_haircut_bips: t.ws_veil_haircut_bips,
            },
        )?;
        storage::put_reserve_state(
            store,
            &ReserveState {
                exogenous_reserve: t.exogenous_reserve_init,
                vai_buffer: t.vai_buffer_init,
            },
        )?;
        storage::put_proof_config(
            store,
            &ProofConfig {
                require_proof: t.require_batch_proof,
                required_proof_type: t.required_proof_type,
                batch_window_ms: t.batch_window_ms,
                proof_deadline_ms: t.proof_deadline_ms,
                prover_authority: t.prover_authority,
            },
        )?;

        info!(
            allocations = self.custom_allocation.len(),
            total_supply = t.total_supply,
            require_proof = t.require_batch_proof,
            "seeded genesis state"
        );
        Ok(())
    }
}
