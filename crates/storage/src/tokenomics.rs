//! Tokenomics singletons: treasury, fee router, VAI, risk, reserve.
//!
//! Singletons are seeded at genesis and mutated only by governance-gated
//! actions. Config records are validated on both write and read so a corrupt
//! row can never steer a transition.

use veil_types::consts::BIPS_DENOMINATOR;
use veil_types::{Address, ADDRESS_LEN};

use crate::error::StateError;
use crate::keys::{
    fee_router_config_key, fee_router_state_key, reserve_state_key, risk_config_key,
    treasury_config_key, treasury_state_key, vai_config_key, vai_state_key,
};
use crate::store::{StateMut, StateRead};

fn read_u16(raw: &[u8], offset: usize) -> u16 {
    let mut b = [0u8; 2];
    b.copy_from_slice(&raw[offset..offset + 2]);
    u16::from_be_bytes(b)
}

fn read_u32(raw: &[u8], offset: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&raw[offset..offset + 4]);
    u32::from_be_bytes(b)
}

fn read_u64(raw: &[u8], offset: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&raw[offset..offset + 8]);
    u64::from_be_bytes(b)
}

fn read_address(raw: &[u8], offset: usize) -> Address {
    let mut b = [0u8; ADDRESS_LEN];
    b.copy_from_slice(&raw[offset..offset + ADDRESS_LEN]);
    Address(b)
}

// ========== Treasury ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreasuryConfig {
    pub governance: Address,
    pub operations: Address,
    pub max_release_bips: u16,
    pub release_epoch_seconds: i64,
}

pub fn put_treasury_config<S: StateMut + ?Sized>(
    store: &mut S,
    cfg: &TreasuryConfig,
) -> Result<(), StateError> {
    let mut v = Vec::with_capacity(ADDRESS_LEN * 2 + 2 + 8);
    v.extend_from_slice(&cfg.governance.0);
    v.extend_from_slice(&cfg.operations.0);
    v.extend_from_slice(&cfg.max_release_bips.to_be_bytes());
    v.extend_from_slice(&(cfg.release_epoch_seconds as u64).to_be_bytes());
    store.insert(treasury_config_key(), v)?;
    Ok(())
}

pub fn get_treasury_config<S: StateRead + ?Sized>(
    store: &S,
) -> Result<TreasuryConfig, StateError> {
    let raw = store
        .get(&treasury_config_key())?
        .ok_or(StateError::InvalidTokenomicsConfig)?;
    if raw.len() < ADDRESS_LEN * 2 + 2 + 8 {
        return Err(StateError::InvalidTokenomicsConfig);
    }
    let offset = ADDRESS_LEN * 2;
    Ok(TreasuryConfig {
        governance: read_address(&raw, 0),
        operations: read_address(&raw, ADDRESS_LEN),
        max_release_bips: read_u16(&raw, offset),
        release_epoch_seconds: read_u64(&raw, offset + 2) as i64,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreasuryState {
    pub locked: u64,
    pub live: u64,
    pub released: u64,
    pub last_release_unix_ms: i64,
}

pub fn put_treasury_state<S: StateMut + ?Sized>(
    store: &mut S,
    state: &TreasuryState,
) -> Result<(), StateError> {
    let mut v = Vec::with_capacity(8 * 4);
    v.extend_from_slice(&state.locked.to_be_bytes());
    v.extend_from_slice(&state.live.to_be_bytes());
    v.extend_from_slice(&state.released.to_be_bytes());
    v.extend_from_slice(&(state.last_release_unix_ms as u64).to_be_bytes());
    store.insert(treasury_state_key(), v)?;
    Ok(())
}

pub fn get_treasury_state<S: StateRead + ?Sized>(store: &S) -> Result<TreasuryState, StateError> {
    let raw = store
        .get(&treasury_state_key())?
        .ok_or(StateError::InvalidTokenomicsConfig)?;
    if raw.len() < 8 * 4 {
        return Err(StateError::InvalidTokenomicsConfig);
    }
    Ok(TreasuryState {
        locked: read_u64(&raw, 0),
        live: read_u64(&raw, 8),
        released: read_u64(&raw, 16),
        last_release_unix_ms: read_u64(&raw, 24) as i64,
    })
}

// ========== Fee router ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeRouterConfig {
    pub msrb_bips: u16,
    pub col_bips: u16,
    pub ops_bips: u16,
}

impl FeeRouterConfig {
    pub fn bips_sum(&self) -> u64 {
        self.msrb_bips as u64 + self.col_bips as u64 + self.ops_bips as u64
    }
}

pub fn put_fee_router_config<S: StateMut + ?Sized>(
    store: &mut S,
    cfg: &FeeRouterConfig,
) -> Result<(), StateError> {
    let mut v = Vec::with_capacity(2 * 3);
    v.extend_from_slice(&cfg.msrb_bips.to_be_bytes());
    v.extend_from_slice(&cfg.col_bips.to_be_bytes());
    v.extend_from_slice(&cfg.ops_bips.to_be_bytes());
    store.insert(fee_router_config_key(), v)?;
    Ok(())
}

pub fn get_fee_router_config<S: StateRead + ?Sized>(
    store: &S,
) -> Result<FeeRouterConfig, StateError> {
    let raw = store
        .get(&fee_router_config_key())?
        .ok_or(StateError::InvalidFeeRouterConfig)?;
    if raw.len() < 2 * 3 {
        return Err(StateError::InvalidFeeRouterConfig);
    }
    let cfg = FeeRouterConfig {
        msrb_bips: read_u16(&raw, 0),
        col_bips: read_u16(&raw, 2),
        ops_bips: read_u16(&raw, 4),
    };
    if cfg.bips_sum() != BIPS_DENOMINATOR {
        return Err(StateError::InvalidFeeRouterConfig);
    }
    Ok(cfg)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeRouterState {
    pub msrb_budget: u64,
    pub col_budget: u64,
    pub ops_budget: u64,
}

pub fn put_fee_router_state<S: StateMut + ?Sized>(
    store: &mut S,
    state: &FeeRouterState,
) -> Result<(), StateError> {
    let mut v = Vec::with_capacity(8 * 3);
    v.extend_from_slice(&state.msrb_budget.to_be_bytes());
    v.extend_from_slice(&state.col_budget.to_be_bytes());
    v.extend_from_slice(&state.ops_budget.to_be_bytes());
    store.insert(fee_router_state_key(), v)?;
    Ok(())
}

pub fn get_fee_router_state<S: StateRead + ?Sized>(
    store: &S,
) -> Result<FeeRouterState, StateError> {
    let raw = store
        .get(&fee_router_state_key())?
        .ok_or(StateError::InvalidFeeRouterConfig)?;
    if raw.len() < 8 * 3 {
        return Err(StateError::InvalidFeeRouterConfig);
    }
    Ok(FeeRouterState {
        msrb_budget: read_u64(&raw, 0),
        col_budget: read_u64(&raw, 8),
        ops_budget: read_u64(&raw, 16),
    })
}

// ========== VAI ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VaiConfig {
    pub mint_authority: Address,
    pub debt_ceiling: u64,
    pub epoch_mint_limit: u64,
    pub mint_epoch_seconds: i64,
}

pub fn put_vai_config<S: StateMut + ?Sized>(
    store: &mut S,
    cfg: &VaiConfig,
) -> Result<(), StateError> {
    let mut v = Vec::with_capacity(ADDRESS_LEN + 8 * 3);
    v.extend_from_slice(&cfg.mint_authority.0);
    v.extend_from_slice(&cfg.debt_ceiling.to_be_bytes());
    v.extend_from_slice(&cfg.epoch_mint_limit.to_be_bytes());
    v.extend_from_slice(&(cfg.mint_epoch_seconds as u64).to_be_bytes());
    store.insert(vai_config_key(), v)?;
    Ok(())
}

pub fn get_vai_config<S: StateRead + ?Sized>(store: &S) -> Result<VaiConfig, StateError> {
    let raw = store
        .get(&vai_config_key())?
        .ok_or(StateError::InvalidTokenomicsConfig)?;
    if raw.len() < ADDRESS_LEN + 8 * 3 {
        return Err(StateError::InvalidTokenomicsConfig);
    }
    Ok(VaiConfig {
        mint_authority: read_address(&raw, 0),
        debt_ceiling: read_u64(&raw, ADDRESS_LEN),
        epoch_mint_limit: read_u64(&raw, ADDRESS_LEN + 8),
        mint_epoch_seconds: read_u64(&raw, ADDRESS_LEN + 16) as i64,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VaiState {
    pub total_debt: u64,
    pub epoch_start_unix_ms: i64,
    pub epoch_minted: u64,
}

pub fn put_vai_state<S: StateMut + ?Sized>(
    store: &mut S,
    state: &VaiState,
) -> Result<(), StateError> {
    let mut v = Vec::with_capacity(8 * 3);
    v.extend_from_slice(&state.total_debt.to_be_bytes());
    v.extend_from_slice(&(state.epoch_start_unix_ms as u64).to_be_bytes());
    v.extend_from_slice(&state.epoch_minted.to_be_bytes());
    store.insert(vai_state_key(), v)?;
    Ok(())
}

pub fn get_vai_state<S: StateRead + ?Sized>(store: &S) -> Result<VaiState, StateError> {
    let raw = store
        .get(&vai_state_key())?
        .ok_or(StateError::InvalidTokenomicsConfig)?;
    if raw.len() < 8 * 3 {
        return Err(StateError::InvalidTokenomicsConfig);
    }
    Ok(VaiState {
        total_debt: read_u64(&raw, 0),
        epoch_start_unix_ms: read_u64(&raw, 8) as i64,
        epoch_minted: read_u64(&raw, 16),
    })
}

// ========== Risk ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RiskConfig {
    pub backing_floor_bips: u32,

    pub veil_ltv_bips: u16,
    pub wveil_ltv_bips: u16,
    pub wsveil_ltv_bips: u16,

    pub veil_haircut_bips: u16,
    pub wveil_haircut_bips: u16,
    pub wsveil_haircut_bips: u16,
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), StateError> {
        if self.backing_floor_bips == 0 {
            return Err(StateError::InvalidRiskConfig);
        }
        let ltvs = [self.veil_ltv_bips, self.wveil_ltv_bips, self.wsveil_ltv_bips];
        let haircuts = [
            self.veil_haircut_bips,
            self.wveil_haircut_bips,
            self.wsveil_haircut_bips,
        ];
        if ltvs.iter().chain(haircuts.iter()).any(|b| *b as u64 > BIPS_DENOMINATOR) {
            return Err(StateError::InvalidRiskConfig);
        }
        // v1 hard rule: wsVEIL is not collateral-eligible.
        if self.wsveil_ltv_bips != 0 {
            return Err(StateError::InvalidRiskConfig);
        }
        Ok(())
    }
}

pub fn put_risk_config<S: StateMut + ?Sized>(
    store: &mut S,
    cfg: &RiskConfig,
) -> Result<(), StateError> {
    cfg.validate()?;
    let mut v = Vec::with_capacity(4 + 2 * 6);
    v.extend_from_slice(&cfg.backing_floor_bips.to_be_bytes());
    v.extend_from_slice(&cfg.veil_ltv_bips.to_be_bytes());
    v.extend_from_slice(&cfg.wveil_ltv_bips.to_be_bytes());
    v.extend_from_slice(&cfg.wsveil_ltv_bips.to_be_bytes());
    v.extend_from_slice(&cfg.veil_haircut_bips.to_be_bytes());
    v.extend_from_slice(&cfg.wveil_haircut_bips.to_be_bytes());
    v.extend_from_slice(&cfg.wsveil_haircut_bips.to_be_bytes());
    store.insert(risk_config_key(), v)?;
    Ok(())
}

pub fn get_risk_config<S: StateRead + ?Sized>(store: &S) -> Result<RiskConfig, StateError> {
    let raw = store
        .get(&risk_config_key())?
        .ok_or(StateError::InvalidRiskConfig)?;
    if raw.len() < 4 + 2 * 6 {
        return Err(StateError::InvalidRiskConfig);
    }
    let cfg = RiskConfig {
        backing_floor_bips: read_u32(&raw, 0),
        veil_ltv_bips: read_u16(&raw, 4),
        wveil_ltv_bips: read_u16(&raw, 6),
        wsveil_ltv_bips: read_u16(&raw, 8),
        veil_haircut_bips: read_u16(&raw, 10),
        wveil_haircut_bips: read_u16(&raw, 12),
        wsveil_haircut_bips: read_u16(&raw, 14),
    };
    cfg.validate()?;
    Ok(cfg)
}

// ========== Reserve ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReserveState {
    pub exogenous_reserve: u64,
    pub vai_buffer: u64,
}

pub fn put_reserve_state<S: StateMut + ?Sized>(
    store: &mut S,
    state: &ReserveState,
) -> Result<(), StateError> {
    let mut v = Vec::with_capacity(8 * 2);
    v.extend_from_slice(&state.exogenous_reserve.to_be_bytes());
    v.extend_from_slice(&state.vai_buffer.to_be_bytes());
    store.insert(reserve_state_key(), v)?;
    Ok(())
}

pub fn get_reserve_state<S: StateRead + ?Sized>(store: &S) -> Result<ReserveState, StateError> {
    let raw = store
        .get(&reserve_state_key())?
        .ok_or(StateError::InvalidReserveState)?;
    if raw.len() < 8 * 2 {
        return Err(StateError::InvalidReserveState);
    }
    Ok(ReserveState {
        exogenous_reserve: read_u64(&raw, 0),
        vai_buffer: read_u64(&raw, 8),
    })
}
