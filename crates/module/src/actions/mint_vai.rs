//! VAI minting under the monetary invariants.
//!
//! Three gates in order: the sliding epoch mint limit, the debt ceiling,
//! and the reserve-backing floor against the exogenous reserve.

use veil_storage::{
    self as storage, math, reserve_state_key, risk_config_key, vai_balance_key, vai_config_key,
    vai_state_key, StateError, StateMut,
};
use veil_types::consts::{BIPS_DENOMINATOR, MINT_VAI_ID};
use veil_types::{Address, Decoder, Encoder};

use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintVai {
    pub to: Address,
    pub amount: u64,
}

impl Action for MintVai {
    const TYPE_ID: u8 = MINT_VAI_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 33 + 8);
        enc.put_u8(Self::TYPE_ID);
        enc.put_address(&self.to);
        enc.put_u64(self.amount);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let to = dec.get_address()?;
        let amount = dec.get_u64()?;
        dec.finish()?;
        Ok(Self { to, amount })
    }

    fn state_keys(&self, _actor: &Address) -> KeySet {
        KeySet::new()
            .with(vai_config_key(), Permission::Read)
            .with(vai_state_key(), Permission::ReadWrite)
            .with(risk_config_key(), Permission::Read)
            .with(reserve_state_key(), Permission::Read)
            .with(vai_balance_key(&self.to), Permission::ReadWrite)
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        if self.amount == 0 {
            return Err(StateError::InvalidVaiAmount.into());
        }
        let cfg = storage::get_vai_config(store)?;
        if ctx.actor != cfg.mint_authority {
            return Err(StateError::Unauthorized.into());
        }

        let mut state = storage::get_vai_state(store)?;
        if state.epoch_start_unix_ms == 0 {
            state.epoch_start_unix_ms = ctx.timestamp;
        }
        if ctx.timestamp >= state.epoch_start_unix_ms + cfg.mint_epoch_seconds * 1_000 {
            state.epoch_start_unix_ms = ctx.timestamp;
            state.epoch_minted = 0;
        }

        let next_epoch_minted = math::add_u64(state.epoch_minted, self.amount)?;
        if next_epoch_minted > cfg.epoch_mint_limit {
            return Err(StateError::VaiEpochMintLimitExceeded.into());
        }
        let next_debt = math::add_u64(state.total_debt, self.amount)?;
        if next_debt > cfg.debt_ceiling {
            return Err(StateError::VaiDebtCeilingExceeded.into());
        }

        let risk_cfg = storage::get_risk_config(store)?;
        let reserve = storage::get_reserve_state(store)?;
        if next_debt > 0 {
            let left = (reserve.exogenous_reserve as u128) * (BIPS_DENOMINATOR as u128);
            let right = (next_debt as u128) * (risk_cfg.backing_floor_bips as u128);
            if left < right {
                return Err(StateError::BackingRatioViolation.into());
            }
        }

        let to_balance = storage::add_vai_balance(store, &self.to, self.amount)?;
        state.epoch_minted = next_epoch_minted;
        state.total_debt = next_debt;
        storage::put_vai_state(store, &state)?;

        Ok(MintVaiResult {
            to_balance,
            total_debt: state.total_debt,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintVaiResult {
    pub to_balance: u64,
    pub total_debt: u64,
}

impl MintVaiResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 16);
        enc.put_u8(MINT_VAI_ID);
        enc.put_u64(self.to_balance);
        enc.put_u64(self.total_debt);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(MINT_VAI_ID)?;
        let to_balance = dec.get_u64()?;
        let total_debt = dec.get_u64()?;
        dec.finish()?;
        Ok(Self {
            to_balance,
            total_debt,
        })
    }
}
