//! Governance update of the exogenous reserve attestation.

use veil_storage::{
    self as storage, reserve_state_key, treasury_config_key, ReserveState, StateError, StateMut,
};
use veil_types::consts::UPDATE_RESERVE_STATE_ID;
use veil_types::{Address, Decoder, Encoder};

use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateReserveState {
    pub exogenous_reserve: u64,
    pub vai_buffer: u64,
}

impl Action for UpdateReserveState {
    const TYPE_ID: u8 = UPDATE_RESERVE_STATE_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 16);
        enc.put_u8(Self::TYPE_ID);
        enc.put_u64(self.exogenous_reserve);
        enc.put_u64(self.vai_buffer);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let exogenous_reserve = dec.get_u64()?;
        let vai_buffer = dec.get_u64()?;
        dec.finish()?;
        Ok(Self {
            exogenous_reserve,
            vai_buffer,
        })
    }

    fn state_keys(&self, _actor: &Address) -> KeySet {
        KeySet::new()
            .with(treasury_config_key(), Permission::Read)
            .with(reserve_state_key(), Permission::ReadWrite)
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        let treasury_cfg = storage::get_treasury_config(store)?;
        if ctx.actor != treasury_cfg.governance {
            return Err(StateError::Unauthorized.into());
        }

        let next = ReserveState {
            exogenous_reserve: self.exogenous_reserve,
            vai_buffer: self.vai_buffer,
        };
        storage::put_reserve_state(store, &next)?;

        Ok(UpdateReserveStateResult {
            exogenous_reserve: next.exogenous_reserve,
            vai_buffer: next.vai_buffer,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateReserveStateResult {
    pub exogenous_reserve: u64,
    pub vai_buffer: u64,
}

impl UpdateReserveStateResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 16);
        enc.put_u8(UPDATE_RESERVE_STATE_ID);
        enc.put_u64(self.exogenous_reserve);
        enc.put_u64(self.vai_buffer);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(UPDATE_RESERVE_STATE_ID)?;
        let exogenous_reserve = dec.get_u64()?;
        let vai_buffer = dec.get_u64()?;
        dec.finish()?;
        Ok(Self {
            exogenous_reserve,
            vai_buffer,
        })
    }
}
