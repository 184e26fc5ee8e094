//! VAI burning against outstanding debt.

use veil_storage::{
    self as storage, vai_balance_key, vai_state_key, StateError, StateMut,
};
use veil_types::consts::BURN_VAI_ID;
use veil_types::{Address, Decoder, Encoder};

use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurnVai {
    pub amount: u64,
}

impl Action for BurnVai {
    const TYPE_ID: u8 = BURN_VAI_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 8);
        enc.put_u8(Self::TYPE_ID);
        enc.put_u64(self.amount);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let amount = dec.get_u64()?;
        dec.finish()?;
        Ok(Self { amount })
    }

    fn state_keys(&self, actor: &Address) -> KeySet {
        KeySet::new()
            .with(vai_balance_key(actor), Permission::ReadWrite)
            .with(vai_state_key(), Permission::ReadWrite)
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        if self.amount == 0 {
            return Err(StateError::InvalidVaiAmount.into());
        }
        let actor_balance = storage::sub_vai_balance(store, &ctx.actor, self.amount)?;

        let mut state = storage::get_vai_state(store)?;
        if self.amount > state.total_debt {
            return Err(StateError::VaiDebtInvariant.into());
        }
        state.total_debt -= self.amount;
        storage::put_vai_state(store, &state)?;

        Ok(BurnVaiResult {
            actor_balance,
            total_debt: state.total_debt,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurnVaiResult {
    pub actor_balance: u64,
    pub total_debt: u64,
}

impl BurnVaiResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 16);
        enc.put_u8(BURN_VAI_ID);
        enc.put_u64(self.actor_balance);
        enc.put_u64(self.total_debt);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(BURN_VAI_ID)?;
        let actor_balance = dec.get_u64()?;
        let total_debt = dec.get_u64()?;
        dec.finish()?;
        Ok(Self {
            actor_balance,
            total_debt,
        })
    }
}
