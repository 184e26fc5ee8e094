//! Protocol fee routing into the MSRB, COL, and operations budgets.

use veil_storage::{
    self as storage, balance_key, fee_router_config_key, fee_router_state_key, math, StateError,
    StateMut,
};
use veil_types::consts::{BIPS_DENOMINATOR, ROUTE_FEES_ID};
use veil_types::{Address, Decoder, Encoder};

use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteFees {
    pub amount: u64,
}

impl Action for RouteFees {
    const TYPE_ID: u8 = ROUTE_FEES_ID;

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
            .with(balance_key(actor), Permission::ReadWrite)
            .with(fee_router_config_key(), Permission::Read)
            .with(fee_router_state_key(), Permission::ReadWrite)
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        if self.amount == 0 {
            return Err(StateError::InvalidFeeAmount.into());
        }

        let cfg = storage::get_fee_router_config(store)?;
        let mut state = storage::get_fee_router_state(store)?;

        let sender_balance = storage::sub_balance(store, &ctx.actor, self.amount)?;

        // Remainder goes to ops so the split never leaks dust.
        let msrb_share = math::mul_div(cfg.msrb_bips as u64, self.amount, BIPS_DENOMINATOR)?;
        let col_share = math::mul_div(cfg.col_bips as u64, self.amount, BIPS_DENOMINATOR)?;
        let ops_share = self.amount - msrb_share - col_share;

        state.msrb_budget = math::add_u64(state.msrb_budget, msrb_share)?;
        state.col_budget = math::add_u64(state.col_budget, col_share)?;
        state.ops_budget = math::add_u64(state.ops_budget, ops_share)?;
        storage::put_fee_router_state(store, &state)?;

        Ok(RouteFeesResult {
            sender_balance,
            msrb_budget: state.msrb_budget,
            col_budget: state.col_budget,
            ops_budget: state.ops_budget,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteFeesResult {
    pub sender_balance: u64,
    pub msrb_budget: u64,
    pub col_budget: u64,
    pub ops_budget: u64,
}

impl RouteFeesResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 32);
        enc.put_u8(ROUTE_FEES_ID);
        enc.put_u64(self.sender_balance);
        enc.put_u64(self.msrb_budget);
        enc.put_u64(self.col_budget);
        enc.put_u64(self.ops_budget);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(ROUTE_FEES_ID)?;
        let sender_balance = dec.get_u64()?;
        let msrb_budget = dec.get_u64()?;
        let col_budget = dec.get_u64()?;
        let ops_budget = dec.get_u64()?;
        dec.finish()?;
        Ok(Self {
            sender_balance,
            msrb_budget,
            col_budget,
            ops_budget,
        })
    }
}
