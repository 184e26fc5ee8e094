//! Constant-product swap with an exact input amount.

use veil_storage::{
    self as storage, balance_key, math, pool_key, vai_balance_key, StateError, StateMut,
};
use veil_types::consts::{BIPS_DENOMINATOR, SWAP_EXACT_IN_ID};
use veil_types::{Address, Decoder, Encoder};

use crate::actions::amm::{add_asset_balance, sub_asset_balance, validate_asset_pair};
use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapExactIn {
    pub asset_in: u8,
    pub asset_out: u8,
    pub amount_in: u64,
    pub min_amount_out: u64,
}

impl Action for SwapExactIn {
    const TYPE_ID: u8 = SWAP_EXACT_IN_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 2 + 16);
        enc.put_u8(Self::TYPE_ID);
        enc.put_u8(self.asset_in);
        enc.put_u8(self.asset_out);
        enc.put_u64(self.amount_in);
        enc.put_u64(self.min_amount_out);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let asset_in = dec.get_u8()?;
        let asset_out = dec.get_u8()?;
        let amount_in = dec.get_u64()?;
        let min_amount_out = dec.get_u64()?;
        dec.finish()?;
        Ok(Self {
            asset_in,
            asset_out,
            amount_in,
            min_amount_out,
        })
    }

    fn state_keys(&self, actor: &Address) -> KeySet {
        KeySet::new()
            .with(balance_key(actor), Permission::ReadWrite)
            .with(vai_balance_key(actor), Permission::ReadWrite)
            .with(pool_key(self.asset_in, self.asset_out), Permission::ReadWrite)
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        validate_asset_pair(self.asset_in, self.asset_out)?;
        if self.amount_in == 0 {
            return Err(StateError::InvalidSwapAmount.into());
        }
        let mut pool = storage::get_pool(store, self.asset_in, self.asset_out)?;

        let in_is_0 = if pool.asset0 == self.asset_in && pool.asset1 == self.asset_out {
            true
        } else if pool.asset0 == self.asset_out && pool.asset1 == self.asset_in {
            false
        } else {
            return Err(StateError::InvalidAssetPair.into());
        };
        let (reserve_in, reserve_out) = if in_is_0 {
            (pool.reserve0, pool.reserve1)
        } else {
            (pool.reserve1, pool.reserve0)
        };
        if reserve_in == 0 || reserve_out == 0 {
            return Err(StateError::InsufficientLiquidity.into());
        }

        sub_asset_balance(store, &ctx.actor, self.asset_in, self.amount_in)?;

        let amount_in_with_fee = math::mul_div(
            self.amount_in,
            BIPS_DENOMINATOR.saturating_sub(pool.fee_bips as u64),
            BIPS_DENOMINATOR,
        )?;
        if amount_in_with_fee == 0 {
            return Err(StateError::InvalidSwapAmount.into());
        }
        let denominator = math::add_u64(reserve_in, amount_in_with_fee)?;
        let amount_out = math::mul_div(reserve_out, amount_in_with_fee, denominator)?;
        if amount_out == 0 || amount_out < self.min_amount_out {
            return Err(StateError::SlippageExceeded.into());
        }
        if amount_out > reserve_out {
            return Err(StateError::InsufficientLiquidity.into());
        }

        // Reserves take the full pre-fee input; fees accrue to the pool.
        if in_is_0 {
            pool.reserve0 = math::add_u64(pool.reserve0, self.amount_in)?;
            pool.reserve1 = math::sub_u64(pool.reserve1, amount_out)?;
        } else {
            pool.reserve1 = math::add_u64(pool.reserve1, self.amount_in)?;
            pool.reserve0 = math::sub_u64(pool.reserve0, amount_out)?;
        }
        storage::put_pool(store, &pool)?;

        let receiver_balance =
            add_asset_balance(store, &ctx.actor, self.asset_out, amount_out)?;

        Ok(SwapExactInResult {
            amount_out,
            receiver_balance,
            reserve0: pool.reserve0,
            reserve1: pool.reserve1,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapExactInResult {
    pub amount_out: u64,
    pub receiver_balance: u64,
    pub reserve0: u64,
    pub reserve1: u64,
}

impl SwapExactInResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 32);
        enc.put_u8(SWAP_EXACT_IN_ID);
        enc.put_u64(self.amount_out);
        enc.put_u64(self.receiver_balance);
        enc.put_u64(self.reserve0);
        enc.put_u64(self.reserve1);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(SWAP_EXACT_IN_ID)?;
        let amount_out = dec.get_u64()?;
        let receiver_balance = dec.get_u64()?;
        let reserve0 = dec.get_u64()?;
        let reserve1 = dec.get_u64()?;
        dec.finish()?;
        Ok(Self {
            amount_out,
            receiver_balance,
            reserve0,
            reserve1,
        })
    }
}
