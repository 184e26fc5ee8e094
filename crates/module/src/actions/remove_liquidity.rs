//! Pro-rata liquidity withdrawal.

use veil_storage::{
    self as storage, balance_key, lp_balance_key, math, pool_key, vai_balance_key, StateError,
    StateMut,
};
use veil_types::consts::REMOVE_LIQUIDITY_ID;
use veil_types::{Address, Decoder, Encoder};

use crate::actions::amm::{
    add_asset_balance, map_pair_amounts, map_pool_amounts_to_pair, validate_asset_pair,
};
use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveLiquidity {
    pub asset0: u8,
    pub asset1: u8,
    pub lp_amount: u64,
    pub min_amount0: u64,
    pub min_amount1: u64,
}

impl Action for RemoveLiquidity {
    const TYPE_ID: u8 = REMOVE_LIQUIDITY_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 2 + 24);
        enc.put_u8(Self::TYPE_ID);
        enc.put_u8(self.asset0);
        enc.put_u8(self.asset1);
        enc.put_u64(self.lp_amount);
        enc.put_u64(self.min_amount0);
        enc.put_u64(self.min_amount1);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let asset0 = dec.get_u8()?;
        let asset1 = dec.get_u8()?;
        let lp_amount = dec.get_u64()?;
        let min_amount0 = dec.get_u64()?;
        let min_amount1 = dec.get_u64()?;
        dec.finish()?;
        Ok(Self {
            asset0,
            asset1,
            lp_amount,
            min_amount0,
            min_amount1,
        })
    }

    fn state_keys(&self, actor: &Address) -> KeySet {
        KeySet::new()
            .with(balance_key(actor), Permission::ReadWrite)
            .with(vai_balance_key(actor), Permission::ReadWrite)
            .with(pool_key(self.asset0, self.asset1), Permission::ReadWrite)
            .with(
                lp_balance_key(self.asset0, self.asset1, actor),
                Permission::ReadWrite,
            )
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        validate_asset_pair(self.asset0, self.asset1)?;
        if self.lp_amount == 0 {
            return Err(StateError::InvalidLiquidityAmount.into());
        }

        let mut pool = storage::get_pool(store, self.asset0, self.asset1)?;
        if pool.total_lp == 0 || pool.reserve0 == 0 || pool.reserve1 == 0 {
            return Err(StateError::InsufficientLiquidity.into());
        }
        let lp_balance =
            storage::get_lp_balance(store, pool.asset0, pool.asset1, &ctx.actor)?;
        if lp_balance < self.lp_amount {
            return Err(StateError::InsufficientLpBalance.into());
        }

        let out0_pool = math::mul_div(self.lp_amount, pool.reserve0, pool.total_lp)?;
        let out1_pool = math::mul_div(self.lp_amount, pool.reserve1, pool.total_lp)?;
        if out0_pool == 0 || out1_pool == 0 {
            return Err(StateError::InsufficientLiquidity.into());
        }
        let (min0_pool, min1_pool) = map_pair_amounts(
            self.asset0,
            self.asset1,
            self.min_amount0,
            self.min_amount1,
            &pool,
        )?;
        if out0_pool < min0_pool || out1_pool < min1_pool {
            return Err(StateError::SlippageExceeded.into());
        }

        pool.reserve0 = math::sub_u64(pool.reserve0, out0_pool)?;
        pool.reserve1 = math::sub_u64(pool.reserve1, out1_pool)?;
        pool.total_lp = math::sub_u64(pool.total_lp, self.lp_amount)?;
        storage::put_pool(store, &pool)?;

        let next_lp_balance =
            storage::sub_lp_balance(store, pool.asset0, pool.asset1, &ctx.actor, self.lp_amount)?;
        add_asset_balance(store, &ctx.actor, pool.asset0, out0_pool)?;
        add_asset_balance(store, &ctx.actor, pool.asset1, out1_pool)?;

        let (out0, out1) =
            map_pool_amounts_to_pair(&pool, self.asset0, self.asset1, out0_pool, out1_pool)?;

        Ok(RemoveLiquidityResult {
            amount0_out: out0,
            amount1_out: out1,
            lp_balance: next_lp_balance,
            reserve0: pool.reserve0,
            reserve1: pool.reserve1,
            total_lp: pool.total_lp,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveLiquidityResult {
    pub amount0_out: u64,
    pub amount1_out: u64,
    pub lp_balance: u64,
    pub reserve0: u64,
    pub reserve1: u64,
    pub total_lp: u64,
}

impl RemoveLiquidityResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 48);
        enc.put_u8(REMOVE_LIQUIDITY_ID);
        enc.put_u64(self.amount0_out);
        enc.put_u64(self.amount1_out);
        enc.put_u64(self.lp_balance);
        enc.put_u64(self.reserve0);
        enc.put_u64(self.reserve1);
        enc.put_u64(self.total_lp);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(REMOVE_LIQUIDITY_ID)?;
        let amount0_out = dec.get_u64()?;
        let amount1_out = dec.get_u64()?;
        let lp_balance = dec.get_u64()?;
        let reserve0 = dec.get_u64()?;
        let reserve1 = dec.get_u64()?;
        let total_lp = dec.get_u64()?;
        dec.finish()?;
        Ok(Self {
            amount0_out,
            amount1_out,
            lp_balance,
            reserve0,
            reserve1,
            total_lp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::add_liquidity::AddLiquidity;
    use veil_storage::{put_pool, Pool, MemStore};
    use veil_types::{TxId, ADDRESS_LEN, ID_LEN};

    fn ctx(actor: Address) -> ExecContext {
        ExecContext::new(1_000, actor, TxId([0; ID_LEN]))
    }

    fn seeded_position(store: &mut MemStore, actor: &Address) {
        put_pool(
            store,
            &Pool {
                asset0: 0,
                asset1: 1,
                fee_bips: 30,
                reserve0: 0,
                reserve1: 0,
                total_lp: 0,
            },
        )
        .unwrap();
        storage::add_balance(store, actor, 10_000).unwrap();
        storage::add_vai_balance(store, actor, 10_000).unwrap();
        AddLiquidity {
            asset0: 0,
            asset1: 1,
            amount0: 10_000,
            amount1: 10_000,
            min_lp: 1,
        }
        .execute(store, &ctx(*actor))
        .unwrap();
    }

    #[test]
    fn wire_round_trip() {
        let a = RemoveLiquidity {
            asset0: 0,
            asset1: 1,
            lp_amount: 5,
            min_amount0: 1,
            min_amount1: 2,
        };
        assert_eq!(RemoveLiquidity::decode(&a.encode()).unwrap(), a);
    }

    #[test]
    fn pro_rata_withdrawal() {
        let mut store = MemStore::new();
        let actor = Address([1; ADDRESS_LEN]);
        seeded_position(&mut store, &actor);

        let out = RemoveLiquidity {
            asset0: 0,
            asset1: 1,
            lp_amount: 2_500,
            min_amount0: 2_500,
            min_amount1: 2_500,
        }
        .execute(&mut store, &ctx(actor))
        .unwrap();
        let result = RemoveLiquidityResult::decode(&out).unwrap();
        assert_eq!(result.amount0_out, 2_500);
        assert_eq!(result.amount1_out, 2_500);
        assert_eq!(result.lp_balance, 7_500);
        assert_eq!(result.reserve0, 7_500);
        assert_eq!(result.total_lp, 7_500);

        assert_eq!(storage::get_balance(&store, &actor).unwrap(), 2_500);
        assert_eq!(storage::get_vai_balance(&store, &actor).unwrap(), 2_500);
    }

    #[test]
    fn minimums_follow_caller_orientation() {
        let mut store = MemStore::new();
        let actor = Address([1; ADDRESS_LEN]);
        seeded_position(&mut store, &actor);

        // Caller speaks (VAI, VEIL); minimums map onto pool orientation.
        let out = RemoveLiquidity {
            asset0: 1,
            asset1: 0,
            lp_amount: 1_000,
            min_amount0: 1_000,
            min_amount1: 1_000,
        }
        .execute(&mut store, &ctx(actor))
        .unwrap();
        let result = RemoveLiquidityResult::decode(&out).unwrap();
        assert_eq!(result.amount0_out, 1_000);
        assert_eq!(result.amount1_out, 1_000);
    }

    #[test]
    fn slippage_rejected() {
        let mut store = MemStore::new();
        let actor = Address([1; ADDRESS_LEN]);
        seeded_position(&mut store, &actor);

        assert_eq!(
            RemoveLiquidity {
                asset0: 0,
                asset1: 1,
                lp_amount: 100,
                min_amount0: 101,
                min_amount1: 0,
            }
            .execute(&mut store, &ctx(actor)),
            Err(ActionError::State(StateError::SlippageExceeded))
        );
    }

    #[test]
    fn lp_balance_required() {
        let mut store = MemStore::new();
        let actor = Address([1; ADDRESS_LEN]);
        seeded_position(&mut store, &actor);

        let stranger = Address([2; ADDRESS_LEN]);
        assert_eq!(
            RemoveLiquidity {
                asset0: 0,
                asset1: 1,
                lp_amount: 1,
                min_amount0: 0,
                min_amount1: 0,
            }
            .execute(&mut store, &ctx(stranger)),
            Err(ActionError::State(StateError::InsufficientLpBalance))
        );
    }

    #[test]
    fn empty_pool_rejected() {
        let mut store = MemStore::new();
        let actor = Address([1; ADDRESS_LEN]);
        put_pool(
            &mut store,
            &Pool {
                asset0: 0,
                asset1: 1,
                fee_bips: 30,
                reserve0: 0,
                reserve1: 0,
                total_lp: 0,
            },
        )
        .unwrap();
        assert_eq!(
            RemoveLiquidity {
                asset0: 0,
                asset1: 1,
                lp_amount: 1,
                min_amount0: 0,
                min_amount1: 0,
            }
            .execute(&mut store, &ctx(actor)),
            Err(ActionError::State(StateError::InsufficientLiquidity))
        );
    }
}
