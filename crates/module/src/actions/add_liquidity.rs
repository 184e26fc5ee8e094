//! Liquidity provision to a constant-product pool.

use veil_storage::{
    self as storage, balance_key, lp_balance_key, math, pool_key, vai_balance_key, StateError,
    StateMut,
};
use veil_types::consts::ADD_LIQUIDITY_ID;
use veil_types::{Address, Decoder, Encoder};

use crate::actions::amm::{map_pair_amounts, sub_asset_balance, validate_asset_pair};
use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidity {
    pub asset0: u8,
    pub asset1: u8,
    pub amount0: u64,
    pub amount1: u64,
    pub min_lp: u64,
}

impl Action for AddLiquidity {
    const TYPE_ID: u8 = ADD_LIQUIDITY_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 2 + 24);
        enc.put_u8(Self::TYPE_ID);
        enc.put_u8(self.asset0);
        enc.put_u8(self.asset1);
        enc.put_u64(self.amount0);
        enc.put_u64(self.amount1);
        enc.put_u64(self.min_lp);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let asset0 = dec.get_u8()?;
        let asset1 = dec.get_u8()?;
        let amount0 = dec.get_u64()?;
        let amount1 = dec.get_u64()?;
        let min_lp = dec.get_u64()?;
        dec.finish()?;
        Ok(Self {
            asset0,
            asset1,
            amount0,
            amount1,
            min_lp,
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
        if self.amount0 == 0 || self.amount1 == 0 {
            return Err(StateError::InvalidLiquidityAmount.into());
        }

        let mut pool = storage::get_pool(store, self.asset0, self.asset1)?;
        let (amount0_pool, amount1_pool) =
            map_pair_amounts(self.asset0, self.asset1, self.amount0, self.amount1, &pool)?;

        sub_asset_balance(store, &ctx.actor, self.asset0, self.amount0)?;
        sub_asset_balance(store, &ctx.actor, self.asset1, self.amount1)?;

        let minted = if pool.total_lp == 0 {
            let product = math::mul_u64(amount0_pool, amount1_pool)?;
            math::int_sqrt(product)
        } else {
            if pool.reserve0 == 0 || pool.reserve1 == 0 {
                return Err(StateError::InsufficientLiquidity.into());
            }
            let lp0 = math::mul_div(amount0_pool, pool.total_lp, pool.reserve0)?;
            let lp1 = math::mul_div(amount1_pool, pool.total_lp, pool.reserve1)?;
            lp0.min(lp1)
        };
        if minted == 0 || minted < self.min_lp {
            return Err(StateError::SlippageExceeded.into());
        }

        pool.reserve0 = math::add_u64(pool.reserve0, amount0_pool)?;
        pool.reserve1 = math::add_u64(pool.reserve1, amount1_pool)?;
        pool.total_lp = math::add_u64(pool.total_lp, minted)?;
        storage::put_pool(store, &pool)?;

        let lp_balance =
            storage::add_lp_balance(store, pool.asset0, pool.asset1, &ctx.actor, minted)?;

        Ok(AddLiquidityResult {
            minted_lp: minted,
            lp_balance,
            reserve0: pool.reserve0,
            reserve1: pool.reserve1,
            total_lp: pool.total_lp,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidityResult {
    pub minted_lp: u64,
    pub lp_balance: u64,
    pub reserve0: u64,
    pub reserve1: u64,
    pub total_lp: u64,
}

impl AddLiquidityResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 40);
        enc.put_u8(ADD_LIQUIDITY_ID);
        enc.put_u64(self.minted_lp);
        enc.put_u64(self.lp_balance);
        enc.put_u64(self.reserve0);
        enc.put_u64(self.reserve1);
        enc.put_u64(self.total_lp);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(ADD_LIQUIDITY_ID)?;
        let minted_lp = dec.get_u64()?;
        let lp_balance = dec.get_u64()?;
        let reserve0 = dec.get_u64()?;
        let reserve1 = dec.get_u64()?;
        let total_lp = dec.get_u64()?;
        dec.finish()?;
        Ok(Self {
            minted_lp,
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
    use veil_storage::{put_pool, Pool, MemStore};
    use veil_types::{TxId, ADDRESS_LEN, ID_LEN};

    fn ctx(actor: Address) -> ExecContext {
        ExecContext::new(1_000, actor, TxId([0; ID_LEN]))
    }

    fn seed_pool(store: &mut MemStore) {
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
    }

    fn fund(store: &mut MemStore, actor: &Address, veil: u64, vai: u64) {
        storage::add_balance(store, actor, veil).unwrap();
        storage::add_vai_balance(store, actor, vai).unwrap();
    }

    #[test]
    fn wire_round_trip() {
        let a = AddLiquidity {
            asset0: 0,
            asset1: 1,
            amount0: 10,
            amount1: 20,
            min_lp: 1,
        };
        assert_eq!(AddLiquidity::decode(&a.encode()).unwrap(), a);
    }

    #[test]
    fn first_deposit_mints_geometric_mean() {
        let mut store = MemStore::new();
        seed_pool(&mut store);
        let actor = Address([1; ADDRESS_LEN]);
        fund(&mut store, &actor, 10_000, 10_000);

        let out = AddLiquidity {
            asset0: 0,
            asset1: 1,
            amount0: 10_000,
            amount1: 10_000,
            min_lp: 1,
        }
        .execute(&mut store, &ctx(actor))
        .unwrap();
        let result = AddLiquidityResult::decode(&out).unwrap();
        assert_eq!(result.minted_lp, 10_000);
        assert_eq!(result.reserve0, 10_000);
        assert_eq!(result.reserve1, 10_000);
        assert_eq!(result.total_lp, 10_000);
        assert_eq!(result.lp_balance, 10_000);
    }

    #[test]
    fn subsequent_deposit_is_proportional() {
        let mut store = MemStore::new();
        seed_pool(&mut store);
        let actor = Address([1; ADDRESS_LEN]);
        fund(&mut store, &actor, 20_000, 20_000);

        AddLiquidity {
            asset0: 0,
            asset1: 1,
            amount0: 10_000,
            amount1: 10_000,
            min_lp: 1,
        }
        .execute(&mut store, &ctx(actor))
        .unwrap();

        // A lopsided deposit mints on the worse side.
        let out = AddLiquidity {
            asset0: 0,
            asset1: 1,
            amount0: 5_000,
            amount1: 2_500,
            min_lp: 1,
        }
        .execute(&mut store, &ctx(actor))
        .unwrap();
        let result = AddLiquidityResult::decode(&out).unwrap();
        assert_eq!(result.minted_lp, 2_500);
    }

    #[test]
    fn orientation_mapped_to_pool_pair() {
        let mut store = MemStore::new();
        seed_pool(&mut store);
        let actor = Address([1; ADDRESS_LEN]);
        fund(&mut store, &actor, 400, 100);

        // Caller supplies (VAI, VEIL); the pool stores (VEIL, VAI).
        let out = AddLiquidity {
            asset0: 1,
            asset1: 0,
            amount0: 100,
            amount1: 400,
            min_lp: 1,
        }
        .execute(&mut store, &ctx(actor))
        .unwrap();
        let result = AddLiquidityResult::decode(&out).unwrap();
        assert_eq!(result.reserve0, 400);
        assert_eq!(result.reserve1, 100);
        assert_eq!(result.minted_lp, 200);
    }

    #[test]
    fn slippage_floor_enforced() {
        let mut store = MemStore::new();
        seed_pool(&mut store);
        let actor = Address([1; ADDRESS_LEN]);
        fund(&mut store, &actor, 10_000, 10_000);

        assert_eq!(
            AddLiquidity {
                asset0: 0,
                asset1: 1,
                amount0: 100,
                amount1: 100,
                min_lp: 101,
            }
            .execute(&mut store, &ctx(actor)),
            Err(ActionError::State(StateError::SlippageExceeded))
        );
    }

    #[test]
    fn zero_amounts_rejected() {
        let mut store = MemStore::new();
        seed_pool(&mut store);
        let actor = Address([1; ADDRESS_LEN]);
        assert_eq!(
            AddLiquidity {
                asset0: 0,
                asset1: 1,
                amount0: 0,
                amount1: 1,
                min_lp: 0,
            }
            .execute(&mut store, &ctx(actor)),
            Err(ActionError::State(StateError::InvalidLiquidityAmount))
        );
    }

    #[test]
    fn missing_pool_rejected() {
        let mut store = MemStore::new();
        let actor = Address([1; ADDRESS_LEN]);
        assert_eq!(
            AddLiquidity {
                asset0: 0,
                asset1: 1,
                amount0: 1,
                amount1: 1,
                min_lp: 0,
            }
            .execute(&mut store, &ctx(actor)),
            Err(ActionError::State(StateError::PoolNotFound))
        );
    }
}
