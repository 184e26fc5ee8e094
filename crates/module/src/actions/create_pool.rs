//! AMM pool creation (governance-gated).

use veil_storage::{
    self as storage, pool_key, sorted_asset_pair, treasury_config_key, Pool, StateError,
    StateMut,
};
use veil_types::consts::CREATE_POOL_ID;
use veil_types::{Address, Decoder, Encoder};

use crate::actions::amm::{validate_asset_pair, MAX_POOL_FEE_BIPS, MIN_POOL_FEE_BIPS};
use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatePool {
    pub asset0: u8,
    pub asset1: u8,
    pub fee_bips: u16,
}

impl Action for CreatePool {
    const TYPE_ID: u8 = CREATE_POOL_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 1 + 1 + 2);
        enc.put_u8(Self::TYPE_ID);
        enc.put_u8(self.asset0);
        enc.put_u8(self.asset1);
        enc.put_u16(self.fee_bips);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let asset0 = dec.get_u8()?;
        let asset1 = dec.get_u8()?;
        let fee_bips = dec.get_u16()?;
        dec.finish()?;
        Ok(Self {
            asset0,
            asset1,
            fee_bips,
        })
    }

    fn state_keys(&self, _actor: &Address) -> KeySet {
        KeySet::new()
            .with(treasury_config_key(), Permission::Read)
            .with(pool_key(self.asset0, self.asset1), Permission::All)
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        validate_asset_pair(self.asset0, self.asset1)?;
        if self.fee_bips < MIN_POOL_FEE_BIPS || self.fee_bips > MAX_POOL_FEE_BIPS {
            return Err(StateError::InvalidPoolFee.into());
        }
        let cfg = storage::get_treasury_config(store)?;
        if ctx.actor != cfg.governance {
            return Err(StateError::Unauthorized.into());
        }
        match storage::get_pool(store, self.asset0, self.asset1) {
            Ok(_) => return Err(StateError::PoolExists.into()),
            Err(StateError::PoolNotFound) => {}
            Err(err) => return Err(err.into()),
        }

        let (asset0, asset1) = sorted_asset_pair(self.asset0, self.asset1);
        let pool = Pool {
            asset0,
            asset1,
            fee_bips: self.fee_bips,
            reserve0: 0,
            reserve1: 0,
            total_lp: 0,
        };
        storage::put_pool(store, &pool)?;

        Ok(CreatePoolResult {
            asset0: pool.asset0,
            asset1: pool.asset1,
            fee_bips: pool.fee_bips,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatePoolResult {
    pub asset0: u8,
    pub asset1: u8,
    pub fee_bips: u16,
}

impl CreatePoolResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 4);
        enc.put_u8(CREATE_POOL_ID);
        enc.put_u8(self.asset0);
        enc.put_u8(self.asset1);
        enc.put_u16(self.fee_bips);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(CREATE_POOL_ID)?;
        let asset0 = dec.get_u8()?;
        let asset1 = dec.get_u8()?;
        let fee_bips = dec.get_u16()?;
        dec.finish()?;
        Ok(Self {
            asset0,
            asset1,
            fee_bips,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_storage::{put_treasury_config, MemStore, TreasuryConfig};
    use veil_types::{TxId, ADDRESS_LEN, ID_LEN};

    fn governance() -> Address {
        Address([7; ADDRESS_LEN])
    }

    fn ctx() -> ExecContext {
        ExecContext::new(1_000, governance(), TxId([0; ID_LEN]))
    }

    fn seed(store: &mut MemStore) {
        put_treasury_config(
            store,
            &TreasuryConfig {
                governance: governance(),
                operations: Address([8; ADDRESS_LEN]),
                max_release_bips: 15,
                release_epoch_seconds: 86_400,
            },
        )
        .unwrap();
    }

    #[test]
    fn wire_round_trip() {
        let a = CreatePool {
            asset0: 1,
            asset1: 0,
            fee_bips: 30,
        };
        assert_eq!(CreatePool::decode(&a.encode()).unwrap(), a);
    }

    #[test]
    fn creates_sorted_zero_reserve_pool() {
        let mut store = MemStore::new();
        seed(&mut store);

        let out = CreatePool {
            asset0: 1,
            asset1: 0,
            fee_bips: 30,
        }
        .execute(&mut store, &ctx())
        .unwrap();
        let result = CreatePoolResult::decode(&out).unwrap();
        assert_eq!((result.asset0, result.asset1), (0, 1));

        let pool = storage::get_pool(&store, 0, 1).unwrap();
        assert_eq!(pool.total_lp, 0);
        assert_eq!(pool.fee_bips, 30);
    }

    #[test]
    fn duplicate_pool_rejected_either_orientation() {
        let mut store = MemStore::new();
        seed(&mut store);
        CreatePool {
            asset0: 0,
            asset1: 1,
            fee_bips: 30,
        }
        .execute(&mut store, &ctx())
        .unwrap();

        assert_eq!(
            CreatePool {
                asset0: 1,
                asset1: 0,
                fee_bips: 5,
            }
            .execute(&mut store, &ctx()),
            Err(ActionError::State(StateError::PoolExists))
        );
    }

    #[test]
    fn fee_and_pair_validation() {
        let mut store = MemStore::new();
        seed(&mut store);
        assert_eq!(
            CreatePool {
                asset0: 0,
                asset1: 0,
                fee_bips: 30,
            }
            .execute(&mut store, &ctx()),
            Err(ActionError::State(StateError::InvalidAssetPair))
        );
        assert_eq!(
            CreatePool {
                asset0: 0,
                asset1: 1,
                fee_bips: 0,
            }
            .execute(&mut store, &ctx()),
            Err(ActionError::State(StateError::InvalidPoolFee))
        );
        assert_eq!(
            CreatePool {
                asset0: 0,
                asset1: 1,
                fee_bips: 1_001,
            }
            .execute(&mut store, &ctx()),
            Err(ActionError::State(StateError::InvalidPoolFee))
        );
    }

    #[test]
    fn governance_only() {
        let mut store = MemStore::new();
        seed(&mut store);
        let outsider = ExecContext::new(1_000, Address([9; ADDRESS_LEN]), TxId([0; ID_LEN]));
        assert_eq!(
            CreatePool {
                asset0: 0,
                asset1: 1,
                fee_bips: 30,
            }
            .execute(&mut store, &outsider),
            Err(ActionError::State(StateError::Unauthorized))
        );
    }
}
