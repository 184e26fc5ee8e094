//! Epoch-capped release from the locked COL vault to the live float.

use veil_storage::{
    self as storage, math, treasury_config_key, treasury_state_key, StateError, StateMut,
};
use veil_types::consts::{BIPS_DENOMINATOR, RELEASE_COL_TRANCHE_ID};
use veil_types::{Address, Decoder, Encoder};

use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseColTranche {
    pub amount: u64,
}

impl Action for ReleaseColTranche {
    const TYPE_ID: u8 = RELEASE_COL_TRANCHE_ID;

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

    fn state_keys(&self, _actor: &Address) -> KeySet {
        KeySet::new()
            .with(treasury_config_key(), Permission::Read)
            .with(treasury_state_key(), Permission::ReadWrite)
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        if self.amount == 0 {
            return Err(StateError::InvalidReleaseAmount.into());
        }

        let cfg = storage::get_treasury_config(store)?;
        if ctx.actor != cfg.governance {
            return Err(StateError::Unauthorized.into());
        }

        let mut state = storage::get_treasury_state(store)?;
        let next_allowed = state.last_release_unix_ms + cfg.release_epoch_seconds * 1_000;
        if state.last_release_unix_ms > 0 && ctx.timestamp < next_allowed {
            return Err(StateError::ReleaseTooEarly.into());
        }
        if self.amount > state.locked {
            return Err(StateError::InsufficientLockedCol.into());
        }
        let max_release =
            math::mul_div(state.locked, cfg.max_release_bips as u64, BIPS_DENOMINATOR)?;
        if max_release == 0 || self.amount > max_release {
            return Err(StateError::ReleaseCapExceeded.into());
        }

        state.locked -= self.amount;
        state.live = math::add_u64(state.live, self.amount)?;
        state.released = math::add_u64(state.released, self.amount)?;
        state.last_release_unix_ms = ctx.timestamp;
        storage::put_treasury_state(store, &state)?;

        Ok(ReleaseColTrancheResult {
            locked: state.locked,
            live: state.live,
            released: state.released,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseColTrancheResult {
    pub locked: u64,
    pub live: u64,
    pub released: u64,
}

impl ReleaseColTrancheResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 24);
        enc.put_u8(RELEASE_COL_TRANCHE_ID);
        enc.put_u64(self.locked);
        enc.put_u64(self.live);
        enc.put_u64(self.released);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(RELEASE_COL_TRANCHE_ID)?;
        let locked = dec.get_u64()?;
        let live = dec.get_u64()?;
        let released = dec.get_u64()?;
        dec.finish()?;
        Ok(Self {
            locked,
            live,
            released,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_storage::{
        put_treasury_config, put_treasury_state, TreasuryConfig, TreasuryState, MemStore,
    };
    use veil_types::{TxId, ADDRESS_LEN, ID_LEN};

    fn governance() -> Address {
        Address([7; ADDRESS_LEN])
    }

    fn ctx_at(timestamp: i64) -> ExecContext {
        ExecContext::new(timestamp, governance(), TxId([0; ID_LEN]))
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
        put_treasury_state(
            store,
            &TreasuryState {
                locked: 900_000_000,
                live: 0,
                released: 0,
                last_release_unix_ms: 0,
            },
        )
        .unwrap();
    }

    #[test]
    fn wire_round_trip() {
        let a = ReleaseColTranche { amount: 42 };
        assert_eq!(ReleaseColTranche::decode(&a.encode()).unwrap(), a);
    }

    #[test]
    fn cap_and_cadence() {
        let mut store = MemStore::new();
        seed(&mut store);

        // Cap is 900e6 * 15 / 10_000 = 1_350_000.
        assert_eq!(
            ReleaseColTranche { amount: 1_500_000 }.execute(&mut store, &ctx_at(1_000)),
            Err(ActionError::State(StateError::ReleaseCapExceeded))
        );

        let out = ReleaseColTranche { amount: 1_000_000 }
            .execute(&mut store, &ctx_at(1_000))
            .unwrap();
        let result = ReleaseColTrancheResult::decode(&out).unwrap();
        assert_eq!(result.locked, 899_000_000);
        assert_eq!(result.live, 1_000_000);
        assert_eq!(result.released, 1_000_000);

        // Second release inside the epoch.
        assert_eq!(
            ReleaseColTranche { amount: 1 }.execute(&mut store, &ctx_at(2_000)),
            Err(ActionError::State(StateError::ReleaseTooEarly))
        );

        // One full epoch later it opens again.
        ReleaseColTranche { amount: 1 }
            .execute(&mut store, &ctx_at(1_000 + 86_400_000))
            .unwrap();
    }

    #[test]
    fn governance_only() {
        let mut store = MemStore::new();
        seed(&mut store);
        let outsider = ExecContext::new(1_000, Address([9; ADDRESS_LEN]), TxId([0; ID_LEN]));
        assert_eq!(
            ReleaseColTranche { amount: 1 }.execute(&mut store, &outsider),
            Err(ActionError::State(StateError::Unauthorized))
        );
    }

    #[test]
    fn cannot_release_more_than_locked() {
        let mut store = MemStore::new();
        put_treasury_config(
            &mut store,
            &TreasuryConfig {
                governance: governance(),
                operations: Address([8; ADDRESS_LEN]),
                max_release_bips: 10_000,
                release_epoch_seconds: 1,
            },
        )
        .unwrap();
        put_treasury_state(
            &mut store,
            &TreasuryState {
                locked: 100,
                live: 0,
                released: 0,
                last_release_unix_ms: 0,
            },
        )
        .unwrap();

        assert_eq!(
            ReleaseColTranche { amount: 101 }.execute(&mut store, &ctx_at(1_000)),
            Err(ActionError::State(StateError::InsufficientLockedCol))
        );
    }

    #[test]
    fn conservation_across_release() {
        let mut store = MemStore::new();
        seed(&mut store);
        let before = storage::get_treasury_state(&store).unwrap();
        ReleaseColTranche { amount: 1_000_000 }
            .execute(&mut store, &ctx_at(1_000))
            .unwrap();
        let after = storage::get_treasury_state(&store).unwrap();
        assert_eq!(before.locked + before.live, after.locked + after.live);
        assert!(after.released >= before.released);
    }
}
