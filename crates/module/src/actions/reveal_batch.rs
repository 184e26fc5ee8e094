//! Decryption-share reveal for a batch window.

use std::time::Instant;

use veil_storage::{self as storage, market_key, oracle_key, StateError, StateMut};
use veil_types::consts::{MARKET_STATUS_ACTIVE, REVEAL_BATCH_ID};
use veil_types::{Address, Decoder, Encoder, MarketId};

use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};
use crate::metrics;

pub const MAX_DECRYPTION_SHARE_SIZE: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealBatch {
    pub market_id: MarketId,
    pub window_id: u64,
    pub decryption_share: Vec<u8>,
    pub validator_index: u32,
}

impl Action for RevealBatch {
    const TYPE_ID: u8 = REVEAL_BATCH_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc =
            Encoder::with_capacity(1 + 32 + 8 + 4 + self.decryption_share.len() + 4);
        enc.put_u8(Self::TYPE_ID);
        enc.put_id(&self.market_id);
        enc.put_u64(self.window_id);
        enc.put_bytes(&self.decryption_share);
        enc.put_u32(self.validator_index);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let market_id = dec.get_id()?;
        let window_id = dec.get_u64()?;
        let decryption_share = dec.get_bytes(MAX_DECRYPTION_SHARE_SIZE)?;
        let validator_index = dec.get_u32()?;
        dec.finish()?;
        Ok(Self {
            market_id,
            window_id,
            decryption_share,
            validator_index,
        })
    }

    fn state_keys(&self, _actor: &Address) -> KeySet {
        KeySet::new()
            .with(market_key(&self.market_id), Permission::Read)
            .with(
                oracle_key(&self.market_id, self.validator_index),
                Permission::All,
            )
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        let start = Instant::now();
        let result = self.apply(store, ctx);
        metrics::collector().record_reveal(
            &self.market_id,
            self.window_id,
            start.elapsed(),
            result.as_ref().err().map(|e| e.to_string()).as_deref(),
        );
        result
    }
}

impl RevealBatch {
    fn apply(&self, store: &mut dyn StateMut, _ctx: &ExecContext) -> Result<Vec<u8>, ActionError> {
        if self.decryption_share.is_empty() {
            return Err(ActionError::DecryptionShareEmpty);
        }
        if self.decryption_share.len() > MAX_DECRYPTION_SHARE_SIZE {
            return Err(ActionError::DecryptionShareTooLarge);
        }

        let market = storage::get_market(store, &self.market_id)?;
        if market.status != MARKET_STATUS_ACTIVE {
            return Err(StateError::MarketNotActive.into());
        }

        // TODO(M2): require oracle/committee authorization for reveal submissions.
        storage::put_oracle_share(
            store,
            &self.market_id,
            self.validator_index,
            self.window_id,
            &self.decryption_share,
        )?;

        Ok(RevealBatchResult {
            validator_index: self.validator_index,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealBatchResult {
    pub validator_index: u32,
}

impl RevealBatchResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 4);
        enc.put_u8(REVEAL_BATCH_ID);
        enc.put_u32(self.validator_index);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(REVEAL_BATCH_ID)?;
        let validator_index = dec.get_u32()?;
        dec.finish()?;
        Ok(Self { validator_index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_storage::{put_market, Market, MemStore, StateRead};
    use veil_types::{TxId, ADDRESS_LEN, ID_LEN};

    fn ctx() -> ExecContext {
        ExecContext::new(1_000, Address([5; ADDRESS_LEN]), TxId([0; ID_LEN]))
    }

    fn action() -> RevealBatch {
        RevealBatch {
            market_id: MarketId([1; ID_LEN]),
            window_id: 4,
            decryption_share: vec![0xAB; 48],
            validator_index: 2,
        }
    }

    fn active_market(store: &mut MemStore, id: &MarketId) {
        put_market(
            store,
            id,
            &Market {
                status: MARKET_STATUS_ACTIVE,
                outcomes: 2,
                resolution_time: 9_999,
                resolved_outcome: 0,
                question: Vec::new(),
            },
        )
        .unwrap();
    }

    #[test]
    fn wire_round_trip() {
        let a = action();
        assert_eq!(RevealBatch::decode(&a.encode()).unwrap(), a);
    }

    #[test]
    fn stores_share_under_validator_slot() {
        let mut store = MemStore::new();
        let a = action();
        active_market(&mut store, &a.market_id);

        let out = a.execute(&mut store, &ctx()).unwrap();
        assert_eq!(RevealBatchResult::decode(&out).unwrap().validator_index, 2);

        let raw = store
            .get(&oracle_key(&a.market_id, 2))
            .unwrap()
            .unwrap();
        assert_eq!(&raw[..8], &4u64.to_be_bytes());
        assert_eq!(&raw[8..], a.decryption_share.as_slice());
    }

    #[test]
    fn reserved_dispute_slot_rejected() {
        let mut store = MemStore::new();
        let mut a = action();
        active_market(&mut store, &a.market_id);
        a.validator_index = u32::MAX;
        assert_eq!(
            a.execute(&mut store, &ctx()),
            Err(ActionError::State(StateError::ReservedValidatorIndex))
        );
    }

    #[test]
    fn share_bounds_checked() {
        let mut store = MemStore::new();

        let mut a = action();
        a.decryption_share = Vec::new();
        assert_eq!(
            a.execute(&mut store, &ctx()),
            Err(ActionError::DecryptionShareEmpty)
        );

        let mut a = action();
        a.decryption_share = vec![0; MAX_DECRYPTION_SHARE_SIZE + 1];
        assert_eq!(
            a.execute(&mut store, &ctx()),
            Err(ActionError::DecryptionShareTooLarge)
        );
    }

    #[test]
    fn last_write_wins_per_slot() {
        let mut store = MemStore::new();
        let mut a = action();
        active_market(&mut store, &a.market_id);

        a.execute(&mut store, &ctx()).unwrap();
        a.decryption_share = vec![0xCD; 16];
        a.window_id = 9;
        a.execute(&mut store, &ctx()).unwrap();

        let raw = store
            .get(&oracle_key(&a.market_id, 2))
            .unwrap()
            .unwrap();
        assert_eq!(&raw[..8], &9u64.to_be_bytes());
        assert_eq!(&raw[8..], vec![0xCD; 16].as_slice());
    }
}
