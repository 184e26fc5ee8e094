//! Sealed order commitment into a batch window.

use std::time::Instant;

use veil_storage::{self as storage, commitment_key, market_key, StateError, StateMut};
use veil_types::consts::{COMMIT_ORDER_ID, MARKET_STATUS_ACTIVE};
use veil_types::{Address, Decoder, Encoder, MarketId};

use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};
use crate::metrics;

pub const MAX_ENVELOPE_SIZE: usize = 4096;
pub const MAX_COMMITMENT_SIZE: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOrder {
    pub market_id: MarketId,
    pub window_id: u64,
    pub envelope: Vec<u8>,
    pub commitment: Vec<u8>,
}

impl Action for CommitOrder {
    const TYPE_ID: u8 = COMMIT_ORDER_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(
            1 + 32 + 8 + 4 + self.envelope.len() + 4 + self.commitment.len(),
        );
        enc.put_u8(Self::TYPE_ID);
        enc.put_id(&self.market_id);
        enc.put_u64(self.window_id);
        enc.put_bytes(&self.envelope);
        enc.put_bytes(&self.commitment);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let market_id = dec.get_id()?;
        let window_id = dec.get_u64()?;
        let envelope = dec.get_bytes(MAX_ENVELOPE_SIZE)?;
        let commitment = dec.get_bytes(MAX_COMMITMENT_SIZE)?;
        dec.finish()?;
        Ok(Self {
            market_id,
            window_id,
            envelope,
            commitment,
        })
    }

    fn state_keys(&self, actor: &Address) -> KeySet {
        KeySet::new()
            .with(market_key(&self.market_id), Permission::Read)
            .with(
                commitment_key(&self.market_id, self.window_id, actor),
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
        metrics::collector().record_commit(
            &self.market_id,
            self.window_id,
            ctx.timestamp,
            start.elapsed(),
            result.as_ref().err().map(|e| e.to_string()).as_deref(),
        );
        result
    }
}

impl CommitOrder {
    fn apply(&self, store: &mut dyn StateMut, ctx: &ExecContext) -> Result<Vec<u8>, ActionError> {
        if self.envelope.is_empty() {
            return Err(ActionError::EnvelopeEmpty);
        }
        if self.envelope.len() > MAX_ENVELOPE_SIZE {
            return Err(ActionError::EnvelopeTooLarge);
        }
        if self.commitment.is_empty() {
            return Err(ActionError::CommitmentEmpty);
        }
        if self.commitment.len() > MAX_COMMITMENT_SIZE {
            return Err(ActionError::CommitmentTooLarge);
        }

        let market = storage::get_market(store, &self.market_id)?;
        if market.status != MARKET_STATUS_ACTIVE {
            return Err(StateError::MarketNotActive.into());
        }

        // TODO(M2): lock collateral at commit time to make commitments economically binding.
        storage::put_commitment(
            store,
            &self.market_id,
            self.window_id,
            &ctx.actor,
            &self.envelope,
            &self.commitment,
        )?;

        Ok(CommitOrderResult {
            window_id: self.window_id,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOrderResult {
    pub window_id: u64,
}

impl CommitOrderResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 8);
        enc.put_u8(COMMIT_ORDER_ID);
        enc.put_u64(self.window_id);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(COMMIT_ORDER_ID)?;
        let window_id = dec.get_u64()?;
        dec.finish()?;
        Ok(Self { window_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_storage::{put_market, Market, MemStore, StateRead};
    use veil_types::consts::MARKET_STATUS_RESOLVED;
    use veil_types::{TxId, ADDRESS_LEN, ID_LEN};

    fn ctx(actor: Address) -> ExecContext {
        ExecContext::new(1_000, actor, TxId([0; ID_LEN]))
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

    fn action() -> CommitOrder {
        CommitOrder {
            market_id: MarketId([1; ID_LEN]),
            window_id: 3,
            envelope: vec![0xEE; 96],
            commitment: vec![0xCC; 32],
        }
    }

    #[test]
    fn wire_round_trip() {
        let a = action();
        assert_eq!(CommitOrder::decode(&a.encode()).unwrap(), a);
    }

    #[test]
    fn stores_commitment_for_active_market() {
        let mut store = MemStore::new();
        let a = action();
        active_market(&mut store, &a.market_id);
        let actor = Address([5; ADDRESS_LEN]);

        let out = a.execute(&mut store, &ctx(actor)).unwrap();
        assert_eq!(CommitOrderResult::decode(&out).unwrap().window_id, 3);
        assert!(store.contains_key(&commitment_key(&a.market_id, 3, &actor)));
    }

    #[test]
    fn resubmission_overwrites_within_window() {
        let mut store = MemStore::new();
        let mut a = action();
        active_market(&mut store, &a.market_id);
        let actor = Address([5; ADDRESS_LEN]);

        a.execute(&mut store, &ctx(actor)).unwrap();
        a.commitment = vec![0xDD; 32];
        a.execute(&mut store, &ctx(actor)).unwrap();

        let raw = store
            .get(&commitment_key(&a.market_id, 3, &actor))
            .unwrap()
            .unwrap();
        assert_eq!(&raw[raw.len() - 32..], vec![0xDD; 32].as_slice());
    }

    #[test]
    fn inactive_market_rejected() {
        let mut store = MemStore::new();
        let a = action();
        put_market(
            &mut store,
            &a.market_id,
            &Market {
                status: MARKET_STATUS_RESOLVED,
                outcomes: 2,
                resolution_time: 9_999,
                resolved_outcome: 1,
                question: Vec::new(),
            },
        )
        .unwrap();
        assert_eq!(
            a.execute(&mut store, &ctx(Address([5; ADDRESS_LEN]))),
            Err(ActionError::State(StateError::MarketNotActive))
        );
    }

    #[test]
    fn bounds_checked() {
        let mut store = MemStore::new();
        let actor = Address([5; ADDRESS_LEN]);

        let mut a = action();
        a.envelope = Vec::new();
        assert_eq!(
            a.execute(&mut store, &ctx(actor)),
            Err(ActionError::EnvelopeEmpty)
        );

        let mut a = action();
        a.envelope = vec![0; MAX_ENVELOPE_SIZE + 1];
        assert_eq!(
            a.execute(&mut store, &ctx(actor)),
            Err(ActionError::EnvelopeTooLarge)
        );

        let mut a = action();
        a.commitment = vec![0; MAX_COMMITMENT_SIZE + 1];
        assert_eq!(
            a.execute(&mut store, &ctx(actor)),
            Err(ActionError::CommitmentTooLarge)
        );
    }

    #[test]
    fn missing_market_rejected() {
        let mut store = MemStore::new();
        assert_eq!(
            action().execute(&mut store, &ctx(Address([5; ADDRESS_LEN]))),
            Err(ActionError::State(StateError::MarketNotFound))
        );
    }
}
