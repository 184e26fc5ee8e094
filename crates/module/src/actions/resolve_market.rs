//! Market resolution by the oracle committee.

use veil_storage::{self as storage, market_key, Market, StateError, StateMut};
use veil_types::consts::{MARKET_STATUS_ACTIVE, MARKET_STATUS_RESOLVED, RESOLVE_MARKET_ID};
use veil_types::{Address, Decoder, Encoder, MarketId};

use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};

pub const MAX_SIGNATURE_SIZE: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveMarket {
    pub market_id: MarketId,
    pub outcome: u8,
    pub signature: Vec<u8>,
}

impl Action for ResolveMarket {
    const TYPE_ID: u8 = RESOLVE_MARKET_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 32 + 1 + 4 + self.signature.len());
        enc.put_u8(Self::TYPE_ID);
        enc.put_id(&self.market_id);
        enc.put_u8(self.outcome);
        enc.put_bytes(&self.signature);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let market_id = dec.get_id()?;
        let outcome = dec.get_u8()?;
        let signature = dec.get_bytes(MAX_SIGNATURE_SIZE)?;
        dec.finish()?;
        Ok(Self {
            market_id,
            outcome,
            signature,
        })
    }

    fn state_keys(&self, _actor: &Address) -> KeySet {
        KeySet::new().with(market_key(&self.market_id), Permission::ReadWrite)
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        _ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        if self.signature.is_empty() {
            return Err(ActionError::SignatureEmpty);
        }
        if self.signature.len() > MAX_SIGNATURE_SIZE {
            return Err(ActionError::SignatureTooLarge);
        }

        let market = storage::get_market(store, &self.market_id)?;
        if market.status != MARKET_STATUS_ACTIVE {
            return Err(StateError::MarketNotActive.into());
        }
        if self.outcome >= market.outcomes {
            return Err(StateError::InvalidOutcome.into());
        }

        // TODO(M2): verify the BLS aggregate signature from the oracle
        // committee; today the field is length-checked only.
        storage::put_market(
            store,
            &self.market_id,
            &Market {
                status: MARKET_STATUS_RESOLVED,
                outcomes: market.outcomes,
                resolution_time: market.resolution_time,
                resolved_outcome: self.outcome,
                question: market.question,
            },
        )?;

        Ok(ResolveMarketResult {
            outcome: self.outcome,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveMarketResult {
    pub outcome: u8,
}

impl ResolveMarketResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(2);
        enc.put_u8(RESOLVE_MARKET_ID);
        enc.put_u8(self.outcome);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(RESOLVE_MARKET_ID)?;
        let outcome = dec.get_u8()?;
        dec.finish()?;
        Ok(Self { outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_storage::{put_market, MemStore};
    use veil_types::{TxId, ADDRESS_LEN, ID_LEN};

    fn ctx() -> ExecContext {
        ExecContext::new(1_000, Address([5; ADDRESS_LEN]), TxId([0; ID_LEN]))
    }

    fn seed(store: &mut MemStore) -> MarketId {
        let id = MarketId([1; ID_LEN]);
        put_market(
            store,
            &id,
            &Market {
                status: MARKET_STATUS_ACTIVE,
                outcomes: 3,
                resolution_time: 9_000,
                resolved_outcome: 0,
                question: b"q".to_vec(),
            },
        )
        .unwrap();
        id
    }

    #[test]
    fn wire_round_trip() {
        let a = ResolveMarket {
            market_id: MarketId([1; ID_LEN]),
            outcome: 2,
            signature: vec![0xAB; 96],
        };
        assert_eq!(ResolveMarket::decode(&a.encode()).unwrap(), a);
    }

    #[test]
    fn resolves_and_preserves_question() {
        let mut store = MemStore::new();
        let id = seed(&mut store);

        let a = ResolveMarket {
            market_id: id,
            outcome: 2,
            signature: vec![0xAB; 96],
        };
        let out = a.execute(&mut store, &ctx()).unwrap();
        assert_eq!(ResolveMarketResult::decode(&out).unwrap().outcome, 2);

        let market = storage::get_market(&store, &id).unwrap();
        assert_eq!(market.status, MARKET_STATUS_RESOLVED);
        assert_eq!(market.resolved_outcome, 2);
        assert_eq!(market.question, b"q".to_vec());
    }

    #[test]
    fn out_of_range_outcome_rejected() {
        let mut store = MemStore::new();
        let id = seed(&mut store);
        let a = ResolveMarket {
            market_id: id,
            outcome: 3,
            signature: vec![0xAB; 8],
        };
        assert_eq!(
            a.execute(&mut store, &ctx()),
            Err(ActionError::State(StateError::InvalidOutcome))
        );
    }

    #[test]
    fn double_resolution_rejected() {
        let mut store = MemStore::new();
        let id = seed(&mut store);
        let a = ResolveMarket {
            market_id: id,
            outcome: 1,
            signature: vec![0xAB; 8],
        };
        a.execute(&mut store, &ctx()).unwrap();
        assert_eq!(
            a.execute(&mut store, &ctx()),
            Err(ActionError::State(StateError::MarketNotActive))
        );
    }

    #[test]
    fn signature_length_checked() {
        let mut store = MemStore::new();
        let id = seed(&mut store);
        let a = ResolveMarket {
            market_id: id,
            outcome: 1,
            signature: Vec::new(),
        };
        assert_eq!(
            a.execute(&mut store, &ctx()),
            Err(ActionError::SignatureEmpty)
        );
    }
}
