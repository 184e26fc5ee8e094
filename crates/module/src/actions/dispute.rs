//! Dispute of a resolved market.

use veil_storage::{
    self as storage, balance_key, dispute_key, market_key, Market, StateError, StateMut,
};
use veil_types::consts::{DISPUTE_ID, MARKET_STATUS_DISPUTED, MARKET_STATUS_RESOLVED};
use veil_types::{Address, Decoder, Encoder, MarketId};

use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};

pub const MAX_EVIDENCE_SIZE: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispute {
    pub market_id: MarketId,
    pub bond: u64,
    pub evidence: Vec<u8>,
}

impl Action for Dispute {
    const TYPE_ID: u8 = DISPUTE_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 32 + 8 + 4 + self.evidence.len());
        enc.put_u8(Self::TYPE_ID);
        enc.put_id(&self.market_id);
        enc.put_u64(self.bond);
        enc.put_bytes(&self.evidence);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let market_id = dec.get_id()?;
        let bond = dec.get_u64()?;
        let evidence = dec.get_bytes(MAX_EVIDENCE_SIZE)?;
        dec.finish()?;
        Ok(Self {
            market_id,
            bond,
            evidence,
        })
    }

    fn state_keys(&self, actor: &Address) -> KeySet {
        KeySet::new()
            .with(balance_key(actor), Permission::ReadWrite)
            .with(market_key(&self.market_id), Permission::ReadWrite)
            .with(dispute_key(&self.market_id), Permission::All)
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        if self.bond == 0 {
            return Err(ActionError::BondZero);
        }
        if self.evidence.is_empty() {
            return Err(ActionError::EvidenceEmpty);
        }
        if self.evidence.len() > MAX_EVIDENCE_SIZE {
            return Err(ActionError::EvidenceTooLarge);
        }

        let market = storage::get_market(store, &self.market_id)?;
        if market.status != MARKET_STATUS_RESOLVED {
            return Err(StateError::MarketNotResolved.into());
        }

        let disputer_balance = storage::sub_balance(store, &ctx.actor, self.bond)?;

        storage::put_market(
            store,
            &self.market_id,
            &Market {
                status: MARKET_STATUS_DISPUTED,
                outcomes: market.outcomes,
                resolution_time: market.resolution_time,
                resolved_outcome: market.resolved_outcome,
                question: market.question,
            },
        )?;
        storage::put_dispute(store, &self.market_id, self.bond, &self.evidence)?;

        Ok(DisputeResult { disputer_balance }.encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisputeResult {
    pub disputer_balance: u64,
}

impl DisputeResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 8);
        enc.put_u8(DISPUTE_ID);
        enc.put_u64(self.disputer_balance);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(DISPUTE_ID)?;
        let disputer_balance = dec.get_u64()?;
        dec.finish()?;
        Ok(Self { disputer_balance })
    }
}
