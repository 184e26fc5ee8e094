//! Prediction-market creation.

use veil_storage::{self as storage, balance_key, market_key, Market, StateError, StateMut};
use veil_types::consts::{CREATE_MARKET_ID, MARKET_STATUS_ACTIVE};
use veil_types::{Address, Decoder, Encoder, MarketId};

use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};

pub const MAX_QUESTION_SIZE: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMarket {
    pub market_id: MarketId,
    pub question: Vec<u8>,
    pub outcomes: u8,
    pub resolution_time: i64,
    pub creator_bond: u64,
}

impl Action for CreateMarket {
    const TYPE_ID: u8 = CREATE_MARKET_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 32 + 4 + self.question.len() + 1 + 8 + 8);
        enc.put_u8(Self::TYPE_ID);
        enc.put_id(&self.market_id);
        enc.put_bytes(&self.question);
        enc.put_u8(self.outcomes);
        enc.put_i64(self.resolution_time);
        enc.put_u64(self.creator_bond);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let market_id = dec.get_id()?;
        let question = dec.get_bytes(MAX_QUESTION_SIZE)?;
        let outcomes = dec.get_u8()?;
        let resolution_time = dec.get_i64()?;
        let creator_bond = dec.get_u64()?;
        dec.finish()?;
        Ok(Self {
            market_id,
            question,
            outcomes,
            resolution_time,
            creator_bond,
        })
    }

    fn state_keys(&self, actor: &Address) -> KeySet {
        KeySet::new()
            .with(balance_key(actor), Permission::ReadWrite)
            .with(market_key(&self.market_id), Permission::All)
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        if self.outcomes < 2 {
            return Err(ActionError::InvalidOutcomes);
        }
        if self.resolution_time <= 0 {
            return Err(ActionError::InvalidResolutionTime);
        }
        if self.creator_bond == 0 {
            return Err(ActionError::CreatorBondZero);
        }
        if self.question.len() > MAX_QUESTION_SIZE {
            return Err(ActionError::QuestionTooLarge);
        }

        // Reject duplicate market IDs to avoid silent overwrites.
        match storage::get_market(store, &self.market_id) {
            Ok(_) => return Err(StateError::MarketExists.into()),
            Err(StateError::MarketNotFound) => {}
            Err(err) => return Err(err.into()),
        }

        let sender_balance = storage::sub_balance(store, &ctx.actor, self.creator_bond)?;
        storage::put_market(
            store,
            &self.market_id,
            &Market {
                status: MARKET_STATUS_ACTIVE,
                outcomes: self.outcomes,
                resolution_time: self.resolution_time,
                resolved_outcome: 0,
                question: self.question.clone(),
            },
        )?;

        Ok(CreateMarketResult { sender_balance }.encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateMarketResult {
    pub sender_balance: u64,
}

impl CreateMarketResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 8);
        enc.put_u8(CREATE_MARKET_ID);
        enc.put_u64(self.sender_balance);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(CREATE_MARKET_ID)?;
        let sender_balance = dec.get_u64()?;
        dec.finish()?;
        Ok(Self { sender_balance })
    }
}
