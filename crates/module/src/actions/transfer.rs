//! Native asset transfer.

use veil_storage::{self as storage, balance_key, StateMut};
use veil_types::consts::TRANSFER_ID;
use veil_types::{Address, Decoder, Encoder};

use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};

pub const MAX_MEMO_SIZE: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub to: Address,
    pub value: u64,
    pub memo: Vec<u8>,
}

impl Action for Transfer {
    const TYPE_ID: u8 = TRANSFER_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 33 + 8 + 4 + self.memo.len());
        enc.put_u8(Self::TYPE_ID);
        enc.put_address(&self.to);
        enc.put_u64(self.value);
        enc.put_bytes(&self.memo);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let to = dec.get_address()?;
        let value = dec.get_u64()?;
        let memo = dec.get_bytes(MAX_MEMO_SIZE)?;
        dec.finish()?;
        Ok(Self { to, value, memo })
    }

    fn state_keys(&self, actor: &Address) -> KeySet {
        KeySet::new()
            .with(balance_key(actor), Permission::ReadWrite)
            .with(balance_key(&self.to), Permission::All)
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        if self.value == 0 {
            return Err(ActionError::ValueZero);
        }
        if self.memo.len() > MAX_MEMO_SIZE {
            return Err(ActionError::MemoTooLarge);
        }
        let sender_balance = storage::sub_balance(store, &ctx.actor, self.value)?;
        let receiver_balance = storage::add_balance(store, &self.to, self.value)?;
        Ok(TransferResult {
            sender_balance,
            receiver_balance,
        }
        .encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferResult {
    pub sender_balance: u64,
    pub receiver_balance: u64,
}

impl TransferResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 16);
        enc.put_u8(TRANSFER_ID);
        enc.put_u64(self.sender_balance);
        enc.put_u64(self.receiver_balance);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(TRANSFER_ID)?;
        let sender_balance = dec.get_u64()?;
        let receiver_balance = dec.get_u64()?;
        dec.finish()?;
        Ok(Self {
            sender_balance,
            receiver_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_storage::{MemStore, StateError};
    use veil_types::{TxId, ADDRESS_LEN, ID_LEN};

    fn ctx(actor: Address) -> ExecContext {
        ExecContext::new(1_000, actor, TxId([0; ID_LEN]))
    }

    fn addr(b: u8) -> Address {
        Address([b; ADDRESS_LEN])
    }

    #[test]
    fn wire_round_trip() {
        let action = Transfer {
            to: addr(2),
            value: 77,
            memo: b"hello".to_vec(),
        };
        let bytes = action.encode();
        assert_eq!(bytes[0], TRANSFER_ID);
        assert_eq!(Transfer::decode(&bytes).unwrap(), action);
    }

    #[test]
    fn decode_rejects_oversized_memo() {
        let action = Transfer {
            to: addr(2),
            value: 1,
            memo: vec![0; MAX_MEMO_SIZE + 1],
        };
        assert!(Transfer::decode(&action.encode()).is_err());
    }

    #[test]
    fn moves_value_between_accounts() {
        let mut store = MemStore::new();
        let sender = addr(1);
        storage::add_balance(&mut store, &sender, 100).unwrap();

        let action = Transfer {
            to: addr(2),
            value: 40,
            memo: Vec::new(),
        };
        let out = action.execute(&mut store, &ctx(sender)).unwrap();
        let result = TransferResult::decode(&out).unwrap();
        assert_eq!(result.sender_balance, 60);
        assert_eq!(result.receiver_balance, 40);
    }

    #[test]
    fn zero_value_rejected() {
        let mut store = MemStore::new();
        let action = Transfer {
            to: addr(2),
            value: 0,
            memo: Vec::new(),
        };
        assert_eq!(
            action.execute(&mut store, &ctx(addr(1))),
            Err(ActionError::ValueZero)
        );
    }

    #[test]
    fn insufficient_balance_rejected() {
        let mut store = MemStore::new();
        let sender = addr(1);
        storage::add_balance(&mut store, &sender, 10).unwrap();
        let action = Transfer {
            to: addr(2),
            value: 11,
            memo: Vec::new(),
        };
        assert_eq!(
            action.execute(&mut store, &ctx(sender)),
            Err(ActionError::State(StateError::InvalidBalance))
        );
    }

    #[test]
    fn declares_both_balance_keys() {
        let actor = addr(1);
        let action = Transfer {
            to: addr(2),
            value: 1,
            memo: Vec::new(),
        };
        let keys = action.state_keys(&actor);
        assert_eq!(keys.len(), 2);
        assert_eq!(
            keys.permission(&balance_key(&actor)),
            Some(Permission::ReadWrite)
        );
        assert_eq!(keys.permission(&balance_key(&addr(2))), Some(Permission::All));
    }
}
