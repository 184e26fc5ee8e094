//! Native, VAI, and LP balance rows.
//!
//! Balances are eight-byte big-endian integers created lazily and removed
//! when they reach zero; no zero-value row is ever stored.

use veil_types::Address;

use crate::error::StateError;
use crate::keys::{balance_key, lp_balance_key, vai_balance_key};
use crate::math::{add_u64, sub_u64};
use crate::store::{StateMut, StateRead};

fn parse_balance(raw: &[u8]) -> Result<u64, StateError> {
    let bytes: [u8; 8] = raw.try_into().map_err(|_| StateError::InvalidBalance)?;
    Ok(u64::from_be_bytes(bytes))
}

fn read_balance<S: StateRead + ?Sized>(store: &S, key: &[u8]) -> Result<(u64, bool), StateError> {
    match store.get(key)? {
        Some(raw) => Ok((parse_balance(&raw)?, true)),
        None => Ok((0, false)),
    }
}

fn write_balance<S: StateMut + ?Sized>(
    store: &mut S,
    key: Vec<u8>,
    balance: u64,
) -> Result<(), StateError> {
    store.insert(key, balance.to_be_bytes().to_vec())?;
    Ok(())
}

fn credit<S: StateMut + ?Sized>(
    store: &mut S,
    key: Vec<u8>,
    amount: u64,
) -> Result<u64, StateError> {
    let (balance, _) = read_balance(store, &key)?;
    let next = add_u64(balance, amount).map_err(|_| StateError::InvalidBalance)?;
    write_balance(store, key, next)?;
    Ok(next)
}

/// Debit a balance row, deleting it when it reaches zero.
fn debit<S: StateMut + ?Sized>(
    store: &mut S,
    key: Vec<u8>,
    amount: u64,
    missing: StateError,
    underflow: StateError,
) -> Result<u64, StateError> {
    let (balance, exists) = read_balance(store, &key)?;
    if !exists {
        return Err(missing);
    }
    let next = sub_u64(balance, amount).map_err(|_| underflow)?;
    if next == 0 {
        store.remove(&key)?;
        return Ok(0);
    }
    write_balance(store, key, next)?;
    Ok(next)
}

pub fn get_balance<S: StateRead + ?Sized>(store: &S, addr: &Address) -> Result<u64, StateError> {
    Ok(read_balance(store, &balance_key(addr))?.0)
}

pub fn add_balance<S: StateMut + ?Sized>(
    store: &mut S,
    addr: &Address,
    amount: u64,
) -> Result<u64, StateError> {
    credit(store, balance_key(addr), amount)
}

pub fn sub_balance<S: StateMut + ?Sized>(
    store: &mut S,
    addr: &Address,
    amount: u64,
) -> Result<u64, StateError> {
    debit(
        store,
        balance_key(addr),
        amount,
        StateError::InvalidBalance,
        StateError::InvalidBalance,
    )
}

pub fn get_vai_balance<S: StateRead + ?Sized>(
    store: &S,
    addr: &Address,
) -> Result<u64, StateError> {
    Ok(read_balance(store, &vai_balance_key(addr))?.0)
}

pub fn add_vai_balance<S: StateMut + ?Sized>(
    store: &mut S,
    addr: &Address,
    amount: u64,
) -> Result<u64, StateError> {
    credit(store, vai_balance_key(addr), amount)
}

pub fn sub_vai_balance<S: StateMut + ?Sized>(
    store: &mut S,
    addr: &Address,
    amount: u64,
) -> Result<u64, StateError> {
    debit(
        store,
        vai_balance_key(addr),
        amount,
        StateError::InvalidBalance,
        StateError::InvalidBalance,
    )
}

pub fn get_lp_balance<S: StateRead + ?Sized>(
    store: &S,
    asset0: u8,
    asset1: u8,
    addr: &Address,
) -> Result<u64, StateError> {
    Ok(read_balance(store, &lp_balance_key(asset0, asset1, addr))?.0)
}

pub fn add_lp_balance<S: StateMut + ?Sized>(
    store: &mut S,
    asset0: u8,
    asset1: u8,
    addr: &Address,
    amount: u64,
) -> Result<u64, StateError> {
    credit(store, lp_balance_key(asset0, asset1, addr), amount)
}

pub fn sub_lp_balance<S: StateMut + ?Sized>(
    store: &mut S,
    asset0: u8,
    asset1: u8,
    addr: &Address,
    amount: u64,
) -> Result<u64, StateError> {
    debit(
        store,
        lp_balance_key(asset0, asset1, addr),
        amount,
        StateError::InsufficientLpBalance,
        StateError::InsufficientLpBalance,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::balance_key;
    use crate::store::MemStore;
    use veil_types::ADDRESS_LEN;

    fn addr(b: u8) -> Address {
        Address([b; ADDRESS_LEN])
    }

    #[test]
    fn add_then_sub_round_trip() {
        let mut store = MemStore::new();
        let a = addr(1);

        assert_eq!(add_balance(&mut store, &a, 100).unwrap(), 100);
        assert_eq!(add_balance(&mut store, &a, 50).unwrap(), 150);
        assert_eq!(get_balance(&store, &a).unwrap(), 150);
        assert_eq!(sub_balance(&mut store, &a, 75).unwrap(), 75);
    }

    #[test]
    fn zero_balance_row_is_deleted() {
        let mut store = MemStore::new();
        let a = addr(2);

        add_balance(&mut store, &a, 10).unwrap();
        assert!(store.contains_key(&balance_key(&a)));

        assert_eq!(sub_balance(&mut store, &a, 10).unwrap(), 0);
        assert!(!store.contains_key(&balance_key(&a)));
    }

    #[test]
    fn sub_from_missing_row_fails() {
        let mut store = MemStore::new();
        assert_eq!(
            sub_balance(&mut store, &addr(3), 1),
            Err(StateError::InvalidBalance)
        );
    }

    #[test]
    fn sub_more_than_held_fails() {
        let mut store = MemStore::new();
        let a = addr(4);
        add_balance(&mut store, &a, 5).unwrap();
        assert_eq!(
            sub_balance(&mut store, &a, 6),
            Err(StateError::InvalidBalance)
        );
        // Unchanged after the failed debit.
        assert_eq!(get_balance(&store, &a).unwrap(), 5);
    }

    #[test]
    fn add_overflow_fails() {
        let mut store = MemStore::new();
        let a = addr(5);
        add_balance(&mut store, &a, u64::MAX).unwrap();
        assert_eq!(
            add_balance(&mut store, &a, 1),
            Err(StateError::InvalidBalance)
        );
    }

    #[test]
    fn lp_balance_orientation_independent() {
        let mut store = MemStore::new();
        let a = addr(6);
        add_lp_balance(&mut store, 1, 0, &a, 40).unwrap();
        assert_eq!(get_lp_balance(&store, 0, 1, &a).unwrap(), 40);
        assert_eq!(
            sub_lp_balance(&mut store, 0, 1, &a, 41),
            Err(StateError::InsufficientLpBalance)
        );
        assert_eq!(sub_lp_balance(&mut store, 0, 1, &a, 40).unwrap(), 0);
    }

    #[test]
    fn vai_and_native_are_distinct_rows() {
        let mut store = MemStore::new();
        let a = addr(7);
        add_balance(&mut store, &a, 1).unwrap();
        add_vai_balance(&mut store, &a, 2).unwrap();
        assert_eq!(get_balance(&store, &a).unwrap(), 1);
        assert_eq!(get_vai_balance(&store, &a).unwrap(), 2);
    }
}
