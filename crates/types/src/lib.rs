//! Core type definitions for the veil market module.
//!
//! This crate provides the shared identifiers, consensus constants, and the
//! big-endian wire codec used across the module:
//!
//! - Fixed-width identities (33-byte addresses, 32-byte market/tx IDs)
//! - Stable action type IDs and proof/circuit/asset constants
//! - The `Encoder`/`Decoder` pair every action and result serializes through

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

pub mod codec;
pub mod consts;

pub use codec::{CodecError, Decoder, Encoder};

/// Length of an account address in bytes.
pub const ADDRESS_LEN: usize = 33;

/// Length of a market or transaction identifier in bytes.
pub const ID_LEN: usize = 32;

/// A fixed 33-byte account identity.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(#[serde_as(as = "[_; 33]")] pub [u8; ADDRESS_LEN]);

impl Address {
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

/// A 32-byte opaque market identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketId(pub [u8; ID_LEN]);

impl MarketId {
    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }
}

impl From<[u8; ID_LEN]> for MarketId {
    fn from(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }
}

/// A 32-byte transaction identifier assigned by the host runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub [u8; ID_LEN]);

impl TxId {
    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }
}

impl From<[u8; ID_LEN]> for TxId {
    fn from(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }
}
