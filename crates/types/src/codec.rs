//! Big-endian wire codec for actions and results.
//!
//! Every action payload is `type_id(u8) ‖ body`, where the body is the
//! fixed-field serialization produced here: integers big-endian, byte fields
//! prefixed with a `u32` length, addresses 33 bytes, IDs 32 bytes, bools one
//! byte. Results reuse the same leading type byte so clients can decode
//! typed returns.

use thiserror::Error;

use crate::{Address, MarketId, TxId, ADDRESS_LEN, ID_LEN};

/// Errors surfaced while encoding or decoding wire payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unexpected end of buffer at offset {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("trailing bytes after decode: {remaining}")]
    TrailingBytes { remaining: usize },

    #[error("unexpected type id: {got} != {want}")]
    TypeIdMismatch { got: u8, want: u8 },

    #[error("unknown type id: {0}")]
    UnknownTypeId(u8),

    #[error("cannot decode empty payload")]
    EmptyPayload,

    #[error("byte field length {len} exceeds limit {limit}")]
    FieldTooLarge { len: usize, limit: usize },

    #[error("invalid bool byte: {0}")]
    InvalidBool(u8),
}

/// Append-only big-endian encoder.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    pub fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Signed timestamps travel as their two's-complement u64 image.
    pub fn put_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&(v as u64).to_be_bytes());
    }

    pub fn put_address(&mut self, addr: &Address) {
        self.buf.extend_from_slice(&addr.0);
    }

    pub fn put_id(&mut self, id: &MarketId) {
        self.buf.extend_from_slice(&id.0);
    }

    pub fn put_tx_id(&mut self, id: &TxId) {
        self.buf.extend_from_slice(&id.0);
    }

    /// Length-prefixed byte field (`u32` big-endian length, then the bytes).
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.put_u32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor-based big-endian decoder over a borrowed buffer.
#[derive(Debug)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Consume and check the leading action/result type byte.
    pub fn expect_type_id(&mut self, want: u8) -> Result<(), CodecError> {
        if self.buf.is_empty() {
            return Err(CodecError::EmptyPayload);
        }
        let got = self.get_u8()?;
        if got != want {
            return Err(CodecError::TypeIdMismatch { got, want });
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.buf.len() - self.offset < n {
            return Err(CodecError::UnexpectedEnd {
                offset: self.offset,
            });
        }
        let slice = &self.buf[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    pub fn get_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_bool(&mut self) -> Result<bool, CodecError> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    pub fn get_u16(&mut self) -> Result<u16, CodecError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn get_u32(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn get_u64(&mut self) -> Result<u64, CodecError> {
        let b = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(u64::from_be_bytes(raw))
    }

    pub fn get_i64(&mut self) -> Result<i64, CodecError> {
        Ok(self.get_u64()? as i64)
    }

    pub fn get_address(&mut self) -> Result<Address, CodecError> {
        let b = self.take(ADDRESS_LEN)?;
        let mut raw = [0u8; ADDRESS_LEN];
        raw.copy_from_slice(b);
        Ok(Address(raw))
    }

    pub fn get_id(&mut self) -> Result<MarketId, CodecError> {
        let b = self.take(ID_LEN)?;
        let mut raw = [0u8; ID_LEN];
        raw.copy_from_slice(b);
        Ok(MarketId(raw))
    }

    pub fn get_tx_id(&mut self) -> Result<TxId, CodecError> {
        let b = self.take(ID_LEN)?;
        let mut raw = [0u8; ID_LEN];
        raw.copy_from_slice(b);
        Ok(TxId(raw))
    }

    /// Length-prefixed byte field, bounded by `limit`.
    pub fn get_bytes(&mut self, limit: usize) -> Result<Vec<u8>, CodecError> {
        let len = self.get_u32()? as usize;
        if len > limit {
            return Err(CodecError::FieldTooLarge { len, limit });
        }
        Ok(self.take(len)?.to_vec())
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Require the buffer to be fully consumed.
    pub fn finish(self) -> Result<(), CodecError> {
        if self.offset != self.buf.len() {
            return Err(CodecError::TrailingBytes {
                remaining: self.buf.len() - self.offset,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip() {
        let mut enc = Encoder::new();
        enc.put_u8(0xAB);
        enc.put_u16(0x1234);
        enc.put_u32(0xDEAD_BEEF);
        enc.put_u64(0x0102_0304_0506_0708);
        enc.put_i64(-5);
        enc.put_bool(true);
        let bytes = enc.into_bytes();

        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.get_u8().unwrap(), 0xAB);
        assert_eq!(dec.get_u16().unwrap(), 0x1234);
        assert_eq!(dec.get_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(dec.get_u64().unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(dec.get_i64().unwrap(), -5);
        assert!(dec.get_bool().unwrap());
        dec.finish().unwrap();
    }

    #[test]
    fn big_endian_layout() {
        let mut enc = Encoder::new();
        enc.put_u64(1);
        assert_eq!(enc.into_bytes(), vec![0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn bytes_round_trip_and_limit() {
        let mut enc = Encoder::new();
        enc.put_bytes(b"hello");
        let bytes = enc.into_bytes();

        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.get_bytes(16).unwrap(), b"hello");
        dec.finish().unwrap();

        let mut dec = Decoder::new(&bytes);
        assert!(matches!(
            dec.get_bytes(4),
            Err(CodecError::FieldTooLarge { len: 5, limit: 4 })
        ));
    }

    #[test]
    fn identity_round_trip() {
        let addr = Address([9u8; ADDRESS_LEN]);
        let id = MarketId([3u8; ID_LEN]);

        let mut enc = Encoder::new();
        enc.put_address(&addr);
        enc.put_id(&id);
        let bytes = enc.into_bytes();

        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.get_address().unwrap(), addr);
        assert_eq!(dec.get_id().unwrap(), id);
        dec.finish().unwrap();
    }

    #[test]
    fn short_buffer_rejected() {
        let mut dec = Decoder::new(&[0u8; 3]);
        assert!(matches!(
            dec.get_u64(),
            Err(CodecError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let dec = Decoder::new(&[1, 2, 3]);
        assert!(matches!(
            dec.finish(),
            Err(CodecError::TrailingBytes { remaining: 3 })
        ));
    }

    #[test]
    fn type_id_checked() {
        let mut dec = Decoder::new(&[7, 0]);
        assert!(matches!(
            dec.expect_type_id(9),
            Err(CodecError::TypeIdMismatch { got: 7, want: 9 })
        ));
        let mut dec = Decoder::new(&[9, 0]);
        dec.expect_type_id(9).unwrap();
    }
}
