//! Big-endian fixed-width codec shared by every wire format in the bridge.
//!
//! Decoding goes through [`BytesReader`], a cursor over a borrowed slice; the cursor position is
//! the decode offset and every read either advances it or fails with [`MalformedField`] without
//! consuming anything. Encoding goes through the [`WriteBytes`] extension trait on `Vec<u8>`.

use primitive_types::U256;
use thiserror::Error;

use crate::Address;

/// A field could not be decoded at `offset`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("malformed field at offset {offset}: {reason}")]
pub struct MalformedField {
    pub offset: usize,
    pub reason: &'static str,
}

/// A cursor-based reader for parsing bytes in big-endian format.
#[derive(Debug, Clone)]
pub struct BytesReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> BytesReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        BytesReader { bytes, cursor: 0 }
    }

    /// Current offset from the start of the input.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.cursor)
    }

    pub fn malformed(&self, reason: &'static str) -> MalformedField {
        MalformedField {
            offset: self.cursor,
            reason,
        }
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], MalformedField> {
        if self.remaining() < len {
            return Err(self.malformed("unexpected end of input"));
        }
        let slice = &self.bytes[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], MalformedField> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.read_slice(N)?);
        Ok(arr)
    }

    pub fn read_u8(&mut self) -> Result<u8, MalformedField> {
        self.read_array::<1>().map(|[b]| b)
    }

    pub fn read_u16(&mut self) -> Result<u16, MalformedField> {
        self.read_array().map(u16::from_be_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, MalformedField> {
        self.read_array().map(u32::from_be_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64, MalformedField> {
        self.read_array().map(u64::from_be_bytes)
    }

    pub fn read_u256(&mut self) -> Result<U256, MalformedField> {
        self.read_array::<32>().map(|b| U256::from_big_endian(&b))
    }

    /// Reads a 32-byte slot that must hold a value no wider than 64 bits.
    pub fn read_u64_from_u256(&mut self) -> Result<u64, MalformedField> {
        let start = self.clone();
        let value = self.read_u256()?;
        if value > U256::from(u64::MAX) {
            *self = start;
            return Err(self.malformed("value overflows u64"));
        }
        Ok(value.low_u64())
    }

    pub fn read_address(&mut self) -> Result<Address, MalformedField> {
        self.read_array().map(Address)
    }

    /// Reads a 32-byte slot holding a left-padded 20-byte address.
    pub fn read_evm_address(&mut self) -> Result<[u8; 20], MalformedField> {
        let start = self.clone();
        let slot = self.read_array::<32>()?;
        if slot[..12].iter().any(|b| *b != 0) {
            *self = start;
            return Err(self.malformed("address padding is not zero"));
        }
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&slot[12..]);
        Ok(addr)
    }

    /// Reads a fixed-width, zero right-padded text field.
    pub fn read_fixed_string<const N: usize>(&mut self) -> Result<String, MalformedField> {
        self.read_array::<N>().map(|b| string_from_fixed(&b))
    }

    /// Everything after the cursor; consumes it.
    pub fn remaining_bytes(&mut self) -> &'a [u8] {
        let rest = &self.bytes[self.cursor.min(self.bytes.len())..];
        self.cursor = self.bytes.len();
        rest
    }

    /// Fails if any input is left over.
    pub fn finish(self) -> Result<(), MalformedField> {
        if self.remaining() != 0 {
            return Err(self.malformed("trailing bytes"));
        }
        Ok(())
    }
}

/// Extension trait for encoding wire fields into a buffer.
pub trait WriteBytes {
    fn put_u8(&mut self, v: u8);
    fn put_u16(&mut self, v: u16);
    fn put_u32(&mut self, v: u32);
    fn put_u64(&mut self, v: u64);
    fn put_u256(&mut self, v: U256);
    fn put_slice(&mut self, v: &[u8]);
    fn put_address(&mut self, v: &Address);
    fn put_evm_address(&mut self, v: &[u8; 20]);
    fn put_fixed_string<const N: usize>(&mut self, v: &str);
}

impl WriteBytes for Vec<u8> {
    fn put_u8(&mut self, v: u8) {
        self.push(v);
    }

    fn put_u16(&mut self, v: u16) {
        self.extend_from_slice(&v.to_be_bytes());
    }

    fn put_u32(&mut self, v: u32) {
        self.extend_from_slice(&v.to_be_bytes());
    }

    fn put_u64(&mut self, v: u64) {
        self.extend_from_slice(&v.to_be_bytes());
    }

    fn put_u256(&mut self, v: U256) {
        let mut buf = [0u8; 32];
        v.to_big_endian(&mut buf);
        self.extend_from_slice(&buf);
    }

    fn put_slice(&mut self, v: &[u8]) {
        self.extend_from_slice(v);
    }

    fn put_address(&mut self, v: &Address) {
        self.extend_from_slice(&v.0);
    }

    fn put_evm_address(&mut self, v: &[u8; 20]) {
        self.extend_from_slice(&[0u8; 12]);
        self.extend_from_slice(v);
    }

    fn put_fixed_string<const N: usize>(&mut self, v: &str) {
        self.extend_from_slice(&string_to_array::<N>(v));
    }
}

/// Right-pads `s` with zeros to `N` bytes, truncating at `N` on a character boundary.
pub fn string_to_array<const N: usize>(s: &str) -> [u8; N] {
    let mut end = s.len().min(N);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut result = [0u8; N];
    result[..end].copy_from_slice(&s.as_bytes()[..end]);
    result
}

/// Inverse of [`string_to_array`]: drops the zero padding.
pub fn string_from_fixed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| c != &'\0')
        .collect()
}
