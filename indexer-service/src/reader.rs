//! Fixed-offset little-endian readers for raw program-account buffers

use std::fmt;

use thiserror::Error;

/// Width of an account address or any other 32-byte key
pub const KEY_LEN: usize = 32;

/// Width of the account-type prefix every program account starts with
pub const DISCRIMINATOR_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("read of {width} bytes at offset {offset} exceeds buffer length {len}")]
    OutOfRange {
        offset: usize,
        width: usize,
        len: usize,
    },
}

fn slice(buf: &[u8], offset: usize, width: usize) -> Result<&[u8], ReadError> {
    offset
        .checked_add(width)
        .and_then(|end| buf.get(offset..end))
        .ok_or(ReadError::OutOfRange {
            offset,
            width,
            len: buf.len(),
        })
}

fn array<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N], ReadError> {
    let mut out = [0u8; N];
    out.copy_from_slice(slice(buf, offset, N)?);
    Ok(out)
}

pub fn read_u8(buf: &[u8], offset: usize) -> Result<u8, ReadError> {
    Ok(array::<1>(buf, offset)?[0])
}

pub fn read_u16(buf: &[u8], offset: usize) -> Result<u16, ReadError> {
    array(buf, offset).map(u16::from_le_bytes)
}

pub fn read_u32(buf: &[u8], offset: usize) -> Result<u32, ReadError> {
    array(buf, offset).map(u32::from_le_bytes)
}

pub fn read_u64(buf: &[u8], offset: usize) -> Result<u64, ReadError> {
    array(buf, offset).map(u64::from_le_bytes)
}

pub fn read_i64(buf: &[u8], offset: usize) -> Result<i64, ReadError> {
    array(buf, offset).map(i64::from_le_bytes)
}

pub fn read_key(buf: &[u8], offset: usize) -> Result<AccountKey, ReadError> {
    array(buf, offset).map(AccountKey)
}

/// Base58 (Bitcoin alphabet) text form of arbitrary bytes.
///
/// Leading zero bytes become leading `'1'` characters and the empty input
/// encodes to the empty string.
pub fn encode_base58(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// A 32-byte public key as laid out in account data
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccountKey(pub [u8; KEY_LEN]);

impl AccountKey {
    pub fn to_base58(&self) -> String {
        encode_base58(&self.0)
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountKey({})", self.to_base58())
    }
}

/// Sequential reader over one account buffer.
///
/// Starts right after the discriminator, which is skipped without being checked.
pub struct AccountCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> AccountCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: DISCRIMINATOR_LEN,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn skip(&mut self, width: usize) -> Result<(), ReadError> {
        slice(self.data, self.offset, width)?;
        self.offset += width;
        Ok(())
    }

    pub fn u8(&mut self) -> Result<u8, ReadError> {
        let v = read_u8(self.data, self.offset)?;
        self.offset += 1;
        Ok(v)
    }

    pub fn u16(&mut self) -> Result<u16, ReadError> {
        let v = read_u16(self.data, self.offset)?;
        self.offset += 2;
        Ok(v)
    }

    pub fn u32(&mut self) -> Result<u32, ReadError> {
        let v = read_u32(self.data, self.offset)?;
        self.offset += 4;
        Ok(v)
    }

    pub fn u64(&mut self) -> Result<u64, ReadError> {
        let v = read_u64(self.data, self.offset)?;
        self.offset += 8;
        Ok(v)
    }

    pub fn i64(&mut self) -> Result<i64, ReadError> {
        let v = read_i64(self.data, self.offset)?;
        self.offset += 8;
        Ok(v)
    }

    pub fn key(&mut self) -> Result<AccountKey, ReadError> {
        let v = read_key(self.data, self.offset)?;
        self.offset += KEY_LEN;
        Ok(v)
    }
}
