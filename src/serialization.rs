//! Low-level XDR serialization utilities
//!
//! This module provides manual byte-level encoding and decoding of the
//! XDR primitives (RFC 4506) the ledger's wire format is built from.
//! Everything is big-endian and padded to a 4-byte boundary.

use crate::error::{Result, XdrAsmError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::{Cursor, Write};

/// Trait for types that can be serialized at the byte level
pub trait ByteSerialize {
    fn serialize_bytes(&self, writer: &mut Vec<u8>) -> Result<()>;

    /// Serialize into a fresh buffer
    fn to_xdr(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.serialize_bytes(&mut bytes)?;
        Ok(bytes)
    }

    /// Serialize and base64-encode
    fn to_xdr_base64(&self) -> Result<String> {
        Ok(encode_base64(&self.to_xdr()?))
    }
}

/// Trait for types that can be deserialized from bytes
pub trait ByteDeserialize: Sized {
    fn deserialize_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Self>;

    /// Decode a complete value; trailing bytes are an error
    fn from_xdr(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let value = Self::deserialize_bytes(&mut cursor)?;
        expect_end(&cursor)?;
        Ok(value)
    }

    fn from_xdr_base64(text: &str) -> Result<Self> {
        Self::from_xdr(&decode_base64(text)?)
    }
}

/// Number of zero bytes needed to pad `len` to a 4-byte boundary
pub fn padding_len(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Borrow the next `n` bytes and advance the cursor
pub fn take<'a>(cursor: &mut Cursor<&'a [u8]>, n: usize) -> Result<&'a [u8]> {
    let data: &'a [u8] = *cursor.get_ref();
    let position = cursor.position() as usize;
    let end = position.checked_add(n).ok_or_else(|| {
        XdrAsmError::MalformedEnvelope("length overflows buffer".to_string())
    })?;

    if end > data.len() {
        return Err(XdrAsmError::BufferTooSmall {
            needed: end,
            available: data.len(),
        });
    }

    cursor.set_position(end as u64);
    Ok(&data[position..end])
}

/// Bytes left after the cursor
pub fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    cursor.get_ref().len().saturating_sub(cursor.position() as usize)
}

/// Fail unless the cursor consumed the whole buffer
pub fn expect_end(cursor: &Cursor<&[u8]>) -> Result<()> {
    match remaining(cursor) {
        0 => Ok(()),
        extra => Err(XdrAsmError::MalformedEnvelope(format!(
            "{} trailing bytes after value",
            extra
        ))),
    }
}

fn write_padding(len: usize, writer: &mut Vec<u8>) -> Result<()> {
    writer.write_all(&[0u8; 3][..padding_len(len)])?;
    Ok(())
}

fn skip_padding(len: usize, cursor: &mut Cursor<&[u8]>) -> Result<()> {
    let pad = take(cursor, padding_len(len))?;
    if pad.iter().any(|&b| b != 0) {
        return Err(XdrAsmError::MalformedEnvelope(
            "non-zero padding bytes".to_string(),
        ));
    }
    Ok(())
}

/// Encode an unsigned 32-bit integer
pub fn encode_u32(value: u32, writer: &mut Vec<u8>) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Decode an unsigned 32-bit integer
pub fn decode_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32> {
    let bytes = take(cursor, 4)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Encode a signed 32-bit integer (also used for enum discriminants)
pub fn encode_i32(value: i32, writer: &mut Vec<u8>) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Decode a signed 32-bit integer
pub fn decode_i32(cursor: &mut Cursor<&[u8]>) -> Result<i32> {
    let bytes = take(cursor, 4)?;
    Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Encode an unsigned hyper
pub fn encode_u64(value: u64, writer: &mut Vec<u8>) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Decode an unsigned hyper
pub fn decode_u64(cursor: &mut Cursor<&[u8]>) -> Result<u64> {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(take(cursor, 8)?);
    Ok(u64::from_be_bytes(bytes))
}

/// Encode a signed hyper
pub fn encode_i64(value: i64, writer: &mut Vec<u8>) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Decode a signed hyper
pub fn decode_i64(cursor: &mut Cursor<&[u8]>) -> Result<i64> {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(take(cursor, 8)?);
    Ok(i64::from_be_bytes(bytes))
}

/// Encode a bool as a 4-byte 0/1
pub fn encode_bool(value: bool, writer: &mut Vec<u8>) -> Result<()> {
    encode_u32(u32::from(value), writer)
}

/// Decode a bool; anything other than 0 or 1 is rejected
pub fn decode_bool(cursor: &mut Cursor<&[u8]>) -> Result<bool> {
    match decode_u32(cursor)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(XdrAsmError::MalformedEnvelope(format!(
            "invalid bool value {}",
            other
        ))),
    }
}

/// Encode fixed-length opaque data (no length prefix)
pub fn encode_fixed_opaque(data: &[u8], writer: &mut Vec<u8>) -> Result<()> {
    writer.write_all(data)?;
    write_padding(data.len(), writer)
}

/// Decode fixed-length opaque data of `N` bytes
pub fn decode_fixed_opaque<const N: usize>(cursor: &mut Cursor<&[u8]>) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(take(cursor, N)?);
    skip_padding(N, cursor)?;
    Ok(out)
}

/// Encode a collection length, rejecting anything above `max`
pub fn encode_len(len: usize, max: u32, writer: &mut Vec<u8>) -> Result<()> {
    let len = u32::try_from(len)
        .ok()
        .filter(|&l| l <= max)
        .ok_or_else(|| {
            XdrAsmError::SerializationError(format!("length {} exceeds limit {}", len, max))
        })?;
    encode_u32(len, writer)
}

/// Encode variable-length opaque data with a u32 length prefix
pub fn encode_var_opaque(data: &[u8], max: u32, writer: &mut Vec<u8>) -> Result<()> {
    encode_len(data.len(), max, writer)?;
    encode_fixed_opaque(data, writer)
}

/// Decode variable-length opaque data
pub fn decode_var_opaque(cursor: &mut Cursor<&[u8]>, max: u32) -> Result<Vec<u8>> {
    let length = decode_u32(cursor)?;
    if length > max {
        return Err(XdrAsmError::MalformedEnvelope(format!(
            "opaque length {} exceeds limit {}",
            length, max
        )));
    }
    let length = length as usize;
    let data = take(cursor, length)?.to_vec();
    skip_padding(length, cursor)?;
    Ok(data)
}

/// Encode an XDR string
pub fn encode_string(value: &str, max: u32, writer: &mut Vec<u8>) -> Result<()> {
    encode_var_opaque(value.as_bytes(), max, writer)
}

/// Decode an XDR string, requiring UTF-8
pub fn decode_string(cursor: &mut Cursor<&[u8]>, max: u32) -> Result<String> {
    let bytes = decode_var_opaque(cursor, max)?;
    String::from_utf8(bytes)
        .map_err(|_| XdrAsmError::MalformedEnvelope("string is not valid UTF-8".to_string()))
}

/// Decode an array count; every element takes at least 4 bytes, so
/// counts the remaining buffer cannot hold are rejected up front
pub fn decode_len(cursor: &mut Cursor<&[u8]>, max: u32) -> Result<usize> {
    let count = decode_u32(cursor)?;
    if count > max {
        return Err(XdrAsmError::MalformedEnvelope(format!(
            "array length {} exceeds limit {}",
            count, max
        )));
    }
    let count = count as usize;
    if count.saturating_mul(4) > remaining(cursor) {
        return Err(XdrAsmError::MalformedEnvelope(format!(
            "array length {} larger than remaining input",
            count
        )));
    }
    Ok(count)
}

/// Standard padded base64
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(text.trim())?)
}

/// Custom serialization helpers for XDR arrays
pub mod helpers {
    use super::*;

    /// Serialize a vector with length prefix
    pub fn serialize_vec<T: ByteSerialize>(items: &[T], max: u32, writer: &mut Vec<u8>) -> Result<()> {
        encode_len(items.len(), max, writer)?;
        for item in items {
            item.serialize_bytes(writer)?;
        }
        Ok(())
    }

    /// Deserialize a length-prefixed vector
    pub fn deserialize_vec<T: ByteDeserialize>(cursor: &mut Cursor<&[u8]>, max: u32) -> Result<Vec<T>> {
        let count = decode_len(cursor, max)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::deserialize_bytes(cursor)?);
        }
        Ok(items)
    }

    /// Serialize an XDR optional (`*T`)
    pub fn serialize_option<T: ByteSerialize>(item: Option<&T>, writer: &mut Vec<u8>) -> Result<()> {
        match item {
            Some(value) => {
                encode_bool(true, writer)?;
                value.serialize_bytes(writer)
            }
            None => encode_bool(false, writer),
        }
    }

    pub fn deserialize_option<T: ByteDeserialize>(cursor: &mut Cursor<&[u8]>) -> Result<Option<T>> {
        if decode_bool(cursor)? {
            Ok(Some(T::deserialize_bytes(cursor)?))
        } else {
            Ok(None)
        }
    }
}
