//! Positional binary codec.
//!
//! Messages are written field by field in a fixed order with no field tags
//! and no version: both peers must be built from the same schema.
//!
//! - integers are big-endian, fixed width;
//! - booleans are one byte, `0` or `1`;
//! - strings are a `u16` byte length followed by UTF-8;
//! - blobs are a `u32` byte length followed by raw bytes.
//!
//! Item metadata tags are opaque blobs encoded with MessagePack through
//! [`encode_blob`] / [`decode_blob`].

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CodecError;

/// Encode a value to MessagePack bytes.
///
/// # Errors
///
/// Returns [`CodecError::TagEncode`] if serialisation fails.
pub fn encode_blob<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    rmp_serde::to_vec(value).map_err(CodecError::TagEncode)
}

/// Decode a value from MessagePack bytes.
///
/// # Errors
///
/// Returns [`CodecError::TagDecode`] if deserialisation fails.
pub fn decode_blob<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    rmp_serde::from_slice(bytes).map_err(CodecError::TagDecode)
}

/// Appends fields to a growing buffer.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: BytesMut,
}

impl WireWriter {
    /// An empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(64),
        }
    }

    /// Write one byte.
    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    /// Write a boolean as `0`/`1`.
    pub fn put_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    /// Write a big-endian `i32`.
    pub fn put_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    /// Write a big-endian `i64`.
    pub fn put_i64(&mut self, value: i64) {
        self.buf.put_i64(value);
    }

    /// Write a big-endian `u64`.
    pub fn put_u64(&mut self, value: u64) {
        self.buf.put_u64(value);
    }

    /// Write a `u16`-length-prefixed UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::StringTooLong`] past 65535 bytes.
    pub fn put_str(&mut self, value: &str) -> Result<(), CodecError> {
        let len = u16::try_from(value.len()).map_err(|_| CodecError::StringTooLong(value.len()))?;
        self.buf.put_u16(len);
        self.buf.put_slice(value.as_bytes());
        Ok(())
    }

    /// Write a `u32`-length-prefixed blob.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::LengthOverflow`] if the blob is larger than `u32::MAX`.
    pub fn put_blob(&mut self, value: &[u8]) -> Result<(), CodecError> {
        let len = u32::try_from(value.len()).map_err(|_| CodecError::LengthOverflow(value.len()))?;
        self.buf.put_u32(len);
        self.buf.put_slice(value);
        Ok(())
    }

    /// Bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Freeze the buffer.
    #[must_use]
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Consumes fields from a byte slice, failing instead of panicking when the
/// slice runs out.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
}

impl<'a> WireReader<'a> {
    /// Read from `buf`.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn need(&self, field: &'static str, needed: usize) -> Result<(), CodecError> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(CodecError::Truncated {
                field,
                needed,
                remaining,
            });
        }
        Ok(())
    }

    /// Read one byte.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] if the buffer is exhausted.
    pub fn get_u8(&mut self, field: &'static str) -> Result<u8, CodecError> {
        self.need(field, 1)?;
        Ok(self.buf.get_u8())
    }

    /// Read a `0`/`1` boolean.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidTag`] for any other byte.
    pub fn get_bool(&mut self, field: &'static str) -> Result<bool, CodecError> {
        match self.get_u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(CodecError::InvalidTag { field, value }),
        }
    }

    /// Read a big-endian `i32`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] if the buffer is exhausted.
    pub fn get_i32(&mut self, field: &'static str) -> Result<i32, CodecError> {
        self.need(field, 4)?;
        Ok(self.buf.get_i32())
    }

    /// Read a big-endian `i64`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] if the buffer is exhausted.
    pub fn get_i64(&mut self, field: &'static str) -> Result<i64, CodecError> {
        self.need(field, 8)?;
        Ok(self.buf.get_i64())
    }

    /// Read a big-endian `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] if the buffer is exhausted.
    pub fn get_u64(&mut self, field: &'static str) -> Result<u64, CodecError> {
        self.need(field, 8)?;
        Ok(self.buf.get_u64())
    }

    /// Read a `u16`-length-prefixed UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] or [`CodecError::InvalidUtf8`].
    pub fn get_str(&mut self, field: &'static str) -> Result<String, CodecError> {
        self.need(field, 2)?;
        let len = usize::from(self.buf.get_u16());
        self.need(field, len)?;
        let (head, tail) = self.buf.split_at(len);
        let value = std::str::from_utf8(head)?.to_string();
        self.buf = tail;
        Ok(value)
    }

    /// Read a `u32`-length-prefixed blob.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] if the buffer is exhausted.
    pub fn get_blob(&mut self, field: &'static str) -> Result<&'a [u8], CodecError> {
        self.need(field, 4)?;
        let len = self.buf.get_u32() as usize;
        self.need(field, len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Ensure the whole buffer was consumed.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TrailingBytes`] if anything is left.
    pub fn finish(self) -> Result<(), CodecError> {
        match self.buf.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}
