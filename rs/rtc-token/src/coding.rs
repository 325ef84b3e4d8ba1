//! Little-endian packing used by the token body.
//!
//! Strings and byte arrays are prefixed with a `u16` length.
//! Maps are prefixed with a `u16` count and written in key order.

use std::collections::BTreeMap;

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Write the value to the buffer.
pub trait Encode {
	fn encode<W: BufMut>(&self, w: &mut W);

	/// Encode the value into a [Bytes] buffer.
	fn encode_bytes(&self) -> Bytes {
		let mut buf = BytesMut::new();
		self.encode(&mut buf);
		buf.freeze()
	}
}

/// Read the value from the buffer.
pub trait Decode: Sized {
	fn decode<B: Buf>(buf: &mut B) -> Result<Self, DecodeError>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
	#[error("short buffer")]
	Short,

	#[error("invalid string")]
	InvalidString(#[from] std::string::FromUtf8Error),

	#[error("unknown service: {0}")]
	UnknownService(u16),
}

impl Encode for u16 {
	fn encode<W: BufMut>(&self, w: &mut W) {
		w.put_u16_le(*self);
	}
}

impl Encode for u32 {
	fn encode<W: BufMut>(&self, w: &mut W) {
		w.put_u32_le(*self);
	}
}

impl Encode for [u8] {
	fn encode<W: BufMut>(&self, w: &mut W) {
		// Callers check lengths against `MAX_LEN` before encoding.
		(self.len() as u16).encode(w);
		w.put_slice(self);
	}
}

impl Encode for str {
	fn encode<W: BufMut>(&self, w: &mut W) {
		self.as_bytes().encode(w)
	}
}

impl Encode for String {
	fn encode<W: BufMut>(&self, w: &mut W) {
		self.as_str().encode(w)
	}
}

impl Encode for Vec<u8> {
	fn encode<W: BufMut>(&self, w: &mut W) {
		self.as_slice().encode(w)
	}
}

impl Encode for BTreeMap<u16, u32> {
	fn encode<W: BufMut>(&self, w: &mut W) {
		(self.len() as u16).encode(w);
		for (key, value) in self {
			key.encode(w);
			value.encode(w);
		}
	}
}

impl Decode for u16 {
	fn decode<B: Buf>(r: &mut B) -> Result<Self, DecodeError> {
		match r.remaining() >= 2 {
			true => Ok(r.get_u16_le()),
			false => Err(DecodeError::Short),
		}
	}
}

impl Decode for u32 {
	fn decode<B: Buf>(r: &mut B) -> Result<Self, DecodeError> {
		match r.remaining() >= 4 {
			true => Ok(r.get_u32_le()),
			false => Err(DecodeError::Short),
		}
	}
}

impl Decode for Vec<u8> {
	fn decode<B: Buf>(r: &mut B) -> Result<Self, DecodeError> {
		let size = u16::decode(r)? as usize;
		if r.remaining() < size {
			return Err(DecodeError::Short);
		}

		Ok(r.copy_to_bytes(size).to_vec())
	}
}

impl Decode for String {
	fn decode<B: Buf>(r: &mut B) -> Result<Self, DecodeError> {
		let v = Vec::<u8>::decode(r)?;
		Ok(String::from_utf8(v)?)
	}
}

impl Decode for BTreeMap<u16, u32> {
	fn decode<B: Buf>(r: &mut B) -> Result<Self, DecodeError> {
		let count = u16::decode(r)?;

		let mut map = BTreeMap::new();
		for _ in 0..count {
			let key = u16::decode(r)?;
			let value = u32::decode(r)?;
			map.insert(key, value);
		}

		Ok(map)
	}
}

/// The longest length-prefixed field, in bytes.
pub const MAX_LEN: usize = u16::MAX as usize;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_little_endian() {
		assert_eq!(0x0102u16.encode_bytes().as_ref(), &[0x02, 0x01]);
		assert_eq!(0x01020304u32.encode_bytes().as_ref(), &[0x04, 0x03, 0x02, 0x01]);
	}

	#[test]
	fn test_string_prefix() {
		let encoded = "abc".encode_bytes();
		assert_eq!(encoded.as_ref(), &[3, 0, b'a', b'b', b'c']);

		let mut buf = encoded;
		assert_eq!(String::decode(&mut buf).unwrap(), "abc");
		assert!(!buf.has_remaining());
	}

	#[test]
	fn test_map_sorted() {
		let mut map = BTreeMap::new();
		map.insert(3u16, 30u32);
		map.insert(1u16, 10u32);

		let encoded = map.encode_bytes();
		assert_eq!(encoded.as_ref(), &[2, 0, 1, 0, 10, 0, 0, 0, 3, 0, 30, 0, 0, 0]);
	}

	#[test]
	fn test_short() {
		let mut buf = Bytes::from_static(&[5, 0, b'a']);
		assert_eq!(String::decode(&mut buf), Err(DecodeError::Short));

		let mut buf = Bytes::from_static(&[1]);
		assert_eq!(u16::decode(&mut buf), Err(DecodeError::Short));
	}

	#[test]
	fn test_invalid_utf8() {
		let mut buf = Bytes::from_static(&[2, 0, 0xff, 0xfe]);
		assert!(matches!(String::decode(&mut buf), Err(DecodeError::InvalidString(_))));
	}
}
