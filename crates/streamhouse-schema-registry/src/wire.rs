//! Confluent Wire Format
//!
//! Frames schema-encoded bodies with the schema ID they were written with:
//!
//! ```text
//! byte 0     : magic byte (0x00)
//! bytes 1-4  : schema id, big-endian i32
//! bytes 5..N : body
//! ```
//!
//! The body is opaque here.

use crate::error::WireFormatError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Magic byte for wire format version 0
pub const MAGIC_BYTE: u8 = 0x00;

/// Length of the magic byte plus schema ID
pub const HEADER_LEN: usize = 5;

/// Prefix `body` with the magic byte and `schema_id`.
pub fn frame(schema_id: i32, body: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + body.len());
    buf.put_u8(MAGIC_BYTE);
    buf.put_i32(schema_id);
    buf.put_slice(body);
    buf.freeze()
}

/// Split a framed payload into `(schema_id, body)`.
///
/// A payload of exactly five bytes is valid and has an empty body.
pub fn unframe(data: &[u8]) -> Result<(i32, &[u8]), WireFormatError> {
    if data.len() < HEADER_LEN {
        return Err(WireFormatError::TooShort(data.len()));
    }

    if data[0] != MAGIC_BYTE {
        return Err(WireFormatError::InvalidMagicByte(data[0]));
    }

    let mut id_bytes = &data[1..HEADER_LEN];
    let schema_id = id_bytes.get_i32();

    Ok((schema_id, &data[HEADER_LEN..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_unframe() {
        let data = b"hello world";

        let framed = frame(123, data);
        assert_eq!(framed[0], MAGIC_BYTE);
        assert_eq!(framed.len(), HEADER_LEN + data.len());
        assert_eq!(&framed[1..5], &[0, 0, 0, 123]);

        let (id, body) = unframe(&framed).unwrap();
        assert_eq!(id, 123);
        assert_eq!(body, data);
    }

    #[test]
    fn test_schema_id_extremes() {
        for id in [i32::MIN, -1, 0, 1, i32::MAX] {
            let framed = frame(id, b"x");
            let (extracted, body) = unframe(&framed).unwrap();
            assert_eq!(extracted, id);
            assert_eq!(body, b"x");
        }
    }

    #[test]
    fn test_empty_body() {
        let framed = frame(7, &[]);
        assert_eq!(framed.len(), HEADER_LEN);

        let (id, body) = unframe(&framed).unwrap();
        assert_eq!(id, 7);
        assert!(body.is_empty());
    }

    #[test]
    fn test_unframe_too_short() {
        for len in 0..HEADER_LEN {
            let data = vec![0u8; len];
            assert_eq!(unframe(&data), Err(WireFormatError::TooShort(len)));
        }
    }

    #[test]
    fn test_unframe_invalid_magic_byte() {
        let data = vec![0xFF, 0x00, 0x00, 0x00, 0x01, 0x42];
        assert_eq!(unframe(&data), Err(WireFormatError::InvalidMagicByte(0xFF)));

        let data = vec![0x01, 0x00, 0x00, 0x00, 0x01];
        assert!(unframe(&data).is_err());
    }
}
