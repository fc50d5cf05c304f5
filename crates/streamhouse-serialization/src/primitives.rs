//! Schema-less serializers for fixed-width numbers, text and raw bytes.
//!
//! Numbers are big-endian and exactly their natural width. Decoding data of
//! any other length fails rather than truncating or padding.

use crate::context::SerializationContext;
use crate::error::SerializerError;
use crate::serializer::Serializer;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! fixed_width_serializer {
    ($(#[$meta:meta])* $name:ident, $ty:ty, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl $name {
            /// Encoded size in bytes.
            pub const WIDTH: usize = std::mem::size_of::<$ty>();

            pub fn encode(value: $ty) -> Bytes {
                Bytes::copy_from_slice(&value.to_be_bytes())
            }

            pub fn decode(data: &[u8]) -> Result<$ty, SerializerError> {
                let bytes: [u8; std::mem::size_of::<$ty>()] =
                    data.try_into().map_err(|_| {
                        SerializerError::codec(
                            $label,
                            format!("expected {} bytes, got {}", Self::WIDTH, data.len()),
                        )
                    })?;
                Ok(<$ty>::from_be_bytes(bytes))
            }
        }

        #[async_trait]
        impl Serializer for $name {
            type Value = $ty;

            async fn serialize(
                &self,
                value: Option<&$ty>,
                _ctx: &SerializationContext<'_>,
            ) -> Result<Option<Bytes>, SerializerError> {
                Ok(value.map(|v| Self::encode(*v)))
            }

            async fn deserialize(
                &self,
                data: Option<&[u8]>,
                _ctx: &SerializationContext<'_>,
            ) -> Result<Option<$ty>, SerializerError> {
                data.map(Self::decode).transpose()
            }
        }
    };
}

fixed_width_serializer!(
    /// 64-bit IEEE-754 float.
    DoubleSerializer, f64, "double"
);
fixed_width_serializer!(
    /// 32-bit IEEE-754 float.
    FloatSerializer, f32, "float"
);
fixed_width_serializer!(
    /// Signed 64-bit integer.
    LongSerializer, i64, "long"
);
fixed_width_serializer!(
    /// Signed 32-bit integer.
    IntegerSerializer, i32, "integer"
);
fixed_width_serializer!(
    /// Signed 16-bit integer.
    ShortSerializer, i16, "short"
);

/// Character encoding used by [`StringSerializer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
}

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Latin1 => "latin1",
        }
    }

    pub fn encode(&self, text: &str) -> Result<Vec<u8>, SerializerError> {
        match self {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Ascii => {
                if let Some(c) = text.chars().find(|c| !c.is_ascii()) {
                    return Err(self.error(format!("character {c:?} is not ascii")));
                }
                Ok(text.as_bytes().to_vec())
            }
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c))
                        .map_err(|_| self.error(format!("character {c:?} is not latin1")))
                })
                .collect(),
        }
    }

    pub fn decode(&self, data: &[u8]) -> Result<String, SerializerError> {
        match self {
            TextEncoding::Utf8 => {
                String::from_utf8(data.to_vec()).map_err(|e| self.error(e.to_string()))
            }
            TextEncoding::Ascii => {
                if let Some(pos) = data.iter().position(|b| !b.is_ascii()) {
                    return Err(
                        self.error(format!("byte 0x{:02x} at {pos} is not ascii", data[pos]))
                    );
                }
                Ok(data.iter().map(|&b| char::from(b)).collect())
            }
            TextEncoding::Latin1 => Ok(data.iter().map(|&b| char::from(b)).collect()),
        }
    }

    fn error(&self, message: String) -> SerializerError {
        SerializerError::Codec {
            type_name: "string",
            message: format!("{}: {message}", self.as_str()),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextEncoding {
    type Err = SerializerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            other => Err(SerializerError::Config(format!(
                "unsupported text encoding: {other}"
            ))),
        }
    }
}

/// Text in a configurable encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSerializer {
    encoding: TextEncoding,
}

impl StringSerializer {
    pub fn new(encoding: TextEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }
}

#[async_trait]
impl Serializer for StringSerializer {
    type Value = String;

    async fn serialize(
        &self,
        value: Option<&String>,
        _ctx: &SerializationContext<'_>,
    ) -> Result<Option<Bytes>, SerializerError> {
        value
            .map(|v| self.encoding.encode(v).map(Bytes::from))
            .transpose()
    }

    async fn deserialize(
        &self,
        data: Option<&[u8]>,
        _ctx: &SerializationContext<'_>,
    ) -> Result<Option<String>, SerializerError> {
        data.map(|d| self.encoding.decode(d)).transpose()
    }
}

/// Passes payload bytes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesSerializer;

#[async_trait]
impl Serializer for BytesSerializer {
    type Value = Bytes;

    async fn serialize(
        &self,
        value: Option<&Bytes>,
        _ctx: &SerializationContext<'_>,
    ) -> Result<Option<Bytes>, SerializerError> {
        Ok(value.cloned())
    }

    async fn deserialize(
        &self,
        data: Option<&[u8]>,
        _ctx: &SerializationContext<'_>,
    ) -> Result<Option<Bytes>, SerializerError> {
        Ok(data.map(Bytes::copy_from_slice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SerializationContext<'static> {
        SerializationContext::value("numbers")
    }

    #[test]
    fn test_fixed_widths() {
        assert_eq!(DoubleSerializer::WIDTH, 8);
        assert_eq!(FloatSerializer::WIDTH, 4);
        assert_eq!(LongSerializer::WIDTH, 8);
        assert_eq!(IntegerSerializer::WIDTH, 4);
        assert_eq!(ShortSerializer::WIDTH, 2);
    }

    #[test]
    fn test_big_endian_layout() {
        assert_eq!(&IntegerSerializer::encode(1)[..], &[0, 0, 0, 1]);
        assert_eq!(&ShortSerializer::encode(-2)[..], &[0xff, 0xfe]);
        assert_eq!(
            &DoubleSerializer::encode(1.0)[..],
            &[0x3f, 0xf0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(LongSerializer::decode(&[0, 0, 0, 0, 0, 0, 1, 0]).unwrap(), 256);
    }

    #[test]
    fn test_round_trip_extremes() {
        for v in [i16::MIN, -1, 0, 1, i16::MAX] {
            assert_eq!(ShortSerializer::encode(v).len(), ShortSerializer::WIDTH);
            assert_eq!(ShortSerializer::decode(&ShortSerializer::encode(v)).unwrap(), v);
        }
        for v in [i32::MIN, -1, 0, 1, i32::MAX] {
            assert_eq!(IntegerSerializer::encode(v).len(), IntegerSerializer::WIDTH);
            assert_eq!(IntegerSerializer::decode(&IntegerSerializer::encode(v)).unwrap(), v);
        }
        for v in [i64::MIN, -1, 0, 1, i64::MAX] {
            assert_eq!(LongSerializer::encode(v).len(), LongSerializer::WIDTH);
            assert_eq!(LongSerializer::decode(&LongSerializer::encode(v)).unwrap(), v);
        }

        // Bit comparison keeps -0.0 distinct from 0.0
        let floats = [
            f32::MIN,
            -0.0,
            0.0,
            f32::MIN_POSITIVE,
            f32::EPSILON,
            f32::MAX,
            f32::NEG_INFINITY,
            f32::INFINITY,
        ];
        for v in floats {
            assert_eq!(FloatSerializer::encode(v).len(), FloatSerializer::WIDTH);
            let decoded = FloatSerializer::decode(&FloatSerializer::encode(v)).unwrap();
            assert_eq!(decoded.to_bits(), v.to_bits());
        }

        let doubles = [
            f64::MIN,
            -0.0,
            0.0,
            f64::MIN_POSITIVE,
            f64::EPSILON,
            f64::MAX,
            f64::NEG_INFINITY,
            f64::INFINITY,
        ];
        for v in doubles {
            assert_eq!(DoubleSerializer::encode(v).len(), DoubleSerializer::WIDTH);
            let decoded = DoubleSerializer::decode(&DoubleSerializer::encode(v)).unwrap();
            assert_eq!(decoded.to_bits(), v.to_bits());
        }
    }

    #[test]
    fn test_wrong_length_is_codec_error() {
        let err = IntegerSerializer::decode(&[0, 0, 1]).unwrap_err();
        assert!(matches!(
            err,
            SerializerError::Codec {
                type_name: "integer",
                ..
            }
        ));
        assert!(DoubleSerializer::decode(&[0; 9]).is_err());
        assert!(ShortSerializer::decode(&[]).is_err());
    }

    #[test]
    fn test_float_special_values() {
        let nan = FloatSerializer::decode(&FloatSerializer::encode(f32::NAN)).unwrap();
        assert!(nan.is_nan());
        assert_eq!(
            DoubleSerializer::decode(&DoubleSerializer::encode(f64::NEG_INFINITY)).unwrap(),
            f64::NEG_INFINITY
        );
    }

    #[tokio::test]
    async fn test_absent_value_passes_through() {
        let serializer = LongSerializer;
        assert_eq!(serializer.serialize(None, &ctx()).await.unwrap(), None);
        assert_eq!(serializer.deserialize(None, &ctx()).await.unwrap(), None);

        let strings = StringSerializer::default();
        assert_eq!(strings.serialize(None, &ctx()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_schema_override_rejected() {
        let schema = streamhouse_schema_registry::Schema::parse(r#""long""#).unwrap();
        let err = LongSerializer
            .serialize_with_schema(Some(&schema), Some(&1), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, SerializerError::Config(_)));
    }

    #[tokio::test]
    async fn test_string_encodings() {
        let utf8 = StringSerializer::default();
        let bytes = utf8
            .serialize(Some(&"café".to_string()), &ctx())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bytes.len(), 5);

        let latin1 = StringSerializer::new(TextEncoding::Latin1);
        let bytes = latin1
            .serialize(Some(&"café".to_string()), &ctx())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&bytes[..], b"caf\xe9");
        assert_eq!(
            latin1.deserialize(Some(&bytes[..]), &ctx()).await.unwrap().as_deref(),
            Some("café")
        );

        let ascii = StringSerializer::new(TextEncoding::Ascii);
        assert!(ascii
            .serialize(Some(&"café".to_string()), &ctx())
            .await
            .is_err());
        assert!(utf8.deserialize(Some(&b"caf\xe9"[..]), &ctx()).await.is_err());
    }

    #[test]
    fn test_encoding_labels() {
        assert_eq!("UTF-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!(
            "iso_8859_1".parse::<TextEncoding>().unwrap(),
            TextEncoding::Latin1
        );
        assert!("ebcdic".parse::<TextEncoding>().is_err());
    }
}
