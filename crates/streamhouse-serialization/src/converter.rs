//! Converter hooks between application objects and Avro values.

use crate::error::SerializerError;
use apache_avro::types::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// Maps application objects to Avro values before encoding and back after
/// decoding.
pub trait Converter: Send + Sync {
    type Object: Send + Sync;

    fn to_value(&self, object: &Self::Object) -> Result<Value, SerializerError>;

    fn from_value(&self, value: Value) -> Result<Self::Object, SerializerError>;
}

/// Works directly on [`Value`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueConverter;

impl Converter for ValueConverter {
    type Object = Value;

    fn to_value(&self, object: &Value) -> Result<Value, SerializerError> {
        Ok(object.clone())
    }

    fn from_value(&self, value: Value) -> Result<Value, SerializerError> {
        Ok(value)
    }
}

/// Maps serde types through `apache_avro::to_value` and `from_value`.
pub struct SerdeConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeConverter<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SerdeConverter<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SerdeConverter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerdeConverter")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Converter for SerdeConverter<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    type Object = T;

    fn to_value(&self, object: &T) -> Result<Value, SerializerError> {
        apache_avro::to_value(object).map_err(|e| SerializerError::Conversion(e.to_string()))
    }

    fn from_value(&self, value: Value) -> Result<T, SerializerError> {
        apache_avro::from_value::<T>(&value).map_err(|e| SerializerError::Conversion(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Order {
        amount: i64,
        note: String,
    }

    #[test]
    fn test_serde_converter() {
        let converter = SerdeConverter::<Order>::new();
        let order = Order {
            amount: 42,
            note: "rush".to_string(),
        };

        let value = converter.to_value(&order).unwrap();
        assert_eq!(
            value,
            Value::Record(vec![
                ("amount".to_string(), Value::Long(42)),
                ("note".to_string(), Value::String("rush".to_string())),
            ])
        );
        assert_eq!(converter.from_value(value).unwrap(), order);
    }

    #[test]
    fn test_serde_converter_shape_mismatch() {
        let converter = SerdeConverter::<Order>::new();
        let err = converter.from_value(Value::Long(1)).unwrap_err();
        assert!(matches!(err, SerializerError::Conversion(_)));
    }
}
