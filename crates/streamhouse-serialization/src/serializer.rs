//! The serializer capability.

use crate::context::SerializationContext;
use crate::error::SerializerError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use streamhouse_schema_registry::Schema;

/// Converts values to payload bytes and back.
///
/// `None` is the absent-value (tombstone) convention: it passes through both
/// directions untouched and never reaches a codec or registry.
#[async_trait]
pub trait Serializer: Send + Sync {
    /// The application-side type.
    type Value: Send + Sync;

    async fn serialize(
        &self,
        value: Option<&Self::Value>,
        ctx: &SerializationContext<'_>,
    ) -> Result<Option<Bytes>, SerializerError>;

    /// Serialize with a per-call schema override.
    ///
    /// Serializers that are not schema-driven reject an override instead of
    /// silently ignoring it.
    async fn serialize_with_schema(
        &self,
        schema: Option<&Schema>,
        value: Option<&Self::Value>,
        ctx: &SerializationContext<'_>,
    ) -> Result<Option<Bytes>, SerializerError> {
        if let Some(schema) = schema {
            return Err(SerializerError::Config(format!(
                "serializer does not accept a schema override (got {})",
                schema.name()
            )));
        }
        self.serialize(value, ctx).await
    }

    async fn deserialize(
        &self,
        data: Option<&[u8]>,
        ctx: &SerializationContext<'_>,
    ) -> Result<Option<Self::Value>, SerializerError>;
}

#[async_trait]
impl<S: Serializer + ?Sized> Serializer for Arc<S> {
    type Value = S::Value;

    async fn serialize(
        &self,
        value: Option<&Self::Value>,
        ctx: &SerializationContext<'_>,
    ) -> Result<Option<Bytes>, SerializerError> {
        (**self).serialize(value, ctx).await
    }

    async fn serialize_with_schema(
        &self,
        schema: Option<&Schema>,
        value: Option<&Self::Value>,
        ctx: &SerializationContext<'_>,
    ) -> Result<Option<Bytes>, SerializerError> {
        (**self).serialize_with_schema(schema, value, ctx).await
    }

    async fn deserialize(
        &self,
        data: Option<&[u8]>,
        ctx: &SerializationContext<'_>,
    ) -> Result<Option<Self::Value>, SerializerError> {
        (**self).deserialize(data, ctx).await
    }
}
