//! Schema-driven Avro serializer
//!
//! Encodes values with a registered Avro schema and prefixes the payload with
//! the schema ID (see [`streamhouse_schema_registry::wire`]). Decoding looks
//! the writer schema up by that ID, optionally resolves the value against a
//! reader schema, and hands the result to the converter.

use crate::context::SerializationContext;
use crate::converter::{Converter, ValueConverter};
use crate::error::SerializerError;
use crate::serializer::Serializer;
use crate::subject::SubjectNameStrategy;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use streamhouse_schema_registry::{frame, unframe, CachedSchemaRegistryClient, Schema};
use tracing::{debug, trace};

/// Avro serializer backed by a schema registry.
///
/// Defaults: [`ValueConverter`], [`SubjectNameStrategy::TopicName`] and
/// automatic registration of write schemas.
pub struct AvroSerializer<C = ValueConverter> {
    registry: Arc<CachedSchemaRegistryClient>,
    schema: Option<Schema>,
    reader_schema: Option<Schema>,
    subject_name_strategy: SubjectNameStrategy,
    auto_register: bool,
    converter: C,
}

impl AvroSerializer<ValueConverter> {
    pub fn new(registry: Arc<CachedSchemaRegistryClient>) -> Self {
        Self {
            registry,
            schema: None,
            reader_schema: None,
            subject_name_strategy: SubjectNameStrategy::default(),
            auto_register: true,
            converter: ValueConverter,
        }
    }
}

impl<C: Converter> AvroSerializer<C> {
    /// Default write schema, used when a call passes no override.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Schema decoded values are projected onto.
    pub fn with_reader_schema(mut self, schema: Schema) -> Self {
        self.reader_schema = Some(schema);
        self
    }

    pub fn with_subject_name_strategy(mut self, strategy: SubjectNameStrategy) -> Self {
        self.subject_name_strategy = strategy;
        self
    }

    /// When disabled, write schemas must already be registered under the
    /// subject.
    pub fn auto_register(mut self, enabled: bool) -> Self {
        self.auto_register = enabled;
        self
    }

    pub fn with_converter<D: Converter>(self, converter: D) -> AvroSerializer<D> {
        AvroSerializer {
            registry: self.registry,
            schema: self.schema,
            reader_schema: self.reader_schema,
            subject_name_strategy: self.subject_name_strategy,
            auto_register: self.auto_register,
            converter,
        }
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn reader_schema(&self) -> Option<&Schema> {
        self.reader_schema.as_ref()
    }

    pub fn registry(&self) -> &Arc<CachedSchemaRegistryClient> {
        &self.registry
    }

    async fn schema_id(&self, subject: &str, schema: &Schema) -> Result<i32, SerializerError> {
        let id = if self.auto_register {
            self.registry.register(subject, schema).await?
        } else {
            self.registry.get_by_subject_and_schema(subject, schema).await?
        };
        Ok(id)
    }

    /// Encode `object` and frame it with its schema ID.
    ///
    /// `schema` overrides the default write schema for this call only.
    pub async fn encode(
        &self,
        schema: Option<&Schema>,
        object: &C::Object,
        ctx: &SerializationContext<'_>,
    ) -> Result<Bytes, SerializerError> {
        let schema = schema.or(self.schema.as_ref()).ok_or_else(|| {
            SerializerError::Config(format!(
                "no {} schema configured for topic {}",
                ctx.field(),
                ctx.topic()
            ))
        })?;

        let value = self.converter.to_value(object)?;

        let subject = self.subject_name_strategy.subject_name(ctx, schema);
        let schema_id = self.schema_id(&subject, schema).await?;

        let body = apache_avro::to_avro_datum(schema.avro(), value)
            .map_err(|e| SerializerError::Encoding(e.to_string()))?;

        trace!(
            topic = ctx.topic(),
            field = %ctx.field(),
            schema_id = schema_id,
            bytes = body.len(),
            "Encoded Avro payload"
        );

        Ok(frame(schema_id, &body))
    }

    /// Decode a framed payload into an object.
    pub async fn decode(&self, data: &[u8]) -> Result<C::Object, SerializerError> {
        let (schema_id, mut body) = unframe(data)?;
        let writer = self.registry.get_by_id(schema_id).await?;

        let value = apache_avro::from_avro_datum(writer.avro(), &mut body, None)
            .map_err(|e| SerializerError::Encoding(e.to_string()))?;

        let value = match &self.reader_schema {
            Some(reader) => {
                if reader != &writer {
                    debug!(
                        schema_id = schema_id,
                        writer = writer.name(),
                        reader = reader.name(),
                        "Resolving payload against reader schema"
                    );
                }
                value
                    .resolve(reader.avro())
                    .map_err(|e| SerializerError::SchemaIncompatible {
                        writer_id: schema_id,
                        message: e.to_string(),
                    })?
            }
            None => value,
        };

        self.converter.from_value(value)
    }
}

#[async_trait]
impl<C: Converter> Serializer for AvroSerializer<C> {
    type Value = C::Object;

    async fn serialize(
        &self,
        value: Option<&Self::Value>,
        ctx: &SerializationContext<'_>,
    ) -> Result<Option<Bytes>, SerializerError> {
        self.serialize_with_schema(None, value, ctx).await
    }

    async fn serialize_with_schema(
        &self,
        schema: Option<&Schema>,
        value: Option<&Self::Value>,
        ctx: &SerializationContext<'_>,
    ) -> Result<Option<Bytes>, SerializerError> {
        match value {
            Some(object) => self.encode(schema, object, ctx).await.map(Some),
            None => Ok(None),
        }
    }

    async fn deserialize(
        &self,
        data: Option<&[u8]>,
        _ctx: &SerializationContext<'_>,
    ) -> Result<Option<Self::Value>, SerializerError> {
        match data {
            Some(data) => self.decode(data).await.map(Some),
            None => Ok(None),
        }
    }
}
