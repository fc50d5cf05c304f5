//! Caching Schema Registry Client
//!
//! Resolves schemas by ID and IDs by `(subject, schema)`, remembering both
//! directions for the lifetime of the client. Registered schema content is
//! immutable under its ID, so entries are never evicted or invalidated.
//!
//! Concurrent misses for the same ID share a single round-trip.

use crate::{
    backend::RegistryBackend,
    config::SchemaRegistryConfig,
    error::{RegistryError, Result},
    http::HttpRegistryBackend,
    schema::Schema,
    types::{CompatibilityMode, RegisteredSchema, SubjectVersion},
};
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Caching Schema Registry client
///
/// Cheap to share: wrap in an `Arc` and hand it to every serializer bound to
/// the same registry.
pub struct CachedSchemaRegistryClient {
    backend: Arc<dyn RegistryBackend>,
    /// Schema ID -> parsed schema
    schemas_by_id: Cache<i32, Schema>,
    /// (subject, canonical form) -> schema ID
    ids_by_subject: Cache<(String, String), i32>,
    request_timeout: Duration,
}

impl CachedSchemaRegistryClient {
    /// Create a client over any backend.
    pub fn new(backend: Arc<dyn RegistryBackend>) -> Self {
        Self {
            backend,
            schemas_by_id: Cache::builder().build(),
            ids_by_subject: Cache::builder().build(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Create a client talking HTTP to the configured registry.
    pub fn from_config(config: &SchemaRegistryConfig) -> Result<Self> {
        let backend = HttpRegistryBackend::new(config)?;
        Ok(Self::new(Arc::new(backend)).with_request_timeout(config.request_timeout()))
    }

    /// Bound every registry round-trip by `timeout`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    async fn round_trip<T>(&self, request: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.request_timeout, request)
            .await
            .map_err(|_| RegistryError::Timeout(self.request_timeout))?
    }

    async fn cache_schema(&self, id: i32, schema: &Schema) {
        // First writer wins; content under an ID never changes
        self.schemas_by_id.get_with(id, async { schema.clone() }).await;
    }

    fn subject_key(subject: &str, schema: &Schema) -> (String, String) {
        (subject.to_string(), schema.canonical_form().to_string())
    }

    /// Register `schema` under `subject` and return its ID.
    ///
    /// Repeated registrations of the same canonical schema under the same
    /// subject are answered from the cache.
    pub async fn register(&self, subject: &str, schema: &Schema) -> Result<i32> {
        let key = Self::subject_key(subject, schema);
        if let Some(id) = self.ids_by_subject.get(&key).await {
            return Ok(id);
        }

        let id = self
            .round_trip(self.backend.register(subject, schema.definition()))
            .await?;

        debug!(
            schema_id = id,
            subject = subject,
            schema_name = schema.name(),
            "Registered schema"
        );

        self.cache_schema(id, schema).await;
        self.ids_by_subject.insert(key, id).await;

        Ok(id)
    }

    /// Get the schema registered under `id`.
    pub async fn get_by_id(&self, id: i32) -> Result<Schema> {
        self.schemas_by_id
            .try_get_with(id, async {
                debug!(schema_id = id, "Schema cache miss, fetching from registry");
                let definition = self.round_trip(self.backend.schema_by_id(id)).await?;
                Schema::parse(&definition)
            })
            .await
            .map_err(|e: Arc<RegistryError>| (*e).clone())
    }

    /// Get the ID of `schema` under `subject` without registering it here.
    ///
    /// Whether an unknown schema is implicitly registered is up to the
    /// registry's policy.
    pub async fn get_by_subject_and_schema(&self, subject: &str, schema: &Schema) -> Result<i32> {
        let key = Self::subject_key(subject, schema);
        if let Some(id) = self.ids_by_subject.get(&key).await {
            return Ok(id);
        }

        let version = self.round_trip(self.backend.lookup(subject, schema.definition())).await?;

        debug!(
            schema_id = version.id,
            subject = subject,
            version = version.version,
            "Resolved schema ID"
        );

        self.cache_schema(version.id, schema).await;
        self.ids_by_subject.insert(key, version.id).await;

        Ok(version.id)
    }

    async fn resolve_version(&self, version: SubjectVersion) -> Result<RegisteredSchema> {
        let schema = match self.schemas_by_id.get(&version.id).await {
            Some(schema) => schema,
            None => {
                let schema = Schema::parse(&version.schema)?;
                self.cache_schema(version.id, &schema).await;
                schema
            }
        };

        self.ids_by_subject
            .insert(
                Self::subject_key(&version.subject, &schema),
                version.id,
            )
            .await;

        Ok(RegisteredSchema {
            id: version.id,
            subject: version.subject,
            version: version.version,
            schema,
        })
    }

    /// Latest version under `subject`. Always contacts the registry.
    pub async fn get_latest_schema(&self, subject: &str) -> Result<RegisteredSchema> {
        let version = self.round_trip(self.backend.latest_version(subject)).await?;
        self.resolve_version(version).await
    }

    /// Version number of `schema` under `subject`. Always contacts the registry.
    pub async fn get_version(&self, subject: &str, schema: &Schema) -> Result<i32> {
        let version = self.round_trip(self.backend.lookup(subject, schema.definition())).await?;
        Ok(self.resolve_version(version).await?.version)
    }

    /// Test `schema` against a version of `subject` (`None` for latest).
    pub async fn test_compatibility(
        &self,
        subject: &str,
        schema: &Schema,
        version: Option<i32>,
    ) -> Result<bool> {
        self.round_trip(self.backend.test_compatibility(subject, schema.definition(), version))
            .await
    }

    /// Delete `subject`, returning the versions it held.
    ///
    /// Cached IDs stay valid; the registry keeps deleted schemas resolvable.
    pub async fn delete_subject(&self, subject: &str) -> Result<Vec<i32>> {
        self.round_trip(self.backend.delete_subject(subject)).await
    }

    /// Compatibility mode of `subject`, or the global mode for `None`.
    pub async fn get_compatibility(&self, subject: Option<&str>) -> Result<CompatibilityMode> {
        self.round_trip(self.backend.get_compatibility(subject)).await
    }

    /// Set the compatibility mode of `subject`, or the global mode for `None`.
    pub async fn set_compatibility(
        &self,
        mode: CompatibilityMode,
        subject: Option<&str>,
    ) -> Result<CompatibilityMode> {
        self.round_trip(self.backend.set_compatibility(subject, mode)).await
    }

    /// Number of schemas cached by ID.
    pub async fn cached_schema_count(&self) -> u64 {
        self.schemas_by_id.run_pending_tasks().await;
        self.schemas_by_id.entry_count()
    }
}
