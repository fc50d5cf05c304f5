//! Registry Backends
//!
//! The raw round-trip surface of a schema registry. Every call on a backend
//! is one request to the authority; caching lives in
//! [`CachedSchemaRegistryClient`](crate::CachedSchemaRegistryClient).

use crate::{
    error::Result,
    types::{CompatibilityMode, SubjectVersion},
};
use async_trait::async_trait;

/// Schema registry round-trips
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    /// Register `schema` under `subject` and return its ID.
    ///
    /// Registering content the subject already holds returns the existing ID.
    async fn register(&self, subject: &str, schema: &str) -> Result<i32>;

    /// Find the version of `subject` holding `schema`.
    async fn lookup(&self, subject: &str, schema: &str) -> Result<SubjectVersion>;

    /// Get the schema document registered under `id`.
    async fn schema_by_id(&self, id: i32) -> Result<String>;

    /// Get the latest version registered under `subject`.
    async fn latest_version(&self, subject: &str) -> Result<SubjectVersion>;

    /// Test `schema` against a version of `subject` (`None` for latest).
    async fn test_compatibility(
        &self,
        subject: &str,
        schema: &str,
        version: Option<i32>,
    ) -> Result<bool>;

    /// Delete `subject`, returning the versions it held.
    async fn delete_subject(&self, subject: &str) -> Result<Vec<i32>>;

    /// Compatibility mode of `subject`, or the global mode for `None`.
    async fn get_compatibility(&self, subject: Option<&str>) -> Result<CompatibilityMode>;

    /// Set the compatibility mode of `subject`, or the global mode for `None`.
    async fn set_compatibility(
        &self,
        subject: Option<&str>,
        mode: CompatibilityMode,
    ) -> Result<CompatibilityMode>;
}
