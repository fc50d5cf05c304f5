//! Registry Types
//!
//! Subject versions, compatibility modes and the JSON bodies exchanged with a
//! Confluent-compatible registry.

use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compatibility mode for schema evolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompatibilityMode {
    /// New schema can read data written with old schema
    #[default]
    Backward,

    /// Old schema can read data written with new schema
    Forward,

    /// Both backward and forward compatible
    Full,

    /// Backward compatible with all previous versions
    BackwardTransitive,

    /// Forward compatible with all previous versions
    ForwardTransitive,

    /// Full compatibility with all previous versions
    FullTransitive,

    /// No compatibility checking
    None,
}

impl CompatibilityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompatibilityMode::Backward => "BACKWARD",
            CompatibilityMode::Forward => "FORWARD",
            CompatibilityMode::Full => "FULL",
            CompatibilityMode::BackwardTransitive => "BACKWARD_TRANSITIVE",
            CompatibilityMode::ForwardTransitive => "FORWARD_TRANSITIVE",
            CompatibilityMode::FullTransitive => "FULL_TRANSITIVE",
            CompatibilityMode::None => "NONE",
        }
    }
}

impl fmt::Display for CompatibilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schema version as stored under a subject, in registry form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectVersion {
    pub subject: String,
    pub id: i32,
    pub version: i32,
    pub schema: String,
}

/// A subject version whose schema has been parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredSchema {
    pub id: i32,
    pub subject: String,
    pub version: i32,
    pub schema: Schema,
}

/// Schema registration / lookup request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRequest {
    pub schema: String,
}

/// Schema registration response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterSchemaResponse {
    pub id: i32,
}

/// `GET /schemas/ids/{id}` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaByIdResponse {
    pub schema: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityCheckResponse {
    pub is_compatible: bool,
}

/// `PUT /config` request and response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub compatibility: CompatibilityMode,
}

/// `GET /config` response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    #[serde(rename = "compatibilityLevel")]
    pub compatibility_level: CompatibilityMode,
}

/// Error body returned by the registry on non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_code: i32,
    pub message: String,
}
