//! Parsed Avro schemas.

use crate::error::{RegistryError, Result};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// An immutable, parsed Avro schema.
///
/// Two schemas are equal when their Parsing Canonical Forms are equal, which
/// is also the key the registry client caches ids under. Cloning shares the
/// parsed document.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

struct SchemaInner {
    /// Original document, sent to the registry on registration
    definition: String,
    canonical: String,
    parsed: apache_avro::Schema,
    name: String,
}

impl Schema {
    /// Parse a schema document.
    ///
    /// Accepts records (`{"type": "record", ...}`) as well as bare primitive
    /// names such as `"string"`.
    pub fn parse(definition: &str) -> Result<Self> {
        let parsed = apache_avro::Schema::parse_str(definition)
            .map_err(|e| RegistryError::InvalidSchema(format!("Invalid Avro schema: {}", e)))?;

        let canonical = parsed.canonical_form();
        let name = match parsed.name() {
            Some(name) => name.fullname(None),
            None => canonical.trim_matches('"').to_string(),
        };

        Ok(Self {
            inner: Arc::new(SchemaInner {
                definition: definition.trim().to_string(),
                canonical,
                parsed,
                name,
            }),
        })
    }

    pub fn definition(&self) -> &str {
        &self.inner.definition
    }

    /// Parsing Canonical Form of the schema
    pub fn canonical_form(&self) -> &str {
        &self.inner.canonical
    }

    pub fn avro(&self) -> &apache_avro::Schema {
        &self.inner.parsed
    }

    /// Full name for named types, the type name for everything else.
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.inner.canonical == other.inner.canonical
    }
}

impl Eq for Schema {}

impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.canonical.hash(state);
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.inner.name)
            .field("canonical", &self.inner.canonical)
            .finish()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.definition)
    }
}

impl FromStr for Schema {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Schema::parse(s)
    }
}
