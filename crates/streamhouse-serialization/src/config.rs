//! Avro client configuration
//!
//! ```toml
//! subject_name_strategy = "topic_name"
//! auto_register = true
//! default_value_schema = '{"type": "record", "name": "Order", "fields": [{"name": "amount", "type": "long"}]}'
//!
//! [schema_registry]
//! url = "http://localhost:8081"
//! credentials_source = "SASL_INHERIT"
//!
//! [sasl]
//! mechanism = "PLAIN"
//! username = "svc-orders"
//! password = "secret"
//! ```

use crate::avro::AvroSerializer;
use crate::error::SerializerError;
use crate::subject::SubjectNameStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use streamhouse_schema_registry::{
    CachedSchemaRegistryClient, Schema, SchemaRegistryConfig, TransportAuth,
};

fn default_auto_register() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AvroClientConfig {
    pub schema_registry: SchemaRegistryConfig,

    /// Transport SASL settings, shared with the registry under `SASL_INHERIT`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sasl: Option<TransportAuth>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_key_schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value_schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reader_key_schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reader_value_schema: Option<String>,

    #[serde(default)]
    pub subject_name_strategy: SubjectNameStrategy,

    #[serde(default = "default_auto_register")]
    pub auto_register: bool,
}

impl AvroClientConfig {
    pub fn new(schema_registry: SchemaRegistryConfig) -> Self {
        Self {
            schema_registry,
            sasl: None,
            default_key_schema: None,
            default_value_schema: None,
            reader_key_schema: None,
            reader_value_schema: None,
            subject_name_strategy: SubjectNameStrategy::default(),
            auto_register: default_auto_register(),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, SerializerError> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| SerializerError::Config(format!("Invalid client config: {}", e)))?;
        config.schema_registry.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, SerializerError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SerializerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Registry settings with transport credentials applied.
    pub fn registry_config(&self) -> SchemaRegistryConfig {
        let mut config = self.schema_registry.clone();
        if let Some(auth) = &self.sasl {
            config.inherit_transport_auth(auth);
        }
        config
    }

    pub fn registry_client(&self) -> Result<CachedSchemaRegistryClient, SerializerError> {
        Ok(CachedSchemaRegistryClient::from_config(
            &self.registry_config(),
        )?)
    }

    pub fn key_serializer(
        &self,
        registry: Arc<CachedSchemaRegistryClient>,
    ) -> Result<AvroSerializer, SerializerError> {
        self.serializer(
            registry,
            self.default_key_schema.as_deref(),
            self.reader_key_schema.as_deref(),
        )
    }

    pub fn value_serializer(
        &self,
        registry: Arc<CachedSchemaRegistryClient>,
    ) -> Result<AvroSerializer, SerializerError> {
        self.serializer(
            registry,
            self.default_value_schema.as_deref(),
            self.reader_value_schema.as_deref(),
        )
    }

    fn serializer(
        &self,
        registry: Arc<CachedSchemaRegistryClient>,
        schema: Option<&str>,
        reader_schema: Option<&str>,
    ) -> Result<AvroSerializer, SerializerError> {
        let mut serializer = AvroSerializer::new(registry)
            .with_subject_name_strategy(self.subject_name_strategy)
            .auto_register(self.auto_register);
        if let Some(schema) = schema {
            serializer = serializer.with_schema(Schema::parse(schema)?);
        }
        if let Some(reader) = reader_schema {
            serializer = serializer.with_reader_schema(Schema::parse(reader)?);
        }
        Ok(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use streamhouse_schema_registry::{CredentialsSource, RegistryError};

    const CONFIG: &str = r#"
subject_name_strategy = "record_name"
default_value_schema = '{"type": "record", "name": "Order", "namespace": "shop", "fields": [{"name": "amount", "type": "long"}]}'

[schema_registry]
url = "http://localhost:8081"
credentials_source = "SASL_INHERIT"

[sasl]
mechanism = "PLAIN"
username = "alice"
password = "s3cret"
"#;

    #[test]
    fn test_parse_config() {
        let config = AvroClientConfig::from_toml(CONFIG).unwrap();
        assert_eq!(config.subject_name_strategy, SubjectNameStrategy::RecordName);
        assert!(config.auto_register);
        assert_eq!(
            config.schema_registry.credentials_source,
            CredentialsSource::SaslInherit
        );
        assert!(config.default_key_schema.is_none());
    }

    #[test]
    fn test_sasl_credentials_inherited() {
        let config = AvroClientConfig::from_toml(CONFIG).unwrap();
        let registry = config.registry_config();
        assert_eq!(
            registry.basic_auth().unwrap(),
            Some(("alice".to_string(), "s3cret".to_string()))
        );
    }

    #[test]
    fn test_invalid_registry_url() {
        let err = AvroClientConfig::from_toml(
            r#"
[schema_registry]
url = "localhost:8081"
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SerializerError::Registry(RegistryError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = AvroClientConfig::from_toml(
            r#"
auto_regster = false

[schema_registry]
url = "http://localhost:8081"
"#,
        )
        .unwrap_err();
        assert!(matches!(&err, SerializerError::Config(m) if m.contains("auto_regster")));

        let err = AvroClientConfig::from_toml(
            r#"
[schema_registry]
url = "http://localhost:8081"
credentials_sorce = "USER_INFO"
"#,
        )
        .unwrap_err();
        assert!(matches!(&err, SerializerError::Config(m) if m.contains("credentials_sorce")));
    }

    #[tokio::test]
    async fn test_serializers_from_config() {
        let config = AvroClientConfig::from_toml(CONFIG).unwrap();
        let registry = Arc::new(config.registry_client().unwrap());

        let value = config.value_serializer(registry.clone()).unwrap();
        assert_eq!(value.schema().map(|s| s.name()), Some("shop.Order"));

        let key = config.key_serializer(registry).unwrap();
        assert!(key.schema().is_none());
    }

    #[test]
    fn test_invalid_default_schema() {
        let mut config = AvroClientConfig::new(SchemaRegistryConfig::new("http://localhost:8081"));
        config.default_value_schema = Some("{not json".to_string());
        let registry = Arc::new(config.registry_client().unwrap());

        let err = config.value_serializer(registry).err().unwrap();
        assert!(matches!(
            err,
            SerializerError::Registry(RegistryError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();

        let config = AvroClientConfig::load(file.path()).unwrap();
        assert_eq!(config.schema_registry.url, "http://localhost:8081");

        let missing = AvroClientConfig::load(Path::new("/nonexistent/client.toml"));
        assert!(matches!(missing, Err(SerializerError::Config(_))));
    }
}
