//! HTTP Registry Backend
//!
//! Speaks the Confluent Schema Registry REST API.

use crate::{
    backend::RegistryBackend,
    config::SchemaRegistryConfig,
    error::{RegistryError, Result},
    types::*,
};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const CONTENT_TYPE_V1: &str = "application/vnd.schemaregistry.v1+json";
const ACCEPT_HEADER: &str =
    "application/vnd.schemaregistry.v1+json, application/vnd.schemaregistry+json, application/json";

/// Confluent error code for an unknown subject
const SUBJECT_NOT_FOUND: i32 = 40401;

/// HTTP client for Schema Registry operations
pub struct HttpRegistryBackend {
    base_url: Url,
    http_client: reqwest::Client,
    basic_auth: Option<(String, String)>,
    timeout: Duration,
}

impl HttpRegistryBackend {
    /// Create a backend from validated configuration.
    ///
    /// Reads the CA bundle and client identity from disk when configured.
    pub fn new(config: &SchemaRegistryConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder().timeout(config.request_timeout());

        if let Some(ca_location) = &config.ssl_ca_location {
            let pem = std::fs::read(ca_location).map_err(|e| {
                RegistryError::Config(format!(
                    "Failed to read CA bundle {}: {}",
                    ca_location.display(),
                    e
                ))
            })?;
            let certificate = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| RegistryError::Config(format!("Invalid CA bundle: {}", e)))?;
            builder = builder.add_root_certificate(certificate);
        }

        if let (Some(cert), Some(key)) =
            (&config.ssl_certificate_location, &config.ssl_key_location)
        {
            let mut pem = std::fs::read(cert).map_err(|e| {
                RegistryError::Config(format!(
                    "Failed to read client certificate {}: {}",
                    cert.display(),
                    e
                ))
            })?;
            let key_pem = std::fs::read(key).map_err(|e| {
                RegistryError::Config(format!("Failed to read client key {}: {}", key.display(), e))
            })?;
            pem.extend_from_slice(&key_pem);

            let identity = reqwest::Identity::from_pem(&pem)
                .map_err(|e| RegistryError::Config(format!("Invalid client identity: {}", e)))?;
            builder = builder.identity(identity);
        }

        let http_client = builder
            .build()
            .map_err(|e| RegistryError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url()?,
            http_client,
            basic_auth: config.basic_auth()?,
            timeout: config.request_timeout(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RegistryError::Config(format!("Invalid registry URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn config_endpoint(&self, subject: Option<&str>) -> Result<Url> {
        match subject {
            Some(subject) => self.endpoint(&["config", subject]),
            None => self.endpoint(&["config"]),
        }
    }

    async fn send<B, T>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        not_found: impl FnOnce(i32, String) -> RegistryError,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self
            .http_client
            .request(method.clone(), url.clone())
            .header(ACCEPT, ACCEPT_HEADER);

        if let Some(body) = body {
            let payload = serde_json::to_vec(body).map_err(|e| {
                RegistryError::InvalidResponse(format!("Failed to encode request: {}", e))
            })?;
            request = request.header(CONTENT_TYPE, CONTENT_TYPE_V1).body(payload);
        }

        if let Some((user, password)) = &self.basic_auth {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RegistryError::Timeout(self.timeout)
            } else {
                RegistryError::Unavailable(format!("{} {} failed: {}", method, url.path(), e))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                RegistryError::InvalidResponse(format!(
                    "Failed to parse response from {}: {}",
                    url.path(),
                    e
                ))
            });
        }

        let body = response.text().await.unwrap_or_default();
        let (error_code, message) = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(error) => (error.error_code, error.message),
            Err(_) => (0, body),
        };

        tracing::debug!(
            status = status.as_u16(),
            error_code = error_code,
            path = url.path(),
            "Schema registry request failed"
        );

        if status == StatusCode::NOT_FOUND {
            return Err(not_found(error_code, message));
        }

        if status.is_server_error() {
            return Err(RegistryError::Unavailable(format!(
                "registry returned {}: {}",
                status, message
            )));
        }

        Err(RegistryError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

fn subject_not_found(subject: &str) -> impl FnOnce(i32, String) -> RegistryError + '_ {
    move |code, message| {
        if code == SUBJECT_NOT_FOUND {
            RegistryError::SubjectNotFound(subject.to_string())
        } else {
            RegistryError::SchemaNotFound(format!("{}: {}", subject, message))
        }
    }
}

#[async_trait]
impl RegistryBackend for HttpRegistryBackend {
    async fn register(&self, subject: &str, schema: &str) -> Result<i32> {
        let url = self.endpoint(&["subjects", subject, "versions"])?;
        let request = SchemaRequest {
            schema: schema.to_string(),
        };

        let response: RegisterSchemaResponse = self
            .send(Method::POST, url, Some(&request), subject_not_found(subject))
            .await?;

        tracing::debug!(
            schema_id = response.id,
            subject = subject,
            "Schema registered successfully"
        );

        Ok(response.id)
    }

    async fn lookup(&self, subject: &str, schema: &str) -> Result<SubjectVersion> {
        let url = self.endpoint(&["subjects", subject])?;
        let request = SchemaRequest {
            schema: schema.to_string(),
        };

        self.send(Method::POST, url, Some(&request), subject_not_found(subject)).await
    }

    async fn schema_by_id(&self, id: i32) -> Result<String> {
        let url = self.endpoint(&["schemas", "ids", &id.to_string()])?;

        let response: SchemaByIdResponse = self
            .send(Method::GET, url, None::<&()>, |_, _| {
                RegistryError::SchemaNotFound(format!("id {}", id))
            })
            .await?;

        tracing::debug!(schema_id = id, "Schema retrieved successfully");

        Ok(response.schema)
    }

    async fn latest_version(&self, subject: &str) -> Result<SubjectVersion> {
        let url = self.endpoint(&["subjects", subject, "versions", "latest"])?;
        self.send(Method::GET, url, None::<&()>, subject_not_found(subject)).await
    }

    async fn test_compatibility(
        &self,
        subject: &str,
        schema: &str,
        version: Option<i32>,
    ) -> Result<bool> {
        let version = version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "latest".to_string());
        let url = self.endpoint(&["compatibility", "subjects", subject, "versions", &version])?;
        let request = SchemaRequest {
            schema: schema.to_string(),
        };

        let response: CompatibilityCheckResponse = self
            .send(Method::POST, url, Some(&request), subject_not_found(subject))
            .await?;

        tracing::debug!(
            subject = subject,
            version = %version,
            is_compatible = response.is_compatible,
            "Compatibility test completed"
        );

        Ok(response.is_compatible)
    }

    async fn delete_subject(&self, subject: &str) -> Result<Vec<i32>> {
        let url = self.endpoint(&["subjects", subject])?;
        self.send(Method::DELETE, url, None::<&()>, subject_not_found(subject)).await
    }

    async fn get_compatibility(&self, subject: Option<&str>) -> Result<CompatibilityMode> {
        let url = self.config_endpoint(subject)?;
        let label = subject.unwrap_or("global").to_string();

        let response: ConfigResponse = self
            .send(Method::GET, url, None::<&()>, move |_, _| {
                RegistryError::SubjectNotFound(label)
            })
            .await?;
        Ok(response.compatibility_level)
    }

    async fn set_compatibility(
        &self,
        subject: Option<&str>,
        mode: CompatibilityMode,
    ) -> Result<CompatibilityMode> {
        let url = self.config_endpoint(subject)?;
        let label = subject.unwrap_or("global").to_string();
        let request = ConfigUpdate {
            compatibility: mode,
        };

        let response: ConfigUpdate = self
            .send(Method::PUT, url, Some(&request), move |_, _| {
                RegistryError::SubjectNotFound(label)
            })
            .await?;
        Ok(response.compatibility)
    }
}
