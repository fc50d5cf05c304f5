//! In-Memory Registry Backend
//!
//! A process-local schema registry. Suitable for development, testing, and
//! single-process deployments that do not share schemas with other clients.

use crate::{
    backend::RegistryBackend,
    compatibility::check_compatibility,
    error::{RegistryError, Result},
    types::{CompatibilityMode, SubjectVersion},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory schema registry
///
/// IDs are global: identical canonical content registered under several
/// subjects shares one ID. Versions start at 1 per subject.
pub struct MemoryRegistryBackend {
    state: RwLock<MemoryState>,
    /// Number of round-trips served, including failed ones
    request_count: AtomicUsize,
    available: AtomicBool,
    latency: Option<Duration>,
}

struct MemoryState {
    next_id: i32,
    /// Canonical form -> schema ID
    ids_by_canonical: HashMap<String, i32>,
    /// Schema ID -> (definition, parsed)
    schemas_by_id: HashMap<i32, (String, apache_avro::Schema)>,
    /// Subject -> versions in registration order
    subjects: HashMap<String, Vec<SubjectVersion>>,
    subject_compatibility: HashMap<String, CompatibilityMode>,
    global_compatibility: CompatibilityMode,
}

impl Default for MemoryRegistryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegistryBackend {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                next_id: 1,
                ids_by_canonical: HashMap::new(),
                schemas_by_id: HashMap::new(),
                subjects: HashMap::new(),
                subject_compatibility: HashMap::new(),
                global_compatibility: CompatibilityMode::default(),
            }),
            request_count: AtomicUsize::new(0),
            available: AtomicBool::new(true),
            latency: None,
        }
    }

    /// Delay every round-trip by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of round-trips served so far.
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Simulate an outage: while unavailable every call fails with
    /// [`RegistryError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    async fn begin(&self) -> Result<()> {
        self.request_count.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(RegistryError::Unavailable(
                "in-memory registry is offline".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse(schema: &str) -> Result<(apache_avro::Schema, String)> {
    let parsed = apache_avro::Schema::parse_str(schema)
        .map_err(|e| RegistryError::InvalidSchema(format!("Invalid Avro schema: {}", e)))?;
    let canonical = parsed.canonical_form();
    Ok((parsed, canonical))
}

impl MemoryState {
    fn compatibility(&self, subject: &str) -> CompatibilityMode {
        self.subject_compatibility
            .get(subject)
            .copied()
            .unwrap_or(self.global_compatibility)
    }

    fn versions(&self, subject: &str) -> Result<&Vec<SubjectVersion>> {
        self.subjects
            .get(subject)
            .filter(|versions| !versions.is_empty())
            .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))
    }

    fn find_version(&self, subject: &str, canonical: &str) -> Option<&SubjectVersion> {
        let versions = self.subjects.get(subject)?;
        versions.iter().find(|v| {
            self.schemas_by_id
                .get(&v.id)
                .map(|(_, parsed)| parsed.canonical_form() == canonical)
                .unwrap_or(false)
        })
    }

    fn parsed(&self, id: i32) -> Option<&apache_avro::Schema> {
        self.schemas_by_id.get(&id).map(|(_, parsed)| parsed)
    }
}

#[async_trait]
impl RegistryBackend for MemoryRegistryBackend {
    async fn register(&self, subject: &str, schema: &str) -> Result<i32> {
        self.begin().await?;
        let (parsed, canonical) = parse(schema)?;

        let mut state = self.state.write().await;

        // Check if this exact schema already exists for this subject
        if let Some(existing) = state.find_version(subject, &canonical) {
            return Ok(existing.id);
        }

        let mode = state.compatibility(subject);
        if let Some(versions) = state.subjects.get(subject) {
            let transitive = matches!(
                mode,
                CompatibilityMode::BackwardTransitive
                    | CompatibilityMode::ForwardTransitive
                    | CompatibilityMode::FullTransitive
            );
            let checked: Vec<&SubjectVersion> = if transitive {
                versions.iter().collect()
            } else {
                versions.last().into_iter().collect()
            };

            for version in checked {
                let compatible = state
                    .parsed(version.id)
                    .map(|existing| check_compatibility(existing, &parsed, mode))
                    .unwrap_or(true);
                if !compatible {
                    return Err(RegistryError::Rejected {
                        status: 409,
                        message: format!(
                            "Schema being registered is incompatible with version {} under {} mode",
                            version.version, mode
                        ),
                    });
                }
            }
        }

        let existing_id = state.ids_by_canonical.get(&canonical).copied();
        let id = match existing_id {
            Some(id) => id,
            None => {
                let id = state.next_id;
                state.next_id += 1;
                state.ids_by_canonical.insert(canonical, id);
                state
                    .schemas_by_id
                    .insert(id, (schema.trim().to_string(), parsed));
                id
            }
        };

        let versions = state.subjects.entry(subject.to_string()).or_default();
        let version = versions.last().map(|v| v.version).unwrap_or(0) + 1;
        versions.push(SubjectVersion {
            subject: subject.to_string(),
            id,
            version,
            schema: schema.trim().to_string(),
        });

        Ok(id)
    }

    async fn lookup(&self, subject: &str, schema: &str) -> Result<SubjectVersion> {
        self.begin().await?;
        let (_, canonical) = parse(schema)?;

        let state = self.state.read().await;
        state.versions(subject)?;
        state
            .find_version(subject, &canonical)
            .cloned()
            .ok_or_else(|| {
                RegistryError::SchemaNotFound(format!("schema not registered under {}", subject))
            })
    }

    async fn schema_by_id(&self, id: i32) -> Result<String> {
        self.begin().await?;

        let state = self.state.read().await;
        state
            .schemas_by_id
            .get(&id)
            .map(|(definition, _)| definition.clone())
            .ok_or_else(|| RegistryError::SchemaNotFound(format!("id {}", id)))
    }

    async fn latest_version(&self, subject: &str) -> Result<SubjectVersion> {
        self.begin().await?;

        let state = self.state.read().await;
        let versions = state.versions(subject)?;
        versions
            .last()
            .cloned()
            .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))
    }

    async fn test_compatibility(
        &self,
        subject: &str,
        schema: &str,
        version: Option<i32>,
    ) -> Result<bool> {
        self.begin().await?;
        let (candidate, _) = parse(schema)?;

        let state = self.state.read().await;
        let versions = state.versions(subject)?;
        let target = match version {
            Some(number) => versions.iter().find(|v| v.version == number),
            None => versions.last(),
        }
        .ok_or_else(|| {
            RegistryError::SchemaNotFound(format!("{} version {:?}", subject, version))
        })?;

        let mode = state.compatibility(subject);
        Ok(state
            .parsed(target.id)
            .map(|existing| check_compatibility(existing, &candidate, mode))
            .unwrap_or(false))
    }

    async fn delete_subject(&self, subject: &str) -> Result<Vec<i32>> {
        self.begin().await?;

        // IDs stay resolvable after the subject is gone
        let mut state = self.state.write().await;
        state.subject_compatibility.remove(subject);
        state
            .subjects
            .remove(subject)
            .map(|versions| versions.iter().map(|v| v.version).collect())
            .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))
    }

    async fn get_compatibility(&self, subject: Option<&str>) -> Result<CompatibilityMode> {
        self.begin().await?;

        let state = self.state.read().await;
        Ok(match subject {
            Some(subject) => state.compatibility(subject),
            None => state.global_compatibility,
        })
    }

    async fn set_compatibility(
        &self,
        subject: Option<&str>,
        mode: CompatibilityMode,
    ) -> Result<CompatibilityMode> {
        self.begin().await?;

        let mut state = self.state.write().await;
        match subject {
            Some(subject) => {
                state.subject_compatibility.insert(subject.to_string(), mode);
            }
            None => state.global_compatibility = mode,
        }
        Ok(mode)
    }
}
