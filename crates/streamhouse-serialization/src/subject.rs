//! Subject naming strategies.

use crate::context::SerializationContext;
use serde::{Deserialize, Serialize};
use streamhouse_schema_registry::Schema;

/// How the registry subject for a record is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectNameStrategy {
    /// `{topic}-{key|value}`
    #[default]
    TopicName,
    /// `{topic}-{record fullname}`
    TopicRecordName,
    /// `{record fullname}`
    RecordName,
}

impl SubjectNameStrategy {
    pub fn subject_name(&self, ctx: &SerializationContext<'_>, schema: &Schema) -> String {
        match self {
            SubjectNameStrategy::TopicName => format!("{}-{}", ctx.topic(), ctx.field()),
            SubjectNameStrategy::TopicRecordName => format!("{}-{}", ctx.topic(), schema.name()),
            SubjectNameStrategy::RecordName => schema.name().to_string(),
        }
    }
}
