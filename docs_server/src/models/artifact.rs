//! docs.artifact — One generated output file of a revision, addressed by relative path.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::schema::docs_artifacts;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = docs_artifacts)]
pub struct Artifact {
    pub id: i64,
    pub revision_id: i64,
    pub path: String,
    pub content: Vec<u8>,
    pub last_modified: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = docs_artifacts)]
pub struct NewArtifact {
    pub revision_id: i64,
    pub path: String,
    pub content: Vec<u8>,
    pub last_modified: DateTime<Utc>,
}
