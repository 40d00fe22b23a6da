//! Global variable descriptors
//!
//! Globals were added to the schema model in major version 2; against older
//! snapshots the feature is simply absent rather than fatal, and lookups
//! fail with `UnsupportedSchemaVersion`.

use sigil_schema::{Cardinality, GlobalRecord, TypeId};
use uuid::Uuid;

/// A schema-level global variable.
#[derive(Debug, Clone)]
pub struct GlobalDescriptor {
    pub id: Uuid,
    pub name: String,
    pub target_id: TypeId,
    pub cardinality: Cardinality,
}

impl From<GlobalRecord> for GlobalDescriptor {
    fn from(record: GlobalRecord) -> Self {
        GlobalDescriptor {
            id: record.id,
            name: record.name,
            target_id: record.target_id,
            cardinality: record.real_cardinality,
        }
    }
}
