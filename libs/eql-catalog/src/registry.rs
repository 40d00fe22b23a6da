//! The schema registry
//!
//! Canonicalizes raw introspection records into frozen descriptors. One
//! registry per schema snapshot; construction validates the type graph
//! eagerly, pointer shapes flatten lazily on first access.

use crate::casts::CastMap;
use crate::descriptor::{
    ArrayDescriptor, NamedTupleDescriptor, ObjectDescriptor, PointerDescriptor, ScalarDescriptor,
    TupleDescriptor, TypeDescriptor,
};
use crate::error::{Error, Result};
use crate::globals::GlobalDescriptor;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use sigil_schema::{
    BacklinkRecord, CastRecord, Cardinality, GlobalRecord, PointerKind, PointerRecord,
    SchemaVersion, TypeId, TypeRecord,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Frozen catalog of one schema snapshot.
pub struct SchemaRegistry {
    version: SchemaVersion,
    types: HashMap<TypeId, Arc<TypeDescriptor>>,
    ids_by_name: HashMap<String, TypeId>,
    casts: CastMap,
    globals: HashMap<String, GlobalDescriptor>,
}

impl SchemaRegistry {
    /// Build a registry from introspection output.
    ///
    /// Validates base references eagerly (a scalar base must be a scalar, an
    /// object base must be an object — checked on shape access) and enforces
    /// the one-descriptor-per-name invariant.
    pub fn from_introspection(
        types: Vec<TypeRecord>,
        casts: &[CastRecord],
        globals: Vec<GlobalRecord>,
        version: SchemaVersion,
    ) -> Result<Self> {
        let mut descriptors = HashMap::with_capacity(types.len());
        let mut ids_by_name = HashMap::with_capacity(types.len());

        for record in &types {
            if ids_by_name
                .insert(record.name().to_string(), record.id())
                .is_some()
            {
                return Err(Error::DuplicateTypeName(record.name().to_string()));
            }
        }

        for record in types {
            let descriptor = build_descriptor(record);
            descriptors.insert(descriptor.id(), Arc::new(descriptor));
        }

        // scalar bases can be validated without any graph walk
        for descriptor in descriptors.values() {
            if let Some(scalar) = descriptor.as_scalar() {
                for base_id in &scalar.bases {
                    let base = descriptors
                        .get(base_id)
                        .ok_or(Error::UnresolvedType(*base_id))?;
                    if base.as_scalar().is_none() {
                        return Err(Error::InvalidBaseType {
                            name: base.name().to_string(),
                        });
                    }
                }
            }
        }

        let globals = if globals.is_empty() || version.supports_globals() {
            globals
                .into_iter()
                .map(|record| {
                    let descriptor = GlobalDescriptor::from(record);
                    (descriptor.name.clone(), descriptor)
                })
                .collect()
        } else {
            warn!(
                %version,
                "schema version predates global variables, ignoring {} global(s)",
                globals.len()
            );
            HashMap::new()
        };

        let registry = SchemaRegistry {
            version,
            types: descriptors,
            ids_by_name,
            casts: CastMap::from_records(casts),
            globals,
        };
        debug!(
            types = registry.types.len(),
            globals = registry.globals.len(),
            version = %registry.version,
            "schema registry built"
        );
        Ok(registry)
    }

    /// Resolve a type id to its canonical descriptor.
    pub fn resolve(&self, id: TypeId) -> Result<&Arc<TypeDescriptor>> {
        self.types.get(&id).ok_or(Error::UnresolvedType(id))
    }

    /// Resolve a type by display name.
    pub fn resolve_by_name(&self, name: &str) -> Result<&Arc<TypeDescriptor>> {
        let id = self
            .ids_by_name
            .get(name)
            .ok_or_else(|| Error::UnresolvedTypeName(name.to_string()))?;
        self.resolve(*id)
    }

    /// Look up a global variable. Fails with `UnsupportedSchemaVersion` when
    /// the snapshot predates globals.
    pub fn global(&self, name: &str) -> Result<&GlobalDescriptor> {
        if !self.version.supports_globals() {
            return Err(Error::UnsupportedSchemaVersion {
                feature: "global variables",
                version: self.version.clone(),
            });
        }
        self.globals
            .get(name)
            .ok_or_else(|| Error::UnknownGlobal(name.to_string()))
    }

    pub fn casts(&self) -> &CastMap {
        &self.casts
    }

    pub fn version(&self) -> &SchemaVersion {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("version", &self.version)
            .field("types", &self.types.len())
            .field("globals", &self.globals.len())
            .finish()
    }
}

fn build_descriptor(record: TypeRecord) -> TypeDescriptor {
    match record {
        TypeRecord::Scalar {
            id,
            name,
            is_abstract,
            bases,
            enum_values,
        } => TypeDescriptor::Scalar(ScalarDescriptor {
            id,
            name,
            is_abstract,
            bases: bases.into_iter().map(|base| base.id).collect(),
            enum_values,
        }),

        TypeRecord::Object {
            id,
            name,
            is_abstract,
            bases,
            pointers,
            backlinks,
            backlink_stubs,
        } => {
            let mut own_pointers: Vec<Arc<PointerDescriptor>> =
                pointers.into_iter().map(|p| Arc::new(build_pointer(p))).collect();
            own_pointers.extend(backlinks.into_iter().map(|b| Arc::new(build_backlink(b))));
            own_pointers.extend(
                backlink_stubs
                    .into_iter()
                    .map(|b| Arc::new(build_backlink(b))),
            );

            TypeDescriptor::Object(ObjectDescriptor {
                id,
                name,
                is_abstract,
                bases: bases.into_iter().map(|base| base.id).collect(),
                own_pointers,
                shape: OnceCell::new(),
            })
        }

        TypeRecord::Array {
            id,
            name,
            array_element_id,
        } => TypeDescriptor::Array(ArrayDescriptor {
            id,
            name,
            element_id: array_element_id,
        }),

        TypeRecord::Tuple {
            id,
            name,
            tuple_elements,
        } => {
            // positional tuples come through with "0", "1", ... element names
            let unnamed = tuple_elements
                .first()
                .is_some_and(|element| element.name == "0");
            if unnamed {
                TypeDescriptor::Tuple(TupleDescriptor {
                    id,
                    name,
                    elements: tuple_elements.into_iter().map(|e| e.target_id).collect(),
                })
            } else {
                TypeDescriptor::NamedTuple(NamedTupleDescriptor {
                    id,
                    name,
                    elements: tuple_elements
                        .into_iter()
                        .map(|e| (e.name, e.target_id))
                        .collect::<IndexMap<_, _>>(),
                })
            }
        }
    }
}

fn build_pointer(record: PointerRecord) -> PointerDescriptor {
    let link_properties = record
        .pointers
        .unwrap_or_default()
        .into_iter()
        // only plain properties make sense as link properties; the implicit
        // source/target endpoints are not reflected
        .filter(|p| p.kind == PointerKind::Property && p.name != "source" && p.name != "target")
        .map(|p| Arc::new(build_pointer(p)))
        .collect();

    PointerDescriptor {
        name: record.name,
        kind: record.kind,
        cardinality: record.real_cardinality,
        target_id: record.target_id,
        is_exclusive: record.is_exclusive,
        is_writable: record.is_writable,
        link_properties,
    }
}

fn build_backlink(record: BacklinkRecord) -> PointerDescriptor {
    let cardinality = if record.stub.is_some() {
        // stubs collapse all incoming links of that name; no bound is known
        Cardinality::Many
    } else {
        record.real_cardinality
    };
    PointerDescriptor {
        name: record.name,
        kind: PointerKind::Link,
        cardinality,
        target_id: record.target_id,
        is_exclusive: record.is_exclusive,
        is_writable: false,
        link_properties: Vec::new(),
    }
}
