//! Scalar cast compatibility
//!
//! Built once from raw cast records. Introspection emits direct edges only;
//! cast compatibility is the transitive closure over those edges, computed
//! here with a depth-first walk so lookups are set membership.

use sigil_schema::{CastRecord, TypeId};
use std::collections::{BTreeSet, HashMap};

/// Transitive implicit-cast and assignment-cast compatibility between
/// scalar types.
#[derive(Debug, Default)]
pub struct CastMap {
    implicit: HashMap<TypeId, BTreeSet<TypeId>>,
    assignable: HashMap<TypeId, BTreeSet<TypeId>>,
}

impl CastMap {
    pub fn from_records(records: &[CastRecord]) -> Self {
        let mut implicit_edges: HashMap<TypeId, Vec<TypeId>> = HashMap::new();
        let mut assignable_edges: HashMap<TypeId, Vec<TypeId>> = HashMap::new();

        for cast in records {
            if cast.allow_implicit {
                implicit_edges
                    .entry(cast.source.id)
                    .or_default()
                    .push(cast.target.id);
            }
            // every implicit cast is also usable in assignment position
            if cast.allow_assignment || cast.allow_implicit {
                assignable_edges
                    .entry(cast.source.id)
                    .or_default()
                    .push(cast.target.id);
            }
        }

        CastMap {
            implicit: closure(&implicit_edges),
            assignable: closure(&assignable_edges),
        }
    }

    /// Whether `from` is implicitly castable to `to` through any chain of
    /// implicit casts. A type is not considered castable to itself.
    pub fn is_implicitly_castable(&self, from: TypeId, to: TypeId) -> bool {
        self.implicit
            .get(&from)
            .is_some_and(|targets| targets.contains(&to))
    }

    /// Whether `from` may be assigned to a `to`-typed pointer.
    pub fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        from == to
            || self
                .assignable
                .get(&from)
                .is_some_and(|targets| targets.contains(&to))
    }

    /// The most specific type both `a` and `b` implicitly cast into, if one
    /// exists. Used to unify element types of heterogeneous collections.
    pub fn shared_parent(&self, a: TypeId, b: TypeId) -> Option<TypeId> {
        if a == b {
            return Some(a);
        }
        if self.is_implicitly_castable(a, b) {
            return Some(b);
        }
        if self.is_implicitly_castable(b, a) {
            return Some(a);
        }

        let reachable_a = self.implicit.get(&a)?;
        let reachable_b = self.implicit.get(&b)?;
        let common: Vec<TypeId> = reachable_a.intersection(reachable_b).copied().collect();

        // most specific: casts into every other common ancestor
        common
            .iter()
            .copied()
            .find(|candidate| {
                common
                    .iter()
                    .all(|other| other == candidate || self.is_implicitly_castable(*candidate, *other))
            })
            .or_else(|| common.first().copied())
    }
}

/// Transitive closure of an adjacency list.
fn closure(edges: &HashMap<TypeId, Vec<TypeId>>) -> HashMap<TypeId, BTreeSet<TypeId>> {
    let mut result = HashMap::new();
    for source in edges.keys() {
        let mut reachable = BTreeSet::new();
        let mut stack: Vec<TypeId> = edges.get(source).cloned().unwrap_or_default();
        while let Some(next) = stack.pop() {
            if next != *source && reachable.insert(next) {
                if let Some(targets) = edges.get(&next) {
                    stack.extend(targets.iter().copied());
                }
            }
        }
        result.insert(*source, reachable);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_schema::TypeRef;
    use uuid::Uuid;

    fn cast(source: TypeId, target: TypeId, implicit: bool, assignment: bool) -> CastRecord {
        CastRecord {
            id: Uuid::new_v4(),
            source: TypeRef {
                id: source,
                name: String::new(),
            },
            target: TypeRef {
                id: target,
                name: String::new(),
            },
            allow_assignment: assignment,
            allow_implicit: implicit,
        }
    }

    #[test]
    fn closure_is_transitive() {
        let (int16, int32, int64) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let map = CastMap::from_records(&[
            cast(int16, int32, true, false),
            cast(int32, int64, true, false),
        ]);

        assert!(map.is_implicitly_castable(int16, int32));
        assert!(map.is_implicitly_castable(int16, int64));
        assert!(!map.is_implicitly_castable(int64, int16));
    }

    #[test]
    fn assignment_includes_implicit_edges() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let map = CastMap::from_records(&[cast(a, b, true, false)]);

        assert!(map.is_assignable(a, b));
        assert!(map.is_assignable(a, a));
        assert!(!map.is_assignable(b, a));
    }

    #[test]
    fn shared_parent_picks_most_specific() {
        // int32 -> int64 -> float64, float32 -> float64
        let (int32, int64, float32, float64) =
            (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let map = CastMap::from_records(&[
            cast(int32, int64, true, false),
            cast(int64, float64, true, false),
            cast(float32, float64, true, false),
        ]);

        assert_eq!(map.shared_parent(int32, int64), Some(int64));
        assert_eq!(map.shared_parent(int32, float32), Some(float64));
        assert_eq!(map.shared_parent(int32, int32), Some(int32));
        assert_eq!(map.shared_parent(int32, Uuid::new_v4()), None);
    }
}
