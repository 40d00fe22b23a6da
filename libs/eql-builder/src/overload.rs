//! Overload signature catalog and resolver
//!
//! Candidate signatures are kept in declaration order — concrete signatures
//! are listed before generic fallbacks by catalog construction — and the
//! first structural match wins, which makes resolution deterministic for a
//! given catalog.
//!
//! Matching an argument against a parameter type is structural: exact name
//! equality or an implicit scalar cast, element-wise for arrays and tuples,
//! common-pointer compatibility for objects, and `anytype` binding for
//! polymorphic parameters (the bound type monomorphizes the return type).

use crate::error::{Error, Result};
use crate::expr::ExpressionNode;
use indexmap::IndexMap;
use sigil_catalog::{ArrayDescriptor, SchemaRegistry, TypeDescriptor};
use sigil_schema::{Cardinality, FuncopKind, FuncopRecord, ReturnTypemod, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;

/// One positional or named parameter of a signature.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub type_id: TypeId,
    pub optional: bool,
    /// The callee consumes the whole input set (aggregates); never
    /// contributes to the result cardinality.
    pub whole_set: bool,
    pub variadic: bool,
}

/// One candidate signature for a function or operator name.
#[derive(Debug, Clone)]
pub struct OverloadSignature {
    pub name: String,
    pub kind: FuncopKind,
    pub params: Vec<ParamSpec>,
    pub named_params: IndexMap<String, ParamSpec>,
    pub return_type_id: TypeId,
    pub return_typemod: Option<ReturnTypemod>,
    pub preserves_optionality: bool,
}

impl From<FuncopRecord> for OverloadSignature {
    fn from(record: FuncopRecord) -> Self {
        let to_spec = |p: sigil_schema::ParamRecord| ParamSpec {
            type_id: p.type_id,
            optional: p.optional,
            whole_set: p.whole_set,
            variadic: p.variadic,
        };
        OverloadSignature {
            name: record.name,
            kind: record.kind,
            params: record.args.into_iter().map(to_spec).collect(),
            named_params: record
                .named_args
                .unwrap_or_default()
                .into_iter()
                .map(|(name, p)| (name, to_spec(p)))
                .collect(),
            return_type_id: record.return_type_id,
            return_typemod: record.return_typemod,
            preserves_optionality: record.preserves_optionality,
        }
    }
}

/// All overload signatures of a schema snapshot, keyed by name, in
/// declaration order. Loaded once, immutable thereafter.
#[derive(Debug, Default)]
pub struct FuncopCatalog {
    signatures: HashMap<String, Vec<OverloadSignature>>,
}

impl FuncopCatalog {
    pub fn from_records(records: Vec<FuncopRecord>) -> Self {
        let mut signatures: HashMap<String, Vec<OverloadSignature>> = HashMap::new();
        for record in records {
            signatures
                .entry(record.name.clone())
                .or_default()
                .push(OverloadSignature::from(record));
        }
        FuncopCatalog { signatures }
    }

    pub fn candidates(&self, name: &str) -> &[OverloadSignature] {
        self.signatures.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

/// An already-tokenized call site: ordered positional arguments (optional
/// slots may be explicitly absent) plus named arguments.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    pub positional: Vec<Option<Arc<ExpressionNode>>>,
    pub named: IndexMap<String, Arc<ExpressionNode>>,
}

impl CallArgs {
    pub fn positional<I>(args: I) -> Self
    where
        I: IntoIterator<Item = Arc<ExpressionNode>>,
    {
        CallArgs {
            positional: args.into_iter().map(Some).collect(),
            named: IndexMap::new(),
        }
    }

    pub fn with_named(mut self, name: impl Into<String>, arg: Arc<ExpressionNode>) -> Self {
        self.named.insert(name.into(), arg);
        self
    }

    /// Mark the next positional slot as explicitly absent (an optional
    /// parameter that is skipped in the middle of the argument list).
    pub fn with_absent(mut self) -> Self {
        self.positional.push(None);
        self
    }
}

/// Outcome of a successful overload resolution.
#[derive(Debug)]
pub struct ResolvedCall {
    /// Index of the accepted signature within the candidate list.
    pub index: usize,
    pub kind: FuncopKind,
    pub return_type: Arc<TypeDescriptor>,
    pub cardinality: Cardinality,
}

/// Select the first candidate signature that structurally accepts the call,
/// and compute the call's result type and cardinality.
pub fn resolve_call(
    registry: &SchemaRegistry,
    catalog: &FuncopCatalog,
    name: &str,
    args: &CallArgs,
) -> Result<ResolvedCall> {
    let candidates = catalog.candidates(name);
    for (index, signature) in candidates.iter().enumerate() {
        match try_candidate(registry, signature, args)? {
            Some((return_type, cardinality)) => {
                trace!(name, index, "overload resolved");
                return Ok(ResolvedCall {
                    index,
                    kind: signature.kind,
                    return_type,
                    cardinality,
                });
            }
            None => continue,
        }
    }
    debug!(
        name,
        candidates = candidates.len(),
        "no overload candidate accepted the call"
    );
    Err(Error::NoMatchingOverload {
        name: name.to_string(),
    })
}

/// Attempt one candidate. `Ok(None)` means a structural mismatch (try the
/// next candidate); `Err` is a hard failure (e.g. a dangling type id).
fn try_candidate(
    registry: &SchemaRegistry,
    signature: &OverloadSignature,
    args: &CallArgs,
) -> Result<Option<(Arc<TypeDescriptor>, Cardinality)>> {
    // unknown named arguments rule the candidate out, missing non-optional
    // named parameters as well
    for key in args.named.keys() {
        if !signature.named_params.contains_key(key) {
            return Ok(None);
        }
    }
    for (key, param) in &signature.named_params {
        if !param.optional && !args.named.contains_key(key) {
            return Ok(None);
        }
    }

    let has_variadic = signature.params.last().is_some_and(|p| p.variadic);
    if !has_variadic && args.positional.len() > signature.params.len() {
        return Ok(None);
    }

    let mut bound_polymorphic: Option<Arc<TypeDescriptor>> = None;
    let mut contributions: Vec<Cardinality> = Vec::with_capacity(args.positional.len() + 1);

    for (key, param) in &signature.named_params {
        let Some(arg) = args.named.get(key) else {
            // absent optional named argument: contributes the identity
            contributions.push(Cardinality::optional_param(None));
            continue;
        };
        let matched = compare_type(registry, param.type_id, arg.element(), &mut bound_polymorphic)?;
        if !matched {
            return Ok(None);
        }
        contributions.push(named_contribution(signature, param, arg.cardinality()));
    }

    for (position, param) in signature.params.iter().enumerate() {
        if param.variadic {
            // a single trailing variadic parameter consumes the remainder
            for slot in args.positional.iter().skip(position) {
                let Some(arg) = slot else {
                    return Ok(None);
                };
                let matched =
                    compare_type(registry, param.type_id, arg.element(), &mut bound_polymorphic)?;
                if !matched {
                    return Ok(None);
                }
                contributions.push(arg.cardinality());
            }
            break;
        }

        match args.positional.get(position).and_then(|slot| slot.as_ref()) {
            None => {
                if !param.optional {
                    return Ok(None);
                }
                // absent optional argument never reduces the result count
                contributions.push(Cardinality::optional_param(None));
            }
            Some(arg) => {
                let matched =
                    compare_type(registry, param.type_id, arg.element(), &mut bound_polymorphic)?;
                if !matched {
                    return Ok(None);
                }
                if param.whole_set {
                    if signature.preserves_optionality {
                        contributions.push(arg.cardinality().override_upper_one());
                    }
                    // otherwise the whole set is consumed as one unit and
                    // contributes nothing to the multiply chain
                } else if param.optional {
                    contributions.push(arg.cardinality().override_lower_one());
                } else {
                    contributions.push(arg.cardinality());
                }
            }
        }
    }

    let accumulated = Cardinality::multiply_all(contributions);
    let cardinality = match signature.return_typemod {
        Some(ReturnTypemod::SetOfType) => {
            if signature.preserves_optionality {
                accumulated
            } else {
                Cardinality::Many
            }
        }
        Some(ReturnTypemod::OptionalType) => {
            if signature.preserves_optionality {
                accumulated
            } else {
                accumulated.override_lower_zero()
            }
        }
        None => accumulated,
    };

    let return_type = materialize_return(registry, signature.return_type_id, &bound_polymorphic)?;
    Ok(Some((return_type, cardinality)))
}

fn named_contribution(
    signature: &OverloadSignature,
    param: &ParamSpec,
    cardinality: Cardinality,
) -> Cardinality {
    if param.whole_set {
        if signature.preserves_optionality {
            cardinality.override_upper_one()
        } else {
            Cardinality::One
        }
    } else if param.optional {
        cardinality.override_lower_one()
    } else {
        cardinality
    }
}

/// Structural parameter/argument compatibility. Binds the first `anytype`
/// occurrence into `bound` for return-type monomorphization.
fn compare_type(
    registry: &SchemaRegistry,
    param_type_id: TypeId,
    arg: &Arc<TypeDescriptor>,
    bound: &mut Option<Arc<TypeDescriptor>>,
) -> Result<bool> {
    let param = registry.resolve(param_type_id)?;

    if param.is_polymorphic() {
        if bound.is_none() {
            *bound = Some(arg.clone());
        }
        return Ok(true);
    }

    let matched = match (param.as_ref(), arg.as_ref()) {
        (TypeDescriptor::Scalar(p), TypeDescriptor::Scalar(a)) => {
            p.name == a.name || registry.casts().is_implicitly_castable(a.id, p.id)
        }

        (TypeDescriptor::Array(p), TypeDescriptor::Array(a)) => {
            let arg_element = registry.resolve(a.element_id)?;
            compare_type(registry, p.element_id, arg_element, bound)?
        }

        (TypeDescriptor::Object(p), TypeDescriptor::Object(a)) => {
            // every pointer both shapes declare must agree exactly; pointers
            // on only one side don't rule the match out
            let param_shape = p.pointers(registry)?;
            let arg_shape = a.pointers(registry)?;
            param_shape.iter().all(|(name, pointer)| {
                arg_shape.get(name).map_or(true, |other| {
                    other.target_id == pointer.target_id
                        && other.cardinality == pointer.cardinality
                })
            })
        }

        (TypeDescriptor::Tuple(p), TypeDescriptor::Tuple(a)) => {
            if p.elements.len() != a.elements.len() {
                false
            } else {
                let mut all = true;
                for (param_el, arg_el) in p.elements.iter().zip(&a.elements) {
                    let arg_el = registry.resolve(*arg_el)?;
                    if !compare_type(registry, *param_el, arg_el, bound)? {
                        all = false;
                        break;
                    }
                }
                all
            }
        }

        (TypeDescriptor::NamedTuple(p), TypeDescriptor::NamedTuple(a)) => {
            if p.elements.len() != a.elements.len() {
                false
            } else {
                let mut all = true;
                for ((param_name, param_el), (arg_name, arg_el)) in
                    p.elements.iter().zip(&a.elements)
                {
                    if param_name != arg_name {
                        all = false;
                        break;
                    }
                    let arg_el = registry.resolve(*arg_el)?;
                    if !compare_type(registry, *param_el, arg_el, bound)? {
                        all = false;
                        break;
                    }
                }
                all
            }
        }

        _ => false,
    };

    Ok(matched)
}

/// Resolve a signature's return type at a call site, substituting the bound
/// concrete type for `anytype` (directly or as an array element).
fn materialize_return(
    registry: &SchemaRegistry,
    return_type_id: TypeId,
    bound: &Option<Arc<TypeDescriptor>>,
) -> Result<Arc<TypeDescriptor>> {
    let declared = registry.resolve(return_type_id)?;

    if declared.is_polymorphic() {
        return bound
            .clone()
            .ok_or_else(|| sigil_catalog::Error::UnboundPolymorphicType("anytype".into()).into());
    }

    if let TypeDescriptor::Array(array) = declared.as_ref() {
        let element = registry.resolve(array.element_id)?;
        if element.is_polymorphic() {
            let bound = bound.clone().ok_or_else(|| {
                sigil_catalog::Error::UnboundPolymorphicType("anytype".into())
            })?;
            return Ok(Arc::new(TypeDescriptor::Array(ArrayDescriptor {
                id: Uuid::new_v4(),
                name: format!("array<{}>", bound.name()),
                element_id: bound.id(),
            })));
        }
    }

    Ok(declared.clone())
}
