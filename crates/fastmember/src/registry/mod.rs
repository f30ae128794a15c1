//! Type registry: the bundled introspection facility
//!
//! Host types are declared with a [`TypeBuilder`] and registered here. The
//! registry answers raw member queries (by name or in bulk) the slow way, by
//! walking declared member lists up the parent chain, and hands out
//! [`Instance`]s whose slots the compiled accessors read and write.
//!
//! ## Lookup rules
//!
//! - Members declared on the queried type come first, then each parent's in
//!   turn, each in declaration order.
//! - Private members of a parent are never visible through a subtype.
//! - Parent static members are only visible with `FLATTEN_HIERARCHY`.
//! - `DECLARED_ONLY` stops the walk at the queried type.
//! - A derived member hides a parent member with the same name (methods:
//!   same name and parameter types).
//! - A by-name lookup that matches several members declared on the same
//!   type reports `AmbiguousMember`.

mod builder;
mod instance;

pub use builder::{FieldDef, MethodDef, PropertyDef, TypeBuilder};
pub use instance::{Instance, StaticStorage};

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::descriptor::{MemberDescriptor, MemberInfo};
use crate::error::{AccessError, AccessResult};
use crate::scope::{BindingScope, MemberKind};
use crate::source::MemberSource;
use crate::value::Value;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Registered type record
pub(crate) struct TypeDef {
    pub(crate) registry_id: u64,
    pub(crate) name: String,
    pub(crate) parent: Option<TypeHandle>,
    pub(crate) fields: Vec<Arc<MemberInfo>>,
    pub(crate) properties: Vec<Arc<MemberInfo>>,
    pub(crate) methods: Vec<Arc<MemberInfo>>,
    /// Initial slot values for new instances, inherited slots first
    pub(crate) instance_defaults: Vec<Value>,
    pub(crate) statics: StaticStorage,
}

/// Opaque handle to a registered type.
///
/// Equality and hashing are identity of the type record: two types with the
/// same name and shape in different registries are different types.
#[derive(Clone)]
pub struct TypeHandle(Arc<TypeDef>);

impl TypeHandle {
    /// Type name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Parent type, if any
    pub fn parent(&self) -> Option<&TypeHandle> {
        self.0.parent.as_ref()
    }

    /// This type followed by each parent up to the root
    pub fn ancestors(&self) -> impl Iterator<Item = &TypeHandle> {
        std::iter::successors(Some(self), |ty| ty.parent())
    }

    /// Whether this type is `other` or derives from it
    pub fn is_subtype_of(&self, other: &TypeHandle) -> bool {
        self.ancestors().any(|ty| ty == other)
    }

    /// Number of slots an instance of this type carries
    pub fn instance_slot_count(&self) -> usize {
        self.0.instance_defaults.len()
    }

    /// Static slots of this type
    pub fn statics(&self) -> &StaticStorage {
        &self.0.statics
    }

    pub(crate) fn declared(&self, kind: MemberKind) -> &[Arc<MemberInfo>] {
        match kind {
            MemberKind::Field => &self.0.fields,
            MemberKind::Property => &self.0.properties,
            MemberKind::Method => &self.0.methods,
        }
    }

    pub(crate) fn registry_id(&self) -> u64 {
        self.0.registry_id
    }

    pub(crate) fn instance_defaults(&self) -> &[Value] {
        &self.0.instance_defaults
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({})", self.0.name)
    }
}

#[derive(Default)]
struct TypeTable {
    by_name: FxHashMap<String, usize>,
    types: Vec<TypeHandle>,
}

/// Registry of host types
pub struct TypeRegistry {
    id: u64,
    table: RwLock<TypeTable>,
}

impl TypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            table: RwLock::new(TypeTable::default()),
        }
    }

    /// Start declaring a type; finish with [`TypeBuilder::build`]
    pub fn define(&self, name: &str) -> TypeBuilder {
        TypeBuilder::new(name)
    }

    /// Get a type by name
    pub fn get(&self, name: &str) -> Option<TypeHandle> {
        let table = self.table.read();
        table.by_name.get(name).map(|&idx| table.types[idx].clone())
    }

    /// All registered types in registration order
    pub fn types(&self) -> Vec<TypeHandle> {
        self.table.read().types.clone()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.table.read().types.len()
    }

    /// Check if no types are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the handle was issued by this registry
    pub fn owns(&self, ty: &TypeHandle) -> bool {
        ty.registry_id() == self.id
    }

    /// Create an instance with every slot at its initial value
    pub fn instantiate(&self, ty: &TypeHandle) -> AccessResult<Instance> {
        self.ensure_owned(ty)?;
        Ok(Instance::new(ty.clone(), ty.instance_defaults().to_vec()))
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn ensure_owned(&self, ty: &TypeHandle) -> AccessResult<()> {
        if self.owns(ty) {
            Ok(())
        } else {
            Err(AccessError::ForeignType {
                type_name: ty.name().to_string(),
            })
        }
    }

    pub(crate) fn insert(&self, def: TypeDef) -> AccessResult<TypeHandle> {
        let mut table = self.table.write();
        if table.by_name.contains_key(&def.name) {
            return Err(AccessError::DuplicateType(def.name));
        }
        let handle = TypeHandle(Arc::new(def));
        let idx = table.types.len();
        table.by_name.insert(handle.name().to_string(), idx);
        table.types.push(handle.clone());
        tracing::debug!(registry = self.id, ty = handle.name(), "registered type");
        Ok(handle)
    }

    fn check_query(&self, ty: &TypeHandle, scope: BindingScope) -> AccessResult<()> {
        self.ensure_owned(ty)?;
        if scope.is_valid() {
            Ok(())
        } else {
            Err(AccessError::InvalidScope(scope))
        }
    }

    /// Walk the hierarchy collecting members of `kind` visible under `scope`
    fn visible_members(
        &self,
        ty: &TypeHandle,
        kind: MemberKind,
        scope: BindingScope,
    ) -> Vec<MemberDescriptor> {
        let mut found: Vec<MemberDescriptor> = Vec::new();

        for (depth, current) in ty.ancestors().enumerate() {
            let inherited = depth > 0;
            if inherited && scope.contains(BindingScope::DECLARED_ONLY) {
                break;
            }

            for (index, info) in current.declared(kind).iter().enumerate() {
                if inherited {
                    if !info.visibility().is_inherited() {
                        continue;
                    }
                    if info.is_static() && !scope.contains(BindingScope::FLATTEN_HIERARCHY) {
                        continue;
                    }
                }
                if !scope.admits(info.is_static(), info.visibility()) {
                    continue;
                }
                if found.iter().any(|seen| hides(seen.info(), info)) {
                    continue;
                }
                found.push(MemberDescriptor::new(current.clone(), index, info.clone()));
            }
        }

        found
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("id", &self.id)
            .field("types", &self.len())
            .finish()
    }
}

/// Whether a member already collected from a subtype hides `candidate`
fn hides(seen: &MemberInfo, candidate: &MemberInfo) -> bool {
    if seen.name() != candidate.name() {
        return false;
    }
    match candidate.kind() {
        MemberKind::Method => {
            let types: Vec<_> = candidate.parameters().iter().map(|p| p.ty.clone()).collect();
            seen.has_signature(&types)
        }
        MemberKind::Field | MemberKind::Property => true,
    }
}

impl MemberSource for TypeRegistry {
    fn raw_find(
        &self,
        ty: &TypeHandle,
        kind: MemberKind,
        name: &str,
        scope: BindingScope,
    ) -> AccessResult<Option<MemberDescriptor>> {
        self.check_query(ty, scope)?;

        let mut matches = self
            .visible_members(ty, kind, scope)
            .into_iter()
            .filter(|d| scope.name_matches(d.name(), name));

        let Some(first) = matches.next() else {
            return Ok(None);
        };
        if matches.any(|d| d.declaring_type() == first.declaring_type()) {
            return Err(AccessError::AmbiguousMember {
                type_name: ty.name().to_string(),
                name: name.to_string(),
            });
        }
        Ok(Some(first))
    }

    fn raw_list(
        &self,
        ty: &TypeHandle,
        kind: MemberKind,
        scope: BindingScope,
    ) -> AccessResult<Vec<MemberDescriptor>> {
        self.check_query(ty, scope)?;
        Ok(self.visible_members(ty, kind, scope))
    }
}
