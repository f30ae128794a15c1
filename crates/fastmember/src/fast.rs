//! Fast reflection facade
//!
//! Bundles one [`LookupCache`] and one [`AccessorCache`] over a shared
//! source. Descriptors come out of the lookup side; reads, writes and calls
//! go through the accessor side.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::accessor_cache::AccessorCache;
use crate::compiler::CompiledAccessor;
use crate::descriptor::{MemberDescriptor, Receiver};
use crate::error::AccessResult;
use crate::lookup::LookupCache;
use crate::options::CacheOptions;
use crate::registry::{Instance, TypeHandle, TypeRegistry};
use crate::scope::{BindingScope, MemberKind};
use crate::source::MemberSource;
use crate::stats::CacheStatsSnapshot;
use crate::value::{ReturnValue, Value, ValueType};

/// Counters of both caches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastReflectionStats {
    /// Lookup cache counters; misses are source calls
    pub lookups: CacheStatsSnapshot,
    /// Accessor cache counters; misses are compilations
    pub accessors: CacheStatsSnapshot,
}

/// Cached member lookup plus cached accessors
pub struct FastReflection<S = TypeRegistry> {
    lookups: LookupCache<S>,
    accessors: AccessorCache,
}

impl<S: MemberSource> FastReflection<S> {
    /// Create a facade over `source` with default options
    pub fn new(source: Arc<S>) -> Self {
        Self::with_options(source, &CacheOptions::default())
    }

    /// Create a facade over `source`
    pub fn with_options(source: Arc<S>, options: &CacheOptions) -> Self {
        Self {
            lookups: LookupCache::with_options(source, options),
            accessors: AccessorCache::with_options(options),
        }
    }

    /// Find a field; a `None` scope means public instance members
    pub fn field(
        &self,
        ty: &TypeHandle,
        name: &str,
        scope: impl Into<Option<BindingScope>>,
    ) -> AccessResult<Option<MemberDescriptor>> {
        self.lookups.find_field(ty, name, resolve(scope))
    }

    /// Find a property
    pub fn property(
        &self,
        ty: &TypeHandle,
        name: &str,
        scope: impl Into<Option<BindingScope>>,
    ) -> AccessResult<Option<MemberDescriptor>> {
        self.lookups.find_property(ty, name, resolve(scope))
    }

    /// Find a method by name; overloaded names need
    /// [`method_by_signature`](Self::method_by_signature)
    pub fn method(
        &self,
        ty: &TypeHandle,
        name: &str,
        scope: impl Into<Option<BindingScope>>,
    ) -> AccessResult<Option<MemberDescriptor>> {
        self.lookups.find_method(ty, name, resolve(scope))
    }

    /// Find a method overload by parameter types
    pub fn method_by_signature(
        &self,
        ty: &TypeHandle,
        name: &str,
        params: &[ValueType],
        scope: impl Into<Option<BindingScope>>,
    ) -> AccessResult<Option<MemberDescriptor>> {
        self.lookups.find_method_by_signature(ty, name, params, resolve(scope))
    }

    /// All fields
    pub fn fields(
        &self,
        ty: &TypeHandle,
        scope: impl Into<Option<BindingScope>>,
    ) -> AccessResult<Arc<[MemberDescriptor]>> {
        self.lookups.list_fields(ty, resolve(scope))
    }

    /// All properties
    pub fn properties(
        &self,
        ty: &TypeHandle,
        scope: impl Into<Option<BindingScope>>,
    ) -> AccessResult<Arc<[MemberDescriptor]>> {
        self.lookups.list_properties(ty, resolve(scope))
    }

    /// All methods
    pub fn methods(
        &self,
        ty: &TypeHandle,
        scope: impl Into<Option<BindingScope>>,
    ) -> AccessResult<Arc<[MemberDescriptor]>> {
        self.lookups.list_methods(ty, resolve(scope))
    }

    /// A readable or writable member by name: properties first, then fields
    pub fn value_member(
        &self,
        ty: &TypeHandle,
        name: &str,
        scope: impl Into<Option<BindingScope>>,
    ) -> AccessResult<Option<MemberDescriptor>> {
        let scope = resolve(scope);
        match self.lookups.find_property(ty, name, scope)? {
            Some(property) => Ok(Some(property)),
            None => self.lookups.find_field(ty, name, scope),
        }
    }

    /// The compiled accessor for a descriptor
    pub fn accessor(&self, descriptor: &MemberDescriptor) -> Arc<CompiledAccessor> {
        self.accessors.get_accessor(descriptor)
    }

    /// Read a field or property
    pub fn get_value(&self, descriptor: &MemberDescriptor, receiver: Receiver<'_>) -> AccessResult<Value> {
        self.accessor(descriptor).get(receiver)
    }

    /// Write a field or property
    pub fn set_value(
        &self,
        descriptor: &MemberDescriptor,
        receiver: Receiver<'_>,
        value: Value,
    ) -> AccessResult<()> {
        self.accessor(descriptor).set(receiver, value)
    }

    /// Call a method
    pub fn invoke(
        &self,
        descriptor: &MemberDescriptor,
        receiver: Receiver<'_>,
        args: &[Value],
    ) -> AccessResult<ReturnValue> {
        self.accessor(descriptor).invoke(receiver, args)
    }

    /// Read a member of `instance` by name.
    ///
    /// Returns `Ok(None)` if the instance's type has no such property or
    /// field under `scope`.
    pub fn get_by_name(
        &self,
        instance: &Instance,
        name: &str,
        scope: impl Into<Option<BindingScope>>,
    ) -> AccessResult<Option<Value>> {
        match self.value_member(instance.type_handle(), name, scope)? {
            Some(member) => self.get_value(&member, Some(instance)).map(Some),
            None => Ok(None),
        }
    }

    /// Number of cached descriptors of `kind` for a listing of `ty`
    pub fn member_count(
        &self,
        ty: &TypeHandle,
        kind: MemberKind,
        scope: impl Into<Option<BindingScope>>,
    ) -> AccessResult<usize> {
        Ok(self.lookups.list_members(ty, kind, resolve(scope))?.len())
    }

    /// The lookup cache
    pub fn lookups(&self) -> &LookupCache<S> {
        &self.lookups
    }

    /// The accessor cache
    pub fn accessors(&self) -> &AccessorCache {
        &self.accessors
    }

    /// The underlying source
    pub fn source(&self) -> &Arc<S> {
        self.lookups.source()
    }

    /// Counters of both caches
    pub fn stats(&self) -> FastReflectionStats {
        FastReflectionStats {
            lookups: self.lookups.stats(),
            accessors: self.accessors.stats(),
        }
    }
}

/// `None` selects the default scope
fn resolve(scope: impl Into<Option<BindingScope>>) -> BindingScope {
    scope.into().unwrap_or_default()
}
