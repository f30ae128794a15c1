//! Lookup cache
//!
//! Memoizes member queries against a [`MemberSource`]:
//!
//! | Query                       | Key                                   | Stored answer                        |
//! |-----------------------------|---------------------------------------|--------------------------------------|
//! | `find_member`               | (type, kind, name, scope)             | `AccessResult<Option<MemberDescriptor>>` |
//! | `list_members`              | (type, kind, scope)                   | `AccessResult<Arc<[MemberDescriptor]>>`  |
//! | `find_method_by_signature`  | (type, name, parameter types, scope)  | `AccessResult<Option<MemberDescriptor>>` |
//!
//! Every answer the source gives is stored, including "not found" and
//! errors such as an ambiguous name or an invalid scope. Source answers are
//! deterministic, so a key reaches the source at most once outside of
//! races on a cold key.

use std::sync::Arc;

use crate::descriptor::MemberDescriptor;
use crate::error::AccessResult;
use crate::memo::Memo;
use crate::options::CacheOptions;
use crate::registry::TypeHandle;
use crate::scope::{BindingScope, MemberKind};
use crate::source::MemberSource;
use crate::stats::{CacheStats, CacheStatsSnapshot};
use crate::value::ValueType;

/// Key for single-member lookups
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey {
    ty: TypeHandle,
    kind: MemberKind,
    name: Box<str>,
    scope: BindingScope,
}

impl LookupKey {
    /// Build a key
    pub fn new(ty: &TypeHandle, kind: MemberKind, name: &str, scope: BindingScope) -> Self {
        Self {
            ty: ty.clone(),
            kind,
            name: name.into(),
            scope,
        }
    }
}

/// Key for bulk enumeration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListKey {
    ty: TypeHandle,
    kind: MemberKind,
    scope: BindingScope,
}

impl ListKey {
    /// Build a key
    pub fn new(ty: &TypeHandle, kind: MemberKind, scope: BindingScope) -> Self {
        Self {
            ty: ty.clone(),
            kind,
            scope,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SignatureKey {
    ty: TypeHandle,
    name: Box<str>,
    params: Box<[ValueType]>,
    scope: BindingScope,
}

/// Memoizing front for a member source
pub struct LookupCache<S> {
    source: Arc<S>,
    members: Memo<LookupKey, AccessResult<Option<MemberDescriptor>>>,
    lists: Memo<ListKey, AccessResult<Arc<[MemberDescriptor]>>>,
    signatures: Memo<SignatureKey, AccessResult<Option<MemberDescriptor>>>,
    stats: Arc<CacheStats>,
}

impl<S: MemberSource> LookupCache<S> {
    /// Create a cache over `source` with default options
    pub fn new(source: Arc<S>) -> Self {
        Self::with_options(source, &CacheOptions::default())
    }

    /// Create a cache over `source`
    pub fn with_options(source: Arc<S>, options: &CacheOptions) -> Self {
        let stats = Arc::new(CacheStats::new(options.collect_stats));
        let shards = options.effective_shard_amount();
        let capacity = options.lookup_capacity;
        tracing::debug!(capacity, ?shards, "creating lookup cache");
        Self {
            source,
            members: Memo::new(capacity, shards, stats.clone()),
            lists: Memo::new(capacity, shards, stats.clone()),
            signatures: Memo::new(capacity, shards, stats.clone()),
            stats,
        }
    }

    /// The underlying source
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Find one member by name.
    ///
    /// The source is consulted at most once per distinct key unless threads
    /// race on a cold key, in which case every caller still receives the
    /// single stored answer.
    pub fn find_member(
        &self,
        ty: &TypeHandle,
        kind: MemberKind,
        name: &str,
        scope: BindingScope,
    ) -> AccessResult<Option<MemberDescriptor>> {
        let key = LookupKey::new(ty, kind, name, scope);
        self.members.get_or_insert_with(key, || {
            tracing::trace!(ty = ty.name(), %kind, name, ?scope, "lookup miss");
            self.source.raw_find(ty, kind, name, scope)
        })
    }

    /// All members of a kind, in source order
    pub fn list_members(
        &self,
        ty: &TypeHandle,
        kind: MemberKind,
        scope: BindingScope,
    ) -> AccessResult<Arc<[MemberDescriptor]>> {
        let key = ListKey::new(ty, kind, scope);
        self.lists.get_or_insert_with(key, || {
            tracing::trace!(ty = ty.name(), %kind, ?scope, "list miss");
            self.source.raw_list(ty, kind, scope).map(Arc::from)
        })
    }

    /// Find the method overload whose parameter types equal `params`
    pub fn find_method_by_signature(
        &self,
        ty: &TypeHandle,
        name: &str,
        params: &[ValueType],
        scope: BindingScope,
    ) -> AccessResult<Option<MemberDescriptor>> {
        let key = SignatureKey {
            ty: ty.clone(),
            name: name.into(),
            params: params.into(),
            scope,
        };
        self.signatures.get_or_insert_with(key, || {
            tracing::trace!(ty = ty.name(), name, arity = params.len(), "signature miss");
            self.source.raw_find_method(ty, name, params, scope)
        })
    }

    /// Find a field by name
    pub fn find_field(
        &self,
        ty: &TypeHandle,
        name: &str,
        scope: BindingScope,
    ) -> AccessResult<Option<MemberDescriptor>> {
        self.find_member(ty, MemberKind::Field, name, scope)
    }

    /// Find a property by name
    pub fn find_property(
        &self,
        ty: &TypeHandle,
        name: &str,
        scope: BindingScope,
    ) -> AccessResult<Option<MemberDescriptor>> {
        self.find_member(ty, MemberKind::Property, name, scope)
    }

    /// Find a method by name
    pub fn find_method(
        &self,
        ty: &TypeHandle,
        name: &str,
        scope: BindingScope,
    ) -> AccessResult<Option<MemberDescriptor>> {
        self.find_member(ty, MemberKind::Method, name, scope)
    }

    /// All fields
    pub fn list_fields(
        &self,
        ty: &TypeHandle,
        scope: BindingScope,
    ) -> AccessResult<Arc<[MemberDescriptor]>> {
        self.list_members(ty, MemberKind::Field, scope)
    }

    /// All properties
    pub fn list_properties(
        &self,
        ty: &TypeHandle,
        scope: BindingScope,
    ) -> AccessResult<Arc<[MemberDescriptor]>> {
        self.list_members(ty, MemberKind::Property, scope)
    }

    /// All methods
    pub fn list_methods(
        &self,
        ty: &TypeHandle,
        scope: BindingScope,
    ) -> AccessResult<Arc<[MemberDescriptor]>> {
        self.list_members(ty, MemberKind::Method, scope)
    }

    /// Number of stored answers across all tables
    pub fn len(&self) -> usize {
        self.members.len() + self.lists.len() + self.signatures.len()
    }

    /// Check if nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current hit/miss counters
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}
