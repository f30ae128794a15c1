//! Member descriptor source
//!
//! The introspection facility the caches sit in front of. Lookup semantics
//! (scope filtering, hierarchy walk, ambiguity) belong entirely to the
//! source; the caches only remember what it answered.

use crate::descriptor::MemberDescriptor;
use crate::error::AccessResult;
use crate::registry::TypeHandle;
use crate::scope::{BindingScope, MemberKind};
use crate::value::ValueType;

/// Raw, uncached member queries
pub trait MemberSource: Send + Sync {
    /// Find one member of `kind` named `name` visible under `scope`.
    ///
    /// `Ok(None)` means the member does not exist under that scope.
    fn raw_find(
        &self,
        ty: &TypeHandle,
        kind: MemberKind,
        name: &str,
        scope: BindingScope,
    ) -> AccessResult<Option<MemberDescriptor>>;

    /// All members of `kind` visible under `scope`, in source order
    fn raw_list(
        &self,
        ty: &TypeHandle,
        kind: MemberKind,
        scope: BindingScope,
    ) -> AccessResult<Vec<MemberDescriptor>>;

    /// Find the method named `name` whose parameter types equal `params`
    fn raw_find_method(
        &self,
        ty: &TypeHandle,
        name: &str,
        params: &[ValueType],
        scope: BindingScope,
    ) -> AccessResult<Option<MemberDescriptor>> {
        let methods = self.raw_list(ty, MemberKind::Method, scope)?;
        Ok(methods
            .into_iter()
            .find(|m| scope.name_matches(m.name(), name) && m.info().has_signature(params)))
    }
}

impl<S: MemberSource + ?Sized> MemberSource for std::sync::Arc<S> {
    fn raw_find(
        &self,
        ty: &TypeHandle,
        kind: MemberKind,
        name: &str,
        scope: BindingScope,
    ) -> AccessResult<Option<MemberDescriptor>> {
        (**self).raw_find(ty, kind, name, scope)
    }

    fn raw_list(
        &self,
        ty: &TypeHandle,
        kind: MemberKind,
        scope: BindingScope,
    ) -> AccessResult<Vec<MemberDescriptor>> {
        (**self).raw_list(ty, kind, scope)
    }

    fn raw_find_method(
        &self,
        ty: &TypeHandle,
        name: &str,
        params: &[ValueType],
        scope: BindingScope,
    ) -> AccessResult<Option<MemberDescriptor>> {
        (**self).raw_find_method(ty, name, params, scope)
    }
}
