//! Binding scopes, member kinds and visibility

use std::fmt;

bitflags::bitflags! {
    /// Which members a lookup may observe.
    ///
    /// A usable scope names at least one of `STATIC`/`INSTANCE` and at least
    /// one of `PUBLIC`/`NON_PUBLIC`. The remaining flags modify how the source
    /// walks the type hierarchy and compares names.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindingScope: u8 {
        /// Static (type-level) members
        const STATIC = 1 << 0;
        /// Instance members
        const INSTANCE = 1 << 1;
        /// Public members
        const PUBLIC = 1 << 2;
        /// Protected and private members
        const NON_PUBLIC = 1 << 3;
        /// Only members declared on the queried type itself
        const DECLARED_ONLY = 1 << 4;
        /// Include public and protected static members of parent types
        const FLATTEN_HIERARCHY = 1 << 5;
        /// ASCII case-insensitive name comparison
        const IGNORE_CASE = 1 << 6;
    }
}

impl BindingScope {
    /// Static and instance members of every visibility
    pub const EVERYTHING: BindingScope = BindingScope::STATIC
        .union(BindingScope::INSTANCE)
        .union(BindingScope::PUBLIC)
        .union(BindingScope::NON_PUBLIC);

    /// Public static members
    pub const PUBLIC_STATIC: BindingScope = BindingScope::STATIC.union(BindingScope::PUBLIC);

    /// Protected and private instance members
    pub const NON_PUBLIC_INSTANCE: BindingScope =
        BindingScope::INSTANCE.union(BindingScope::NON_PUBLIC);

    /// Whether the scope selects at least one ownership and one visibility
    pub fn is_valid(self) -> bool {
        self.intersects(BindingScope::STATIC | BindingScope::INSTANCE)
            && self.intersects(BindingScope::PUBLIC | BindingScope::NON_PUBLIC)
    }

    /// Whether a member with this ownership and visibility passes the filter
    pub fn admits(self, is_static: bool, visibility: Visibility) -> bool {
        let ownership = if is_static {
            BindingScope::STATIC
        } else {
            BindingScope::INSTANCE
        };
        let access = if visibility.is_public() {
            BindingScope::PUBLIC
        } else {
            BindingScope::NON_PUBLIC
        };
        self.contains(ownership | access)
    }

    /// Compare a member name under this scope's case rule
    pub fn name_matches(self, declared: &str, requested: &str) -> bool {
        if self.contains(BindingScope::IGNORE_CASE) {
            declared.eq_ignore_ascii_case(requested)
        } else {
            declared == requested
        }
    }
}

impl Default for BindingScope {
    fn default() -> Self {
        BindingScope::INSTANCE | BindingScope::PUBLIC
    }
}

/// Kind of a type member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Stored field
    Field,
    /// Property backed by getter/setter functions
    Property,
    /// Callable method
    Method,
}

impl MemberKind {
    /// Lowercase name used in diagnostics
    pub fn as_str(self) -> &'static str {
        match self {
            MemberKind::Field => "field",
            MemberKind::Property => "property",
            MemberKind::Method => "method",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared visibility of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Visible everywhere
    #[default]
    Public,
    /// Visible to the declaring type and its subtypes
    Protected,
    /// Visible to the declaring type only
    Private,
}

impl Visibility {
    /// Whether this is `Public`
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }

    /// Whether a subtype inherits members of this visibility
    pub fn is_inherited(self) -> bool {
        !matches!(self, Visibility::Private)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scope() {
        let scope = BindingScope::default();
        assert!(scope.contains(BindingScope::INSTANCE));
        assert!(scope.contains(BindingScope::PUBLIC));
        assert!(!scope.contains(BindingScope::STATIC));
        assert!(scope.is_valid());
    }

    #[test]
    fn test_scope_validity() {
        assert!(!BindingScope::empty().is_valid());
        assert!(!BindingScope::STATIC.is_valid());
        assert!(!BindingScope::PUBLIC.is_valid());
        assert!(!(BindingScope::IGNORE_CASE | BindingScope::INSTANCE).is_valid());
        assert!(BindingScope::EVERYTHING.is_valid());
        assert!(BindingScope::PUBLIC_STATIC.is_valid());
    }

    #[test]
    fn test_scope_admits() {
        let scope = BindingScope::NON_PUBLIC_INSTANCE;
        assert!(scope.admits(false, Visibility::Private));
        assert!(scope.admits(false, Visibility::Protected));
        assert!(!scope.admits(false, Visibility::Public));
        assert!(!scope.admits(true, Visibility::Private));

        assert!(BindingScope::EVERYTHING.admits(true, Visibility::Public));
        assert!(BindingScope::EVERYTHING.admits(false, Visibility::Private));
    }

    #[test]
    fn test_name_matching() {
        let exact = BindingScope::default();
        assert!(exact.name_matches("Total", "Total"));
        assert!(!exact.name_matches("Total", "total"));

        let loose = exact | BindingScope::IGNORE_CASE;
        assert!(loose.name_matches("Total", "total"));
        assert!(!loose.name_matches("Total", "totals"));
    }

    #[test]
    fn test_visibility_inheritance() {
        assert!(Visibility::Public.is_inherited());
        assert!(Visibility::Protected.is_inherited());
        assert!(!Visibility::Private.is_inherited());
    }
}
