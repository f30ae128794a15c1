//! Fastmember - cached member lookup and compiled accessors
//!
//! This crate makes repeated by-name member access cheap:
//! - **Registry**: types, fields, properties and methods declared at runtime (`registry` module)
//! - **Lookup cache**: memoized member queries, including "not found" (`lookup` module)
//! - **Compiler**: descriptor to getter/setter/invoker closures (`compiler` module)
//! - **Accessor cache**: one compiled accessor per member (`accessor_cache` module)
//! - **Facade**: both caches behind one API (`fast` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fastmember::{BindingScope, FastReflection, FieldDef, TypeRegistry, Value, ValueType};
//!
//! let registry = Arc::new(TypeRegistry::new());
//! let point = registry
//!     .define("Point")
//!     .field(FieldDef::new("x", ValueType::Int).private())
//!     .build(&registry)?;
//!
//! let fast = FastReflection::new(registry.clone());
//! let x = fast.field(&point, "x", BindingScope::NON_PUBLIC_INSTANCE)?.unwrap();
//!
//! let obj = registry.instantiate(&point)?;
//! fast.set_value(&x, Some(&obj), Value::Int(42))?;
//! assert_eq!(fast.get_value(&x, Some(&obj))?, Value::Int(42));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Data Model
// ============================================================================

pub mod descriptor;
pub mod error;
pub mod scope;
pub mod value;

/// Bundled member source: runtime type declarations and instances
pub mod registry;

/// Source trait the lookup cache sits in front of
pub mod source;

// ============================================================================
// Caching
// ============================================================================

pub mod accessor_cache;
pub mod compiler;
pub mod lookup;
pub mod memo;
pub mod options;
pub mod stats;

/// Convenience facade over both caches
pub mod fast;

// ============================================================================
// Re-exports
// ============================================================================

pub use accessor_cache::AccessorCache;
pub use compiler::{AccessorCompiler, CompiledAccessor};
pub use descriptor::{MemberDescriptor, MemberInfo, ParameterInfo, Receiver};
pub use error::{AccessError, AccessResult};
pub use fast::{FastReflection, FastReflectionStats};
pub use lookup::{ListKey, LookupCache, LookupKey};
pub use memo::Memo;
pub use options::{CacheOptions, DEFAULT_ACCESSOR_CAPACITY, DEFAULT_LOOKUP_CAPACITY};
pub use registry::{
    FieldDef, Instance, MethodDef, PropertyDef, StaticStorage, TypeBuilder, TypeHandle,
    TypeRegistry,
};
pub use scope::{BindingScope, MemberKind, Visibility};
pub use source::MemberSource;
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use value::{ReturnValue, Value, ValueType};
