//! Member metadata and descriptors
//!
//! A `MemberInfo` records everything needed to access one declared member:
//! its name, visibility, ownership, declared type and the storage or host
//! functions behind it. A `MemberDescriptor` pairs that record with the
//! type that declares it and is what lookups return and accessors are
//! compiled from.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::AccessResult;
use crate::registry::{Instance, StaticStorage, TypeHandle};
use crate::scope::{MemberKind, Visibility};
use crate::value::{Value, ValueType};

/// Receiver passed to accessors: `None` for statics (or a missing instance)
pub type Receiver<'a> = Option<&'a Instance>;

/// Host function reading a property
pub type PropertyGetterFn = Arc<dyn Fn(Receiver<'_>) -> AccessResult<Value> + Send + Sync>;

/// Host function writing a property
pub type PropertySetterFn = Arc<dyn Fn(Receiver<'_>, Value) -> AccessResult<()> + Send + Sync>;

/// Host function implementing a method body
pub type MethodFn = Arc<dyn Fn(Receiver<'_>, &[Value]) -> AccessResult<Value> + Send + Sync>;

/// Where a field's value lives
#[derive(Clone)]
pub(crate) enum FieldStorage {
    /// Slot index inside each instance
    Instance(usize),
    /// Slot index inside the declaring type's static storage
    Static(StaticStorage, usize),
}

#[derive(Clone)]
pub(crate) enum MemberBody {
    Field {
        ty: ValueType,
        storage: FieldStorage,
        readonly: bool,
    },
    Property {
        ty: ValueType,
        getter: Option<PropertyGetterFn>,
        setter: Option<PropertySetterFn>,
    },
    Method {
        params: Vec<ParameterInfo>,
        returns: Option<ValueType>,
        body: MethodFn,
    },
}

/// Parameter of a method
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    /// Parameter name
    pub name: String,
    /// Declared parameter type
    pub ty: ValueType,
}

/// Metadata for one declared member
#[derive(Clone)]
pub struct MemberInfo {
    name: String,
    visibility: Visibility,
    is_static: bool,
    pub(crate) body: MemberBody,
}

impl MemberInfo {
    pub(crate) fn new(name: String, visibility: Visibility, is_static: bool, body: MemberBody) -> Self {
        Self {
            name,
            visibility,
            is_static,
            body,
        }
    }

    /// Member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member kind, derived from its body
    pub fn kind(&self) -> MemberKind {
        match self.body {
            MemberBody::Field { .. } => MemberKind::Field,
            MemberBody::Property { .. } => MemberKind::Property,
            MemberBody::Method { .. } => MemberKind::Method,
        }
    }

    /// Declared visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the member is static
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Field/property type, or method return type (`None` for void)
    pub fn value_type(&self) -> Option<&ValueType> {
        match &self.body {
            MemberBody::Field { ty, .. } | MemberBody::Property { ty, .. } => Some(ty),
            MemberBody::Method { returns, .. } => returns.as_ref(),
        }
    }

    /// Whether a getter can be compiled
    pub fn is_readable(&self) -> bool {
        match &self.body {
            MemberBody::Field { .. } => true,
            MemberBody::Property { getter, .. } => getter.is_some(),
            MemberBody::Method { .. } => false,
        }
    }

    /// Whether a setter can be compiled
    pub fn is_writable(&self) -> bool {
        match &self.body {
            MemberBody::Field { readonly, .. } => !readonly,
            MemberBody::Property { setter, .. } => setter.is_some(),
            MemberBody::Method { .. } => false,
        }
    }

    /// Method parameters (empty for fields and properties)
    pub fn parameters(&self) -> &[ParameterInfo] {
        match &self.body {
            MemberBody::Method { params, .. } => params,
            _ => &[],
        }
    }

    /// Whether the parameter types equal `types` position by position
    pub fn has_signature(&self, types: &[ValueType]) -> bool {
        let params = self.parameters();
        params.len() == types.len() && params.iter().zip(types).all(|(p, t)| &p.ty == t)
    }
}

impl fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberInfo")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("value_type", &self.value_type())
            .field("parameters", &self.parameters())
            .finish()
    }
}

/// Handle identifying one member of one type.
///
/// Equality and hashing use the declaring type, the member kind and the
/// declaration index, so two descriptors for the same member compare equal
/// no matter how often (or through which subtype) they were looked up.
#[derive(Clone)]
pub struct MemberDescriptor {
    declaring: TypeHandle,
    kind: MemberKind,
    index: usize,
    info: Arc<MemberInfo>,
}

impl MemberDescriptor {
    pub(crate) fn new(declaring: TypeHandle, index: usize, info: Arc<MemberInfo>) -> Self {
        Self {
            declaring,
            kind: info.kind(),
            index,
            info,
        }
    }

    /// Type that declares the member
    pub fn declaring_type(&self) -> &TypeHandle {
        &self.declaring
    }

    /// Member kind
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Position among the declaring type's members of this kind
    pub fn index(&self) -> usize {
        self.index
    }

    /// Member name
    pub fn name(&self) -> &str {
        self.info.name()
    }

    /// Full member metadata
    pub fn info(&self) -> &MemberInfo {
        &self.info
    }
}

impl PartialEq for MemberDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.index == other.index && self.declaring == other.declaring
    }
}

impl Eq for MemberDescriptor {}

impl Hash for MemberDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.declaring.hash(state);
        self.kind.hash(state);
        self.index.hash(state);
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MemberDescriptor({} {}.{})",
            self.kind,
            self.declaring.name(),
            self.info.name()
        )
    }
}

impl fmt::Display for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring.name(), self.info.name())
    }
}
