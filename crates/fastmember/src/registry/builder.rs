//! Type declaration builder
//!
//! ```ignore
//! let point = registry
//!     .define("Point")
//!     .field(FieldDef::new("x", ValueType::Int).private())
//!     .property(PropertyDef::auto("Y", ValueType::Int))
//!     .method(
//!         MethodDef::new("Scale", |recv, args| { /* ... */ })
//!             .param("factor", ValueType::Int)
//!             .returns(ValueType::Int),
//!     )
//!     .build(&registry)?;
//! ```

use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::{Instance, StaticStorage, TypeDef, TypeHandle, TypeRegistry};
use crate::descriptor::{
    FieldStorage, MemberBody, MemberInfo, MethodFn, ParameterInfo, PropertyGetterFn,
    PropertySetterFn, Receiver,
};
use crate::error::{AccessError, AccessResult};
use crate::scope::Visibility;
use crate::value::{Value, ValueType};

/// Definition for a stored field
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    ty: ValueType,
    visibility: Visibility,
    is_static: bool,
    is_readonly: bool,
    initial_value: Option<Value>,
}

impl FieldDef {
    /// Public instance field starting at the type's zero value
    pub fn new(name: &str, ty: ValueType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            visibility: Visibility::Public,
            is_static: false,
            is_readonly: false,
            initial_value: None,
        }
    }

    /// Set the visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as private
    pub fn private(self) -> Self {
        self.visibility(Visibility::Private)
    }

    /// Mark as protected
    pub fn protected(self) -> Self {
        self.visibility(Visibility::Protected)
    }

    /// Mark as static field
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as readonly (no setter is compiled)
    pub fn as_readonly(mut self) -> Self {
        self.is_readonly = true;
        self
    }

    /// Set the initial value
    pub fn initial_value(mut self, value: Value) -> Self {
        self.initial_value = Some(value);
        self
    }
}

enum PropertyImpl {
    /// Backed by a hidden slot
    Auto {
        readonly: bool,
        initial_value: Option<Value>,
    },
    /// Backed by host functions
    Computed {
        getter: Option<PropertyGetterFn>,
        setter: Option<PropertySetterFn>,
    },
}

/// Definition for a property
pub struct PropertyDef {
    name: String,
    ty: ValueType,
    visibility: Visibility,
    is_static: bool,
    imp: PropertyImpl,
}

impl PropertyDef {
    /// Read-write property backed by a hidden slot
    pub fn auto(name: &str, ty: ValueType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            visibility: Visibility::Public,
            is_static: false,
            imp: PropertyImpl::Auto {
                readonly: false,
                initial_value: None,
            },
        }
    }

    /// Property backed by host functions; add them with `getter`/`setter`
    pub fn computed(name: &str, ty: ValueType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            visibility: Visibility::Public,
            is_static: false,
            imp: PropertyImpl::Computed {
                getter: None,
                setter: None,
            },
        }
    }

    /// Attach a getter to a computed property
    pub fn getter(
        mut self,
        f: impl Fn(Receiver<'_>) -> AccessResult<Value> + Send + Sync + 'static,
    ) -> Self {
        if let PropertyImpl::Computed { getter, .. } = &mut self.imp {
            *getter = Some(Arc::new(f));
        }
        self
    }

    /// Attach a setter to a computed property
    pub fn setter(
        mut self,
        f: impl Fn(Receiver<'_>, Value) -> AccessResult<()> + Send + Sync + 'static,
    ) -> Self {
        if let PropertyImpl::Computed { setter, .. } = &mut self.imp {
            *setter = Some(Arc::new(f));
        }
        self
    }

    /// Drop the setter of an auto property
    pub fn read_only(mut self) -> Self {
        if let PropertyImpl::Auto { readonly, .. } = &mut self.imp {
            *readonly = true;
        }
        self
    }

    /// Initial value of an auto property's slot
    pub fn initial_value(mut self, value: Value) -> Self {
        if let PropertyImpl::Auto { initial_value, .. } = &mut self.imp {
            *initial_value = Some(value);
        }
        self
    }

    /// Set the visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as private
    pub fn private(self) -> Self {
        self.visibility(Visibility::Private)
    }

    /// Mark as protected
    pub fn protected(self) -> Self {
        self.visibility(Visibility::Protected)
    }

    /// Mark as static property
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// Definition for a method
pub struct MethodDef {
    name: String,
    visibility: Visibility,
    is_static: bool,
    params: Vec<ParameterInfo>,
    returns: Option<ValueType>,
    body: MethodFn,
}

impl MethodDef {
    /// Public, void, parameterless instance method
    ///
    /// The body receives the bound receiver (`None` for statics) and the
    /// already type-checked arguments. For void methods its return value is
    /// discarded.
    pub fn new(
        name: &str,
        body: impl Fn(Receiver<'_>, &[Value]) -> AccessResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            visibility: Visibility::Public,
            is_static: false,
            params: Vec::new(),
            returns: None,
            body: Arc::new(body),
        }
    }

    /// Add a parameter
    pub fn param(mut self, name: &str, ty: ValueType) -> Self {
        self.params.push(ParameterInfo {
            name: name.to_string(),
            ty,
        });
        self
    }

    /// Set the return type (methods are void until this is called)
    pub fn returns(mut self, ty: ValueType) -> Self {
        self.returns = Some(ty);
        self
    }

    /// Set the visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as private
    pub fn private(self) -> Self {
        self.visibility(Visibility::Private)
    }

    /// Mark as protected
    pub fn protected(self) -> Self {
        self.visibility(Visibility::Protected)
    }

    /// Mark as static method
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    fn param_types(&self) -> Vec<ValueType> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }
}

/// Builder for a registered type
pub struct TypeBuilder {
    name: String,
    parent: Option<TypeHandle>,
    fields: Vec<FieldDef>,
    properties: Vec<PropertyDef>,
    methods: Vec<MethodDef>,
}

impl TypeBuilder {
    /// Start a type with no parent and no members
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Derive from a previously registered type
    pub fn extends(mut self, parent: &TypeHandle) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Add a field
    pub fn field(mut self, def: FieldDef) -> Self {
        self.fields.push(def);
        self
    }

    /// Add a property
    pub fn property(mut self, def: PropertyDef) -> Self {
        self.properties.push(def);
        self
    }

    /// Add a method
    pub fn method(mut self, def: MethodDef) -> Self {
        self.methods.push(def);
        self
    }

    /// Lay out slots, freeze the members and register the type
    pub fn build(self, registry: &TypeRegistry) -> AccessResult<TypeHandle> {
        if let Some(parent) = &self.parent {
            registry.ensure_owned(parent)?;
        }
        self.check_duplicates()?;

        let mut layout = SlotLayout {
            instance_defaults: self
                .parent
                .as_ref()
                .map(|p| p.instance_defaults().to_vec())
                .unwrap_or_default(),
            statics: StaticStorage::new(),
        };

        let mut fields = Vec::with_capacity(self.fields.len());
        for def in self.fields {
            let initial = initial_slot_value(&def.ty, def.initial_value)?;
            let storage = layout.allocate(def.is_static, initial);
            let body = MemberBody::Field {
                ty: def.ty,
                storage,
                readonly: def.is_readonly,
            };
            fields.push(Arc::new(MemberInfo::new(
                def.name,
                def.visibility,
                def.is_static,
                body,
            )));
        }

        let mut properties = Vec::with_capacity(self.properties.len());
        for def in self.properties {
            let body = match def.imp {
                PropertyImpl::Auto {
                    readonly,
                    initial_value,
                } => {
                    let initial = initial_slot_value(&def.ty, initial_value)?;
                    let storage = layout.allocate(def.is_static, initial);
                    let (getter, setter) = auto_accessors(&def.name, storage);
                    MemberBody::Property {
                        ty: def.ty,
                        getter: Some(getter),
                        setter: (!readonly).then_some(setter),
                    }
                }
                PropertyImpl::Computed { getter, setter } => MemberBody::Property {
                    ty: def.ty,
                    getter,
                    setter,
                },
            };
            properties.push(Arc::new(MemberInfo::new(
                def.name,
                def.visibility,
                def.is_static,
                body,
            )));
        }

        let methods = self
            .methods
            .into_iter()
            .map(|def| {
                let body = MemberBody::Method {
                    params: def.params,
                    returns: def.returns,
                    body: def.body,
                };
                Arc::new(MemberInfo::new(def.name, def.visibility, def.is_static, body))
            })
            .collect();

        registry.insert(TypeDef {
            registry_id: registry.id(),
            name: self.name,
            parent: self.parent,
            fields,
            properties,
            methods,
            instance_defaults: layout.instance_defaults,
            statics: layout.statics,
        })
    }

    /// Fields and properties share one namespace; methods may overload by
    /// parameter types but not collide with a field or property.
    fn check_duplicates(&self) -> AccessResult<()> {
        let duplicate = |name: &str| AccessError::DuplicateMember {
            type_name: self.name.clone(),
            name: name.to_string(),
        };

        let mut values = FxHashSet::default();
        let value_names = self
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.properties.iter().map(|p| p.name.as_str()));
        for name in value_names {
            if !values.insert(name) {
                return Err(duplicate(name));
            }
        }

        let mut signatures = FxHashSet::default();
        for method in &self.methods {
            if values.contains(method.name.as_str()) {
                return Err(duplicate(&method.name));
            }
            if !signatures.insert((method.name.as_str(), method.param_types())) {
                return Err(duplicate(&method.name));
            }
        }
        Ok(())
    }
}

struct SlotLayout {
    instance_defaults: Vec<Value>,
    statics: StaticStorage,
}

impl SlotLayout {
    fn allocate(&mut self, is_static: bool, initial: Value) -> FieldStorage {
        if is_static {
            let index = self.statics.push(initial);
            FieldStorage::Static(self.statics.clone(), index)
        } else {
            self.instance_defaults.push(initial);
            FieldStorage::Instance(self.instance_defaults.len() - 1)
        }
    }
}

fn initial_slot_value(ty: &ValueType, initial: Option<Value>) -> AccessResult<Value> {
    match initial {
        Some(value) => {
            ty.check(&value)?;
            Ok(value)
        }
        None => Ok(ty.zero_value()),
    }
}

/// Getter and setter reading an auto property's hidden slot
fn auto_accessors(name: &str, storage: FieldStorage) -> (PropertyGetterFn, PropertySetterFn) {
    match storage {
        FieldStorage::Static(statics, index) => {
            let writer = statics.clone();
            (
                Arc::new(move |_: Receiver<'_>| statics.get(index)),
                Arc::new(move |_: Receiver<'_>, value: Value| writer.set(index, value)),
            )
        }
        FieldStorage::Instance(index) => {
            let getter_name = name.to_string();
            let setter_name = name.to_string();
            (
                Arc::new(move |recv: Receiver<'_>| -> AccessResult<Value> {
                    bound(recv, &getter_name)?.get_slot(index)
                }),
                Arc::new(move |recv: Receiver<'_>, value: Value| -> AccessResult<()> {
                    bound(recv, &setter_name)?.set_slot(index, value)
                }),
            )
        }
    }
}

fn bound<'a>(recv: Receiver<'a>, member: &str) -> AccessResult<&'a Instance> {
    recv.ok_or_else(|| AccessError::MissingReceiver {
        member: member.to_string(),
    })
}
