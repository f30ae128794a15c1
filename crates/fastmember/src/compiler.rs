//! Accessor compiler
//!
//! Turns a member descriptor into a [`CompiledAccessor`]: a getter/setter
//! pair for fields and properties, or an invoker for methods. The member
//! kind is dispatched once, here; each closure captures the slot index or
//! host function, the declared types and the declaring type, so a call does
//! no name lookup and no metadata inspection.
//!
//! ## Receivers
//!
//! Static members never look at the receiver. Instance members require one
//! whose type is the declaring type or a subtype of it.
//!
//! ## Visibility
//!
//! Not checked here. Scope filtering happens at lookup time.

use std::fmt;
use std::sync::Arc;

use crate::descriptor::{FieldStorage, MemberBody, MemberDescriptor, Receiver};
use crate::error::{AccessError, AccessResult};
use crate::registry::{Instance, TypeHandle};
use crate::value::{ReturnValue, Value};

/// Compiled read function
pub type Getter = Box<dyn Fn(Receiver<'_>) -> AccessResult<Value> + Send + Sync>;

/// Compiled write function
pub type Setter = Box<dyn Fn(Receiver<'_>, Value) -> AccessResult<()> + Send + Sync>;

/// Compiled call function
pub type Invoker = Box<dyn Fn(Receiver<'_>, &[Value]) -> AccessResult<ReturnValue> + Send + Sync>;

/// Prebuilt access path for one member
pub enum CompiledAccessor {
    /// Field or property; either half may be missing
    Value {
        /// Member name, for diagnostics
        member: Arc<str>,
        /// Present unless the property is write-only
        getter: Option<Getter>,
        /// Present unless the member is read-only
        setter: Option<Setter>,
    },
    /// Method with a fixed parameter count
    Invoker {
        /// Member name, for diagnostics
        member: Arc<str>,
        /// Declared parameter count
        arity: usize,
        /// Call function
        invoke: Invoker,
    },
}

impl CompiledAccessor {
    /// Read the member
    pub fn get(&self, receiver: Receiver<'_>) -> AccessResult<Value> {
        match self {
            CompiledAccessor::Value {
                getter: Some(getter),
                ..
            } => getter(receiver),
            _ => Err(AccessError::not_supported("get", self.member())),
        }
    }

    /// Write the member. The value must already have the declared type.
    pub fn set(&self, receiver: Receiver<'_>, value: Value) -> AccessResult<()> {
        match self {
            CompiledAccessor::Value {
                setter: Some(setter),
                ..
            } => setter(receiver, value),
            _ => Err(AccessError::not_supported("set", self.member())),
        }
    }

    /// Call the method
    pub fn invoke(&self, receiver: Receiver<'_>, args: &[Value]) -> AccessResult<ReturnValue> {
        match self {
            CompiledAccessor::Invoker { invoke, .. } => invoke(receiver, args),
            CompiledAccessor::Value { .. } => Err(AccessError::not_supported("invoke", self.member())),
        }
    }

    /// Name of the member this accessor was compiled from
    pub fn member(&self) -> &str {
        match self {
            CompiledAccessor::Value { member, .. } | CompiledAccessor::Invoker { member, .. } => {
                member
            }
        }
    }

    /// Whether `get` is supported
    pub fn can_read(&self) -> bool {
        matches!(self, CompiledAccessor::Value { getter: Some(_), .. })
    }

    /// Whether `set` is supported
    pub fn can_write(&self) -> bool {
        matches!(self, CompiledAccessor::Value { setter: Some(_), .. })
    }

    /// Parameter count for invokers
    pub fn arity(&self) -> Option<usize> {
        match self {
            CompiledAccessor::Invoker { arity, .. } => Some(*arity),
            CompiledAccessor::Value { .. } => None,
        }
    }
}

impl fmt::Debug for CompiledAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompiledAccessor::Value { member, .. } => f
                .debug_struct("Value")
                .field("member", member)
                .field("can_read", &self.can_read())
                .field("can_write", &self.can_write())
                .finish(),
            CompiledAccessor::Invoker { member, arity, .. } => f
                .debug_struct("Invoker")
                .field("member", member)
                .field("arity", arity)
                .finish(),
        }
    }
}

/// Builds accessors from descriptors
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessorCompiler;

impl AccessorCompiler {
    /// Create a compiler
    pub fn new() -> Self {
        Self
    }

    /// Compile a descriptor. Never fails; shape errors surface when the
    /// accessor is called.
    pub fn compile(&self, descriptor: &MemberDescriptor) -> CompiledAccessor {
        let info = descriptor.info();
        let member: Arc<str> = Arc::from(info.name());
        let binding = Binding {
            declaring: descriptor.declaring_type().clone(),
            member: member.clone(),
            is_static: info.is_static(),
        };

        tracing::trace!(
            ty = binding.declaring.name(),
            member = %member,
            kind = %descriptor.kind(),
            is_static = binding.is_static,
            "compiling accessor"
        );

        match &info.body {
            MemberBody::Field {
                ty,
                storage,
                readonly,
            } => {
                let getter = field_getter(binding.clone(), storage.clone());
                let setter = (!readonly).then(|| {
                    let ty = ty.clone();
                    let write = field_setter(binding, storage.clone());
                    Box::new(move |recv: Receiver<'_>, value: Value| -> AccessResult<()> {
                        ty.check(&value)?;
                        write(recv, value)
                    }) as Setter
                });
                CompiledAccessor::Value {
                    member,
                    getter: Some(getter),
                    setter,
                }
            }
            MemberBody::Property { ty, getter, setter } => {
                let getter = getter.clone().map(|read| {
                    let binding = binding.clone();
                    Box::new(move |recv: Receiver<'_>| -> AccessResult<Value> {
                        read(binding.bind(recv)?)
                    }) as Getter
                });
                let setter = setter.clone().map(|write| {
                    let ty = ty.clone();
                    Box::new(move |recv: Receiver<'_>, value: Value| -> AccessResult<()> {
                        ty.check(&value)?;
                        write(binding.bind(recv)?, value)
                    }) as Setter
                });
                CompiledAccessor::Value {
                    member,
                    getter,
                    setter,
                }
            }
            MemberBody::Method {
                params,
                returns,
                body,
            } => {
                let params: Vec<_> = params.iter().map(|p| p.ty.clone()).collect();
                let arity = params.len();
                let returns = returns.clone();
                let body = body.clone();
                let invoke = Box::new(move |recv: Receiver<'_>, args: &[Value]| -> AccessResult<ReturnValue> {
                    if args.len() != arity {
                        return Err(AccessError::ArityMismatch {
                            member: binding.member.to_string(),
                            expected: arity,
                            got: args.len(),
                        });
                    }
                    for (ty, arg) in params.iter().zip(args) {
                        ty.check(arg)?;
                    }
                    let result = body(binding.bind(recv)?, args)?;
                    match &returns {
                        None => Ok(ReturnValue::NoValue),
                        Some(ty) => {
                            ty.check(&result)?;
                            Ok(ReturnValue::Value(result))
                        }
                    }
                }) as Invoker;
                CompiledAccessor::Invoker {
                    member,
                    arity,
                    invoke,
                }
            }
        }
    }
}

/// What a compiled closure needs to resolve its receiver
#[derive(Clone)]
struct Binding {
    declaring: TypeHandle,
    member: Arc<str>,
    is_static: bool,
}

impl Binding {
    /// `None` for statics, whatever was passed in; otherwise a receiver of
    /// the declaring type (or a subtype)
    fn bind<'a>(&self, recv: Receiver<'a>) -> AccessResult<Receiver<'a>> {
        if self.is_static {
            return Ok(None);
        }
        self.instance(recv).map(Some)
    }

    fn instance<'a>(&self, recv: Receiver<'a>) -> AccessResult<&'a Instance> {
        let instance = recv.ok_or_else(|| AccessError::MissingReceiver {
            member: self.member.to_string(),
        })?;
        if instance.type_handle().is_subtype_of(&self.declaring) {
            Ok(instance)
        } else {
            Err(AccessError::mismatch(
                self.declaring.name(),
                instance.type_handle().name(),
            ))
        }
    }
}

fn field_getter(binding: Binding, storage: FieldStorage) -> Getter {
    match storage {
        FieldStorage::Static(statics, index) => {
            Box::new(move |_: Receiver<'_>| statics.get(index))
        }
        FieldStorage::Instance(index) => {
            Box::new(move |recv: Receiver<'_>| -> AccessResult<Value> {
                binding.instance(recv)?.get_slot(index)
            })
        }
    }
}

fn field_setter(binding: Binding, storage: FieldStorage) -> Setter {
    match storage {
        FieldStorage::Static(statics, index) => {
            Box::new(move |_: Receiver<'_>, value: Value| statics.set(index, value))
        }
        FieldStorage::Instance(index) => {
            Box::new(move |recv: Receiver<'_>, value: Value| -> AccessResult<()> {
                binding.instance(recv)?.set_slot(index, value)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FieldDef, MethodDef, PropertyDef, TypeRegistry};
    use crate::scope::{BindingScope, MemberKind};
    use crate::source::MemberSource;
    use crate::value::ValueType;

    fn find(registry: &TypeRegistry, ty: &TypeHandle, kind: MemberKind, name: &str) -> CompiledAccessor {
        let descriptor = registry
            .raw_find(ty, kind, name, BindingScope::EVERYTHING)
            .unwrap()
            .unwrap();
        AccessorCompiler::new().compile(&descriptor)
    }

    fn counter_type(registry: &TypeRegistry) -> TypeHandle {
        registry
            .define("Counter")
            .field(FieldDef::new("count", ValueType::Int))
            .field(FieldDef::new("label", ValueType::Str).as_readonly())
            .field(FieldDef::new("created", ValueType::Int).as_static())
            .property(
                PropertyDef::computed("Doubled", ValueType::Int).getter(|recv| {
                    let count = recv.unwrap().get_slot(0)?;
                    Ok(Value::Int(count.as_int().unwrap_or(0) * 2))
                }),
            )
            .property(
                PropertyDef::computed("Sink", ValueType::Int).setter(|recv, value| {
                    recv.unwrap().set_slot(0, value)
                }),
            )
            .method(
                MethodDef::new("Add", |recv, args| {
                    let obj = recv.unwrap();
                    let current = obj.get_slot(0)?.as_int().unwrap_or(0);
                    let next = current + args[0].as_int().unwrap_or(0);
                    obj.set_slot(0, Value::Int(next))?;
                    Ok(Value::Int(next))
                })
                .param("amount", ValueType::Int)
                .returns(ValueType::Int),
            )
            .method(MethodDef::new("Reset", |recv, _| {
                recv.unwrap().set_slot(0, Value::Int(0))?;
                Ok(Value::Null)
            }))
            .method(
                MethodDef::new("Describe", |_, args| Ok(Value::from(format!("n={}", args[0].as_int().unwrap_or(0)))))
                    .param("n", ValueType::Int)
                    .returns(ValueType::Str)
                    .as_static(),
            )
            .method(MethodDef::new("Nothing", |_, _| Ok(Value::Null)).returns(ValueType::Str))
            .build(registry)
            .unwrap()
    }

    #[test]
    fn test_field_round_trip() {
        let registry = TypeRegistry::new();
        let ty = counter_type(&registry);
        let obj = registry.instantiate(&ty).unwrap();
        let count = find(&registry, &ty, MemberKind::Field, "count");

        assert_eq!(count.get(Some(&obj)).unwrap(), Value::Int(0));
        count.set(Some(&obj), Value::Int(42)).unwrap();
        assert_eq!(count.get(Some(&obj)).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_set_does_not_coerce() {
        let registry = TypeRegistry::new();
        let ty = counter_type(&registry);
        let obj = registry.instantiate(&ty).unwrap();
        let count = find(&registry, &ty, MemberKind::Field, "count");

        let err = count.set(Some(&obj), Value::Float(1.0)).unwrap_err();
        assert_eq!(err, AccessError::mismatch("int", "float"));
        assert_eq!(count.get(Some(&obj)).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_readonly_field_has_no_setter() {
        let registry = TypeRegistry::new();
        let ty = counter_type(&registry);
        let obj = registry.instantiate(&ty).unwrap();
        let label = find(&registry, &ty, MemberKind::Field, "label");

        assert!(label.can_read());
        assert!(!label.can_write());
        assert!(matches!(
            label.set(Some(&obj), Value::str("x")),
            Err(AccessError::NotSupported { operation: "set", .. })
        ));
    }

    #[test]
    fn test_static_field_ignores_receiver() {
        let registry = TypeRegistry::new();
        let ty = counter_type(&registry);
        let a = registry.instantiate(&ty).unwrap();
        let b = registry.instantiate(&ty).unwrap();
        let created = find(&registry, &ty, MemberKind::Field, "created");

        created.set(Some(&a), Value::Int(7)).unwrap();
        assert_eq!(created.get(Some(&b)).unwrap(), Value::Int(7));
        assert_eq!(created.get(None).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_instance_member_needs_receiver() {
        let registry = TypeRegistry::new();
        let ty = counter_type(&registry);
        let count = find(&registry, &ty, MemberKind::Field, "count");

        assert_eq!(
            count.get(None).unwrap_err(),
            AccessError::MissingReceiver {
                member: "count".to_string()
            }
        );
    }

    #[test]
    fn test_receiver_of_wrong_type() {
        let registry = TypeRegistry::new();
        let ty = counter_type(&registry);
        let other = registry
            .define("Other")
            .field(FieldDef::new("count", ValueType::Int))
            .build(&registry)
            .unwrap();
        let stranger = registry.instantiate(&other).unwrap();
        let count = find(&registry, &ty, MemberKind::Field, "count");

        assert_eq!(
            count.get(Some(&stranger)).unwrap_err(),
            AccessError::mismatch("Counter", "Other")
        );
    }

    #[test]
    fn test_write_only_and_read_only_properties() {
        let registry = TypeRegistry::new();
        let ty = counter_type(&registry);
        let obj = registry.instantiate(&ty).unwrap();
        let doubled = find(&registry, &ty, MemberKind::Property, "Doubled");
        let sink = find(&registry, &ty, MemberKind::Property, "Sink");

        sink.set(Some(&obj), Value::Int(21)).unwrap();
        assert_eq!(doubled.get(Some(&obj)).unwrap(), Value::Int(42));

        assert!(matches!(
            sink.get(Some(&obj)),
            Err(AccessError::NotSupported { operation: "get", .. })
        ));
        assert!(matches!(
            doubled.set(Some(&obj), Value::Int(1)),
            Err(AccessError::NotSupported { operation: "set", .. })
        ));
    }

    #[test]
    fn test_invoke_checks_arity_and_types() {
        let registry = TypeRegistry::new();
        let ty = counter_type(&registry);
        let obj = registry.instantiate(&ty).unwrap();
        let add = find(&registry, &ty, MemberKind::Method, "Add");

        assert_eq!(add.arity(), Some(1));
        assert_eq!(
            add.invoke(Some(&obj), &[Value::Int(5)]).unwrap(),
            ReturnValue::Value(Value::Int(5))
        );
        assert!(matches!(
            add.invoke(Some(&obj), &[]),
            Err(AccessError::ArityMismatch { expected: 1, got: 0, .. })
        ));
        assert_eq!(
            add.invoke(Some(&obj), &[Value::str("5")]).unwrap_err(),
            AccessError::mismatch("int", "string")
        );
    }

    #[test]
    fn test_void_method_yields_no_value() {
        let registry = TypeRegistry::new();
        let ty = counter_type(&registry);
        let obj = registry.instantiate(&ty).unwrap();
        let reset = find(&registry, &ty, MemberKind::Method, "Reset");
        let nothing = find(&registry, &ty, MemberKind::Method, "Nothing");

        assert_eq!(reset.invoke(Some(&obj), &[]).unwrap(), ReturnValue::NoValue);
        assert_eq!(
            nothing.invoke(Some(&obj), &[]).unwrap(),
            ReturnValue::Value(Value::Null)
        );
    }

    #[test]
    fn test_static_method_without_receiver() {
        let registry = TypeRegistry::new();
        let ty = counter_type(&registry);
        let describe = find(&registry, &ty, MemberKind::Method, "Describe");

        assert_eq!(
            describe.invoke(None, &[Value::Int(3)]).unwrap(),
            ReturnValue::Value(Value::str("n=3"))
        );
    }

    #[test]
    fn test_static_method_ignores_receiver() {
        let registry = TypeRegistry::new();
        let ty = counter_type(&registry);
        let other = registry
            .define("Other")
            .method(
                MethodDef::new("Unbound", |recv, _| Ok(Value::Bool(recv.is_none())))
                    .returns(ValueType::Bool)
                    .as_static(),
            )
            .build(&registry)
            .unwrap();
        let obj = registry.instantiate(&ty).unwrap();
        let stranger = registry.instantiate(&other).unwrap();

        let describe = find(&registry, &ty, MemberKind::Method, "Describe");
        let expected = describe.invoke(None, &[Value::Int(5)]).unwrap();
        assert_eq!(describe.invoke(Some(&obj), &[Value::Int(5)]).unwrap(), expected);
        assert_eq!(describe.invoke(Some(&stranger), &[Value::Int(5)]).unwrap(), expected);

        // The body never sees the receiver
        let unbound = find(&registry, &other, MemberKind::Method, "Unbound");
        for recv in [None, Some(&obj), Some(&stranger)] {
            assert_eq!(unbound.invoke(recv, &[]).unwrap(), ReturnValue::Value(Value::Bool(true)));
        }
    }

    #[test]
    fn test_method_accessor_rejects_get_and_set() {
        let registry = TypeRegistry::new();
        let ty = counter_type(&registry);
        let obj = registry.instantiate(&ty).unwrap();
        let add = find(&registry, &ty, MemberKind::Method, "Add");
        let count = find(&registry, &ty, MemberKind::Field, "count");

        assert!(matches!(add.get(Some(&obj)), Err(AccessError::NotSupported { .. })));
        assert!(matches!(
            count.invoke(Some(&obj), &[]),
            Err(AccessError::NotSupported { operation: "invoke", .. })
        ));
    }
}
