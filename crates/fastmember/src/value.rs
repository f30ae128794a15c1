//! Dynamic values read from and written to members
//!
//! `Value` is what getters return and setters accept. `ValueType` is the
//! declared shape of a field, property, parameter or return value; checks
//! against it never coerce.
//!
//! | ValueType  | Accepts                        | Zero value  |
//! |------------|--------------------------------|-------------|
//! | `Any`      | everything                     | `Null`      |
//! | `Bool`     | `Bool`                         | `false`     |
//! | `Int`      | `Int`                          | `0`         |
//! | `Float`    | `Float`                        | `0.0`       |
//! | `Str`      | `Str`, `Null`                  | `Null`      |
//! | `List`     | `List`, `Null`                 | `Null`      |
//! | `Object`   | instances (of subtypes), `Null`| `Null`      |

use std::fmt;
use std::sync::Arc;

use crate::error::{AccessError, AccessResult};
use crate::registry::{Instance, TypeHandle};

/// A dynamically typed value
#[derive(Clone, PartialEq, Default)]
pub enum Value {
    /// Absence of a reference
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Immutable list
    List(Arc<[Value]>),
    /// Instance of a registered type (identity equality)
    Object(Instance),
}

impl Value {
    /// Create a string value
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    /// Create a list value
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::from(items))
    }

    /// Check if this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool if this is a `Bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an `Int`
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a `Float`
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as str if this is a `Str`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the items if this is a `List`
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the instance if this is an `Object`
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Name of the value's runtime type, used in mismatch errors
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Object(instance) => instance.type_handle().name().to_string(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Object(instance) => write!(f, "Object({:?})", instance),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Object(instance)
    }
}

/// Declared type of a member, parameter, or return value
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Any value
    Any,
    /// `Value::Bool`
    Bool,
    /// `Value::Int`
    Int,
    /// `Value::Float`
    Float,
    /// `Value::Str` or null
    Str,
    /// `Value::List` or null
    List,
    /// Instance or null; `Some` restricts to a type and its subtypes
    Object(Option<TypeHandle>),
}

impl ValueType {
    /// Whether the value fits this type without coercion
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Any, _) => true,
            (ValueType::Bool, Value::Bool(_)) => true,
            (ValueType::Int, Value::Int(_)) => true,
            (ValueType::Float, Value::Float(_)) => true,
            (ValueType::Str | ValueType::List | ValueType::Object(_), Value::Null) => true,
            (ValueType::Str, Value::Str(_)) => true,
            (ValueType::List, Value::List(_)) => true,
            (ValueType::Object(None), Value::Object(_)) => true,
            (ValueType::Object(Some(expected)), Value::Object(instance)) => {
                instance.type_handle().is_subtype_of(expected)
            }
            _ => false,
        }
    }

    /// Like `accepts`, reporting a `TypeMismatch` on failure
    pub fn check(&self, value: &Value) -> AccessResult<()> {
        if self.accepts(value) {
            Ok(())
        } else {
            Err(AccessError::mismatch(self.name(), value.type_name()))
        }
    }

    /// Default value for a freshly created slot of this type
    pub fn zero_value(&self) -> Value {
        match self {
            ValueType::Bool => Value::Bool(false),
            ValueType::Int => Value::Int(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::Any | ValueType::Str | ValueType::List | ValueType::Object(_) => {
                Value::Null
            }
        }
    }

    /// Type name used in diagnostics
    pub fn name(&self) -> String {
        match self {
            ValueType::Any => "any".to_string(),
            ValueType::Bool => "bool".to_string(),
            ValueType::Int => "int".to_string(),
            ValueType::Float => "float".to_string(),
            ValueType::Str => "string".to_string(),
            ValueType::List => "list".to_string(),
            ValueType::Object(None) => "object".to_string(),
            ValueType::Object(Some(ty)) => ty.name().to_string(),
        }
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Outcome of invoking a method.
///
/// `NoValue` is what a void method yields. A method that returns null yields
/// `Value(Value::Null)`, which is a different thing.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnValue {
    /// The method returned a value (possibly `Null`)
    Value(Value),
    /// The method is declared void
    NoValue,
}

impl ReturnValue {
    /// Check if this is the void sentinel
    pub fn is_no_value(&self) -> bool {
        matches!(self, ReturnValue::NoValue)
    }

    /// Get the returned value, `None` for void
    pub fn into_value(self) -> Option<Value> {
        match self {
            ReturnValue::Value(v) => Some(v),
            ReturnValue::NoValue => None,
        }
    }
}
