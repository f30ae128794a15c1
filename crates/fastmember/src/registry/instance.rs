//! Instances of registered types and static member storage

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::TypeHandle;
use crate::error::{AccessError, AccessResult};
use crate::value::Value;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

struct InstanceData {
    object_id: u64,
    ty: TypeHandle,
    slots: RwLock<Vec<Value>>,
}

/// Reference-counted object of a registered type.
///
/// Holds one slot per instance field and auto-property, inherited ones
/// first. Cloning shares the object; equality is object identity.
#[derive(Clone)]
pub struct Instance(Arc<InstanceData>);

impl Instance {
    pub(crate) fn new(ty: TypeHandle, slots: Vec<Value>) -> Self {
        Self(Arc::new(InstanceData {
            object_id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            ty,
            slots: RwLock::new(slots),
        }))
    }

    /// Unique object ID
    pub fn object_id(&self) -> u64 {
        self.0.object_id
    }

    /// Runtime type of the object
    pub fn type_handle(&self) -> &TypeHandle {
        &self.0.ty
    }

    /// Number of slots
    pub fn slot_count(&self) -> usize {
        self.0.slots.read().len()
    }

    /// Read a slot by index
    pub fn get_slot(&self, index: usize) -> AccessResult<Value> {
        let slots = self.0.slots.read();
        slots.get(index).cloned().ok_or(AccessError::InvalidSlot {
            index,
            len: slots.len(),
        })
    }

    /// Write a slot by index. No type check happens here.
    pub fn set_slot(&self, index: usize, value: Value) -> AccessResult<()> {
        let mut slots = self.0.slots.write();
        let len = slots.len();
        match slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(AccessError::InvalidSlot { index, len }),
        }
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Instance {}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.0.ty.name(), self.0.object_id)
    }
}

/// Static slots of one type, shared by every accessor of its static members
#[derive(Clone, Default)]
pub struct StaticStorage(Arc<RwLock<Vec<Value>>>);

impl StaticStorage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a slot and return its index
    pub(crate) fn push(&self, initial: Value) -> usize {
        let mut slots = self.0.write();
        slots.push(initial);
        slots.len() - 1
    }

    /// Read a static slot
    pub fn get(&self, index: usize) -> AccessResult<Value> {
        let slots = self.0.read();
        slots.get(index).cloned().ok_or(AccessError::InvalidSlot {
            index,
            len: slots.len(),
        })
    }

    /// Write a static slot
    pub fn set(&self, index: usize, value: Value) -> AccessResult<()> {
        let mut slots = self.0.write();
        let len = slots.len();
        match slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(AccessError::InvalidSlot { index, len }),
        }
    }

    /// Number of static slots
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Check if there are no static slots
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
