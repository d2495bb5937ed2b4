// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime object model shared by the codec and the domain model.
//!
//! The codec never sees concrete domain types. Everything it needs goes
//! through [`Reflect`]: named property access, a prototype copy, and a few
//! optional facets (containers, graph links, graph ports) used by child
//! enumeration and tree-link synthesis.

use crate::value::{Value, ValueKind};
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

/// Shared, lockable handle to a reflected object
pub type ObjectRef = Arc<RwLock<dyn Reflect>>;

/// Weak counterpart of [`ObjectRef`]
pub type WeakObject = Weak<RwLock<dyn Reflect>>;

/// Name of a runtime type, as used for registry lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(pub &'static str);

impl TypeKey {
    /// The type name
    pub fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Identity of a live object: its allocation address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectKey(usize);

impl ObjectKey {
    /// Identity of the given object
    pub fn of(object: &ObjectRef) -> Self {
        Self(Arc::as_ptr(object).cast::<()>() as usize)
    }
}

/// Static description of one reflected property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    /// Property name as used in paths
    pub name: &'static str,
    /// Kind of value the property holds
    pub kind: ValueKind,
    /// Whether `get` may be called
    pub readable: bool,
    /// Whether `set` may be called
    pub writable: bool,
}

impl PropertyInfo {
    /// A read/write property
    pub const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            readable: true,
            writable: true,
        }
    }

    /// A read-only property
    pub const fn read_only(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            readable: true,
            writable: false,
        }
    }

    /// A write-only property
    pub const fn write_only(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            readable: false,
            writable: true,
        }
    }
}

/// Outcome of a failed property access
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccessError {
    /// The object has no member of this name
    #[error("no member named `{0}`")]
    Missing(String),

    /// The member exists but cannot be read
    #[error("member `{0}` is not readable")]
    NotReadable(String),

    /// The member exists but cannot be written
    #[error("member `{0}` is not writable")]
    NotWritable(String),

    /// The value has the wrong kind for the member
    #[error("member `{member}` expects {expected}, got {found}")]
    TypeMismatch {
        /// Member name
        member: String,
        /// Expected kind
        expected: &'static str,
        /// Kind that was supplied
        found: &'static str,
    },

    /// The accessor itself rejected the operation
    #[error("member `{member}`: {message}")]
    Failed {
        /// Member name
        member: String,
        /// Accessor message
        message: String,
    },
}

impl AccessError {
    /// No such member
    pub fn missing(member: &str) -> Self {
        Self::Missing(member.to_string())
    }

    /// Wrong value kind for a member
    pub fn mismatch(member: &str, expected: &'static str, found: &Value) -> Self {
        Self::TypeMismatch {
            member: member.to_string(),
            expected,
            found: found.kind_name(),
        }
    }

    /// Accessor failure with a message
    pub fn failed(member: &str, message: impl Into<String>) -> Self {
        Self::Failed {
            member: member.to_string(),
            message: message.into(),
        }
    }

    /// Whether this only means "no value available" (as opposed to an
    /// accessor that raised)
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Missing(_) | Self::NotReadable(_) | Self::NotWritable(_))
    }
}

/// An object whose children can be enumerated and appended to
pub trait Collection {
    /// Children in a stable order
    fn items(&self) -> Vec<ObjectRef>;

    /// Append a child
    fn push(&mut self, item: ObjectRef);
}

/// A directed edge between two endpoints
pub trait GraphLink {
    /// Source endpoint (a port, or a node acting as its own port)
    fn from_end(&self) -> Option<ObjectRef>;

    /// Destination endpoint
    fn to_end(&self) -> Option<ObjectRef>;
}

/// An endpoint owned by a node
pub trait GraphPort {
    /// The node this port belongs to
    fn node(&self) -> Option<ObjectRef>;
}

/// Runtime property access for objects handled by the codec.
///
/// Implementations should be cheap to call repeatedly: the codec resolves
/// paths hop by hop and never caches values across runs.
pub trait Reflect: Any + Send + Sync {
    /// Name of the concrete type
    fn type_key(&self) -> TypeKey;

    /// Properties this object exposes
    fn properties(&self) -> &[PropertyInfo];

    /// Read a property
    fn get(&self, name: &str) -> Result<Value, AccessError>;

    /// Write a property
    fn set(&mut self, name: &str, value: Value) -> Result<(), AccessError>;

    /// Make an independent copy, used when allocating from a prototype
    fn copy_object(&self) -> Box<dyn Reflect>;

    /// Called once after the object is wrapped in an [`ObjectRef`]
    fn attached(&mut self, _this: &WeakObject) {}

    /// Whether this object is a graph node
    fn is_node(&self) -> bool {
        false
    }

    /// Container facet
    fn collection(&self) -> Option<&dyn Collection> {
        None
    }

    /// Mutable container facet
    fn collection_mut(&mut self) -> Option<&mut dyn Collection> {
        None
    }

    /// Link facet
    fn as_link(&self) -> Option<&dyn GraphLink> {
        None
    }

    /// Port facet
    fn as_port(&self) -> Option<&dyn GraphPort> {
        None
    }

    /// Upcast for downcasting to the concrete type
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Reflect {
    /// Find a property description by name
    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties().iter().find(|p| p.name == name)
    }

    /// Downcast to a concrete type
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutable downcast to a concrete type
    pub fn downcast_mut<T: Reflect>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.type_key())
    }
}

/// Wrap a freshly built object and notify it of its own handle
pub fn share(object: Box<dyn Reflect>) -> ObjectRef {
    let shared: ObjectRef = Arc::new(RwLock::new(BoxedReflect(object)));
    let weak = Arc::downgrade(&shared);
    shared.write().attached(&weak);
    shared
}

/// Wrap a concrete object without boxing it first
pub fn share_value<T: Reflect>(object: T) -> ObjectRef {
    let shared: ObjectRef = Arc::new(RwLock::new(object));
    let weak = Arc::downgrade(&shared);
    shared.write().attached(&weak);
    shared
}

/// Type name of an object, for diagnostics and registry lookups
pub fn type_of(object: &ObjectRef) -> TypeKey {
    object.read().type_key()
}

/// Adapter so boxed trait objects can live behind the same lock type
struct BoxedReflect(Box<dyn Reflect>);

impl Reflect for BoxedReflect {
    fn type_key(&self) -> TypeKey {
        self.0.type_key()
    }

    fn properties(&self) -> &[PropertyInfo] {
        self.0.properties()
    }

    fn get(&self, name: &str) -> Result<Value, AccessError> {
        self.0.get(name)
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), AccessError> {
        self.0.set(name, value)
    }

    fn copy_object(&self) -> Box<dyn Reflect> {
        self.0.copy_object()
    }

    fn attached(&mut self, this: &WeakObject) {
        self.0.attached(this);
    }

    fn is_node(&self) -> bool {
        self.0.is_node()
    }

    fn collection(&self) -> Option<&dyn Collection> {
        self.0.collection()
    }

    fn collection_mut(&mut self) -> Option<&mut dyn Collection> {
        self.0.collection_mut()
    }

    fn as_link(&self) -> Option<&dyn GraphLink> {
        self.0.as_link()
    }

    fn as_port(&self) -> Option<&dyn GraphPort> {
        self.0.as_port()
    }

    fn as_any(&self) -> &dyn Any {
        self.0.as_any()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self.0.as_any_mut()
    }
}
