//! Type-erased values and receivers.
//!
//! - [`TypeTag`]: runtime type identity, the key of every table in this crate.
//! - [`Value`]: an owned, type-erased value.
//! - [`Instance`] / [`InstanceMut`]: borrowed receivers of instance operations.

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};

// -----------------------------------------------------------------------------
// TypeTag

/// Runtime identity of a concrete type.
///
/// Comparison and hashing only look at the [`TypeId`],
/// the name is carried for diagnostics.
///
/// # Examples
///
/// ```
/// use vc_resolve::value::TypeTag;
///
/// let tag = TypeTag::of::<String>();
/// assert_eq!(tag, TypeTag::of::<String>());
/// assert_ne!(tag, TypeTag::of::<&'static str>());
/// assert_eq!(tag.name(), "alloc::string::String");
/// ```
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// Returns the tag of `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    /// Creates a tag from its parts.
    #[inline]
    pub const fn from_parts(id: TypeId, name: &'static str) -> Self {
        Self { id, name }
    }

    #[inline(always)]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if this is the tag of `T`.
    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeTag {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeTag").field(&self.name).finish()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// -----------------------------------------------------------------------------
// Value

/// An owned, type-erased value.
///
/// Arguments, results and field values all travel as `Value`s.
/// A nullable value is written `Option<Value>`.
///
/// # Examples
///
/// ```
/// use vc_resolve::value::Value;
///
/// let v = Value::new(42_u32);
/// assert!(v.is::<u32>());
/// assert_eq!(v.downcast_ref::<u32>(), Some(&42));
///
/// let v = v.take::<i64>().unwrap_err(); // wrong type, value returned
/// assert_eq!(v.take::<u32>().unwrap(), 42);
/// ```
pub struct Value {
    inner: Box<dyn Any + Send + Sync>,
    tag: TypeTag,
}

impl Value {
    /// Erases `value`.
    #[inline]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            tag: TypeTag::of::<T>(),
        }
    }

    /// The tag of the held value.
    #[inline(always)]
    pub const fn tag(&self) -> TypeTag {
        self.tag
    }

    /// The type name of the held value.
    #[inline(always)]
    pub const fn type_name(&self) -> &'static str {
        self.tag.name
    }

    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.tag.is::<T>()
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.inner.downcast_mut::<T>()
    }

    /// Takes the held value out, or gives `self` back if it is not a `T`.
    pub fn take<T: Any>(self) -> Result<T, Self> {
        let tag = self.tag;
        match self.inner.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(inner) => Err(Self { inner, tag }),
        }
    }

    /// Converts the value into `T`.
    ///
    /// Unlike [`take`](Self::take), `T = Value` succeeds and returns `self`
    /// unchanged, which lets generic callers ask for the erased form.
    pub fn into_typed<T: Any>(self) -> Result<T, Self> {
        let mut slot = Some(self);
        if let Some(typed) = (&mut slot as &mut dyn Any).downcast_mut::<Option<T>>()
            && let Some(value) = typed.take()
        {
            return Ok(value);
        }
        match slot {
            Some(value) => value.take::<T>(),
            None => unreachable!("`slot` is only emptied on return"),
        }
    }

    /// Borrows the held value as a receiver.
    #[inline]
    pub fn instance(&self) -> Instance<'_> {
        Instance {
            any: &*self.inner,
            tag: self.tag,
        }
    }

    /// Mutably borrows the held value as a receiver.
    #[inline]
    pub fn instance_mut(&mut self) -> InstanceMut<'_> {
        InstanceMut {
            any: &mut *self.inner,
            tag: self.tag,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&self.tag.name).finish()
    }
}

// -----------------------------------------------------------------------------
// Instance

/// A shared receiver: a borrowed value and its runtime [`TypeTag`].
///
/// Creating an instance from a [`Value`] peels it,
/// so the tag is always the one of the concrete type.
///
/// ```
/// use vc_resolve::value::{Instance, TypeTag, Value};
///
/// let v = Value::new(1_u8);
/// assert_eq!(Instance::new(&v).tag(), TypeTag::of::<u8>());
/// assert_eq!(Instance::new(&1_u8).tag(), TypeTag::of::<u8>());
/// ```
#[derive(Clone, Copy)]
pub struct Instance<'a> {
    any: &'a dyn Any,
    tag: TypeTag,
}

impl<'a> Instance<'a> {
    pub fn new<T: Any>(value: &'a T) -> Self {
        let any: &'a dyn Any = value;
        if let Some(value) = any.downcast_ref::<Value>() {
            return value.instance();
        }
        Self {
            any,
            tag: TypeTag::of::<T>(),
        }
    }

    #[inline(always)]
    pub const fn tag(&self) -> TypeTag {
        self.tag
    }

    #[inline(always)]
    pub fn as_any(&self) -> &'a dyn Any {
        self.any
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&'a T> {
        self.any.downcast_ref::<T>()
    }
}

impl fmt::Debug for Instance<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Instance").field(&self.tag.name).finish()
    }
}

// -----------------------------------------------------------------------------
// InstanceMut

/// An exclusive receiver: a mutably borrowed value and its runtime [`TypeTag`].
///
/// See [`Instance`].
pub struct InstanceMut<'a> {
    any: &'a mut dyn Any,
    tag: TypeTag,
}

impl<'a> InstanceMut<'a> {
    pub fn new<T: Any>(value: &'a mut T) -> Self {
        let any: &'a mut dyn Any = value;
        if any.is::<Value>() {
            return match any.downcast_mut::<Value>() {
                Some(value) => value.instance_mut(),
                None => unreachable!("checked by `is::<Value>`"),
            };
        }
        Self {
            any,
            tag: TypeTag::of::<T>(),
        }
    }

    #[inline(always)]
    pub const fn tag(&self) -> TypeTag {
        self.tag
    }

    /// A shared view of the same receiver.
    #[inline]
    pub fn as_instance(&self) -> Instance<'_> {
        Instance {
            any: &*self.any,
            tag: self.tag,
        }
    }

    /// Shortens the borrow, so the receiver can be passed on more than once.
    #[inline]
    pub fn reborrow(&mut self) -> InstanceMut<'_> {
        InstanceMut {
            any: &mut *self.any,
            tag: self.tag,
        }
    }

    #[inline(always)]
    pub fn as_any(&self) -> &dyn Any {
        &*self.any
    }

    #[inline(always)]
    pub fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut *self.any
    }

    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.any.downcast_mut::<T>()
    }
}

impl fmt::Debug for InstanceMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InstanceMut").field(&self.tag.name).finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::{Instance, InstanceMut, TypeTag, Value};

    #[test]
    fn tag_identity() {
        assert_eq!(TypeTag::of::<u32>(), TypeTag::of::<u32>());
        assert_ne!(TypeTag::of::<u32>(), TypeTag::of::<i32>());
        assert!(TypeTag::of::<String>().is::<String>());
        assert_eq!(TypeTag::of::<u32>().name(), "u32");
    }

    #[test]
    fn take_keeps_value_on_mismatch() {
        let v = Value::new(String::from("abc"));
        let v = v.take::<u32>().unwrap_err();
        assert_eq!(v.type_name(), "alloc::string::String");
        assert_eq!(v.take::<String>().unwrap(), "abc");
    }

    #[test]
    fn into_typed_accepts_value() {
        let v = Value::new(7_i16);
        let erased: Value = v.into_typed::<Value>().unwrap();
        assert!(erased.is::<i16>());
        assert_eq!(erased.into_typed::<i16>().unwrap(), 7);
    }

    #[test]
    fn instances_peel_values() {
        let mut v = Value::new(5_u64);
        assert!(Instance::new(&v).tag().is::<u64>());

        let mut inst = InstanceMut::new(&mut v);
        assert!(inst.tag().is::<u64>());
        *inst.downcast_mut::<u64>().unwrap() += 1;
        assert_eq!(v.downcast_ref::<u64>(), Some(&6));

        let mut plain = 3_u8;
        let mut inst = InstanceMut::new(&mut plain);
        assert_eq!(inst.reborrow().tag(), TypeTag::of::<u8>());
        assert_eq!(inst.as_instance().downcast_ref::<u8>(), Some(&3));
    }
}
