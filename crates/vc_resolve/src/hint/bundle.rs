use alloc::borrow::Cow;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::args::{Arguments, BoundArguments};
use crate::error::MemberError;
use crate::introspect::{Introspect, TypeIntrospection};
use crate::value::{TypeTag, Value};

// -----------------------------------------------------------------------------
// Slot types

pub(crate) type ConstructFn = dyn Fn(BoundArguments) -> Result<Value, MemberError> + Send + Sync;
pub(crate) type InvokeFn =
    dyn Fn(&mut dyn Any, &str, Arguments) -> Result<Option<Value>, MemberError> + Send + Sync;
pub(crate) type GetFieldFn =
    dyn Fn(&dyn Any, &str) -> Result<Option<Value>, MemberError> + Send + Sync;
pub(crate) type SetFieldFn =
    dyn Fn(&mut dyn Any, &str, Option<Value>) -> Result<(), MemberError> + Send + Sync;

// -----------------------------------------------------------------------------
// ConstructorHint

/// A named constructor with its declared parameter order.
#[derive(Clone)]
pub struct ConstructorHint {
    name: Cow<'static, str>,
    params: &'static [&'static str],
    func: Arc<ConstructFn>,
}

impl ConstructorHint {
    /// Constructor name, `""` for the unnamed one.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub const fn params(&self) -> &'static [&'static str] {
        self.params
    }

    #[inline]
    pub(crate) fn call(&self, args: BoundArguments) -> Result<Value, MemberError> {
        (self.func)(args)
    }
}

impl fmt::Debug for ConstructorHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorHint")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// HintBundle

/// Statically supplied callables serving one concrete type.
///
/// A bundle has four optional slots: constructors, `invoke`, `get_field`
/// and `set_field`. An absent slot means the bundle does not handle that
/// operation, which lets resolution fall back to another backend.
/// A present slot that fails is a final failure.
///
/// The constructor slot is a list of named constructors; it counts as
/// absent while the list is empty.
///
/// # Examples
///
/// ```
/// use vc_resolve::hint::HintBundle;
/// use vc_resolve::value::Value;
/// use vc_resolve::MemberError;
///
/// struct Counter(u32);
///
/// let bundle = HintBundle::of::<Counter>()
///     .constructor("", &["start"], |mut args| Ok(Counter(args.take("start")?)))
///     .get_field(|counter, name| match name {
///         "count" => Ok(Some(Value::new(counter.0))),
///         _ => Err(MemberError::no_field()),
///     })
///     .build();
///
/// assert!(bundle.has_constructors());
/// assert!(bundle.has_get_field());
/// assert!(!bundle.has_invoke());
/// ```
#[derive(Clone)]
pub struct HintBundle {
    tag: TypeTag,
    constructors: Vec<ConstructorHint>,
    invoke: Option<Arc<InvokeFn>>,
    get_field: Option<Arc<GetFieldFn>>,
    set_field: Option<Arc<SetFieldFn>>,
}

impl HintBundle {
    /// An empty bundle for `T`.
    #[inline]
    pub fn of<T: Any + Send + Sync>() -> TypedHintBundle<T> {
        TypedHintBundle {
            bundle: Self::empty(TypeTag::of::<T>()),
            _marker: core::marker::PhantomData,
        }
    }

    /// An empty bundle for the type behind `tag`.
    ///
    /// The slots of an untyped bundle receive the receiver as `dyn Any`.
    #[inline]
    pub fn empty(tag: TypeTag) -> Self {
        Self {
            tag,
            constructors: Vec::new(),
            invoke: None,
            get_field: None,
            set_field: None,
        }
    }

    /// A bundle serving every member of a generated introspection table.
    ///
    /// In the static regime, this is how introspected types are served.
    pub fn from_introspection(info: &'static TypeIntrospection) -> Self {
        let mut bundle = Self {
            tag: info.tag(),
            constructors: Vec::new(),
            invoke: Some(Arc::new(
                move |this: &mut dyn Any, name: &str, args: Arguments| info.invoke(this, name, args),
            )),
            get_field: Some(Arc::new(move |this: &dyn Any, name: &str| {
                info.get_field(this, name)
            })),
            set_field: Some(Arc::new(
                move |this: &mut dyn Any, name: &str, value: Option<Value>| {
                    info.set_field(this, name, value)
                },
            )),
        };
        for ctor in info.constructors() {
            bundle.push_constructor(ConstructorHint {
                name: Cow::Borrowed(ctor.name()),
                params: ctor.params(),
                func: Arc::new(move |args: BoundArguments| ctor.call(args)),
            });
        }
        bundle
    }

    /// [`from_introspection`](Self::from_introspection) for `T`.
    #[inline]
    pub fn introspected<T: Introspect>() -> Self {
        Self::from_introspection(T::introspection())
    }

    #[inline(always)]
    pub const fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Adds an untyped constructor.
    pub fn with_constructor(
        mut self,
        name: impl Into<Cow<'static, str>>,
        params: &'static [&'static str],
        func: impl Fn(BoundArguments) -> Result<Value, MemberError> + Send + Sync + 'static,
    ) -> Self {
        self.push_constructor(ConstructorHint {
            name: name.into(),
            params,
            func: Arc::new(func),
        });
        self
    }

    /// Sets the untyped `invoke` slot.
    pub fn with_invoke(
        mut self,
        func: impl Fn(&mut dyn Any, &str, Arguments) -> Result<Option<Value>, MemberError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.invoke = Some(Arc::new(func));
        self
    }

    /// Sets the untyped `get_field` slot.
    pub fn with_get_field(
        mut self,
        func: impl Fn(&dyn Any, &str) -> Result<Option<Value>, MemberError> + Send + Sync + 'static,
    ) -> Self {
        self.get_field = Some(Arc::new(func));
        self
    }

    /// Sets the untyped `set_field` slot.
    pub fn with_set_field(
        mut self,
        func: impl Fn(&mut dyn Any, &str, Option<Value>) -> Result<(), MemberError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.set_field = Some(Arc::new(func));
        self
    }

    // A later constructor of the same name replaces the earlier one.
    fn push_constructor(&mut self, ctor: ConstructorHint) {
        match self.constructors.iter_mut().find(|c| c.name == ctor.name) {
            Some(slot) => *slot = ctor,
            None => self.constructors.push(ctor),
        }
    }

    #[inline]
    pub fn has_constructors(&self) -> bool {
        !self.constructors.is_empty()
    }

    #[inline]
    pub fn has_invoke(&self) -> bool {
        self.invoke.is_some()
    }

    #[inline]
    pub fn has_get_field(&self) -> bool {
        self.get_field.is_some()
    }

    #[inline]
    pub fn has_set_field(&self) -> bool {
        self.set_field.is_some()
    }

    #[inline]
    pub fn constructors(&self) -> &[ConstructorHint] {
        &self.constructors
    }

    /// The constructor named `name`.
    #[inline]
    pub fn constructor(&self, name: &str) -> Option<&ConstructorHint> {
        self.constructors.iter().find(|ctor| ctor.name == name)
    }

    #[inline]
    pub(crate) fn invoke_slot(&self) -> Option<&InvokeFn> {
        self.invoke.as_deref()
    }

    #[inline]
    pub(crate) fn get_field_slot(&self) -> Option<&GetFieldFn> {
        self.get_field.as_deref()
    }

    #[inline]
    pub(crate) fn set_field_slot(&self) -> Option<&SetFieldFn> {
        self.set_field.as_deref()
    }
}

impl fmt::Debug for HintBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HintBundle")
            .field("tag", &self.tag)
            .field("constructors", &self.constructors)
            .field("invoke", &self.has_invoke())
            .field("get_field", &self.has_get_field())
            .field("set_field", &self.has_set_field())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// TypedHintBundle

/// A [`HintBundle`] under construction, whose slots receive a `&T` / `&mut T`.
///
/// Converts into a [`HintBundle`] with `into()` or
/// [`HintRegistrar::insert`](crate::hint::HintRegistrar::insert).
pub struct TypedHintBundle<T> {
    bundle: HintBundle,
    _marker: core::marker::PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> TypedHintBundle<T> {
    /// Adds a constructor named `name` with the parameter order `params`.
    ///
    /// Positional arguments are bound onto `params` before `func` runs.
    pub fn constructor(
        mut self,
        name: impl Into<Cow<'static, str>>,
        params: &'static [&'static str],
        func: impl Fn(BoundArguments) -> Result<T, MemberError> + Send + Sync + 'static,
    ) -> Self {
        self.bundle.push_constructor(ConstructorHint {
            name: name.into(),
            params,
            func: Arc::new(move |args: BoundArguments| func(args).map(Value::new)),
        });
        self
    }

    /// Sets the `invoke` slot.
    pub fn invoke(
        mut self,
        func: impl Fn(&mut T, &str, Arguments) -> Result<Option<Value>, MemberError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.bundle.invoke = Some(Arc::new(
            move |this: &mut dyn Any, name: &str, args: Arguments| {
                func(receiver_mut::<T>(this)?, name, args)
            },
        ));
        self
    }

    /// Sets the `get_field` slot.
    pub fn get_field(
        mut self,
        func: impl Fn(&T, &str) -> Result<Option<Value>, MemberError> + Send + Sync + 'static,
    ) -> Self {
        self.bundle.get_field = Some(Arc::new(move |this: &dyn Any, name: &str| {
            func(receiver_ref::<T>(this)?, name)
        }));
        self
    }

    /// Sets the `set_field` slot.
    pub fn set_field(
        mut self,
        func: impl Fn(&mut T, &str, Option<Value>) -> Result<(), MemberError> + Send + Sync + 'static,
    ) -> Self {
        self.bundle.set_field = Some(Arc::new(
            move |this: &mut dyn Any, name: &str, value: Option<Value>| {
                func(receiver_mut::<T>(this)?, name, value)
            },
        ));
        self
    }

    /// Finishes the bundle.
    #[inline]
    pub fn build(self) -> HintBundle {
        self.bundle
    }
}

impl<T: Any + Send + Sync> From<TypedHintBundle<T>> for HintBundle {
    #[inline]
    fn from(value: TypedHintBundle<T>) -> Self {
        value.bundle
    }
}

fn receiver_ref<T: Any>(this: &dyn Any) -> Result<&T, MemberError> {
    this.downcast_ref::<T>().ok_or(MemberError::TypeMismatch {
        expected: core::any::type_name::<T>(),
        found: "another type",
    })
}

fn receiver_mut<T: Any>(this: &mut dyn Any) -> Result<&mut T, MemberError> {
    this.downcast_mut::<T>().ok_or(MemberError::TypeMismatch {
        expected: core::any::type_name::<T>(),
        found: "another type",
    })
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::HintBundle;
    use crate::args::Arguments;
    use crate::derive::Introspect;
    use crate::error::MemberError;
    use crate::value::Value;

    struct Label(String);

    #[derive(Introspect)]
    struct Badge {
        #[introspect(readonly)]
        id: u32,
        holder: String,
    }

    #[test]
    fn typed_slots_downcast_receiver() {
        let bundle: HintBundle = HintBundle::of::<Label>()
            .get_field(|label, _| Ok(Some(Value::new(label.0.clone()))))
            .set_field(|label, _, value| {
                label.0 = value.and_then(|v| v.take::<String>().ok()).unwrap_or_default();
                Ok(())
            })
            .into();

        let mut label = Label(String::from("a"));
        let get = bundle.get_field_slot().unwrap();
        let v = get(&label, "text").unwrap().unwrap();
        assert_eq!(v.take::<String>().unwrap(), "a");

        let set = bundle.set_field_slot().unwrap();
        set(&mut label, "text", Some(Value::new(String::from("b")))).unwrap();
        assert_eq!(label.0, "b");

        // A receiver of the wrong type is a mismatch, not a panic.
        assert!(matches!(get(&7_u8, "text"), Err(MemberError::TypeMismatch { .. })));
    }

    #[test]
    fn later_constructor_replaces_earlier() {
        let bundle = HintBundle::of::<Label>()
            .constructor("", &[], |_| Ok(Label(String::from("first"))))
            .constructor("", &[], |_| Ok(Label(String::from("second"))))
            .build();
        assert_eq!(bundle.constructors().len(), 1);

        let ctor = bundle.constructor("").unwrap();
        let made = ctor.call(Arguments::new().bind(&[]).unwrap()).unwrap();
        assert_eq!(made.take::<Label>().ok().unwrap().0, "second");
    }

    #[test]
    fn introspection_tables_become_bundles() {
        let bundle = HintBundle::introspected::<Badge>();
        assert!(bundle.has_constructors() && bundle.has_get_field() && bundle.has_set_field());

        let ctor = bundle.constructor("").unwrap();
        let args = Arguments::new()
            .with(7_u32)
            .with(String::from("ann"))
            .bind(ctor.params())
            .unwrap();
        let mut badge = ctor.call(args).unwrap().take::<Badge>().ok().unwrap();

        let get = bundle.get_field_slot().unwrap();
        assert_eq!(get(&badge, "id").unwrap().unwrap().take::<u32>().ok(), Some(7));

        let set = bundle.set_field_slot().unwrap();
        let err = set(&mut badge, "id", Some(Value::new(1_u32))).unwrap_err();
        assert!(matches!(err, MemberError::Immutable));
        set(&mut badge, "holder", Some(Value::new(String::from("bo")))).unwrap();
        assert_eq!(badge.holder, "bo");
    }
}
