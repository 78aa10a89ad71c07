use core::any::Any;
use core::fmt;

use crate::args::{Arguments, BoundArguments};
use crate::error::MemberError;
use crate::value::{TypeTag, Value};

// -----------------------------------------------------------------------------
// ConstructorInfo

/// A constructor of an introspected type.
///
/// The unnamed constructor is called `""`. For a derived struct it is the
/// field-literal constructor whose parameters are the field names.
#[derive(Clone, Copy)]
pub struct ConstructorInfo {
    name: &'static str,
    params: &'static [&'static str],
    call: fn(BoundArguments) -> Result<Value, MemberError>,
}

impl ConstructorInfo {
    #[inline]
    pub const fn new(
        name: &'static str,
        params: &'static [&'static str],
        call: fn(BoundArguments) -> Result<Value, MemberError>,
    ) -> Self {
        Self { name, params, call }
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline(always)]
    pub const fn params(&self) -> &'static [&'static str] {
        self.params
    }

    #[inline]
    pub fn call(&self, args: BoundArguments) -> Result<Value, MemberError> {
        (self.call)(args)
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// FieldInfo

/// A plain field of an introspected type.
///
/// A field without a setter is readonly.
#[derive(Clone, Copy)]
pub struct FieldInfo {
    name: &'static str,
    get: fn(&dyn Any) -> Result<Value, MemberError>,
    set: Option<fn(&mut dyn Any, Option<Value>) -> Result<(), MemberError>>,
}

impl FieldInfo {
    #[inline]
    pub const fn new(
        name: &'static str,
        get: fn(&dyn Any) -> Result<Value, MemberError>,
        set: fn(&mut dyn Any, Option<Value>) -> Result<(), MemberError>,
    ) -> Self {
        Self {
            name,
            get,
            set: Some(set),
        }
    }

    #[inline]
    pub const fn readonly(name: &'static str, get: fn(&dyn Any) -> Result<Value, MemberError>) -> Self {
        Self {
            name,
            get,
            set: None,
        }
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline(always)]
    pub const fn is_readonly(&self) -> bool {
        self.set.is_none()
    }

    #[inline]
    pub fn get(&self, this: &dyn Any) -> Result<Value, MemberError> {
        (self.get)(this)
    }

    /// Writes the field, `Immutable` if it is readonly.
    #[inline]
    pub fn set(&self, this: &mut dyn Any, value: Option<Value>) -> Result<(), MemberError> {
        match self.set {
            Some(set) => set(this, value),
            None => Err(MemberError::Immutable),
        }
    }
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("readonly", &self.is_readonly())
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// MethodInfo

/// How a method takes its receiver.
#[derive(Clone, Copy)]
pub enum MethodCall {
    /// `&self`
    Ref(fn(&dyn Any, BoundArguments) -> Result<Option<Value>, MemberError>),
    /// `&mut self`
    Mut(fn(&mut dyn Any, BoundArguments) -> Result<Option<Value>, MemberError>),
    /// No receiver.
    Static(fn(BoundArguments) -> Result<Option<Value>, MemberError>),
}

impl fmt::Debug for MethodCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ref(_) => "Ref",
            Self::Mut(_) => "Mut",
            Self::Static(_) => "Static",
        })
    }
}

/// A method of an introspected type.
///
/// `returns` is `false` for methods returning `()`; they produce no value.
#[derive(Debug, Clone, Copy)]
pub struct MethodInfo {
    name: &'static str,
    params: &'static [&'static str],
    returns: bool,
    call: MethodCall,
}

impl MethodInfo {
    #[inline]
    pub const fn new(
        name: &'static str,
        params: &'static [&'static str],
        returns: bool,
        call: MethodCall,
    ) -> Self {
        Self {
            name,
            params,
            returns,
            call,
        }
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline(always)]
    pub const fn params(&self) -> &'static [&'static str] {
        self.params
    }

    #[inline(always)]
    pub const fn returns(&self) -> bool {
        self.returns
    }

    #[inline(always)]
    pub const fn call_kind(&self) -> &MethodCall {
        &self.call
    }

    /// A `&self` method without parameters that returns a value.
    #[inline]
    pub const fn is_getter(&self) -> bool {
        matches!(self.call, MethodCall::Ref(_)) && self.params.is_empty() && self.returns
    }

    /// A `&mut self` method taking exactly one parameter, named `set_<field>`.
    #[inline]
    pub fn is_setter_of(&self, field: &str) -> bool {
        matches!(self.call, MethodCall::Mut(_))
            && self.params.len() == 1
            && self.name.strip_prefix("set_") == Some(field)
    }

    /// Binds `args` and calls the method on `this`.
    ///
    /// `this` is ignored by static methods.
    pub fn call(&self, this: &mut dyn Any, args: Arguments) -> Result<Option<Value>, MemberError> {
        let bound = args.bind(self.params)?;
        match self.call {
            MethodCall::Ref(func) => func(this, bound),
            MethodCall::Mut(func) => func(this, bound),
            MethodCall::Static(func) => func(bound),
        }
    }
}

// -----------------------------------------------------------------------------
// TypeIntrospection

/// The generated description of one concrete type.
///
/// Built as `static` data by `#[derive(Introspect)]` and completed by
/// `#[introspect_methods]`. Member lookup follows these rules:
///
/// - constructors and methods are found by name;
/// - reading a field tries the plain field first,
///   then a [getter](MethodInfo::is_getter) of the same name;
/// - writing a field tries the plain field first (`Immutable` if readonly),
///   then a `set_<name>` [setter](MethodInfo::is_setter_of),
///   then reports a getter-only member as `Immutable`.
///
/// Every lookup miss is `NotFound` of the corresponding member kind.
pub struct TypeIntrospection {
    tag: fn() -> TypeTag,
    constructors: &'static [ConstructorInfo],
    fields: &'static [FieldInfo],
    methods: &'static [MethodInfo],
}

impl TypeIntrospection {
    #[inline]
    pub const fn new(
        tag: fn() -> TypeTag,
        constructors: &'static [ConstructorInfo],
        fields: &'static [FieldInfo],
        methods: &'static [MethodInfo],
    ) -> Self {
        Self {
            tag,
            constructors,
            fields,
            methods,
        }
    }

    #[inline]
    pub fn tag(&self) -> TypeTag {
        (self.tag)()
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.tag().name()
    }

    #[inline(always)]
    pub const fn constructors(&self) -> &'static [ConstructorInfo] {
        self.constructors
    }

    #[inline(always)]
    pub const fn fields(&self) -> &'static [FieldInfo] {
        self.fields
    }

    #[inline(always)]
    pub const fn methods(&self) -> &'static [MethodInfo] {
        self.methods
    }

    /// The constructor `name`. A later entry shadows an earlier one of the
    /// same name.
    pub fn constructor(&self, name: &str) -> Option<&'static ConstructorInfo> {
        self.constructors.iter().rev().find(|ctor| ctor.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldInfo> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&'static MethodInfo> {
        self.methods.iter().find(|method| method.name == name)
    }

    pub fn getter(&self, name: &str) -> Option<&'static MethodInfo> {
        self.methods
            .iter()
            .find(|method| method.name == name && method.is_getter())
    }

    pub fn setter(&self, field: &str) -> Option<&'static MethodInfo> {
        self.methods.iter().find(|method| method.is_setter_of(field))
    }

    /// Calls the constructor `name`.
    pub fn construct(&self, name: &str, args: Arguments) -> Result<Value, MemberError> {
        let ctor = self.constructor(name).ok_or(MemberError::no_constructor())?;
        ctor.call(args.bind(ctor.params)?)
    }

    /// Calls the method `name`.
    pub fn invoke(
        &self,
        this: &mut dyn Any,
        name: &str,
        args: Arguments,
    ) -> Result<Option<Value>, MemberError> {
        let method = self.method(name).ok_or(MemberError::no_method())?;
        method.call(this, args)
    }

    /// Reads the field or getter `name`.
    pub fn get_field(&self, this: &dyn Any, name: &str) -> Result<Option<Value>, MemberError> {
        if let Some(field) = self.field(name) {
            return field.get(this).map(Some);
        }
        match self.getter(name).map(MethodInfo::call_kind) {
            Some(MethodCall::Ref(func)) => func(this, Arguments::new().bind(&[])?),
            _ => Err(MemberError::no_field()),
        }
    }

    /// Writes the field or setter `name`.
    pub fn set_field(
        &self,
        this: &mut dyn Any,
        name: &str,
        value: Option<Value>,
    ) -> Result<(), MemberError> {
        if let Some(field) = self.field(name) {
            return field.set(this, value);
        }
        if let Some(setter) = self.setter(name) {
            let mut args = Arguments::new();
            if let Some(value) = value {
                args.push(value);
            }
            return setter.call(this, args).map(drop);
        }
        if self.getter(name).is_some() {
            return Err(MemberError::Immutable);
        }
        Err(MemberError::no_field())
    }
}

impl fmt::Debug for TypeIntrospection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeIntrospection")
            .field("type", &self.tag())
            .field("constructors", &self.constructors)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .finish()
    }
}
