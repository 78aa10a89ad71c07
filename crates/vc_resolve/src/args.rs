//! Argument lists.
//!
//! - [`Arguments`]: positional and named values as supplied by the caller.
//! - [`BoundArguments`]: the same values bound to declared parameter names.

use alloc::borrow::Cow;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::any::Any;

use crate::error::ArgumentError;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Arguments

/// Positional and named arguments of a call.
///
/// Values are taken out as they are consumed,
/// so a backend declining a request leaves them in place for the next one.
///
/// # Examples
///
/// ```
/// use vc_resolve::args::Arguments;
///
/// let args = Arguments::new().with(1_i32).with_named("y", 2_i32);
/// assert_eq!(args.positional_len(), 1);
/// assert_eq!(args.named_len(), 1);
///
/// let mut bound = args.bind(&["x", "y"]).unwrap();
/// assert_eq!(bound.take::<i32>("x").unwrap(), 1);
/// assert_eq!(bound.take::<i32>("y").unwrap(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Arguments {
    positional: Vec<Option<Value>>,
    named: BTreeMap<String, Value>,
}

impl Arguments {
    /// An empty argument list.
    #[inline]
    pub const fn new() -> Self {
        Self {
            positional: Vec::new(),
            named: BTreeMap::new(),
        }
    }

    /// Creates arguments from already erased values.
    pub fn from_parts(
        positional: impl IntoIterator<Item = Value>,
        named: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        Self {
            positional: positional.into_iter().map(Some).collect(),
            named: named.into_iter().collect(),
        }
    }

    /// Appends a positional argument.
    #[inline]
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.push(Value::new(value));
        self
    }

    /// Adds a named argument, replacing a previous one of the same name.
    #[inline]
    pub fn with_named<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert_named(name, Value::new(value));
        self
    }

    #[inline]
    pub fn push(&mut self, value: Value) {
        self.positional.push(Some(value));
    }

    #[inline]
    pub fn insert_named(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.named.insert(name.into(), value)
    }

    #[inline]
    pub fn positional_len(&self) -> usize {
        self.positional.len()
    }

    #[inline]
    pub fn named_len(&self) -> usize {
        self.named.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Returns `true` if a named argument `name` is present.
    #[inline]
    pub fn has_named(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// Takes the positional argument at `index`.
    ///
    /// A slot can be taken only once; a second take reports it missing.
    pub fn take_positional<T: Any>(&mut self, index: usize) -> Result<T, ArgumentError> {
        let name = || Cow::Owned(index.to_string());
        let value = self
            .positional
            .get_mut(index)
            .and_then(Option::take)
            .ok_or_else(|| ArgumentError::Missing(name()))?;
        downcast(value, name)
    }

    /// Takes the named argument `name`, `None` if absent.
    pub fn take_named<T: Any>(&mut self, name: &str) -> Result<Option<T>, ArgumentError> {
        match self.named.remove(name) {
            Some(value) => downcast(value, || Cow::Owned(name.to_string())).map(Some),
            None => Ok(None),
        }
    }

    /// Splits into positional and named values.
    pub fn into_parts(self) -> (Vec<Value>, BTreeMap<String, Value>) {
        (self.positional.into_iter().flatten().collect(), self.named)
    }

    /// Binds the arguments to `params`.
    ///
    /// The i-th positional argument is bound to `params[i]`,
    /// named arguments are bound by key. Nothing is coerced or defaulted.
    ///
    /// # Errors
    ///
    /// - more positional arguments than parameters,
    /// - a parameter supplied both by position and by name,
    /// - a named argument matching no parameter.
    pub fn bind(self, params: &'static [&'static str]) -> Result<BoundArguments, ArgumentError> {
        let Self { positional, named } = self;

        if positional.len() > params.len() {
            return Err(ArgumentError::TooManyPositional {
                expected: params.len(),
                found: positional.len(),
            });
        }

        let mut values: Vec<Option<Value>> = Vec::with_capacity(params.len());
        values.extend(positional);
        values.resize_with(params.len(), || None);

        for (name, value) in named {
            let Some(index) = params.iter().position(|param| *param == name) else {
                return Err(ArgumentError::UnexpectedNamed(name));
            };
            if values[index].is_some() {
                return Err(ArgumentError::Duplicate(Cow::Borrowed(params[index])));
            }
            values[index] = Some(value);
        }

        Ok(BoundArguments { params, values })
    }
}

// -----------------------------------------------------------------------------
// BoundArguments

/// Arguments bound to declared parameter names, see [`Arguments::bind`].
#[derive(Debug)]
pub struct BoundArguments {
    params: &'static [&'static str],
    values: Vec<Option<Value>>,
}

impl BoundArguments {
    /// The declared parameters.
    #[inline]
    pub const fn params(&self) -> &'static [&'static str] {
        self.params
    }

    fn slot(&mut self, name: &str) -> Result<(&'static str, &mut Option<Value>), ArgumentError> {
        match self.params.iter().position(|param| *param == name) {
            Some(index) => Ok((self.params[index], &mut self.values[index])),
            None => Err(ArgumentError::UnknownParameter(name.to_string())),
        }
    }

    /// Returns `true` if a value was supplied for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.params
            .iter()
            .position(|param| *param == name)
            .is_some_and(|index| self.values[index].is_some())
    }

    /// Takes the argument of parameter `name`.
    ///
    /// # Errors
    ///
    /// `Missing` if no value was supplied, `WrongType` if it is not a `T`,
    /// `UnknownParameter` if `name` was not declared.
    pub fn take<T: Any>(&mut self, name: &str) -> Result<T, ArgumentError> {
        let (param, slot) = self.slot(name)?;
        let value = slot.take().ok_or(ArgumentError::Missing(Cow::Borrowed(param)))?;
        downcast(value, || Cow::Borrowed(param))
    }

    /// Like [`take`](Self::take), but a missing argument is `None`.
    pub fn take_opt<T: Any>(&mut self, name: &str) -> Result<Option<T>, ArgumentError> {
        let (param, slot) = self.slot(name)?;
        match slot.take() {
            Some(value) => downcast(value, || Cow::Borrowed(param)).map(Some),
            None => Ok(None),
        }
    }

    /// Takes the raw value of parameter `name`.
    pub fn take_value(&mut self, name: &str) -> Result<Option<Value>, ArgumentError> {
        let (_, slot) = self.slot(name)?;
        Ok(slot.take())
    }
}

fn downcast<T: Any>(
    value: Value,
    name: impl FnOnce() -> Cow<'static, str>,
) -> Result<T, ArgumentError> {
    value.take::<T>().map_err(|value| ArgumentError::WrongType {
        name: name(),
        expected: core::any::type_name::<T>(),
        found: value.type_name(),
    })
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::Arguments;
    use crate::error::ArgumentError;

    const XY: &[&str] = &["x", "y"];

    #[test]
    fn positional_and_named_bind_alike() {
        let mut by_pos = Arguments::new().with(1_i32).with(2_i32).bind(XY).unwrap();
        let mut by_name = Arguments::new()
            .with_named("y", 2_i32)
            .with_named("x", 1_i32)
            .bind(XY)
            .unwrap();

        assert_eq!(by_pos.take::<i32>("x").unwrap(), by_name.take::<i32>("x").unwrap());
        assert_eq!(by_pos.take::<i32>("y").unwrap(), by_name.take::<i32>("y").unwrap());
    }

    #[test]
    fn shape_errors() {
        let err = Arguments::new().with(1).with(2).with(3).bind(XY).unwrap_err();
        assert_eq!(err, ArgumentError::TooManyPositional { expected: 2, found: 3 });

        let err = Arguments::new().with(1).with_named("x", 1).bind(XY).unwrap_err();
        assert_eq!(err, ArgumentError::Duplicate("x".into()));

        let err = Arguments::new().with_named("z", 1).bind(XY).unwrap_err();
        assert_eq!(err, ArgumentError::UnexpectedNamed(String::from("z")));
    }

    #[test]
    fn take_errors() {
        let mut bound = Arguments::new().with(1_u8).bind(XY).unwrap();
        assert!(bound.contains("x"));
        assert!(!bound.contains("y"));

        assert!(matches!(
            bound.take::<i32>("x"),
            Err(ArgumentError::WrongType { expected: "i32", found: "u8", .. })
        ));
        // A failed take consumes the slot.
        assert_eq!(bound.take::<u8>("x"), Err(ArgumentError::Missing("x".into())));
        assert_eq!(bound.take_opt::<u8>("y"), Ok(None));
        assert!(matches!(bound.take::<u8>("w"), Err(ArgumentError::UnknownParameter(_))));
    }

    #[test]
    fn raw_access() {
        let mut args = Arguments::new().with(5_u16).with_named("k", 'c');
        assert!(args.has_named("k"));
        assert_eq!(args.take_named::<char>("k"), Ok(Some('c')));
        assert_eq!(args.take_named::<char>("k"), Ok(None));
        assert_eq!(args.take_positional::<u16>(0), Ok(5));
        assert!(args.take_positional::<u16>(0).is_err());
        assert!(args.into_parts().0.is_empty());
    }
}
