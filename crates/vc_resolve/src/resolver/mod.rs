//! Resolution backends.
//!
//! A [`Resolver`] answers each request with an [`Outcome`]:
//! handled, failed, or not applicable. Backends are composed with
//! [`Fallback`], which consults its secondary only when the primary
//! answered [`Outcome::NotApplicable`].
//!
//! - [`HintResolver`]: serves statically registered [hints](crate::hint).
//! - [`ReflectiveResolver`]: serves [introspected](crate::introspect) types.
//!   Only exists in the reflective regime (feature `reflect`).
//!
//! # Examples
//!
//! ```
//! use vc_resolve::args::Arguments;
//! use vc_resolve::bootstrap::Bootstrap;
//! use vc_resolve::hint::HintBundle;
//! use vc_resolve::resolver::{HintResolver, Resolver, ResolverExt};
//! use vc_resolve::value::TypeTag;
//!
//! struct Id(u64);
//!
//! let mut plugins = Bootstrap::begin();
//! plugins.contribute_with("plugins", |r| {
//!     r.insert(HintBundle::of::<Id>().constructor("", &[], |_| Ok(Id(7))));
//! });
//!
//! let stack = HintResolver::new(Bootstrap::begin().seal())
//!     .or_fallback(HintResolver::new(plugins.seal()));
//!
//! let id = stack.construct(TypeTag::of::<Id>(), "", &mut Arguments::new());
//! assert_eq!(id.handled().unwrap().take::<Id>().ok().unwrap().0, 7);
//! ```

use alloc::boxed::Box;
use alloc::sync::Arc;

use crate::args::Arguments;
use crate::outcome::Outcome;
use crate::value::{Instance, InstanceMut, TypeTag, Value};

// -----------------------------------------------------------------------------
// Modules

mod fallback;
mod hinted;
#[cfg(feature = "reflect")]
mod reflective;

// -----------------------------------------------------------------------------
// Exports

pub use fallback::Fallback;
pub use hinted::HintResolver;
#[cfg(feature = "reflect")]
pub use reflective::ReflectiveResolver;

// -----------------------------------------------------------------------------
// Resolver

/// Performs the four operations of the resolution contract.
///
/// An implementation returning [`Outcome::NotApplicable`] must leave `args`
/// and `value` as it received them. Once it attempts a request, it may
/// consume them.
pub trait Resolver: Send + Sync {
    /// Creates a `target` with the constructor `name`, `""` for the unnamed one.
    fn construct(&self, target: TypeTag, name: &str, args: &mut Arguments) -> Outcome<Value>;

    /// Calls the method `name` on `instance`.
    fn invoke(
        &self,
        instance: &mut InstanceMut<'_>,
        name: &str,
        args: &mut Arguments,
    ) -> Outcome<Option<Value>>;

    /// Reads the field `name` of `instance`.
    fn get_field(&self, instance: Instance<'_>, name: &str) -> Outcome<Option<Value>>;

    /// Writes `value` to the field `name` of `instance`.
    fn set_field(
        &self,
        instance: &mut InstanceMut<'_>,
        name: &str,
        value: &mut Option<Value>,
    ) -> Outcome<()>;
}

macro_rules! impl_resolver_for_pointer {
    ($($ptr:ty),*) => {$(
        impl<R: Resolver + ?Sized> Resolver for $ptr {
            #[inline]
            fn construct(&self, target: TypeTag, name: &str, args: &mut Arguments) -> Outcome<Value> {
                (**self).construct(target, name, args)
            }

            #[inline]
            fn invoke(
                &self,
                instance: &mut InstanceMut<'_>,
                name: &str,
                args: &mut Arguments,
            ) -> Outcome<Option<Value>> {
                (**self).invoke(instance, name, args)
            }

            #[inline]
            fn get_field(&self, instance: Instance<'_>, name: &str) -> Outcome<Option<Value>> {
                (**self).get_field(instance, name)
            }

            #[inline]
            fn set_field(
                &self,
                instance: &mut InstanceMut<'_>,
                name: &str,
                value: &mut Option<Value>,
            ) -> Outcome<()> {
                (**self).set_field(instance, name, value)
            }
        }
    )*};
}

impl_resolver_for_pointer!(&R, Box<R>, Arc<R>);

// -----------------------------------------------------------------------------
// ResolverExt

/// Composition helpers for every [`Resolver`].
pub trait ResolverExt: Resolver + Sized {
    /// Consults `secondary` whenever `self` is not applicable.
    #[inline]
    fn or_fallback<S: Resolver>(self, secondary: S) -> Fallback<Self, S> {
        Fallback::new(self, secondary)
    }
}

impl<R: Resolver> ResolverExt for R {}

// -----------------------------------------------------------------------------
// Tests
