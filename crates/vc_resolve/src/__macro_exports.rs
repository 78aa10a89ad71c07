//! Items used by the code generated by `vc_resolve_derive`.

use alloc::boxed::Box;
use core::any::{Any, type_name};
use core::error::Error;

use crate::bootstrap::HintContributor;

pub use crate::args::BoundArguments;
pub use crate::bootstrap::ContributorEntry;
pub use crate::error::{ArgumentError, HostError, MemberError};
pub use crate::introspect::{ConstructorInfo, FieldInfo, Introspect, IntrospectionEntry};
pub use crate::introspect::{MethodCall, MethodInfo, TypeIntrospection};
pub use crate::value::{TypeTag, Value};
pub use crate::{__submit_contributor as submit_contributor, __submit_introspection as submit_introspection};

#[cfg(feature = "auto_register")]
pub use inventory;

// -----------------------------------------------------------------------------
// Registration

/// Submits the introspection table of a type for discovery.
#[cfg(feature = "auto_register")]
#[doc(hidden)]
#[macro_export]
macro_rules! __submit_introspection {
    ($ty:ty) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::__macro_exports::IntrospectionEntry(
                <$ty as $crate::__macro_exports::Introspect>::introspection
            )
        }
    };
}

#[cfg(not(feature = "auto_register"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __submit_introspection {
    ($ty:ty) => {};
}

/// Submits a contributor entry for discovery.
#[cfg(feature = "auto_register")]
#[doc(hidden)]
#[macro_export]
macro_rules! __submit_contributor {
    ($entry:expr) => {
        $crate::__macro_exports::inventory::submit! { $entry }
    };
}

#[cfg(not(feature = "auto_register"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __submit_contributor {
    ($entry:expr) => {};
}

/// Instantiates a `Default` contributor.
pub fn default_contributor<T: HintContributor + Default + 'static>()
-> Result<Box<dyn HintContributor>, HostError> {
    Ok(Box::new(T::default()))
}

/// Boxes the result of a fallible contributor constructor.
pub fn boxed_contributor<T, E>(result: Result<T, E>) -> Result<Box<dyn HintContributor>, HostError>
where
    T: HintContributor + 'static,
    E: Error + Send + Sync + 'static,
{
    match result {
        Ok(contributor) => Ok(Box::new(contributor)),
        Err(err) => Err(into_host(err)),
    }
}

// A `HostError` is passed on as is instead of being wrapped again.
fn into_host<E: Error + Send + Sync + 'static>(err: E) -> HostError {
    let mut slot = Some(err);
    if let Some(host) = (&mut slot as &mut dyn Any).downcast_mut::<Option<HostError>>()
        && let Some(host) = host.take()
    {
        return host;
    }
    match slot {
        Some(err) => HostError::new(err),
        None => unreachable!("`slot` is only emptied on return"),
    }
}

// -----------------------------------------------------------------------------
// Member bodies

#[inline]
pub fn downcast_ref<T: Any>(this: &dyn Any) -> Result<&T, MemberError> {
    this.downcast_ref::<T>().ok_or(MemberError::TypeMismatch {
        expected: type_name::<T>(),
        found: "another type",
    })
}

#[inline]
pub fn downcast_mut<T: Any>(this: &mut dyn Any) -> Result<&mut T, MemberError> {
    this.downcast_mut::<T>().ok_or(MemberError::TypeMismatch {
        expected: type_name::<T>(),
        found: "another type",
    })
}

/// Unwraps the value written to a field.
pub fn expect_value<T: Any>(value: Option<Value>) -> Result<T, MemberError> {
    match value {
        Some(value) => value.take::<T>().map_err(|value| MemberError::TypeMismatch {
            expected: type_name::<T>(),
            found: value.type_name(),
        }),
        None => Err(MemberError::TypeMismatch {
            expected: type_name::<T>(),
            found: "nothing",
        }),
    }
}

/// Erases a member's return value.
#[inline]
pub fn erase<T: Any + Send + Sync>(value: T) -> Value {
    Value::new(value)
}

/// Wraps an error returned by a member body.
#[inline]
pub fn host<E: Error + Send + Sync + 'static>(err: E) -> MemberError {
    MemberError::Host(into_host(err))
}

/// Concatenates two constant slices into an array of length `N`.
///
/// `fill` is only used to initialise the array.
pub const fn concat<T: Copy, const N: usize>(fill: T, head: &[T], tail: &[T]) -> [T; N] {
    assert!(head.len() + tail.len() == N, "length mismatch");
    let mut out = [fill; N];
    let mut i = 0;
    while i < head.len() {
        out[i] = head[i];
        i += 1;
    }
    let mut j = 0;
    while j < tail.len() {
        out[head.len() + j] = tail[j];
        j += 1;
    }
    out
}

/// The `fill` constructor of [`concat`].
pub const PLACEHOLDER_CONSTRUCTOR: ConstructorInfo =
    ConstructorInfo::new("", &[], |_| Err(MemberError::no_constructor()));
