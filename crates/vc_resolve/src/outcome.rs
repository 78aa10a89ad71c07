use crate::error::ResolveError;

// -----------------------------------------------------------------------------
// Outcome

/// The answer of a backend to a resolution request.
///
/// - `Handled`: the request was served.
/// - `Failed`: the request was attempted and failed. This is final.
/// - `NotApplicable`: the backend cannot attempt this request at all,
///   another backend may.
///
/// A backend returning `NotApplicable` must leave the request's arguments
/// and value untouched, so the next backend receives them complete.
///
/// # Examples
///
/// ```
/// use vc_resolve::Outcome;
///
/// let declined: Outcome<i32> = Outcome::NotApplicable;
/// assert!(matches!(declined.or_else(|| Outcome::Handled(2)), Outcome::Handled(2)));
///
/// // Only `NotApplicable` falls through.
/// let served = Outcome::Handled(1);
/// assert!(matches!(served.or_else(|| Outcome::Handled(2)), Outcome::Handled(1)));
/// ```
#[derive(Debug)]
#[must_use]
pub enum Outcome<T> {
    Handled(T),
    Failed(ResolveError),
    NotApplicable,
}

impl<T> Outcome<T> {
    #[inline]
    pub const fn is_handled(&self) -> bool {
        matches!(self, Self::Handled(_))
    }

    #[inline]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    #[inline]
    pub const fn is_not_applicable(&self) -> bool {
        matches!(self, Self::NotApplicable)
    }

    /// Maps a handled value.
    #[inline]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Handled(value) => Outcome::Handled(f(value)),
            Self::Failed(err) => Outcome::Failed(err),
            Self::NotApplicable => Outcome::NotApplicable,
        }
    }

    /// Calls `f` if and only if `self` is `NotApplicable`.
    #[inline]
    pub fn or_else(self, f: impl FnOnce() -> Self) -> Self {
        match self {
            Self::NotApplicable => f(),
            other => other,
        }
    }

    /// Converts into a [`Result`], `NotApplicable` becomes the error of `f`.
    #[inline]
    pub fn into_result(self, f: impl FnOnce() -> ResolveError) -> Result<T, ResolveError> {
        match self {
            Self::Handled(value) => Ok(value),
            Self::Failed(err) => Err(err),
            Self::NotApplicable => Err(f()),
        }
    }

    /// Returns the handled value, if any.
    #[inline]
    pub fn handled(self) -> Option<T> {
        match self {
            Self::Handled(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the failure, if any.
    #[inline]
    pub fn failure(self) -> Option<ResolveError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl<T> From<Result<T, ResolveError>> for Outcome<T> {
    #[inline]
    fn from(value: Result<T, ResolveError>) -> Self {
        match value {
            Ok(value) => Self::Handled(value),
            Err(err) => Self::Failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Outcome;
    use crate::error::{MemberError, Operation, ResolveError, Site};
    use crate::value::TypeTag;

    fn failure() -> ResolveError {
        let site = Site::new(Operation::Invoke, TypeTag::of::<u8>(), "m");
        ResolveError::failed(site, MemberError::no_method())
    }

    #[test]
    fn failure_does_not_fall_through() {
        let mut called = false;
        let out: Outcome<()> = Outcome::Failed(failure()).or_else(|| {
            called = true;
            Outcome::Handled(())
        });
        assert!(!called);
        assert!(out.is_failed());
    }

    #[test]
    fn into_result_maps_not_applicable() {
        let out: Outcome<u8> = Outcome::NotApplicable;
        let err = out.into_result(failure).unwrap_err();
        assert_eq!(err.site().member, "m");

        let out: Outcome<u8> = Ok(3).into();
        assert_eq!(out.map(|v| v * 2).handled(), Some(6));
    }
}
