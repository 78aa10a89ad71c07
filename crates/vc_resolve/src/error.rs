use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use core::{error, fmt};

use thiserror::Error;

use crate::value::TypeTag;

// -----------------------------------------------------------------------------
// Operation & Site

/// The four operations of the resolution contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Construct,
    Invoke,
    GetField,
    SetField,
}

impl Operation {
    /// The kind of member this operation addresses.
    pub const fn member_kind(self) -> MemberKind {
        match self {
            Self::Construct => MemberKind::Constructor,
            Self::Invoke => MemberKind::Method,
            Self::GetField | Self::SetField => MemberKind::Field,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Construct => "construct",
            Self::Invoke => "invoke",
            Self::GetField => "get field",
            Self::SetField => "set field",
        })
    }
}

/// Where a resolution failed: operation, target type and member name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub operation: Operation,
    pub target: &'static str,
    pub member: String,
}

impl Site {
    #[inline]
    pub fn new(operation: Operation, target: TypeTag, member: &str) -> Self {
        Self {
            operation,
            target: target.name(),
            member: member.to_string(),
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            operation,
            target,
            member,
        } = self;
        if member.is_empty() {
            // The unnamed constructor.
            write!(f, "{operation} `{target}`")
        } else {
            write!(f, "{operation} `{target}::{member}`")
        }
    }
}

// -----------------------------------------------------------------------------
// MemberKind

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Constructor,
    Method,
    Field,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Constructor => "constructor",
            Self::Method => "method",
            Self::Field => "field",
        })
    }
}

// -----------------------------------------------------------------------------
// ArgumentError

/// An argument list did not fit the parameters of a member.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ArgumentError {
    #[error("expected at most {expected} positional arguments, found {found}")]
    TooManyPositional { expected: usize, found: usize },

    #[error("argument `{0}` was supplied both by position and by name")]
    Duplicate(Cow<'static, str>),

    #[error("unexpected named argument `{0}`")]
    UnexpectedNamed(String),

    #[error("missing argument `{0}`")]
    Missing(Cow<'static, str>),

    #[error("argument `{name}` expected `{expected}`, found `{found}`")]
    WrongType {
        name: Cow<'static, str>,
        expected: &'static str,
        found: &'static str,
    },

    #[error("`{0}` is not a declared parameter")]
    UnknownParameter(String),
}

// -----------------------------------------------------------------------------
// HostError

/// An error raised by the constructor, method or accessor body itself.
///
/// The original error is kept as is and can be recovered.
///
/// ```
/// use core::num::ParseIntError;
/// use vc_resolve::HostError;
///
/// let cause = "x".parse::<i32>().unwrap_err();
/// let err = HostError::new(cause.clone());
/// assert_eq!(err.to_string(), cause.to_string());
/// assert!(err.downcast_ref::<ParseIntError>().is_some());
/// ```
#[derive(Debug)]
pub struct HostError(Box<dyn error::Error + Send + Sync + 'static>);

impl HostError {
    #[inline]
    pub fn new<E: error::Error + Send + Sync + 'static>(error: E) -> Self {
        Self(Box::new(error))
    }

    /// Wraps an already boxed error without boxing it again.
    #[inline]
    pub fn from_boxed(error: Box<dyn error::Error + Send + Sync + 'static>) -> Self {
        Self(error)
    }

    /// An error carrying only a message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self::new(Message(message.to_string()))
    }

    #[inline]
    pub fn downcast_ref<E: error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    #[inline]
    pub fn into_inner(self) -> Box<dyn error::Error + Send + Sync + 'static> {
        self.0
    }

    #[inline]
    pub fn inner(&self) -> &(dyn error::Error + Send + Sync + 'static) {
        &*self.0
    }
}

impl fmt::Display for HostError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl error::Error for HostError {
    #[inline]
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.0.source()
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);

// -----------------------------------------------------------------------------
// MemberError

/// The failure of an attempted member access.
///
/// Returned by hint bodies and introspection tables,
/// which do not know the [`Site`] they are called for.
/// Resolvers attach it, producing a [`ResolveError`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MemberError {
    #[error("no such {0}")]
    NotFound(MemberKind),

    #[error(transparent)]
    Arguments(#[from] ArgumentError),

    #[error("member is immutable")]
    Immutable,

    #[error("expected a value of type `{expected}`, found `{found}`")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Host(#[from] HostError),
}

impl MemberError {
    /// Wraps an error of the member body.
    #[inline]
    pub fn host<E: error::Error + Send + Sync + 'static>(error: E) -> Self {
        Self::Host(HostError::new(error))
    }

    /// `NotFound(Constructor)`.
    #[inline]
    pub const fn no_constructor() -> Self {
        Self::NotFound(MemberKind::Constructor)
    }

    /// `NotFound(Method)`.
    #[inline]
    pub const fn no_method() -> Self {
        Self::NotFound(MemberKind::Method)
    }

    /// `NotFound(Field)`.
    #[inline]
    pub const fn no_field() -> Self {
        Self::NotFound(MemberKind::Field)
    }
}

// -----------------------------------------------------------------------------
// ResolveError

/// A final failure of a resolution request.
///
/// - [`Failed`](Self::Failed): a backend attempted the request and it failed,
///   either because the request was invalid or because the member body
///   raised a [`HostError`].
/// - [`Unresolvable`](Self::Unresolvable): every backend declined the request.
///   Only [`Resolution`](crate::Resolution) produces it.
#[derive(Debug)]
pub enum ResolveError {
    Failed { site: Site, error: MemberError },
    Unresolvable { site: Site },
}

impl ResolveError {
    #[inline]
    pub fn failed(site: Site, error: impl Into<MemberError>) -> Self {
        Self::Failed {
            site,
            error: error.into(),
        }
    }

    #[inline]
    pub const fn site(&self) -> &Site {
        match self {
            Self::Failed { site, .. } | Self::Unresolvable { site } => site,
        }
    }

    /// The member failure, if the request was attempted.
    #[inline]
    pub const fn member_error(&self) -> Option<&MemberError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            Self::Unresolvable { .. } => None,
        }
    }

    /// The error raised by the member body, if any.
    #[inline]
    pub fn host_error(&self) -> Option<&HostError> {
        match self.member_error() {
            Some(MemberError::Host(host)) => Some(host),
            _ => None,
        }
    }

    /// Takes the error raised by the member body, if any.
    pub fn into_host_error(self) -> Result<HostError, Self> {
        match self {
            Self::Failed {
                error: MemberError::Host(host),
                ..
            } => Ok(host),
            other => Err(other),
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { site, error } => write!(f, "failed to {site}: {error}"),
            Self::Unresolvable { site } => {
                write!(f, "failed to {site}: no resolver supports the request")
            }
        }
    }
}

impl error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.host_error() {
            Some(host) => Some(host.inner()),
            None => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use core::error::Error as _;

    use super::{ArgumentError, HostError, MemberError, Operation, ResolveError, Site};
    use crate::value::TypeTag;

    struct Shape;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn display_carries_context() {
        let site = Site::new(Operation::SetField, TypeTag::of::<Shape>(), "area");
        let err = ResolveError::failed(site, MemberError::Immutable);
        let text = err.to_string();
        assert!(text.contains("set field"));
        assert!(text.contains("Shape::area"));
        assert!(text.contains("immutable"));

        let site = Site::new(Operation::Construct, TypeTag::of::<Shape>(), "");
        let err = ResolveError::Unresolvable { site };
        assert!(err.to_string().ends_with("Shape`: no resolver supports the request"));
    }

    #[test]
    fn arguments_convert() {
        let err: MemberError = ArgumentError::Missing("x".into()).into();
        assert!(matches!(err, MemberError::Arguments(ArgumentError::Missing(_))));
        assert_eq!(err.to_string(), "missing argument `x`");
    }

    #[test]
    fn host_error_is_kept() {
        let site = Site::new(Operation::Invoke, TypeTag::of::<Shape>(), "explode");
        let err = ResolveError::failed(site, MemberError::host(Boom));
        assert!(err.host_error().is_some());
        assert_eq!(err.source().unwrap().to_string(), "boom");

        let host = err.into_host_error().unwrap();
        assert!(host.downcast_ref::<Boom>().is_some());
        assert!(HostError::msg("plain").downcast_ref::<Boom>().is_none());
    }
}
