#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Extern Self

// Generated code refers to `::vc_resolve`, which must also work inside this crate.
extern crate self as vc_resolve;

// -----------------------------------------------------------------------------
// no_std support

#[cfg(any(feature = "std", test))]
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod key_map;
mod outcome;
mod resolution;

pub mod args;
pub mod bootstrap;
pub mod hint;
pub mod introspect;
pub mod resolver;
pub mod value;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use error::{ArgumentError, HostError, MemberError, MemberKind};
pub use error::{Operation, ResolveError, Site};
pub use outcome::Outcome;
pub use resolution::{Regime, Resolution};
pub use vc_resolve_derive as derive;
