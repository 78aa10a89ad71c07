//! Statically registered hints.
//!
//! ## Menu
//!
//! - [`HintBundle`]: callables serving one type, with four optional slots.
//! - [`TypedHintBundle`]: a bundle builder whose slots receive `&T` / `&mut T`.
//! - [`HintRegistrar`]: write access during bootstrap.
//! - [`HintRegistry`]: the sealed, read-only table.
//!
//! Bundles are written by [`HintContributor`]s while a [`Bootstrap`] runs.
//! After [`Bootstrap::seal`] the table no longer changes.
//!
//! [`HintContributor`]: crate::bootstrap::HintContributor
//! [`Bootstrap`]: crate::bootstrap::Bootstrap
//! [`Bootstrap::seal`]: crate::bootstrap::Bootstrap::seal

// -----------------------------------------------------------------------------
// Modules

mod bundle;
mod registry;

// -----------------------------------------------------------------------------
// Exports

pub use bundle::{ConstructorHint, HintBundle, TypedHintBundle};
pub use registry::{HintRegistrar, HintRegistry};

pub(crate) use registry::Entry;
