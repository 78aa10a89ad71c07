// -----------------------------------------------------------------------------
// Modules

mod contributor;
mod introspect;
mod methods;

// -----------------------------------------------------------------------------
// Internal API

pub(crate) use contributor::impl_contributor;
pub(crate) use introspect::impl_introspect;
pub(crate) use methods::impl_introspect_methods;
