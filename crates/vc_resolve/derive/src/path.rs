//! Paths into `vc_resolve` used by the generated code.
//!
//! Everything generated goes through `__macro_exports`, so the public
//! layout of `vc_resolve` can change without touching the macros.

use proc_macro2::TokenStream;
use quote::quote;

/// Get the correct access path to the `vc_resolve` crate.
///
/// 1. For crates that depend on `vc_resolve`, `::vc_resolve` is returned.
/// 2. For crates that depend on `vc_dynamic`, `::vc_dynamic::resolve` is returned.
/// 3. Renamed dependencies are returned under their new name.
/// 4. Otherwise `::vc_resolve` is returned, which may be incorrect.
///
/// Reading the manifest is relatively expensive, so the path is resolved
/// once per macro invocation and passed around.
pub(crate) fn vc_resolve() -> syn::Path {
    vc_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("vc_resolve"))
}

#[inline(always)]
pub(crate) fn macro_exports_(vc_resolve_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_resolve_path::__macro_exports
    }
}
