use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::attributes::ContributorAttributes;

/// Submits a `ContributorEntry` for the type.
///
/// ```ignore
/// submit_contributor! {
///     ContributorEntry::new("path::to::Foo", priority, default_contributor::<Foo>)
/// }
/// ```
///
/// The type implements `HintContributor` itself; the derive only
/// registers it for discovery.
pub(crate) fn impl_contributor(ast: &DeriveInput) -> syn::Result<TokenStream> {
    if !ast.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &ast.generics,
            "generic contributors cannot be discovered",
        ));
    }

    let attrs = ContributorAttributes::parse_attrs(&ast.attrs)?;
    let vc_resolve_path = crate::path::vc_resolve();
    let mx = crate::path::macro_exports_(&vc_resolve_path);
    let ident = &ast.ident;

    let priority = match &attrs.priority {
        Some(priority) => quote! { #priority },
        None => quote! { 0 },
    };
    let create = match &attrs.try_new {
        Some(try_new) => quote! { || #mx::boxed_contributor(#try_new()) },
        None => quote! { #mx::default_contributor::<#ident> },
    };

    Ok(quote! {
        #mx::submit_contributor! {
            #mx::ContributorEntry::new(
                ::core::concat!(::core::module_path!(), "::", ::core::stringify!(#ident)),
                #priority,
                #create,
            )
        }
    })
}
