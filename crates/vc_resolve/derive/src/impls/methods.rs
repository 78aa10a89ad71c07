use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{
    FnArg, GenericArgument, ImplItem, ImplItemFn, ItemImpl, Pat, PathArguments, ReturnType, Type,
};

use crate::attributes::MethodAttributes;

/// How a described function is called.
enum Receiver {
    Ref,
    Mut,
    Static,
    Constructor,
}

/// What a described function returns.
enum Returns {
    Unit,
    Value,
    Result { unit: bool },
}

struct MethodData {
    name: String,
    receiver: Receiver,
    returns: Returns,
    ident: syn::Ident,
    params: Vec<String>,
    param_types: Vec<Type>,
}

/// Expands `#[introspect_methods]` on an inherent `impl` block.
///
/// The block is emitted unchanged apart from the removed `introspect`
/// attributes, followed by:
///
/// ```ignore
/// impl Foo {
///     const __INTROSPECT_CONSTRUCTORS: &'static [ConstructorInfo] = &[/* ... */];
///     const __INTROSPECT_METHODS: &'static [MethodInfo] = &[/* ... */];
/// }
/// ```
///
/// which `#[derive(Introspect)]` with `#[introspect(methods)]` picks up.
pub(crate) fn impl_introspect_methods(mut item: ItemImpl) -> syn::Result<TokenStream> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "`introspect_methods` only applies to inherent impl blocks",
        ));
    }
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "`introspect_methods` does not support generic impl blocks",
        ));
    }
    let self_ident = self_ident(&item.self_ty)?;

    let mut methods = Vec::new();
    for impl_item in &mut item.items {
        let ImplItem::Fn(func) = impl_item else {
            continue;
        };
        let attrs = MethodAttributes::take_attrs(&mut func.attrs)?;
        if attrs.skip {
            continue;
        }
        let name = match &attrs.rename {
            Some(rename) => rename.value(),
            None => func.sig.ident.unraw().to_string(),
        };
        methods.push(parse_method(func, &self_ident, name)?);
    }

    let vc_resolve_path = crate::path::vc_resolve();
    let mx = crate::path::macro_exports_(&vc_resolve_path);
    let self_ty = &item.self_ty;

    let constructors = methods
        .iter()
        .filter(|method| matches!(method.receiver, Receiver::Constructor))
        .map(|method| constructor_info(&mx, self_ty, method));
    let method_infos = methods
        .iter()
        .filter(|method| !matches!(method.receiver, Receiver::Constructor))
        .map(|method| method_info(&mx, self_ty, method));

    Ok(quote! {
        #item

        impl #self_ty {
            #[doc(hidden)]
            #[allow(dead_code)]
            pub(crate) const __INTROSPECT_CONSTRUCTORS: &'static [#mx::ConstructorInfo] = &[#(#constructors),*];
            #[doc(hidden)]
            #[allow(dead_code)]
            pub(crate) const __INTROSPECT_METHODS: &'static [#mx::MethodInfo] = &[#(#method_infos),*];
        }
    })
}

fn self_ident(self_ty: &Type) -> syn::Result<syn::Ident> {
    if let Type::Path(path) = self_ty
        && path.qself.is_none()
        && let Some(segment) = path.path.segments.last()
        && segment.arguments.is_empty()
    {
        return Ok(segment.ident.clone());
    }
    Err(syn::Error::new_spanned(
        self_ty,
        "`introspect_methods` expects a plain, non-generic type",
    ))
}

fn parse_method(func: &ImplItemFn, self_ident: &syn::Ident, name: String) -> syn::Result<MethodData> {
    let sig = &func.sig;
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "generic functions cannot be introspected, use `#[introspect(skip)]`",
        ));
    }
    if let Some(token) = &sig.asyncness {
        return Err(syn::Error::new(token.span, "async functions cannot be introspected"));
    }
    if let Some(token) = &sig.unsafety {
        return Err(syn::Error::new(token.span, "unsafe functions cannot be introspected"));
    }

    let mut receiver = None;
    let mut params = Vec::new();
    let mut param_types = Vec::new();
    for input in &sig.inputs {
        match input {
            FnArg::Receiver(recv) => {
                receiver = Some(match (&recv.reference, &recv.mutability) {
                    (Some(_), None) => Receiver::Ref,
                    (Some(_), Some(_)) => Receiver::Mut,
                    (None, _) => {
                        return Err(syn::Error::new(
                            recv.span(),
                            "methods taking `self` by value cannot be introspected",
                        ));
                    }
                });
            }
            FnArg::Typed(typed) => {
                let Pat::Ident(pat) = &*typed.pat else {
                    return Err(syn::Error::new_spanned(
                        &typed.pat,
                        "introspected parameters must be plain identifiers",
                    ));
                };
                require_static(&typed.ty, "parameter")?;
                params.push(pat.ident.unraw().to_string());
                param_types.push((*typed.ty).clone());
            }
        }
    }

    let (returns, constructs) = match &sig.output {
        ReturnType::Default => (Returns::Unit, false),
        ReturnType::Type(_, ty) => {
            require_static(ty, "return type")?;
            match result_ok_type(ty) {
                Some(ok) => (
                    Returns::Result {
                        unit: is_unit(ok),
                    },
                    is_self(ok, self_ident),
                ),
                None if is_unit(ty) => (Returns::Unit, false),
                None => (Returns::Value, is_self(ty, self_ident)),
            }
        }
    };

    let receiver = match receiver {
        Some(receiver) => receiver,
        None if constructs => Receiver::Constructor,
        None => Receiver::Static,
    };

    Ok(MethodData {
        name,
        receiver,
        returns,
        ident: sig.ident.clone(),
        params,
        param_types,
    })
}

/// Rejects references that are not `'static`.
fn require_static(ty: &Type, what: &str) -> syn::Result<()> {
    match ty {
        Type::Reference(reference) => match &reference.lifetime {
            Some(lifetime) if lifetime.ident == "static" => require_static(&reference.elem, what),
            _ => Err(syn::Error::new_spanned(
                ty,
                format!("a borrowed {what} cannot be introspected, use `#[introspect(skip)]`"),
            )),
        },
        Type::Paren(paren) => require_static(&paren.elem, what),
        Type::Group(group) => require_static(&group.elem, what),
        _ => Ok(()),
    }
}

fn is_unit(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(tuple) if tuple.elems.is_empty())
}

fn is_self(ty: &Type, self_ident: &syn::Ident) -> bool {
    match ty {
        Type::Path(path) if path.qself.is_none() => {
            path.path.is_ident("Self") || path.path.is_ident(self_ident)
        }
        _ => false,
    }
}

/// The `T` of `Result<T, _>`, matched by name.
fn result_ok_type(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

// -----------------------------------------------------------------------------
// Generation

fn args_pattern(method: &MethodData) -> TokenStream {
    if method.params.is_empty() {
        quote! { __args }
    } else {
        quote! { mut __args }
    }
}

/// `let __arg0 = __args.take::<T0>("p0")?; ...` and `__arg0, ...`.
fn take_arguments(method: &MethodData) -> (TokenStream, Vec<syn::Ident>) {
    let idents: Vec<_> = (0..method.params.len())
        .map(|index| format_ident!("__arg{}", index))
        .collect();
    let takes = idents
        .iter()
        .zip(&method.params)
        .zip(&method.param_types)
        .map(|((ident, name), ty)| quote! { let #ident = __args.take::<#ty>(#name)?; });
    (quote! { #(#takes)* }, idents)
}

fn constructor_info(mx: &TokenStream, self_ty: &Type, method: &MethodData) -> TokenStream {
    let MethodData {
        name, ident, params, ..
    } = method;
    let args = args_pattern(method);
    let (takes, arg_idents) = take_arguments(method);

    let body = match method.returns {
        Returns::Result { .. } => quote! {
            match <#self_ty>::#ident(#(#arg_idents),*) {
                ::core::result::Result::Ok(value) => ::core::result::Result::Ok(#mx::erase(value)),
                ::core::result::Result::Err(err) => ::core::result::Result::Err(#mx::host(err)),
            }
        },
        _ => quote! {
            ::core::result::Result::Ok(#mx::erase(<#self_ty>::#ident(#(#arg_idents),*)))
        },
    };

    quote! {
        #mx::ConstructorInfo::new(
            #name,
            &[#(#params),*],
            |#args: #mx::BoundArguments| -> ::core::result::Result<#mx::Value, #mx::MemberError> {
                #takes
                #body
            },
        )
    }
}

fn method_info(mx: &TokenStream, self_ty: &Type, method: &MethodData) -> TokenStream {
    let MethodData {
        name, ident, params, ..
    } = method;
    let args = args_pattern(method);
    let (takes, arg_idents) = take_arguments(method);

    let (this_param, this_arg, downcast) = match method.receiver {
        Receiver::Ref => (
            quote! { __this: &dyn ::core::any::Any, },
            quote! { __this, },
            quote! { let __this = #mx::downcast_ref::<#self_ty>(__this)?; },
        ),
        Receiver::Mut => (
            quote! { __this: &mut dyn ::core::any::Any, },
            quote! { __this, },
            quote! { let __this = #mx::downcast_mut::<#self_ty>(__this)?; },
        ),
        Receiver::Static | Receiver::Constructor => (quote! {}, quote! {}, quote! {}),
    };
    let call = quote! { <#self_ty>::#ident(#this_arg #(#arg_idents),*) };

    let (returns, body) = match method.returns {
        Returns::Unit => (
            false,
            quote! {
                #call;
                ::core::result::Result::Ok(::core::option::Option::None)
            },
        ),
        Returns::Value => (
            true,
            quote! {
                ::core::result::Result::Ok(::core::option::Option::Some(#mx::erase(#call)))
            },
        ),
        Returns::Result { unit: true } => (
            false,
            quote! {
                match #call {
                    ::core::result::Result::Ok(()) => ::core::result::Result::Ok(::core::option::Option::None),
                    ::core::result::Result::Err(err) => ::core::result::Result::Err(#mx::host(err)),
                }
            },
        ),
        Returns::Result { unit: false } => (
            true,
            quote! {
                match #call {
                    ::core::result::Result::Ok(value) => {
                        ::core::result::Result::Ok(::core::option::Option::Some(#mx::erase(value)))
                    }
                    ::core::result::Result::Err(err) => ::core::result::Result::Err(#mx::host(err)),
                }
            },
        ),
    };

    let variant = match method.receiver {
        Receiver::Ref => quote! { Ref },
        Receiver::Mut => quote! { Mut },
        Receiver::Static | Receiver::Constructor => quote! { Static },
    };

    quote! {
        #mx::MethodInfo::new(
            #name,
            &[#(#params),*],
            #returns,
            #mx::MethodCall::#variant(
                |#this_param #args: #mx::BoundArguments|
                -> ::core::result::Result<::core::option::Option<#mx::Value>, #mx::MemberError> {
                    #downcast
                    #takes
                    #body
                },
            ),
        )
    }
}
