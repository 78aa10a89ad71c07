use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Index, Member, Type};

use crate::attributes::{FieldAttributes, TypeAttributes};

struct FieldData<'a> {
    member: Member,
    name: String,
    ty: &'a Type,
    attrs: FieldAttributes,
}

fn collect_fields(fields: &Fields) -> syn::Result<Vec<FieldData<'_>>> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let (member, name) = match &field.ident {
                Some(ident) => (Member::Named(ident.clone()), ident.unraw().to_string()),
                None => (Member::Unnamed(Index::from(index)), index.to_string()),
            };
            Ok(FieldData {
                member,
                name,
                ty: &field.ty,
                attrs: FieldAttributes::parse_attrs(&field.attrs)?,
            })
        })
        .collect()
}

/// Generates `impl Introspect` for a struct.
///
/// ```ignore
/// impl Introspect for Foo {
///     fn introspection() -> &'static TypeIntrospection {
///         static CONSTRUCTORS: [ConstructorInfo; _] = /* field literal (+ impl block) */;
///         static FIELDS: [FieldInfo; _] = /* ... */;
///         static METHODS: &[MethodInfo] = /* impl block or empty */;
///         static TABLE: TypeIntrospection = /* ... */;
///         &TABLE
///     }
/// }
/// ```
pub(crate) fn impl_introspect(ast: &DeriveInput) -> syn::Result<TokenStream> {
    let Data::Struct(data) = &ast.data else {
        return Err(syn::Error::new(
            ast.ident.span(),
            "`Introspect` can only be derived for structs",
        ));
    };
    if !ast.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &ast.generics,
            "`Introspect` cannot be derived for generic types, their tables are not static",
        ));
    }

    let attrs = TypeAttributes::parse_attrs(&ast.attrs)?;
    let fields = collect_fields(&data.fields)?;

    let vc_resolve_path = crate::path::vc_resolve();
    let mx = crate::path::macro_exports_(&vc_resolve_path);
    let ident = &ast.ident;

    let field_infos: Vec<TokenStream> = fields
        .iter()
        .filter(|field| !field.attrs.skip)
        .map(|field| {
            let FieldData {
                member, name, ty, ..
            } = field;
            let get = quote! {
                |__this: &dyn ::core::any::Any| -> ::core::result::Result<#mx::Value, #mx::MemberError> {
                    let __this = #mx::downcast_ref::<#ident>(__this)?;
                    ::core::result::Result::Ok(#mx::erase(::core::clone::Clone::clone(&__this.#member)))
                }
            };
            if field.attrs.readonly {
                quote! { #mx::FieldInfo::readonly(#name, #get) }
            } else {
                quote! {
                    #mx::FieldInfo::new(
                        #name,
                        #get,
                        |__this: &mut dyn ::core::any::Any,
                         __value: ::core::option::Option<#mx::Value>|
                         -> ::core::result::Result<(), #mx::MemberError> {
                            let __this = #mx::downcast_mut::<#ident>(__this)?;
                            __this.#member = #mx::expect_value::<#ty>(__value)?;
                            ::core::result::Result::Ok(())
                        },
                    )
                }
            }
        })
        .collect();

    let field_constructor = attrs
        .constructor
        .then(|| field_literal_constructor(&mx, ident, &fields));
    let field_constructor = field_constructor.iter();

    let (constructors, methods) = if attrs.methods.is_some() {
        (
            quote! {
                const FIELD_CONSTRUCTORS: &[#mx::ConstructorInfo] = &[#(#field_constructor),*];
                const CONSTRUCTORS_LEN: usize =
                    FIELD_CONSTRUCTORS.len() + #ident::__INTROSPECT_CONSTRUCTORS.len();
                static CONSTRUCTORS: [#mx::ConstructorInfo; CONSTRUCTORS_LEN] = #mx::concat(
                    #mx::PLACEHOLDER_CONSTRUCTOR,
                    FIELD_CONSTRUCTORS,
                    #ident::__INTROSPECT_CONSTRUCTORS,
                );
            },
            quote! { #ident::__INTROSPECT_METHODS },
        )
    } else {
        let len = usize::from(attrs.constructor);
        (
            quote! {
                static CONSTRUCTORS: [#mx::ConstructorInfo; #len] = [#(#field_constructor),*];
            },
            quote! { &[] },
        )
    };

    let fields_len = field_infos.len();

    Ok(quote! {
        impl #mx::Introspect for #ident {
            fn introspection() -> &'static #mx::TypeIntrospection {
                #constructors
                static FIELDS: [#mx::FieldInfo; #fields_len] = [#(#field_infos),*];
                static METHODS: &[#mx::MethodInfo] = #methods;
                static TABLE: #mx::TypeIntrospection = #mx::TypeIntrospection::new(
                    #mx::TypeTag::of::<#ident>,
                    &CONSTRUCTORS,
                    &FIELDS,
                    METHODS,
                );
                &TABLE
            }
        }

        #mx::submit_introspection!(#ident);
    })
}

/// The constructor `""` taking every described field by name.
fn field_literal_constructor(
    mx: &TokenStream,
    ident: &syn::Ident,
    fields: &[FieldData<'_>],
) -> TokenStream {
    let params = fields
        .iter()
        .filter(|field| !field.attrs.skip)
        .map(|field| &field.name);

    let inits = fields.iter().map(|field| {
        let FieldData {
            member, name, ty, ..
        } = field;
        if field.attrs.skip {
            quote! { #member: ::core::default::Default::default() }
        } else {
            quote! { #member: __args.take::<#ty>(#name)? }
        }
    });

    let args = if fields.iter().all(|field| field.attrs.skip) {
        quote! { __args }
    } else {
        quote! { mut __args }
    };

    quote! {
        #mx::ConstructorInfo::new(
            "",
            &[#(#params),*],
            |#args: #mx::BoundArguments| -> ::core::result::Result<#mx::Value, #mx::MemberError> {
                ::core::result::Result::Ok(#mx::erase(#ident { #(#inits),* }))
            },
        )
    }
}
