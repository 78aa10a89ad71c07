//! See following macros:
//!
//! - [`Introspect`]
//! - [`introspect_methods`]
//! - [`HintContributor`]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, ItemImpl, parse_macro_input};

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod impls;
mod path;

// -----------------------------------------------------------------------------
// Macros

/// # Introspection tables
///
/// `#[derive(Introspect)]` implements `Introspect` for a non-generic struct.
/// The generated table describes:
///
/// - every field not marked `skip`, readable through a clone and writable
///   unless marked `readonly`. Such fields must be `Clone`; mark the others
///   `skip`;
/// - the field-literal constructor `""`, whose parameters are the field
///   names (`"0"`, `"1"`, ... for tuple structs).
///
/// With the `auto_register` feature the table is discoverable without any
/// registration step.
///
/// ## Field attributes
///
/// ```rust, ignore
/// #[derive(Introspect)]
/// struct Sensor {
///     #[introspect(readonly)]
///     id: u64,
///     #[introspect(skip)]
///     cache: Vec<f64>,
///     reading: f64,
/// }
/// ```
///
/// - `readonly`: writes fail with `Immutable`.
/// - `skip`: not described; the field-literal constructor fills it with
///   `Default::default()`.
///
/// ## Type attributes
///
/// - `methods`: the table also takes the constructors and methods of an
///   `#[introspect_methods]` block of the same type.
/// - `constructor = false`: no field-literal constructor is generated.
///
/// ```rust, ignore
/// #[derive(Introspect)]
/// #[introspect(methods, constructor = false)]
/// struct Handle(u32);
///
/// #[introspect_methods]
/// impl Handle {
///     fn open() -> Self { Handle(0) }
/// }
/// ```
#[proc_macro_derive(Introspect, attributes(introspect))]
pub fn derive_introspect(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let impls = match impls::impl_introspect(&ast) {
        Ok(val) => val,
        Err(err) => return err.into_compile_error().into(),
    };

    TokenStream::from(quote! {
        const _: () = {
            #impls
        };
    })
}

/// # Method tables
///
/// Describes the functions of a non-generic inherent `impl` block for
/// `#[derive(Introspect)]` with `#[introspect(methods)]`.
///
/// | signature                                  | described as        |
/// |--------------------------------------------|---------------------|
/// | `fn f(...) -> Self` or `-> Result<Self, E>` | constructor `f`     |
/// | `fn f(&self, ...)`                         | method              |
/// | `fn f(&mut self, ...)`                     | method              |
/// | `fn f(...)`, other returns                 | static method       |
///
/// A `&self` method without parameters is also a getter of the field `f`,
/// a `&mut self` method `set_f` with one parameter its setter.
/// `Err` values are reported as host errors.
///
/// ## Attributes
///
/// - `#[introspect(skip)]`: the function is not described.
/// - `#[introspect(rename = "name")]`: described under another name.
///   `rename = ""` makes a constructor the unnamed one.
///
/// Parameters and return values are passed by value. Functions taking
/// `self` by value or borrowing non-`'static` data must be skipped.
///
/// ```rust, ignore
/// #[introspect_methods]
/// impl Sensor {
///     #[introspect(rename = "")]
///     fn new(id: u64) -> Self { /* ... */ }
///
///     fn calibrate(&mut self, offset: f64) -> Result<(), CalibrationError> { /* ... */ }
///
///     #[introspect(skip)]
///     fn cache(&self) -> &[f64] { &self.cache }
/// }
/// ```
#[proc_macro_attribute]
pub fn introspect_methods(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        let attr = proc_macro2::TokenStream::from(attr);
        return syn::Error::new_spanned(attr, "`introspect_methods` takes no arguments")
            .into_compile_error()
            .into();
    }

    let item = parse_macro_input!(item as ItemImpl);

    match impls::impl_introspect_methods(item) {
        Ok(val) => val.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

/// # Discoverable contributors
///
/// `#[derive(HintContributor)]` submits the type for
/// `Bootstrap::discover` when the `auto_register` feature is enabled.
/// The type implements `HintContributor` itself.
///
/// It is instantiated with `Default`, or with a fallible constructor:
///
/// ```rust, ignore
/// #[derive(HintContributor)]
/// #[contributor(priority = 10, try_new = NetworkHints::load)]
/// struct NetworkHints { /* ... */ }
///
/// impl NetworkHints {
///     fn load() -> Result<Self, std::io::Error> { /* ... */ }
/// }
/// ```
///
/// Contributors run by ascending priority (default `0`), then by name.
/// The name is the type path, as in `my_crate::hints::NetworkHints`.
#[proc_macro_derive(HintContributor, attributes(contributor))]
pub fn derive_hint_contributor(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let impls = match impls::impl_contributor(&ast) {
        Ok(val) => val,
        Err(err) => return err.into_compile_error().into(),
    };

    TokenStream::from(quote! {
        const _: () = {
            #impls
        };
    })
}
