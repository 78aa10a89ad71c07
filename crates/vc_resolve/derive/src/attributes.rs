//! Parsing of `#[introspect(...)]` and `#[contributor(...)]`.

use proc_macro2::Span;
use syn::{Attribute, Expr, LitBool, LitStr, Path};

pub(crate) const INTROSPECT_ATTRIBUTE_NAME: &str = "introspect";
pub(crate) const CONTRIBUTOR_ATTRIBUTE_NAME: &str = "contributor";

fn introspect_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident(INTROSPECT_ATTRIBUTE_NAME))
}

// -----------------------------------------------------------------------------
// Type level

/// `#[introspect(...)]` on a struct.
#[derive(Debug)]
pub(crate) struct TypeAttributes {
    /// `methods`: members are completed by `#[introspect_methods]`.
    pub methods: Option<Span>,
    /// `constructor = false` drops the field-literal constructor.
    pub constructor: bool,
}

impl Default for TypeAttributes {
    fn default() -> Self {
        Self {
            methods: None,
            constructor: true,
        }
    }
}

impl TypeAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in introspect_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("methods") {
                    this.methods = Some(meta.path.require_ident()?.span());
                    Ok(())
                } else if meta.path.is_ident("constructor") {
                    this.constructor = meta.value()?.parse::<LitBool>()?.value;
                    Ok(())
                } else {
                    Err(meta.error("expected `methods` or `constructor = <bool>`"))
                }
            })?;
        }
        Ok(this)
    }
}

// -----------------------------------------------------------------------------
// Field level

/// `#[introspect(...)]` on a field.
#[derive(Debug, Default)]
pub(crate) struct FieldAttributes {
    /// `readonly`: no setter is generated.
    pub readonly: bool,
    /// `skip`: the field is not described, and is `Default` in the
    /// field-literal constructor.
    pub skip: bool,
}

impl FieldAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in introspect_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("readonly") {
                    this.readonly = true;
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    this.skip = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `readonly` or `skip`"))
                }
            })?;
        }
        Ok(this)
    }
}

// -----------------------------------------------------------------------------
// Method level

/// `#[introspect(...)]` on a function of an `#[introspect_methods]` block.
#[derive(Debug, Default)]
pub(crate) struct MethodAttributes {
    pub skip: bool,
    pub rename: Option<LitStr>,
}

impl MethodAttributes {
    /// Parses and removes the `introspect` attributes, which are not
    /// valid on functions once the block is emitted.
    pub fn take_attrs(attrs: &mut Vec<Attribute>) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in introspect_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    this.skip = true;
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    this.rename = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `skip` or `rename = \"...\"`"))
                }
            })?;
        }
        attrs.retain(|attr| !attr.path().is_ident(INTROSPECT_ATTRIBUTE_NAME));
        Ok(this)
    }
}

// -----------------------------------------------------------------------------
// Contributor

/// `#[contributor(...)]` on a hint contributor.
#[derive(Default)]
pub(crate) struct ContributorAttributes {
    /// `priority = <expr>`, a constant `i32`. Defaults to `0`.
    pub priority: Option<Expr>,
    /// `try_new = <path>`, a `fn() -> Result<Self, E>` used instead of `Default`.
    pub try_new: Option<Path>,
}

impl ContributorAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in attrs
            .iter()
            .filter(|attr| attr.path().is_ident(CONTRIBUTOR_ATTRIBUTE_NAME))
        {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("priority") {
                    this.priority = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("try_new") {
                    this.try_new = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `priority = <i32>` or `try_new = <path>`"))
                }
            })?;
        }
        Ok(this)
    }
}
