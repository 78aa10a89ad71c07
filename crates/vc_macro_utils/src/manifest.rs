use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{DocumentMut, Item, Table};

/// The caller's `Cargo.toml`, used to find how a crate is reachable from
/// code generated into the caller.
///
/// # Example
///
/// ```rust
/// # use vc_macro_utils::Manifest;
/// let path: syn::Path = Manifest::shared(|m| m.get_crate_path("vc_resolve"));
/// ```
///
/// Reading the manifest is not cheap. Callers resolve a path once per macro
/// invocation and pass it around.
///
/// # Resolution rules
///
/// For `[dependencies]`, then `[dev-dependencies]`:
///
/// 1. The crate itself, under its own name or renamed with `package = ...`:
///    `::key`.
/// 2. For a `vc_` crate, the facade `vc_dynamic` (possibly renamed):
///    `::key::short_name`, e.g. `vc_resolve` is `::vc_dynamic::resolve`.
///
/// Otherwise, or if the manifest cannot be read, `::crate_name`.
///
/// A crate referring to itself needs `extern crate self as crate_name;`
/// in its root for the fallback to resolve.
#[derive(Debug)]
pub struct Manifest {
    pub manifest: DocumentMut,
    pub modified_time: SystemTime,
}

const FACADE_NAME: &str = "vc_dynamic";
const CRATE_PREFIX: &str = "vc_";

impl Manifest {
    fn manifest_path() -> Option<PathBuf> {
        let mut path = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR")?);
        path.push("Cargo.toml");
        Some(path)
    }

    fn load(path: &Path) -> Option<Self> {
        let modified_time = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
        let manifest = std::fs::read_to_string(path).ok()?.parse().ok()?;
        Some(Self {
            manifest,
            modified_time,
        })
    }

    /// The key under which `package` is declared in `deps`.
    fn dependency_key<'a>(deps: &'a Table, package: &str) -> Option<&'a str> {
        deps.iter().find_map(|(key, item)| {
            let renamed = item
                .as_table_like()
                .and_then(|table| table.get("package"))
                .and_then(Item::as_str);
            match renamed {
                Some(name) if name == package => Some(key),
                None if key == package => Some(key),
                _ => None,
            }
        })
    }

    fn find_in_deps(deps: &Table, name: &str) -> Option<syn::Path> {
        if let Some(key) = Self::dependency_key(deps, name) {
            return syn::parse_str(&format!("::{key}")).ok();
        }

        let module = name.strip_prefix(CRATE_PREFIX)?;
        let facade = Self::dependency_key(deps, FACADE_NAME)?;
        syn::parse_str(&format!("::{facade}::{module}")).ok()
    }

    /// Return a [`syn::Path`] for the package named `name`, see the
    /// [resolution rules](Manifest#resolution-rules).
    pub fn get_crate_path(&self, name: &str) -> syn::Path {
        ["dependencies", "dev-dependencies"]
            .into_iter()
            .filter_map(|section| match self.manifest.get(section) {
                Some(Item::Table(deps)) => Some(deps),
                _ => None,
            })
            .find_map(|deps| Self::find_in_deps(deps, name))
            .unwrap_or_else(|| Self::absolute(name))
    }

    fn absolute(name: &str) -> syn::Path {
        let ident = syn::Ident::new(name, proc_macro2_span());
        let mut path = syn::Path::from(ident);
        path.leading_colon = Some(Default::default());
        path
    }

    /// Runs `func` on the caller's manifest.
    ///
    /// Manifests are cached per path and re-read when modified. Without a
    /// readable manifest, `func` sees an empty one.
    pub fn shared<R>(func: impl FnOnce(&Self) -> R) -> R {
        static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

        let Some(path) = Self::manifest_path() else {
            return func(&Self::empty());
        };

        let modified_time = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
        {
            let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(manifest) = manifests.get(&path)
                && Some(manifest.modified_time) == modified_time
            {
                return func(manifest);
            }
        }

        let Some(manifest) = Self::load(&path) else {
            return func(&Self::empty());
        };
        let result = func(&manifest);

        MANIFESTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, manifest);

        result
    }

    fn empty() -> Self {
        Self {
            manifest: DocumentMut::new(),
            modified_time: SystemTime::UNIX_EPOCH,
        }
    }
}

#[inline]
fn proc_macro2_span() -> proc_macro2::Span {
    proc_macro2::Span::call_site()
}

#[cfg(test)]
mod tests {
    use super::Manifest;

    fn manifest(text: &str) -> Manifest {
        Manifest {
            manifest: text.parse().unwrap(),
            modified_time: std::time::SystemTime::UNIX_EPOCH,
        }
    }

    fn resolve(text: &str) -> String {
        let path = manifest(text).get_crate_path("vc_resolve");
        quote::quote!(#path).to_string().replace(' ', "")
    }

    #[test]
    fn direct_and_renamed_dependencies() {
        assert_eq!(resolve("[dependencies]\nvc_resolve = \"0.0.1\""), "::vc_resolve");
        assert_eq!(
            resolve("[dependencies]\nres = { package = \"vc_resolve\", path = \"..\" }"),
            "::res"
        );
    }

    #[test]
    fn facade_dependencies() {
        assert_eq!(resolve("[dependencies]\nvc_dynamic = \"0.0.1\""), "::vc_dynamic::resolve");
        assert_eq!(
            resolve("[dev-dependencies]\ndy = { package = \"vc_dynamic\" }"),
            "::dy::resolve"
        );
    }

    #[test]
    fn fallback_is_absolute() {
        assert_eq!(resolve("[package]\nname = \"app\""), "::vc_resolve");
    }
}
