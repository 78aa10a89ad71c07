use alloc::sync::Arc;
use core::fmt;

use crate::bootstrap::Bootstrap;
use crate::hint::HintBundle;
use crate::introspect::Introspect;
use crate::key_map::TypeIdMap;
use crate::value::TypeTag;

// -----------------------------------------------------------------------------
// Entry

#[derive(Clone)]
pub(crate) struct Entry {
    pub bundle: HintBundle,
    /// Name of the contributor which wrote the bundle.
    pub origin: &'static str,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("type", &self.bundle.tag())
            .field("origin", &self.origin)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// HintRegistrar

/// Write access to the hint table, handed to contributors during bootstrap.
///
/// Keys are unique per type. Inserting a bundle for a type that already has
/// one replaces it entirely; bundles are never merged.
///
/// # Examples
///
/// ```
/// use vc_resolve::bootstrap::Bootstrap;
/// use vc_resolve::hint::HintBundle;
///
/// struct Unit;
///
/// let mut bootstrap = Bootstrap::begin();
/// bootstrap.contribute_with("first", |registrar| {
///     registrar.insert(HintBundle::of::<Unit>().constructor("a", &[], |_| Ok(Unit)));
/// });
/// bootstrap.contribute_with("second", |registrar| {
///     registrar.insert(HintBundle::of::<Unit>().constructor("b", &[], |_| Ok(Unit)));
/// });
/// let registry = bootstrap.seal();
///
/// let bundle = registry.get_type::<Unit>().unwrap();
/// assert!(bundle.constructor("a").is_none());
/// assert!(bundle.constructor("b").is_some());
/// assert_eq!(registry.origin_type::<Unit>(), Some("second"));
/// ```
#[derive(Debug)]
pub struct HintRegistrar {
    entries: TypeIdMap<Entry>,
    origin: &'static str,
}

impl HintRegistrar {
    #[inline]
    pub(crate) const fn new(origin: &'static str) -> Self {
        Self {
            entries: TypeIdMap::new(),
            origin,
        }
    }

    #[inline]
    pub(crate) fn into_entries(self) -> TypeIdMap<Entry> {
        self.entries
    }

    /// Name of the contributor currently writing.
    #[inline]
    pub const fn origin(&self) -> &'static str {
        self.origin
    }

    /// Inserts `bundle`, returning the bundle it replaced.
    pub fn insert(&mut self, bundle: impl Into<HintBundle>) -> Option<HintBundle> {
        let bundle = bundle.into();
        let entry = Entry {
            origin: self.origin,
            bundle,
        };
        self.entries
            .insert(entry.bundle.tag().id(), entry)
            .map(|old| old.bundle)
    }

    /// Inserts a bundle generated from the introspection table of `T`.
    #[inline]
    pub fn insert_introspected<T: Introspect>(&mut self) -> Option<HintBundle> {
        self.insert(HintBundle::introspected::<T>())
    }

    #[inline]
    pub fn get(&self, tag: TypeTag) -> Option<&HintBundle> {
        self.entries.get(&tag.id()).map(|entry| &entry.bundle)
    }

    #[inline]
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.entries.contains(&tag.id())
    }

    #[inline]
    pub fn remove(&mut self, tag: TypeTag) -> Option<HintBundle> {
        self.entries.remove(&tag.id()).map(|entry| entry.bundle)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// -----------------------------------------------------------------------------
// HintRegistry

/// The sealed hint table.
///
/// Produced by [`Bootstrap::seal`] and immutable from then on:
/// there is no API to write to it, so it can be shared with any number
/// of readers. Cloning is cheap.
///
/// ```compile_fail
/// use vc_resolve::bootstrap::Bootstrap;
/// use vc_resolve::hint::HintBundle;
///
/// struct Unit;
///
/// let registry = Bootstrap::begin().seal();
/// registry.insert(HintBundle::of::<Unit>());
/// ```
///
/// To change it, [`reopen`](Self::reopen) it and seal again. That produces
/// a new registry; this one is left as it was.
#[derive(Clone)]
pub struct HintRegistry {
    inner: Arc<Sealed>,
}

struct Sealed {
    entries: TypeIdMap<Entry>,
    generation: u64,
}

impl HintRegistry {
    /// A registry without bundles.
    pub fn empty() -> Self {
        Self::seal(TypeIdMap::new(), 0)
    }

    #[inline]
    pub(crate) fn seal(entries: TypeIdMap<Entry>, generation: u64) -> Self {
        Self {
            inner: Arc::new(Sealed {
                entries,
                generation,
            }),
        }
    }

    #[inline]
    pub fn get(&self, tag: TypeTag) -> Option<&HintBundle> {
        self.inner.entries.get(&tag.id()).map(|entry| &entry.bundle)
    }

    #[inline]
    pub fn get_type<T: 'static>(&self) -> Option<&HintBundle> {
        self.get(TypeTag::of::<T>())
    }

    #[inline]
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.inner.entries.contains(&tag.id())
    }

    /// Name of the contributor whose bundle for `tag` won.
    #[inline]
    pub fn origin(&self, tag: TypeTag) -> Option<&'static str> {
        self.inner.entries.get(&tag.id()).map(|entry| entry.origin)
    }

    #[inline]
    pub fn origin_type<T: 'static>(&self) -> Option<&'static str> {
        self.origin(TypeTag::of::<T>())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// How many times this table was sealed; the first seal is `1`,
    /// [`empty`](Self::empty) is `0`.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.inner.generation
    }

    /// Iterates over the bundles in arbitrary order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &HintBundle> {
        self.inner.entries.values().map(|entry| &entry.bundle)
    }

    /// Starts a new bootstrap seeded with this registry's bundles.
    ///
    /// Sealing it yields a registry of the next generation. Resolvers built
    /// on `self` keep seeing `self`; they have to be rebuilt to see the new
    /// table.
    pub fn reopen(&self) -> Bootstrap {
        Bootstrap::seeded(self.inner.entries.clone(), self.inner.generation)
    }
}

impl Default for HintRegistry {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for HintRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HintRegistry")
            .field("generation", &self.inner.generation)
            .field("entries", &self.inner.entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::bootstrap::Bootstrap;
    use crate::hint::HintBundle;
    use crate::value::TypeTag;

    struct A;
    struct B;

    #[test]
    fn reseal_leaves_old_registry_untouched() {
        let mut bootstrap = Bootstrap::begin();
        bootstrap.contribute_with("base", |r| {
            r.insert(HintBundle::of::<A>());
        });
        let first = bootstrap.seal();
        assert_eq!(first.generation(), 1);

        let mut again = first.reopen();
        again.contribute_with("plugin", |r| {
            r.insert(HintBundle::of::<B>());
        });
        let second = again.seal();

        assert_eq!(second.generation(), 2);
        assert!(second.contains(TypeTag::of::<A>()));
        assert!(second.contains(TypeTag::of::<B>()));
        assert_eq!(second.origin_type::<A>(), Some("base"));

        assert_eq!(first.len(), 1);
        assert!(!first.contains(TypeTag::of::<B>()));
    }

    #[test]
    fn registrar_replaces_whole_bundle() {
        let mut bootstrap = Bootstrap::begin();
        bootstrap.contribute_with("x", |r| {
            let first = HintBundle::of::<A>()
                .constructor("", &[], |_| Ok(A))
                .get_field(|_, _| Ok(None));
            assert!(r.insert(first).is_none());

            let replaced = r.insert(HintBundle::of::<A>()).unwrap();
            assert!(replaced.has_constructors());
            assert!(!r.get(TypeTag::of::<A>()).unwrap().has_get_field());
            assert_eq!(r.len(), 1);
        });
        let registry = bootstrap.seal();
        assert!(!registry.get_type::<A>().unwrap().has_constructors());
    }

    #[test]
    fn empty_registry() {
        let registry = super::HintRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(registry.generation(), 0);
        assert_eq!(registry.iter().count(), 0);
    }
}
