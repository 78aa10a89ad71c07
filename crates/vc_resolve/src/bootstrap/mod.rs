//! Building the hint table.
//!
//! A [`Bootstrap`] runs [`HintContributor`]s in a deterministic order and is
//! then [sealed](Bootstrap::seal) into an immutable [`HintRegistry`].
//!
//! - Discovered contributors run by ascending priority, then by name.
//! - A later contributor replaces the bundle of an earlier one for the same
//!   type; bundles are never merged.
//! - A contributor failing to instantiate or to contribute is skipped with
//!   a warning. Its partial writes are discarded and bootstrap continues.
//!
//! # Examples
//!
//! ```
//! use vc_resolve::bootstrap::Bootstrap;
//! use vc_resolve::hint::{HintBundle, HintRegistrar};
//! use vc_resolve::HostError;
//!
//! struct Token(u32);
//!
//! fn broken(registrar: &mut HintRegistrar) -> Result<(), HostError> {
//!     registrar.insert(HintBundle::of::<Token>());
//!     Err(HostError::msg("configuration missing"))
//! }
//!
//! let mut bootstrap = Bootstrap::begin();
//! bootstrap.contribute("broken", &broken);
//!
//! assert_eq!(bootstrap.report().skipped().len(), 1);
//! assert!(bootstrap.seal().is_empty());
//! ```

use alloc::vec::Vec;

use crate::hint::{Entry, HintBundle, HintRegistrar, HintRegistry};
use crate::key_map::TypeIdMap;

// -----------------------------------------------------------------------------
// Modules

mod contributor;
mod report;

// -----------------------------------------------------------------------------
// Exports

pub use contributor::{ContributorEntry, HintContributor};
pub use report::{BootstrapReport, ContributorError, SkippedContributor};

// -----------------------------------------------------------------------------
// Bootstrap

/// The single writer of a hint table.
///
/// Created by [`begin`](Self::begin) or [`HintRegistry::reopen`],
/// consumed by [`seal`](Self::seal).
#[derive(Debug)]
pub struct Bootstrap {
    entries: TypeIdMap<Entry>,
    generation: u64,
    report: BootstrapReport,
}

impl Bootstrap {
    /// Starts from an empty table.
    #[inline]
    pub fn begin() -> Self {
        Self::seeded(TypeIdMap::new(), 0)
    }

    #[inline]
    pub(crate) fn seeded(entries: TypeIdMap<Entry>, generation: u64) -> Self {
        Self {
            entries,
            generation,
            report: BootstrapReport::default(),
        }
    }

    /// Runs `contributor` under `name`.
    ///
    /// Its writes are merged only if it returns `Ok`.
    pub fn contribute(
        &mut self,
        name: &'static str,
        contributor: &dyn HintContributor,
    ) -> &mut Self {
        let mut staging = HintRegistrar::new(name);
        match contributor.contribute(&mut staging) {
            Ok(()) => self.merge(name, staging),
            Err(err) => self.skip(name, ContributorError::Contribute(err)),
        }
        self
    }

    /// Runs an infallible contributor closure under `name`.
    pub fn contribute_with(
        &mut self,
        name: &'static str,
        func: impl FnOnce(&mut HintRegistrar),
    ) -> &mut Self {
        let mut staging = HintRegistrar::new(name);
        func(&mut staging);
        self.merge(name, staging);
        self
    }

    /// Instantiates and runs `entries`, ordered by priority then name.
    pub fn run_entries<'a>(
        &mut self,
        entries: impl IntoIterator<Item = &'a ContributorEntry>,
    ) -> &mut Self {
        let mut entries: Vec<&ContributorEntry> = entries.into_iter().collect();
        entries.sort_by(|a, b| {
            a.priority()
                .cmp(&b.priority())
                .then_with(|| a.name().cmp(b.name()))
        });

        for entry in entries {
            match entry.create() {
                Ok(contributor) => {
                    self.contribute(entry.name(), &*contributor);
                }
                Err(err) => self.skip(entry.name(), ContributorError::Instantiate(err)),
            }
        }
        self
    }

    /// Runs every contributor submitted by `#[derive(HintContributor)]`.
    ///
    /// Without the `auto_register` feature nothing is found;
    /// this is logged and the table is left as is.
    pub fn discover(&mut self) -> &mut Self {
        #[cfg(feature = "auto_register")]
        self.run_entries(inventory::iter::<ContributorEntry>);

        #[cfg(not(feature = "auto_register"))]
        log::debug!("contributor discovery is unavailable without `auto_register`");

        self
    }

    /// Inserts a bundle for every discovered introspected type that has
    /// no hints yet, see [`HintBundle::from_introspection`].
    ///
    /// This serves introspected types through hints, without reflection.
    /// Hints already in the table are kept, whatever the call order.
    pub fn discover_introspected(&mut self) -> &mut Self {
        let index = crate::introspect::IntrospectionIndex::discover();
        let (fresh, hinted): (Vec<_>, Vec<_>) = index
            .iter()
            .partition(|table| !self.entries.contains(&table.tag().id()));

        for table in &hinted {
            log::debug!("keeping the explicit hints for `{}`", table.tag());
        }

        self.contribute_with("introspection", |registrar| {
            for table in fresh {
                registrar.insert(HintBundle::from_introspection(table));
            }
        })
    }

    /// What happened so far.
    #[inline]
    pub fn report(&self) -> &BootstrapReport {
        &self.report
    }

    /// Freezes the table.
    pub fn seal(self) -> HintRegistry {
        let generation = self.generation + 1;
        log::debug!(
            "sealed hint registry, generation {generation}: {} bundles, {} contributors applied, {} skipped",
            self.entries.len(),
            self.report.applied.len(),
            self.report.skipped.len(),
        );
        HintRegistry::seal(self.entries, generation)
    }

    fn merge(&mut self, name: &'static str, staging: HintRegistrar) {
        let report = &mut self.report;
        let staged = staging.into_entries();
        log::debug!("contributor `{name}` wrote {} bundles", staged.len());

        self.entries.overwrite_with(staged, |old, new| {
            log::debug!(
                "`{}` replaces the hints for `{}` written by `{}`",
                new.origin,
                new.bundle.tag(),
                old.origin,
            );
            report.replaced += 1;
        });
        report.applied.push(name);
    }

    fn skip(&mut self, name: &'static str, error: ContributorError) {
        log::warn!("skipped hint contributor `{name}`: {error}");
        self.report.skipped.push(SkippedContributor { name, error });
    }
}

impl Default for Bootstrap {
    #[inline]
    fn default() -> Self {
        Self::begin()
    }
}

// -----------------------------------------------------------------------------
// Global registry

/// The process-wide registry, built by [`Bootstrap::discover`] on first use.
///
/// Requires the `std` feature.
///
/// Later calls return the same registry; new contributors linked in later
/// are not seen. Use [`HintRegistry::reopen`] for an updated table.
#[cfg(feature = "std")]
pub fn global_registry() -> &'static HintRegistry {
    static REGISTRY: std::sync::OnceLock<HintRegistry> = std::sync::OnceLock::new();

    REGISTRY.get_or_init(|| {
        let mut bootstrap = Bootstrap::begin();
        bootstrap.discover();
        bootstrap.seal()
    })
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec::Vec;

    use super::{Bootstrap, ContributorEntry, ContributorError, HintContributor};
    use crate::error::HostError;
    use crate::hint::{HintBundle, HintRegistrar};

    struct Shared;

    fn writer(name: &'static str) -> impl Fn(&mut HintRegistrar) -> Result<(), HostError> {
        move |registrar: &mut HintRegistrar| {
            registrar.insert(HintBundle::of::<Shared>().constructor(name, &[], |_| Ok(Shared)));
            Ok(())
        }
    }

    fn create_low() -> Result<Box<dyn HintContributor>, HostError> {
        Ok(Box::new(writer("low")))
    }

    fn create_high() -> Result<Box<dyn HintContributor>, HostError> {
        Ok(Box::new(writer("high")))
    }

    fn create_failing() -> Result<Box<dyn HintContributor>, HostError> {
        Err(HostError::msg("no database"))
    }

    #[test]
    fn entries_run_by_priority_then_name() {
        let entries = [
            ContributorEntry::new("b", 0, create_low),
            ContributorEntry::new("z", 10, create_high),
            ContributorEntry::new("a", 0, create_low),
            ContributorEntry::new("broken", 5, create_failing),
        ];

        let mut bootstrap = Bootstrap::begin();
        bootstrap.run_entries(&entries);

        assert_eq!(bootstrap.report().applied(), ["a", "b", "z"]);
        assert_eq!(bootstrap.report().replaced(), 2);

        let skipped = bootstrap.report().skipped();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].name, "broken");
        assert!(matches!(skipped[0].error, ContributorError::Instantiate(_)));

        let registry = bootstrap.seal();
        let bundle = registry.get_type::<Shared>().unwrap();
        assert!(bundle.constructor("high").is_some());
        assert!(bundle.constructor("low").is_none());
        assert_eq!(registry.origin_type::<Shared>(), Some("z"));
    }

    #[test]
    fn input_order_does_not_matter() {
        let forward = [
            ContributorEntry::new("one", 1, create_low),
            ContributorEntry::new("two", 2, create_high),
        ];
        let reversed: Vec<_> = forward.iter().rev().collect();

        let mut a = Bootstrap::begin();
        a.run_entries(&forward);
        let mut b = Bootstrap::begin();
        b.run_entries(reversed);

        assert_eq!(a.report().applied(), b.report().applied());
        assert_eq!(a.seal().origin_type::<Shared>(), b.seal().origin_type::<Shared>());
    }

    #[test]
    fn failed_contribution_is_discarded() {
        fn partial(registrar: &mut HintRegistrar) -> Result<(), HostError> {
            registrar.insert(HintBundle::of::<u8>());
            Err(HostError::msg("half done"))
        }

        let mut bootstrap = Bootstrap::begin();
        bootstrap
            .contribute("partial", &partial)
            .contribute("after", &writer("after"));

        assert!(!bootstrap.report().is_clean());
        let registry = bootstrap.seal();
        assert!(registry.get_type::<u8>().is_none());
        assert!(registry.get_type::<Shared>().is_some());
    }

    #[cfg(feature = "auto_register")]
    mod discovered {
        use crate::args::Arguments;
        use crate::bootstrap::{Bootstrap, HintContributor};
        use crate::derive::{HintContributor, Introspect};
        use crate::error::HostError;
        use crate::hint::{HintBundle, HintRegistrar};
        use crate::resolver::HintResolver;
        use crate::value::Value;
        use crate::Resolution;

        struct Discovered;

        #[derive(HintContributor, Default)]
        #[contributor(priority = -100)]
        struct DiscoveredHints;

        impl HintContributor for DiscoveredHints {
            fn contribute(&self, registrar: &mut HintRegistrar) -> Result<(), HostError> {
                registrar.insert(HintBundle::of::<Discovered>().constructor("", &[], |_| Ok(Discovered)));
                Ok(())
            }
        }

        struct Refused;

        #[derive(HintContributor)]
        #[contributor(try_new = RefusingHints::connect)]
        struct RefusingHints;

        impl RefusingHints {
            fn connect() -> Result<Self, HostError> {
                Err(HostError::msg("offline"))
            }
        }

        impl HintContributor for RefusingHints {
            fn contribute(&self, registrar: &mut HintRegistrar) -> Result<(), HostError> {
                registrar.insert(HintBundle::of::<Refused>());
                Ok(())
            }
        }

        #[test]
        fn derived_contributors_are_discovered() {
            let mut bootstrap = Bootstrap::begin();
            bootstrap.discover();

            let report = bootstrap.report();
            assert!(report.applied().iter().any(|name| name.ends_with("DiscoveredHints")));
            assert!(report.skipped().iter().any(|s| s.name.ends_with("RefusingHints")));

            let registry = bootstrap.seal();
            assert!(registry.get_type::<Discovered>().is_some());
            assert!(registry.get_type::<Refused>().is_none());
        }

        #[derive(Introspect)]
        struct Tick {
            count: u32,
        }

        #[derive(Introspect, Debug, PartialEq)]
        struct Gauge {
            level: u8,
        }

        fn hand_then_introspected() -> Bootstrap {
            let mut bootstrap = Bootstrap::begin();
            bootstrap.contribute_with("hand", |r| {
                r.insert(HintBundle::of::<Tick>().constructor("", &[], |_| Ok(Tick { count: 99 })));
            });
            bootstrap.discover_introspected();
            bootstrap
        }

        #[test]
        fn explicit_hints_survive_introspection() {
            let bootstrap = hand_then_introspected();
            assert_eq!(bootstrap.report().replaced(), 0);

            let registry = bootstrap.seal();
            assert_eq!(registry.origin_type::<Tick>(), Some("hand"));
            assert_eq!(registry.origin_type::<Gauge>(), Some("introspection"));
        }

        #[test]
        fn introspected_types_are_served_by_hints_alone() {
            let resolution = Resolution::new(HintResolver::new(hand_then_introspected().seal()));

            let tick = resolution.construct::<Tick>("", None, Arguments::new()).unwrap();
            assert_eq!(tick.count, 99);

            let mut gauge = resolution
                .construct::<Gauge>("", None, Arguments::new().with(7_u8))
                .unwrap();
            assert_eq!(gauge, Gauge { level: 7 });

            resolution.set_field(&mut gauge, "level", Some(Value::new(3_u8))).unwrap();
            let level = resolution.get_field(&gauge, "level").unwrap().unwrap();
            assert_eq!(level.take::<u8>().unwrap(), 3);
        }

        #[cfg(feature = "std")]
        #[test]
        fn global_registry_is_built_once() {
            let first = crate::bootstrap::global_registry();
            let second = crate::bootstrap::global_registry();
            assert!(core::ptr::eq(first, second));
            assert!(first.get_type::<Discovered>().is_some());
        }
    }
}
