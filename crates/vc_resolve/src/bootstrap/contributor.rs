use alloc::boxed::Box;
use core::fmt;

use crate::error::HostError;
use crate::hint::HintRegistrar;

// -----------------------------------------------------------------------------
// HintContributor

/// A unit of hint registration, run once per bootstrap.
///
/// Everything a contributor writes is staged and merged into the table only
/// when `contribute` returns `Ok`, so a failing contributor leaves no trace.
///
/// Closures taking a `&mut HintRegistrar` are contributors too.
///
/// # Examples
///
/// ```
/// use vc_resolve::bootstrap::{Bootstrap, HintContributor};
/// use vc_resolve::hint::{HintBundle, HintRegistrar};
/// use vc_resolve::HostError;
///
/// struct Meters(f64);
///
/// struct UnitHints;
///
/// impl HintContributor for UnitHints {
///     fn contribute(&self, registrar: &mut HintRegistrar) -> Result<(), HostError> {
///         registrar.insert(
///             HintBundle::of::<Meters>()
///                 .constructor("", &["value"], |mut args| Ok(Meters(args.take("value")?))),
///         );
///         Ok(())
///     }
/// }
///
/// let mut bootstrap = Bootstrap::begin();
/// bootstrap.contribute("units", &UnitHints);
/// assert!(bootstrap.seal().get_type::<Meters>().is_some());
/// ```
pub trait HintContributor: Send + Sync {
    fn contribute(&self, registrar: &mut HintRegistrar) -> Result<(), HostError>;
}

impl<F> HintContributor for F
where
    F: Fn(&mut HintRegistrar) -> Result<(), HostError> + Send + Sync,
{
    #[inline]
    fn contribute(&self, registrar: &mut HintRegistrar) -> Result<(), HostError> {
        self(registrar)
    }
}

// -----------------------------------------------------------------------------
// ContributorEntry

/// A discoverable contributor.
///
/// `#[derive(HintContributor)]` submits one per type;
/// [`Bootstrap::discover`](crate::bootstrap::Bootstrap::discover) runs them.
#[derive(Clone, Copy)]
pub struct ContributorEntry {
    name: &'static str,
    priority: i32,
    create: fn() -> Result<Box<dyn HintContributor>, HostError>,
}

impl ContributorEntry {
    #[inline]
    pub const fn new(
        name: &'static str,
        priority: i32,
        create: fn() -> Result<Box<dyn HintContributor>, HostError>,
    ) -> Self {
        Self {
            name,
            priority,
            create,
        }
    }

    /// The contributor's name, the type path for derived ones.
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Lower priorities run first, so higher priorities win conflicts.
    #[inline(always)]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Instantiates the contributor.
    #[inline]
    pub fn create(&self) -> Result<Box<dyn HintContributor>, HostError> {
        (self.create)()
    }
}

impl fmt::Debug for ContributorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContributorEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "auto_register")]
inventory::collect!(ContributorEntry);
