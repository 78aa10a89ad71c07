use alloc::sync::Arc;
use core::any::{Any, type_name};
use core::fmt;

use crate::args::Arguments;
use crate::error::{MemberError, Operation, ResolveError, Site};
use crate::hint::HintRegistry;
use crate::resolver::{HintResolver, Resolver};
use crate::value::{Instance, InstanceMut, TypeTag, Value};

// -----------------------------------------------------------------------------
// Regime

/// Which backends the standard resolution stack contains.
///
/// Chosen at compile time by the `reflect` feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Regime {
    /// Hints first, then introspected types.
    Reflective,
    /// Hints only. A request no hint serves is unresolvable.
    Static,
}

impl Regime {
    /// The regime this crate was compiled for.
    pub const CURRENT: Self = if cfg!(feature = "reflect") {
        Self::Reflective
    } else {
        Self::Static
    };

    #[inline]
    pub const fn is_reflective(self) -> bool {
        matches!(self, Self::Reflective)
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reflective => "reflective",
            Self::Static => "static",
        })
    }
}

// -----------------------------------------------------------------------------
// Resolution

/// The entry point for consumers of the resolution layer.
///
/// Wraps the outermost [`Resolver`] and turns its outcomes into plain
/// [`Result`]s. A request that every backend declined becomes
/// [`ResolveError::Unresolvable`]; callers never see
/// [`Outcome::NotApplicable`](crate::Outcome::NotApplicable).
///
/// Cloning is cheap and shares the resolver.
///
/// # Examples
///
/// ```
/// use vc_resolve::args::Arguments;
/// use vc_resolve::bootstrap::Bootstrap;
/// use vc_resolve::hint::HintBundle;
/// use vc_resolve::value::Value;
/// use vc_resolve::{Resolution, ResolveError};
///
/// #[derive(Debug, PartialEq)]
/// struct Celsius(f32);
///
/// let mut bootstrap = Bootstrap::begin();
/// bootstrap.contribute_with("units", |r| {
///     r.insert(
///         HintBundle::of::<Celsius>()
///             .constructor("", &["degrees"], |mut a| Ok(Celsius(a.take("degrees")?)))
///             .get_field(|c, _| Ok(Some(Value::new(c.0)))),
///     );
/// });
/// let resolution = Resolution::standard(bootstrap.seal());
///
/// let c: Celsius = resolution
///     .construct("", None, Arguments::new().with_named("degrees", 21.5_f32))
///     .unwrap();
/// assert_eq!(c, Celsius(21.5));
///
/// // No backend serves `String`.
/// let err = resolution.construct::<String>("", None, Arguments::new()).unwrap_err();
/// assert!(matches!(err, ResolveError::Unresolvable { .. }));
/// ```
#[derive(Clone)]
pub struct Resolution {
    resolver: Arc<dyn Resolver>,
}

impl Resolution {
    /// Resolution through `resolver`.
    #[inline]
    pub fn new(resolver: impl Resolver + 'static) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Resolution through a shared resolver.
    #[inline]
    pub fn from_shared(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }

    /// The standard stack of the [current regime](Regime::CURRENT).
    ///
    /// - reflective: hints of `registry`, falling back to every discovered
    ///   introspected type.
    /// - static: hints of `registry` only.
    pub fn standard(registry: HintRegistry) -> Self {
        let hints = HintResolver::new(registry);

        #[cfg(feature = "reflect")]
        let resolution = {
            use crate::resolver::{ReflectiveResolver, ResolverExt};
            Self::new(hints.or_fallback(ReflectiveResolver::discover()))
        };

        #[cfg(not(feature = "reflect"))]
        let resolution = Self::new(hints);

        log::debug!("built the {} resolution stack", Regime::CURRENT);
        resolution
    }

    #[inline(always)]
    pub const fn regime() -> Regime {
        Regime::CURRENT
    }

    #[inline]
    pub fn resolver(&self) -> &dyn Resolver {
        &*self.resolver
    }

    /// Constructs a `T` with the constructor `name`.
    ///
    /// The request targets `declared`, or `T` when `None`.
    /// `T = Value` returns the constructed value as it is.
    ///
    /// # Errors
    ///
    /// `Unresolvable` if no backend serves the target, `Failed` if the
    /// construction failed or produced something other than a `T`.
    pub fn construct<T: Any>(
        &self,
        name: &str,
        declared: Option<TypeTag>,
        args: Arguments,
    ) -> Result<T, ResolveError> {
        let target = declared.unwrap_or_else(TypeTag::of::<T>);
        self.construct_value(target, name, args)?
            .into_typed::<T>()
            .map_err(|value| {
                let mismatch = MemberError::TypeMismatch {
                    expected: type_name::<T>(),
                    found: value.type_name(),
                };
                ResolveError::failed(Site::new(Operation::Construct, target, name), mismatch)
            })
    }

    /// Constructs the type `target` with the constructor `name`.
    pub fn construct_value(
        &self,
        target: TypeTag,
        name: &str,
        mut args: Arguments,
    ) -> Result<Value, ResolveError> {
        self.resolver
            .construct(target, name, &mut args)
            .into_result(|| unresolvable(Operation::Construct, target, name))
    }

    /// Calls the method `name` on `instance`.
    ///
    /// A `Value` is resolved as the value it holds.
    pub fn invoke<T: Any>(
        &self,
        instance: &mut T,
        name: &str,
        args: Arguments,
    ) -> Result<Option<Value>, ResolveError> {
        self.invoke_on(&mut InstanceMut::new(instance), name, args)
    }

    /// [`invoke`](Self::invoke) on an already erased receiver.
    pub fn invoke_on(
        &self,
        instance: &mut InstanceMut<'_>,
        name: &str,
        mut args: Arguments,
    ) -> Result<Option<Value>, ResolveError> {
        let tag = instance.tag();
        self.resolver
            .invoke(instance, name, &mut args)
            .into_result(|| unresolvable(Operation::Invoke, tag, name))
    }

    /// Reads the field `name` of `instance`.
    pub fn get_field<T: Any>(&self, instance: &T, name: &str) -> Result<Option<Value>, ResolveError> {
        self.get_field_on(Instance::new(instance), name)
    }

    /// [`get_field`](Self::get_field) on an already erased receiver.
    pub fn get_field_on(
        &self,
        instance: Instance<'_>,
        name: &str,
    ) -> Result<Option<Value>, ResolveError> {
        self.resolver
            .get_field(instance, name)
            .into_result(|| unresolvable(Operation::GetField, instance.tag(), name))
    }

    /// Writes `value` to the field `name` of `instance`.
    pub fn set_field<T: Any>(
        &self,
        instance: &mut T,
        name: &str,
        value: Option<Value>,
    ) -> Result<(), ResolveError> {
        self.set_field_on(&mut InstanceMut::new(instance), name, value)
    }

    /// [`set_field`](Self::set_field) on an already erased receiver.
    pub fn set_field_on(
        &self,
        instance: &mut InstanceMut<'_>,
        name: &str,
        mut value: Option<Value>,
    ) -> Result<(), ResolveError> {
        let tag = instance.tag();
        self.resolver
            .set_field(instance, name, &mut value)
            .into_result(|| unresolvable(Operation::SetField, tag, name))
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("regime", &Regime::CURRENT)
            .finish_non_exhaustive()
    }
}

fn unresolvable(operation: Operation, target: TypeTag, name: &str) -> ResolveError {
    ResolveError::Unresolvable {
        site: Site::new(operation, target, name),
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;
    use core::fmt;
    use std::thread;

    use super::{Regime, Resolution};
    use crate::args::Arguments;
    use crate::bootstrap::Bootstrap;
    use crate::error::{MemberError, ResolveError};
    use crate::hint::HintBundle;
    use crate::resolver::tests::Declining;
    use crate::value::{TypeTag, Value};

    #[derive(Debug, Clone, PartialEq)]
    struct Config {
        port: u16,
        host: String,
    }

    #[derive(Debug)]
    struct PortInUse(u16);

    impl fmt::Display for PortInUse {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "port {} is in use", self.0)
        }
    }

    impl core::error::Error for PortInUse {}

    fn resolution() -> Resolution {
        let mut bootstrap = Bootstrap::begin();
        bootstrap.contribute_with("config", |r| {
            r.insert(
                HintBundle::of::<Config>()
                    .constructor("", &["port", "host"], |mut a| {
                        Ok(Config { port: a.take("port")?, host: a.take("host")? })
                    })
                    .invoke(|config, name, mut args| match name {
                        "bind" if config.port == 80 => Err(MemberError::host(PortInUse(80))),
                        "bind" => Ok(None),
                        "with_port" => {
                            config.port = args.take_positional(0)?;
                            Ok(Some(Value::new(config.clone())))
                        }
                        _ => Err(MemberError::no_method()),
                    })
                    .set_field(|config, name, value| match (name, value) {
                        ("host", Some(value)) => {
                            config.host = value.take().map_err(|v: Value| MemberError::TypeMismatch {
                                expected: "String",
                                found: v.type_name(),
                            })?;
                            Ok(())
                        }
                        ("host", None) => Err(MemberError::Immutable),
                        _ => Err(MemberError::no_field()),
                    }),
            );
        });
        Resolution::standard(bootstrap.seal())
    }

    fn config() -> Config {
        Config {
            port: 8080,
            host: "localhost".to_string(),
        }
    }

    #[test]
    fn typed_and_erased_construction() {
        let resolution = resolution();
        let args = || Arguments::new().with(8080_u16).with(String::from("localhost"));

        let typed: Config = resolution.construct("", None, args()).unwrap();
        assert_eq!(typed, config());

        let tag = Some(TypeTag::of::<Config>());
        let erased: Value = resolution.construct("", tag, args()).unwrap();
        assert!(erased.is::<Config>());

        let err = resolution.construct::<u32>("", tag, args()).unwrap_err();
        assert!(matches!(
            err.member_error(),
            Some(MemberError::TypeMismatch { expected: "u32", .. })
        ));
    }

    #[test]
    fn host_failures_keep_their_error() {
        let resolution = resolution();
        let mut config = Config { port: 80, ..config() };

        let err = resolution.invoke(&mut config, "bind", Arguments::new()).unwrap_err();
        assert!(err.to_string().contains("bind"));
        let host = err.into_host_error().unwrap();
        assert_eq!(host.downcast_ref::<PortInUse>().unwrap().0, 80);

        config.port = 81;
        assert!(resolution.invoke(&mut config, "bind", Arguments::new()).unwrap().is_none());
    }

    #[test]
    fn instance_operations() {
        let resolution = resolution();
        let mut config = Value::new(config());

        let moved = resolution
            .invoke(&mut config, "with_port", Arguments::new().with(9000_u16))
            .unwrap()
            .unwrap();
        assert_eq!(moved.downcast_ref::<Config>().unwrap().port, 9000);

        resolution
            .set_field(&mut config, "host", Some(Value::new(String::from("example.org"))))
            .unwrap();
        assert_eq!(config.downcast_ref::<Config>().unwrap().host, "example.org");

        let err = resolution.set_field(&mut config, "host", None).unwrap_err();
        assert!(matches!(err.member_error(), Some(MemberError::Immutable)));

        // No `get_field` slot, and `Config` is not introspected.
        let err = resolution.get_field(&config, "host").unwrap_err();
        assert!(matches!(err, ResolveError::Unresolvable { .. }));
    }

    #[test]
    fn declined_requests_become_unresolvable() {
        let resolution = Resolution::new(Declining::default());
        let err = resolution.construct::<Value>("", Some(TypeTag::of::<u8>()), Arguments::new());
        let err = err.unwrap_err();
        assert!(matches!(err, ResolveError::Unresolvable { .. }));
        assert!(err.to_string().contains("no resolver supports the request"));

        let mut n = 0_u8;
        assert!(resolution.set_field(&mut n, "x", None).is_err());
    }

    #[test]
    fn regime_matches_features() {
        assert_eq!(Resolution::regime(), Regime::CURRENT);
        assert_eq!(Regime::CURRENT.is_reflective(), cfg!(feature = "reflect"));
    }

    #[test]
    fn resolution_is_shared_between_threads() {
        let resolution = resolution();
        let handles: Vec<_> = (0..4_u16)
            .map(|i| {
                let resolution = resolution.clone();
                thread::spawn(move || {
                    let args = Arguments::new().with(i).with(String::from("h"));
                    resolution.construct::<Config>("", None, args).unwrap().port
                })
            })
            .collect();

        let mut ports: Vec<u16> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ports.sort_unstable();
        assert_eq!(ports, [0, 1, 2, 3]);
    }

    #[cfg(all(feature = "reflect", feature = "auto_register"))]
    mod layered {
        use super::super::Resolution;
        use crate::args::Arguments;
        use crate::bootstrap::Bootstrap;
        use crate::derive::{Introspect, introspect_methods};
        use crate::error::MemberError;
        use crate::hint::HintBundle;
        use crate::resolver::tests::Tripwire;
        use crate::resolver::{HintResolver, ReflectiveResolver, ResolverExt};
        use crate::value::Value;

        #[derive(Debug, Clone, PartialEq, Introspect)]
        #[introspect(methods)]
        struct Square {
            side: u32,
        }

        #[introspect_methods]
        impl Square {
            fn area(&self) -> u32 {
                self.side * self.side
            }
        }

        fn read_only_side() -> Bootstrap {
            let mut bootstrap = Bootstrap::begin();
            bootstrap.contribute_with("frozen", |r| {
                r.insert(HintBundle::of::<Square>().set_field(|_, _, _| Err(MemberError::Immutable)));
            });
            bootstrap
        }

        #[test]
        fn types_without_hints_fall_back_to_introspection() {
            let resolution = Resolution::standard(Bootstrap::begin().seal());
            let square = resolution.construct::<Square>("", None, Arguments::new().with(3_u32));
            assert_eq!(square.unwrap(), Square { side: 3 });
        }

        #[test]
        fn getter_reads_like_a_field_but_cannot_be_written() {
            let resolution = Resolution::standard(Bootstrap::begin().seal());
            let mut square = Square { side: 4 };

            let area = resolution.get_field(&square, "area").unwrap().unwrap();
            assert_eq!(area.take::<u32>().unwrap(), 16);

            let err = resolution.set_field(&mut square, "area", Some(Value::new(9_u32))).unwrap_err();
            assert!(matches!(err.member_error(), Some(MemberError::Immutable)));
            assert_eq!(square.side, 4);
        }

        #[test]
        fn hint_failure_is_not_retried() {
            let resolution = Resolution::new(HintResolver::new(read_only_side().seal()).or_fallback(Tripwire));
            let mut square = Square { side: 2 };

            let err = resolution.set_field(&mut square, "side", Some(Value::new(5_u32))).unwrap_err();
            assert!(matches!(err.member_error(), Some(MemberError::Immutable)));
            assert_eq!(square.side, 2);
        }

        #[test]
        fn hint_failure_shadows_a_capable_backend() {
            let backend = ReflectiveResolver::discover();
            let resolution = Resolution::new(HintResolver::new(read_only_side().seal()).or_fallback(backend));
            let mut square = Square { side: 2 };

            // The introspected field is writable, the hint still decides.
            let err = resolution.set_field(&mut square, "side", Some(Value::new(5_u32))).unwrap_err();
            assert!(matches!(err.member_error(), Some(MemberError::Immutable)));
            assert_eq!(square.side, 2);

            // Slots the hint leaves empty go to the backend.
            let side = resolution.get_field(&square, "side").unwrap().unwrap();
            assert_eq!(side.take::<u32>().unwrap(), 2);
        }
    }
}
