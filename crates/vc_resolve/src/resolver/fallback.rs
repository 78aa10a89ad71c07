use crate::args::Arguments;
use crate::outcome::Outcome;
use crate::resolver::Resolver;
use crate::value::{Instance, InstanceMut, TypeTag, Value};

/// Tries `primary`, and `secondary` only when `primary` is not applicable.
///
/// Handled and failed outcomes of `primary` are returned as they are;
/// a failure never falls through. The outcome of `secondary` is returned
/// unchanged, including its own `NotApplicable`.
///
/// Fallbacks nest: `Fallback<A, Fallback<B, C>>` tries `A`, `B`, `C` in order.
#[derive(Debug, Clone, Default)]
pub struct Fallback<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> Fallback<P, S> {
    #[inline]
    pub const fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    #[inline]
    pub const fn primary(&self) -> &P {
        &self.primary
    }

    #[inline]
    pub const fn secondary(&self) -> &S {
        &self.secondary
    }

    #[inline]
    pub fn into_parts(self) -> (P, S) {
        (self.primary, self.secondary)
    }
}

impl<P: Resolver, S: Resolver> Resolver for Fallback<P, S> {
    fn construct(&self, target: TypeTag, name: &str, args: &mut Arguments) -> Outcome<Value> {
        self.primary.construct(target, name, args).or_else(|| {
            log::trace!("construct `{target}` with `{name}`: falling back");
            self.secondary.construct(target, name, args)
        })
    }

    fn invoke(
        &self,
        instance: &mut InstanceMut<'_>,
        name: &str,
        args: &mut Arguments,
    ) -> Outcome<Option<Value>> {
        self.primary.invoke(instance, name, args).or_else(|| {
            log::trace!("invoke `{}::{name}`: falling back", instance.tag());
            self.secondary.invoke(instance, name, args)
        })
    }

    fn get_field(&self, instance: Instance<'_>, name: &str) -> Outcome<Option<Value>> {
        self.primary.get_field(instance, name).or_else(|| {
            log::trace!("get field `{}::{name}`: falling back", instance.tag());
            self.secondary.get_field(instance, name)
        })
    }

    fn set_field(
        &self,
        instance: &mut InstanceMut<'_>,
        name: &str,
        value: &mut Option<Value>,
    ) -> Outcome<()> {
        self.primary.set_field(instance, name, value).or_else(|| {
            log::trace!("set field `{}::{name}`: falling back", instance.tag());
            self.secondary.set_field(instance, name, value)
        })
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use std::thread;

    use super::Fallback;
    use crate::args::Arguments;
    use crate::bootstrap::Bootstrap;
    use crate::error::{MemberError, ResolveError};
    use crate::hint::HintBundle;
    use crate::outcome::Outcome;
    use crate::resolver::tests::{Declining, Tripwire};
    use crate::resolver::{HintResolver, Resolver, ResolverExt};
    use crate::value::{Instance, InstanceMut, TypeTag, Value};

    struct Gauge(u32);

    fn gauges(reading: u32) -> HintResolver {
        let mut bootstrap = Bootstrap::begin();
        bootstrap.contribute_with("gauges", move |r| {
            r.insert(
                HintBundle::of::<Gauge>()
                    .constructor("", &[], move |_| Ok(Gauge(reading)))
                    .constructor("broken", &[], |_| Err(MemberError::Immutable))
                    .get_field(|g, _| Ok(Some(Value::new(g.0)))),
            );
        });
        HintResolver::new(bootstrap.seal())
    }

    fn reading(outcome: Outcome<Value>) -> u32 {
        outcome.handled().unwrap().take::<Gauge>().ok().unwrap().0
    }

    #[test]
    fn handled_primary_is_final() {
        let stack = gauges(1).or_fallback(Tripwire);
        let tag = TypeTag::of::<Gauge>();
        assert_eq!(reading(stack.construct(tag, "", &mut Arguments::new())), 1);

        let gauge = Gauge(3);
        assert!(stack.get_field(Instance::new(&gauge), "value").is_handled());
    }

    #[test]
    fn failed_primary_is_final() {
        let stack = gauges(1).or_fallback(Tripwire);
        let out = stack.construct(TypeTag::of::<Gauge>(), "broken", &mut Arguments::new());
        assert!(matches!(out, Outcome::Failed(ResolveError::Failed { .. })));
    }

    #[test]
    fn not_applicable_consults_secondary() {
        let declining = Declining::default();
        let stack = Fallback::new(&declining, gauges(2));
        assert_eq!(reading(stack.construct(TypeTag::of::<Gauge>(), "", &mut Arguments::new())), 2);
        assert_eq!(declining.calls(), 1);

        // The secondary's own decline is passed on unchanged.
        let mut value = Some(Value::new(0_u8));
        let mut gauge = Gauge(0);
        let out = stack.set_field(&mut InstanceMut::new(&mut gauge), "value", &mut value);
        assert!(out.is_not_applicable());
        assert!(value.is_some());
    }

    #[test]
    fn nested_fallbacks_run_in_order() {
        let first = Declining::default();
        let second = Declining::default();
        let stack = (&first).or_fallback((&second).or_fallback(gauges(3)));

        assert_eq!(reading(stack.construct(TypeTag::of::<Gauge>(), "", &mut Arguments::new())), 3);
        assert_eq!((first.calls(), second.calls()), (1, 1));

        let head = gauges(4).or_fallback(gauges(5)).or_fallback(Tripwire);
        assert_eq!(reading(head.construct(TypeTag::of::<Gauge>(), "", &mut Arguments::new())), 4);
    }

    #[test]
    fn shared_across_threads() {
        let stack: Arc<dyn Resolver> = Arc::new(Declining::default().or_fallback(gauges(8)));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stack = Arc::clone(&stack);
                thread::spawn(move || {
                    reading(stack.construct(TypeTag::of::<Gauge>(), "", &mut Arguments::new()))
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 8);
        }
    }
}
