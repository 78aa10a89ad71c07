use core::mem;

use crate::args::Arguments;
use crate::error::{MemberError, Operation, ResolveError, Site};
use crate::hint::{HintBundle, HintRegistry};
use crate::outcome::Outcome;
use crate::resolver::Resolver;
use crate::value::{Instance, InstanceMut, TypeTag, Value};

/// Serves requests from a sealed [`HintRegistry`].
///
/// A type without a bundle, or a bundle without the slot an operation needs,
/// is not applicable. Anything else is attempted, and a failing slot is a
/// final failure.
#[derive(Debug, Clone, Default)]
pub struct HintResolver {
    registry: HintRegistry,
}

impl HintResolver {
    #[inline]
    pub fn new(registry: HintRegistry) -> Self {
        Self { registry }
    }

    #[inline]
    pub fn registry(&self) -> &HintRegistry {
        &self.registry
    }

    #[inline]
    fn bundle(&self, tag: TypeTag) -> Option<&HintBundle> {
        self.registry.get(tag)
    }
}

fn settle<T>(
    result: Result<T, MemberError>,
    operation: Operation,
    target: TypeTag,
    name: &str,
) -> Outcome<T> {
    match result {
        Ok(value) => Outcome::Handled(value),
        Err(err) => Outcome::Failed(ResolveError::failed(Site::new(operation, target, name), err)),
    }
}

impl Resolver for HintResolver {
    fn construct(&self, target: TypeTag, name: &str, args: &mut Arguments) -> Outcome<Value> {
        let Some(bundle) = self.bundle(target).filter(|b| b.has_constructors()) else {
            return Outcome::NotApplicable;
        };

        let result = match bundle.constructor(name) {
            Some(ctor) => mem::take(args)
                .bind(ctor.params())
                .map_err(MemberError::from)
                .and_then(|bound| ctor.call(bound)),
            None => Err(MemberError::no_constructor()),
        };
        settle(result, Operation::Construct, target, name)
    }

    fn invoke(
        &self,
        instance: &mut InstanceMut<'_>,
        name: &str,
        args: &mut Arguments,
    ) -> Outcome<Option<Value>> {
        let tag = instance.tag();
        let Some(invoke) = self.bundle(tag).and_then(HintBundle::invoke_slot) else {
            return Outcome::NotApplicable;
        };

        let result = invoke(instance.as_any_mut(), name, mem::take(args));
        settle(result, Operation::Invoke, tag, name)
    }

    fn get_field(&self, instance: Instance<'_>, name: &str) -> Outcome<Option<Value>> {
        let tag = instance.tag();
        let Some(get_field) = self.bundle(tag).and_then(HintBundle::get_field_slot) else {
            return Outcome::NotApplicable;
        };

        settle(get_field(instance.as_any(), name), Operation::GetField, tag, name)
    }

    fn set_field(
        &self,
        instance: &mut InstanceMut<'_>,
        name: &str,
        value: &mut Option<Value>,
    ) -> Outcome<()> {
        let tag = instance.tag();
        let Some(set_field) = self.bundle(tag).and_then(HintBundle::set_field_slot) else {
            return Outcome::NotApplicable;
        };

        let result = set_field(instance.as_any_mut(), name, value.take());
        settle(result, Operation::SetField, tag, name)
    }
}
