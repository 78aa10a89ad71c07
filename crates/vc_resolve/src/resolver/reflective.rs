use core::mem;

use crate::args::Arguments;
use crate::error::{MemberError, Operation, ResolveError, Site};
use crate::introspect::{IntrospectionIndex, TypeIntrospection};
use crate::outcome::Outcome;
use crate::resolver::Resolver;
use crate::value::{Instance, InstanceMut, TypeTag, Value};

/// Serves requests from generated introspection tables.
///
/// Applicable to exactly the types of its [`IntrospectionIndex`].
/// For those, a missing member is a failure, not a reason to decline.
///
/// Member lookup rules are described on [`TypeIntrospection`].
#[derive(Debug, Clone, Default)]
pub struct ReflectiveResolver {
    index: IntrospectionIndex,
}

impl ReflectiveResolver {
    /// A resolver over every discovered introspected type,
    /// see [`IntrospectionIndex::discover`].
    #[inline]
    pub fn discover() -> Self {
        Self::with_index(IntrospectionIndex::discover())
    }

    #[inline]
    pub fn with_index(index: IntrospectionIndex) -> Self {
        Self { index }
    }

    #[inline]
    pub fn index(&self) -> &IntrospectionIndex {
        &self.index
    }

    #[inline]
    fn table(&self, tag: TypeTag) -> Option<&'static TypeIntrospection> {
        self.index.get_tag(tag)
    }
}

fn settle<T>(
    result: Result<T, MemberError>,
    operation: Operation,
    target: TypeTag,
    name: &str,
) -> Outcome<T> {
    result
        .map_err(|err| ResolveError::failed(Site::new(operation, target, name), err))
        .into()
}

impl Resolver for ReflectiveResolver {
    fn construct(&self, target: TypeTag, name: &str, args: &mut Arguments) -> Outcome<Value> {
        let Some(table) = self.table(target) else {
            return Outcome::NotApplicable;
        };
        settle(
            table.construct(name, mem::take(args)),
            Operation::Construct,
            target,
            name,
        )
    }

    fn invoke(
        &self,
        instance: &mut InstanceMut<'_>,
        name: &str,
        args: &mut Arguments,
    ) -> Outcome<Option<Value>> {
        let tag = instance.tag();
        let Some(table) = self.table(tag) else {
            return Outcome::NotApplicable;
        };
        let result = table.invoke(instance.as_any_mut(), name, mem::take(args));
        settle(result, Operation::Invoke, tag, name)
    }

    fn get_field(&self, instance: Instance<'_>, name: &str) -> Outcome<Option<Value>> {
        let tag = instance.tag();
        let Some(table) = self.table(tag) else {
            return Outcome::NotApplicable;
        };
        settle(table.get_field(instance.as_any(), name), Operation::GetField, tag, name)
    }

    fn set_field(
        &self,
        instance: &mut InstanceMut<'_>,
        name: &str,
        value: &mut Option<Value>,
    ) -> Outcome<()> {
        let tag = instance.tag();
        let Some(table) = self.table(tag) else {
            return Outcome::NotApplicable;
        };
        let result = table.set_field(instance.as_any_mut(), name, value.take());
        settle(result, Operation::SetField, tag, name)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::ReflectiveResolver;
    use crate::args::Arguments;
    use crate::derive::{Introspect, introspect_methods};
    use crate::error::{MemberError, MemberKind};
    use crate::introspect::IntrospectionIndex;
    use crate::resolver::Resolver;
    use crate::value::{Instance, InstanceMut, TypeTag, Value};

    #[derive(Introspect)]
    #[introspect(methods)]
    struct Circle {
        radius: u32,
        #[introspect(readonly)]
        label: String,
    }

    #[introspect_methods]
    impl Circle {
        fn unit() -> Self {
            Self {
                radius: 1,
                label: String::from("unit"),
            }
        }

        fn diameter(&self) -> u32 {
            self.radius * 2
        }

        fn set_diameter(&mut self, diameter: u32) {
            self.radius = diameter / 2;
        }

        fn grow(&mut self, by: u32) {
            self.radius += by;
        }
    }

    struct Foreign;

    fn resolver() -> ReflectiveResolver {
        ReflectiveResolver::with_index(IntrospectionIndex::new().with::<Circle>())
    }

    #[test]
    fn constructs_by_name() {
        let resolver = resolver();
        let tag = TypeTag::of::<Circle>();

        let unit = resolver.construct(tag, "unit", &mut Arguments::new()).handled().unwrap();
        assert_eq!(unit.downcast_ref::<Circle>().unwrap().radius, 1);

        let mut args = Arguments::new().with(3_u32).with(String::from("c"));
        let literal = resolver.construct(tag, "", &mut args).handled().unwrap();
        assert_eq!(literal.downcast_ref::<Circle>().unwrap().label, "c");
    }

    #[test]
    fn members_of_known_types_fail_when_missing() {
        let resolver = resolver();
        let mut circle = Circle::unit();

        let err = resolver
            .invoke(&mut InstanceMut::new(&mut circle), "shrink", &mut Arguments::new())
            .failure()
            .unwrap();
        assert!(matches!(err.member_error(), Some(MemberError::NotFound(MemberKind::Method))));

        let err = resolver
            .get_field(Instance::new(&circle), "area")
            .failure()
            .unwrap();
        assert!(matches!(err.member_error(), Some(MemberError::NotFound(MemberKind::Field))));
    }

    #[test]
    fn unknown_types_decline() {
        let resolver = resolver();
        let mut args = Arguments::new().with(1_u8);
        let out = resolver.construct(TypeTag::of::<Foreign>(), "", &mut args);
        assert!(out.is_not_applicable());
        assert_eq!(args.positional_len(), 1);

        let mut foreign = Foreign;
        let mut value = Some(Value::new(0_u8));
        let out = resolver.set_field(&mut InstanceMut::new(&mut foreign), "x", &mut value);
        assert!(out.is_not_applicable());
        assert!(value.is_some());
    }

    #[test]
    fn getters_and_setters() {
        let resolver = resolver();
        let mut circle = Value::new(Circle::unit());

        let d = resolver.get_field(Instance::new(&circle), "diameter").handled().unwrap();
        assert_eq!(d.unwrap().take::<u32>().ok(), Some(2));

        let mut value = Some(Value::new(10_u32));
        let out = resolver.set_field(&mut InstanceMut::new(&mut circle), "diameter", &mut value);
        assert!(out.is_handled());
        assert_eq!(circle.downcast_ref::<Circle>().unwrap().radius, 5);

        let mut value = Some(Value::new(String::from("x")));
        let err = resolver
            .set_field(&mut InstanceMut::new(&mut circle), "label", &mut value)
            .failure()
            .unwrap();
        assert!(matches!(err.member_error(), Some(MemberError::Immutable)));

        let out = resolver.invoke(
            &mut InstanceMut::new(&mut circle),
            "grow",
            &mut Arguments::new().with_named("by", 1_u32),
        );
        assert!(matches!(out.handled(), Some(None)));
        assert_eq!(circle.downcast_ref::<Circle>().unwrap().radius, 6);
    }
}
