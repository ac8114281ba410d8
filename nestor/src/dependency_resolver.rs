use alloc::{vec, vec::Vec};

use crate::{
    any::{Instance, TypeKey},
    errors::ResolveErrorKind,
    resolver::Resolver,
};

/// A single injectable argument: a constructor/method parameter, a field or a property value.
pub trait Dependency: Sized {
    /// Abstraction the argument is resolved by.
    fn type_key() -> TypeKey;

    fn from_instance(instance: &Instance) -> Result<Self, ResolveErrorKind>;

    #[inline]
    fn resolve(resolver: &dyn Resolver) -> Result<Self, ResolveErrorKind> {
        Self::from_instance(&resolver.get_object(Self::type_key())?)
    }
}

/// An ordered list of arguments, implemented for tuples of [`Dependency`].
pub trait Dependencies: Sized {
    fn type_keys() -> Vec<TypeKey>;

    /// Builds the arguments from already resolved instances, in declaration order.
    fn from_instances(instances: &[Instance]) -> Result<Self, ResolveErrorKind>;

    /// Resolves the arguments one by one, in declaration order.
    fn resolve(resolver: &dyn Resolver) -> Result<Self, ResolveErrorKind>;
}

macro_rules! impl_dependencies {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut)]
        impl<$($ty,)*> Dependencies for ($($ty,)*)
        where
            $( $ty: Dependency, )*
        {
            #[inline]
            fn type_keys() -> Vec<TypeKey> {
                vec![$($ty::type_key()),*]
            }

            #[inline]
            #[allow(unused_variables)]
            fn from_instances(instances: &[Instance]) -> Result<Self, ResolveErrorKind> {
                let mut instances = instances.iter();
                Ok(($(
                    $ty::from_instance(
                        instances
                            .next()
                            .ok_or_else(|| ResolveErrorKind::MissingArgument { expected: $ty::type_key() })?,
                    )?,
                )*))
            }

            #[inline]
            #[allow(unused_variables)]
            fn resolve(resolver: &dyn Resolver) -> Result<Self, ResolveErrorKind> {
                Ok(($($ty::resolve(resolver)?,)*))
            }
        }
    };
}

all_the_tuples!(impl_dependencies);

#[cfg(test)]
mod tests {
    extern crate std;

    use super::Dependencies;
    use crate::{
        any::{Instance, TypeKey},
        errors::ResolveErrorKind,
        inject::Inject,
    };

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
        vec,
    };
    use tracing_test::traced_test;

    struct A(u8);
    struct B(u16);

    #[test]
    #[traced_test]
    fn test_from_instances_in_order() {
        type Args = (Inject<A>, Inject<B>);

        assert_eq!(Args::type_keys(), vec![TypeKey::of::<A>(), TypeKey::of::<B>()]);

        let instances = [Instance::new(Arc::new(A(1))), Instance::new(Arc::new(B(2)))];
        let (Inject(a), Inject(b)) = Args::from_instances(&instances).unwrap();
        assert_eq!(a.0, 1);
        assert_eq!(b.0, 2);

        let swapped = [Instance::new(Arc::new(B(2))), Instance::new(Arc::new(A(1)))];
        assert!(matches!(
            Args::from_instances(&swapped),
            Err(ResolveErrorKind::IncorrectType { .. })
        ));
        assert!(matches!(
            Args::from_instances(&instances[..1]),
            Err(ResolveErrorKind::MissingArgument { expected }) if expected == TypeKey::of::<B>()
        ));
    }
}
