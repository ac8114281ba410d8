use crate::{dependency_resolver::Dependency, errors::InstantiateErrorKind};

/// An infallible constructor taking its dependencies as arguments.
///
/// Implemented for every `Fn(D1, .., Dn) -> T` where each `Di` is a [`Dependency`].
pub trait Constructor<T, Deps>: Send + Sync + 'static {
    fn construct(&self, dependencies: Deps) -> T;
}

/// A constructor that may fail, implemented for every `Fn(D1, .., Dn) -> Result<T, E>`.
pub trait TryConstructor<T, Deps>: Send + Sync + 'static {
    /// # Errors
    /// Returns the constructor's own error converted to [`InstantiateErrorKind`].
    fn try_construct(&self, dependencies: Deps) -> Result<T, InstantiateErrorKind>;
}

/// A member called once after construction with its resolved dependencies.
///
/// Implemented for every `Fn(&mut T, D1, .., Dn)`.
pub trait Method<T: ?Sized, Deps>: Send + Sync + 'static {
    fn invoke(&self, target: &mut T, dependencies: Deps);
}

macro_rules! impl_constructor {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, T, $($ty,)*> Constructor<T, ($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> T + Send + Sync + 'static,
            $( $ty: Dependency, )*
        {
            #[inline]
            fn construct(&self, ($($ty,)*): ($($ty,)*)) -> T {
                self($($ty),*)
            }
        }

        #[allow(non_snake_case)]
        impl<F, T, E, $($ty,)*> TryConstructor<T, ($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Result<T, E> + Send + Sync + 'static,
            E: Into<anyhow::Error>,
            $( $ty: Dependency, )*
        {
            #[inline]
            fn try_construct(&self, ($($ty,)*): ($($ty,)*)) -> Result<T, InstantiateErrorKind> {
                self($($ty),*).map_err(|err| InstantiateErrorKind::Custom(err.into()))
            }
        }

        #[allow(non_snake_case)]
        impl<F, T, $($ty,)*> Method<T, ($($ty,)*)> for F
        where
            T: ?Sized,
            F: Fn(&mut T, $($ty),*) + Send + Sync + 'static,
            $( $ty: Dependency, )*
        {
            #[inline]
            fn invoke(&self, target: &mut T, ($($ty,)*): ($($ty,)*)) {
                self(target, $($ty),*);
            }
        }
    };
}

all_the_tuples!(impl_constructor);
