use alloc::sync::Arc;

use crate::{
    any::{Instance, TypeKey},
    dependency_resolver::Dependency as _,
    errors::ResolveErrorKind,
    inject::Inject,
};

/// Read access to a container: objects and bound implementation types by abstraction key.
pub trait Resolver: Send + Sync {
    /// Resolves the object bound to `type_key`, or `None` when nothing in the scope chain registers it.
    ///
    /// # Errors
    /// Fails when the object can't be built or the container is disposed.
    fn try_get_object(&self, type_key: TypeKey) -> Result<Option<Instance>, ResolveErrorKind>;

    /// Implementation type bound to `type_key`, without constructing anything.
    fn try_get_implementation(&self, type_key: TypeKey) -> Option<TypeKey>;

    /// # Errors
    /// Like [`Self::try_get_object`], and [`ResolveErrorKind::Unregistered`] when nothing registers `type_key`.
    #[inline]
    fn get_object(&self, type_key: TypeKey) -> Result<Instance, ResolveErrorKind> {
        self.try_get_object(type_key)?
            .ok_or(ResolveErrorKind::Unregistered { type_key })
    }

    /// # Errors
    /// Returns [`ResolveErrorKind::Unregistered`] when nothing registers `type_key`.
    #[inline]
    fn get_implementation(&self, type_key: TypeKey) -> Result<TypeKey, ResolveErrorKind> {
        self.try_get_implementation(type_key)
            .ok_or(ResolveErrorKind::Unregistered { type_key })
    }

    #[inline]
    fn contains_key(&self, type_key: TypeKey) -> bool {
        self.try_get_implementation(type_key).is_some()
    }
}

pub(crate) fn downcast_instance<T>(instance: &Instance) -> Result<Arc<T>, ResolveErrorKind>
where
    T: ?Sized + Send + Sync + 'static,
{
    Inject::<T>::from_instance(instance).map(Inject::into_inner)
}

impl dyn Resolver {
    /// Typed form of [`Resolver::get_object`].
    ///
    /// # Errors
    /// See [`Resolver::get_object`].
    #[inline]
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        downcast_instance(&self.get_object(TypeKey::of::<T>())?)
    }

    /// Typed form of [`Resolver::try_get_object`].
    ///
    /// # Errors
    /// See [`Resolver::try_get_object`].
    #[inline]
    pub fn try_get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, ResolveErrorKind> {
        self.try_get_object(TypeKey::of::<T>())?
            .map(|instance| downcast_instance(&instance))
            .transpose()
    }

    /// # Errors
    /// Returns [`ResolveErrorKind::Unregistered`] when nothing registers `T`.
    #[inline]
    pub fn get_type<T: ?Sized + 'static>(&self) -> Result<TypeKey, ResolveErrorKind> {
        self.get_implementation(TypeKey::of::<T>())
    }

    #[inline]
    #[must_use]
    pub fn try_get_type<T: ?Sized + 'static>(&self) -> Option<TypeKey> {
        self.try_get_implementation(TypeKey::of::<T>())
    }

    #[inline]
    #[must_use]
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.contains_key(TypeKey::of::<T>())
    }
}
