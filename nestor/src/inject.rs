use alloc::sync::Arc;
use core::ops::Deref;

use crate::{
    any::{Instance, TypeKey},
    dependency_resolver::Dependency,
    errors::ResolveErrorKind,
};

/// A dependency resolved through its abstraction `Dep`.
pub struct Inject<Dep: ?Sized>(pub Arc<Dep>);

impl<Dep: ?Sized> Inject<Dep> {
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Arc<Dep> {
        self.0
    }
}

impl<Dep: ?Sized> Deref for Inject<Dep> {
    type Target = Dep;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<Dep: ?Sized + Send + Sync + 'static> Dependency for Inject<Dep> {
    #[inline]
    fn type_key() -> TypeKey {
        TypeKey::of::<Dep>()
    }

    fn from_instance(instance: &Instance) -> Result<Self, ResolveErrorKind> {
        instance.downcast::<Dep>().map(Self).ok_or_else(|| ResolveErrorKind::IncorrectType {
            expected: TypeKey::of::<Dep>(),
            actual: instance.type_key().id(),
        })
    }
}
