use alloc::sync::Arc;
use core::any::Any;
use tracing::error;

use crate::{
    any::{Instance, TypeKey},
    descriptor::DisposeFn,
};

/// Called with the cached object when the container holding it is disposed.
pub trait Finalizer<Dep: ?Sized>: Send + Sync + 'static {
    fn finalize(&self, dependency: Arc<Dep>);
}

impl<F, Dep> Finalizer<Dep> for F
where
    F: Fn(Arc<Dep>) + Send + Sync + 'static,
    Dep: ?Sized,
{
    #[inline]
    fn finalize(&self, dependency: Arc<Dep>) {
        self(dependency);
    }
}

/// Release hook of an object, run when the container caching it is disposed.
///
/// Enabled per type with [`crate::Describe::disposable`], for pre-built instances with
/// [`crate::Builder::disposable_instance`].
pub trait Dispose: Send + Sync + 'static {
    fn dispose(&self);
}

#[must_use]
pub(crate) fn boxed_dispose<T: Dispose>() -> DisposeFn {
    Arc::new(|object: &(dyn Any + Send + Sync + 'static)| match object.downcast_ref::<T>() {
        Some(object) => object.dispose(),
        None => error!(expected = %TypeKey::of::<T>(), "Dispose skipped for incorrect type"),
    })
}

pub(crate) type BoxedFinalizer = Arc<dyn Fn(&Instance) + Send + Sync>;

#[must_use]
pub(crate) fn boxed_finalizer_factory<Dep, Fin>(finalizer: Fin) -> BoxedFinalizer
where
    Dep: ?Sized + Send + Sync + 'static,
    Fin: Finalizer<Dep>,
{
    Arc::new(move |instance: &Instance| match instance.downcast::<Dep>() {
        Some(dependency) => finalizer.finalize(dependency),
        None => error!(
            expected = %TypeKey::of::<Dep>(),
            actual = %instance.type_key(),
            "Finalizer skipped for incorrect type"
        ),
    })
}
