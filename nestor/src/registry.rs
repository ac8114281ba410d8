use alloc::{collections::BTreeMap, sync::Arc};
use core::any::Any;

use crate::{
    any::{Instance, TypeKey, Upcast},
    container::Container,
    descriptor::{DisposeFn, Object},
    errors::ResolveErrorKind,
    finalizer::BoxedFinalizer,
    lifetime::Lifetime,
    resolver::Resolver,
};

/// A created object bound to its abstraction.
pub(crate) struct Bound {
    pub(crate) instance: Instance,
    /// The object under its concrete type, used by release hooks.
    pub(crate) object: Arc<dyn Any + Send + Sync>,
}

pub(crate) type BindFn = fn(Object) -> Result<Bound, ResolveErrorKind>;

pub(crate) fn bind<TBase, TDerived>(object: Object) -> Result<Bound, ResolveErrorKind>
where
    TBase: ?Sized + Send + Sync + 'static,
    TDerived: Upcast<TBase> + Send + Sync + 'static,
{
    let object = object
        .downcast::<TDerived>()
        .map_err(|object| ResolveErrorKind::IncorrectType {
            expected: TypeKey::of::<TDerived>(),
            actual: (*object).type_id(),
        })?;
    let object = Arc::<TDerived>::from(object);

    Ok(Bound {
        instance: Instance::new(<TDerived as Upcast<TBase>>::upcast(Arc::clone(&object))),
        object,
    })
}

#[derive(Clone)]
pub(crate) enum Provider {
    /// Created by the injector, then bound to the abstraction.
    Construct(BindFn),
    /// Supplied pre-built, never constructed.
    Instance {
        instance: Instance,
        object: Arc<dyn Any + Send + Sync>,
        dispose: Option<DisposeFn>,
    },
    /// The resolving container itself.
    Scope(fn(&Container) -> Instance),
}

/// Binding of an abstraction to its implementation within one container level.
#[derive(Clone)]
pub struct Registration {
    implementation: TypeKey,
    lifetime: Lifetime,
    pub(crate) provider: Provider,
}

impl Registration {
    #[must_use]
    pub(crate) fn construct<TBase, TDerived>(lifetime: Lifetime) -> Self
    where
        TBase: ?Sized + Send + Sync + 'static,
        TDerived: Upcast<TBase> + Send + Sync + 'static,
    {
        Self {
            implementation: TypeKey::of::<TDerived>(),
            lifetime,
            provider: Provider::Construct(bind::<TBase, TDerived>),
        }
    }

    #[must_use]
    pub(crate) fn instance<TBase, TDerived>(value: TDerived, dispose: Option<DisposeFn>) -> Self
    where
        TBase: ?Sized + Send + Sync + 'static,
        TDerived: Upcast<TBase> + Send + Sync + 'static,
    {
        let object = Arc::new(value);
        Self {
            implementation: TypeKey::of::<TDerived>(),
            lifetime: Lifetime::Singleton,
            provider: Provider::Instance {
                instance: Instance::new(<TDerived as Upcast<TBase>>::upcast(Arc::clone(&object))),
                object,
                dispose,
            },
        }
    }

    #[must_use]
    pub(crate) fn scope() -> Self {
        Self {
            implementation: TypeKey::of::<Container>(),
            lifetime: Lifetime::Scoped,
            provider: Provider::Scope(|container| Instance::new(Arc::new(container.clone()))),
        }
    }

    #[must_use]
    pub(crate) fn resolver() -> Self {
        Self {
            implementation: TypeKey::of::<Container>(),
            lifetime: Lifetime::Scoped,
            provider: Provider::Scope(|container| {
                let resolver: Arc<dyn Resolver> = Arc::new(container.clone());
                Instance::new(resolver)
            }),
        }
    }

    #[inline]
    #[must_use]
    pub const fn implementation(&self) -> TypeKey {
        self.implementation
    }

    #[inline]
    #[must_use]
    pub const fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// `true` when the injector creates the implementation, as opposed to pre-built instances
    /// and the container's own registration.
    #[inline]
    #[must_use]
    pub const fn is_constructed(&self) -> bool {
        matches!(self.provider, Provider::Construct(_))
    }
}

/// Frozen registrations and finalizers of one container level.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) registrations: BTreeMap<TypeKey, Registration>,
    pub(crate) finalizers: BTreeMap<TypeKey, BoxedFinalizer>,
}

impl Registry {
    #[inline]
    #[must_use]
    pub(crate) fn get(&self, type_key: &TypeKey) -> Option<&Registration> {
        self.registrations.get(type_key)
    }

    #[inline]
    #[must_use]
    pub(crate) fn finalizer(&self, type_key: &TypeKey) -> Option<BoxedFinalizer> {
        self.finalizers.get(type_key).cloned()
    }
}
