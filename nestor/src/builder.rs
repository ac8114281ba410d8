use alloc::{collections::BTreeMap, sync::Arc};
use core::{iter, mem};
use tracing::{debug, error, info};

use crate::{
    any::{TypeKey, Upcast},
    container::Container,
    descriptor::Injectable,
    errors::BuildErrorKind,
    finalizer::{boxed_dispose, boxed_finalizer_factory, BoxedFinalizer, Dispose, Finalizer},
    injector::{Injector, ReflectionInjector},
    lifetime::Lifetime,
    registry::{Registration, Registry},
    resolver::Resolver,
    validator::DependencyValidator,
};

/// Collects registrations and builds a validated [`Container`], either a root or a child scope.
///
/// Registering an abstraction twice replaces the earlier registration.
pub struct Builder {
    registrations: BTreeMap<TypeKey, Registration>,
    finalizers: BTreeMap<TypeKey, BoxedFinalizer>,
    injector: Arc<dyn Injector>,
    parent: Option<Container>,
    built: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Builder of a root container using [`ReflectionInjector`].
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_injector(Arc::new(ReflectionInjector::new()))
    }

    /// Builder of a root container using `injector` for this container and all its scopes.
    #[inline]
    #[must_use]
    pub fn with_injector(injector: Arc<dyn Injector>) -> Self {
        Self {
            registrations: BTreeMap::new(),
            finalizers: BTreeMap::new(),
            injector,
            parent: None,
            built: false,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn child_of(parent: Container) -> Self {
        let mut builder = Self::with_injector(Arc::clone(parent.injector()));
        builder.parent = Some(parent);
        builder
    }

    /// Binds the abstraction `TBase` to the implementation `TDerived`.
    #[inline]
    #[must_use]
    pub fn register<TBase, TDerived>(mut self, lifetime: Lifetime) -> Self
    where
        TBase: ?Sized + Send + Sync + 'static,
        TDerived: Injectable + Upcast<TBase> + Send + Sync,
    {
        self.injector.metadata().describe::<TDerived>();
        self.insert(TypeKey::of::<TBase>(), Registration::construct::<TBase, TDerived>(lifetime));
        self
    }

    /// Binds `T` to itself.
    #[inline]
    #[must_use]
    pub fn register_self<T>(self, lifetime: Lifetime) -> Self
    where
        T: Injectable + Send + Sync,
    {
        self.register::<T, T>(lifetime)
    }

    /// Supplies a pre-built singleton under its own type. It's never constructed or injected.
    #[inline]
    #[must_use]
    pub fn instance<T>(self, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.instance_as::<T, T>(value)
    }

    /// Supplies a pre-built singleton under the abstraction `TBase`.
    #[inline]
    #[must_use]
    pub fn instance_as<TBase, TDerived>(mut self, value: TDerived) -> Self
    where
        TBase: ?Sized + Send + Sync + 'static,
        TDerived: Upcast<TBase> + Send + Sync + 'static,
    {
        self.insert(TypeKey::of::<TBase>(), Registration::instance::<TBase, TDerived>(value, None));
        self
    }

    /// Like [`Self::instance`], and [`Dispose::dispose`] is called when this container is disposed.
    #[inline]
    #[must_use]
    pub fn disposable_instance<T>(self, value: T) -> Self
    where
        T: Dispose,
    {
        self.disposable_instance_as::<T, T>(value)
    }

    /// Like [`Self::instance_as`], and [`Dispose::dispose`] is called when this container is disposed.
    #[inline]
    #[must_use]
    pub fn disposable_instance_as<TBase, TDerived>(mut self, value: TDerived) -> Self
    where
        TBase: ?Sized + Send + Sync + 'static,
        TDerived: Upcast<TBase> + Dispose,
    {
        self.insert(
            TypeKey::of::<TBase>(),
            Registration::instance::<TBase, TDerived>(value, Some(boxed_dispose::<TDerived>())),
        );
        self
    }

    /// Called with every object cached under `Dep` when the container caching it is disposed.
    #[inline]
    #[must_use]
    pub fn add_finalizer<Dep, Fin>(mut self, finalizer: Fin) -> Self
    where
        Dep: ?Sized + Send + Sync + 'static,
        Fin: Finalizer<Dep>,
    {
        self.finalizers
            .insert(TypeKey::of::<Dep>(), boxed_finalizer_factory(finalizer));
        self
    }

    fn insert(&mut self, type_key: TypeKey, registration: Registration) {
        if let Some(replaced) = self.registrations.insert(type_key, registration) {
            debug!(%type_key, replaced = %replaced.implementation(), "Registration replaced");
        }
    }

    /// Freezes the registrations, creates the container and validates it.
    ///
    /// The container is registered under [`Container`] and `dyn` [`Resolver`], so it can be injected.
    /// A child scope is attached to its parent only when the build succeeds.
    ///
    /// # Errors
    /// - [`BuildErrorKind::AlreadyBuilt`] on a second call.
    /// - [`BuildErrorKind::Disposed`] when the parent is disposed.
    /// - [`BuildErrorKind::MissingDependency`] listing every unresolvable dependency,
    ///   otherwise [`BuildErrorKind::CircularDependency`] listing every cycle.
    pub fn build(&mut self) -> Result<Container, BuildErrorKind> {
        if self.built {
            let err = BuildErrorKind::AlreadyBuilt;
            error!("{}", err);
            return Err(err);
        }
        self.built = true;

        if let Some(parent) = &self.parent {
            if parent.is_disposed() {
                let err = BuildErrorKind::Disposed;
                error!("{}", err);
                return Err(err);
            }
        }

        let mut registry = Registry {
            registrations: mem::take(&mut self.registrations),
            finalizers: mem::take(&mut self.finalizers),
        };
        registry
            .registrations
            .entry(TypeKey::of::<Container>())
            .or_insert_with(Registration::scope);
        registry
            .registrations
            .entry(TypeKey::of::<dyn Resolver>())
            .or_insert_with(Registration::resolver);

        let container = Container::new(registry, Arc::clone(&self.injector), self.parent.clone());

        let parents = iter::successors(container.parent(), |parent| parent.parent()).map(Container::registrations);
        let report = DependencyValidator::new(&container, self.injector.as_ref(), container.registrations())
            .with_parents(parents)
            .validate();
        if let Err(err) = report.into_result() {
            error!("{}", err);
            container.discard();
            return Err(err);
        }

        container.seed_instances();
        if let Some(parent) = &self.parent {
            parent.attach_child(&container);
        }

        info!(
            registrations = container.registrations().len(),
            depth = container.depth(),
            "Container built"
        );
        Ok(container)
    }
}
