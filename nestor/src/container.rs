use alloc::{
    collections::BTreeMap,
    sync::{Arc, Weak},
    vec::Vec,
};
use core::{
    mem, ptr,
    sync::atomic::{AtomicBool, Ordering},
};
use parking_lot::Mutex;
use tracing::{debug, error, info_span};

use crate::{
    any::{Instance, TypeKey},
    builder::Builder,
    cache::{Cache, Resolved},
    descriptor::Injectable,
    errors::{BuildErrorKind, ResolveErrorKind},
    injector::Injector,
    lifetime::Lifetime,
    registry::{BindFn, Bound, Provider, Registration, Registry},
    resolver::Resolver,
};

/// A node of the scope tree: frozen registrations, cached objects and a link to the parent scope.
///
/// Cloning is cheap and yields a handle to the same container.
/// The container is disposed by [`Self::dispose`] or when its last handle is dropped.
#[derive(Clone)]
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

impl Container {
    #[must_use]
    pub(crate) fn new(registry: Registry, injector: Arc<dyn Injector>, parent: Option<Container>) -> Self {
        let depth = parent.as_ref().map_or(0, |parent| parent.inner.depth + 1);
        Self {
            inner: Arc::new(ContainerInner {
                cache: Mutex::new(Cache::new()),
                registry,
                injector,
                parent,
                children: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(false),
                depth,
            }),
        }
    }

    /// Shortcut for [`Builder::new`].
    #[inline]
    #[must_use]
    pub fn builder() -> Builder {
        Builder::new()
    }

    #[inline]
    fn resolver(&self) -> &(dyn Resolver + 'static) {
        self
    }

    /// Resolves the object bound to `T`.
    ///
    /// # Errors
    /// - [`ResolveErrorKind::Unregistered`] when no container in the scope chain registers `T`.
    /// - [`ResolveErrorKind::Disposed`] after [`Self::dispose`].
    /// - Any error of creating the object or one of its dependencies.
    #[inline]
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.resolver().get::<T>()
    }

    /// Like [`Self::get`], but `Ok(None)` when `T` isn't registered.
    ///
    /// # Errors
    /// Construction errors are still returned.
    #[inline]
    pub fn try_get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, ResolveErrorKind> {
        self.resolver().try_get::<T>()
    }

    /// Implementation type bound to `T`, without constructing anything.
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::Unregistered`] when no container in the scope chain registers `T`.
    #[inline]
    pub fn get_type<T: ?Sized + 'static>(&self) -> Result<TypeKey, ResolveErrorKind> {
        self.resolver().get_type::<T>()
    }

    #[inline]
    #[must_use]
    pub fn try_get_type<T: ?Sized + 'static>(&self) -> Option<TypeKey> {
        self.resolver().try_get_type::<T>()
    }

    #[inline]
    #[must_use]
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.resolver().contains::<T>()
    }

    /// Injects the marked fields, properties and methods of an object created outside the container.
    ///
    /// # Errors
    /// Returns the first error of resolving a member's dependency.
    pub fn inject<T>(&self, object: &mut T) -> Result<(), ResolveErrorKind>
    where
        T: Injectable + Send + Sync,
    {
        if self.is_disposed() {
            let err = ResolveErrorKind::Disposed;
            error!("{}", err);
            return Err(err);
        }

        let type_key = self.inner.injector.metadata().describe::<T>();
        self.inner.injector.inject(type_key, object, self)
    }

    /// Builder of a child scope. Its registrations shadow this container's for lookups made through the child.
    #[inline]
    #[must_use]
    pub fn scope_builder(&self) -> Builder {
        Builder::child_of(self.clone())
    }

    /// Child scope without own registrations.
    ///
    /// # Errors
    /// See [`Builder::build`].
    #[inline]
    pub fn create_scope(&self) -> Result<Container, BuildErrorKind> {
        self.scope_builder().build()
    }

    /// Child scope with registrations added by `configure`.
    ///
    /// # Errors
    /// See [`Builder::build`].
    #[inline]
    pub fn create_scope_with<F>(&self, configure: F) -> Result<Container, BuildErrorKind>
    where
        F: FnOnce(Builder) -> Builder,
    {
        configure(self.scope_builder()).build()
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&Container> {
        self.inner.parent.as_ref()
    }

    /// Live child scopes, oldest first.
    #[must_use]
    pub fn child_scopes(&self) -> Vec<Container> {
        self.inner
            .children
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .map(|inner| Container { inner })
            .collect()
    }

    #[inline]
    #[must_use]
    pub fn injector(&self) -> &Arc<dyn Injector> {
        &self.inner.injector
    }

    /// Distance from the root container, `0` for the root.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// `true` when both handles refer to the same container.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Disposes child scopes first, most recent first, then releases the cached objects in reverse resolution order.
    /// Resolving from a disposed container fails with [`ResolveErrorKind::Disposed`].
    ///
    /// Calling it again does nothing.
    #[inline]
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    #[inline]
    pub(crate) fn registrations(&self) -> &BTreeMap<TypeKey, Registration> {
        &self.inner.registry.registrations
    }

    pub(crate) fn attach_child(&self, child: &Container) {
        self.inner.children.lock().push(Arc::downgrade(&child.inner));
        debug!(depth = child.inner.depth, "Child scope attached");
    }

    /// Marks a container that failed validation as disposed, without running any release hook.
    pub(crate) fn discard(&self) {
        self.inner.disposed.store(true, Ordering::Release);
    }

    /// Caches the pre-built instances registered in this container, so they are released with it.
    pub(crate) fn seed_instances(&self) {
        let mut cache = self.inner.cache.lock();
        for (type_key, registration) in &self.inner.registry.registrations {
            if let Provider::Instance {
                instance,
                object,
                dispose,
            } = &registration.provider
            {
                let resolved = Resolved {
                    type_key: *type_key,
                    instance: instance.clone(),
                    object: Arc::clone(object),
                    dispose: dispose.clone(),
                    finalizer: self.inner.registry.finalizer(type_key),
                };
                let _ = cache.insert_first(resolved);
            }
        }
    }

    fn find_registration(&self, type_key: &TypeKey) -> Option<(&Container, &Registration)> {
        let mut container = self;
        loop {
            if let Some(registration) = container.inner.registry.get(type_key) {
                return Some((container, registration));
            }
            container = container.inner.parent.as_ref()?;
        }
    }

    fn create(&self, registration: &Registration, bind: BindFn) -> Result<Bound, ResolveErrorKind> {
        let implementation = registration.implementation();
        let injector = &self.inner.injector;

        let mut object = injector.create_object(implementation, self)?;
        injector.inject(implementation, &mut *object, self)?;
        bind(object)
    }

    /// Returns the object cached here under `type_key`, creating and caching it with this container as resolver.
    fn get_or_create(
        &self,
        type_key: TypeKey,
        registration: &Registration,
        bind: BindFn,
        owner: &Container,
    ) -> Result<Instance, ResolveErrorKind> {
        if self.is_disposed() {
            let err = ResolveErrorKind::Disposed;
            error!("{}", err);
            return Err(err);
        }

        if let Some(instance) = self.inner.cache.lock().get(&type_key) {
            debug!(depth = self.inner.depth, "Found in owner cache");
            return Ok(instance);
        }

        let Bound { instance, object } = self.create(registration, bind)?;
        let resolved = Resolved {
            type_key,
            instance,
            object,
            dispose: self
                .inner
                .injector
                .metadata()
                .get_info(registration.implementation())
                .disposer(),
            finalizer: owner.inner.registry.finalizer(&type_key),
        };

        match self.inner.cache.lock().insert_first(resolved) {
            Ok(instance) => {
                debug!(lifetime = %registration.lifetime(), depth = self.inner.depth, "Cached");
                Ok(instance)
            }
            Err(instance) => {
                debug!("Cached by a concurrent resolution, dropping own instance");
                Ok(instance)
            }
        }
    }
}

impl Resolver for Container {
    fn try_get_object(&self, type_key: TypeKey) -> Result<Option<Instance>, ResolveErrorKind> {
        let span = info_span!("get", dependency = type_key.name(), depth = self.inner.depth);
        let _guard = span.enter();

        if self.is_disposed() {
            let err = ResolveErrorKind::Disposed;
            error!("{}", err);
            return Err(err);
        }

        if let Some(instance) = self.inner.cache.lock().get(&type_key) {
            debug!("Found in cache");
            return Ok(Some(instance));
        }
        debug!("Not found in cache");

        let Some((owner, registration)) = self.find_registration(&type_key) else {
            debug!("Not registered");
            return Ok(None);
        };

        let instance = match &registration.provider {
            Provider::Instance { instance, .. } => instance.clone(),
            Provider::Scope(provide) => provide(self),
            Provider::Construct(bind) => {
                let result = match registration.lifetime() {
                    Lifetime::Singleton => owner.get_or_create(type_key, registration, *bind, owner),
                    Lifetime::Scoped => self.get_or_create(type_key, registration, *bind, owner),
                    Lifetime::Transient => self
                        .create(registration, *bind)
                        .map(|Bound { instance, .. }| instance),
                };
                result.inspect_err(|err| error!("{}", err))?
            }
        };

        Ok(Some(instance))
    }

    fn try_get_implementation(&self, type_key: TypeKey) -> Option<TypeKey> {
        if self.is_disposed() {
            return None;
        }
        self.find_registration(&type_key)
            .map(|(_, registration)| registration.implementation())
    }
}

pub(crate) struct ContainerInner {
    cache: Mutex<Cache>,
    registry: Registry,
    injector: Arc<dyn Injector>,
    parent: Option<Container>,
    children: Mutex<Vec<Weak<ContainerInner>>>,
    disposed: AtomicBool,
    depth: usize,
}

impl ContainerInner {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let children = mem::take(&mut *self.children.lock());
        for child in children.iter().rev().filter_map(Weak::upgrade) {
            child.dispose();
        }

        let mut resolved_set = self.cache.lock().take_resolved_set();
        while let Some(Resolved {
            type_key,
            instance,
            object,
            dispose,
            finalizer,
        }) = resolved_set.0.pop_back()
        {
            if let Some(finalizer) = finalizer {
                finalizer(&instance);
                debug!(%type_key, "Finalizer called");
            }
            if let Some(dispose) = dispose {
                dispose(&*object);
                debug!(%type_key, "Dispose called");
            }
        }
        self.cache.lock().clear();

        if let Some(parent) = &self.parent {
            parent
                .inner
                .children
                .lock()
                .retain(|child| !ptr::eq(child.as_ptr(), self));
        }

        debug!(depth = self.depth, "Container disposed");
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        if !self.disposed.load(Ordering::Acquire) {
            self.dispose();
            debug!("Container disposed on drop");
        }
    }
}
