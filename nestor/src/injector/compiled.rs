use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};
use core::any::Any;
use parking_lot::Mutex;
use tracing::{debug, error};

use super::Injector;
use crate::{
    any::TypeKey,
    descriptor::{CompiledApplyFn, CompiledConstructFn, Object},
    errors::ResolveErrorKind,
    metadata::{InjectionInfo, TypeMetadataCache},
    resolver::Resolver,
};

type CreateFn = Arc<dyn Fn(&dyn Resolver) -> Result<Object, ResolveErrorKind> + Send + Sync>;
type InjectFn = Arc<dyn Fn(&mut (dyn Any + Send + Sync + 'static), &dyn Resolver) -> Result<(), ResolveErrorKind> + Send + Sync>;

/// Composes one specialized create closure and one inject closure per type on first use, then replays them.
///
/// The closures call the monomorphized members directly, so no argument vectors are built per call.
pub struct CompiledInjector {
    metadata: Arc<TypeMetadataCache>,
    creators: Mutex<BTreeMap<TypeKey, CreateFn>>,
    injectors: Mutex<BTreeMap<TypeKey, InjectFn>>,
}

impl CompiledInjector {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_metadata(Arc::new(TypeMetadataCache::new()))
    }

    #[inline]
    #[must_use]
    pub fn with_metadata(metadata: Arc<TypeMetadataCache>) -> Self {
        Self {
            metadata,
            creators: Mutex::new(BTreeMap::new()),
            injectors: Mutex::new(BTreeMap::new()),
        }
    }

    /// Compiles the closures of every type in `type_keys` ahead of the first resolution.
    pub fn warm_up<I>(&self, type_keys: I)
    where
        I: IntoIterator<Item = TypeKey>,
    {
        for type_key in type_keys {
            let _ = self.creator(type_key);
            let _ = self.injector(type_key);
        }
    }

    /// Number of types with a compiled create closure.
    #[inline]
    #[must_use]
    pub fn compiled_len(&self) -> usize {
        self.creators.lock().len()
    }

    fn creator(&self, type_key: TypeKey) -> CreateFn {
        if let Some(create) = self.creators.lock().get(&type_key) {
            return Arc::clone(create);
        }

        let create = compile_create(&self.metadata.get_info(type_key));
        if !self.metadata.is_described(type_key) {
            return create;
        }
        debug!(%type_key, "Create compiled");

        Arc::clone(self.creators.lock().entry(type_key).or_insert(create))
    }

    fn injector(&self, type_key: TypeKey) -> InjectFn {
        if let Some(inject) = self.injectors.lock().get(&type_key) {
            return Arc::clone(inject);
        }

        let inject = compile_inject(&self.metadata.get_info(type_key));
        if !self.metadata.is_described(type_key) {
            return inject;
        }
        debug!(%type_key, "Inject compiled");

        Arc::clone(self.injectors.lock().entry(type_key).or_insert(inject))
    }
}

fn compile_create(info: &InjectionInfo) -> CreateFn {
    if let Some(constructor) = info.constructor() {
        let construct: CompiledConstructFn = Arc::clone(&constructor.compiled);
        return construct;
    }

    if let Some(allocate) = info.allocator() {
        let allocate = Arc::clone(allocate);
        return Arc::new(move |_: &dyn Resolver| Ok(allocate()));
    }

    let type_key = info.type_key();
    Arc::new(move |_: &dyn Resolver| {
        let err = ResolveErrorKind::AbstractType { type_key };
        error!("{}", err);
        Err(err)
    })
}

fn compile_inject(info: &InjectionInfo) -> InjectFn {
    let steps = info
        .fields()
        .iter()
        .chain(info.properties())
        .chain(info.methods())
        .map(|member| Arc::clone(&member.compiled))
        .collect::<Vec<CompiledApplyFn>>();

    Arc::new(
        move |object: &mut (dyn Any + Send + Sync + 'static), resolver: &dyn Resolver| {
            for step in &steps {
                step(&mut *object, resolver)?;
            }
            Ok(())
        },
    )
}

impl Default for CompiledInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl Injector for CompiledInjector {
    #[inline]
    fn metadata(&self) -> &TypeMetadataCache {
        &self.metadata
    }

    #[inline]
    fn create_object(&self, type_key: TypeKey, resolver: &dyn Resolver) -> Result<Object, ResolveErrorKind> {
        self.creator(type_key)(resolver)
    }

    #[inline]
    fn inject(
        &self,
        type_key: TypeKey,
        object: &mut (dyn Any + Send + Sync + 'static),
        resolver: &dyn Resolver,
    ) -> Result<(), ResolveErrorKind> {
        self.injector(type_key)(object, resolver)
    }
}
