use alloc::{
    collections::{BTreeMap, VecDeque},
    sync::Arc,
};
use core::{any::Any, mem};

use crate::{
    any::{Instance, TypeKey},
    descriptor::DisposeFn,
    finalizer::BoxedFinalizer,
};

/// Objects cached by one container, with the order they were resolved in.
#[derive(Default)]
pub(crate) struct Cache {
    pub(crate) map: BTreeMap<TypeKey, Instance>,
    pub(crate) resolved: ResolvedSet,
}

impl Cache {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, type_key: &TypeKey) -> Option<Instance> {
        self.map.get(type_key).cloned()
    }

    /// Caches `resolved` unless another instance was stored first, in which case that one is returned.
    pub(crate) fn insert_first(&mut self, resolved: Resolved) -> Result<Instance, Instance> {
        if let Some(instance) = self.map.get(&resolved.type_key) {
            return Err(instance.clone());
        }
        let instance = resolved.instance.clone();
        self.map.insert(resolved.type_key, instance.clone());
        self.resolved.push(resolved);
        Ok(instance)
    }

    #[inline]
    #[must_use]
    pub(crate) fn take_resolved_set(&mut self) -> ResolvedSet {
        mem::take(&mut self.resolved)
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.map.clear();
        self.resolved.0.clear();
    }
}

pub(crate) struct Resolved {
    pub(crate) type_key: TypeKey,
    pub(crate) instance: Instance,
    pub(crate) object: Arc<dyn Any + Send + Sync>,
    pub(crate) dispose: Option<DisposeFn>,
    pub(crate) finalizer: Option<BoxedFinalizer>,
}

#[derive(Default)]
pub(crate) struct ResolvedSet(pub(crate) VecDeque<Resolved>);

impl ResolvedSet {
    #[inline]
    pub(crate) fn push(&mut self, resolved: Resolved) {
        self.0.push_back(resolved);
    }
}
