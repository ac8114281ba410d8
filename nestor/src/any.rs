use alloc::sync::Arc;
use core::{
    any::{type_name, Any, TypeId},
    cmp::Ordering,
    fmt::{self, Debug, Display, Formatter},
    hash::{Hash, Hasher},
};

/// Identity of a type used as a registration or metadata key.
///
/// Equality and ordering only look at the [`TypeId`], so every generic instantiation is a distinct key.
#[derive(Clone, Copy)]
pub struct TypeKey {
    name: &'static str,
    id: TypeId,
}

impl TypeKey {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit_once("::").map_or(self.name, |(_, name)| name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for TypeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl Display for TypeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A resolved object stored under its abstraction.
///
/// Holds an `Arc<T>` where `T` is the abstraction, so trait objects survive the erasure.
#[derive(Clone)]
pub struct Instance {
    type_key: TypeKey,
    value: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    #[inline]
    #[must_use]
    pub fn new<T>(value: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self {
            type_key: TypeKey::of::<T>(),
            value: Arc::new(value),
        }
    }

    #[inline]
    #[must_use]
    pub const fn type_key(&self) -> TypeKey {
        self.type_key
    }

    #[inline]
    #[must_use]
    pub fn downcast<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance").field("type_key", &self.type_key).finish_non_exhaustive()
    }
}

/// Converts a shared implementation into a shared abstraction.
///
/// Every type is its own abstraction; trait objects get their impls from [`crate::interface!`].
pub trait Upcast<Base: ?Sized> {
    fn upcast(self: Arc<Self>) -> Arc<Base>;
}

impl<T> Upcast<T> for T
where
    T: Send + Sync + 'static,
{
    #[inline]
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}
