use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::{
    any::TypeKey,
    descriptor::{
        describe_type, AllocateFn, ConstructorDescriptor, DescribeFn, DisposeFn, Injectable, MemberDescriptor, MemberLevel,
        TypeDescriptor,
    },
};

/// Everything needed to create and inject one concrete type.
///
/// Computed once per type by [`TypeMetadataCache`] and never changed afterwards.
pub struct InjectionInfo {
    type_key: TypeKey,
    constructor: Option<ConstructorDescriptor>,
    allocator: Option<AllocateFn>,
    dispose: Option<DisposeFn>,
    fields: Vec<MemberDescriptor>,
    properties: Vec<MemberDescriptor>,
    methods: Vec<MemberDescriptor>,
    dependencies: Arc<[TypeKey]>,
}

impl InjectionInfo {
    fn empty(type_key: TypeKey) -> Self {
        Self {
            type_key,
            constructor: None,
            allocator: None,
            dispose: None,
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            dependencies: Arc::new([]),
        }
    }

    fn from_descriptor(descriptor: TypeDescriptor) -> Self {
        let TypeDescriptor {
            type_key,
            constructors,
            allocator,
            dispose,
            level,
        } = descriptor;

        let constructor = select_constructor(constructors);

        let mut fields = Vec::new();
        let mut properties = Vec::new();
        let mut methods = Vec::new();
        collect_members(&level, &mut fields, &mut properties, &mut methods);

        let mut dependencies = Vec::new();
        let params = constructor
            .iter()
            .flat_map(|constructor| constructor.params())
            .chain(fields.iter().flat_map(MemberDescriptor::params))
            .chain(properties.iter().flat_map(MemberDescriptor::params))
            .chain(methods.iter().flat_map(MemberDescriptor::params));
        for param in params {
            if !dependencies.contains(param) {
                dependencies.push(*param);
            }
        }

        Self {
            type_key,
            constructor,
            allocator,
            dispose,
            fields,
            properties,
            methods,
            dependencies: dependencies.into(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// The selected constructor, if any.
    #[inline]
    #[must_use]
    pub const fn constructor(&self) -> Option<&ConstructorDescriptor> {
        self.constructor.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn constructor_params(&self) -> &[TypeKey] {
        match &self.constructor {
            Some(constructor) => constructor.params(),
            None => &[],
        }
    }

    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[MemberDescriptor] {
        &self.fields
    }

    #[inline]
    #[must_use]
    pub fn properties(&self) -> &[MemberDescriptor] {
        &self.properties
    }

    #[inline]
    #[must_use]
    pub fn methods(&self) -> &[MemberDescriptor] {
        &self.methods
    }

    /// Union of constructor parameters, field types, property types and method parameters.
    /// Duplicates removed, first occurrence kept.
    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> Arc<[TypeKey]> {
        Arc::clone(&self.dependencies)
    }

    /// `true` when the type can't be created: no selected constructor and no raw allocator.
    #[inline]
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.constructor.is_none() && self.allocator.is_none()
    }

    #[inline]
    pub(crate) const fn allocator(&self) -> Option<&AllocateFn> {
        self.allocator.as_ref()
    }

    #[inline]
    pub(crate) fn disposer(&self) -> Option<DisposeFn> {
        self.dispose.clone()
    }
}

fn select_constructor(constructors: Vec<ConstructorDescriptor>) -> Option<ConstructorDescriptor> {
    if constructors.len() == 1 {
        return constructors.into_iter().next();
    }
    constructors.into_iter().find(ConstructorDescriptor::is_marked)
}

/// Walks the ancestor chain most-derived first, depth-first.
/// Fields are collected from every level; properties and methods only when no level visited earlier
/// declared the same name, regardless of parameters.
fn collect_members(
    level: &MemberLevel,
    fields: &mut Vec<MemberDescriptor>,
    properties: &mut Vec<MemberDescriptor>,
    methods: &mut Vec<MemberDescriptor>,
) {
    fields.extend(level.fields.iter().cloned());
    push_new_members(properties, &level.properties);
    push_new_members(methods, &level.methods);

    for ancestor in &level.ancestors {
        collect_members(ancestor, fields, properties, methods);
    }
}

fn push_new_members(collected: &mut Vec<MemberDescriptor>, declared: &[MemberDescriptor]) {
    for member in declared {
        if !collected.iter().any(|collected| collected.name() == member.name()) {
            collected.push(member.clone());
        }
    }
}

/// Memoized per-type injection metadata, shared by all containers of an injector.
///
/// Types become known through [`Self::describe`], which registration calls for every implementation type.
/// Lookups and stores lock only around the maps, computation runs unlocked.
/// When two threads compute the same type concurrently the first stored result wins and both observe it.
pub struct TypeMetadataCache {
    descriptors: RwLock<BTreeMap<TypeKey, DescribeFn>>,
    infos: Mutex<BTreeMap<TypeKey, Arc<InjectionInfo>>>,
}

impl TypeMetadataCache {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptors: RwLock::new(BTreeMap::new()),
            infos: Mutex::new(BTreeMap::new()),
        }
    }

    /// Makes the markers of `T` known to the cache. Returns the key of `T`.
    pub fn describe<T: Injectable + Send + Sync>(&self) -> TypeKey {
        let type_key = TypeKey::of::<T>();
        self.descriptors
            .write()
            .entry(type_key)
            .or_insert(describe_type::<T> as DescribeFn);
        type_key
    }

    #[inline]
    #[must_use]
    pub fn is_described(&self, type_key: TypeKey) -> bool {
        self.descriptors.read().contains_key(&type_key)
    }

    /// Injection metadata of `type_key`.
    ///
    /// A type that was never described has no markers: the result is empty and abstract,
    /// and isn't memoized, so a later [`Self::describe`] is still picked up.
    #[must_use]
    pub fn get_info(&self, type_key: TypeKey) -> Arc<InjectionInfo> {
        if let Some(info) = self.infos.lock().get(&type_key) {
            return Arc::clone(info);
        }

        let describe = self.descriptors.read().get(&type_key).copied();
        let Some(describe) = describe else {
            debug!(%type_key, "No markers declared");
            return Arc::new(InjectionInfo::empty(type_key));
        };

        let info = Arc::new(InjectionInfo::from_descriptor(describe()));
        debug!(%type_key, dependencies = info.dependencies.len(), "Metadata computed");

        Arc::clone(self.infos.lock().entry(type_key).or_insert(info))
    }

    /// Number of memoized types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.lock().len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.lock().is_empty()
    }
}

impl Default for TypeMetadataCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::TypeMetadataCache;
    use crate::{
        any::TypeKey,
        descriptor::{Describe, Injectable},
        inject::Inject,
    };

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
        vec,
        vec::Vec,
    };
    use core::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    struct A;
    struct B;
    struct C;

    struct Single;

    impl Injectable for Single {
        fn describe(ty: &mut Describe<Self>) {
            ty.constructor(|_: Inject<A>| Single);
        }
    }

    struct ManyMarked;

    impl Injectable for ManyMarked {
        fn describe(ty: &mut Describe<Self>) {
            ty.constructor(|| ManyMarked)
                .inject_constructor(|_: Inject<A>, _: Inject<B>| ManyMarked)
                .constructor(|_: Inject<C>| ManyMarked);
        }
    }

    struct ManyUnmarked;

    impl Injectable for ManyUnmarked {
        fn describe(ty: &mut Describe<Self>) {
            ty.constructor(|| ManyUnmarked).constructor(|_: Inject<A>| ManyUnmarked);
        }
    }

    #[derive(Default)]
    struct Base {
        calls: Vec<&'static str>,
    }

    impl Injectable for Base {
        fn describe(ty: &mut Describe<Self>) {
            ty.field("a", |_: &mut Self, _: Inject<A>| {})
                .property("b", |this: &mut Self, _: Inject<B>| this.calls.push("base.b"))
                .method("init", |this: &mut Self, _: Inject<C>| this.calls.push("base.init"))
                .method("start", |this: &mut Self| this.calls.push("base.start"));
        }
    }

    #[derive(Default)]
    struct Derived {
        base: Base,
    }

    impl Injectable for Derived {
        fn describe(ty: &mut Describe<Self>) {
            ty.default_allocator()
                .field("a", |_: &mut Self, _: Inject<C>| {})
                .property("b", |this: &mut Self, _: Inject<A>| this.base.calls.push("derived.b"))
                .method("init", |this: &mut Self| this.base.calls.push("derived.init"))
                .extends(|this: &mut Self| &mut this.base);
        }
    }

    #[test]
    #[traced_test]
    fn test_constructor_selection() {
        let cache = TypeMetadataCache::new();
        cache.describe::<Single>();
        cache.describe::<ManyMarked>();
        cache.describe::<ManyUnmarked>();

        let single = cache.get_info(TypeKey::of::<Single>());
        assert_eq!(single.constructor_params(), [TypeKey::of::<A>()]);
        assert!(!single.is_abstract());

        let marked = cache.get_info(TypeKey::of::<ManyMarked>());
        assert_eq!(marked.constructor_params(), [TypeKey::of::<A>(), TypeKey::of::<B>()]);

        let unmarked = cache.get_info(TypeKey::of::<ManyUnmarked>());
        assert!(unmarked.constructor().is_none());
        assert!(unmarked.is_abstract());
    }

    #[test]
    #[traced_test]
    fn test_ancestor_members() {
        let cache = TypeMetadataCache::new();
        cache.describe::<Derived>();

        let info = cache.get_info(TypeKey::of::<Derived>());

        assert!(info.constructor().is_none());
        assert!(!info.is_abstract());

        let fields = info.fields().iter().map(|field| field.declared_by()).collect::<Vec<_>>();
        assert_eq!(fields, vec![TypeKey::of::<Derived>(), TypeKey::of::<Base>()]);

        assert_eq!(info.properties().len(), 1);
        assert_eq!(info.properties()[0].declared_by(), TypeKey::of::<Derived>());

        let methods = info
            .methods()
            .iter()
            .map(|method| (method.name(), method.declared_by()))
            .collect::<Vec<_>>();
        assert_eq!(
            methods,
            vec![("init", TypeKey::of::<Derived>()), ("start", TypeKey::of::<Base>())]
        );

        assert_eq!(&*info.dependencies(), [TypeKey::of::<C>(), TypeKey::of::<A>()]);
    }

    #[test]
    #[traced_test]
    fn test_dependencies_deduplicated_in_order() {
        struct Wide;

        impl Injectable for Wide {
            fn describe(ty: &mut Describe<Self>) {
                ty.constructor(|_: Inject<B>, _: Inject<A>| Wide)
                    .field("a", |_: &mut Self, _: Inject<A>| {})
                    .property("c", |_: &mut Self, _: Inject<C>| {})
                    .method("init", |_: &mut Self, _: Inject<B>, _: Inject<C>| {});
            }
        }

        let cache = TypeMetadataCache::new();
        cache.describe::<Wide>();

        let info = cache.get_info(TypeKey::of::<Wide>());
        assert_eq!(
            &*info.dependencies(),
            [TypeKey::of::<B>(), TypeKey::of::<A>(), TypeKey::of::<C>()]
        );
    }

    #[test]
    #[traced_test]
    fn test_undescribed_type_is_empty_and_not_memoized() {
        let cache = TypeMetadataCache::new();

        let info = cache.get_info(TypeKey::of::<Single>());
        assert!(info.is_abstract());
        assert!(info.dependencies().is_empty());
        assert!(cache.is_empty());

        cache.describe::<Single>();
        let info = cache.get_info(TypeKey::of::<Single>());
        assert!(!info.is_abstract());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    #[traced_test]
    fn test_memoized_once_across_threads() {
        static DESCRIBE_CALLS: AtomicUsize = AtomicUsize::new(0);

        struct Counted;

        impl Injectable for Counted {
            fn describe(ty: &mut Describe<Self>) {
                DESCRIBE_CALLS.fetch_add(1, Ordering::SeqCst);
                ty.constructor(|| Counted);
            }
        }

        let cache = TypeMetadataCache::new();
        cache.describe::<Counted>();

        let infos = std::thread::scope(|scope| {
            let handles = (0..8)
                .map(|_| scope.spawn(|| cache.get_info(TypeKey::of::<Counted>())))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect::<Vec<_>>()
        });

        for info in &infos {
            assert!(Arc::ptr_eq(info, &infos[0]));
        }
        assert!(Arc::ptr_eq(&cache.get_info(TypeKey::of::<Counted>()), &infos[0]));
        assert!(DESCRIBE_CALLS.load(Ordering::SeqCst) >= 1);
        assert_eq!(cache.len(), 1);
    }
}
