mod compiled;
mod pool;
mod reflection;

pub use compiled::CompiledInjector;
pub use reflection::ReflectionInjector;

use alloc::sync::Arc;
use core::any::Any;

use crate::{any::TypeKey, descriptor::Object, errors::ResolveErrorKind, metadata::TypeMetadataCache, resolver::Resolver};

/// Strategy turning [`crate::metadata::InjectionInfo`] into created and injected objects.
///
/// Both strategies resolve the same dependencies in the same order and are interchangeable.
pub trait Injector: Send + Sync {
    fn metadata(&self) -> &TypeMetadataCache;

    /// Creates an object of `type_key` with its selected constructor, or by raw allocation when none is selected.
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::AbstractType`] when neither is available,
    /// otherwise any error of resolving a parameter or of the constructor itself.
    fn create_object(&self, type_key: TypeKey, resolver: &dyn Resolver) -> Result<Object, ResolveErrorKind>;

    /// Assigns marked fields, then properties, then calls marked methods, each in declaration order.
    ///
    /// # Errors
    /// Returns the first error of resolving a member's dependency.
    fn inject(
        &self,
        type_key: TypeKey,
        object: &mut (dyn Any + Send + Sync + 'static),
        resolver: &dyn Resolver,
    ) -> Result<(), ResolveErrorKind>;

    /// Types `type_key` depends on, as reported by the metadata cache.
    #[inline]
    fn dependencies(&self, type_key: TypeKey) -> Arc<[TypeKey]> {
        self.metadata().get_info(type_key).dependencies()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{CompiledInjector, Injector, ReflectionInjector};
    use crate::{
        any::{Instance, TypeKey},
        descriptor::{Describe, Injectable},
        errors::ResolveErrorKind,
        inject::Inject,
        resolver::Resolver,
    };

    use alloc::{
        boxed::Box,
        collections::BTreeMap,
        format,
        string::{String, ToString as _},
        sync::Arc,
        vec,
        vec::Vec,
    };
    use tracing_test::traced_test;

    #[derive(Default)]
    struct Instances(BTreeMap<TypeKey, Instance>);

    impl Instances {
        fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
            self.0.insert(TypeKey::of::<T>(), Instance::new(Arc::new(value)));
            self
        }
    }

    impl Resolver for Instances {
        fn try_get_object(&self, type_key: TypeKey) -> Result<Option<Instance>, ResolveErrorKind> {
            Ok(self.0.get(&type_key).cloned())
        }

        fn try_get_implementation(&self, type_key: TypeKey) -> Option<TypeKey> {
            self.0.contains_key(&type_key).then_some(type_key)
        }
    }

    #[derive(Default)]
    struct Base {
        steps: Vec<String>,
    }

    impl Injectable for Base {
        fn describe(ty: &mut Describe<Self>) {
            ty.field("name", |this: &mut Self, Inject(name): Inject<&'static str>| {
                this.steps.push(format!("base field {name}"));
            })
            .method("start", |this: &mut Self| this.steps.push("base start".to_string()));
        }
    }

    struct Service {
        base: Base,
        port: u16,
    }

    impl Injectable for Service {
        fn describe(ty: &mut Describe<Self>) {
            ty.constructor(|Inject(port): Inject<u16>| Service {
                base: Base::default(),
                port: *port,
            })
            .extends(|this: &mut Self| &mut this.base)
            .property("port", |this: &mut Self, Inject(port): Inject<u16>| {
                this.base.steps.push(format!("property {port}"));
                this.port += 1;
            })
            .method("start", |this: &mut Self, Inject(name): Inject<&'static str>| {
                this.base.steps.push(format!("start {name}"));
            });
        }
    }

    struct Allocated {
        port: u16,
    }

    impl Injectable for Allocated {
        fn describe(ty: &mut Describe<Self>) {
            ty.allocator(|| Allocated { port: 0 })
                .property("port", |this: &mut Self, Inject(port): Inject<u16>| this.port = *port);
        }
    }

    struct Abstract;

    impl Injectable for Abstract {
        fn describe(ty: &mut Describe<Self>) {
            ty.constructor(|| Abstract).constructor(|_: Inject<u16>| Abstract);
        }
    }

    fn injectors() -> Vec<Box<dyn Injector>> {
        vec![Box::new(ReflectionInjector::new()), Box::new(CompiledInjector::new())]
    }

    fn resolver() -> Instances {
        Instances::default().with(8080u16).with("api")
    }

    #[test]
    #[traced_test]
    fn test_create_and_inject_in_order() {
        for injector in injectors() {
            let type_key = injector.metadata().describe::<Service>();
            let resolver = resolver();

            let mut object = injector.create_object(type_key, &resolver).unwrap();
            injector.inject(type_key, &mut *object, &resolver).unwrap();

            let service = object.downcast::<Service>().unwrap();
            assert_eq!(service.port, 8081);
            assert_eq!(
                service.base.steps,
                vec!["base field api", "property 8080", "start api"]
            );
        }
    }

    #[test]
    #[traced_test]
    fn test_allocator_without_constructor() {
        for injector in injectors() {
            let type_key = injector.metadata().describe::<Allocated>();
            let resolver = resolver();

            let mut object = injector.create_object(type_key, &resolver).unwrap();
            injector.inject(type_key, &mut *object, &resolver).unwrap();

            assert_eq!(object.downcast::<Allocated>().unwrap().port, 8080);
        }
    }

    #[test]
    #[traced_test]
    fn test_abstract_type() {
        for injector in injectors() {
            let type_key = injector.metadata().describe::<Abstract>();

            assert!(matches!(
                injector.create_object(type_key, &resolver()),
                Err(ResolveErrorKind::AbstractType { .. })
            ));
        }
    }

    #[test]
    #[traced_test]
    fn test_missing_parameter() {
        for injector in injectors() {
            let type_key = injector.metadata().describe::<Service>();
            let resolver = Instances::default().with("api");

            assert!(matches!(
                injector.create_object(type_key, &resolver),
                Err(ResolveErrorKind::Unregistered { .. })
            ));
        }
    }

    #[test]
    #[traced_test]
    fn test_dependencies() {
        for injector in injectors() {
            let type_key = injector.metadata().describe::<Service>();

            assert_eq!(
                &*injector.dependencies(type_key),
                &[TypeKey::of::<u16>(), TypeKey::of::<&'static str>()]
            );
        }
    }

    #[test]
    #[traced_test]
    fn test_compiled_once() {
        let injector = CompiledInjector::new();
        let type_key = injector.metadata().describe::<Service>();

        injector.warm_up([type_key, TypeKey::of::<u8>()]);
        assert_eq!(injector.compiled_len(), 1);

        injector.create_object(type_key, &resolver()).unwrap();
        assert_eq!(injector.compiled_len(), 1);
    }
}
