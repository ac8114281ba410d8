#![no_std]

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod builder;
pub(crate) mod cache;
pub(crate) mod container;
pub(crate) mod dependency_resolver;
pub(crate) mod descriptor;
pub(crate) mod errors;
pub(crate) mod finalizer;
pub(crate) mod inject;
pub(crate) mod injector;
pub(crate) mod instantiator;
pub(crate) mod lifetime;
pub(crate) mod metadata;
pub(crate) mod registry;
pub(crate) mod resolver;
pub(crate) mod validator;

pub use any::{Instance, TypeKey, Upcast};
pub use builder::Builder;
pub use container::Container;
pub use dependency_resolver::{Dependencies, Dependency};
pub use descriptor::{ConstructorDescriptor, Describe, Injectable, MemberDescriptor, Object};
pub use errors::{BuildErrorKind, DependencyPaths, InstantiateErrorKind, ResolveErrorKind};
pub use finalizer::{Dispose, Finalizer};
pub use inject::Inject;
pub use injector::{CompiledInjector, Injector, ReflectionInjector};
pub use instantiator::{Constructor, Method, TryConstructor};
pub use lifetime::Lifetime;
pub use metadata::{InjectionInfo, TypeMetadataCache};
pub use registry::Registration;
pub use resolver::Resolver;
pub use validator::{DependencyValidator, ValidationReport};

#[cfg(feature = "macros")]
pub use nestor_macros::injectable;

#[doc(hidden)]
pub mod __private {
    pub use alloc::sync::Arc;
}
