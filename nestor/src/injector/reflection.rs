use alloc::sync::Arc;
use core::any::Any;
use tracing::{debug, error};

use super::{pool::ArgsPool, Injector};
use crate::{
    any::TypeKey,
    descriptor::{MemberDescriptor, Object},
    errors::ResolveErrorKind,
    metadata::TypeMetadataCache,
    resolver::Resolver,
};

/// Reads the metadata on every call and invokes the erased members with pooled argument vectors.
pub struct ReflectionInjector {
    metadata: Arc<TypeMetadataCache>,
    args: ArgsPool,
}

impl ReflectionInjector {
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
            args: ArgsPool::new(),
        }
    }

    fn apply(
        &self,
        member: &MemberDescriptor,
        object: &mut (dyn Any + Send + Sync + 'static),
        resolver: &dyn Resolver,
    ) -> Result<(), ResolveErrorKind> {
        let params = member.params();
        let mut args = self.args.rent(params.len());
        for param in params {
            args.push(resolver.get_object(*param)?);
        }

        (member.apply)(object, &args)?;
        self.args.give_back(params.len(), args);

        debug!(member = member.name(), "Injected");
        Ok(())
    }
}

impl Default for ReflectionInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl Injector for ReflectionInjector {
    #[inline]
    fn metadata(&self) -> &TypeMetadataCache {
        &self.metadata
    }

    fn create_object(&self, type_key: TypeKey, resolver: &dyn Resolver) -> Result<Object, ResolveErrorKind> {
        let info = self.metadata.get_info(type_key);

        if let Some(constructor) = info.constructor() {
            let params = constructor.params();
            let mut args = self.args.rent(params.len());
            for param in params {
                args.push(resolver.get_object(*param)?);
            }

            let object = (constructor.invoke)(&args)?;
            self.args.give_back(params.len(), args);
            return Ok(object);
        }

        if let Some(allocate) = info.allocator() {
            debug!("Allocated without constructor");
            return Ok(allocate());
        }

        let err = ResolveErrorKind::AbstractType { type_key };
        error!("{}", err);
        Err(err)
    }

    fn inject(
        &self,
        type_key: TypeKey,
        object: &mut (dyn Any + Send + Sync + 'static),
        resolver: &dyn Resolver,
    ) -> Result<(), ResolveErrorKind> {
        let info = self.metadata.get_info(type_key);

        let members = info.fields().iter().chain(info.properties()).chain(info.methods());
        for member in members {
            self.apply(member, object, resolver)?;
        }
        Ok(())
    }
}
