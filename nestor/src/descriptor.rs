use alloc::{boxed::Box, sync::Arc, vec, vec::Vec};
use core::any::Any;

use crate::{
    any::{Instance, TypeKey},
    dependency_resolver::{Dependencies, Dependency},
    errors::{InstantiateErrorKind, ResolveErrorKind},
    finalizer::{boxed_dispose, Dispose},
    instantiator::{Constructor, Method, TryConstructor},
    resolver::Resolver,
};

/// A freshly created, not yet injected object.
pub type Object = Box<dyn Any + Send + Sync>;

pub(crate) type ConstructFn = Arc<dyn Fn(&[Instance]) -> Result<Object, ResolveErrorKind> + Send + Sync>;
pub(crate) type CompiledConstructFn = Arc<dyn Fn(&dyn Resolver) -> Result<Object, ResolveErrorKind> + Send + Sync>;
pub(crate) type AllocateFn = Arc<dyn Fn() -> Object + Send + Sync>;
pub(crate) type ApplyFn =
    Arc<dyn Fn(&mut (dyn Any + Send + Sync + 'static), &[Instance]) -> Result<(), ResolveErrorKind> + Send + Sync>;
pub(crate) type CompiledApplyFn =
    Arc<dyn Fn(&mut (dyn Any + Send + Sync + 'static), &dyn Resolver) -> Result<(), ResolveErrorKind> + Send + Sync>;
pub(crate) type DisposeFn = Arc<dyn Fn(&(dyn Any + Send + Sync + 'static)) + Send + Sync>;

type TypedApplyFn<T> = Arc<dyn Fn(&mut T, &[Instance]) -> Result<(), ResolveErrorKind> + Send + Sync>;
type TypedCompiledApplyFn<T> = Arc<dyn Fn(&mut T, &dyn Resolver) -> Result<(), ResolveErrorKind> + Send + Sync>;
type Projection<T, B> = Arc<dyn Fn(&mut T) -> &mut B + Send + Sync>;

/// Declares the injection markers of a type.
///
/// This is the side table the metadata cache reads: which constructors exist and which one is marked,
/// which fields, properties and methods receive dependencies, and which ancestors the type extends.
/// The [`macro@crate::injectable`] attribute generates it from an annotated `impl` block.
///
/// # Example
/// ```
/// use nestor::{Describe, Inject, Injectable};
/// use std::sync::Arc;
///
/// struct Config;
///
/// impl Injectable for Config {
///     fn describe(ty: &mut Describe<Self>) {
///         ty.constructor(|| Config);
///     }
/// }
///
/// struct Service {
///     config: Option<Arc<Config>>,
/// }
///
/// impl Injectable for Service {
///     fn describe(ty: &mut Describe<Self>) {
///         ty.constructor(|| Service { config: None })
///             .field("config", |this: &mut Self, Inject(config): Inject<Config>| this.config = Some(config));
///     }
/// }
/// ```
pub trait Injectable: 'static {
    fn describe(ty: &mut Describe<Self>);
}

/// Injection markers declared for `T`, collected by [`Injectable::describe`].
pub struct Describe<T: ?Sized> {
    type_key: TypeKey,
    constructors: Vec<ConstructorDescriptor>,
    allocator: Option<AllocateFn>,
    dispose: Option<DisposeFn>,
    fields: Vec<Member<T>>,
    properties: Vec<Member<T>>,
    methods: Vec<Member<T>>,
    ancestors: Vec<Describe<T>>,
}

impl<T: ?Sized + 'static> Describe<T> {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            type_key: TypeKey::of::<T>(),
            constructors: Vec::new(),
            allocator: None,
            dispose: None,
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            ancestors: Vec::new(),
        }
    }

    /// Marks a field. `assign` stores the resolved value.
    pub fn field<D, F>(&mut self, name: &'static str, assign: F) -> &mut Self
    where
        D: Dependency + 'static,
        F: Fn(&mut T, D) + Send + Sync + 'static,
    {
        self.fields.push(Member::single(name, assign));
        self
    }

    /// Marks a property. `set` is the property's setter.
    pub fn property<D, F>(&mut self, name: &'static str, set: F) -> &mut Self
    where
        D: Dependency + 'static,
        F: Fn(&mut T, D) + Send + Sync + 'static,
    {
        self.properties.push(Member::single(name, set));
        self
    }

    /// Marks a method called once after construction with its resolved parameters.
    pub fn method<Deps, F>(&mut self, name: &'static str, method: F) -> &mut Self
    where
        Deps: Dependencies + 'static,
        F: Method<T, Deps>,
    {
        self.methods.push(Member::method(name, method));
        self
    }

    /// Inherits the markers of `B`, reached through `projection`.
    ///
    /// `B` is either an embedded base struct or a trait object implemented by `T`.
    /// Members re-declared by `T` under the same name take precedence over the inherited ones.
    /// Overriding goes by name alone: a re-declared property or method hides every inherited member
    /// with that name, whatever its parameters.
    ///
    /// Ancestors are walked depth-first in the order they're declared, so the ancestors of an earlier
    /// `extends` win over a later one.
    pub fn extends<B, P>(&mut self, projection: P) -> &mut Self
    where
        B: ?Sized + Injectable,
        P: Fn(&mut T) -> &mut B + Send + Sync + 'static,
    {
        let mut base = Describe::<B>::new();
        B::describe(&mut base);

        let projection: Projection<T, B> = Arc::new(projection);
        self.ancestors.push(base.project(&projection));
        self
    }

    fn project<D: ?Sized + 'static>(self, projection: &Projection<D, T>) -> Describe<D> {
        Describe {
            type_key: self.type_key,
            constructors: Vec::new(),
            allocator: None,
            dispose: None,
            fields: self.fields.into_iter().map(|member| member.project(projection)).collect(),
            properties: self.properties.into_iter().map(|member| member.project(projection)).collect(),
            methods: self.methods.into_iter().map(|member| member.project(projection)).collect(),
            ancestors: self.ancestors.into_iter().map(|ancestor| ancestor.project(projection)).collect(),
        }
    }
}

impl<T: Send + Sync + 'static> Describe<T> {
    /// Adds a constructor. Used when it's the only one declared.
    pub fn constructor<Deps, F>(&mut self, constructor: F) -> &mut Self
    where
        Deps: Dependencies + 'static,
        F: Constructor<T, Deps>,
    {
        self.push_constructor(false, move |dependencies| Ok(constructor.construct(dependencies)))
    }

    /// Adds the marked constructor, selected among several.
    pub fn inject_constructor<Deps, F>(&mut self, constructor: F) -> &mut Self
    where
        Deps: Dependencies + 'static,
        F: Constructor<T, Deps>,
    {
        self.push_constructor(true, move |dependencies| Ok(constructor.construct(dependencies)))
    }

    pub fn try_constructor<Deps, F>(&mut self, constructor: F) -> &mut Self
    where
        Deps: Dependencies + 'static,
        F: TryConstructor<T, Deps>,
    {
        self.push_constructor(false, move |dependencies| constructor.try_construct(dependencies))
    }

    pub fn try_inject_constructor<Deps, F>(&mut self, constructor: F) -> &mut Self
    where
        Deps: Dependencies + 'static,
        F: TryConstructor<T, Deps>,
    {
        self.push_constructor(true, move |dependencies| constructor.try_construct(dependencies))
    }

    /// Raw allocation used when no constructor is selected.
    /// Without it such a type is abstract and can't be created.
    pub fn allocator<F>(&mut self, allocate: F) -> &mut Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.allocator = Some(Arc::new(move || Box::new(allocate()) as Object));
        self
    }

    pub fn default_allocator(&mut self) -> &mut Self
    where
        T: Default,
    {
        self.allocator(T::default)
    }

    /// Calls [`Dispose::dispose`] when the container caching the object is disposed.
    pub fn disposable(&mut self) -> &mut Self
    where
        T: Dispose,
    {
        self.dispose = Some(boxed_dispose::<T>());
        self
    }

    fn push_constructor<Deps, F>(&mut self, marked: bool, build: F) -> &mut Self
    where
        Deps: Dependencies + 'static,
        F: Fn(Deps) -> Result<T, InstantiateErrorKind> + Send + Sync + 'static,
    {
        let type_key = self.type_key;
        let build = Arc::new(build);
        let compiled_build = Arc::clone(&build);

        self.constructors.push(ConstructorDescriptor {
            params: Deps::type_keys().into(),
            marked,
            invoke: Arc::new(move |args: &[Instance]| {
                let object = build(Deps::from_instances(args)?)
                    .map_err(|source| ResolveErrorKind::Instantiate { type_key, source })?;
                Ok(Box::new(object) as Object)
            }),
            compiled: Arc::new(move |resolver: &dyn Resolver| {
                let object = compiled_build(Deps::resolve(resolver)?)
                    .map_err(|source| ResolveErrorKind::Instantiate { type_key, source })?;
                Ok(Box::new(object) as Object)
            }),
        });
        self
    }

    #[must_use]
    pub(crate) fn into_descriptor(self) -> TypeDescriptor {
        let Self {
            type_key,
            constructors,
            allocator,
            dispose,
            fields,
            properties,
            methods,
            ancestors,
        } = self;

        TypeDescriptor {
            type_key,
            constructors,
            allocator,
            dispose,
            level: MemberLevel::erase(type_key, fields, properties, methods, ancestors),
        }
    }
}

struct Member<T: ?Sized> {
    name: &'static str,
    params: Vec<TypeKey>,
    apply: TypedApplyFn<T>,
    compiled: TypedCompiledApplyFn<T>,
}

impl<T: ?Sized + 'static> Member<T> {
    fn single<D, F>(name: &'static str, assign: F) -> Self
    where
        D: Dependency + 'static,
        F: Fn(&mut T, D) + Send + Sync + 'static,
    {
        let assign = Arc::new(assign);
        let compiled_assign = Arc::clone(&assign);

        Self {
            name,
            params: vec![D::type_key()],
            apply: Arc::new(move |target: &mut T, args: &[Instance]| {
                let instance = args
                    .first()
                    .ok_or_else(|| ResolveErrorKind::MissingArgument { expected: D::type_key() })?;
                assign(target, D::from_instance(instance)?);
                Ok(())
            }),
            compiled: Arc::new(move |target: &mut T, resolver: &dyn Resolver| {
                compiled_assign(target, D::resolve(resolver)?);
                Ok(())
            }),
        }
    }

    fn method<Deps, F>(name: &'static str, method: F) -> Self
    where
        Deps: Dependencies + 'static,
        F: Method<T, Deps>,
    {
        let method = Arc::new(method);
        let compiled_method = Arc::clone(&method);

        Self {
            name,
            params: Deps::type_keys(),
            apply: Arc::new(move |target: &mut T, args: &[Instance]| {
                method.invoke(target, Deps::from_instances(args)?);
                Ok(())
            }),
            compiled: Arc::new(move |target: &mut T, resolver: &dyn Resolver| {
                compiled_method.invoke(target, Deps::resolve(resolver)?);
                Ok(())
            }),
        }
    }

    fn project<D: ?Sized + 'static>(self, projection: &Projection<D, T>) -> Member<D> {
        let Self {
            name,
            params,
            apply,
            compiled,
        } = self;
        let apply_projection = Arc::clone(projection);
        let compiled_projection = Arc::clone(projection);

        Member {
            name,
            params,
            apply: Arc::new(move |target: &mut D, args: &[Instance]| apply(apply_projection(target), args)),
            compiled: Arc::new(move |target: &mut D, resolver: &dyn Resolver| {
                compiled(compiled_projection(target), resolver)
            }),
        }
    }
}

/// A declared constructor with its ordered parameter types.
#[derive(Clone)]
pub struct ConstructorDescriptor {
    params: Arc<[TypeKey]>,
    marked: bool,
    pub(crate) invoke: ConstructFn,
    pub(crate) compiled: CompiledConstructFn,
}

impl ConstructorDescriptor {
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[TypeKey] {
        &self.params
    }

    #[inline]
    #[must_use]
    pub const fn is_marked(&self) -> bool {
        self.marked
    }
}

/// A marked field, property or method.
#[derive(Clone)]
pub struct MemberDescriptor {
    name: &'static str,
    declared_by: TypeKey,
    params: Arc<[TypeKey]>,
    pub(crate) apply: ApplyFn,
    pub(crate) compiled: CompiledApplyFn,
}

impl MemberDescriptor {
    fn erase<T: Send + Sync + 'static>(member: Member<T>, declared_by: TypeKey) -> Self {
        let Member {
            name,
            params,
            apply,
            compiled,
        } = member;

        Self {
            name,
            declared_by,
            params: params.into(),
            apply: Arc::new(move |object: &mut (dyn Any + Send + Sync + 'static), args: &[Instance]| {
                apply(downcast_target::<T>(object)?, args)
            }),
            compiled: Arc::new(
                move |object: &mut (dyn Any + Send + Sync + 'static), resolver: &dyn Resolver| {
                    compiled(downcast_target::<T>(object)?, resolver)
                },
            ),
        }
    }

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Type whose [`Injectable::describe`] declared the member, the object's own type or an ancestor.
    #[inline]
    #[must_use]
    pub const fn declared_by(&self) -> TypeKey {
        self.declared_by
    }

    /// Parameter types, exactly one for fields and properties.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[TypeKey] {
        &self.params
    }
}

fn downcast_target<'a, T: Any>(
    object: &'a mut (dyn Any + Send + Sync + 'static),
) -> Result<&'a mut T, ResolveErrorKind> {
    let actual = (*object).type_id();
    object.downcast_mut::<T>().ok_or(ResolveErrorKind::IncorrectType {
        expected: TypeKey::of::<T>(),
        actual,
    })
}

/// Markers declared by one level of the ancestor chain, most-derived first.
pub(crate) struct MemberLevel {
    pub(crate) fields: Vec<MemberDescriptor>,
    pub(crate) properties: Vec<MemberDescriptor>,
    pub(crate) methods: Vec<MemberDescriptor>,
    pub(crate) ancestors: Vec<MemberLevel>,
}

impl MemberLevel {
    fn erase<T: Send + Sync + 'static>(
        type_key: TypeKey,
        fields: Vec<Member<T>>,
        properties: Vec<Member<T>>,
        methods: Vec<Member<T>>,
        ancestors: Vec<Describe<T>>,
    ) -> Self {
        let erase_all = |members: Vec<Member<T>>| -> Vec<MemberDescriptor> {
            members
                .into_iter()
                .map(|member| MemberDescriptor::erase(member, type_key))
                .collect()
        };

        Self {
            fields: erase_all(fields),
            properties: erase_all(properties),
            methods: erase_all(methods),
            ancestors: ancestors
                .into_iter()
                .map(|ancestor| {
                    MemberLevel::erase(
                        ancestor.type_key,
                        ancestor.fields,
                        ancestor.properties,
                        ancestor.methods,
                        ancestor.ancestors,
                    )
                })
                .collect(),
        }
    }
}

/// Type-erased declaration of a concrete type, as read by the metadata cache.
pub(crate) struct TypeDescriptor {
    pub(crate) type_key: TypeKey,
    pub(crate) constructors: Vec<ConstructorDescriptor>,
    pub(crate) allocator: Option<AllocateFn>,
    pub(crate) dispose: Option<DisposeFn>,
    pub(crate) level: MemberLevel,
}

pub(crate) type DescribeFn = fn() -> TypeDescriptor;

#[must_use]
pub(crate) fn describe_type<T: Injectable + Send + Sync>() -> TypeDescriptor {
    let mut ty = Describe::<T>::new();
    T::describe(&mut ty);
    ty.into_descriptor()
}
