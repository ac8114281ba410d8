use alloc::{collections::BTreeMap, vec, vec::Vec};
use tracing::{debug, warn};

use crate::{
    any::TypeKey,
    errors::{BuildErrorKind, DependencyPaths},
    injector::Injector,
    lifetime::Lifetime,
    registry::Registration,
    resolver::Resolver,
};

/// Offenders found while validating one registration set.
#[derive(Debug, Default, Clone)]
pub struct ValidationReport {
    /// Unresolvable dependencies per registered abstraction.
    pub missing_dependencies: DependencyPaths,
    /// Cycle evidence per registered abstraction: implementation types from the abstraction's own,
    /// ending with the repeated type.
    ///
    /// Cycles closed only through a parent's registrations are reported too.
    pub circular_dependencies: DependencyPaths,
}

impl ValidationReport {
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.missing_dependencies.is_empty() && self.circular_dependencies.is_empty()
    }

    /// Missing dependencies are reported before cycles.
    ///
    /// # Errors
    /// Returns [`BuildErrorKind::MissingDependency`] or [`BuildErrorKind::CircularDependency`].
    pub fn into_result(self) -> Result<(), BuildErrorKind> {
        if !self.missing_dependencies.is_empty() {
            return Err(BuildErrorKind::MissingDependency {
                missing: self.missing_dependencies,
            });
        }
        if !self.circular_dependencies.is_empty() {
            return Err(BuildErrorKind::CircularDependency {
                cycles: self.circular_dependencies,
            });
        }
        Ok(())
    }
}

/// Checks a registration set for unresolvable and cyclic dependencies before first use.
///
/// Only registrations the injector constructs are checked: pre-built instances and the container's
/// own registration have no dependencies to satisfy and end every dependency path.
///
/// The cycle walk follows the scope chain given by [`Self::with_parents`] the way resolution does:
/// a parent's singleton depends on the parent's registrations, any other parent registration on the
/// registrations of the scope resolving it.
pub struct DependencyValidator<'a> {
    resolver: &'a dyn Resolver,
    injector: &'a dyn Injector,
    registrations: &'a BTreeMap<TypeKey, Registration>,
    /// Registrations of every level, the validated one first, then its parents nearest first.
    levels: Vec<&'a BTreeMap<TypeKey, Registration>>,
}

impl<'a> DependencyValidator<'a> {
    #[inline]
    #[must_use]
    pub fn new(
        resolver: &'a dyn Resolver,
        injector: &'a dyn Injector,
        registrations: &'a BTreeMap<TypeKey, Registration>,
    ) -> Self {
        Self {
            resolver,
            injector,
            registrations,
            levels: vec![registrations],
        }
    }

    /// Registrations of the parent scopes, nearest first.
    #[must_use]
    pub fn with_parents<I>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = &'a BTreeMap<TypeKey, Registration>>,
    {
        self.levels.extend(parents);
        self
    }

    /// Runs both checks over all registrations and aggregates every offender.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        for (abstraction, registration) in self.registrations {
            if !registration.is_constructed() {
                continue;
            }
            let implementation = registration.implementation();

            let missing = self.missing_dependencies(implementation);
            if !missing.is_empty() {
                warn!(%abstraction, %implementation, count = missing.len(), "Missing dependencies");
                report.missing_dependencies.insert(*abstraction, missing);
            }

            let mut path = Vec::new();
            if self.find_cycle(implementation, 0, &mut path) {
                warn!(%abstraction, %implementation, "Circular dependency");
                report
                    .circular_dependencies
                    .insert(*abstraction, path.into_iter().map(|(implementation, _)| implementation).collect());
            }
        }

        debug!(
            registrations = self.registrations.len(),
            valid = report.is_valid(),
            "Validated"
        );
        report
    }

    fn missing_dependencies(&self, implementation: TypeKey) -> Vec<TypeKey> {
        self.injector
            .dependencies(implementation)
            .iter()
            .filter(|dependency| self.resolver.try_get_implementation(**dependency).is_none())
            .copied()
            .collect()
    }

    /// Nearest registration of `type_key` seen from `level`, with the level holding it.
    fn find_registration(&self, type_key: &TypeKey, level: usize) -> Option<(usize, &'a Registration)> {
        self.levels
            .iter()
            .copied()
            .enumerate()
            .skip(level)
            .find_map(|(owner, registrations)| registrations.get(type_key).map(|registration| (owner, registration)))
    }

    /// Depth-first walk over implementation types, each created at the level whose registrations
    /// resolve its dependencies. On a cycle `path` holds the evidence closed by the repeated type,
    /// otherwise it's left empty.
    fn find_cycle(&self, implementation: TypeKey, level: usize, path: &mut Vec<(TypeKey, usize)>) -> bool {
        if path.contains(&(implementation, level)) {
            path.push((implementation, level));
            return true;
        }
        path.push((implementation, level));

        for dependency in self.injector.dependencies(implementation).iter() {
            let Some((owner, registration)) = self.find_registration(dependency, level) else {
                continue;
            };
            if !registration.is_constructed() {
                continue;
            }
            let level = match registration.lifetime() {
                Lifetime::Singleton => owner,
                Lifetime::Scoped | Lifetime::Transient => level,
            };
            if self.find_cycle(registration.implementation(), level, path) {
                return true;
            }
        }

        path.pop();
        false
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::DependencyValidator;
    use crate::{
        any::{Instance, TypeKey},
        descriptor::{Describe, Injectable},
        errors::ResolveErrorKind,
        inject::Inject,
        injector::{Injector, ReflectionInjector},
        lifetime::Lifetime,
        registry::Registration,
        resolver::Resolver,
        Upcast,
    };

    use alloc::{
        collections::BTreeMap,
        format,
        string::{String, ToString as _},
        vec,
    };
    use tracing_test::traced_test;

    struct Registrations {
        injector: ReflectionInjector,
        registrations: BTreeMap<TypeKey, Registration>,
    }

    impl Registrations {
        fn new() -> Self {
            Self {
                injector: ReflectionInjector::new(),
                registrations: BTreeMap::new(),
            }
        }

        fn register<TBase, TDerived>(mut self) -> Self
        where
            TBase: ?Sized + Send + Sync + 'static,
            TDerived: Injectable + Upcast<TBase> + Send + Sync,
        {
            self.injector.metadata().describe::<TDerived>();
            self.registrations.insert(
                TypeKey::of::<TBase>(),
                Registration::construct::<TBase, TDerived>(Lifetime::Transient),
            );
            self
        }

        fn instance<T: Send + Sync + 'static>(mut self, value: T) -> Self {
            self.registrations
                .insert(TypeKey::of::<T>(), Registration::instance::<T, T>(value, None));
            self
        }
    }

    impl Resolver for Registrations {
        fn try_get_object(&self, _type_key: TypeKey) -> Result<Option<Instance>, ResolveErrorKind> {
            Ok(None)
        }

        fn try_get_implementation(&self, type_key: TypeKey) -> Option<TypeKey> {
            self.registrations.get(&type_key).map(Registration::implementation)
        }
    }

    fn validate(registrations: &Registrations) -> super::ValidationReport {
        DependencyValidator::new(registrations, &registrations.injector, &registrations.registrations).validate()
    }

    trait IA: Send + Sync {}
    trait IE: Send + Sync {}

    struct ACircDependsOnE;
    struct ACirc;
    struct E;

    impl IA for ACircDependsOnE {}
    impl IA for ACirc {}
    impl IE for E {}

    interface!(dyn IA = [ACircDependsOnE, ACirc]);
    interface!(dyn IE = [E]);

    impl Injectable for ACircDependsOnE {
        fn describe(ty: &mut Describe<Self>) {
            ty.constructor(|_: Inject<dyn IE>| ACircDependsOnE);
        }
    }

    impl Injectable for E {
        fn describe(ty: &mut Describe<Self>) {
            ty.constructor(|_: Inject<ACirc>| E);
        }
    }

    impl Injectable for ACirc {
        fn describe(ty: &mut Describe<Self>) {
            ty.constructor(|| ACirc).method("init", |_: &mut Self, _: Inject<dyn IA>| {});
        }
    }

    struct Circular1;
    struct Circular2;
    struct Circular3;

    impl Injectable for Circular1 {
        fn describe(ty: &mut Describe<Self>) {
            ty.allocator(|| Circular1)
                .field("c2", |_: &mut Self, _: Inject<Circular2>| {});
        }
    }

    impl Injectable for Circular2 {
        fn describe(ty: &mut Describe<Self>) {
            ty.allocator(|| Circular2)
                .property("c1", |_: &mut Self, _: Inject<Circular1>| {});
        }
    }

    impl Injectable for Circular3 {
        fn describe(ty: &mut Describe<Self>) {
            ty.constructor(|_: Inject<Circular1>| Circular3);
        }
    }

    #[test]
    #[traced_test]
    fn test_cycle_through_interfaces() {
        let registrations = Registrations::new()
            .register::<dyn IA, ACircDependsOnE>()
            .register::<dyn IE, E>()
            .register::<ACirc, ACirc>();

        let report = validate(&registrations);

        assert!(report.missing_dependencies.is_empty());
        assert_eq!(
            report.circular_dependencies[&TypeKey::of::<dyn IA>()],
            vec![
                TypeKey::of::<ACircDependsOnE>(),
                TypeKey::of::<E>(),
                TypeKey::of::<ACirc>(),
                TypeKey::of::<ACircDependsOnE>(),
            ]
        );
    }

    #[test]
    #[traced_test]
    fn test_cycle_reported_with_repeated_type() {
        let registrations = Registrations::new()
            .register::<Circular1, Circular1>()
            .register::<Circular2, Circular2>()
            .register::<Circular3, Circular3>();

        let report = validate(&registrations);

        assert_eq!(
            report.circular_dependencies[&TypeKey::of::<Circular3>()],
            vec![
                TypeKey::of::<Circular3>(),
                TypeKey::of::<Circular1>(),
                TypeKey::of::<Circular2>(),
                TypeKey::of::<Circular1>(),
            ]
        );
        assert_eq!(
            report.circular_dependencies[&TypeKey::of::<Circular1>()],
            vec![
                TypeKey::of::<Circular1>(),
                TypeKey::of::<Circular2>(),
                TypeKey::of::<Circular1>(),
            ]
        );
        assert_eq!(report.circular_dependencies.len(), 3);
    }

    #[test]
    #[traced_test]
    fn test_missing_dependency() {
        let registrations = Registrations::new().register::<Circular3, Circular3>();

        let report = validate(&registrations);

        assert_eq!(
            report.missing_dependencies[&TypeKey::of::<Circular3>()],
            vec![TypeKey::of::<Circular1>()]
        );
        assert!(report.circular_dependencies.is_empty());
        assert!(!report.is_valid());
    }

    #[test]
    #[traced_test]
    fn test_instance_ends_path() {
        let registrations = Registrations::new()
            .register::<Circular2, Circular2>()
            .instance(Circular1);

        let report = validate(&registrations);

        assert!(report.is_valid());
        assert!(report.into_result().is_ok());
    }
}
