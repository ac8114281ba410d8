use alloc::{collections::BTreeMap, vec::Vec};
use core::fmt::{self, Display, Formatter};

use crate::any::TypeKey;

/// Lists reported by validation, keyed by the offending abstraction.
pub type DependencyPaths = BTreeMap<TypeKey, Vec<TypeKey>>;

#[derive(thiserror::Error, Debug)]
pub enum BuildErrorKind {
    #[error("Missing dependencies: {}", DisplayPaths::list(.missing))]
    MissingDependency { missing: DependencyPaths },
    #[error("Circular dependencies: {}", DisplayPaths::chain(.cycles))]
    CircularDependency { cycles: DependencyPaths },
    #[error("Builder has already been built")]
    AlreadyBuilt,
    #[error("Parent container is disposed")]
    Disposed,
}

struct DisplayPaths<'a> {
    paths: &'a DependencyPaths,
    chain: bool,
}

impl<'a> DisplayPaths<'a> {
    const fn list(paths: &'a DependencyPaths) -> Self {
        Self { paths, chain: false }
    }

    const fn chain(paths: &'a DependencyPaths) -> Self {
        Self { paths, chain: true }
    }
}

impl Display for DisplayPaths<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, (type_key, path)) in self.paths.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{type_key}: ")?;
            if !self.chain {
                f.write_str("[")?;
            }
            for (index, type_key) in path.iter().enumerate() {
                if index > 0 {
                    f.write_str(if self.chain { " -> " } else { ", " })?;
                }
                write!(f, "{type_key}")?;
            }
            if !self.chain {
                f.write_str("]")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{BuildErrorKind, DependencyPaths};
    use crate::any::TypeKey;

    use alloc::{
        format,
        string::{String, ToString as _},
        vec,
    };
    use tracing_test::traced_test;

    struct A;
    struct B;
    struct C;

    #[test]
    #[traced_test]
    fn test_display_lists_every_offender() {
        let mut missing = DependencyPaths::new();
        missing.insert(TypeKey::of::<A>(), vec![TypeKey::of::<B>(), TypeKey::of::<C>()]);
        let message = BuildErrorKind::MissingDependency { missing }.to_string();
        assert!(message.contains("A: ["));
        assert!(message.contains("B, "));
        assert!(message.ends_with("C]"));

        let mut cycles = DependencyPaths::new();
        cycles.insert(
            TypeKey::of::<A>(),
            vec![TypeKey::of::<A>(), TypeKey::of::<B>(), TypeKey::of::<A>()],
        );
        let message = BuildErrorKind::CircularDependency { cycles }.to_string();
        assert_eq!(message.matches(" -> ").count(), 2);
    }
}
