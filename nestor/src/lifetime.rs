use core::fmt::{self, Display, Formatter};

/// How long a resolved object is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance per container holding the registration, shared by all its descendants.
    Singleton,
    /// One instance per container resolving it.
    Scoped,
    /// A fresh instance on every resolution. Never cached.
    Transient,
}

impl Display for Lifetime {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Singleton => "singleton",
            Self::Scoped => "scoped",
            Self::Transient => "transient",
        })
    }
}
