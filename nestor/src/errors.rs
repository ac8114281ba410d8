mod build;
mod instantiate;
mod resolve;

pub use build::{BuildErrorKind, DependencyPaths};
pub use instantiate::InstantiateErrorKind;
pub use resolve::ResolveErrorKind;
