use core::any::TypeId;

use super::instantiate::InstantiateErrorKind;
use crate::any::TypeKey;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("No registration found for {type_key}")]
    Unregistered { type_key: TypeKey },
    #[error("{type_key} has neither a selected constructor nor a raw allocator")]
    AbstractType { type_key: TypeKey },
    #[error("Incorrect resolved type. Actual: {actual:?}, expected: {expected}")]
    IncorrectType { expected: TypeKey, actual: TypeId },
    #[error("Missing argument of type {expected}")]
    MissingArgument { expected: TypeKey },
    #[error("Failed to instantiate {type_key}: {source}")]
    Instantiate {
        type_key: TypeKey,
        #[source]
        source: InstantiateErrorKind,
    },
    #[error("Container is disposed")]
    Disposed,
}
