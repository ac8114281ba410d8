macro_rules! all_the_tuples {
    ($name:ident) => {
        $name!([]);
        $name!([T1]);
        $name!([T1, T2]);
        $name!([T1, T2, T3]);
        $name!([T1, T2, T3, T4]);
        $name!([T1, T2, T3, T4, T5]);
        $name!([T1, T2, T3, T4, T5, T6]);
        $name!([T1, T2, T3, T4, T5, T6, T7]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15, T16]);
    };
}

/// Declares that each listed implementation can be bound to the abstraction `$base`,
/// usually a trait object.
///
/// # Example
/// ```
/// use nestor::{interface, Describe, Injectable};
///
/// trait Repository: Send + Sync {}
///
/// struct InMemoryRepository;
///
/// impl Repository for InMemoryRepository {}
///
/// impl Injectable for InMemoryRepository {
///     fn describe(ty: &mut Describe<Self>) {
///         ty.constructor(|| InMemoryRepository);
///     }
/// }
///
/// interface!(dyn Repository = [InMemoryRepository]);
/// ```
#[macro_export]
macro_rules! interface {
    ($base:ty = [$($implementation:ty),* $(,)?]) => {
        $(
            impl $crate::Upcast<$base> for $implementation {
                #[inline]
                fn upcast(self: $crate::__private::Arc<Self>) -> $crate::__private::Arc<$base> {
                    self
                }
            }
        )*
    };
}
