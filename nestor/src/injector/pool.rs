use alloc::vec::Vec;
use parking_lot::Mutex;

use crate::any::Instance;

const MAX_POOLED_LEN: usize = 32;
const MAX_PER_LEN: usize = 16;

/// Argument vectors reused between calls, kept per argument count.
pub(crate) struct ArgsPool {
    buckets: Mutex<Vec<Vec<Vec<Instance>>>>,
}

impl ArgsPool {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            buckets: Mutex::new((0..=MAX_POOLED_LEN).map(|_| Vec::new()).collect()),
        }
    }

    /// An empty vector able to hold `len` arguments.
    #[must_use]
    pub(crate) fn rent(&self, len: usize) -> Vec<Instance> {
        if len == 0 || len > MAX_POOLED_LEN {
            return Vec::with_capacity(len);
        }
        self.buckets.lock()[len].pop().unwrap_or_else(|| Vec::with_capacity(len))
    }

    /// Returns a vector rented for `len` arguments. Its instances are dropped before pooling.
    pub(crate) fn give_back(&self, len: usize, mut args: Vec<Instance>) {
        if len == 0 || len > MAX_POOLED_LEN {
            return;
        }
        args.clear();

        let mut buckets = self.buckets.lock();
        let bucket = &mut buckets[len];
        if bucket.len() < MAX_PER_LEN {
            bucket.push(args);
        }
    }

    #[cfg(test)]
    pub(crate) fn pooled(&self, len: usize) -> usize {
        self.buckets.lock().get(len).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{ArgsPool, MAX_PER_LEN};
    use crate::any::Instance;

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
    };
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_rent_and_give_back() {
        let pool = ArgsPool::new();

        let mut args = pool.rent(2);
        assert!(args.capacity() >= 2);
        args.push(Instance::new(Arc::new(1u8)));
        args.push(Instance::new(Arc::new(2u8)));

        let ptr = args.as_ptr();
        pool.give_back(2, args);
        assert_eq!(pool.pooled(2), 1);

        let args = pool.rent(2);
        assert!(args.is_empty());
        assert_eq!(args.as_ptr(), ptr);
        assert_eq!(pool.pooled(2), 0);
    }

    #[test]
    #[traced_test]
    fn test_bucket_bounded() {
        let pool = ArgsPool::new();

        for _ in 0..MAX_PER_LEN + 4 {
            pool.give_back(1, pool.rent(1));
        }
        let rented = (0..MAX_PER_LEN + 4).map(|_| pool.rent(1)).collect::<alloc::vec::Vec<_>>();
        for args in rented {
            pool.give_back(1, args);
        }

        assert_eq!(pool.pooled(1), MAX_PER_LEN);
        assert_eq!(pool.pooled(0), 0);
    }
}
