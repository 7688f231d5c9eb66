use crate::run::free_run;
use crate::run::run_len;

use core::ptr::NonNull;

/// Release policy for a contiguous run of objects.
///
/// The policy, not the owner, is responsible for
/// tearing down every element and reclaiming the run.
pub trait ArrayDeleter<T>
{
    /// Tear down the run whose first element is at `first`.
    ///
    /// # Safety
    ///
    /// `first` must point to the first element of a live run
    /// that this policy knows how to tear down,
    /// and no element may be used again after this call.
    unsafe fn delete_array(&mut self, first: NonNull<T>);

    /// Number of elements in the run at `first`, if the policy can tell.
    ///
    /// Owners do not store the length of their run.
    /// Some allocations keep it themselves; a policy for such an
    /// allocation can report it here, which enables bounds checks.
    ///
    /// # Safety
    ///
    /// `first` must point to the first element of a live run
    /// that this policy knows how to tear down.
    #[inline]
    unsafe fn known_len(&self, first: NonNull<T>) -> Option<usize>
    {
        let _ = first;
        None
    }
}

/// Release policy for runs allocated with [`alloc_run`].
///
/// [`alloc_run`]: `crate::run::alloc_run`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultArrayDelete;

impl<T> ArrayDeleter<T> for DefaultArrayDelete
{
    #[inline]
    unsafe fn delete_array(&mut self, first: NonNull<T>)
    {
        free_run(first);
    }

    #[inline]
    unsafe fn known_len(&self, first: NonNull<T>) -> Option<usize>
    {
        Some(run_len(first))
    }
}

impl<T, D> ArrayDeleter<T> for &mut D
    where D: ArrayDeleter<T> + ?Sized
{
    #[inline]
    unsafe fn delete_array(&mut self, first: NonNull<T>)
    {
        (**self).delete_array(first);
    }

    #[inline]
    unsafe fn known_len(&self, first: NonNull<T>) -> Option<usize>
    {
        (**self).known_len(first)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::run::alloc_run;

    use drop_counter::DropCounter;

    #[test]
    fn default_array_delete_drops_every_element()
    {
        let counter = DropCounter::new();
        let first = alloc_run(5, |_| counter.track(())).unwrap();
        let mut policy = DefaultArrayDelete;
        assert_eq!(unsafe { policy.known_len(first) }, Some(5));
        unsafe { policy.delete_array(first) };
        assert_eq!(counter.count(), 5);
    }
}
