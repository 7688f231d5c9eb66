use super::ArrayDeleter;
use super::Deleter;

use core::ptr::NonNull;

/// Release policy that calls a closure.
///
/// The closure receives the resource and is responsible for all teardown.
/// Since the closure decides what the pointer means,
/// this policy is accepted by owners of either shape.
///
/// # Examples
///
/// ```
/// use core::ptr::NonNull;
/// use mini_unique::FnDelete;
/// use mini_unique::UniquePtr;
///
/// let mut calls = 0;
/// {
///     let deleter = FnDelete(|ptr: NonNull<u32>| {
///         calls += 1;
///         drop(unsafe { Box::from_raw(ptr.as_ptr()) });
///     });
///     let raw = Box::into_raw(Box::new(5));
///     let owner = unsafe { UniquePtr::from_raw_with_deleter(raw, deleter) };
///     assert_eq!(*owner, 5);
/// }
/// assert_eq!(calls, 1);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct FnDelete<F>(pub F);

impl<T, F> Deleter<T> for FnDelete<F>
    where F: FnMut(NonNull<T>)
{
    #[inline]
    unsafe fn delete(&mut self, ptr: NonNull<T>)
    {
        (self.0)(ptr);
    }
}

impl<T, F> ArrayDeleter<T> for FnDelete<F>
    where F: FnMut(NonNull<T>)
{
    #[inline]
    unsafe fn delete_array(&mut self, first: NonNull<T>)
    {
        (self.0)(first);
    }
}
