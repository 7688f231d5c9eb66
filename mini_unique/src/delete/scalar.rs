use alloc::boxed::Box;
use core::ptr::NonNull;

/// Release policy for a single object.
pub trait Deleter<T>
{
    /// Tear down the object at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live object that this policy
    /// knows how to tear down, and the object must not be
    /// used again after this call.
    unsafe fn delete(&mut self, ptr: NonNull<T>);
}

/// Release policy for objects allocated with [`Box`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultDelete;

impl<T> Deleter<T> for DefaultDelete
{
    #[inline]
    unsafe fn delete(&mut self, ptr: NonNull<T>)
    {
        drop(Box::from_raw(ptr.as_ptr()));
    }
}

impl<T, D> Deleter<T> for &mut D
    where D: Deleter<T> + ?Sized
{
    #[inline]
    unsafe fn delete(&mut self, ptr: NonNull<T>)
    {
        (**self).delete(ptr);
    }
}
