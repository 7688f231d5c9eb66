use crate::delete::DefaultDelete;
use crate::delete::Deleter;

use alloc::boxed::Box;
use core::fmt;
use core::marker::PhantomData;
use core::mem::size_of;
use core::mem;
use core::ops::Deref;
use core::ops::DerefMut;
use core::ptr::NonNull;
use core::ptr;
use log::trace;
use static_assertions::assert_eq_size;
use static_assertions::assert_not_impl_any;

/// Sole owner of a single heap object.
///
/// The object is torn down by the release policy `D`
/// when the owner is dropped or reset.
/// With the default policy, the object lives in a [`Box`].
///
/// An owner may also be empty, in which case it has nothing to tear down.
/// Dereferencing an empty owner panics;
/// use [`as_ref`][`Self::as_ref`] to check and access at the same time.
///
/// # Examples
///
/// ```
/// use mini_unique::UniquePtr;
///
/// let mut owner = UniquePtr::new(7);
/// *owner += 1;
/// assert_eq!(*owner, 8);
///
/// let moved = owner.take();
/// assert!(owner.is_empty());
/// assert_eq!(*moved, 8);
/// ```
///
/// Owners cannot be copied:
///
/// ```compile_fail
/// use mini_unique::UniquePtr;
///
/// let owner = UniquePtr::new(7);
/// let copy: UniquePtr<i32> = Clone::clone(&owner);
/// ```
///
/// Nor can they be given a policy for runs:
///
/// ```compile_fail
/// use mini_unique::DefaultArrayDelete;
/// use mini_unique::UniquePtr;
///
/// let owner: UniquePtr<u32, DefaultArrayDelete> = UniquePtr::null();
/// ```
pub struct UniquePtr<T, D = DefaultDelete>
    where D: Deleter<T>
{
    pointer: Option<NonNull<T>>,
    deleter: D,
    _owns: PhantomData<T>,
}

// Ownership must never be duplicated, and owners are confined to one thread.
assert_not_impl_any!(UniquePtr<u8>: Clone, Copy, Send, Sync, PartialOrd);

// A stateless policy costs nothing.
assert_eq_size!(UniquePtr<u64>, *mut u64);

impl<T, D> UniquePtr<T, D>
    where D: Deleter<T>
{
    /// Create an empty owner.
    #[inline]
    pub fn null() -> Self
        where D: Default
    {
        Self::null_with_deleter(D::default())
    }

    /// Create an empty owner with the given policy.
    #[inline]
    pub fn null_with_deleter(deleter: D) -> Self
    {
        Self{pointer: None, deleter, _owns: PhantomData}
    }

    /// Take ownership of the object at `pointer`.
    ///
    /// If `pointer` is null, the owner is empty.
    ///
    /// # Safety
    ///
    /// If `pointer` is not null, it must point to a live object
    /// that `D` knows how to tear down, and nothing else may own it.
    #[inline]
    pub unsafe fn from_raw(pointer: *mut T) -> Self
        where D: Default
    {
        Self::from_raw_with_deleter(pointer, D::default())
    }

    /// Take ownership of the object at `pointer`,
    /// to be torn down by `deleter`.
    ///
    /// # Safety
    ///
    /// See [`from_raw`][`Self::from_raw`].
    #[inline]
    pub unsafe fn from_raw_with_deleter(pointer: *mut T, deleter: D) -> Self
    {
        Self{pointer: NonNull::new(pointer), deleter, _owns: PhantomData}
    }

    /// Pointer to the owned object, or null if the owner is empty.
    ///
    /// Ownership is retained.
    #[inline]
    pub fn get(&self) -> *mut T
    {
        match self.pointer {
            Some(pointer) => pointer.as_ptr(),
            None => ptr::null_mut(),
        }
    }

    /// Whether the owner owns an object.
    #[inline]
    pub fn is_owning(&self) -> bool
    {
        self.pointer.is_some()
    }

    /// Whether the owner is empty.
    #[inline]
    pub fn is_empty(&self) -> bool
    {
        self.pointer.is_none()
    }

    /// Borrow the owned object, if any.
    #[inline]
    pub fn as_ref(&self) -> Option<&T>
    {
        // SAFETY: The object is live for as long as we own it.
        self.pointer.map(|pointer| unsafe { &*pointer.as_ptr() })
    }

    /// Mutably borrow the owned object, if any.
    #[inline]
    pub fn as_mut(&mut self) -> Option<&mut T>
    {
        // SAFETY: The object is live and nobody else owns it.
        self.pointer.map(|pointer| unsafe { &mut *pointer.as_ptr() })
    }

    /// Give up ownership without tearing anything down.
    ///
    /// Returns the pointer that was owned, or null if the owner was empty.
    /// The caller becomes responsible for tearing down the object.
    #[inline]
    pub fn release(&mut self) -> *mut T
    {
        match self.pointer.take() {
            Some(pointer) => pointer.as_ptr(),
            None => ptr::null_mut(),
        }
    }

    /// Like [`release`][`Self::release`], but consume the owner.
    #[inline]
    pub fn into_raw(mut self) -> *mut T
    {
        self.release()
    }

    /// Tear down the owned object, if any, leaving the owner empty.
    #[inline]
    pub fn reset(&mut self)
    {
        // SAFETY: A null pointer is always fine to adopt.
        unsafe { self.reset_to(ptr::null_mut()) }
    }

    /// Tear down the owned object, if any, and take ownership of `pointer`.
    ///
    /// The old object is torn down before the new one is adopted,
    /// and while it is torn down the owner is already empty.
    /// Unless `T` is zero-sized, resetting to the pointer
    /// that is already owned does nothing.
    ///
    /// # Safety
    ///
    /// See [`from_raw`][`Self::from_raw`].
    /// If `T` is zero-sized, distinct objects may share an address,
    /// so `pointer` must not be the pointer that is already owned.
    pub unsafe fn reset_to(&mut self, pointer: *mut T)
    {
        let pointer = NonNull::new(pointer);
        if size_of::<T>() != 0 && pointer.is_some() && pointer == self.pointer {
            return;
        }
        self.adopt(pointer);
    }

    /// Tear down the owned object, if any, then own `pointer`.
    ///
    /// # Safety
    ///
    /// `pointer` must not be owned by anyone, this owner included.
    unsafe fn adopt(&mut self, pointer: Option<NonNull<T>>)
    {
        if let Some(old) = self.pointer.take() {
            trace!("UniquePtr::reset: tearing down {:p}", old);
            self.deleter.delete(old);
        }

        self.pointer = pointer;
    }

    /// Exchange objects and policies with another owner.
    #[inline]
    pub fn swap(&mut self, other: &mut Self)
    {
        mem::swap(self, other);
    }

    /// Move the object and policy out into a new owner,
    /// leaving this owner empty with a default policy.
    #[inline]
    pub fn take(&mut self) -> Self
        where D: Default
    {
        mem::replace(self, Self::null())
    }

    /// Tear down the owned object, if any,
    /// then move the object and policy of `source` into this owner.
    ///
    /// `source` is left empty with a default policy.
    /// This is the same as `*self = source.take()`.
    #[inline]
    pub fn assign_from(&mut self, source: &mut Self)
        where D: Default
    {
        *self = source.take();
    }

    /// The release policy.
    #[inline]
    pub fn deleter(&self) -> &D
    {
        &self.deleter
    }

    /// The release policy, mutably.
    #[inline]
    pub fn deleter_mut(&mut self) -> &mut D
    {
        &mut self.deleter
    }
}

/// Methods for owners of boxed objects.
impl<T> UniquePtr<T>
{
    /// Move `value` to the heap and own it.
    #[inline]
    pub fn new(value: T) -> Self
    {
        Self::from_box(Box::new(value))
    }

    /// Own a boxed object.
    #[inline]
    pub fn from_box(boxed: Box<T>) -> Self
    {
        // SAFETY: The box owned the object, and DefaultDelete frees boxes.
        unsafe { Self::from_raw(Box::into_raw(boxed)) }
    }

    /// Give up ownership of the object as a box.
    ///
    /// If the owner is empty, this method returns [`None`].
    #[inline]
    pub fn into_box(self) -> Option<Box<T>>
    {
        let pointer = self.into_raw();
        if pointer.is_null() {
            None
        } else {
            // SAFETY: The object was boxed, and nobody owns it anymore.
            Some(unsafe { Box::from_raw(pointer) })
        }
    }

    /// Tear down the owned object, if any, and own `value` instead.
    #[inline]
    pub fn reset_with(&mut self, value: T)
    {
        let boxed = NonNull::from(Box::leak(Box::new(value)));
        // SAFETY: The box is fresh, even if it shares the address
        //         of a zero-sized object we own, and DefaultDelete frees boxes.
        unsafe { self.adopt(Some(boxed)) }
    }
}

impl<T> From<Box<T>> for UniquePtr<T>
{
    #[inline]
    fn from(boxed: Box<T>) -> Self
    {
        Self::from_box(boxed)
    }
}

impl<T, D> Default for UniquePtr<T, D>
    where D: Deleter<T> + Default
{
    #[inline]
    fn default() -> Self
    {
        Self::null()
    }
}

impl<T, D> Drop for UniquePtr<T, D>
    where D: Deleter<T>
{
    #[inline]
    fn drop(&mut self)
    {
        if let Some(pointer) = self.pointer.take() {
            // SAFETY: We owned the object, and it is not reachable anymore.
            unsafe { self.deleter.delete(pointer) };
        }
    }
}

impl<T, D> Deref for UniquePtr<T, D>
    where D: Deleter<T>
{
    type Target = T;

    #[inline]
    #[track_caller]
    fn deref(&self) -> &Self::Target
    {
        match self.as_ref() {
            Some(value) => value,
            None => empty_deref(),
        }
    }
}

impl<T, D> DerefMut for UniquePtr<T, D>
    where D: Deleter<T>
{
    #[inline]
    #[track_caller]
    fn deref_mut(&mut self) -> &mut Self::Target
    {
        match self.as_mut() {
            Some(value) => value,
            None => empty_deref(),
        }
    }
}

#[cold]
#[track_caller]
fn empty_deref() -> !
{
    panic!("dereferenced an empty UniquePtr")
}

impl<T, D> fmt::Debug for UniquePtr<T, D>
    where D: Deleter<T>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.debug_tuple("UniquePtr").field(&self.get()).finish()
    }
}

impl<T, D> fmt::Pointer for UniquePtr<T, D>
    where D: Deleter<T>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        fmt::Pointer::fmt(&self.get(), f)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    use drop_counter::DropCounter;
    use drop_counter::Tracked;
    use proptest::proptest;
    use std::panic::AssertUnwindSafe;
    use std::panic::catch_unwind;

    /// Frees boxes, counting how often it was invoked.
    #[derive(Debug, Default)]
    struct CountingDelete
    {
        calls: usize,
    }

    impl<T> Deleter<T> for CountingDelete
    {
        unsafe fn delete(&mut self, ptr: NonNull<T>)
        {
            self.calls += 1;
            drop(Box::from_raw(ptr.as_ptr()));
        }
    }

    fn tracked(counter: &DropCounter, value: u32) -> UniquePtr<Tracked<u32>>
    {
        UniquePtr::new(counter.track(value))
    }

    #[test]
    fn mutate_through_deref()
    {
        let mut owner = UniquePtr::new(7);
        *owner = 8;
        assert_eq!(*owner, 8);
        assert_eq!(owner.as_ref(), Some(&8));
    }

    #[test]
    fn field_access_through_deref()
    {
        struct Point { x: i32, y: i32 }
        let mut owner = UniquePtr::new(Point{x: 1, y: 2});
        owner.x += 10;
        assert_eq!((owner.x, owner.y), (11, 2));
    }

    #[test]
    fn null_is_empty()
    {
        let owner = UniquePtr::<u32>::null();
        assert!(owner.is_empty());
        assert!(!owner.is_owning());
        assert!(owner.get().is_null());
        assert_eq!(owner.as_ref(), None);

        let owner = UniquePtr::<u32>::default();
        assert!(owner.is_empty());
    }

    #[test]
    fn from_raw_null_is_empty()
    {
        let owner = unsafe { UniquePtr::<u32>::from_raw(ptr::null_mut()) };
        assert!(owner.is_empty());
    }

    #[test]
    fn get_returns_adopted_pointer()
    {
        let raw = Box::into_raw(Box::new(3));
        let owner = unsafe { UniquePtr::<i32>::from_raw(raw) };
        assert_eq!(owner.get(), raw);
        assert!(owner.is_owning());
    }

    #[test]
    fn drop_tears_down_once()
    {
        let counter = DropCounter::new();
        {
            let _owner = tracked(&counter, 1);
            assert_eq!(counter.count(), 0);
        }
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn release_does_not_tear_down()
    {
        let counter = DropCounter::new();
        let mut owner = tracked(&counter, 1);
        let raw = owner.release();
        assert!(owner.is_empty());
        assert!(owner.release().is_null());
        drop(owner);
        assert_eq!(counter.count(), 0);

        drop(unsafe { Box::from_raw(raw) });
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn into_box_gives_up_ownership()
    {
        let counter = DropCounter::new();
        let boxed = tracked(&counter, 4).into_box().unwrap();
        assert_eq!(counter.count(), 0);
        assert_eq!(**boxed, 4);
        drop(boxed);
        assert_eq!(counter.count(), 1);

        assert!(UniquePtr::<u32>::null().into_box().is_none());
    }

    #[test]
    fn reset_tears_down_old_then_adopts_new()
    {
        let counter = DropCounter::new();
        let mut owner = tracked(&counter, 1);

        owner.reset_with(counter.track(2));
        assert_eq!(counter.count(), 1);
        assert_eq!(**owner, 2);

        owner.reset();
        assert_eq!(counter.count(), 2);
        assert!(owner.is_empty());

        owner.reset();
        assert_eq!(counter.count(), 2);

        drop(owner);
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn reset_to_owned_pointer_is_noop()
    {
        let counter = DropCounter::new();
        let mut owner = tracked(&counter, 1);
        let raw = owner.get();
        unsafe { owner.reset_to(raw) };
        assert_eq!(counter.count(), 0);
        assert_eq!(owner.get(), raw);
        drop(owner);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn reset_with_zero_sized_tears_down_once()
    {
        std::thread_local! {
            static DROPS: core::cell::Cell<usize> = core::cell::Cell::new(0);
        }

        struct Marker;

        impl Drop for Marker
        {
            fn drop(&mut self)
            {
                DROPS.with(|drops| drops.set(drops.get() + 1));
            }
        }

        {
            let mut owner = UniquePtr::new(Marker);
            owner.reset_with(Marker);
            assert_eq!(DROPS.with(|drops| drops.get()), 1);
            assert!(owner.is_owning());

            // Distinct zero-sized boxes share an address.
            let raw = Box::into_raw(Box::new(Marker));
            assert_eq!(raw, owner.get());
            unsafe { drop(Box::from_raw(raw)) };
            assert_eq!(DROPS.with(|drops| drops.get()), 2);
        }
        assert_eq!(DROPS.with(|drops| drops.get()), 3);
    }

    #[test]
    fn move_leaves_source_empty()
    {
        let counter = DropCounter::new();
        let mut source = tracked(&counter, 5);
        let raw = source.get();

        let target = source.take();
        assert!(source.is_empty());
        assert_eq!(target.get(), raw);

        drop(source);
        assert_eq!(counter.count(), 0);
        drop(target);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn move_assign_tears_down_target()
    {
        let counter = DropCounter::new();
        let mut target = tracked(&counter, 1);
        let source = tracked(&counter, 2);

        target = source;
        assert_eq!(counter.count(), 1);
        assert_eq!(**target, 2);

        drop(target);
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn assign_from_moves_object_and_policy()
    {
        let mut target = UniquePtr::<u32, CountingDelete>::null();
        unsafe { target.reset_to(Box::into_raw(Box::new(1))) };

        let mut source = unsafe {
            UniquePtr::from_raw_with_deleter(
                Box::into_raw(Box::new(2)),
                CountingDelete{calls: 40},
            )
        };

        target.assign_from(&mut source);
        assert_eq!(*target, 2);
        assert_eq!(target.deleter().calls, 40);
        assert!(source.is_empty());
        assert_eq!(source.deleter().calls, 0);

        target.reset();
        assert_eq!(target.deleter().calls, 41);
    }

    #[test]
    #[allow(clippy::self_assignment)]
    fn self_move_assign_is_noop()
    {
        let counter = DropCounter::new();
        let mut owner = tracked(&counter, 9);
        let raw = owner.get();

        owner = owner;
        assert_eq!(counter.count(), 0);
        assert_eq!(owner.get(), raw);

        drop(owner);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn swap_exchanges_without_teardown()
    {
        let counter = DropCounter::new();
        let mut a = tracked(&counter, 1);
        let mut b = tracked(&counter, 2);
        let mut c = UniquePtr::null();
        let mut d = UniquePtr::null();

        a.swap(&mut b);
        assert_eq!((**a, **b), (2, 1));

        a.swap(&mut c);
        assert!(a.is_empty());
        assert_eq!(**c, 2);

        c.swap(&mut a);
        assert_eq!(**a, 2);

        c.swap(&mut d);
        assert!(c.is_empty() && d.is_empty());

        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn swap_exchanges_policies()
    {
        let mut a = UniquePtr::<u32, _>::null_with_deleter(CountingDelete{calls: 1});
        let mut b = UniquePtr::<u32, _>::null_with_deleter(CountingDelete{calls: 2});
        a.swap(&mut b);
        assert_eq!((a.deleter().calls, b.deleter().calls), (2, 1));
    }

    #[test]
    fn borrowed_policy_outlives_owners()
    {
        let mut policy = CountingDelete::default();
        for i in 0 .. 3 {
            let raw = Box::into_raw(Box::new(i));
            let _owner = unsafe {
                UniquePtr::from_raw_with_deleter(raw, &mut policy)
            };
        }
        assert_eq!(policy.calls, 3);
    }

    #[test]
    #[should_panic(expected = "dereferenced an empty UniquePtr")]
    fn deref_empty_panics()
    {
        let owner = UniquePtr::<u32>::null();
        let _value: u32 = *owner;
    }

    #[test]
    fn panicking_policy_does_not_tear_down_twice()
    {
        let counter = DropCounter::new();

        let result = catch_unwind(AssertUnwindSafe(|| {
            let deleter = crate::FnDelete(|ptr: NonNull<Tracked<u32>>| {
                drop(unsafe { Box::from_raw(ptr.as_ptr()) });
                panic!("teardown failed");
            });
            let raw = Box::into_raw(Box::new(counter.track(1)));
            let mut owner = unsafe {
                UniquePtr::from_raw_with_deleter(raw, deleter)
            };
            owner.reset();
        }));

        assert!(result.is_err());
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn debug_prints_pointer()
    {
        use std::format;
        let owner = UniquePtr::<u32>::null();
        assert_eq!(format!("{:?}", owner), "UniquePtr(0x0)");
    }

    proptest!
    {
        #[test]
        fn every_reset_tears_down_once(values: std::vec::Vec<u32>)
        {
            let counter = DropCounter::new();
            let mut owner: UniquePtr<Tracked<u32>> = UniquePtr::null();
            for &value in &values {
                owner.reset_with(counter.track(value));
                assert_eq!(**owner, value);
            }
            assert_eq!(counter.count(), values.len().saturating_sub(1));
            drop(owner);
            assert_eq!(counter.count(), values.len());
        }

        #[test]
        fn swap_any_states(a: Option<u8>, b: Option<u8>)
        {
            let counter = DropCounter::new();
            let make = |v: Option<u8>| match v {
                Some(v) => UniquePtr::new(counter.track(v)),
                None => UniquePtr::null(),
            };
            let mut x = make(a);
            let mut y = make(b);
            x.swap(&mut y);
            assert_eq!(x.as_ref().map(|t| **t), b);
            assert_eq!(y.as_ref().map(|t| **t), a);
            assert_eq!(counter.count(), 0);
        }
    }
}
