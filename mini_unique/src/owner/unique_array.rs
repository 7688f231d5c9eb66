use crate::delete::ArrayDeleter;
use crate::delete::DefaultArrayDelete;
use crate::run::RunLenError;
use crate::run::alloc_run;
use crate::run::run_len;

use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ops::Index;
use core::ops::IndexMut;
use core::ptr::NonNull;
use core::ptr;
use core::slice;
use log::trace;
use static_assertions::assert_eq_size;
use static_assertions::assert_not_impl_any;

/// Sole owner of a contiguous run of heap objects.
///
/// The run is torn down by the release policy `D`,
/// which drops every element and reclaims the memory,
/// when the owner is dropped or reset.
/// With the default policy, the run was allocated by [`alloc_run`].
///
/// The owner stores a pointer to the first element and nothing else.
/// In particular it does not know how long the run is,
/// so general element access is unchecked.
/// Owners using the default policy can read the length from the run itself,
/// and offer checked access through [`Index`] and [`as_slice`].
///
/// [`alloc_run`]: `crate::run::alloc_run`
/// [`as_slice`]: `Self::as_slice`
///
/// # Examples
///
/// ```
/// use mini_unique::UniqueArray;
///
/// let mut run = UniqueArray::from_elem(3, 0).unwrap();
/// run[0] = 10;
/// run[1] = 11;
/// run[2] = 12;
/// assert_eq!(run.as_slice(), &[10, 11, 12]);
/// ```
///
/// Owners cannot be copied:
///
/// ```compile_fail
/// use mini_unique::UniqueArray;
///
/// let run = UniqueArray::from_elem(3, 0u32).unwrap();
/// let copy: UniqueArray<u32> = Clone::clone(&run);
/// ```
///
/// Runs cannot be dereferenced like a single object:
///
/// ```compile_fail
/// use mini_unique::UniqueArray;
///
/// let run = UniqueArray::from_elem(3, 0).unwrap();
/// let first: u32 = *run;
/// ```
///
/// Nor can they be given a policy for single objects:
///
/// ```compile_fail
/// use mini_unique::DefaultDelete;
/// use mini_unique::UniqueArray;
///
/// let run: UniqueArray<u32, DefaultDelete> = UniqueArray::null();
/// ```
pub struct UniqueArray<T, D = DefaultArrayDelete>
    where D: ArrayDeleter<T>
{
    first: Option<NonNull<T>>,
    deleter: D,
    _owns: PhantomData<[T]>,
}

// Ownership must never be duplicated, and owners are confined to one thread.
assert_not_impl_any!(UniqueArray<u8>: Clone, Copy, Send, Sync, PartialOrd);

// The length lives in the run, not in the owner.
assert_eq_size!(UniqueArray<u64>, *mut u64);

impl<T, D> UniqueArray<T, D>
    where D: ArrayDeleter<T>
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
        Self{first: None, deleter, _owns: PhantomData}
    }

    /// Take ownership of the run whose first element is at `first`.
    ///
    /// If `first` is null, the owner is empty.
    ///
    /// # Safety
    ///
    /// If `first` is not null, it must point to the first element
    /// of a live run that `D` knows how to tear down,
    /// and nothing else may own the run.
    #[inline]
    pub unsafe fn from_raw(first: *mut T) -> Self
        where D: Default
    {
        Self::from_raw_with_deleter(first, D::default())
    }

    /// Take ownership of the run whose first element is at `first`,
    /// to be torn down by `deleter`.
    ///
    /// # Safety
    ///
    /// See [`from_raw`][`Self::from_raw`].
    #[inline]
    pub unsafe fn from_raw_with_deleter(first: *mut T, deleter: D) -> Self
    {
        Self{first: NonNull::new(first), deleter, _owns: PhantomData}
    }

    /// Pointer to the first element, or null if the owner is empty.
    ///
    /// Ownership is retained.
    #[inline]
    pub fn get(&self) -> *mut T
    {
        match self.first {
            Some(first) => first.as_ptr(),
            None => ptr::null_mut(),
        }
    }

    /// Whether the owner owns a run.
    #[inline]
    pub fn is_owning(&self) -> bool
    {
        self.first.is_some()
    }

    /// Whether the owner is empty, that is, owns no run at all.
    ///
    /// This is about ownership, not about the number of elements:
    /// an owner of a run of zero elements is not empty,
    /// even though its [`len`][`UniqueArray::len`] is zero.
    #[inline]
    pub fn is_empty(&self) -> bool
    {
        self.first.is_none()
    }

    /// Borrow the element at `index` without checking anything.
    ///
    /// In debug builds, if the policy knows the length of the run,
    /// out of bounds access panics instead.
    ///
    /// # Safety
    ///
    /// The owner must not be empty,
    /// and `index` must be in bounds of the run.
    #[cfg_attr(debug_assertions, track_caller)]
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T
    {
        &*self.element(index)
    }

    /// Mutably borrow the element at `index` without checking anything.
    ///
    /// # Safety
    ///
    /// See [`get_unchecked`][`Self::get_unchecked`].
    #[cfg_attr(debug_assertions, track_caller)]
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T
    {
        &mut *self.element(index)
    }

    #[cfg_attr(debug_assertions, track_caller)]
    #[inline]
    unsafe fn element(&self, index: usize) -> *mut T
    {
        debug_assert!(self.first.is_some(), "indexed an empty UniqueArray");
        let first = self.first.unwrap_unchecked();

        if cfg!(debug_assertions) {
            if let Some(len) = self.deleter.known_len(first) {
                assert!(index < len, "tried to index out-of-bounds of a run");
            }
        }

        first.as_ptr().add(index)
    }

    /// Give up ownership without tearing anything down.
    ///
    /// Returns the pointer to the first element that was owned,
    /// or null if the owner was empty.
    /// The caller becomes responsible for tearing down the run.
    #[inline]
    pub fn release(&mut self) -> *mut T
    {
        match self.first.take() {
            Some(first) => first.as_ptr(),
            None => ptr::null_mut(),
        }
    }

    /// Like [`release`][`Self::release`], but consume the owner.
    #[inline]
    pub fn into_raw(mut self) -> *mut T
    {
        self.release()
    }

    /// Tear down the owned run, if any, leaving the owner empty.
    #[inline]
    pub fn reset(&mut self)
    {
        // SAFETY: A null pointer is always fine to adopt.
        unsafe { self.reset_to(ptr::null_mut()) }
    }

    /// Tear down the owned run, if any,
    /// and take ownership of the run at `first`.
    ///
    /// The old run is torn down before the new one is adopted,
    /// and while it is torn down the owner is already empty.
    ///
    /// # Safety
    ///
    /// See [`from_raw`][`Self::from_raw`].
    /// `first` must not be the run that is already owned.
    /// Runs of zero-sized or zero elements may share an address
    /// with other runs, so this cannot be checked by comparing pointers.
    pub unsafe fn reset_to(&mut self, first: *mut T)
    {
        let first = NonNull::new(first);

        if let Some(old) = self.first.take() {
            trace!("UniqueArray::reset: tearing down run at {:p}", old);
            self.deleter.delete_array(old);
        }

        self.first = first;
    }

    /// Exchange runs and policies with another owner.
    #[inline]
    pub fn swap(&mut self, other: &mut Self)
    {
        mem::swap(self, other);
    }

    /// Move the run and policy out into a new owner,
    /// leaving this owner empty with a default policy.
    #[inline]
    pub fn take(&mut self) -> Self
        where D: Default
    {
        mem::replace(self, Self::null())
    }

    /// Tear down the owned run, if any,
    /// then move the run and policy of `source` into this owner.
    ///
    /// `source` is left empty with a default policy.
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

/// Methods for owners of runs from [`alloc_run`].
///
/// These runs know their own length, so access can be checked.
impl<T> UniqueArray<T>
{
    /// Allocate a run of `len` elements and own it.
    ///
    /// Element `i` is initialized to `init(i)`.
    /// See [`alloc_run`] for what happens if `init` panics.
    #[inline]
    pub fn from_fn(len: usize, init: impl FnMut(usize) -> T)
        -> Result<Self, RunLenError>
    {
        let first = alloc_run(len, init)?;
        // SAFETY: The run is fresh, and DefaultArrayDelete frees runs.
        Ok(unsafe { Self::from_raw(first.as_ptr()) })
    }

    /// Allocate a run of `len` clones of `value` and own it.
    #[inline]
    pub fn from_elem(len: usize, value: T) -> Result<Self, RunLenError>
        where T: Clone
    {
        Self::from_fn(len, |_| value.clone())
    }

    /// Tear down the owned run, if any,
    /// and own a fresh run of `len` elements instead.
    ///
    /// The old run is torn down only once the new one is allocated,
    /// so on error the owner is left unchanged.
    pub fn reset_with(&mut self, len: usize, init: impl FnMut(usize) -> T)
        -> Result<(), RunLenError>
    {
        let first = alloc_run(len, init)?;
        // SAFETY: The run is fresh, and DefaultArrayDelete frees runs.
        unsafe { self.reset_to(first.as_ptr()) };
        Ok(())
    }

    /// Number of elements in the owned run, or zero if the owner is empty.
    ///
    /// A zero length does not make the owner [empty][`Self::is_empty`];
    /// use [`as_slice`][`Self::as_slice`] to ask about the elements.
    #[inline]
    pub fn len(&self) -> usize
    {
        match self.first {
            // SAFETY: We own a run from alloc_run.
            Some(first) => unsafe { run_len(first) },
            None => 0,
        }
    }

    /// Borrow the elements of the owned run.
    ///
    /// If the owner is empty, the slice is empty.
    #[inline]
    pub fn as_slice(&self) -> &[T]
    {
        match self.first {
            // SAFETY: We own a run from alloc_run,
            //         which has this many initialized elements.
            Some(first) => unsafe {
                slice::from_raw_parts(first.as_ptr(), run_len(first))
            },
            None => &[],
        }
    }

    /// Mutably borrow the elements of the owned run.
    ///
    /// If the owner is empty, the slice is empty.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T]
    {
        match self.first {
            // SAFETY: See as_slice; nobody else owns the run.
            Some(first) => unsafe {
                slice::from_raw_parts_mut(first.as_ptr(), run_len(first))
            },
            None => &mut [],
        }
    }
}

impl<T> Index<usize> for UniqueArray<T>
{
    type Output = T;

    #[inline]
    #[track_caller]
    fn index(&self, index: usize) -> &Self::Output
    {
        &self.as_slice()[index]
    }
}

impl<T> IndexMut<usize> for UniqueArray<T>
{
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output
    {
        &mut self.as_mut_slice()[index]
    }
}

impl<T, D> Default for UniqueArray<T, D>
    where D: ArrayDeleter<T> + Default
{
    #[inline]
    fn default() -> Self
    {
        Self::null()
    }
}

impl<T, D> Drop for UniqueArray<T, D>
    where D: ArrayDeleter<T>
{
    #[inline]
    fn drop(&mut self)
    {
        if let Some(first) = self.first.take() {
            // SAFETY: We owned the run, and it is not reachable anymore.
            unsafe { self.deleter.delete_array(first) };
        }
    }
}

impl<T, D> fmt::Debug for UniqueArray<T, D>
    where D: ArrayDeleter<T>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.debug_tuple("UniqueArray").field(&self.get()).finish()
    }
}

impl<T, D> fmt::Pointer for UniqueArray<T, D>
    where D: ArrayDeleter<T>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        fmt::Pointer::fmt(&self.get(), f)
    }
}
