//! Allocation of contiguous runs of objects.
//!
//! A run is a single allocation holding a small header,
//! followed by the elements of the run.
//! The header records the number of elements,
//! so that the run can be torn down given only a pointer to its first element.
//! This is what lets [`UniqueArray`] get away without storing a length.
//!
//! ```text
//! +--------+---------+-----------+-----------+-----
//! | Header | padding | element 0 | element 1 | ...
//! +--------+---------+-----------+-----------+-----
//!                    ^
//!                    pointer handed out
//! ```
//!
//! [`UniqueArray`]: `crate::UniqueArray`

use alloc::alloc::alloc;
use alloc::alloc::dealloc;
use alloc::alloc::handle_alloc_error;
use core::alloc::Layout;
use core::fmt;
use core::mem::align_of;
use core::mem::size_of;
use core::ptr::NonNull;
use core::ptr;
use log::trace;
use scopeguard::ScopeGuard;
use scopeguard::defer;
use scopeguard::guard;

/// Raised when a run is too long for its size to be representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunLenError;

impl fmt::Display for RunLenError
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.write_str("run too long to allocate")
    }
}

/// Metadata in front of the elements of each run.
#[repr(C)]
struct Header
{
    /// Number of elements in the run.
    len: usize,
}

/// Alignment of the allocation of a run of `T`.
const fn run_align<T>() -> usize
{
    let header = align_of::<Header>();
    let element = align_of::<T>();
    if header > element { header } else { element }
}

/// Distance in bytes from the start of the allocation to the first element.
///
/// This does not depend on the length of the run,
/// so the header can always be found from the first element.
const fn elements_offset<T>() -> usize
{
    let align = align_of::<T>();
    (size_of::<Header>() + align - 1) & !(align - 1)
}

/// Layout of the allocation of a run of `len` elements.
fn run_layout<T>(len: usize) -> Result<Layout, RunLenError>
{
    const ERR: RunLenError = RunLenError;
    let elements = size_of::<T>().checked_mul(len).ok_or(ERR)?;
    let size = elements_offset::<T>().checked_add(elements).ok_or(ERR)?;
    Layout::from_size_align(size, run_align::<T>()).map_err(|_| ERR)
}

/// Find the header of the run whose first element is at `first`.
#[inline]
unsafe fn header<T>(first: NonNull<T>) -> *mut Header
{
    (first.as_ptr() as *mut u8).sub(elements_offset::<T>()) as *mut Header
}

/// Allocate a run of `len` elements and initialize it.
///
/// Element `i` is initialized to `init(i)`, in increasing order of `i`.
/// The returned pointer points to the first element,
/// and can be passed to [`free_run`] to tear the run down again.
///
/// If `init` panics, the elements initialized so far are dropped
/// and the memory is freed before the panic continues.
///
/// If the memory cannot be allocated,
/// [`handle_alloc_error`] is called.
pub fn alloc_run<T>(len: usize, mut init: impl FnMut(usize) -> T)
    -> Result<NonNull<T>, RunLenError>
{
    let layout = run_layout::<T>(len)?;

    unsafe {
        // The header guarantees a non-zero size.
        let base = alloc(layout);
        if base.is_null() {
            handle_alloc_error(layout);
        }

        (base as *mut Header).write(Header{len});
        let first = base.add(elements_offset::<T>()) as *mut T;

        // Counts the initialized elements, and cleans them up
        // unless the guard is defused once all are initialized.
        let mut written = guard(0usize, |written| {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(first, written));
            dealloc(base, layout);
        });

        while *written < len {
            first.add(*written).write(init(*written));
            *written += 1;
        }

        ScopeGuard::into_inner(written);

        trace!(
            "alloc_run: {} elements of {} bytes at {:p}",
            len, size_of::<T>(), first,
        );

        Ok(NonNull::new_unchecked(first))
    }
}

/// Number of elements in the run whose first element is at `first`.
///
/// # Safety
///
/// `first` must have been returned by [`alloc_run`]
/// and the run must not have been freed.
#[inline]
pub unsafe fn run_len<T>(first: NonNull<T>) -> usize
{
    (*header(first)).len
}

/// Drop every element of a run and free its memory.
///
/// The memory is freed even if dropping an element panics.
///
/// # Safety
///
/// `first` must have been returned by [`alloc_run`]
/// and the run must not have been freed.
/// No element may be used after this call.
pub unsafe fn free_run<T>(first: NonNull<T>)
{
    let header = header(first);
    let len = (*header).len;

    // The same layout was successfully computed when allocating.
    let size = elements_offset::<T>() + size_of::<T>() * len;
    let layout = Layout::from_size_align_unchecked(size, run_align::<T>());

    defer! { dealloc(header as *mut u8, layout); }

    trace!("free_run: {} elements at {:p}", len, first);

    ptr::drop_in_place(ptr::slice_from_raw_parts_mut(first.as_ptr(), len));
}
