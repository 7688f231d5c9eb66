//! Count drop events, so tests can tell
//! whether a value was torn down once, twice, or never.

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

use alloc::rc::Rc;
use core::cell::Cell;
use core::ops::Deref;
use core::ops::DerefMut;

/// Shared tally of drop events.
///
/// Clones of a counter observe and update the same tally.
#[derive(Clone, Debug, Default)]
pub struct DropCounter
{
    count: Rc<Cell<usize>>,
}

impl DropCounter
{
    /// Create a counter that has recorded nothing yet.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Number of drop events recorded so far.
    pub fn count(&self) -> usize
    {
        self.count.get()
    }

    /// Record a single drop event.
    pub fn record(&self)
    {
        self.count.set(self.count.get() + 1);
    }

    /// Wrap a value so that dropping it is recorded by this counter.
    pub fn track<T>(&self, value: T) -> Tracked<T>
    {
        Tracked{value, counter: self.clone()}
    }
}

/// Value whose drop is recorded by a [`DropCounter`].
///
/// Cloning a tracked value yields another tracked value
/// that reports to the same counter.
#[derive(Debug)]
pub struct Tracked<T>
{
    value: T,
    counter: DropCounter,
}

impl<T> Tracked<T>
{
    /// The counter this value reports to.
    pub fn counter(&self) -> &DropCounter
    {
        &self.counter
    }
}

impl<T> Clone for Tracked<T>
    where T: Clone
{
    fn clone(&self) -> Self
    {
        self.counter.track(self.value.clone())
    }
}

impl<T> Drop for Tracked<T>
{
    fn drop(&mut self)
    {
        self.counter.record();
    }
}

impl<T> Deref for Tracked<T>
{
    type Target = T;

    fn deref(&self) -> &Self::Target
    {
        &self.value
    }
}

impl<T> DerefMut for Tracked<T>
{
    fn deref_mut(&mut self) -> &mut Self::Target
    {
        &mut self.value
    }
}
