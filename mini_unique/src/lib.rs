//! Single-owner handles to heap resources.
//!
//! An owner holds at most one resource and tears it down exactly once,
//! when it is dropped or [`reset`][`UniquePtr::reset`].
//! Ownership moves from owner to owner but is never duplicated.
//!
//! | Owner           | Resource                  | Access      | Default policy         |
//! |-----------------|---------------------------|-------------|------------------------|
//! | [`UniquePtr`]   | One object                | Dereference | [`DefaultDelete`]      |
//! | [`UniqueArray`] | Contiguous run of objects | Indexing    | [`DefaultArrayDelete`] |
//!
//! How a resource is torn down is decided by its release policy,
//! see the [`delete`] module.

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub use self::delete::*;
pub use self::owner::*;

pub mod delete;
pub mod owner;
pub mod run;
