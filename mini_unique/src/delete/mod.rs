//! Release policies.
//!
//! A release policy knows how to tear down a resource of one shape.
//! The shape is part of the trait, so an owner of one shape
//! cannot be given a policy of the other shape.
//!
//! | Policy                   | Shape                    | Tears down                              |
//! |--------------------------|--------------------------|-----------------------------------------|
//! | [`DefaultDelete`]        | [`Deleter`]              | A [`Box`][`alloc::boxed::Box`]          |
//! | [`DefaultArrayDelete`]   | [`ArrayDeleter`]         | A run from [`alloc_run`]                |
//! | [`FnDelete`]             | Both                     | Whatever the closure does               |
//!
//! Policies are stored by value inside the owner.
//! A policy without fields takes up no space at all.
//! To share state between owners, borrow the policy:
//! `&mut D` is a policy whenever `D` is.
//!
//! [`alloc_run`]: `crate::run::alloc_run`

pub use self::array::*;
pub use self::func::*;
pub use self::scalar::*;

mod array;
mod func;
mod scalar;
