//! Owners of heap resources.
//!
//! # States
//!
//! Every owner is either *empty* or *owning*.
//! An owning owner has exactly one pending teardown,
//! which runs when the owner is dropped.
//! The operations move an owner between the two states as follows.
//!
//! | Operation                  | From             | To      | Teardowns         |
//! |----------------------------|------------------|---------|-------------------|
//! | `null`                     |                  | Empty   | 0                 |
//! | `from_raw` (non-null)      |                  | Owning  | 0                 |
//! | `release`, `take` (source) | Either           | Empty   | 0                 |
//! | `reset`                    | Either           | Empty   | 1 if was owning   |
//! | `reset_to` (non-null)      | Either           | Owning  | 1 if was owning   |
//! | `swap`                     | Either           | Either  | 0                 |
//! | drop                       | Either           |         | 1 if owning       |
//!
//! Assigning one owner to another is a drop of the old target
//! followed by a move, so it tears down the target's resource, if any.
//! Neither owner can be cloned;
//! the only way to get a resource into a second owner is to move it there.

pub use self::unique_array::*;
pub use self::unique_ptr::*;

mod unique_array;
mod unique_ptr;
