//! Record tree domain model.
//!
//! # Responsibility
//! - Define the Year -> Month -> Day -> leaf tree persisted as one document.
//! - Normalize raw leaf values into a closed tag enumeration.
//!
//! # Invariants
//! - Deleting a leaf never leaves an empty Month or Year node behind.
//! - Leaves are kept raw so unknown values survive a whole-tree rewrite.
//!
//! # See also
//! - `aggregate` for counting over the tree.

pub mod record;
pub mod tree;
