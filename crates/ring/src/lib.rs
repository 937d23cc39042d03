#![forbid(unsafe_code)]

mod avl;
mod hash;
mod ring;

pub use avl::{AvlTree, Iter};
pub use hash::{SPACE_SIZE, ring_position};
pub use ring::{HashRing, NodeAddr, ParseNodeAddrError, Placement, RingEntry};
