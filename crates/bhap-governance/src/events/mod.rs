//! Events layer
//!
//! Published after a state change has been persisted.

mod published;

pub use published::*;
