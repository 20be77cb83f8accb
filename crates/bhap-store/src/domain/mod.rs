//! Storage domain: key layout and errors

mod errors;
mod keys;

pub use errors::*;
pub use keys::*;
