//! Ports layer

mod outbound;

pub use outbound::*;
