//! Adapters the CLI supplies to the governance service.

mod identity;

pub use identity::EmailIdentityResolver;
