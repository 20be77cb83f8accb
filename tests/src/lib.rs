//! # BHAP Test Suite
//!
//! Cross-crate tests: the governance service over the key-value Entity Store.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── mod.rs          # World harness shared by the flows below
//!     ├── scenarios.rs    # Lifecycle and quorum scenarios
//!     ├── concurrency.rs  # Racing publishes and casts
//!     └── persistence.rs  # File-backed store across restarts
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p bhap-tests
//! cargo test -p bhap-tests integration::concurrency
//! ```

pub mod integration;
