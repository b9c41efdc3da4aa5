//! Nullable infrastructure for deterministic testing.
//!
//! Everything the collector and the server talk to (clock, storage, host
//! environment, risk verifier) is abstracted behind a trait. This crate
//! provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod environment;
pub mod storage;
pub mod verifier;

pub use clock::NullClock;
pub use environment::NullEnvironment;
pub use storage::NullStorage;
pub use verifier::NullVerifier;
