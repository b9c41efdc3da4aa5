//! Fingerprint collection.
//!
//! The collector reads three kinds of signal:
//! - **device**: attributes of the host environment ([`HostEnvironment`]),
//! - **behavior**: interaction counters persisted in a [`KeyValueStore`],
//! - **network**: connection-quality hints, when the host exposes them.
//!
//! Everything external (storage, the host, the clock, the source of
//! interaction events) sits behind a trait so hosts can supply their own
//! and tests can supply deterministic ones.

pub mod clock;
pub mod collector;
pub mod environment;
pub mod error;
pub mod session;
pub mod storage;
pub mod tracking;

pub use clock::{Clock, SystemClock};
pub use collector::FingerprintCollector;
pub use environment::{
    HostEnvironment, NavigatorInfo, PageInfo, ProcessEnvironment, ScreenInfo, StorageFeatures,
    TimezoneInfo, ViewportInfo,
};
pub use error::FingerprintError;
pub use session::{SessionId, SESSION_ID_KEY};
pub use storage::{FileStore, KeyValueStore};
pub use tracking::{
    InteractionBus, InteractionChannel, InteractionSource, ListenerId, TrackingSubscription,
    SESSION_START_KEY,
};
