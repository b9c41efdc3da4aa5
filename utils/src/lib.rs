//! Shared utilities for fraudgate.

pub mod ids;
pub mod logging;
pub mod time;

pub use ids::{generate_order_id, generate_session_id, generate_token};
pub use logging::{init_logging, LogFormat};
pub use time::{iso_timestamp, now_iso};
