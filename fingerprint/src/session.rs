//! Client session identity.

use std::fmt;

use fraudgate_utils::generate_session_id;
use tracing::{debug, warn};

use crate::{Clock, KeyValueStore};

/// Storage key holding the persisted session id.
pub const SESSION_ID_KEY: &str = "antifraud_session_id";

/// A session id minted once per client and reused for the lifetime of its
/// storage.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Read the persisted id, minting and persisting a fresh one when absent.
    ///
    /// If storage cannot be read or written the fresh id is returned
    /// unpersisted; the next load will mint another.
    pub fn load_or_create(store: &dyn KeyValueStore, clock: &dyn Clock) -> Self {
        match store.get(SESSION_ID_KEY) {
            Ok(Some(id)) if !id.is_empty() => return Self(id),
            Ok(_) => {}
            Err(e) => {
                warn!("session storage unreadable, using ephemeral session id: {e}");
                return Self(generate_session_id(clock.now()));
            }
        }

        let id = generate_session_id(clock.now());
        match store.set(SESSION_ID_KEY, &id) {
            Ok(()) => debug!(session_id = %id, "minted new session id"),
            Err(e) => warn!("could not persist session id: {e}"),
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
