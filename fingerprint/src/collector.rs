//! The fingerprint collector.

use std::sync::Arc;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use fraudgate_types::{
    BehaviorFingerprint, DeviceFingerprint, Fingerprint, NetworkFingerprint, Timestamp,
};
use tracing::{debug, warn};

use crate::storage::read_u64;
use crate::tracking::{InteractionCounter, SESSION_START_KEY};
use crate::{
    Clock, HostEnvironment, InteractionChannel, InteractionSource, KeyValueStore, SessionId,
    TrackingSubscription,
};

type Blake2b256 = Blake2b<U32>;

/// Produces [`Fingerprint`] snapshots from an injected host, storage and
/// clock.
///
/// Collection never fails: probes the host cannot answer degrade to
/// defaults (`0`, `"unknown"`, `None`) and storage failures read as zero.
pub struct FingerprintCollector {
    session_id: SessionId,
    store: Arc<dyn KeyValueStore>,
    env: Arc<dyn HostEnvironment>,
    clock: Arc<dyn Clock>,
}

impl FingerprintCollector {
    pub fn new(
        session_id: SessionId,
        store: Arc<dyn KeyValueStore>,
        env: Arc<dyn HostEnvironment>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session_id,
            store,
            env,
            clock,
        }
    }

    /// Build a collector whose session id is loaded from (or minted into)
    /// `store`.
    pub fn from_store(
        store: Arc<dyn KeyValueStore>,
        env: Arc<dyn HostEnvironment>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let session_id = SessionId::load_or_create(store.as_ref(), clock.as_ref());
        Self::new(session_id, store, env, clock)
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn collect_device(&self) -> DeviceFingerprint {
        let nav = self.env.navigator();
        let screen = self.env.screen().unwrap_or_default();
        let viewport = self.env.viewport().unwrap_or_default();
        let tz = self.env.timezone();
        let features = self.env.storage_features();

        DeviceFingerprint {
            user_agent: nav.user_agent,
            language: nav.language,
            languages: nav.languages,
            platform: nav.platform,
            cookie_enabled: nav.cookie_enabled,
            do_not_track: nav.do_not_track,
            max_touch_points: nav.max_touch_points.unwrap_or(0),
            hardware_concurrency: nav.hardware_concurrency.unwrap_or(0),

            screen_width: screen.width,
            screen_height: screen.height,
            screen_color_depth: screen.color_depth,
            screen_pixel_depth: screen.pixel_depth,
            avail_width: screen.avail_width,
            avail_height: screen.avail_height,

            inner_width: viewport.inner_width,
            inner_height: viewport.inner_height,
            outer_width: viewport.outer_width,
            outer_height: viewport.outer_height,
            pixel_ratio: viewport.pixel_ratio.filter(|r| *r > 0.0).unwrap_or(1.0),

            timezone: tz.name,
            timezone_offset: tz.offset_minutes,

            local_storage: features.local_storage,
            session_storage: features.session_storage,
            indexed_db: features.indexed_db,
            web_gl: self.probe_webgl(),
            canvas: self.canvas_hash(),

            plugins_length: nav.plugins_length.unwrap_or(0),
            on_line: nav.on_line,
            connection: self.env.connection(),
            memory: self.env.memory(),
            timestamp: self.clock.now(),
        }
    }

    pub fn collect_behavior(&self) -> BehaviorFingerprint {
        let now = self.clock.now();
        let store = self.store.as_ref();
        let counter = |channel: InteractionChannel| read_u64(store, channel.storage_key(), 0);
        let session_start =
            Timestamp::from_millis(read_u64(store, SESSION_START_KEY, now.as_millis()));
        let page = self.env.page();

        BehaviorFingerprint {
            mouse_movements: counter(InteractionChannel::PointerMove),
            keystrokes: counter(InteractionChannel::KeyPress),
            clicks: counter(InteractionChannel::Click),
            scroll_events: counter(InteractionChannel::Scroll),
            focus_events: counter(InteractionChannel::Focus),
            session_duration: session_start.elapsed_since(now),
            page_load_time: page.load_time_ms,
            referrer: page.referrer,
            url: page.url,
            title: page.title,
            timestamp: now,
        }
    }

    pub fn collect_network(&self) -> NetworkFingerprint {
        NetworkFingerprint::from_connection(self.env.connection().as_ref(), self.clock.now())
    }

    /// A fresh snapshot of all three sections.
    pub fn collect_complete(&self, user_id: Option<&str>) -> Fingerprint {
        Fingerprint {
            user_id: user_id.map(str::to_string),
            session_id: self.session_id.to_string(),
            device: self.collect_device(),
            behavior: self.collect_behavior(),
            network: self.collect_network(),
            timestamp: self.clock.now(),
        }
    }

    /// Start counting interactions delivered by `source`.
    ///
    /// Records the session start if none is stored yet, then registers one
    /// listener per [`InteractionChannel`]. Each event increments and
    /// persists its counter until the returned subscription is dropped.
    pub fn init_tracking(&self, source: Arc<dyn InteractionSource>) -> TrackingSubscription {
        self.ensure_session_start();

        let ids = InteractionChannel::ALL
            .iter()
            .map(|&channel| {
                let counter = Arc::new(InteractionCounter::seeded(channel, Arc::clone(&self.store)));
                source.add_listener(channel, Arc::new(move || counter.record()))
            })
            .collect();

        debug!(session_id = %self.session_id, "interaction tracking started");
        TrackingSubscription::new(source, ids)
    }

    /// A stored start that is empty, zero or not a number counts as absent.
    fn ensure_session_start(&self) {
        match self.store.get(SESSION_START_KEY) {
            Ok(Some(raw)) if raw.trim().parse::<u64>().is_ok_and(|ms| ms > 0) => {}
            Ok(_) => {
                let now = self.clock.now().as_millis().to_string();
                if let Err(e) = self.store.set(SESSION_START_KEY, &now) {
                    warn!("could not persist session start: {e}");
                }
            }
            Err(e) => warn!("session start unreadable: {e}"),
        }
    }

    fn probe_webgl(&self) -> Option<fraudgate_types::WebGlInfo> {
        match self.env.webgl() {
            Ok(info) => info,
            Err(e) => {
                debug!("webgl probe failed: {e}");
                None
            }
        }
    }

    fn canvas_hash(&self) -> Option<String> {
        match self.env.render_canvas() {
            Ok(bytes) if !bytes.is_empty() => {
                let mut hasher = Blake2b256::new();
                hasher.update(&bytes);
                Some(hex::encode(hasher.finalize()))
            }
            Ok(_) => None,
            Err(e) => {
                debug!("canvas probe failed: {e}");
                None
            }
        }
    }
}
