//! Fingerprint records.
//!
//! A [`Fingerprint`] is one snapshot of the device, behavior and network
//! signals visible to the collector. Field names serialize in camelCase so
//! the JSON matches what browser-side collectors submit.

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// Value of [`NetworkFingerprint::ip`] as produced by the collector.
/// The server replaces it with the address it actually observed.
pub const NETWORK_IP_PLACEHOLDER: &str = "detected_by_server";

/// A complete snapshot produced by one collection call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fingerprint {
    pub user_id: Option<String>,
    pub session_id: String,
    pub device: DeviceFingerprint,
    pub behavior: BehaviorFingerprint,
    pub network: NetworkFingerprint,
    pub timestamp: Timestamp,
}

/// Browser and platform attributes read at collection time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFingerprint {
    pub user_agent: String,
    pub language: String,
    pub languages: Vec<String>,
    pub platform: String,
    pub cookie_enabled: bool,
    pub do_not_track: Option<String>,
    pub max_touch_points: u32,
    pub hardware_concurrency: u32,

    pub screen_width: u32,
    pub screen_height: u32,
    pub screen_color_depth: u32,
    pub screen_pixel_depth: u32,
    pub avail_width: u32,
    pub avail_height: u32,

    pub inner_width: u32,
    pub inner_height: u32,
    pub outer_width: u32,
    pub outer_height: u32,
    pub pixel_ratio: f64,

    pub timezone: String,
    /// Minutes to add to local time to reach UTC (positive west of Greenwich).
    pub timezone_offset: i32,

    pub local_storage: bool,
    pub session_storage: bool,
    #[serde(rename = "indexedDB")]
    pub indexed_db: bool,
    /// `None` when WebGL is unsupported or the probe failed.
    #[serde(rename = "webGL")]
    pub web_gl: Option<WebGlInfo>,
    /// Hex digest of the rendered test canvas; `None` when rendering failed.
    pub canvas: Option<String>,

    pub plugins_length: u32,
    pub on_line: bool,
    pub connection: Option<ConnectionInfo>,
    pub memory: Option<MemoryInfo>,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebGlInfo {
    pub vendor: String,
    pub renderer: String,
    pub version: String,
    pub shading_language_version: String,
}

/// Connection-quality hints from the host's network information API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub effective_type: Option<String>,
    #[serde(rename = "type")]
    pub connection_type: Option<String>,
    /// Megabits per second.
    pub downlink: Option<f64>,
    /// Round-trip time in milliseconds.
    pub rtt: Option<u32>,
    pub save_data: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryInfo {
    #[serde(rename = "usedJSHeapSize")]
    pub used_js_heap_size: u64,
    #[serde(rename = "totalJSHeapSize")]
    pub total_js_heap_size: u64,
    #[serde(rename = "jsHeapSizeLimit")]
    pub js_heap_size_limit: u64,
}

/// Interaction counters accumulated across page loads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorFingerprint {
    pub mouse_movements: u64,
    pub keystrokes: u64,
    pub clicks: u64,
    pub scroll_events: u64,
    pub focus_events: u64,
    /// Milliseconds since the persisted session start.
    pub session_duration: u64,
    /// Milliseconds since the page (or process) was loaded.
    pub page_load_time: f64,
    pub referrer: String,
    pub url: String,
    pub title: String,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFingerprint {
    pub ip: String,
    pub connection_type: String,
    pub effective_type: String,
    pub downlink: f64,
    pub rtt: u32,
    pub timestamp: Timestamp,
}

impl NetworkFingerprint {
    /// Build the network section from optional connection hints, defaulting
    /// to `"unknown"` / `0` for anything the host does not expose.
    pub fn from_connection(connection: Option<&ConnectionInfo>, timestamp: Timestamp) -> Self {
        let unknown = || "unknown".to_string();
        Self {
            ip: NETWORK_IP_PLACEHOLDER.to_string(),
            connection_type: connection
                .and_then(|c| c.connection_type.clone())
                .unwrap_or_else(unknown),
            effective_type: connection
                .and_then(|c| c.effective_type.clone())
                .unwrap_or_else(unknown),
            downlink: connection.and_then(|c| c.downlink).unwrap_or(0.0),
            rtt: connection.and_then(|c| c.rtt).unwrap_or(0),
            timestamp,
        }
    }
}
