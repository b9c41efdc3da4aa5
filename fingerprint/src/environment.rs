//! The host the collector runs in.
//!
//! A [`HostEnvironment`] answers the questions a browser answers through
//! `navigator`, `screen`, `window`, canvas and WebGL. Every probe that a
//! host may lack returns `Option` or `Result`; the collector turns
//! absence into documented defaults.

use std::time::Instant;

use fraudgate_types::{ConnectionInfo, MemoryInfo, WebGlInfo};

use crate::FingerprintError;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NavigatorInfo {
    pub user_agent: String,
    pub language: String,
    pub languages: Vec<String>,
    pub platform: String,
    pub cookie_enabled: bool,
    pub do_not_track: Option<String>,
    pub max_touch_points: Option<u32>,
    pub hardware_concurrency: Option<u32>,
    pub plugins_length: Option<u32>,
    pub on_line: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScreenInfo {
    pub width: u32,
    pub height: u32,
    pub color_depth: u32,
    pub pixel_depth: u32,
    pub avail_width: u32,
    pub avail_height: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportInfo {
    pub inner_width: u32,
    pub inner_height: u32,
    pub outer_width: u32,
    pub outer_height: u32,
    pub pixel_ratio: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimezoneInfo {
    /// IANA name, e.g. `America/Sao_Paulo`.
    pub name: String,
    /// Minutes to add to local time to reach UTC.
    pub offset_minutes: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StorageFeatures {
    pub local_storage: bool,
    pub session_storage: bool,
    pub indexed_db: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageInfo {
    pub referrer: String,
    pub url: String,
    pub title: String,
    /// Milliseconds since the page (or process) started.
    pub load_time_ms: f64,
}

/// Read-only view of the execution environment.
pub trait HostEnvironment: Send + Sync {
    fn navigator(&self) -> NavigatorInfo;

    fn screen(&self) -> Option<ScreenInfo>;

    fn viewport(&self) -> Option<ViewportInfo>;

    fn timezone(&self) -> TimezoneInfo;

    fn storage_features(&self) -> StorageFeatures;

    /// Render the fixed test canvas and return its encoded bytes.
    fn render_canvas(&self) -> Result<Vec<u8>, FingerprintError>;

    /// WebGL vendor strings; `Ok(None)` when the host has no WebGL context.
    fn webgl(&self) -> Result<Option<WebGlInfo>, FingerprintError>;

    fn connection(&self) -> Option<ConnectionInfo>;

    fn memory(&self) -> Option<MemoryInfo>;

    fn page(&self) -> PageInfo;
}

/// What a native process can observe about itself.
///
/// Browser-only probes (screen, canvas, WebGL, network information, JS heap)
/// report as unavailable.
pub struct ProcessEnvironment {
    user_agent: String,
    title: String,
    started: Instant,
}

impl ProcessEnvironment {
    /// `product` and `version` form the user agent, e.g.
    /// `fraudgate/0.1.0 (linux; x86_64)`.
    pub fn new(product: &str, version: &str) -> Self {
        Self {
            user_agent: format!(
                "{product}/{version} ({}; {})",
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
            title: product.to_string(),
            started: Instant::now(),
        }
    }

    fn locale() -> Option<String> {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.is_empty() && v != "C" && v != "POSIX")
            .map(|v| posix_locale_to_bcp47(&v))
    }
}

/// `pt_BR.UTF-8` → `pt-BR`.
fn posix_locale_to_bcp47(locale: &str) -> String {
    let base = locale.split(['.', '@']).next().unwrap_or(locale);
    base.replace('_', "-")
}

impl HostEnvironment for ProcessEnvironment {
    fn navigator(&self) -> NavigatorInfo {
        let language = Self::locale().unwrap_or_else(|| "en-US".to_string());
        NavigatorInfo {
            user_agent: self.user_agent.clone(),
            languages: vec![language.clone()],
            language,
            platform: std::env::consts::OS.to_string(),
            cookie_enabled: false,
            do_not_track: None,
            max_touch_points: None,
            hardware_concurrency: std::thread::available_parallelism()
                .ok()
                .map(|n| n.get() as u32),
            plugins_length: None,
            on_line: true,
        }
    }

    fn screen(&self) -> Option<ScreenInfo> {
        None
    }

    fn viewport(&self) -> Option<ViewportInfo> {
        None
    }

    fn timezone(&self) -> TimezoneInfo {
        let offset_secs = chrono::Local::now().offset().local_minus_utc();
        TimezoneInfo {
            name: std::env::var("TZ")
                .ok()
                .filter(|tz| !tz.is_empty())
                .unwrap_or_else(|| "UTC".to_string()),
            offset_minutes: -offset_secs / 60,
        }
    }

    fn storage_features(&self) -> StorageFeatures {
        StorageFeatures {
            local_storage: true,
            session_storage: false,
            indexed_db: false,
        }
    }

    fn render_canvas(&self) -> Result<Vec<u8>, FingerprintError> {
        Err(FingerprintError::Unsupported("canvas"))
    }

    fn webgl(&self) -> Result<Option<WebGlInfo>, FingerprintError> {
        Ok(None)
    }

    fn connection(&self) -> Option<ConnectionInfo> {
        None
    }

    fn memory(&self) -> Option<MemoryInfo> {
        None
    }

    fn page(&self) -> PageInfo {
        PageInfo {
            referrer: String::new(),
            url: std::env::current_exe()
                .map(|p| format!("file://{}", p.display()))
                .unwrap_or_default(),
            title: self.title.clone(),
            load_time_ms: self.started.elapsed().as_secs_f64() * 1000.0,
        }
    }
}
