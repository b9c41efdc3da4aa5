//! Nullable host environment: scripted probe answers.

use fraudgate_fingerprint::{
    FingerprintError, HostEnvironment, NavigatorInfo, PageInfo, ScreenInfo, StorageFeatures,
    TimezoneInfo, ViewportInfo,
};
use fraudgate_types::{ConnectionInfo, MemoryInfo, WebGlInfo};

/// A host whose every probe answer is a public field.
///
/// `canvas` and `webgl` hold the probe outcome; `Err(message)` makes the
/// probe fail the way a browser without the feature (or one that throws)
/// would.
#[derive(Clone, Debug)]
pub struct NullEnvironment {
    pub navigator: NavigatorInfo,
    pub screen: Option<ScreenInfo>,
    pub viewport: Option<ViewportInfo>,
    pub timezone: TimezoneInfo,
    pub storage_features: StorageFeatures,
    pub canvas: Result<Vec<u8>, String>,
    pub webgl: Result<Option<WebGlInfo>, String>,
    pub connection: Option<ConnectionInfo>,
    pub memory: Option<MemoryInfo>,
    pub page: PageInfo,
}

impl NullEnvironment {
    /// A desktop Chromium-like host exposing every probe.
    pub fn browser() -> Self {
        Self {
            navigator: NavigatorInfo {
                user_agent: "Mozilla/5.0 (X11; Linux x86_64) Chrome/124.0".into(),
                language: "pt-BR".into(),
                languages: vec!["pt-BR".into(), "en-US".into()],
                platform: "Linux x86_64".into(),
                cookie_enabled: true,
                do_not_track: None,
                max_touch_points: Some(0),
                hardware_concurrency: Some(8),
                plugins_length: Some(5),
                on_line: true,
            },
            screen: Some(ScreenInfo {
                width: 1920,
                height: 1080,
                color_depth: 24,
                pixel_depth: 24,
                avail_width: 1920,
                avail_height: 1050,
            }),
            viewport: Some(ViewportInfo {
                inner_width: 1280,
                inner_height: 720,
                outer_width: 1300,
                outer_height: 800,
                pixel_ratio: Some(2.0),
            }),
            timezone: TimezoneInfo {
                name: "America/Sao_Paulo".into(),
                offset_minutes: 180,
            },
            storage_features: StorageFeatures {
                local_storage: true,
                session_storage: true,
                indexed_db: true,
            },
            canvas: Ok(b"data:image/png;base64,iVBORw0KGgo".to_vec()),
            webgl: Ok(Some(WebGlInfo {
                vendor: "WebKit".into(),
                renderer: "WebKit WebGL".into(),
                version: "WebGL 1.0".into(),
                shading_language_version: "WebGL GLSL ES 1.0".into(),
            })),
            connection: Some(ConnectionInfo {
                effective_type: Some("4g".into()),
                connection_type: Some("wifi".into()),
                downlink: Some(10.0),
                rtt: Some(50),
                save_data: Some(false),
            }),
            memory: Some(MemoryInfo {
                used_js_heap_size: 10_000_000,
                total_js_heap_size: 20_000_000,
                js_heap_size_limit: 4_000_000_000,
            }),
            page: PageInfo {
                referrer: "https://example.com/".into(),
                url: "https://shop.example.com/checkout".into(),
                title: "Checkout".into(),
                load_time_ms: 1234.5,
            },
        }
    }

    /// A locked-down host: no optional probes, canvas throws, no WebGL.
    pub fn bare() -> Self {
        Self {
            navigator: NavigatorInfo {
                user_agent: "Mozilla/5.0 (Hardened)".into(),
                language: "en-US".into(),
                languages: vec!["en-US".into()],
                platform: "Unknown".into(),
                ..Default::default()
            },
            screen: None,
            viewport: None,
            timezone: TimezoneInfo {
                name: "UTC".into(),
                offset_minutes: 0,
            },
            storage_features: StorageFeatures::default(),
            canvas: Err("canvas blocked".into()),
            webgl: Err("webgl context lost".into()),
            connection: None,
            memory: None,
            page: PageInfo::default(),
        }
    }
}

impl HostEnvironment for NullEnvironment {
    fn navigator(&self) -> NavigatorInfo {
        self.navigator.clone()
    }

    fn screen(&self) -> Option<ScreenInfo> {
        self.screen
    }

    fn viewport(&self) -> Option<ViewportInfo> {
        self.viewport
    }

    fn timezone(&self) -> TimezoneInfo {
        self.timezone.clone()
    }

    fn storage_features(&self) -> StorageFeatures {
        self.storage_features
    }

    fn render_canvas(&self) -> Result<Vec<u8>, FingerprintError> {
        self.canvas.clone().map_err(FingerprintError::Probe)
    }

    fn webgl(&self) -> Result<Option<WebGlInfo>, FingerprintError> {
        self.webgl.clone().map_err(FingerprintError::Probe)
    }

    fn connection(&self) -> Option<ConnectionInfo> {
        self.connection.clone()
    }

    fn memory(&self) -> Option<MemoryInfo> {
        self.memory
    }

    fn page(&self) -> PageInfo {
        self.page.clone()
    }
}
