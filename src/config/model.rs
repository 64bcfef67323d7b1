//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence.
//! Every field has a sensible default so the client works against a local
//! backend out of the box.

use serde::{Deserialize, Serialize};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub captcha: CaptchaConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How a previous login is recovered at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionCheckMode {
    /// The client stores the session id on disk and validates it with
    /// `POST /check-session {session_id}`.
    #[default]
    Stored,
    /// The backend keeps the login; the client asks with a bare
    /// `GET /check-session` and holds ids in memory only.
    Backend,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub session_check: SessionCheckMode,
    /// Unset means requests may take as long as the backend needs.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_check: SessionCheckMode::default(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_file")]
    pub file: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            file: default_session_file(),
        }
    }
}

/// Where CAPTCHA images go and how they are opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    #[serde(default = "default_captcha_dir")]
    pub dir: String,
    #[serde(default = "default_open_with")]
    pub open_with: Option<String>,
    #[serde(default)]
    pub auto_open: bool,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            dir: default_captcha_dir(),
            open_with: default_open_with(),
            auto_open: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            timestamp_format: default_timestamp_format(),
        }
    }
}

/// Diagnostic log settings. The terminal belongs to the UI, so logs go to a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_log_file")]
    pub file: String,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}
fn default_true() -> bool {
    true
}
fn default_session_file() -> String {
    "~/.local/share/portaldash/session.toml".to_string()
}
fn default_captcha_dir() -> String {
    "~/.cache/portaldash".to_string()
}
fn default_open_with() -> Option<String> {
    if cfg!(target_os = "macos") {
        Some("open".to_string())
    } else if cfg!(windows) {
        Some("explorer".to_string())
    } else {
        Some("xdg-open".to_string())
    }
}
fn default_timestamp_format() -> String {
    "%H:%M".to_string()
}
fn default_log_file() -> String {
    "~/.local/share/portaldash/portaldash.log".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
