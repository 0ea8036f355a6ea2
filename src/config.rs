//! Runtime configuration, read once at startup from the environment.
//!
//! Everything that was a deployment knob in the reference deployment
//! (provider credentials, CORS allowlist, country calling code) is an
//! environment variable here, `CHARAK_`-prefixed, with a sane default.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Charak";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when `CHARAK_LOG` is unset.
pub fn default_log_filter() -> String {
    "info,charak=debug".to_string()
}

/// Get the application data directory (`~/.charak/` on all platforms).
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".charak")
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    /// Country calling code assumed for bare 10-digit phone numbers.
    pub default_calling_code: String,
    /// Validity window for issued OTP codes (both channels).
    pub otp_ttl: Duration,
    /// Timeout applied to every outbound provider call.
    pub provider_timeout: Duration,
    /// Origins allowed by the CORS layer.
    pub allowed_origins: Vec<String>,
    pub sms_api_url: Option<String>,
    pub sms_api_key: Option<String>,
    pub sms_from: Option<String>,
    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from: Option<String>,
    pub transcribe_api_url: String,
    pub transcribe_api_key: Option<String>,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let port = env_var("CHARAK_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(5000);
        let host = env_var("CHARAK_HOST")
            .and_then(|h| h.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        Self {
            bind_addr: SocketAddr::new(host, port),
            db_path: env_var("CHARAK_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|| app_data_dir().join("charak.db")),
            default_calling_code: env_var("CHARAK_COUNTRY_CODE")
                .unwrap_or_else(|| "+91".to_string()),
            otp_ttl: Duration::from_secs(
                env_var("CHARAK_OTP_TTL_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            provider_timeout: Duration::from_secs(
                env_var("CHARAK_PROVIDER_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            allowed_origins: env_var("CHARAK_ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| vec!["http://localhost:5173".to_string()]),
            sms_api_url: env_var("CHARAK_SMS_API_URL"),
            sms_api_key: env_var("CHARAK_SMS_API_KEY"),
            sms_from: env_var("CHARAK_SMS_FROM"),
            email_api_url: env_var("CHARAK_EMAIL_API_URL"),
            email_api_key: env_var("CHARAK_EMAIL_API_KEY"),
            email_from: env_var("CHARAK_EMAIL_FROM"),
            transcribe_api_url: env_var("CHARAK_TRANSCRIBE_API_URL")
                .unwrap_or_else(|| "https://api.deepgram.com/v1/listen".to_string()),
            transcribe_api_key: env_var("CHARAK_TRANSCRIBE_API_KEY"),
        }
    }
}

impl Default for Config {
    /// Baseline config for tests: loopback bind, no providers configured.
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            db_path: PathBuf::from("charak.db"),
            default_calling_code: "+91".to_string(),
            otp_ttl: Duration::from_secs(300),
            provider_timeout: Duration::from_secs(10),
            allowed_origins: vec!["http://localhost:5173".to_string()],
            sms_api_url: None,
            sms_api_key: None,
            sms_from: None,
            email_api_url: None,
            email_api_key: None,
            email_from: None,
            transcribe_api_url: "https://api.deepgram.com/v1/listen".to_string(),
            transcribe_api_key: None,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
