use std::time::Duration;

/// Default backend base path, matching a locally running API server.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Default transport timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default minimum skeleton display time in milliseconds.
pub const DEFAULT_SKELETON_MS: u64 = 800;

/// Default path for the persisted user state file.
pub const DEFAULT_STATE_PATH: &str = "data/mediplant.json";

/// Application configuration from environment
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    /// Minimum time the loading skeleton stays visible before results
    /// replace it. `None` disables the hold entirely.
    pub min_skeleton: Option<Duration>,
    pub state_path: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    ///
    /// Environment variables:
    /// - `MEDIPLANT_API_URL`: backend base URL (default: local `/api`)
    /// - `MEDIPLANT_TIMEOUT_SECS`: transport timeout (default: 30)
    /// - `MEDIPLANT_SKELETON_MS`: minimum skeleton hold, 0 disables (default: 800)
    /// - `MEDIPLANT_STATE_PATH`: user state file (default: data/mediplant.json)
    #[must_use]
    pub fn from_env() -> Self {
        let api_url = std::env::var("MEDIPLANT_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let timeout_secs = std::env::var("MEDIPLANT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let skeleton_ms = std::env::var("MEDIPLANT_SKELETON_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SKELETON_MS);

        let state_path = std::env::var("MEDIPLANT_STATE_PATH")
            .unwrap_or_else(|_| DEFAULT_STATE_PATH.to_string());

        Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            min_skeleton: (skeleton_ms > 0).then(|| Duration::from_millis(skeleton_ms)),
            state_path,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            min_skeleton: Some(Duration::from_millis(DEFAULT_SKELETON_MS)),
            state_path: DEFAULT_STATE_PATH.to_string(),
        }
    }
}
