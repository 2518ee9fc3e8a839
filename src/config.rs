//! Explicit configuration for every component.
//!
//! Resolution order, lowest to highest precedence: built-in defaults, an
//! optional TOML file, then environment variables (a `.env` file is honoured
//! through `dotenvy`).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;
use crate::validation::require_non_empty;

const DEFAULT_HOST: &str = "localhost:8000";
const DEFAULT_BANNER_MS: u64 = 2000;

const ENV_HOST: &str = "LTI_HOST";
const ENV_ENV: &str = "LTI_ENV";
const ENV_EMAIL: &str = "LTI_EMAIL";
const ENV_TASK_ID: &str = "LTI_TASK_ID";
const ENV_LAUNCH_ID: &str = "LTI_LAUNCH_ID";
const ENV_REQUEST_TIMEOUT: &str = "LTI_REQUEST_TIMEOUT_SECS";
const ENV_RUN_TIMEOUT: &str = "LTI_RUN_TIMEOUT_SECS";

/// Identity of the page a component acts for. Rendered into the page by the
/// LMS launch; here it is handed to each component at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub email: String,
    pub task_id: String,
    pub launch_id: String,
}

impl PageContext {
    pub fn new(
        email: impl Into<String>,
        task_id: impl Into<String>,
        launch_id: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            task_id: task_id.into(),
            launch_id: launch_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        require_non_empty("email", &self.email)?;
        require_non_empty("task_id", &self.task_id)?;
        require_non_empty("launch_id", &self.launch_id)
    }
}

/// Transport and UI settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `host[:port]` of the LTI backend, no scheme.
    pub host: String,
    /// `https`/`wss` when true, `http`/`ws` otherwise.
    pub secure: bool,
    /// Per-request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
    /// Deadline for a whole test-run batch. `None` waits for every request.
    pub run_timeout: Option<Duration>,
    /// How long the upload banner stays visible.
    pub banner_duration: Duration,
    /// Score and report `test_result` batches pushed over the socket.
    pub score_on_push: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            secure: false,
            request_timeout: None,
            run_timeout: None,
            banner_duration: Duration::from_millis(DEFAULT_BANNER_MS),
            score_on_push: false,
        }
    }
}

impl Settings {
    /// Base URL for HTTP endpoints.
    pub fn http_base(&self) -> Result<Url, AppError> {
        let scheme = if self.secure { "https" } else { "http" };
        self.base(scheme)
    }

    /// `ws(s)://{host}/ws/client/{email}`.
    pub fn client_socket_url(&self, email: &str) -> Result<Url, AppError> {
        let scheme = if self.secure { "wss" } else { "ws" };
        join_segments(&self.base(scheme)?, &["ws", "client", email])
    }

    fn base(&self, scheme: &str) -> Result<Url, AppError> {
        if self.host.contains("://") {
            return Err(AppError::Config(format!(
                "host '{}' must not include a scheme",
                self.host
            )));
        }
        Url::parse(&format!("{scheme}://{}/", self.host))
            .map_err(|e| AppError::Config(format!("invalid host '{}': {e}", self.host)))
    }
}

/// Append percent-encoded path segments to `base`.
pub fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, AppError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| AppError::Config(format!("'{base}' cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub page: PageContext,
}

// ── File layout ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    server: ServerSection,
    page: PageSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ServerSection {
    host: Option<String>,
    env: Option<String>,
    request_timeout_secs: Option<u64>,
    run_timeout_secs: Option<u64>,
    score_on_push: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PageSection {
    email: Option<String>,
    task_id: Option<String>,
    launch_id: Option<String>,
    banner_ms: Option<u64>,
}

impl Config {
    /// Load from an optional TOML file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        if let Ok(env_file) = dotenvy::dotenv() {
            tracing::debug!(path = %env_file.display(), "Loaded .env");
        }

        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Read the optional TOML file and apply the given environment lookup.
    pub fn load_with_env(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let file = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p).map_err(|e| {
                    AppError::Config(format!("cannot read {}: {e}", p.display()))
                })?;
                Self::parse_file(&raw)?
            }
            None => FileConfig::default(),
        };

        Self::resolve(file, env)
    }

    /// Parse TOML text and apply the given environment lookup on top.
    pub fn from_toml_with_env(
        raw: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        Self::resolve(Self::parse_file(raw)?, env)
    }

    fn parse_file(raw: &str) -> Result<FileConfig, AppError> {
        Ok(toml::from_str(raw)?)
    }

    fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Settings::default();
        let env_nonempty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let host = env_nonempty(ENV_HOST)
            .or(file.server.host)
            .unwrap_or(defaults.host);
        let deploy_env = env_nonempty(ENV_ENV).or(file.server.env);
        let secure = deploy_env.as_deref() == Some("prod");

        let request_timeout_secs = match env_nonempty(ENV_REQUEST_TIMEOUT) {
            Some(v) => Some(parse_secs(ENV_REQUEST_TIMEOUT, &v)?),
            None => file.server.request_timeout_secs,
        };
        let run_timeout_secs = match env_nonempty(ENV_RUN_TIMEOUT) {
            Some(v) => Some(parse_secs(ENV_RUN_TIMEOUT, &v)?),
            None => file.server.run_timeout_secs,
        };

        let settings = Settings {
            host,
            secure,
            request_timeout: request_timeout_secs.map(Duration::from_secs),
            run_timeout: run_timeout_secs.map(Duration::from_secs),
            banner_duration: file
                .page
                .banner_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.banner_duration),
            score_on_push: file.server.score_on_push.unwrap_or(defaults.score_on_push),
        };
        // Fail early on a malformed host rather than on first request.
        settings.http_base()?;

        let page = PageContext {
            email: env_nonempty(ENV_EMAIL).or(file.page.email).unwrap_or_default(),
            task_id: env_nonempty(ENV_TASK_ID).or(file.page.task_id).unwrap_or_default(),
            launch_id: env_nonempty(ENV_LAUNCH_ID)
                .or(file.page.launch_id)
                .unwrap_or_default(),
        };
        page.validate()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self { settings, page })
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{key} must be a whole number of seconds, got '{value}'")))
}
