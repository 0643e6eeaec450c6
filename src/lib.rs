//! Cadence
//!
//! A quota-governed action scheduler: accepts a stream of candidate remote
//! actions (likes, comments, follows, favorites, posts), filters them
//! against policy bounds, executes at most a bounded number per rolling
//! time window, and backs off on remote rate-limit signals.
//!
//! The remote service is opaque: callers implement
//! [`executor::RemoteActionExecutor`] for their client and feed candidates
//! through an [`source::ActionSource`]. The crate performs no remote I/O of
//! its own.

pub mod action;
pub mod executor;
pub mod policy;
pub mod quota;
pub mod rate;
pub mod scheduler;
pub mod source;
pub mod stats;

use std::path::PathBuf;

use tracing::{error, info, warn};

pub use action::{Action, ActionKind, TargetRef};
pub use executor::{ExecutionResult, ExecutorAdapter, RemoteActionExecutor, RemoteError};
pub use policy::Policy;
pub use quota::{QuotaTracker, QuotaWindow};
pub use rate::BackoffConfig;
pub use scheduler::{spawn_session, CancelToken, Scheduler, SessionSummary, StopReason};
pub use source::{ActionSource, CursorSource, PushSource, SourceError};
pub use stats::{RunSnapshot, RunStats};

/// Session configuration
///
/// Everything a scheduling session needs, assembled once at session start.
/// There is no hot reload: runtime state lives in the quota tracker and the
/// run counters, never here.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Target filtering rules.
    pub policy: Policy,

    /// Rolling window limits per action kind.
    #[serde(default)]
    pub quotas: Vec<QuotaWindow>,

    /// Backoff for rate limits and transport retries.
    pub backoff: BackoffConfig,

    /// Timeout for a single remote call in milliseconds.
    #[serde(default = "default_execute_timeout_ms")]
    pub execute_timeout_ms: u64,
}

/// Default remote call timeout in milliseconds
fn default_execute_timeout_ms() -> u64 {
    30_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            quotas: Vec::new(),
            backoff: BackoffConfig::default(),
            execute_timeout_ms: default_execute_timeout_ms(),
        }
    }
}

/// Get log directory path (shared across modules)
pub fn log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("cadence").join("logs"))
}

impl SessionConfig {
    /// Get config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cadence").join("config.json"))
    }

    /// Remote call timeout as a duration.
    pub fn execute_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.execute_timeout_ms)
    }

    /// Load config from file
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(content) => match serde_json::from_str(&content) {
                        Ok(config) => {
                            info!("Loaded config from {:?}", path);
                            return config;
                        }
                        Err(e) => {
                            warn!("Failed to parse config file: {}", e);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config file: {}", e);
                    }
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    error!("Failed to create config directory: {}", e);
                    return;
                }
            }

            match serde_json::to_string_pretty(self) {
                Ok(content) => {
                    if let Err(e) = std::fs::write(&path, content) {
                        error!("Failed to save config: {}", e);
                    } else {
                        info!("Config saved to {:?}", path);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize config: {}", e);
                }
            }
        }
    }
}

/// Initialize logging (console plus daily-rolling file output)
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    if let Some(log_dir) = log_dir() {
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "cadence.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::default();
        assert!(!config.policy.enabled);
        assert!(config.quotas.is_empty());
        assert_eq!(config.execute_timeout_ms, 30_000);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = SessionConfig {
            policy: Policy::disabled().with_max_followers(8500),
            quotas: vec![
                QuotaWindow::hourly(ActionKind::Comment, 21),
                QuotaWindow::daily(ActionKind::Comment, 240),
            ],
            ..SessionConfig::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(back.policy.max_followers, Some(8500));
        assert_eq!(back.quotas.len(), 2);
        assert_eq!(back.quotas[0].limit, 21);
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let json = r#"{"policy":{"enabled":false,"maxFollowers":null},"backoff":{"baseDelayMs":1000,"maxDelayMs":60000,"jitterPercent":20,"maxRetries":5}}"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();

        assert!(config.quotas.is_empty());
        assert_eq!(config.execute_timeout_ms, 30_000);
    }
}
