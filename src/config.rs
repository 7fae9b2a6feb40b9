//! Application-level configuration loading: phase durations, room capacity,
//! and the poll cadence hints handed to clients.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::models::SessionKind;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_LIVE_BACK_CONFIG_PATH";

/// Fixed pre-game countdown window.
const DEFAULT_COUNTDOWN_MS: u64 = 3_000;
/// Fixed per-round results display window.
const DEFAULT_RESULTS_DISPLAY_MS: u64 = 5_000;
/// Round window used when a tournament is created without an explicit one.
const DEFAULT_TIME_PER_QUESTION_MS: u64 = 30_000;
/// Participant capacity for rooms.
const DEFAULT_ROOM_CAPACITY: usize = 8;
/// Poll cadence hint for tournaments, whose timing windows are tight.
const DEFAULT_TOURNAMENT_POLL_MS: u64 = 500;
/// Poll cadence hint for duels and rooms, which have no shared timers.
const DEFAULT_RELAXED_POLL_MS: u64 = 2_000;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Countdown duration between tournament start and the first question.
    pub countdown_ms: u64,
    /// How long each tournament round's results stay on screen.
    pub results_display_ms: u64,
    /// Round window applied when session creation does not specify one.
    pub default_time_per_question_ms: u64,
    /// Maximum participants in a room race.
    pub room_capacity: usize,
    /// Recommended poll interval for tournament participants.
    pub tournament_poll_interval_ms: u64,
    /// Recommended poll interval for duel and room participants.
    pub relaxed_poll_interval_ms: u64,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// built-in defaults for any missing file or field.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(path = %path.display(), "loaded session timing config");
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Participant capacity for the given session kind.
    pub fn capacity_for(&self, kind: SessionKind) -> usize {
        kind.capacity(self.room_capacity)
    }

    /// Poll cadence hint returned to clients of the given session kind.
    pub fn poll_interval_for(&self, kind: SessionKind) -> u64 {
        match kind {
            SessionKind::Tournament => self.tournament_poll_interval_ms,
            SessionKind::Duel | SessionKind::Room => self.relaxed_poll_interval_ms,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            countdown_ms: DEFAULT_COUNTDOWN_MS,
            results_display_ms: DEFAULT_RESULTS_DISPLAY_MS,
            default_time_per_question_ms: DEFAULT_TIME_PER_QUESTION_MS,
            room_capacity: DEFAULT_ROOM_CAPACITY,
            tournament_poll_interval_ms: DEFAULT_TOURNAMENT_POLL_MS,
            relaxed_poll_interval_ms: DEFAULT_RELAXED_POLL_MS,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at
/// [`DEFAULT_CONFIG_PATH`]. Every field is optional; missing entries keep
/// their built-in defaults.
struct RawConfig {
    countdown_ms: Option<u64>,
    results_display_ms: Option<u64>,
    default_time_per_question_ms: Option<u64>,
    room_capacity: Option<usize>,
    tournament_poll_interval_ms: Option<u64>,
    relaxed_poll_interval_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            countdown_ms: value.countdown_ms.unwrap_or(defaults.countdown_ms),
            results_display_ms: value
                .results_display_ms
                .unwrap_or(defaults.results_display_ms),
            default_time_per_question_ms: value
                .default_time_per_question_ms
                .unwrap_or(defaults.default_time_per_question_ms),
            room_capacity: value.room_capacity.unwrap_or(defaults.room_capacity),
            tournament_poll_interval_ms: value
                .tournament_poll_interval_ms
                .unwrap_or(defaults.tournament_poll_interval_ms),
            relaxed_poll_interval_ms: value
                .relaxed_poll_interval_ms
                .unwrap_or(defaults.relaxed_poll_interval_ms),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
