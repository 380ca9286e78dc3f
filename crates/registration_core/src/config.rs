use std::{fs, io, path::Path, time::Duration};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = "registration.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Stand-in for the network round trip of a real registration call.
    pub submit_latency_ms: u64,
    /// How long the success message stays up before the form closes and clears.
    pub success_close_delay_ms: u64,
    pub event_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            submit_latency_ms: 1500,
            success_close_delay_ms: 2000,
            event_capacity: 64,
        }
    }
}

impl Settings {
    pub fn submit_latency(&self) -> Duration {
        Duration::from_millis(self.submit_latency_ms)
    }

    pub fn success_close_delay(&self) -> Duration {
        Duration::from_millis(self.success_close_delay_ms)
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read { path: String, source: io::Error },
    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("event_capacity must be at least 1")]
    ZeroEventCapacity,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    submit_latency_ms: Option<u64>,
    success_close_delay_ms: Option<u64>,
    event_capacity: Option<usize>,
}

/// Defaults, then `registration.toml` in the working directory if present, then
/// `APP__*` environment overrides.
pub fn load_settings() -> Result<Settings, SettingsError> {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> Result<Settings, SettingsError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };

    settings_from_sources(raw.as_deref(), |key| std::env::var(key).ok())
}

pub fn settings_from_sources(
    raw_file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    if let Some(raw) = raw_file {
        let file_cfg: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file_cfg.submit_latency_ms {
            settings.submit_latency_ms = v;
        }
        if let Some(v) = file_cfg.success_close_delay_ms {
            settings.success_close_delay_ms = v;
        }
        if let Some(v) = file_cfg.event_capacity {
            settings.event_capacity = v;
        }
    }

    if let Some(v) = env("APP__SUBMIT_LATENCY_MS").and_then(|v| v.trim().parse().ok()) {
        settings.submit_latency_ms = v;
    }
    if let Some(v) = env("APP__SUCCESS_CLOSE_DELAY_MS").and_then(|v| v.trim().parse().ok()) {
        settings.success_close_delay_ms = v;
    }
    if let Some(v) = env("APP__EVENT_CAPACITY").and_then(|v| v.trim().parse().ok()) {
        settings.event_capacity = v;
    }

    // tokio's broadcast channel panics on zero capacity
    if settings.event_capacity == 0 {
        return Err(SettingsError::ZeroEventCapacity);
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_form_timings() {
        let settings = settings_from_sources(None, env_from(&[])).expect("settings");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.submit_latency(), Duration::from_millis(1500));
        assert_eq!(settings.success_close_delay(), Duration::from_millis(2000));
    }

    #[test]
    fn file_values_override_defaults() {
        let raw = "submit_latency_ms = 10\nevent_capacity = 8\n";
        let settings = settings_from_sources(Some(raw), env_from(&[])).expect("settings");

        assert_eq!(settings.submit_latency_ms, 10);
        assert_eq!(settings.success_close_delay_ms, 2000);
        assert_eq!(settings.event_capacity, 8);
    }

    #[test]
    fn env_overrides_file() {
        let raw = "success_close_delay_ms = 500\n";
        let settings = settings_from_sources(
            Some(raw),
            env_from(&[("APP__SUCCESS_CLOSE_DELAY_MS", "25")]),
        )
        .expect("settings");

        assert_eq!(settings.success_close_delay_ms, 25);
    }

    #[test]
    fn unparseable_env_value_is_ignored() {
        let settings =
            settings_from_sources(None, env_from(&[("APP__SUBMIT_LATENCY_MS", "soon")]))
                .expect("settings");
        assert_eq!(settings.submit_latency_ms, 1500);
    }

    #[test]
    fn unknown_file_key_is_rejected() {
        let err = settings_from_sources(Some("latency = 3\n"), env_from(&[]))
            .expect_err("unknown key");
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn zero_event_capacity_is_rejected() {
        let err = settings_from_sources(None, env_from(&[("APP__EVENT_CAPACITY", "0")]))
            .expect_err("zero capacity");
        assert!(matches!(err, SettingsError::ZeroEventCapacity));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("registration_core_settings_missing.toml");
        let _ = fs::remove_file(&path);
        let settings = load_settings_from(&path).expect("settings");
        assert_eq!(settings.event_capacity, Settings::default().event_capacity);
    }
}
