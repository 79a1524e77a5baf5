//! Session state value

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The two keys a session remembers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    EnginePath,
    WeatherPath,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKey::EnginePath => write!(f, "engine path"),
            SessionKey::WeatherPath => write!(f, "weather path"),
        }
    }
}

/// Engine and weather selections that persist across runs in one console session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn get(&self, key: SessionKey) -> Option<&Path> {
        match key {
            SessionKey::EnginePath => self.engine_path.as_deref(),
            SessionKey::WeatherPath => self.weather_path.as_deref(),
        }
    }

    /// Store `value` under `key`, overwriting any prior value.
    ///
    /// Callers only pass values that have already been validated.
    pub fn set(&mut self, key: SessionKey, value: PathBuf) {
        match key {
            SessionKey::EnginePath => self.engine_path = Some(value),
            SessionKey::WeatherPath => self.weather_path = Some(value),
        }
        self.updated_at = Some(Utc::now());
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.engine_path.is_none() && self.weather_path.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_and_stamps() {
        let mut state = SessionState::default();
        assert!(state.get(SessionKey::EnginePath).is_none());

        state.set(SessionKey::EnginePath, PathBuf::from("/a/energyplus"));
        state.set(SessionKey::EnginePath, PathBuf::from("/b/energyplus"));

        assert_eq!(
            state.get(SessionKey::EnginePath),
            Some(Path::new("/b/energyplus"))
        );
        assert!(state.get(SessionKey::WeatherPath).is_none());
        assert!(state.updated_at.is_some());
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let mut state = SessionState::default();
        state.set(SessionKey::EnginePath, PathBuf::from("/e"));
        state.set(SessionKey::WeatherPath, PathBuf::from("/w.epw"));
        state.clear();
        assert!(state.is_empty());
    }

    #[test]
    fn test_json_omits_absent_keys() {
        let mut state = SessionState::default();
        state.weather_path = Some(PathBuf::from("/w.epw"));
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"weather_path":"/w.epw"}"#);

        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
