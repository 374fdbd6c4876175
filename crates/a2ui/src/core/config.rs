use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    codec::Framing,
    error::{Error, Result},
    report::CounterScope,
};

/// Whether connections to the same surface id share one surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Every connection gets a fresh surface and its own driver.
    #[default]
    Independent,
    /// One surface per id, shared by every connection. Late joiners receive
    /// the current state.
    Shared,
}

/// Engine configuration.
///
/// Every field has a default, so an empty document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Idle period before a keepalive frame, in milliseconds.
    pub keepalive_ms: u64,
    /// Temporal driver step interval, in milliseconds.
    pub tick_interval_ms: u64,
    /// Temporal driver pause after completion, in milliseconds.
    pub cooldown_ms: u64,
    /// Downstream wire framing.
    pub framing: Framing,
    /// Connection sharing.
    pub session_mode: SessionMode,
    /// Error counter scope.
    pub error_counter: CounterScope,
    /// Capacity of each outbound channel, in frames.
    pub outbox_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keepalive_ms: 30_000,
            tick_interval_ms: 2_000,
            cooldown_ms: 3_000,
            framing: Framing::default(),
            session_mode: SessionMode::default(),
            error_counter: CounterScope::default(),
            outbox_capacity: 64,
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that no period or capacity is zero. A zero keepalive or tick
    /// interval would wake a session continuously.
    pub fn validate(&self) -> Result<()> {
        let zero = [
            ("keepalive_ms", self.keepalive_ms == 0),
            ("tick_interval_ms", self.tick_interval_ms == 0),
            ("outbox_capacity", self.outbox_capacity == 0),
        ];
        match zero.iter().find(|(_, is_zero)| *is_zero) {
            Some((name, _)) => Err(Error::Config(format!("{name} must be greater than zero"))),
            None => Ok(()),
        }
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&s)?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Keepalive idle period, at least one millisecond.
    pub fn keepalive(&self) -> Duration {
        Duration::from_millis(self.keepalive_ms.max(1))
    }

    /// Driver step interval, at least one millisecond.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Driver cool-down.
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
        let c = Config::default();
        assert_eq!(c.keepalive(), Duration::from_secs(30));
        assert_eq!(c.tick_interval(), Duration::from_secs(2));
        assert_eq!(c.cooldown(), Duration::from_secs(3));
    }

    #[test]
    fn partial_override() {
        let c = Config::from_toml_str(
            r#"
            keepalive_ms = 500
            framing = "jsonl"
            session_mode = "shared"
            error_counter = "process"
            "#,
        )
        .unwrap();
        assert_eq!(c.keepalive_ms, 500);
        assert_eq!(c.framing, Framing::Jsonl);
        assert_eq!(c.session_mode, SessionMode::Shared);
        assert_eq!(c.error_counter, CounterScope::Process);
        assert_eq!(c.outbox_capacity, 64);
    }

    #[test]
    fn bad_values_are_config_errors() {
        assert!(matches!(
            Config::from_toml_str("framing = \"xml\""),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::load("/nonexistent/a2ui.toml"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn zero_periods_are_refused() {
        for doc in ["keepalive_ms = 0", "tick_interval_ms = 0", "outbox_capacity = 0"] {
            assert!(
                matches!(Config::from_toml_str(doc), Err(Error::Config(_))),
                "{doc}"
            );
        }
        assert!(Config::from_toml_str("cooldown_ms = 0").is_ok());
    }

    #[test]
    fn literal_zero_periods_are_floored() {
        let c = Config {
            keepalive_ms: 0,
            tick_interval_ms: 0,
            ..Config::default()
        };
        assert_eq!(c.keepalive(), Duration::from_millis(1));
        assert_eq!(c.tick_interval(), Duration::from_millis(1));
    }
}
