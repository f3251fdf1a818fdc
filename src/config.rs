//! # Poller configuration.
//!
//! Provides [`PollerConfig`], the settings a poller consults at every scheduling
//! decision, and [`ConfigUpdate`], the partial form accepted by
//! [`Poller::set_config`](crate::Poller::set_config).
//!
//! ## Merge rules
//! For each field of an update:
//! - a supplied value replaces the stored one;
//! - a missing value (or a zero duration) keeps the stored one;
//! - with nothing stored yet, the hard default applies
//!   ([`DEFAULT_INTERVAL`] / [`DEFAULT_MAX_INTERVAL`]).
//!
//! Partial updates therefore never reset untouched fields back to their defaults.
//!
//! ## Wire form
//! [`ConfigUpdate`] (de)serializes with durations as integer milliseconds:
//! ```json
//! { "interval": 5000, "maxInterval": 40000 }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policies::{BackoffPolicy, JitterPolicy};

/// Delay between successful invocations when none was configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(8_000);

/// Upper bound for backed-off delays when none was configured.
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_millis(300_000);

/// Effective configuration of one poller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollerConfig {
    /// Delay between successful invocations.
    pub interval: Duration,
    /// Upper bound for the backed-off delay.
    pub max_interval: Duration,
    /// Randomization applied to every computed delay.
    pub jitter: JitterPolicy,
}

impl Default for PollerConfig {
    /// `interval = 8s`, `max_interval = 300s`, no jitter.
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_interval: DEFAULT_MAX_INTERVAL,
            jitter: JitterPolicy::None,
        }
    }
}

impl PollerConfig {
    /// Builds a config from an update applied over the defaults.
    pub fn from_update(update: &ConfigUpdate) -> Self {
        let mut cfg = Self::default();
        cfg.merge(update);
        cfg
    }

    /// Applies `update`, keeping every field it does not supply.
    pub fn merge(&mut self, update: &ConfigUpdate) {
        if let Some(interval) = update.interval.filter(|d| !d.is_zero()) {
            self.interval = interval;
        }
        if let Some(max) = update.max_interval.filter(|d| !d.is_zero()) {
            self.max_interval = max;
        }
        if let Some(jitter) = update.jitter {
            self.jitter = jitter;
        }
    }

    /// Backoff parameters derived from this config.
    #[inline]
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            interval: self.interval,
            max: self.max_interval,
            jitter: self.jitter,
        }
    }
}

/// Partial configuration; `None` fields leave the stored value untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    /// New interval (milliseconds on the wire).
    #[serde(default, with = "opt_millis", skip_serializing_if = "Option::is_none")]
    pub interval: Option<Duration>,
    /// New maximum interval (milliseconds on the wire).
    #[serde(default, with = "opt_millis", skip_serializing_if = "Option::is_none")]
    pub max_interval: Option<Duration>,
    /// New jitter policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter: Option<JitterPolicy>,
}

impl ConfigUpdate {
    /// Empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the interval.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Sets the maximum interval.
    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = Some(max_interval);
        self
    }

    /// Sets the jitter policy.
    pub fn jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = Some(jitter);
        self
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_u64(d.as_millis().min(u128::from(u64::MAX)) as u64),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
