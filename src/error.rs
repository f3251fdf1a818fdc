//! Error types used by pollers and their actions.
//!
//! This module defines two main error enums:
//!
//! - [`PollerError`] — misuse of the poller API (duplicate names, invalid transitions).
//! - [`ActionError`] — failures of a single action invocation.
//!
//! Action failures never reach subscribers: the engine absorbs them into its backoff
//! state and reports them only through events and logs. Both types provide
//! `as_label` for stable log/metric keys.

use thiserror::Error;

/// # Errors returned by the poller API.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollerError {
    /// Another live poller is registered under this name.
    #[error("poller '{name}' is already registered")]
    DuplicateName {
        /// The contested name.
        name: String,
    },

    /// `start` was called on a poller that is already running.
    #[error("poller '{name}' is already started")]
    AlreadyStarted {
        /// Poller name.
        name: String,
    },

    /// `start` was called before any action was set.
    #[error("poller '{name}' has no action to invoke")]
    MissingAction {
        /// Poller name.
        name: String,
    },

    /// `start` was called outside of a tokio runtime.
    #[error("poller '{name}' must be started from within a tokio runtime")]
    NoRuntime {
        /// Poller name.
        name: String,
    },

    /// The poller was destroyed and cannot be started again.
    #[error("poller '{name}' was destroyed")]
    Destroyed {
        /// Poller name.
        name: String,
    },
}

impl PollerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pollvisor::PollerError;
    ///
    /// let err = PollerError::DuplicateName { name: "feed".into() };
    /// assert_eq!(err.as_label(), "poller_duplicate_name");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PollerError::DuplicateName { .. } => "poller_duplicate_name",
            PollerError::AlreadyStarted { .. } => "poller_already_started",
            PollerError::MissingAction { .. } => "poller_missing_action",
            PollerError::NoRuntime { .. } => "poller_no_runtime",
            PollerError::Destroyed { .. } => "poller_destroyed",
        }
    }

    /// True for errors caused by configuration (the caller must pick another name
    /// or reuse the registered instance).
    pub fn is_configuration(&self) -> bool {
        matches!(self, PollerError::DuplicateName { .. })
    }
}

/// # Failure of one action invocation.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The action reported a failure.
    #[error("action failed: {reason}")]
    Fail {
        /// The underlying error message.
        reason: String,
    },

    /// The action panicked or its task was aborted.
    #[error("action panicked: {reason}")]
    Panicked {
        /// Panic or join error description.
        reason: String,
    },
}

impl ActionError {
    /// Shorthand for [`ActionError::Fail`].
    pub fn fail(reason: impl Into<String>) -> Self {
        ActionError::Fail {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ActionError::Fail { .. } => "action_failed",
            ActionError::Panicked { .. } => "action_panicked",
        }
    }

    /// The human-readable reason without the variant prefix.
    pub fn reason(&self) -> &str {
        match self {
            ActionError::Fail { reason } | ActionError::Panicked { reason } => reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_labels() {
        let err = PollerError::DuplicateName {
            name: "feed".into(),
        };
        assert_eq!(err.to_string(), "poller 'feed' is already registered");
        assert!(err.is_configuration());

        let err = ActionError::fail("connection refused");
        assert_eq!(err.to_string(), "action failed: connection refused");
        assert_eq!(err.as_label(), "action_failed");
        assert_eq!(err.reason(), "connection refused");
    }
}
