//! Error types used by the bus and its callbacks.
//!
//! This module defines two main error enums:
//!
//! - [`CallbackError`] — failures raised by individual callback invocations.
//! - [`DispatchError`] — failures surfaced by a dispatch pass as a whole.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging
//! and assertions.

use std::any::Any;

use thiserror::Error;

use crate::events::EventKey;

/// # Failure of a single callback invocation.
///
/// A callback either returns an error or panics; panics are caught at the
/// dispatch boundary and normalized into [`CallbackError::Panicked`] so one
/// misbehaving subscriber cannot take down the dispatcher.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum CallbackError {
    /// Callback returned an error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Callback panicked while running.
    #[error("panicked: {panic}")]
    Panicked {
        /// The panic payload, stringified.
        panic: String,
    },
}

impl CallbackError {
    /// Creates a [`CallbackError::Fail`] from any displayable error.
    ///
    /// # Example
    /// ```
    /// use callbus::CallbackError;
    ///
    /// let err = CallbackError::fail("boom");
    /// assert_eq!(err.as_label(), "callback_failed");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        CallbackError::Fail { error: error.into() }
    }

    /// Normalizes a caught panic payload into [`CallbackError::Panicked`].
    pub fn from_panic(panic: Box<dyn Any + Send>) -> Self {
        let panic = match panic.downcast::<String>() {
            Ok(text) => *text,
            Err(panic) => match panic.downcast::<&'static str>() {
                Ok(text) => (*text).to_string(),
                Err(_) => "non-string panic payload".to_string(),
            },
        };
        CallbackError::Panicked { panic }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CallbackError::Fail { .. } => "callback_failed",
            CallbackError::Panicked { .. } => "callback_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CallbackError::Fail { error } => format!("error: {error}"),
            CallbackError::Panicked { panic } => format!("panic: {panic}"),
        }
    }
}

/// # Failure of a dispatch pass.
///
/// Which variant a strategy can produce is part of its contract:
/// the sequential fail-fast strategy returns [`DispatchError::CallbackFailed`]
/// for the first failing callback, and fire-and-forget dispatch returns
/// [`DispatchError::CallbackFailures`] with every intercepted failure when no
/// error sink is configured. The settlement-reporting strategies never return
/// an error.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A callback failed and the strategy aborts on first failure.
    #[error("callback failed for {key}: {error}")]
    CallbackFailed {
        /// The key that was being dispatched.
        key: EventKey,
        /// The failing callback's error.
        error: CallbackError,
    },

    /// One or more callbacks failed and no error sink was configured.
    #[error("{n} callback(s) failed for {key} with no error sink configured", n = .errors.len())]
    CallbackFailures {
        /// The key that was being dispatched.
        key: EventKey,
        /// Every intercepted failure, in callback order.
        errors: Vec<CallbackError>,
    },
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use callbus::{CallbackError, DispatchError, EventKey};
    ///
    /// let err = DispatchError::CallbackFailed {
    ///     key: EventKey::from("sync"),
    ///     error: CallbackError::fail("boom"),
    /// };
    /// assert_eq!(err.as_label(), "dispatch_callback_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::CallbackFailed { .. } => "dispatch_callback_failed",
            DispatchError::CallbackFailures { .. } => "dispatch_callback_failures",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DispatchError::CallbackFailed { key, error } => {
                format!("key={key}; {}", error.as_message())
            }
            DispatchError::CallbackFailures { key, errors } => {
                format!("key={key}; {} failure(s)", errors.len())
            }
        }
    }

    /// Returns the key the failing dispatch targeted.
    pub fn key(&self) -> &EventKey {
        match self {
            DispatchError::CallbackFailed { key, .. } => key,
            DispatchError::CallbackFailures { key, .. } => key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_label_and_message() {
        let err = CallbackError::fail("boom");
        assert_eq!(err.as_label(), "callback_failed");
        assert_eq!(err.as_message(), "error: boom");
        assert_eq!(err.to_string(), "execution failed: boom");
    }

    #[test]
    fn test_panic_payload_normalization() {
        let text: Box<dyn Any + Send> = Box::new("stop".to_string());
        match CallbackError::from_panic(text) {
            CallbackError::Panicked { panic } => assert_eq!(panic, "stop"),
            other => panic!("unexpected variant: {other:?}"),
        }

        let opaque: Box<dyn Any + Send> = Box::new(42_u8);
        match CallbackError::from_panic(opaque) {
            CallbackError::Panicked { panic } => assert_eq!(panic, "non-string panic payload"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_dispatch_failures_display() {
        let err = DispatchError::CallbackFailures {
            key: EventKey::from("sync"),
            errors: vec![CallbackError::fail("a"), CallbackError::fail("b")],
        };
        assert_eq!(err.as_label(), "dispatch_callback_failures");
        assert_eq!(err.key(), &EventKey::from("sync"));
        assert_eq!(
            err.to_string(),
            "2 callback(s) failed for 'sync' with no error sink configured"
        );
    }
}
