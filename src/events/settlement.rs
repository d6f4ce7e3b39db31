//! # Per-callback dispatch outcomes.
//!
//! The wait-all and sequential capture-errors strategies report one
//! [`Settlement`] per callback, in registration order, instead of aborting on
//! the first failure.

use crate::error::CallbackError;

/// Outcome of one callback invocation within an aggregating dispatch.
#[derive(Debug, Clone)]
pub enum Settlement<R = ()> {
    /// The callback completed with a value.
    Fulfilled(R),
    /// The callback returned an error or panicked.
    Rejected(CallbackError),
}

impl<R> Settlement<R> {
    /// Returns `true` for [`Settlement::Fulfilled`].
    #[inline]
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settlement::Fulfilled(_))
    }

    /// Returns `true` for [`Settlement::Rejected`].
    #[inline]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Settlement::Rejected(_))
    }

    /// Returns the fulfilled value, if any.
    pub fn value(&self) -> Option<&R> {
        match self {
            Settlement::Fulfilled(value) => Some(value),
            Settlement::Rejected(_) => None,
        }
    }

    /// Returns the rejection reason, if any.
    pub fn reason(&self) -> Option<&CallbackError> {
        match self {
            Settlement::Fulfilled(_) => None,
            Settlement::Rejected(reason) => Some(reason),
        }
    }

    /// Consumes the settlement, returning the fulfilled value, if any.
    pub fn into_value(self) -> Option<R> {
        match self {
            Settlement::Fulfilled(value) => Some(value),
            Settlement::Rejected(_) => None,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Settlement::Fulfilled(_) => "fulfilled",
            Settlement::Rejected(_) => "rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfilled_accessors() {
        let s: Settlement<u32> = Settlement::Fulfilled(7);
        assert!(s.is_fulfilled());
        assert!(!s.is_rejected());
        assert_eq!(s.value(), Some(&7));
        assert!(s.reason().is_none());
        assert_eq!(s.as_label(), "fulfilled");
        assert_eq!(s.into_value(), Some(7));
    }

    #[test]
    fn test_rejected_accessors() {
        let s: Settlement<u32> = Settlement::Rejected(CallbackError::fail("boom"));
        assert!(s.is_rejected());
        assert!(s.value().is_none());
        assert_eq!(s.reason().map(|e| e.as_label()), Some("callback_failed"));
        assert_eq!(s.as_label(), "rejected");
        assert!(s.into_value().is_none());
    }
}
