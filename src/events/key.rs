//! # Event keys and identity tokens.
//!
//! Events are addressed either by a human-readable name or by an opaque
//! [`Token`]. Tokens are also used as registration *signs*: the removal
//! handle returned by every registration call.
//!
//! ## Identity guarantees
//! Each token carries a globally unique id drawn from a monotonic counter.
//! Two tokens are equal only if one is a copy of the other; content never
//! collides into equality. Name keys compare by string value.
//!
//! ## Example
//! ```rust
//! use callbus::{EventKey, Token};
//!
//! let a = Token::next();
//! let b = Token::next();
//! assert_ne!(a, b);
//!
//! let by_name = EventKey::from("shutdown");
//! let by_token = EventKey::from(a);
//! assert_ne!(by_name, by_token);
//! assert_eq!(by_name, EventKey::from("shutdown"));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Global sequence counter for token identity.
static TOKEN_SEQ: AtomicU64 = AtomicU64::new(0);

/// Opaque identity token.
///
/// Compared and hashed by its issued id only. Used in two roles:
/// as an [`EventKey::Token`] key and as the *sign* identifying a single
/// registration for later removal or lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u64);

impl Token {
    /// Issues a fresh token with the next globally unique id.
    pub fn next() -> Self {
        Self(TOKEN_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Returns the raw id, for logging.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token#{}", self.0)
    }
}

/// Event identifier: a name compared by value, or a [`Token`] compared by
/// identity.
///
/// Cheap to clone; name keys share their backing string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// Human-readable key, compared by string value.
    Name(Arc<str>),
    /// Opaque key, compared by token identity.
    Token(Token),
}

impl EventKey {
    /// Returns the name for [`EventKey::Name`] keys, `None` for tokens.
    pub fn name(&self) -> Option<&str> {
        match self {
            EventKey::Name(name) => Some(name),
            EventKey::Token(_) => None,
        }
    }
}

impl From<&str> for EventKey {
    fn from(name: &str) -> Self {
        EventKey::Name(Arc::from(name))
    }
}

impl From<String> for EventKey {
    fn from(name: String) -> Self {
        EventKey::Name(Arc::from(name))
    }
}

impl From<Token> for EventKey {
    fn from(token: Token) -> Self {
        EventKey::Token(token)
    }
}

impl From<&EventKey> for EventKey {
    fn from(key: &EventKey) -> Self {
        key.clone()
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKey::Name(name) => write!(f, "'{name}'"),
            EventKey::Token(token) => write!(f, "{token}"),
        }
    }
}
