//! Event data model: keys, handlers, stored records, and outcomes.
//!
//! This module groups the types the registry stores and the dispatch
//! strategies operate on.
//!
//! ## Contents
//! - [`EventKey`], [`Token`] event identifiers and identity signs
//! - [`Handler`], [`HandlerFn`], [`HandlerRef`] the callback abstraction
//! - [`CallbackRef`] identity-based removal/lookup target
//! - [`Settlement`] per-callback outcome for the aggregating strategies
//! - `Registry` (crate-internal) ordered callback storage
//!
//! See `core/mod.rs` for how the bus and the dispatch strategies wire these
//! together.

mod handler;
mod key;
mod registry;
mod settlement;

pub use handler::{BoxHandlerFuture, CallbackRef, Handler, HandlerFn, HandlerRef};
pub use key::{EventKey, Token};
pub use settlement::Settlement;

pub(crate) use registry::{CallbackRecord, Registry};
