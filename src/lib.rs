//! # callbus
//!
//! **Callbus** is a typed publish/subscribe event bus for Rust.
//!
//! Callers register named callbacks against a bus instance and later trigger
//! every callback under a name, synchronously or with one of several
//! asynchronous aggregation strategies. The crate is designed as an
//! in-process building block: no wire protocol, no persistence, no delivery
//! beyond the current process.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!        on / once / on_signed          off / off_by_sign
//!        (returns a sign Token)         (identity matching)
//!                  │                            │
//!                  ▼                            ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  EventBus (cheap cloneable handle)                            │
//! │  - Registry: EventKey -> ordered callback records             │
//! │  - Extensions: typed side-table set during construction       │
//! │  - Sinks: on_error / on_warning (optional, out-of-band)       │
//! └───────┬──────────────┬──────────────┬──────────────┬──────────┘
//!         ▼              ▼              ▼              ▼
//!       emit         emit_wait    emit_line_up   emit_line_up_
//!   fire-and-forget   wait-all      fail-fast     capture_err
//!      `Result<()>`  `Settlement[]`  `Result<R[]>`  `Settlement[]`
//! ```
//!
//! ### One dispatch pass
//! ```text
//! dispatch(key, args):
//!   ├─► key unknown ──► warning sink (or tracing warn) ──► empty result
//!   └─► for each record, by live cursor:
//!         ├─► invoke handler(bus, args) behind the panic boundary
//!         ├─► route the outcome per strategy:
//!         │     emit           ─► error sink, else accumulate (fatal after pass)
//!         │     emit_wait      ─► settlement + error sink on rejection
//!         │     emit_line_up   ─► first failure aborts (after cleanup)
//!         │     …capture_err   ─► settlement, never aborts
//!         ├─► once record? remove it now, cursor stays index-stable
//!         └─► key emptied? delete it from the registry
//! ```
//!
//! ## Features
//! | Area             | Description                                                       | Key types / operations                  |
//! |------------------|-------------------------------------------------------------------|------------------------------------------|
//! | **Registration** | Named or token keys; permanent or once records; caller-pinned signs. | [`EventBus::on`], [`EventBus::once`], [`Token`] |
//! | **Dispatch**     | Four strategies over the same registry.                           | [`EventBus::emit`], [`EventBus::emit_wait`], [`EventBus::emit_line_up`], [`EventBus::emit_line_up_capture_err`] |
//! | **Removal**      | Identity-based: by sign or handler handle, one key or globally.   | [`EventBus::off`], [`EventBus::off_by_sign`], [`CallbackRef`] |
//! | **Outcomes**     | Per-callback settlements and typed errors.                        | [`Settlement`], [`CallbackError`], [`DispatchError`] |
//! | **Notices**      | Unknown-key and failure signals, out of band.                     | [`Notice`], [`NotifyPhase`], [`NotifyKind`] |
//! | **Construction** | Seeded events, sinks, init capability context.                    | [`BusBuilder`], [`BusContext`], [`Extensions`] |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use callbus::{CallbackError, EventBus, HandlerFn, Settlement};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus: EventBus<String, usize> = EventBus::new();
//!
//!     // Permanent callback: reports the line length
//!     bus.on(
//!         "ingest",
//!         HandlerFn::arc(|_bus, line: Arc<String>| async move {
//!             Ok::<_, CallbackError>(line.len())
//!         }),
//!     );
//!
//!     // One-shot callback: consumed by the first dispatch that invokes it
//!     bus.once(
//!         "ingest",
//!         HandlerFn::arc(|_bus, line: Arc<String>| async move {
//!             if line.is_empty() {
//!                 return Err(CallbackError::fail("empty line"));
//!             }
//!             Ok(line.chars().count())
//!         }),
//!     );
//!
//!     // Wait-all: one settlement per callback, in registration order
//!     let settlements = bus.emit_wait("ingest", String::from("hello")).await;
//!     assert_eq!(settlements.len(), 2);
//!     assert!(settlements.iter().all(Settlement::is_fulfilled));
//!
//!     // The once record is gone; sequential dispatch sees one callback
//!     let values = bus.emit_line_up("ingest", String::from("again")).await?;
//!     assert_eq!(values, vec![5]);
//!
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod notify;

// ---- Public re-exports ----

pub use self::core::{BusBuilder, BusContext, EventBus, Extensions};
pub use error::{CallbackError, DispatchError};
pub use events::{
    BoxHandlerFuture, CallbackRef, EventKey, Handler, HandlerFn, HandlerRef, Settlement, Token,
};
pub use notify::{Notice, NoticeSink, NotifyKind, NotifyPhase};
