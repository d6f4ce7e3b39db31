//! Bus core: facade, dispatch strategies, construction.
//!
//! The public API from this module is [`EventBus`] (the cloneable facade),
//! [`BusBuilder`] (seeded events, sinks, init callback), [`BusContext`] (the
//! capability view the init callback receives), and [`Extensions`] (the
//! typed side-table behind [`EventBus::extension`]).
//!
//! Internal modules:
//! - [`bus`]: shared state, registration/removal/query operations, notices;
//! - [`dispatch`]: the four strategy passes and their cursor/cleanup rules;
//! - [`builder`]: assembles a bus from seeds, sinks, and the init callback;
//! - [`context`]: capability view and extension storage.

mod builder;
mod bus;
mod context;
mod dispatch;

pub use builder::BusBuilder;
pub use bus::EventBus;
pub use context::{BusContext, Extensions};
