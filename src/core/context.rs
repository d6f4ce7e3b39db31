//! # Construction-time capability context and typed extensions.
//!
//! The builder's init callback receives a [`BusContext`]: a one-shot view of
//! the freshly built bus with the two capabilities the public API does not
//! expose (wholesale key deletion) plus typed extension installation. For
//! everything else the context hands out the bus itself.
//!
//! Extensions replace open-ended field injection: the init callback installs
//! values keyed by their type, and any holder of the bus reads them back via
//! [`EventBus::extension`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::bus::EventBus;
use crate::events::EventKey;

/// Typed side-table attached to a bus at construction.
///
/// At most one value per type; inserting again displaces the previous value.
#[derive(Default)]
pub struct Extensions {
    map: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Extensions {
    /// Installs `value`, returning the displaced value of the same type, if
    /// any.
    pub fn insert<T>(&mut self, value: T) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.map
            .insert(TypeId::of::<T>(), Arc::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
    }

    /// Returns the installed value of type `T`, if any.
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.map
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// Number of installed extensions.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` when no extension is installed.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish()
    }
}

/// # One-shot capability view handed to the builder's init callback.
///
/// Grants what construction legitimately needs: the bus itself (full
/// re-entrant API), typed extension installation, and wholesale deletion of
/// one or all keys. The context is not retained after the init callback
/// returns.
pub struct BusContext<'a, A, R = ()> {
    bus: &'a EventBus<A, R>,
}

impl<'a, A, R> BusContext<'a, A, R>
where
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    pub(crate) fn new(bus: &'a EventBus<A, R>) -> Self {
        Self { bus }
    }

    /// The bus under construction; registration, removal, queries, and
    /// dispatch all work from here.
    pub fn bus(&self) -> &EventBus<A, R> {
        self.bus
    }

    /// Installs a typed extension readable later via
    /// [`EventBus::extension`].
    ///
    /// Returns the displaced value of the same type, if any.
    pub fn set_extension<T>(&self, value: T) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.bus.inner.extensions.write().insert(value)
    }

    /// Deletes `key` with every record under it.
    ///
    /// Returns `true` when the key was present. Unlike [`EventBus::off`],
    /// this is unconditional and raises no unknown-key warning.
    pub fn clear(&self, key: impl Into<EventKey>) -> bool {
        self.bus.inner.registry.lock().remove_key(&key.into())
    }

    /// Deletes every key, emptying the registry.
    pub fn clear_all(&self) {
        self.bus.inner.registry.lock().remove_all_keys();
    }
}

impl<A, R> fmt::Debug for BusContext<'_, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusContext").finish_non_exhaustive()
    }
}
