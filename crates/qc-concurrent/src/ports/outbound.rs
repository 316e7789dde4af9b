//! Outbound (Driven) ports for the concurrent ABCI client.
//!
//! The application contract lives in `shared-types` so fixtures and other
//! clients can implement it without depending on this crate.

use parking_lot::RwLock;
use shared_types::{Request, Response};
use std::sync::Arc;

pub use shared_types::{Application, ConcurrentApplication};

/// Global response sink, invoked once per completed async request.
pub type Callback = Arc<dyn Fn(&Request, &Response) + Send + Sync + 'static>;

/// Slot holding the global callback of one client.
///
/// Writers go through the coordinator's exclusivity lock, so a swap never
/// races an in-progress delivery.
#[derive(Default)]
pub struct CallbackSlot {
    callback: RwLock<Option<Callback>>,
}

impl CallbackSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, callback: Callback) -> Option<Callback> {
        self.callback.write().replace(callback)
    }

    pub fn is_set(&self) -> bool {
        self.callback.read().is_some()
    }

    /// Deliver to the global callback, if one is set.
    pub fn invoke(&self, request: &Request, response: &Response) {
        let callback = self.callback.read().clone();
        if let Some(callback) = callback {
            callback(request, response);
        }
    }
}
