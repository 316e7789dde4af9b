//! Request/response handle returned by every `*_async` call.
//!
//! A `ReqRes` is created empty when a request is admitted and becomes done
//! exactly once, when the ordered worker (or the direct call path) resolves
//! it. Callers can block on it, await it, or attach a one-shot callback.
//!
//! Completion is broadcast twice: blocking waiters watch a channel whose
//! only sender is dropped on completion, async waiters watch a `bool`.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use shared_types::{Request, Response};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Per-request completion callback.
pub type ResponseCallback = Box<dyn FnOnce(&Response) + Send + 'static>;

struct Slot {
    response: Option<Response>,
    done: bool,
    callback: Option<ResponseCallback>,
}

struct Inner {
    request: Request,
    slot: Mutex<Slot>,
    done_tx: Mutex<Option<Sender<()>>>,
    done_rx: Receiver<()>,
    done_watch: watch::Sender<bool>,
}

/// Shared handle to one in-flight request.
#[derive(Clone)]
pub struct ReqRes {
    inner: Arc<Inner>,
}

impl ReqRes {
    /// A pending handle with an empty response slot.
    pub fn new(request: Request) -> Self {
        let (done_tx, done_rx) = bounded(0);
        let (done_watch, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                request,
                slot: Mutex::new(Slot {
                    response: None,
                    done: false,
                    callback: None,
                }),
                done_tx: Mutex::new(Some(done_tx)),
                done_rx,
                done_watch,
            }),
        }
    }

    /// An already completed handle, for calls answered synchronously.
    pub fn resolved(request: Request, response: Response) -> Self {
        let req_res = Self::new(request);
        req_res.set_done(response);
        req_res
    }

    pub fn request(&self) -> &Request {
        &self.inner.request
    }

    /// Current contents of the response slot.
    ///
    /// May be populated before the handle is done, when pre-validation
    /// short-circuits the request.
    pub fn response(&self) -> Option<Response> {
        self.inner.slot.lock().response.clone()
    }

    pub fn is_done(&self) -> bool {
        self.inner.slot.lock().done
    }

    /// Write the response slot. Ignored once the handle is done.
    pub(crate) fn set_response(&self, response: Response) {
        let mut slot = self.inner.slot.lock();
        if !slot.done {
            slot.response = Some(response);
        }
    }

    /// Store the final response, mark done, wake every waiter, and hand back
    /// the attached callback. A second call is ignored and returns `None`.
    ///
    /// The caller invokes the callback so it can order it against the
    /// global callback.
    pub(crate) fn set_done(&self, response: Response) -> Option<ResponseCallback> {
        let callback = {
            let mut slot = self.inner.slot.lock();
            if slot.done {
                return None;
            }
            slot.response = Some(response);
            slot.done = true;
            slot.callback.take()
        };
        self.inner.done_tx.lock().take();
        self.inner.done_watch.send_replace(true);
        callback
    }

    /// Attach a one-shot callback.
    ///
    /// Runs on the ordered worker before the global callback, or right away
    /// on the calling thread if the handle is already done. Replaces any
    /// callback that has not fired yet.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: FnOnce(&Response) + Send + 'static,
    {
        let mut slot = self.inner.slot.lock();
        if slot.done {
            let response = slot.response.clone();
            drop(slot);
            if let Some(response) = response {
                callback(&response);
            }
            return;
        }
        slot.callback = Some(Box::new(callback));
    }

    fn done_response(&self) -> Option<Response> {
        let slot = self.inner.slot.lock();
        if slot.done {
            slot.response.clone()
        } else {
            None
        }
    }

    /// Block until done.
    pub fn wait(&self) -> Response {
        loop {
            if let Some(response) = self.done_response() {
                return response;
            }
            let _ = self.inner.done_rx.recv();
        }
    }

    /// Block until done or until `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Response> {
        if let Err(RecvTimeoutError::Timeout) = self.inner.done_rx.recv_timeout(timeout) {
            return None;
        }
        self.done_response()
    }

    /// Await completion from async code.
    pub async fn wait_async(&self) -> Response {
        let mut done = self.inner.done_watch.subscribe();
        loop {
            if let Some(response) = self.done_response() {
                return response;
            }
            let _ = done.wait_for(|done| *done).await;
        }
    }
}

impl fmt::Debug for ReqRes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.inner.slot.lock();
        f.debug_struct("ReqRes")
            .field("request", &self.inner.request.method())
            .field("done", &slot.done)
            .field("response", &slot.response)
            .finish()
    }
}
