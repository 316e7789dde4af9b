//! One-shot ordering gate.
//!
//! Separates "pre-validation finished" from "safe to execute in order".
//! The pool task owns the [`GateOpener`]; the ordered worker owns the
//! [`GateWaiter`]. Opening is tied to the opener's lifetime, so a task that
//! panics or is dropped unrun still opens the gate and can never wedge the
//! worker.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

/// Create a closed gate.
///
/// Nothing is ever sent on the channel: the gate opens when the sender
/// disconnects.
pub fn ordering_gate() -> (GateOpener, GateWaiter) {
    let (open_tx, open_rx) = bounded(0);
    (GateOpener { _open: open_tx }, GateWaiter { open: open_rx })
}

/// Opening half. Opens on `open()` or on drop, whichever comes first.
pub struct GateOpener {
    _open: Sender<()>,
}

impl GateOpener {
    pub fn open(self) {
        drop(self);
    }
}

/// Waiting half.
pub struct GateWaiter {
    open: Receiver<()>,
}

impl GateWaiter {
    /// Block until the gate opens. Returns immediately if already open.
    pub fn wait(&self) {
        let _ = self.open.recv();
    }

    pub(crate) fn is_open(&self) -> bool {
        matches!(self.open.try_recv(), Err(TryRecvError::Disconnected))
    }
}
