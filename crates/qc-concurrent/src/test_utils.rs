//! Instrumented application fixtures.
//!
//! [`RecordingApp`] records every call it receives, can delay or reject
//! pre-validation per transaction, and counts exclusivity violations: a
//! writer entering while anyone else is inside, or a reader overlapping a
//! writer.

use parking_lot::Mutex;
use rand::Rng;
use shared_types::{
    Application, ConcurrentApplication, RequestBeginBlock, RequestEndBlock, RequestInfo,
    RequestInitChain, RequestQuery, RequestSetOption, ResponseBeginBlock, ResponseCheckTx,
    ResponseCommit, ResponseDeliverTx, ResponseEndBlock, ResponseInfo, ResponseInitChain,
    ResponseQuery, ResponseSetOption, Tx,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// One call observed by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCall {
    pub method: &'static str,
    pub tx: Option<Tx>,
}

#[derive(Default)]
struct Exclusivity {
    writers: AtomicUsize,
    readers: AtomicUsize,
    max_readers: AtomicUsize,
    violations: AtomicUsize,
}

struct WriterGuard<'a>(&'a Exclusivity);

impl Drop for WriterGuard<'_> {
    fn drop(&mut self) {
        self.0.writers.fetch_sub(1, Ordering::SeqCst);
    }
}

struct ReaderGuard<'a>(&'a Exclusivity);

impl Drop for ReaderGuard<'_> {
    fn drop(&mut self) {
        self.0.readers.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Exclusivity {
    fn enter_writer(&self) -> WriterGuard<'_> {
        let writers = self.writers.fetch_add(1, Ordering::SeqCst);
        if writers > 0 || self.readers.load(Ordering::SeqCst) > 0 {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        WriterGuard(self)
    }

    fn enter_reader(&self) -> ReaderGuard<'_> {
        let readers = self.readers.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_readers.fetch_max(readers, Ordering::SeqCst);
        if self.writers.load(Ordering::SeqCst) > 0 {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        ReaderGuard(self)
    }
}

/// Builder for [`RecordingApp`].
#[derive(Default)]
pub struct RecordingAppBuilder {
    pre_delays: HashMap<Tx, Duration>,
    pre_rejections: HashMap<Tx, u32>,
    exec_failures: HashMap<Tx, u32>,
    exec_panics: HashSet<Tx>,
    random_pre_delay: Option<Duration>,
    hold: Duration,
    read_hold: Duration,
}

impl RecordingAppBuilder {
    /// Sleep before answering pre-validation of `tx`.
    pub fn pre_delay(mut self, tx: &[u8], delay: Duration) -> Self {
        self.pre_delays.insert(tx.to_vec(), delay);
        self
    }

    /// Sleep a random time up to `max` in every pre-validation.
    pub fn random_pre_delay(mut self, max: Duration) -> Self {
        self.random_pre_delay = Some(max);
        self
    }

    /// Reject `tx` in pre-validation with `code`.
    pub fn reject_pre(mut self, tx: &[u8], code: u32) -> Self {
        self.pre_rejections.insert(tx.to_vec(), code);
        self
    }

    /// Fail the full check/deliver of `tx` with `code`.
    pub fn fail_execute(mut self, tx: &[u8], code: u32) -> Self {
        self.exec_failures.insert(tx.to_vec(), code);
        self
    }

    /// Panic inside the full check/deliver of `tx`.
    pub fn panic_execute(mut self, tx: &[u8]) -> Self {
        self.exec_panics.insert(tx.to_vec());
        self
    }

    /// Time spent inside every state-mutating call.
    pub fn hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// Time spent inside every read-only call.
    pub fn read_hold(mut self, hold: Duration) -> Self {
        self.read_hold = hold;
        self
    }

    pub fn build(self) -> RecordingApp {
        RecordingApp {
            config: self,
            calls: Mutex::new(Vec::new()),
            pre_calls: Mutex::new(Vec::new()),
            exclusivity: Exclusivity::default(),
            height: AtomicUsize::new(0),
        }
    }
}

/// Application fixture with the concurrent capability set.
pub struct RecordingApp {
    config: RecordingAppBuilder,
    calls: Mutex<Vec<AppCall>>,
    pre_calls: Mutex<Vec<AppCall>>,
    exclusivity: Exclusivity,
    height: AtomicUsize,
}

impl RecordingApp {
    pub fn builder() -> RecordingAppBuilder {
        RecordingAppBuilder::default()
    }

    /// Every state-facing call, in the order the application saw them.
    pub fn calls(&self) -> Vec<AppCall> {
        self.calls.lock().clone()
    }

    /// Pre-validation calls, in completion order.
    pub fn pre_calls(&self) -> Vec<AppCall> {
        self.pre_calls.lock().clone()
    }

    /// Transactions passed to `method`, in call order.
    pub fn executed(&self, method: &str) -> Vec<Tx> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method)
            .filter_map(|call| call.tx.clone())
            .collect()
    }

    /// Overlaps that break the reader/writer contract.
    pub fn violations(&self) -> usize {
        self.exclusivity.violations.load(Ordering::SeqCst)
    }

    /// Highest number of read-only calls seen at once.
    pub fn max_concurrent_readers(&self) -> usize {
        self.exclusivity.max_readers.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.height.load(Ordering::SeqCst)
    }

    fn write_call<R>(&self, method: &'static str, tx: Option<&[u8]>, call: impl FnOnce() -> R) -> R {
        let _writer = self.exclusivity.enter_writer();
        self.calls.lock().push(AppCall {
            method,
            tx: tx.map(<[u8]>::to_vec),
        });
        if !self.config.hold.is_zero() {
            thread::sleep(self.config.hold);
        }
        call()
    }

    fn read_call<R>(&self, method: &'static str, call: impl FnOnce() -> R) -> R {
        let _reader = self.exclusivity.enter_reader();
        self.calls.lock().push(AppCall { method, tx: None });
        if !self.config.read_hold.is_zero() {
            thread::sleep(self.config.read_hold);
        }
        call()
    }

    fn maybe_panic(&self, tx: &[u8]) {
        if self.config.exec_panics.contains(tx) {
            panic!("application fault on {:?}", String::from_utf8_lossy(tx));
        }
    }

    fn pre_call(&self, method: &'static str, tx: &[u8]) -> Option<u32> {
        let delay = match (self.config.pre_delays.get(tx), self.config.random_pre_delay) {
            (Some(delay), _) => Some(*delay),
            (None, Some(max)) => {
                let micros = rand::thread_rng().gen_range(0..=max.as_micros() as u64);
                Some(Duration::from_micros(micros))
            }
            (None, None) => None,
        };
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        self.pre_calls.lock().push(AppCall {
            method,
            tx: Some(tx.to_vec()),
        });
        self.config.pre_rejections.get(tx).copied()
    }
}

impl Application for RecordingApp {
    fn info(&self, _req: RequestInfo) -> ResponseInfo {
        self.read_call("info", || ResponseInfo {
            data: "recording".to_string(),
            last_block_height: self.commits() as i64,
            ..Default::default()
        })
    }

    fn set_option(&self, req: RequestSetOption) -> ResponseSetOption {
        self.write_call("set_option", None, || ResponseSetOption {
            code: 0,
            log: format!("{}={}", req.key, req.value),
        })
    }

    fn query(&self, req: RequestQuery) -> ResponseQuery {
        self.read_call("query", || ResponseQuery {
            key: req.data,
            height: self.commits() as i64,
            ..Default::default()
        })
    }

    fn check_tx(&self, tx: &[u8]) -> ResponseCheckTx {
        self.write_call("check_tx", Some(tx), || {
            self.maybe_panic(tx);
            match self.config.exec_failures.get(tx) {
                Some(code) => ResponseCheckTx::rejected(*code, "check failed"),
                None => ResponseCheckTx::ok(),
            }
        })
    }

    fn init_chain(&self, _req: RequestInitChain) -> ResponseInitChain {
        self.write_call("init_chain", None, ResponseInitChain::default)
    }

    fn begin_block(&self, _req: RequestBeginBlock) -> ResponseBeginBlock {
        self.write_call("begin_block", None, ResponseBeginBlock::default)
    }

    fn deliver_tx(&self, tx: &[u8]) -> ResponseDeliverTx {
        self.write_call("deliver_tx", Some(tx), || {
            self.maybe_panic(tx);
            match self.config.exec_failures.get(tx) {
                Some(code) => ResponseDeliverTx::rejected(*code, "deliver failed"),
                None => ResponseDeliverTx::ok(),
            }
        })
    }

    fn end_block(&self, _req: RequestEndBlock) -> ResponseEndBlock {
        self.write_call("end_block", None, ResponseEndBlock::default)
    }

    fn commit(&self) -> ResponseCommit {
        self.write_call("commit", None, || {
            let height = self.height.fetch_add(1, Ordering::SeqCst) + 1;
            ResponseCommit {
                data: (height as u64).to_be_bytes().to_vec(),
            }
        })
    }

    fn as_concurrent(self: Arc<Self>) -> Option<Arc<dyn ConcurrentApplication>> {
        Some(self)
    }
}

impl ConcurrentApplication for RecordingApp {
    fn pre_check_tx(&self, tx: &[u8]) -> ResponseCheckTx {
        match self.pre_call("pre_check_tx", tx) {
            Some(code) => ResponseCheckTx::rejected(code, "pre-check rejected"),
            None => ResponseCheckTx::ok(),
        }
    }

    fn pre_deliver_tx(&self, tx: &[u8]) -> ResponseDeliverTx {
        match self.pre_call("pre_deliver_tx", tx) {
            Some(code) => ResponseDeliverTx::rejected(code, "pre-deliver rejected"),
            None => ResponseDeliverTx::ok(),
        }
    }

    fn re_check_tx(&self, tx: &[u8]) -> ResponseCheckTx {
        self.write_call("re_check_tx", Some(tx), ResponseCheckTx::ok)
    }
}

/// Application without the concurrent capability set.
#[derive(Default)]
pub struct PlainApp;

impl Application for PlainApp {
    fn info(&self, _req: RequestInfo) -> ResponseInfo {
        ResponseInfo::default()
    }

    fn set_option(&self, _req: RequestSetOption) -> ResponseSetOption {
        ResponseSetOption::default()
    }

    fn query(&self, _req: RequestQuery) -> ResponseQuery {
        ResponseQuery::default()
    }

    fn check_tx(&self, _tx: &[u8]) -> ResponseCheckTx {
        ResponseCheckTx::ok()
    }

    fn init_chain(&self, _req: RequestInitChain) -> ResponseInitChain {
        ResponseInitChain::default()
    }

    fn begin_block(&self, _req: RequestBeginBlock) -> ResponseBeginBlock {
        ResponseBeginBlock::default()
    }

    fn deliver_tx(&self, _tx: &[u8]) -> ResponseDeliverTx {
        ResponseDeliverTx::ok()
    }

    fn end_block(&self, _req: RequestEndBlock) -> ResponseEndBlock {
        ResponseEndBlock::default()
    }

    fn commit(&self) -> ResponseCommit {
        ResponseCommit::default()
    }
}
