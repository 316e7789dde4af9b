//! # FIFO Properties
//!
//! Property tests: whatever order pre-validation finishes in, each pipeline
//! calls the application and the callbacks in submission order.

use proptest::prelude::*;
use std::time::Duration;

/// One submitted transaction: pre-validation latency and whether it rejects.
#[derive(Debug, Clone)]
pub struct Submission {
    pub delay_ms: u64,
    pub rejected: bool,
}

/// Strategy for a batch of submissions with mixed latency.
pub fn submissions() -> impl Strategy<Value = Vec<Submission>> {
    prop::collection::vec(
        (0u64..6, prop::bool::weighted(0.2))
            .prop_map(|(delay_ms, rejected)| Submission { delay_ms, rejected }),
        1..24,
    )
}

pub fn tx(index: usize) -> Vec<u8> {
    format!("prop-{index}").into_bytes()
}

pub fn delay(submission: &Submission) -> Duration {
    Duration::from_millis(submission.delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    use qc_concurrent::test_utils::RecordingApp;
    use qc_concurrent::{AbciClient, ConcurrencyConfig, PoolConfig};
    use shared_types::{Request, Response};

    use crate::integration::Node;

    fn build_app(batch: &[Submission]) -> RecordingApp {
        batch
            .iter()
            .enumerate()
            .fold(RecordingApp::builder(), |builder, (i, submission)| {
                let builder = builder.pre_delay(&tx(i), delay(submission));
                if submission.rejected {
                    builder.reject_pre(&tx(i), 1)
                } else {
                    builder
                }
            })
            .build()
    }

    fn config() -> ConcurrencyConfig {
        let pool = PoolConfig {
            size: 8,
            queue: 2,
            spawn: 2,
        };
        ConcurrencyConfig {
            check_tx_pool: pool,
            deliver_tx_pool: pool,
            queue_capacity: 4,
        }
    }

    fn record(client: &dyn AbciClient) -> Arc<Mutex<Vec<Vec<u8>>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        client.set_response_callback(Arc::new(move |req: &Request, _: &Response| {
            if let Some(tx) = req.tx() {
                sink.lock().push(tx.to_vec());
            }
        }));
        seen
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_check_tx_order_preserved(batch in submissions()) {
            let node = Node::start(build_app(&batch), config());
            let callbacks = record(node.mempool.as_ref());

            let handles: Vec<_> = (0..batch.len())
                .map(|i| node.mempool.check_tx_async(tx(i)).unwrap())
                .collect();
            for (handle, submission) in handles.iter().zip(&batch) {
                prop_assert_eq!(handle.wait().is_ok(), !submission.rejected);
            }

            // Callbacks run after the handle is done; the barrier waits them out.
            node.consensus.commit_sync().unwrap();

            let expected: Vec<_> = batch
                .iter()
                .enumerate()
                .filter(|(_, s)| !s.rejected)
                .map(|(i, _)| tx(i))
                .collect();
            let all: Vec<_> = (0..batch.len()).map(tx).collect();
            prop_assert_eq!(node.app.executed("check_tx"), expected);
            prop_assert_eq!(callbacks.lock().clone(), all);
            node.stop();
        }

        #[test]
        fn prop_deliver_tx_order_preserved(batch in submissions()) {
            let node = Node::start(build_app(&batch), config());

            let handles: Vec<_> = (0..batch.len())
                .map(|i| node.consensus.deliver_tx_async(tx(i)).unwrap())
                .collect();
            node.consensus.commit_sync().unwrap();
            for handle in &handles {
                prop_assert!(handle.is_done());
            }

            let expected: Vec<_> = batch
                .iter()
                .enumerate()
                .filter(|(_, s)| !s.rejected)
                .map(|(i, _)| tx(i))
                .collect();
            prop_assert_eq!(node.app.executed("deliver_tx"), expected);
            node.stop();
        }
    }
}
