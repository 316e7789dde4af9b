//! # Exclusivity
//!
//! The instrumented application counts a violation whenever a writer enters
//! while anyone else is inside, or a reader overlaps a writer. Every path
//! into the application (pipelines, barrier, direct calls, from several
//! clients at once) must leave that count at zero.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    use qc_concurrent::test_utils::RecordingApp;
    use qc_concurrent::ConcurrencyConfig;
    use shared_types::{RequestBeginBlock, RequestInfo, RequestQuery, RequestSetOption};

    use crate::integration::Node;

    #[test]
    fn test_mixed_traffic_never_overlaps_writers() {
        let node = Arc::new(Node::start(
            RecordingApp::builder()
                .hold(Duration::from_micros(200))
                .read_hold(Duration::from_micros(200))
                .random_pre_delay(Duration::from_millis(1))
                .build(),
            ConcurrencyConfig::for_testing(),
        ));

        let mut workers = Vec::new();
        for i in 0..3 {
            let node = Arc::clone(&node);
            workers.push(thread::spawn(move || {
                for n in 0..30 {
                    node.mempool
                        .check_tx_async(format!("{i}-{n}").into_bytes())
                        .unwrap();
                }
            }));
        }
        for _ in 0..3 {
            let node = Arc::clone(&node);
            workers.push(thread::spawn(move || {
                for _ in 0..30 {
                    node.query.query_sync(RequestQuery::default()).unwrap();
                    node.query.info_async(RequestInfo::default());
                }
            }));
        }
        {
            let node = Arc::clone(&node);
            workers.push(thread::spawn(move || {
                for n in 0..10 {
                    node.mempool.set_option_sync(RequestSetOption::default()).unwrap();
                    node.mempool.re_check_tx_async(format!("re-{n}").into_bytes());
                }
            }));
        }
        for height in 1..=5 {
            node.consensus
                .begin_block_sync(RequestBeginBlock {
                    height,
                    ..Default::default()
                })
                .unwrap();
            for n in 0..5 {
                node.consensus
                    .deliver_tx_async(format!("block-{height}-{n}").into_bytes())
                    .unwrap();
            }
            node.consensus.commit_sync().unwrap();
        }

        for worker in workers {
            worker.join().unwrap();
        }
        node.consensus.commit_sync().unwrap();

        assert_eq!(node.app.violations(), 0);
        assert_eq!(node.app.executed("check_tx").len(), 90);
        assert_eq!(node.app.executed("deliver_tx").len(), 25);

        Arc::try_unwrap(node).ok().expect("workers joined").stop();
    }

    #[test]
    fn test_read_only_calls_run_concurrently() {
        let node = Arc::new(Node::start(
            RecordingApp::builder()
                .read_hold(Duration::from_millis(40))
                .build(),
            ConcurrencyConfig::for_testing(),
        ));
        let start = Arc::new(Barrier::new(4));

        let readers: Vec<_> = (0..4)
            .map(|i| {
                let node = Arc::clone(&node);
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    start.wait();
                    if i % 2 == 0 {
                        node.query.info_sync(RequestInfo::default()).unwrap();
                    } else {
                        node.mempool.query_sync(RequestQuery::default()).unwrap();
                    }
                })
            })
            .collect();
        for reader in readers {
            reader.join().unwrap();
        }

        assert!(node.app.max_concurrent_readers() > 1);
        assert_eq!(node.app.violations(), 0);

        Arc::try_unwrap(node).ok().expect("readers joined").stop();
    }
}
