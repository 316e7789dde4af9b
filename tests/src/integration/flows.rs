//! # Block Lifecycle Flows
//!
//! A full height driven through the three connections:
//!
//! 1. **Mempool**: check_tx floods in from many threads
//! 2. **Consensus**: begin_block, deliver_tx..., end_block, commit
//! 3. **Mempool**: re_check_tx of what is left after the block
//! 4. **Query**: info/query between heights

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use qc_concurrent::test_utils::RecordingApp;
    use qc_concurrent::{AbciClient, ConcurrencyConfig};
    use shared_types::{
        Request, RequestBeginBlock, RequestEndBlock, RequestInfo, RequestQuery, Response,
    };

    use crate::integration::Node;

    fn tx(n: usize) -> Vec<u8> {
        format!("tx-{n:04}").into_bytes()
    }

    /// Run one height on the consensus connection.
    fn run_block(consensus: &dyn AbciClient, height: i64, txs: &[Vec<u8>]) -> Vec<Response> {
        consensus.begin_block_sync(RequestBeginBlock {
            height,
            ..Default::default()
        })
        .unwrap();
        let handles: Vec<_> = txs
            .iter()
            .map(|tx| consensus.deliver_tx_async(tx.clone()).unwrap())
            .collect();
        consensus.end_block_sync(RequestEndBlock { height }).unwrap();
        let responses = handles.iter().map(|h| h.wait()).collect();
        consensus.commit_sync().unwrap();
        responses
    }

    #[test]
    fn test_single_height_end_to_end() {
        let node = Node::start(
            RecordingApp::builder()
                .random_pre_delay(Duration::from_millis(2))
                .build(),
            ConcurrencyConfig::for_testing(),
        );

        let checked: Vec<_> = (0..16)
            .map(|n| node.mempool.check_tx_async(tx(n)).unwrap())
            .collect();
        for handle in &checked {
            assert!(handle.wait().is_ok());
        }

        let block: Vec<_> = (0..16).map(tx).collect();
        let responses = run_block(node.consensus.as_ref(), 1, &block);
        assert!(responses.iter().all(Response::is_ok));

        let info = node.query.info_sync(RequestInfo::default()).unwrap();
        assert_eq!(info.last_block_height, 1);
        assert_eq!(node.app.executed("deliver_tx"), block);
        assert_eq!(node.app.executed("check_tx"), block);
        assert_eq!(node.app.violations(), 0);

        node.stop();
    }

    #[test]
    fn test_deliver_order_within_block_matches_submission() {
        let node = Node::start(
            RecordingApp::builder()
                .random_pre_delay(Duration::from_millis(5))
                .build(),
            ConcurrencyConfig::for_testing(),
        );
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&delivered);
        node.consensus
            .set_response_callback(Arc::new(move |req: &Request, _: &Response| {
                if let Request::DeliverTx(req) = req {
                    sink.lock().push(req.tx.clone());
                }
            }));

        for height in 1..=3 {
            let block: Vec<_> = (0..10).map(|n| tx(height as usize * 100 + n)).collect();
            delivered.lock().clear();
            run_block(node.consensus.as_ref(), height, &block);
            assert_eq!(*delivered.lock(), block);
        }
        assert_eq!(node.app.commits(), 3);

        node.stop();
    }

    #[test]
    fn test_mempool_keeps_admitting_across_heights() {
        let node = Arc::new(Node::start(
            RecordingApp::builder()
                .random_pre_delay(Duration::from_millis(1))
                .build(),
            ConcurrencyConfig::for_testing(),
        ));

        let submitters: Vec<_> = (0..4)
            .map(|worker| {
                let node = Arc::clone(&node);
                thread::spawn(move || {
                    (0..25)
                        .map(|n| node.mempool.check_tx_async(tx(worker * 1000 + n)).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for height in 1..=5 {
            run_block(node.consensus.as_ref(), height, &[tx(90_000 + height as usize)]);
            // Re-check runs between heights, with the mempool still admitting.
            node.mempool.re_check_tx_async(tx(0));
        }

        let handles: Vec<_> = submitters
            .into_iter()
            .flat_map(|s| s.join().unwrap())
            .collect();
        for handle in &handles {
            assert!(handle.wait().is_ok());
        }

        assert_eq!(node.app.executed("check_tx").len(), 100);
        assert_eq!(node.app.commits(), 5);
        assert_eq!(node.app.violations(), 0);
        assert_eq!(node.creator.coordinator().in_flight().get(), 0);

        let node = Arc::try_unwrap(node).ok().expect("submitters joined");
        node.stop();
    }

    #[test]
    fn test_queries_between_heights() {
        let node = Node::start(RecordingApp::builder().build(), ConcurrencyConfig::for_testing());

        for height in 1..=2 {
            run_block(node.consensus.as_ref(), height, &[tx(height as usize)]);
            let res = node
                .query
                .query_sync(RequestQuery {
                    data: b"key".to_vec(),
                    ..Default::default()
                })
                .unwrap();
            assert_eq!(res.height, height);
            assert_eq!(res.key, b"key".to_vec());
        }

        node.stop();
    }

    #[tokio::test]
    async fn test_async_waiters_resolve() {
        let node = Node::start(
            RecordingApp::builder()
                .random_pre_delay(Duration::from_millis(3))
                .build(),
            ConcurrencyConfig::for_testing(),
        );

        let handles: Vec<_> = (0..8)
            .map(|n| node.mempool.check_tx_async(tx(n)).unwrap())
            .collect();
        for handle in handles {
            let response = tokio::time::timeout(Duration::from_secs(5), handle.wait_async())
                .await
                .expect("check_tx resolved");
            assert!(response.is_ok());
        }

        node.stop();
    }
}
