//! # Commit Barrier Soundness
//!
//! - Every check_tx admitted before a commit started reaches the application
//!   before that commit does.
//! - A check_tx submitted while a commit is waiting is held at admission and
//!   reaches the application after the commit.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use qc_concurrent::test_utils::RecordingApp;
    use qc_concurrent::ConcurrencyConfig;
    use shared_types::RequestEndBlock;

    use crate::integration::Node;

    #[test]
    fn test_check_tx_submitted_during_commit_wait_lands_after_commit() {
        let node = Arc::new(Node::start(
            RecordingApp::builder()
                .pre_delay(b"early", Duration::from_millis(100))
                .build(),
            ConcurrencyConfig::for_testing(),
        ));

        let early = node.mempool.check_tx_async(b"early".to_vec()).unwrap();

        let committer = {
            let node = Arc::clone(&node);
            thread::spawn(move || node.consensus.commit_sync().unwrap())
        };
        // Let the commit take the barrier and start waiting on "early".
        thread::sleep(Duration::from_millis(30));

        let started = Instant::now();
        let late = node.mempool.check_tx_async(b"late".to_vec()).unwrap();
        let admission_wait = started.elapsed();

        committer.join().unwrap();
        late.wait();
        assert!(early.is_done());
        assert!(admission_wait >= Duration::from_millis(30));

        let methods: Vec<_> = node.app.calls().into_iter().map(|c| c.method).collect();
        assert_eq!(methods, vec!["check_tx", "commit", "check_tx"]);
        assert_eq!(node.app.executed("check_tx"), vec![b"early".to_vec(), b"late".to_vec()]);

        Arc::try_unwrap(node).ok().expect("threads joined").stop();
    }

    #[test]
    fn test_end_block_is_a_barrier_too() {
        let node = Node::start(
            RecordingApp::builder()
                .pre_delay(b"slow", Duration::from_millis(50))
                .build(),
            ConcurrencyConfig::for_testing(),
        );

        node.mempool.check_tx_async(b"slow".to_vec()).unwrap();
        node.consensus
            .end_block_sync(RequestEndBlock { height: 1 })
            .unwrap();

        let methods: Vec<_> = node.app.calls().into_iter().map(|c| c.method).collect();
        assert_eq!(methods, vec!["check_tx", "end_block"]);
        node.stop();
    }

    #[test]
    fn test_barrier_sound_under_check_tx_flood() {
        const SUBMITTERS: usize = 4;
        const PER_SUBMITTER: usize = 60;
        const COMMITS: usize = 10;

        let node = Arc::new(Node::start(
            RecordingApp::builder()
                .random_pre_delay(Duration::from_millis(2))
                .build(),
            ConcurrencyConfig::for_testing(),
        ));
        // Incremented right before each commit is issued.
        let commits_issued = Arc::new(AtomicUsize::new(0));
        let flooding = Arc::new(AtomicBool::new(true));

        let submitters: Vec<_> = (0..SUBMITTERS)
            .map(|worker| {
                let node = Arc::clone(&node);
                let commits_issued = Arc::clone(&commits_issued);
                thread::spawn(move || {
                    (0..PER_SUBMITTER)
                        .map(|n| {
                            let tx = format!("{worker}-{n}").into_bytes();
                            let handle = node.mempool.check_tx_async(tx.clone()).unwrap();
                            // Commits issued so far; the next one must see this tx.
                            (tx, commits_issued.load(Ordering::SeqCst), handle)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let committer = {
            let node = Arc::clone(&node);
            let commits_issued = Arc::clone(&commits_issued);
            let flooding = Arc::clone(&flooding);
            thread::spawn(move || {
                for _ in 0..COMMITS {
                    thread::sleep(Duration::from_millis(5));
                    commits_issued.fetch_add(1, Ordering::SeqCst);
                    node.consensus.commit_sync().unwrap();
                    if !flooding.load(Ordering::SeqCst) {
                        break;
                    }
                }
            })
        };

        let admitted: Vec<_> = submitters
            .into_iter()
            .flat_map(|s| s.join().unwrap())
            .collect();
        flooding.store(false, Ordering::SeqCst);
        committer.join().unwrap();
        for (_, _, handle) in &admitted {
            assert!(handle.wait().is_ok());
        }

        let calls = node.app.calls();
        let commit_positions: Vec<usize> = calls
            .iter()
            .enumerate()
            .filter(|(_, call)| call.method == "commit")
            .map(|(i, _)| i)
            .collect();
        let check_positions: HashMap<Vec<u8>, usize> = calls
            .iter()
            .enumerate()
            .filter(|(_, call)| call.method == "check_tx")
            .filter_map(|(i, call)| call.tx.clone().map(|tx| (tx, i)))
            .collect();

        for (tx, issued_before, _) in &admitted {
            let position = check_positions[tx];
            if let Some(next_commit) = commit_positions.get(*issued_before) {
                assert!(
                    position < *next_commit,
                    "check_tx admitted before commit #{} executed after it",
                    issued_before + 1
                );
            }
        }
        assert_eq!(check_positions.len(), SUBMITTERS * PER_SUBMITTER);
        assert_eq!(node.app.violations(), 0);

        Arc::try_unwrap(node).ok().expect("threads joined").stop();
    }
}
