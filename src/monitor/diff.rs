use log::debug;
use serde_json::json;

use crate::error::RpcError;
use crate::logging::LogContext;
use crate::models::{PendingMap, Transaction};
use crate::node::NodeRpc;

/// History entries requested on the first attempt
pub const INITIAL_HISTORY_BATCH: u32 = 10;
/// How much the history window grows after each miss
pub const HISTORY_BATCH_STEP: u32 = 10;

/// Pending transfers in `all_pending` whose hash is absent from `last_known_pending`
pub fn find_new_pending(all_pending: &PendingMap, last_known_pending: &PendingMap) -> PendingMap {
    let new_pending: PendingMap = all_pending
        .iter()
        .filter(|(hash, _)| !last_known_pending.contains_key(*hash))
        .map(|(hash, transfer)| (hash.clone(), transfer.clone()))
        .collect();

    debug!("Found {} new pending transfers out of {}", new_pending.len(), all_pending.len());
    new_pending
}

/// Transactions newer than `last_known_hash`, newest first.
///
/// The history is searched in growing windows starting at `batch_size` and
/// stepping by [`HISTORY_BATCH_STEP`]. The search gives up with
/// [`RpcError::BoundaryNotFound`] once the window would pass `max_batch_size`
/// or the node has returned its whole history without the marker.
pub async fn find_newest_transactions(
    rpc: &dyn NodeRpc,
    account: &str,
    last_known_hash: &str,
    batch_size: u32,
    max_batch_size: u32,
) -> Result<Vec<Transaction>, RpcError> {
    let mut count = batch_size.max(1);
    let mut searched = 0;

    while count <= max_batch_size {
        let history = rpc.account_history(account, count).await?;
        searched = history.len() as u32;

        if let Some(position) = history.iter().position(|tx| tx.hash == last_known_hash) {
            let mut newest = history;
            newest.truncate(position);
            return Ok(newest);
        }

        if searched < count {
            // Node returned everything it has
            break;
        }

        LogContext::new("diff", "find_newest_transactions")
            .with_account(account)
            .with_transaction_hash(last_known_hash)
            .with_metadata("count", json!(count))
            .debug("Last known transaction not in window, widening search");

        count += HISTORY_BATCH_STEP;
    }

    Err(RpcError::BoundaryNotFound {
        hash: last_known_hash.to_string(),
        searched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PendingTransfer, TransactionKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves a fixed newest-first history and records every requested count
    struct FakeHistory {
        history: Vec<Transaction>,
        requests: Mutex<Vec<u32>>,
    }

    impl FakeHistory {
        fn with_len(len: usize) -> Self {
            let history = (0..len)
                .rev()
                .map(|i| Transaction {
                    hash: format!("H{}", i),
                    kind: TransactionKind::Receive,
                    account: "xrb_1src".to_string(),
                    amount: "1".to_string(),
                })
                .collect();
            Self { history, requests: Mutex::new(Vec::new()) }
        }

        fn requests(&self) -> Vec<u32> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NodeRpc for FakeHistory {
        async fn account_history(&self, _account: &str, count: u32) -> Result<Vec<Transaction>, RpcError> {
            self.requests.lock().unwrap().push(count);
            Ok(self.history.iter().take(count as usize).cloned().collect())
        }

        async fn pending(&self, _account: &str) -> Result<PendingMap, RpcError> {
            Ok(PendingMap::new())
        }
    }

    fn pending(entries: &[&str]) -> PendingMap {
        entries
            .iter()
            .map(|hash| {
                (
                    hash.to_string(),
                    PendingTransfer { source: "xrb_1src".to_string(), amount: "1".to_string() },
                )
            })
            .collect()
    }

    #[test]
    fn test_find_new_pending_set_difference() {
        let all = pending(&["P1", "P2", "P3"]);
        let known = pending(&["P2", "P4"]);

        let new_pending = find_new_pending(&all, &known);
        let mut hashes: Vec<_> = new_pending.keys().cloned().collect();
        hashes.sort();
        assert_eq!(hashes, vec!["P1".to_string(), "P3".to_string()]);
    }

    #[test]
    fn test_find_new_pending_empty_cases() {
        assert!(find_new_pending(&PendingMap::new(), &pending(&["P1"])).is_empty());
        assert!(find_new_pending(&pending(&["P1", "P2"]), &pending(&["P1", "P2", "P3"])).is_empty());
        assert_eq!(find_new_pending(&pending(&["P1"]), &PendingMap::new()).len(), 1);
    }

    #[tokio::test]
    async fn test_newest_transactions_within_first_batch() {
        // History is H29 (newest) .. H0
        let rpc = FakeHistory::with_len(30);

        let newest = find_newest_transactions(&rpc, "xrb_1abc", "H27", 10, 1000).await.unwrap();
        let hashes: Vec<_> = newest.iter().map(|tx| tx.hash.as_str()).collect();
        assert_eq!(hashes, vec!["H29", "H28"]);
        assert_eq!(rpc.requests(), vec![10]);
    }

    #[tokio::test]
    async fn test_newest_transactions_when_marker_is_newest() {
        let rpc = FakeHistory::with_len(30);

        let newest = find_newest_transactions(&rpc, "xrb_1abc", "H29", 10, 1000).await.unwrap();
        assert!(newest.is_empty());
    }

    #[tokio::test]
    async fn test_newest_transactions_widens_window() {
        let rpc = FakeHistory::with_len(30);

        // H15 is the 15th newest entry, outside the first window of 10
        let newest = find_newest_transactions(&rpc, "xrb_1abc", "H15", 10, 1000).await.unwrap();
        assert_eq!(newest.len(), 14);
        assert_eq!(newest[0].hash, "H29");
        assert_eq!(newest[13].hash, "H16");
        assert_eq!(rpc.requests(), vec![10, 20]);
    }

    #[tokio::test]
    async fn test_newest_transactions_is_idempotent() {
        let rpc = FakeHistory::with_len(30);

        let first = find_newest_transactions(&rpc, "xrb_1abc", "H12", 10, 1000).await.unwrap();
        let second = find_newest_transactions(&rpc, "xrb_1abc", "H12", 10, 1000).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_marker_stops_at_end_of_history() {
        let rpc = FakeHistory::with_len(25);

        let result = find_newest_transactions(&rpc, "xrb_1abc", "GONE", 10, 1000).await;
        match result {
            Err(RpcError::BoundaryNotFound { hash, searched }) => {
                assert_eq!(hash, "GONE");
                assert_eq!(searched, 25);
            }
            other => panic!("expected BoundaryNotFound, got {:?}", other),
        }
        assert_eq!(rpc.requests(), vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_missing_marker_stops_at_max_batch() {
        let rpc = FakeHistory::with_len(500);

        let result = find_newest_transactions(&rpc, "xrb_1abc", "GONE", 10, 40).await;
        match result {
            Err(RpcError::BoundaryNotFound { searched, .. }) => assert_eq!(searched, 40),
            other => panic!("expected BoundaryNotFound, got {:?}", other),
        }
        assert_eq!(rpc.requests(), vec![10, 20, 30, 40]);
    }
}
