use std::sync::Arc;
use std::time::Instant;

use crate::blockchain::rpc_client::{BlockSource, BlockTag};
use crate::error::RpcError;
use crate::logging::{LogContext, MetricsLogger};
use crate::models::{Address, Transaction};
use crate::storage::LedgerIndex;

/// Outcome of one polling cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Transactions in the fetched block
    pub scanned: usize,
    /// Newly recorded under their sender
    pub outbound: usize,
    /// Newly recorded under their recipient
    pub inbound: usize,
}

impl PollSummary {
    pub fn recorded(&self) -> usize {
        self.outbound + self.inbound
    }
}

/// Matches the latest block's transactions against the watch set
pub struct Scanner {
    source: Arc<dyn BlockSource>,
    index: Arc<LedgerIndex>,
}

impl Scanner {
    pub fn new(source: Arc<dyn BlockSource>, index: Arc<LedgerIndex>) -> Self {
        Self { source, index }
    }

    /// Run exactly one cycle: fetch the latest block and record matching transactions.
    ///
    /// A fetch failure is returned untouched before anything is written.
    pub async fn poll(&self) -> Result<PollSummary, RpcError> {
        let started = Instant::now();

        let transactions = match self.source.fetch_block(BlockTag::Latest).await {
            Ok(transactions) => transactions,
            Err(e) => {
                LogContext::new("scanner", "poll")
                    .with_error_kind(e.kind().as_str())
                    .warn(&format!("Error retrieving the latest block: {}", e));
                return Err(e);
            }
        };

        let mut summary = PollSummary {
            scanned: transactions.len(),
            ..PollSummary::default()
        };

        for tx in transactions {
            self.match_transaction(tx, &mut summary);
        }

        MetricsLogger::log_poll_cycle(
            summary.scanned,
            summary.recorded(),
            started.elapsed().as_millis() as u64,
        );

        Ok(summary)
    }

    // Sender wins: when both sides are watched the transaction is recorded once, under `from`.
    fn match_transaction(&self, tx: Transaction, summary: &mut PollSummary) {
        if self.index.is_watched(&tx.from) {
            let owner = tx.from.clone();
            if self.record(&owner, tx, "outbound") {
                summary.outbound += 1;
            }
            return;
        }

        if self.index.is_watched(&tx.to) {
            let owner = tx.to.clone();
            if self.record(&owner, tx, "inbound") {
                summary.inbound += 1;
            }
        }
    }

    fn record(&self, owner: &Address, tx: Transaction, direction: &str) -> bool {
        let hash = tx.hash.clone();
        let block_number = tx.block_number.clone();

        let appended = self.index.record(owner, tx);
        if appended {
            MetricsLogger::log_transaction_recorded(owner.as_str(), &hash, &block_number, direction);
        }
        appended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const ALICE: &str = "0x00000000000000000000000000000000000000a1";
    const BOB: &str = "0x00000000000000000000000000000000000000b0";
    const CAROL: &str = "0x00000000000000000000000000000000000000c0";

    /// Block source returning a canned response
    struct MockBlockSource {
        response: Mutex<Option<Result<Vec<Transaction>, RpcError>>>,
        requested: Mutex<Vec<BlockTag>>,
    }

    impl MockBlockSource {
        fn with_transactions(transactions: Vec<Transaction>) -> Self {
            Self {
                response: Mutex::new(Some(Ok(transactions))),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn with_failure(error: RpcError) -> Self {
            Self {
                response: Mutex::new(Some(Err(error))),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BlockSource for MockBlockSource {
        async fn fetch_block(&self, tag: BlockTag) -> Result<Vec<Transaction>, RpcError> {
            self.requested.lock().unwrap().push(tag);
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn fetch_height(&self) -> Result<String, RpcError> {
            Ok("0x0".to_string())
        }
    }

    fn tx(hash: &str, from: &str, to: &str) -> Transaction {
        Transaction {
            hash: hash.to_string(),
            from: Address::from(from),
            to: Address::from(to),
            value: "0x1".to_string(),
            block_number: "0x10".to_string(),
        }
    }

    fn scanner_with(source: MockBlockSource, watched: &[&str]) -> (Scanner, Arc<LedgerIndex>, Arc<MockBlockSource>) {
        let index = Arc::new(LedgerIndex::new());
        for address in watched {
            index.subscribe(Address::from(*address)).unwrap();
        }
        let source = Arc::new(source);
        let scanner = Scanner::new(source.clone(), index.clone());
        (scanner, index, source)
    }

    #[tokio::test]
    async fn test_poll_requests_latest_block() {
        let (scanner, _, source) = scanner_with(MockBlockSource::with_transactions(vec![]), &[]);

        scanner.poll().await.unwrap();

        assert_eq!(*source.requested.lock().unwrap(), vec![BlockTag::Latest]);
    }

    #[tokio::test]
    async fn test_sender_takes_precedence_over_recipient() {
        let source = MockBlockSource::with_transactions(vec![tx("h1", ALICE, BOB)]);
        let (scanner, index, _) = scanner_with(source, &[ALICE, BOB]);

        let summary = scanner.poll().await.unwrap();

        assert_eq!(summary.outbound, 1);
        assert_eq!(summary.inbound, 0);
        assert_eq!(index.history(&Address::from(ALICE))[0].hash, "h1");
        assert!(index.history(&Address::from(BOB)).is_empty());
    }

    #[tokio::test]
    async fn test_recipient_matched_when_sender_unwatched() {
        let source = MockBlockSource::with_transactions(vec![
            tx("h1", CAROL, BOB),
            tx("h2", CAROL, ALICE),
        ]);
        let (scanner, index, _) = scanner_with(source, &[BOB]);

        let summary = scanner.poll().await.unwrap();

        assert_eq!(summary, PollSummary { scanned: 2, outbound: 0, inbound: 1 });
        assert_eq!(index.history(&Address::from(BOB)).len(), 1);
        assert_eq!(index.transaction_count(), 1);
        assert_eq!(index.progress(), "0x10");
    }

    #[tokio::test]
    async fn test_self_transfer_recorded_once() {
        let source = MockBlockSource::with_transactions(vec![tx("h1", ALICE, ALICE)]);
        let (scanner, index, _) = scanner_with(source, &[ALICE]);

        scanner.poll().await.unwrap();

        assert_eq!(index.history(&Address::from(ALICE)).len(), 1);
    }

    #[tokio::test]
    async fn test_rpc_failure_leaves_index_untouched() {
        let source = MockBlockSource::with_failure(RpcError::Protocol {
            code: -32000,
            message: "block not found".to_string(),
        });
        let (scanner, index, _) = scanner_with(source, &[ALICE]);

        let err = scanner.poll().await.unwrap_err();

        assert_eq!(err.to_string(), "block not found");
        assert_eq!(index.transaction_count(), 0);
        assert_eq!(index.progress(), "0x0");
    }

    #[tokio::test]
    async fn test_repeated_block_is_not_recorded_twice() {
        let source = MockBlockSource::with_transactions(vec![tx("h1", ALICE, CAROL)]);
        let (scanner, index, source) = scanner_with(source, &[ALICE]);
        scanner.poll().await.unwrap();

        // The node still reports the same head on the next tick
        *source.response.lock().unwrap() = Some(Ok(vec![tx("h1", ALICE, CAROL)]));
        let summary = scanner.poll().await.unwrap();

        assert_eq!(summary.recorded(), 0);
        assert_eq!(index.history(&Address::from(ALICE)).len(), 1);
    }
}
