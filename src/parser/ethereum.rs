use std::sync::Arc;

use crate::blockchain::BlockSource;
use crate::error::{FormatError, ServiceError};
use crate::logging::LogContext;
use crate::models::{Address, Transaction};
use crate::storage::LedgerIndex;

/// Domain operations for the Ethereum chain.
///
/// Validates user-supplied addresses before they reach the ledger index and maps
/// index outcomes onto [`ServiceError`] kinds.
pub struct EthereumParser {
    source: Arc<dyn BlockSource>,
    index: Arc<LedgerIndex>,
}

impl EthereumParser {
    pub fn new(source: Arc<dyn BlockSource>, index: Arc<LedgerIndex>) -> Self {
        Self { source, index }
    }

    /// Last parsed block as a decimal number.
    ///
    /// This is the block of the most recently recorded transaction, not the chain head.
    pub fn current_height(&self) -> Result<i64, ServiceError> {
        let marker = self.index.progress();
        hex_to_decimal(&marker).map_err(|e| {
            LogContext::new("ethereum_parser", "current_height")
                .with_block_number(&marker)
                .error(&format!("Stored progress marker is malformed: {}", e));
            ServiceError::from(e)
        })
    }

    /// Chain head as reported by the node right now
    pub async fn node_height(&self) -> Result<i64, ServiceError> {
        let hex = self.source.fetch_height().await?;
        Ok(hex_to_decimal(&hex)?)
    }

    pub fn subscribe(&self, raw: &str) -> Result<(), ServiceError> {
        let address = parse_address(raw, "subscribe")?;
        self.index.subscribe(address.clone())?;

        LogContext::new("ethereum_parser", "subscribe")
            .with_address(address.as_str())
            .info("Address subscribed");
        Ok(())
    }

    pub fn transactions_for(&self, raw: &str) -> Result<Vec<Transaction>, ServiceError> {
        let address = parse_address(raw, "transactions_for")?;
        if !self.index.is_watched(&address) {
            return Err(ServiceError::NotFound(address));
        }
        Ok(self.index.history(&address))
    }

    pub fn index(&self) -> &Arc<LedgerIndex> {
        &self.index
    }
}

fn parse_address(raw: &str, operation: &str) -> Result<Address, ServiceError> {
    Address::parse(raw).map_err(|e| {
        LogContext::new("ethereum_parser", operation)
            .with_address(raw)
            .debug(&format!("Rejected address: {}", e));
        e
    })
}

/// Convert a `0x`-prefixed hex quantity into a decimal number
pub fn hex_to_decimal(value: &str) -> Result<i64, FormatError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| FormatError::UnexpectedFormat(value.to_string()))?;

    i64::from_str_radix(digits, 16).map_err(|e| FormatError::InvalidHex {
        value: digits.to_string(),
        reason: e.to_string(),
    })
}
