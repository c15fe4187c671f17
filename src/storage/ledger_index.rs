use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

use crate::error::ServiceError;
use crate::models::{Address, Transaction};

/// Progress marker value before any transaction has been recorded
pub const GENESIS_MARKER: &str = "0x0";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("address already watched: {0}")]
    AlreadyWatched(Address),
}

impl From<IndexError> for ServiceError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::AlreadyWatched(address) => ServiceError::Conflict(address),
        }
    }
}

#[derive(Default)]
struct AddressHistory {
    transactions: Vec<Transaction>,
    hashes: HashSet<String>,
}

struct IndexState {
    watched: HashSet<Address>,
    histories: HashMap<Address, AddressHistory>,
    last_parsed_block: String,
}

/// In-memory, address-keyed index of matched transactions.
///
/// Watch set, histories and the progress marker live behind one readers-writer
/// lock, so every method is a single atomic unit. Reads run concurrently; a
/// `subscribe` or `record` excludes everything else for its duration.
pub struct LedgerIndex {
    state: RwLock<IndexState>,
}

impl LedgerIndex {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(IndexState {
                watched: HashSet::new(),
                histories: HashMap::new(),
                last_parsed_block: GENESIS_MARKER.to_string(),
            }),
        }
    }

    // Writes are a single insert or push, so a poisoned lock still guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, IndexState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an address to the watch set. Format is not checked here.
    pub fn subscribe(&self, address: Address) -> Result<(), IndexError> {
        let mut state = self.write();
        if state.watched.contains(&address) {
            return Err(IndexError::AlreadyWatched(address));
        }
        state.watched.insert(address);
        Ok(())
    }

    pub fn is_watched(&self, address: &Address) -> bool {
        self.read().watched.contains(address)
    }

    /// Append `tx` to the address history unless its hash is already there.
    ///
    /// Returns `true` when the transaction was appended; only then does the
    /// progress marker move to `tx.block_number`.
    pub fn record(&self, address: &Address, tx: Transaction) -> bool {
        let mut state = self.write();
        let history = state.histories.entry(address.clone()).or_default();
        if !history.hashes.insert(tx.hash.clone()) {
            return false;
        }
        let block_number = tx.block_number.clone();
        history.transactions.push(tx);
        state.last_parsed_block = block_number;
        true
    }

    /// Snapshot of the address history in recording order
    pub fn history(&self, address: &Address) -> Vec<Transaction> {
        self.read()
            .histories
            .get(address)
            .map(|history| history.transactions.clone())
            .unwrap_or_default()
    }

    /// Block number (hex) of the most recently recorded transaction
    pub fn progress(&self) -> String {
        self.read().last_parsed_block.clone()
    }

    pub fn watched_count(&self) -> usize {
        self.read().watched.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.read()
            .histories
            .values()
            .map(|history| history.transactions.len())
            .sum()
    }
}

impl Default for LedgerIndex {
    fn default() -> Self {
        Self::new()
    }
}
