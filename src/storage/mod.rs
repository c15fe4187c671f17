pub mod ledger_index;

pub use ledger_index::{IndexError, LedgerIndex, GENESIS_MARKER};
