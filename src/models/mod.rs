pub mod address;
pub mod transaction;

pub use address::{Address, ADDRESS_HEX_LEN};
pub use transaction::Transaction;
