pub mod ethereum;
pub mod registry;

pub use ethereum::{hex_to_decimal, EthereumParser};
pub use registry::{ChainId, ChainRegistry};
