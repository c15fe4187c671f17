pub mod blockchain;
pub mod models;
pub mod storage;
pub mod parser;
pub mod api;
pub mod error;
pub mod logging;
pub mod config;

pub use blockchain::{BlockSource, BlockTag, RpcClient, Scanner, Scheduler};
pub use error::{ErrorKind, ParserError, Result};
pub use logging::{LogContext, PerformanceMonitor, ErrorLogger, MetricsLogger};
pub use config::{AppConfig, RpcConfig, PollingConfig, ApiConfig, LoggingConfig};
pub use models::{Address, Transaction};
pub use parser::{ChainId, ChainRegistry, EthereumParser};
pub use storage::LedgerIndex;
