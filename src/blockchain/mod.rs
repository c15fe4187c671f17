pub mod rpc_client;
pub mod scanner;
pub mod scheduler;

pub use rpc_client::{BlockSource, BlockTag, RpcClient};
pub use scanner::{PollSummary, Scanner};
pub use scheduler::{CycleContext, Scheduler, SchedulerError};
