pub mod http;

pub use http::{
    router, ApiServer, AppState, CurrentBlockResponse, ErrorResponse, StatusResponse,
    TransactionResponse, get_current_block, get_status, get_transactions, subscribe_address,
};
