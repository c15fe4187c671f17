use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::error::RpcError;
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{Address, Transaction};

pub const JSON_RPC_VERSION: &str = "2.0";
pub const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
pub const ETH_BLOCK_NUMBER: &str = "eth_blockNumber";
pub const RETURN_FULL_TRANSACTION_OBJECTS: bool = true;

/// Which block to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Number(u64),
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Latest => f.write_str("latest"),
            BlockTag::Number(n) => write!(f, "0x{:x}", n),
        }
    }
}

/// Read-only access to a ledger node
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Transactions of the given block, in block order
    async fn fetch_block(&self, tag: BlockTag) -> Result<Vec<Transaction>, RpcError>;

    /// Current chain height as the node's hex quantity string
    async fn fetch_height(&self) -> Result<String, RpcError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    #[serde(default)]
    jsonrpc: String,
    #[allow(dead_code)]
    #[serde(default)]
    id: Value,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct BlockResponse {
    number: String,
    transactions: Vec<TransactionResponse>,
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    hash: String,
    from: String,
    /// Absent for contract creations
    to: Option<String>,
    value: String,
    #[serde(rename = "blockNumber")]
    block_number: String,
}

impl From<TransactionResponse> for Transaction {
    fn from(tx: TransactionResponse) -> Self {
        Transaction {
            hash: tx.hash,
            from: Address::from(tx.from),
            to: tx.to.map(Address::from).unwrap_or_default(),
            value: tx.value,
            block_number: tx.block_number,
        }
    }
}

/// JSON-RPC 2.0 client for a single Ethereum node endpoint.
///
/// Stateless apart from the pooled HTTP connection; every call is one POST with no retry.
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    endpoint: String,
}

impl RpcClient {
    /// Client without a request timeout: a hung node stalls the caller until the socket gives up
    pub fn new(endpoint: String) -> Self {
        let context = LogContext::new("rpc_client", "initialization")
            .with_metadata("endpoint", serde_json::json!(endpoint));
        context.info("Initializing RPC client");

        Self {
            client: Client::new(),
            endpoint,
        }
    }

    /// Client with a per-request timeout
    pub fn new_with_timeout(endpoint: String, timeout_seconds: u64) -> Result<Self, RpcError> {
        let context = LogContext::new("rpc_client", "initialization")
            .with_metadata("endpoint", serde_json::json!(endpoint))
            .with_metadata("timeout_seconds", serde_json::json!(timeout_seconds));
        context.info("Initializing RPC client with request timeout");

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one request and unwrap the envelope.
    ///
    /// `Ok(None)` means the node answered with a `null` (or absent) result.
    async fn make_request(&self, method: &str, params: Vec<Value>) -> Result<Option<Value>, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: JSON_RPC_VERSION.to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        LogContext::new("rpc_client", "make_request")
            .with_metadata("method", serde_json::json!(method))
            .trace(&format!("Sending RPC request: {}", method));

        let body = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .bytes()
            .await?;

        let rpc_response: JsonRpcResponse = serde_json::from_slice(&body)
            .map_err(|e| RpcError::Decode(format!("malformed JSON-RPC envelope: {}", e)))?;

        if let Some(error) = rpc_response.error {
            return Err(RpcError::Protocol {
                code: error.code,
                message: error.message,
            });
        }

        Ok(rpc_response.result.filter(|value| !value.is_null()))
    }

    /// Timed request whose non-null result is decoded into `T`
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T, RpcError> {
        let monitor = PerformanceMonitor::new(&format!("rpc_{}", method))
            .with_metadata("endpoint", serde_json::json!(self.endpoint));

        let result = self.make_request(method, params).await.and_then(|value| {
            let value = value
                .ok_or_else(|| RpcError::Decode(format!("{} returned no result", method)))?;
            serde_json::from_value::<T>(value)
                .map_err(|e| RpcError::Decode(format!("unexpected {} result: {}", method, e)))
        });

        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_rpc_call(method, duration, result.is_ok());

        result
    }
}

#[async_trait]
impl BlockSource for RpcClient {
    async fn fetch_block(&self, tag: BlockTag) -> Result<Vec<Transaction>, RpcError> {
        let params = vec![
            Value::String(tag.to_string()),
            Value::Bool(RETURN_FULL_TRANSACTION_OBJECTS),
        ];

        let block: BlockResponse = self.call(ETH_GET_BLOCK_BY_NUMBER, params).await?;

        LogContext::new("rpc_client", "fetch_block")
            .with_block_number(&block.number)
            .with_metadata("transaction_count", serde_json::json!(block.transactions.len()))
            .debug(&format!("Retrieved block {} with {} transactions", block.number, block.transactions.len()));

        Ok(block.transactions.into_iter().map(Transaction::from).collect())
    }

    async fn fetch_height(&self) -> Result<String, RpcError> {
        self.call(ETH_BLOCK_NUMBER, vec![]).await
    }
}
