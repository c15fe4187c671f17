use serde::{Deserialize, Serialize};

use crate::models::Address;

/// A transaction that touched a watched address.
///
/// `value` and `block_number` keep the node's hex quantity encoding; large wei
/// amounts do not fit in a u64.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub hash: String,
    pub from: Address,
    pub to: Address,
    pub value: String,
    #[serde(rename = "blockNumber")]
    pub block_number: String,
}
