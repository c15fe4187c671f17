use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::parser::EthereumParser;

/// Chains the service knows how to parse, keyed by EIP-155 chain id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainId {
    Ethereum,
}

impl ChainId {
    pub fn id(&self) -> u64 {
        match self {
            ChainId::Ethereum => 1,
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainId::Ethereum => write!(f, "ethereum ({})", self.id()),
        }
    }
}

/// Chain parsers resolved at startup
#[derive(Default)]
pub struct ChainRegistry {
    parsers: HashMap<ChainId, Arc<EthereumParser>>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parser, replacing any previous one for the same chain
    pub fn register(&mut self, chain: ChainId, parser: Arc<EthereumParser>) {
        log::info!("Registered parser for chain {}", chain);
        self.parsers.insert(chain, parser);
    }

    pub fn parser(&self, chain: ChainId) -> Result<Arc<EthereumParser>, ServiceError> {
        self.parsers.get(&chain).cloned().ok_or_else(|| {
            log::error!("No parser loaded for chain {}", chain);
            ServiceError::ChainNotConfigured(chain.id())
        })
    }

    /// The single active chain served by the API
    pub fn ethereum(&self) -> Result<Arc<EthereumParser>, ServiceError> {
        self.parser(ChainId::Ethereum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::RpcClient;
    use crate::error::ErrorKind;
    use crate::storage::LedgerIndex;

    #[test]
    fn test_unregistered_chain_is_not_configured() {
        let registry = ChainRegistry::new();
        let err = registry.ethereum().err().expect("expected an error");
        assert!(matches!(err, ServiceError::ChainNotConfigured(1)));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_registered_parser_is_shared() {
        let index = Arc::new(LedgerIndex::new());
        let client = Arc::new(RpcClient::new("http://localhost:8545".to_string()));
        let parser = Arc::new(EthereumParser::new(client, index));

        let mut registry = ChainRegistry::new();
        registry.register(ChainId::Ethereum, parser.clone());

        let resolved = registry.parser(ChainId::Ethereum).unwrap();
        assert!(Arc::ptr_eq(&resolved, &parser));
    }

    #[test]
    fn test_chain_id_display() {
        assert_eq!(ChainId::Ethereum.id(), 1);
        assert_eq!(ChainId::Ethereum.to_string(), "ethereum (1)");
    }
}
