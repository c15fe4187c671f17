use clap::Parser;
use eth_tx_parser::api::ApiServer;
use eth_tx_parser::blockchain::{BlockSource, RpcClient, Scanner, Scheduler, SchedulerError};
use eth_tx_parser::config::AppConfig;
use eth_tx_parser::error::{ParserError, RpcError};
use eth_tx_parser::logging::{init_logging, ErrorLogger, LogContext, MetricsLogger};
use eth_tx_parser::parser::{ChainId, ChainRegistry, EthereumParser};
use eth_tx_parser::storage::LedgerIndex;
use std::sync::Arc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "parser")]
#[command(about = "Watches an Ethereum node for transactions touching subscribed addresses")]
#[command(version = "0.1.0")]
struct Args {
    /// Ethereum node JSON-RPC URL
    #[arg(long)]
    rpc_url: Option<String>,

    /// Server port
    #[arg(long)]
    port: Option<u16>,

    /// Seconds between polls
    #[arg(long)]
    poll_interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = AppConfig::load()?;
    if let Some(rpc_url) = args.rpc_url {
        config.rpc.endpoint = rpc_url;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(poll_interval) = args.poll_interval {
        config.polling.poll_interval_seconds = poll_interval;
    }
    config.validate()?;

    init_logging(&config.logging)?;
    log::info!("Starting Ethereum transaction parser");

    let client: Arc<dyn BlockSource> = match config.rpc.timeout_seconds {
        Some(timeout) => Arc::new(RpcClient::new_with_timeout(config.rpc.endpoint.clone(), timeout)?),
        None => Arc::new(RpcClient::new(config.rpc.endpoint.clone())),
    };
    let index = Arc::new(LedgerIndex::new());

    let mut registry = ChainRegistry::new();
    registry.register(
        ChainId::Ethereum,
        Arc::new(EthereumParser::new(client.clone(), index.clone())),
    );
    let registry = Arc::new(registry);

    let shutdown = CancellationToken::new();

    let scanner = Scanner::new(client, index.clone());
    let scheduler = Scheduler::new(config.polling.poll_interval());
    let poller_token = shutdown.clone();
    let poller = tokio::spawn(async move {
        let (scanner, index) = (&scanner, &index);
        scheduler
            .run(poller_token, move |context| {
                async move {
                    let summary = scanner.poll().await?;
                    log::debug!(
                        "Poll cycle {} finished in {:?}",
                        context.sequence,
                        context.started_at.elapsed()
                    );
                    if summary.recorded() > 0 {
                        MetricsLogger::log_index_status(
                            index.watched_count(),
                            index.transaction_count(),
                            &index.progress(),
                        );
                    }
                    Ok::<(), RpcError>(())
                }
            })
            .await
    });

    let server_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => log::info!("Received shutdown signal"),
            Err(e) => log::error!("Unable to listen for shutdown signal: {}", e),
        }
        server_token.cancel();
    });

    let server = ApiServer::new(registry, config.bind_address());
    let server_shutdown = shutdown.clone();
    let served = server
        .start(async move { server_shutdown.cancelled().await })
        .await;

    // Stop polling whether the server exited cleanly or not
    shutdown.cancel();
    report_poller_exit(poller.await);

    if let Err(e) = served {
        let err = ParserError::from(e);
        ErrorLogger::log_error(&err, Some(LogContext::new("main", "serve")));
        return Err(err.into());
    }

    log::info!("Shutdown complete");
    Ok(())
}

/// Log how the poller task ended. Returns `false` if it panicked or was aborted.
fn report_poller_exit(outcome: Result<Result<(), SchedulerError>, JoinError>) -> bool {
    match outcome {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            log::info!("Poller exited: {}", e);
            true
        }
        Err(e) => {
            log::error!("Poller task failed: {}", e);
            false
        }
    }
}
