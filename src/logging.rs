use log::{info, warn, error, debug, trace, LevelFilter};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::LoggingConfig;
use crate::error::{ErrorSeverity, ParserError};

/// Structured logging context for the parser
pub struct LogContext {
    pub component: String,
    pub operation: String,
    pub metadata: HashMap<String, Value>,
}

impl LogContext {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn with_block_number(self, block_number: &str) -> Self {
        self.with_metadata("block_number", json!(block_number))
    }

    pub fn with_transaction_hash(self, tx_hash: &str) -> Self {
        self.with_metadata("transaction_hash", json!(tx_hash))
    }

    pub fn with_address(self, address: &str) -> Self {
        self.with_metadata("address", json!(address))
    }

    pub fn with_duration_ms(self, duration_ms: u64) -> Self {
        self.with_metadata("duration_ms", json!(duration_ms))
    }

    pub fn with_error_kind(self, kind: &str) -> Self {
        self.with_metadata("error_kind", json!(kind))
    }

    fn format_message(&self, level: &str, message: &str) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut log_entry = json!({
            "timestamp": timestamp,
            "level": level,
            "component": self.component,
            "operation": self.operation,
            "message": message,
        });

        for (key, value) in &self.metadata {
            log_entry[key] = value.clone();
        }

        log_entry.to_string()
    }

    pub fn info(&self, message: &str) {
        info!("{}", self.format_message("INFO", message));
    }

    pub fn warn(&self, message: &str) {
        warn!("{}", self.format_message("WARN", message));
    }

    pub fn error(&self, message: &str) {
        error!("{}", self.format_message("ERROR", message));
    }

    pub fn debug(&self, message: &str) {
        debug!("{}", self.format_message("DEBUG", message));
    }

    pub fn trace(&self, message: &str) {
        trace!("{}", self.format_message("TRACE", message));
    }
}

/// Wall-clock timer for a single operation
pub struct PerformanceMonitor {
    pub start_time: SystemTime,
    operation: String,
    metadata: HashMap<String, Value>,
}

impl PerformanceMonitor {
    pub fn new(operation: &str) -> Self {
        Self {
            start_time: SystemTime::now(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    fn elapsed_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or_default()
            .as_millis() as u64
    }

    pub fn finish_with_result<T, E>(self, result: &Result<T, E>) -> u64
    where
        E: std::fmt::Display,
    {
        let duration = self.elapsed_ms();

        let mut context = LogContext::new("performance", &self.operation)
            .with_duration_ms(duration);

        for (key, value) in self.metadata {
            context = context.with_metadata(&key, value);
        }

        match result {
            Ok(_) => {
                context.trace(&format!("Operation completed successfully in {}ms", duration));
            }
            Err(e) => {
                context = context.with_metadata("error", json!(e.to_string()));
                context.debug(&format!("Operation failed after {}ms: {}", duration, e));
            }
        }

        duration
    }
}

/// Error logging utilities
pub struct ErrorLogger;

impl ErrorLogger {
    pub fn log_error(error: &ParserError, context: Option<LogContext>) {
        let severity = error.severity();

        let log_context = context
            .unwrap_or_else(|| LogContext::new("error", "unknown"))
            .with_error_kind(error.kind().as_str())
            .with_metadata("severity", json!(format!("{:?}", severity)))
            .with_metadata("recoverable", json!(error.is_recoverable()));

        let message = format!("Error occurred: {}", error);

        match severity {
            ErrorSeverity::Critical | ErrorSeverity::High => log_context.error(&message),
            ErrorSeverity::Medium => log_context.warn(&message),
            ErrorSeverity::Low => log_context.info(&message),
        }
    }
}

/// Application metrics and monitoring
pub struct MetricsLogger;

impl MetricsLogger {
    pub fn log_rpc_call(method: &str, duration_ms: u64, success: bool) {
        let context = LogContext::new("metrics", "rpc_call")
            .with_metadata("method", json!(method))
            .with_duration_ms(duration_ms)
            .with_metadata("success", json!(success));

        if success {
            context.debug(&format!("RPC call {} completed in {}ms", method, duration_ms));
        } else {
            context.warn(&format!("RPC call {} failed after {}ms", method, duration_ms));
        }
    }

    pub fn log_transaction_recorded(address: &str, tx_hash: &str, block_number: &str, direction: &str) {
        let context = LogContext::new("metrics", "transaction_recorded")
            .with_address(address)
            .with_transaction_hash(tx_hash)
            .with_block_number(block_number)
            .with_metadata("direction", json!(direction));

        context.info(&format!("New {} transaction {} saved for {}", direction, tx_hash, address));
    }

    pub fn log_poll_cycle(scanned: usize, recorded: usize, duration_ms: u64) {
        let context = LogContext::new("metrics", "poll_cycle")
            .with_metadata("scanned", json!(scanned))
            .with_metadata("recorded", json!(recorded))
            .with_duration_ms(duration_ms);

        context.debug(&format!(
            "Scanned {} transactions, recorded {} in {}ms",
            scanned, recorded, duration_ms
        ));
    }

    pub fn log_index_status(watched: usize, transactions: usize, progress: &str) {
        let context = LogContext::new("metrics", "index_status")
            .with_metadata("watched_addresses", json!(watched))
            .with_metadata("stored_transactions", json!(transactions))
            .with_block_number(progress);

        context.info(&format!(
            "Watching {} addresses, {} transactions stored, last parsed block {}",
            watched, transactions, progress
        ));
    }
}

/// Initialize structured logging for the application
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let level = LevelFilter::from_str(&config.level)?;
    let json_format = config.format == "json";

    // RUST_LOG still wins over the configured level
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(move |buf, record| {
            use std::io::Write;

            let line = record.args().to_string();
            let structured = serde_json::from_str::<Value>(&line).ok();

            match (structured, json_format) {
                (Some(value), true) => writeln!(buf, "{}", value),
                (Some(value), false) => writeln!(buf, "{}", serde_json::to_string_pretty(&value)?),
                (None, true) => writeln!(
                    buf,
                    "{}",
                    json!({
                        "timestamp": chrono::Utc::now().to_rfc3339(),
                        "level": record.level().to_string(),
                        "target": record.target(),
                        "message": line,
                    })
                ),
                (None, false) => writeln!(
                    buf,
                    "{} [{}] {}: {}",
                    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    line
                ),
            }
        })
        .try_init()?;

    info!("Structured logging initialized");
    Ok(())
}
