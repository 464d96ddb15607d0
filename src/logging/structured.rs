use std::collections::BTreeMap;
use tracing::{debug, error, info, trace, warn};

/// Context information for log messages
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Component name (e.g., "connector", "scheduler", "persistence")
    pub component: String,
    /// EVSE the message relates to
    pub evse_id: Option<i32>,
    /// Connector the message relates to
    pub connector_id: Option<i32>,
    /// Transaction the message relates to
    pub transaction_id: Option<String>,
    /// Additional context fields
    pub extra_fields: BTreeMap<String, String>,
}

impl LogContext {
    /// Create a new log context
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
            evse_id: None,
            connector_id: None,
            transaction_id: None,
            extra_fields: BTreeMap::new(),
        }
    }

    /// Set EVSE and connector ids
    pub fn with_connector(mut self, evse_id: i32, connector_id: i32) -> Self {
        self.evse_id = Some(evse_id);
        self.connector_id = Some(connector_id);
        self
    }

    /// Set transaction id
    pub fn with_transaction_id(mut self, transaction_id: String) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    /// Add extra field
    pub fn with_field(mut self, key: &str, value: String) -> Self {
        self.extra_fields.insert(key.to_string(), value);
        self
    }
}

/// Structured logger with context
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    pub(crate) context: LogContext,
}

impl StructuredLogger {
    /// Create a new structured logger with context
    pub fn new(context: LogContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &LogContext {
        &self.context
    }

    /// Logger for the same component with additional connector ids
    pub fn for_connector(&self, evse_id: i32, connector_id: i32) -> Self {
        Self::new(self.context.clone().with_connector(evse_id, connector_id))
    }

    /// Same context, tagged with the transaction being worked on. An empty
    /// id leaves the context untouched.
    pub fn for_transaction(&self, transaction_id: &str) -> Self {
        if transaction_id.is_empty() {
            return self.clone();
        }
        Self::new(
            self.context
                .clone()
                .with_transaction_id(transaction_id.to_string()),
        )
    }

    /// Log an info message with context
    pub fn info(&self, message: &str) {
        let fields = self.format_fields();
        info!(%fields, "{}", message);
    }
    /// Log a warning message with context
    pub fn warn(&self, message: &str) {
        let fields = self.format_fields();
        warn!(%fields, "{}", message);
    }
    /// Log an error message with context
    pub fn error(&self, message: &str) {
        let fields = self.format_fields();
        error!(%fields, "{}", message);
    }
    /// Log a debug message with context
    pub fn debug(&self, message: &str) {
        let fields = self.format_fields();
        debug!(%fields, "{}", message);
    }
    /// Log a trace message with context
    pub fn trace(&self, message: &str) {
        let fields = self.format_fields();
        trace!(%fields, "{}", message);
    }

    /// Format context fields for logging
    fn format_fields(&self) -> String {
        let mut fields = vec![format!("component={}", self.context.component)];
        if let Some(evse_id) = self.context.evse_id {
            fields.push(format!("evse_id={}", evse_id));
        }
        if let Some(connector_id) = self.context.connector_id {
            fields.push(format!("connector_id={}", connector_id));
        }
        if let Some(ref transaction_id) = self.context.transaction_id {
            fields.push(format!("transaction_id={}", transaction_id));
        }
        for (key, value) in &self.context.extra_fields {
            fields.push(format!("{}={}", key, value));
        }
        fields.join(",")
    }
}

/// Create a logger for a specific component
pub fn get_logger(component: &str) -> StructuredLogger {
    StructuredLogger::new(LogContext::new(component))
}

/// Create a logger with full context
pub fn get_logger_with_context(context: LogContext) -> StructuredLogger {
    StructuredLogger::new(context)
}
