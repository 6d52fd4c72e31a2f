use thiserror::Error;

/// Structural violations of the two CMC output grammars.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("module table header is missing the {marker} column marker")]
    MissingColumnMarker { marker: &'static str },

    #[error("column marker {marker} at offset {offset} is out of order")]
    MisorderedColumnMarker { marker: &'static str, offset: usize },

    #[error("malformed error block starting at line {line}: {reason}")]
    MalformedErrorBlock { line: usize, reason: String },
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Connection to {host} failed: {message}")]
    ConnectionError { host: String, message: String },

    #[error("Command '{command}' failed: {message}")]
    CommandExecutionError { command: String, message: String },

    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Sink error: {message}")]
    SinkError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Remote,
    Parsing,
    Delivery,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MonitorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MonitorError::ConnectionError { .. } => ErrorCategory::Network,
            MonitorError::CommandExecutionError { .. } => ErrorCategory::Remote,
            MonitorError::ParseError(_) | MonitorError::SerializationError(_) => {
                ErrorCategory::Parsing
            }
            MonitorError::SinkError { .. } => ErrorCategory::Delivery,
            MonitorError::ConfigError { .. }
            | MonitorError::MissingConfigError { .. }
            | MonitorError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            MonitorError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MonitorError::ParseError(ParseError::MalformedErrorBlock { .. }) => ErrorSeverity::Low,
            MonitorError::CommandExecutionError { .. } | MonitorError::ParseError(_) => {
                ErrorSeverity::Medium
            }
            MonitorError::ConnectionError { .. }
            | MonitorError::SinkError { .. }
            | MonitorError::SerializationError(_) => ErrorSeverity::High,
            MonitorError::ConfigError { .. }
            | MonitorError::MissingConfigError { .. }
            | MonitorError::InvalidConfigValueError { .. }
            | MonitorError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MonitorError::ConnectionError { host, .. } => {
                format!("Could not open a session to chassis {}", host)
            }
            MonitorError::CommandExecutionError { command, .. } => {
                format!("The chassis rejected command '{}'", command)
            }
            MonitorError::ParseError(e) => format!("Unexpected chassis output: {}", e),
            MonitorError::SinkError { .. } => "Could not deliver metrics to Zabbix".to_string(),
            MonitorError::MissingConfigError { field } => {
                format!("Required setting '{}' is not set", field)
            }
            MonitorError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the chassis address, port and credentials",
            ErrorCategory::Remote => "Run the command manually on the CMC and inspect its output",
            ErrorCategory::Parsing => "Compare the CMC firmware output format with the expected layout",
            ErrorCategory::Delivery => "Check that the Zabbix trapper is reachable and the host key exists",
            ErrorCategory::Configuration => "Review the command line flags and the configuration file",
            ErrorCategory::System => "Check local permissions and available resources",
        }
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
