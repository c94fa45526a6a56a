use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConeError {
    #[error("Usage error: {message}")]
    Usage { message: String },

    #[error("Cannot parse input coordinates '{input}': {reason}")]
    CoordinateParse { input: String, reason: String },

    #[error("Cannot resolve object name '{name}': {reason}")]
    NameResolution { name: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service {url} returned HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Query to {url} failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<ConeError>,
    },

    #[error("VOTable decoding failed: {message}")]
    Decode { message: String },

    #[error("All {total} sub-queries in the batch failed")]
    BatchFailed { total: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV output error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Missing configuration: {field}")]
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
    Usage,
    Network,
    Data,
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

impl ConeError {
    pub fn usage(message: impl Into<String>) -> Self {
        ConeError::Usage {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ConeError::Usage { .. }
            | ConeError::CoordinateParse { .. }
            | ConeError::NameResolution { .. } => ErrorCategory::Usage,
            ConeError::Http(_)
            | ConeError::HttpStatus { .. }
            | ConeError::RetriesExhausted { .. }
            | ConeError::BatchFailed { .. } => ErrorCategory::Network,
            ConeError::Decode { .. } => ErrorCategory::Data,
            ConeError::TomlError(_)
            | ConeError::MissingConfigError { .. }
            | ConeError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ConeError::IoError(_) | ConeError::CsvError(_) | ConeError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Data => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Usage | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ConeError::Usage { message } => message.clone(),
            ConeError::CoordinateParse { input, .. } => {
                format!("Could not understand the position '{}'", input)
            }
            ConeError::NameResolution { name, .. } => {
                format!("Could not find an object called '{}'", name)
            }
            ConeError::RetriesExhausted { url, attempts, .. } => {
                format!("The service at {} did not answer after {} attempt(s)", url, attempts)
            }
            ConeError::HttpStatus { url, status } => {
                format!("The service at {} answered with HTTP {}", url, status)
            }
            ConeError::BatchFailed { total } => {
                format!("None of the {} cone searches succeeded", total)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Usage => {
                "Give one radius or one radius per position, and positions as \"RA Dec\" in degrees or sexagesimal, or an object name with name resolution enabled"
            }
            ErrorCategory::Network => {
                "Check the service URL and network access, or raise the timeout/retry settings"
            }
            ErrorCategory::Data => "The service response was not a readable VOTable; inspect the raw response",
            ErrorCategory::Configuration => "Check the configuration file and command line flags",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, ConeError>;
