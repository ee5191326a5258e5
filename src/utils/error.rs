use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZiplinerError {
    #[error("Missing columns in input: {}", missing.join(", "))]
    SchemaError { missing: Vec<String> },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Postal dataset for {country} unavailable: {message}")]
    DatasetError { country: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Dataset,
    Network,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ZiplinerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SchemaError { .. } | Self::CsvError(_) => ErrorCategory::Input,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::DatasetError { .. } | Self::ZipError(_) => ErrorCategory::Dataset,
            Self::ApiError(_) => ErrorCategory::Network,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration | ErrorCategory::Dataset => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::SchemaError { .. } => {
                "The input header must contain source_zip, source_country, destination_zip and destination_country; check the delimiter too".to_string()
            }
            Self::CsvError(_) => "Check that the input file is valid delimited text".to_string(),
            Self::ConfigError { .. } | Self::ConfigValidationError { .. } => {
                "Check the TOML configuration file syntax".to_string()
            }
            Self::InvalidConfigValueError { field, .. } | Self::MissingConfigError { field } => {
                format!("Fix the '{}' setting in the config file or on the command line", field)
            }
            Self::DatasetError { country, .. } => format!(
                "Place the GeoNames dump {}.txt in the postal data directory or configure postal.download_url",
                country
            ),
            Self::ZipError(_) => "The downloaded postal archive is corrupt; retry the download".to_string(),
            Self::ApiError(_) => "Check network connectivity and retry".to_string(),
            Self::IoError(_) => "Check file paths and permissions".to_string(),
            Self::SerializationError(_) => "Report this as a bug".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Input file rejected: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Dataset => format!("Postal data unavailable: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ZiplinerError>;

/// Failure of a single routing-service request.
#[derive(Error, Debug)]
pub enum RouteFetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("routing service returned HTTP {status}")]
    Status { status: u16 },

    #[error("routing service answered {code}: {message}")]
    Service { code: String, message: String },

    #[error("routing service returned no route")]
    NoRoute,

    #[error("malformed routing response: {0}")]
    Malformed(String),
}

impl From<tokio::time::error::Elapsed> for RouteFetchError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::Timeout
    }
}

impl RouteFetchError {
    /// Transport failures, timeouts, 5xx, 408 and 429.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Status { status } => *status >= 500 || *status == 408 || *status == 429,
            Self::Service { .. } | Self::NoRoute | Self::Malformed(_) => false,
        }
    }
}

/// Errors that fail a single input row. The run continues with the next row.
#[derive(Error, Debug)]
pub enum RowError {
    #[error("Invalid country code: '{code}' (expected: {expected})")]
    InvalidCountry { code: String, expected: String },

    #[error("Empty ZIP in input")]
    EmptyZip,

    #[error("ZIP {zip} in {country} not found")]
    ZipNotFound { zip: String, country: String },

    #[error("Routing failed after {attempts} attempt(s) in {elapsed:?}: {last_error}")]
    Routing {
        attempts: u32,
        elapsed: Duration,
        #[source]
        last_error: RouteFetchError,
    },
}

impl RowError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCountry { .. } => "invalid_country",
            Self::EmptyZip => "empty_zip",
            Self::ZipNotFound { .. } => "zip_not_found",
            Self::Routing { .. } => "routing",
        }
    }
}
