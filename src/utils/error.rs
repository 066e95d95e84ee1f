use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Malformed record data at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unknown taxonomy level: {level}")]
    UnknownLevelError { level: String },

    #[error("Unknown class label: {class}")]
    UnknownClassError { class: String },

    #[error("Record '{record_id}' is missing required field '{field}'")]
    MissingFieldError { record_id: String, field: String },

    #[error("Record '{record_id}' has invalid {field} '{value}': {reason}")]
    InvalidFieldError {
        record_id: String,
        field: String,
        value: String,
        reason: String,
    },

    #[error("Duplicate record identifier: {id}")]
    DuplicateIdentifierError { id: String },

    #[error("Record not found: {id}")]
    NotFoundError { id: String },

    #[error("Cannot compute {level} diversity of an empty population")]
    EmptyPopulationError { level: String },

    #[error("Internal consistency violation for record '{record_id}': {message}")]
    InvariantViolation { record_id: String, message: String },

    #[error("Worker task failed: {message}")]
    WorkerError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Configuration,
    Input,
    Invariant,
    Query,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TaxonomyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TaxonomyError::ConfigError { .. }
            | TaxonomyError::InvalidConfigValueError { .. }
            | TaxonomyError::UnknownClassError { .. } => ErrorCategory::Configuration,
            TaxonomyError::MissingFieldError { .. }
            | TaxonomyError::InvalidFieldError { .. }
            | TaxonomyError::DuplicateIdentifierError { .. } => ErrorCategory::Input,
            TaxonomyError::InvariantViolation { .. } => ErrorCategory::Invariant,
            TaxonomyError::UnknownLevelError { .. }
            | TaxonomyError::NotFoundError { .. }
            | TaxonomyError::EmptyPopulationError { .. } => ErrorCategory::Query,
            TaxonomyError::IoError(_)
            | TaxonomyError::SerializationError(_)
            | TaxonomyError::ParseError { .. }
            | TaxonomyError::WorkerError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Query => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Invariant | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 設定錯誤與不變量違反會中止整個分析流程；單筆輸入錯誤只記錄在批次報告中
    pub fn is_fatal(&self) -> bool {
        !matches!(self.category(), ErrorCategory::Input)
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            TaxonomyError::IoError(_) => "Check that the input file exists and is readable",
            TaxonomyError::SerializationError(_) | TaxonomyError::ParseError { .. } => {
                "Make sure the input is a JSON array or newline-delimited JSON of robot records"
            }
            TaxonomyError::ConfigError { .. }
            | TaxonomyError::InvalidConfigValueError { .. }
            | TaxonomyError::UnknownClassError { .. } => {
                "Fix the taxonomy registry definition and run again"
            }
            TaxonomyError::UnknownLevelError { .. } => {
                "Use one of: domain, kingdom, class, order, family, genus, species, primary_role, region"
            }
            TaxonomyError::MissingFieldError { .. } | TaxonomyError::InvalidFieldError { .. } => {
                "Correct the record in the input data; other records are unaffected"
            }
            TaxonomyError::DuplicateIdentifierError { .. } => {
                "Remove or rename the duplicated record identifier"
            }
            TaxonomyError::NotFoundError { .. } => "Check the record identifier",
            TaxonomyError::EmptyPopulationError { .. } => {
                "Classify at least one record before computing diversity"
            }
            TaxonomyError::InvariantViolation { .. } => {
                "The rule tables produce inconsistent labels; report this as a bug"
            }
            TaxonomyError::WorkerError { .. } => "Retry with fewer workers",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid taxonomy registry: {}", self),
            ErrorCategory::Input => format!("Rejected record: {}", self),
            ErrorCategory::Invariant => format!("Internal classification error: {}", self),
            ErrorCategory::Query => format!("Query failed: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, TaxonomyError>;
