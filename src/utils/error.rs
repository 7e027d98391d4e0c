use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SemifoldError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid version: {0}")]
    SemverError(#[from] semver::Error),

    #[error("Failed to parse {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("File or directory not found: {path}")]
    FileOrDirNotFound { path: PathBuf },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Git operation failed: {message}")]
    GitError { message: String },

    #[error("Command '{command}' failed: {reason}")]
    CommandError { command: String, reason: String },

    #[error("Failed to publish {package}: {reason}")]
    PublishError { package: String, reason: String },
}

/// Error categories for reporting and exit-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Config,
    Resolve,
    Git,
    Publish,
}

/// How severe an error is, from the operator's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SemifoldError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SemifoldError::IoError(_) | SemifoldError::FileOrDirNotFound { .. } => {
                ErrorCategory::Io
            }
            SemifoldError::MissingConfigError { .. }
            | SemifoldError::InvalidConfigValueError { .. }
            | SemifoldError::ConfigValidationError { .. } => ErrorCategory::Config,
            SemifoldError::ParseError { .. }
            | SemifoldError::SerializationError(_)
            | SemifoldError::SemverError(_) => ErrorCategory::Resolve,
            SemifoldError::GitError { .. } => ErrorCategory::Git,
            SemifoldError::CommandError { .. } | SemifoldError::PublishError { .. } => {
                ErrorCategory::Publish
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SemifoldError::MissingConfigError { .. }
            | SemifoldError::InvalidConfigValueError { .. }
            | SemifoldError::ConfigValidationError { .. } => ErrorSeverity::Medium,
            SemifoldError::ParseError { .. }
            | SemifoldError::SemverError(_)
            | SemifoldError::GitError { .. }
            | SemifoldError::CommandError { .. }
            | SemifoldError::PublishError { .. } => ErrorSeverity::High,
            SemifoldError::IoError(_)
            | SemifoldError::FileOrDirNotFound { .. }
            | SemifoldError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SemifoldError::IoError(_) => {
                "Check file permissions and that the repository path is accessible".to_string()
            }
            SemifoldError::FileOrDirNotFound { path } => format!(
                "Make sure '{}' exists, or fix the package path in semifold.toml",
                path.display()
            ),
            SemifoldError::ParseError { path, .. } => {
                format!("Fix the syntax in '{}' and run again", path.display())
            }
            SemifoldError::SemverError(_) => {
                "Manifest versions must be valid semver (e.g. 1.2.3)".to_string()
            }
            SemifoldError::MissingConfigError { field } => {
                format!("Add '{}' to your semifold.toml", field)
            }
            SemifoldError::InvalidConfigValueError { field, .. }
            | SemifoldError::ConfigValidationError { field, .. } => {
                format!("Correct the '{}' setting in semifold.toml", field)
            }
            SemifoldError::GitError { .. } => {
                "Check that git is installed and the repository has no conflicting state"
                    .to_string()
            }
            SemifoldError::CommandError { command, .. } => {
                format!("Run '{}' manually to see the full output", command)
            }
            SemifoldError::PublishError { package, .. } => format!(
                "Fix the publish configuration for '{}' and retry",
                package
            ),
            SemifoldError::SerializationError(_) => {
                "Check that the manifest is well-formed JSON".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Io => format!("File system problem: {}", self),
            ErrorCategory::Config => format!("Configuration problem: {}", self),
            ErrorCategory::Resolve => format!("Could not resolve package versions: {}", self),
            ErrorCategory::Git => format!("Git problem: {}", self),
            ErrorCategory::Publish => format!("Release step failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, SemifoldError>;
