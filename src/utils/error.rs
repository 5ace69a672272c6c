use thiserror::Error;

#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Response parsing failed: {message}")]
    ParseError { message: String },

    #[error("Inference call '{operation}' failed: {message}")]
    InferenceError { operation: String, message: String },

    #[error("Project classification failed: {message}")]
    ClassificationError { message: String },

    #[error("Weight table for '{project_type}' sums to {sum:.4}, expected 1.0 ± {tolerance}")]
    WeightInvariantError {
        project_type: String,
        sum: f64,
        tolerance: f64,
    },

    #[error("Score aggregation failed: {message}")]
    AggregationError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Parsing,
    Classification,
    Aggregation,
    Configuration,
    Io,
}

impl JudgeError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            JudgeError::ApiError(_) => ErrorSeverity::Medium,
            JudgeError::IoError(_) => ErrorSeverity::High,
            JudgeError::SerializationError(_) => ErrorSeverity::Medium,
            JudgeError::ParseError { .. } => ErrorSeverity::Medium,
            JudgeError::InferenceError { .. } => ErrorSeverity::High,
            JudgeError::ClassificationError { .. } => ErrorSeverity::High,
            JudgeError::WeightInvariantError { .. } => ErrorSeverity::Critical,
            JudgeError::AggregationError { .. } => ErrorSeverity::High,
            JudgeError::ConfigError { .. } => ErrorSeverity::Critical,
            JudgeError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            JudgeError::ApiError(_) | JudgeError::InferenceError { .. } => ErrorCategory::Network,
            JudgeError::SerializationError(_) | JudgeError::ParseError { .. } => {
                ErrorCategory::Parsing
            }
            JudgeError::ClassificationError { .. } => ErrorCategory::Classification,
            JudgeError::AggregationError { .. } | JudgeError::WeightInvariantError { .. } => {
                ErrorCategory::Aggregation
            }
            JudgeError::ConfigError { .. } | JudgeError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            JudgeError::IoError(_) => ErrorCategory::Io,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            JudgeError::ApiError(_) => {
                "Check that the inference endpoint is reachable and the URL is correct".to_string()
            }
            JudgeError::IoError(_) => {
                "Check file paths and permissions for the bundle and output directory".to_string()
            }
            JudgeError::SerializationError(_) => {
                "Verify the analysis bundle is valid JSON".to_string()
            }
            JudgeError::ParseError { .. } => {
                "The model returned an unusable response; re-running the submission usually helps"
                    .to_string()
            }
            JudgeError::InferenceError { .. } => {
                "Retries are exhausted; check inference service health or raise the timeout/retry settings"
                    .to_string()
            }
            JudgeError::ClassificationError { .. } => {
                "Set raise_on_failure = false to fall back to balanced weighting, or re-run"
                    .to_string()
            }
            JudgeError::WeightInvariantError { project_type, .. } => format!(
                "Fix the [weights.{}] table so its values sum to 1.0",
                project_type
            ),
            JudgeError::AggregationError { .. } => {
                "Every category failed; inspect the per-category errors in the report".to_string()
            }
            JudgeError::ConfigError { .. } | JudgeError::InvalidConfigValueError { .. } => {
                "Review the configuration file against the documented settings".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            JudgeError::ApiError(_) | JudgeError::InferenceError { .. } => {
                "Could not reach the evaluation model. The run was aborted.".to_string()
            }
            JudgeError::ClassificationError { .. } => {
                "The submission could not be classified, so no scores were produced.".to_string()
            }
            JudgeError::AggregationError { .. } => {
                "No category produced a usable score for this submission.".to_string()
            }
            JudgeError::WeightInvariantError { .. }
            | JudgeError::ConfigError { .. }
            | JudgeError::InvalidConfigValueError { .. } => {
                format!("Configuration problem: {}", self)
            }
            other => format!("Judging failed: {}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, JudgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_critical() {
        let err = JudgeError::WeightInvariantError {
            project_type: "painkiller".to_string(),
            sum: 0.9,
            tolerance: 0.01,
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.category(), ErrorCategory::Aggregation);
        assert!(err.recovery_suggestion().contains("weights.painkiller"));
    }

    #[test]
    fn test_chain_level_errors_are_recoverable() {
        let err = JudgeError::ParseError {
            message: "no score found".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.category(), ErrorCategory::Parsing);
    }
}
