use thiserror::Error;

/// Errors surfaced by the conversation engine to its callers.
///
/// Scoring itself is total over strings; these only describe caller misuse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for `{field}`: {why}")]
    Invalid { field: String, why: String },
}

impl ConfigError {
    pub fn invalid(field: &str, why: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            why: why.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message() {
        let err = AnalysisError::InvalidState("conversation is closed".to_string());
        assert_eq!(err.to_string(), "invalid state: conversation is closed");
    }

    #[test]
    fn test_config_invalid_names_field() {
        let err = ConfigError::invalid("escalation.threshold", "must be at least 1");
        let message = err.to_string();
        assert!(message.contains("escalation.threshold"));
        assert!(message.contains("must be at least 1"));
    }

    #[test]
    fn test_parse_error_wraps_yaml() {
        let yaml_err = serde_yaml::from_str::<u32>("not a number").unwrap_err();
        let err: ConfigError = yaml_err.into();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
