//! Configuration errors.
//!
//! Raised before any graph work starts. Everything else in the crate is
//! either `anyhow::Result` (I/O) or degrades to an empty result.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid exclusion regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Algorithm {0} is not enabled in algorithms_to_show")]
    DisabledAlgorithm(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ConfigError::UnknownAlgorithm("Foo".into());
        assert_eq!(err.to_string(), "Unknown algorithm: Foo");

        let err = ConfigError::DisabledAlgorithm("HITS".into());
        assert_eq!(
            err.to_string(),
            "Algorithm HITS is not enabled in algorithms_to_show"
        );

        let err = ConfigError::InvalidParameter {
            name: "resolution",
            reason: "must be finite and positive".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid parameter resolution: must be finite and positive"
        );

        let source = regex::Regex::new("(").unwrap_err();
        let err = ConfigError::InvalidRegex {
            pattern: "(".into(),
            source,
        };
        assert!(err.to_string().starts_with("Invalid exclusion regex '('"));
    }
}
