//! Error types for strimzi-doctor operations

use thiserror::Error;

/// Errors that can occur while inspecting or operating Strimzi resources
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Named resource or secret is absent
    #[error("{kind} '{namespace}/{name}' not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    /// Create requested for a resource that already exists
    #[error("{kind} '{namespace}/{name}' already exists")]
    AlreadyExists {
        kind: String,
        namespace: String,
        name: String,
    },

    /// A locally checked precondition did not hold
    #[error(
        "cannot {action} {kind} '{namespace}/{name}': requires state '{expected}', currently '{actual}'"
    )]
    PreconditionFailed {
        action: String,
        kind: String,
        namespace: String,
        name: String,
        expected: String,
        actual: String,
    },

    /// Certificate bytes could not be decoded
    #[error("certificate unreadable: {0}")]
    CertificateParse(String),
}

impl Error {
    /// Shorthand for a `NotFound` error
    pub fn not_found(kind: &str, namespace: &str, name: &str) -> Self {
        Self::NotFound {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// Shorthand for an `AlreadyExists` error
    pub fn already_exists(kind: &str, namespace: &str, name: &str) -> Self {
        Self::AlreadyExists {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// Result type alias for strimzi-doctor operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_resource() {
        let err = Error::not_found("KafkaRebalance", "kafka", "full-rebalance");
        assert_eq!(
            err.to_string(),
            "KafkaRebalance 'kafka/full-rebalance' not found"
        );
    }

    #[test]
    fn test_precondition_message_includes_states() {
        let err = Error::PreconditionFailed {
            action: "approve".to_string(),
            kind: "KafkaRebalance".to_string(),
            namespace: "kafka".to_string(),
            name: "full-rebalance".to_string(),
            expected: "ProposalReady".to_string(),
            actual: "Rebalancing".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ProposalReady"));
        assert!(msg.contains("Rebalancing"));
        assert!(msg.contains("full-rebalance"));
    }
}
