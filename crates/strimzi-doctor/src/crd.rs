//! Strimzi Custom Resource Definitions
//!
//! This module defines the typed views of the Strimzi custom resources this
//! tool inspects and annotates: `Kafka`, `KafkaTopic`, `KafkaUser`,
//! `KafkaConnector` and `KafkaRebalance`. Only the fields the health/state
//! model reads are declared; the reconciling operator owns the full schema.
//!
//! All resources live in the `kafka.strimzi.io/v1beta2` API group and are
//! namespaced. Every status carries the shared [`Condition`] list that the
//! state resolver reduces.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// API group of all Strimzi resources
pub const STRIMZI_GROUP: &str = "kafka.strimzi.io";

/// Label binding a namespaced resource (topic, user, connector) to its cluster
pub const CLUSTER_LABEL: &str = "strimzi.io/cluster";

/// Condition describing one aspect of a resource's state
///
/// Conditions arrive unordered from the API server; see
/// [`crate::conditions::resolve`] for the canonical reduction.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (e.g. "Ready", "ProposalReady", "NotReady")
    #[serde(rename = "type")]
    pub condition_type: String,

    /// Status of the condition: "True", "False" or "Unknown"
    pub status: String,

    /// Machine-readable reason for the condition
    pub reason: Option<String>,

    /// Human-readable message
    pub message: Option<String>,

    /// Last time the condition transitioned
    pub last_transition_time: Option<String>,
}

impl Condition {
    /// Build a condition with the given type and status, no detail
    pub fn new(condition_type: &str, status: &str) -> Self {
        Self {
            condition_type: condition_type.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    /// Attach a reason and message to the condition
    pub fn with_detail(mut self, reason: &str, message: &str) -> Self {
        self.reason = Some(reason.to_string());
        self.message = Some(message.to_string());
        self
    }
}

// ============================================================================
// Kafka
// ============================================================================

/// Kafka cluster custom resource
///
/// Represents a Strimzi-managed Kafka cluster. The spec here is the subset a
/// fleet inspection needs; the operator reconciles the full schema.
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kafka.strimzi.io",
    version = "v1beta2",
    kind = "Kafka",
    namespaced,
    status = "KafkaStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct KafkaSpec {
    /// Broker configuration
    pub kafka: KafkaClusterSpec,

    /// Entity operator (topic/user operators) configuration, free-form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_operator: Option<serde_json::Value>,

    /// Cruise Control deployment toggle; rebalances require it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cruise_control: Option<serde_json::Value>,
}

/// Broker-level portion of the Kafka spec
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KafkaClusterSpec {
    /// Kafka version (e.g. "3.8.0")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Number of broker replicas (absent when node pools are used)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Listener configuration, free-form
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub listeners: Vec<serde_json::Value>,
}

/// Status of a Kafka cluster resource
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KafkaStatus {
    /// Conditions describing cluster state
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Generation last observed by the operator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Kafka cluster id as reported by the brokers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,

    /// Bootstrap addresses per listener
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub listeners: Vec<ListenerStatus>,
}

/// Advertised addresses of one listener
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListenerStatus {
    /// Listener name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// host:port bootstrap servers string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_servers: Option<String>,
}

/// Name of the secret holding a cluster's CA certificate
pub fn cluster_ca_cert_secret(cluster: &str) -> String {
    format!("{cluster}-cluster-ca-cert")
}

/// Name of the secret holding a cluster's clients CA certificate
pub fn clients_ca_cert_secret(cluster: &str) -> String {
    format!("{cluster}-clients-ca-cert")
}

// ============================================================================
// KafkaTopic
// ============================================================================

/// Kafka topic custom resource
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kafka.strimzi.io",
    version = "v1beta2",
    kind = "KafkaTopic",
    namespaced,
    status = "KafkaTopicStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct KafkaTopicSpec {
    /// Number of partitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitions: Option<i32>,

    /// Replication factor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Topic-level configuration overrides
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, serde_json::Value>,

    /// Actual topic name when it differs from the resource name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
}

/// Status of a KafkaTopic resource
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KafkaTopicStatus {
    /// Conditions describing topic state
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Generation last observed by the operator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Topic name in the Kafka cluster
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,

    /// Topic id in the Kafka cluster
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
}

// ============================================================================
// KafkaUser
// ============================================================================

/// Kafka user custom resource
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kafka.strimzi.io",
    version = "v1beta2",
    kind = "KafkaUser",
    namespaced,
    status = "KafkaUserStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct KafkaUserSpec {
    /// Authentication mechanism
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<UserAuthenticationSpec>,

    /// Authorization rules, free-form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization: Option<serde_json::Value>,

    /// Quota configuration, free-form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quotas: Option<serde_json::Value>,
}

/// Authentication mechanism for a Kafka user
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserAuthenticationSpec {
    /// Mechanism type: "tls", "tls-external", "scram-sha-512"
    #[serde(rename = "type")]
    pub auth_type: String,
}

/// Status of a KafkaUser resource
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KafkaUserStatus {
    /// Conditions describing user state
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Generation last observed by the operator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Principal name in the Kafka cluster
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Secret holding the user's credentials
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

// ============================================================================
// KafkaConnector
// ============================================================================

/// Kafka Connect connector custom resource
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kafka.strimzi.io",
    version = "v1beta2",
    kind = "KafkaConnector",
    namespaced,
    status = "KafkaConnectorStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct KafkaConnectorSpec {
    /// Connector class name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    /// Maximum number of tasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks_max: Option<i32>,

    /// Connector configuration
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, serde_json::Value>,

    /// Desired state: "running", "paused" or "stopped"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Status of a KafkaConnector resource
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KafkaConnectorStatus {
    /// Conditions describing connector state
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Generation last observed by the operator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Runtime status mirrored from the Connect REST API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_status: Option<ConnectorRuntimeStatus>,

    /// Number of tasks the runtime reports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks_max: Option<i32>,
}

/// Connector runtime document as mirrored from the Connect REST API
///
/// Field names follow the Connect wire format, not camelCase.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ConnectorRuntimeStatus {
    /// Connector name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Top-level connector state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector: Option<ConnectorRuntimeState>,

    /// Per-task runtime state
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<ConnectorTaskStatus>,
}

/// Top-level runtime state of a connector
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ConnectorRuntimeState {
    /// State string: "RUNNING", "PAUSED", "FAILED", ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Worker the connector runs on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,
}

/// Runtime state of one connector task
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ConnectorTaskStatus {
    /// Task id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,

    /// State string: "RUNNING", "PAUSED", "FAILED", ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Worker the task runs on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,

    /// Stack trace of the last failure, non-empty only when the task failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

// ============================================================================
// KafkaRebalance
// ============================================================================

/// Kafka rebalance custom resource
///
/// Requests a Cruise Control optimization. The lifecycle is driven by the
/// external operator; this tool only creates the resource, observes its
/// conditions and writes the `strimzi.io/rebalance` annotation.
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kafka.strimzi.io",
    version = "v1beta2",
    kind = "KafkaRebalance",
    namespaced,
    status = "KafkaRebalanceStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct KafkaRebalanceSpec {
    /// Rebalance mode: "full", "add-brokers" or "remove-brokers"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Optimization goals, in priority order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub goals: Vec<String>,

    /// Brokers being added or removed, for the non-full modes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub brokers: Vec<i32>,

    /// Allow goals that Cruise Control considers hard to be skipped
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_hard_goal_check: bool,
}

/// Status of a KafkaRebalance resource
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KafkaRebalanceStatus {
    /// Conditions describing the rebalance phase
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Generation last observed by the operator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Cruise Control session id for an in-flight rebalance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Proposal summary computed by Cruise Control
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization_result: Option<serde_json::Value>,
}
