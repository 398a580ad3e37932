//! Concrete health checkers, one per resource kind
//!
//! Every checker follows the same shape: list its kind within the context's
//! scope, resolve each resource's state through the shared condition
//! resolver, classify, append. A malformed or status-less resource becomes a
//! WARNING/ERROR finding, never a skipped entry and never an abort.

use crate::certs::{CertVerdict, CertificateExpiryEvaluator};
use crate::conditions::{self, ResolvedState, STATE_NOT_READY};
use crate::crd::{clients_ca_cert_secret, cluster_ca_cert_secret, Condition};
use crate::error::Result;
use crate::health::report::{HealthCheckResult, HealthFinding, Severity};
use crate::health::{HealthCheckContext, HealthChecker};
use async_trait::async_trait;
use kube::ResourceExt;

/// Resolved labels that indicate outright failure rather than a transitional
/// or indeterminate state
const FAILURE_LABELS: [&str; 2] = [STATE_NOT_READY, "Error"];

/// Classify a resolved state: ready → OK, failure labels → ERROR, anything
/// else (including "Unknown") → WARNING.
fn classify(state: &ResolvedState) -> Severity {
    if state.is_ready() {
        Severity::Ok
    } else if FAILURE_LABELS.contains(&state.label.as_str()) {
        Severity::Error
    } else {
        Severity::Warning
    }
}

/// Build the standard condition-derived finding for one resource
fn condition_finding(
    kind: &str,
    namespace: &str,
    name: &str,
    conditions: Option<&Vec<Condition>>,
) -> HealthFinding {
    let state = conditions::resolve_opt(conditions);
    let severity = classify(&state);
    let summary = match conditions {
        None => "no status reported yet (state Unknown)".to_string(),
        Some(_) => format!("state {state}"),
    };
    HealthFinding::new(kind, namespace, name, severity, summary)
}

fn namespace_of(resource: &impl ResourceExt) -> String {
    resource.namespace().unwrap_or_else(|| "default".to_string())
}

// ============================================================================
// Kafka
// ============================================================================

/// Checks Kafka cluster resources
pub struct KafkaHealthChecker;

#[async_trait]
impl HealthChecker for KafkaHealthChecker {
    fn name(&self) -> &'static str {
        "kafka"
    }

    async fn check(&self, ctx: &HealthCheckContext, result: &mut HealthCheckResult) -> Result<()> {
        let kafkas = ctx.store.list_kafkas(ctx.namespace_filter()).await?;
        for kafka in kafkas {
            let name = kafka.name_any();
            // The cluster filter matches the Kafka resource's own name; the
            // strimzi.io/cluster label only exists on dependent resources.
            if let Some(cluster) = &ctx.cluster {
                if &name != cluster {
                    continue;
                }
            }
            result.append(condition_finding(
                "Kafka",
                &namespace_of(&kafka),
                &name,
                kafka.status.as_ref().map(|s| &s.conditions),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// KafkaTopic
// ============================================================================

/// Checks KafkaTopic resources
pub struct TopicHealthChecker;

#[async_trait]
impl HealthChecker for TopicHealthChecker {
    fn name(&self) -> &'static str {
        "topic"
    }

    async fn check(&self, ctx: &HealthCheckContext, result: &mut HealthCheckResult) -> Result<()> {
        let topics = ctx
            .store
            .list_topics(ctx.namespace_filter(), ctx.cluster_selector().as_deref())
            .await?;
        for topic in topics {
            result.append(condition_finding(
                "KafkaTopic",
                &namespace_of(&topic),
                &topic.name_any(),
                topic.status.as_ref().map(|s| &s.conditions),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// KafkaUser
// ============================================================================

/// Checks KafkaUser resources
pub struct UserHealthChecker;

#[async_trait]
impl HealthChecker for UserHealthChecker {
    fn name(&self) -> &'static str {
        "user"
    }

    async fn check(&self, ctx: &HealthCheckContext, result: &mut HealthCheckResult) -> Result<()> {
        let users = ctx
            .store
            .list_users(ctx.namespace_filter(), ctx.cluster_selector().as_deref())
            .await?;
        for user in users {
            result.append(condition_finding(
                "KafkaUser",
                &namespace_of(&user),
                &user.name_any(),
                user.status.as_ref().map(|s| &s.conditions),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// KafkaConnector
// ============================================================================

/// Checks KafkaConnector resources, including task-level failure detail
pub struct ConnectorHealthChecker;

#[async_trait]
impl HealthChecker for ConnectorHealthChecker {
    fn name(&self) -> &'static str {
        "connector"
    }

    async fn check(&self, ctx: &HealthCheckContext, result: &mut HealthCheckResult) -> Result<()> {
        let connectors = ctx
            .store
            .list_connectors(ctx.namespace_filter(), ctx.cluster_selector().as_deref())
            .await?;
        for connector in connectors {
            let namespace = namespace_of(&connector);
            let name = connector.name_any();
            let mut finding = condition_finding(
                "KafkaConnector",
                &namespace,
                &name,
                connector.status.as_ref().map(|s| &s.conditions),
            );

            // A failed task escalates the finding even when the top-level
            // condition still reads healthy; the runtime document is the
            // only place the failure shows up.
            if let Some(runtime) = connector
                .status
                .as_ref()
                .and_then(|s| s.connector_status.as_ref())
            {
                for task in &runtime.tasks {
                    let Some(trace) = task.trace.as_deref().filter(|t| !t.is_empty()) else {
                        continue;
                    };
                    let first_line = trace.lines().next().unwrap_or(trace);
                    let task_id = task
                        .id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "?".to_string());
                    finding = HealthFinding::new(
                        "KafkaConnector",
                        &namespace,
                        &name,
                        Severity::Error,
                        format!("task {task_id} failed: {first_line}"),
                    );
                    break;
                }
            }

            result.append(finding);
        }
        Ok(())
    }
}

// ============================================================================
// CA certificates
// ============================================================================

/// Checks each Kafka cluster's CA certificate secrets for expiry, both the
/// cluster CA and the clients CA
pub struct CertificateHealthChecker {
    evaluator: CertificateExpiryEvaluator,
}

impl CertificateHealthChecker {
    /// Build the checker with the given warning threshold in days
    pub fn new(warning_days: i64) -> Self {
        Self {
            evaluator: CertificateExpiryEvaluator::new(warning_days),
        }
    }

    async fn check_ca_secret(
        &self,
        ctx: &HealthCheckContext,
        namespace: &str,
        secret_name: &str,
        result: &mut HealthCheckResult,
    ) -> Result<()> {
        let secret = match ctx.store.get_secret(namespace, secret_name).await? {
            Some(secret) => secret,
            None => {
                result.append(HealthFinding::new(
                    "Secret",
                    namespace,
                    secret_name,
                    Severity::Warning,
                    "CA secret not found",
                ));
                return Ok(());
            }
        };

        let entries = secret.data.unwrap_or_default();
        let mut all_ok = true;
        for (key, bytes) in entries.iter().filter(|(k, _)| k.ends_with(".crt")) {
            match self.evaluator.evaluate(&bytes.0) {
                CertVerdict::Ok { .. } => {}
                CertVerdict::ExpiringSoon { days_remaining, .. } => {
                    all_ok = false;
                    result.append(HealthFinding::new(
                        "Secret",
                        namespace,
                        secret_name,
                        Severity::Warning,
                        format!("'{key}' expires in {days_remaining} day(s)"),
                    ));
                }
                CertVerdict::Expired { info } => {
                    all_ok = false;
                    result.append(HealthFinding::new(
                        "Secret",
                        namespace,
                        secret_name,
                        Severity::Error,
                        format!("'{key}' expired at {}", info.not_after.to_rfc3339()),
                    ));
                }
                CertVerdict::Unreadable { reason } => {
                    all_ok = false;
                    result.append(HealthFinding::new(
                        "Secret",
                        namespace,
                        secret_name,
                        Severity::Warning,
                        format!("'{key}' certificate unreadable: {reason}"),
                    ));
                }
            }
        }

        if all_ok {
            result.append(HealthFinding::new(
                "Secret",
                namespace,
                secret_name,
                Severity::Ok,
                "CA certificates valid",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl HealthChecker for CertificateHealthChecker {
    fn name(&self) -> &'static str {
        "certificates"
    }

    async fn check(&self, ctx: &HealthCheckContext, result: &mut HealthCheckResult) -> Result<()> {
        let kafkas = ctx.store.list_kafkas(ctx.namespace_filter()).await?;
        for kafka in kafkas {
            let cluster = kafka.name_any();
            if let Some(filter) = &ctx.cluster {
                if &cluster != filter {
                    continue;
                }
            }
            let namespace = namespace_of(&kafka);
            for secret_name in [
                cluster_ca_cert_secret(&cluster),
                clients_ca_cert_secret(&cluster),
            ] {
                self.check_ca_secret(ctx, &namespace, &secret_name, result)
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{STATUS_FALSE, STATUS_TRUE};
    use crate::crd::{
        ConnectorRuntimeStatus, ConnectorTaskStatus, Kafka, KafkaConnector, KafkaConnectorSpec,
        KafkaConnectorStatus, KafkaSpec, KafkaStatus, KafkaTopic, KafkaTopicSpec,
        KafkaTopicStatus, KafkaUser, KafkaUserSpec, KafkaUserStatus,
    };
    use crate::store::MemoryStore;
    use k8s_openapi::api::core::v1::Secret;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use k8s_openapi::ByteString;
    use std::sync::Arc;

    fn meta(namespace: &str, name: &str, cluster: Option<&str>) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: cluster.map(|c| {
                [(crate::crd::CLUSTER_LABEL.to_string(), c.to_string())]
                    .into_iter()
                    .collect()
            }),
            ..Default::default()
        }
    }

    fn kafka(namespace: &str, name: &str, conditions: Vec<Condition>) -> Kafka {
        Kafka {
            metadata: meta(namespace, name, None),
            spec: KafkaSpec::default(),
            status: Some(KafkaStatus {
                conditions,
                ..Default::default()
            }),
        }
    }

    fn topic(namespace: &str, name: &str, status: Option<KafkaTopicStatus>) -> KafkaTopic {
        KafkaTopic {
            metadata: meta(namespace, name, Some("prod")),
            spec: KafkaTopicSpec::default(),
            status,
        }
    }

    fn connector(namespace: &str, name: &str, status: KafkaConnectorStatus) -> KafkaConnector {
        KafkaConnector {
            metadata: meta(namespace, name, Some("prod")),
            spec: KafkaConnectorSpec::default(),
            status: Some(status),
        }
    }

    fn ctx(store: MemoryStore) -> HealthCheckContext {
        HealthCheckContext::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_topic_without_status_is_a_warning_not_omitted() {
        let store = MemoryStore::new();
        store.add_topic(topic("kafka", "orders", None));

        let mut result = HealthCheckResult::new();
        TopicHealthChecker
            .check(&ctx(store), &mut result)
            .await
            .unwrap();

        assert_eq!(result.findings().len(), 1);
        let finding = &result.findings()[0];
        assert_eq!(finding.severity, Severity::Warning);
        assert!(finding.summary.contains("no status"));
    }

    #[tokio::test]
    async fn test_ready_kafka_is_ok_and_not_ready_is_error() {
        let store = MemoryStore::new();
        store.add_kafka(kafka(
            "kafka",
            "prod",
            vec![Condition::new("Ready", STATUS_TRUE)],
        ));
        store.add_kafka(kafka(
            "kafka",
            "staging",
            vec![Condition::new("Ready", STATUS_FALSE).with_detail("KafkaError", "broker down")],
        ));

        let mut result = HealthCheckResult::new();
        KafkaHealthChecker
            .check(&ctx(store), &mut result)
            .await
            .unwrap();

        assert_eq!(result.count(Severity::Ok), 1);
        assert_eq!(result.count(Severity::Error), 1);
        let error = result
            .findings()
            .iter()
            .find(|f| f.severity == Severity::Error)
            .unwrap();
        assert_eq!(error.name, "staging");
        assert!(error.summary.contains("broker down"));
    }

    #[tokio::test]
    async fn test_kafka_cluster_filter_matches_resource_name() {
        let store = MemoryStore::new();
        store.add_kafka(kafka("kafka", "prod", vec![Condition::new("Ready", STATUS_TRUE)]));
        store.add_kafka(kafka("kafka", "staging", vec![Condition::new("Ready", STATUS_TRUE)]));

        let context = ctx(store).with_cluster("prod");
        let mut result = HealthCheckResult::new();
        KafkaHealthChecker.check(&context, &mut result).await.unwrap();

        assert_eq!(result.findings().len(), 1);
        assert_eq!(result.findings()[0].name, "prod");
    }

    #[tokio::test]
    async fn test_user_unknown_state_is_warning() {
        let store = MemoryStore::new();
        store.add_user(KafkaUser {
            metadata: meta("kafka", "app-1", Some("prod")),
            spec: KafkaUserSpec::default(),
            status: Some(KafkaUserStatus::default()),
        });

        let mut result = HealthCheckResult::new();
        UserHealthChecker
            .check(&ctx(store), &mut result)
            .await
            .unwrap();

        assert_eq!(result.findings().len(), 1);
        assert_eq!(result.findings()[0].severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_connector_task_trace_escalates_to_error() {
        let store = MemoryStore::new();
        store.add_connector(connector(
            "kafka",
            "s3-sink",
            KafkaConnectorStatus {
                conditions: vec![Condition::new("Ready", STATUS_TRUE)],
                connector_status: Some(ConnectorRuntimeStatus {
                    tasks: vec![
                        ConnectorTaskStatus {
                            id: Some(0),
                            state: Some("RUNNING".to_string()),
                            ..Default::default()
                        },
                        ConnectorTaskStatus {
                            id: Some(1),
                            state: Some("FAILED".to_string()),
                            trace: Some("ConnectException: bucket gone\n\tat ...".to_string()),
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                }),
                ..Default::default()
            },
        ));

        let mut result = HealthCheckResult::new();
        ConnectorHealthChecker
            .check(&ctx(store), &mut result)
            .await
            .unwrap();

        assert_eq!(result.findings().len(), 1);
        let finding = &result.findings()[0];
        assert_eq!(finding.severity, Severity::Error);
        assert!(finding.summary.contains("task 1"));
        assert!(finding.summary.contains("bucket gone"));
        // the multi-line trace is cut to its first line
        assert!(!finding.summary.contains("\tat"));
    }

    #[tokio::test]
    async fn test_connector_without_traces_stays_ok() {
        let store = MemoryStore::new();
        store.add_connector(connector(
            "kafka",
            "s3-sink",
            KafkaConnectorStatus {
                conditions: vec![Condition::new("Ready", STATUS_TRUE)],
                ..Default::default()
            },
        ));

        let mut result = HealthCheckResult::new();
        ConnectorHealthChecker
            .check(&ctx(store), &mut result)
            .await
            .unwrap();

        assert_eq!(result.findings()[0].severity, Severity::Ok);
    }

    #[tokio::test]
    async fn test_missing_ca_secret_is_warning() {
        let store = MemoryStore::new();
        store.add_kafka(kafka("kafka", "prod", vec![Condition::new("Ready", STATUS_TRUE)]));

        let mut result = HealthCheckResult::new();
        CertificateHealthChecker::new(30)
            .check(&ctx(store), &mut result)
            .await
            .unwrap();

        // both CA secrets are reported missing
        assert_eq!(result.findings().len(), 2);
        for finding in result.findings() {
            assert_eq!(finding.severity, Severity::Warning);
            assert!(finding.summary.contains("not found"));
        }
        let names: Vec<_> = result.findings().iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"prod-cluster-ca-cert"));
        assert!(names.contains(&"prod-clients-ca-cert"));
    }

    #[tokio::test]
    async fn test_unreadable_ca_cert_is_warning_not_abort() {
        let store = MemoryStore::new();
        store.add_kafka(kafka("kafka", "prod", vec![Condition::new("Ready", STATUS_TRUE)]));
        store.add_secret(
            "kafka",
            Secret {
                metadata: meta("kafka", "prod-cluster-ca-cert", None),
                data: Some(
                    [(
                        "ca.crt".to_string(),
                        ByteString(b"not a certificate".to_vec()),
                    )]
                    .into_iter()
                    .collect(),
                ),
                ..Default::default()
            },
        );

        let mut result = HealthCheckResult::new();
        CertificateHealthChecker::new(30)
            .check(&ctx(store), &mut result)
            .await
            .unwrap();

        let finding = result
            .findings()
            .iter()
            .find(|f| f.name == "prod-cluster-ca-cert")
            .unwrap();
        assert_eq!(finding.severity, Severity::Warning);
        assert!(finding.summary.contains("unreadable"));
    }

    #[tokio::test]
    async fn test_clients_ca_secret_is_evaluated_too() {
        let store = MemoryStore::new();
        store.add_kafka(kafka("kafka", "prod", vec![Condition::new("Ready", STATUS_TRUE)]));
        store.add_secret(
            "kafka",
            Secret {
                metadata: meta("kafka", "prod-clients-ca-cert", None),
                data: Some(
                    [(
                        "ca.crt".to_string(),
                        ByteString(b"not a certificate".to_vec()),
                    )]
                    .into_iter()
                    .collect(),
                ),
                ..Default::default()
            },
        );

        let mut result = HealthCheckResult::new();
        CertificateHealthChecker::new(30)
            .check(&ctx(store), &mut result)
            .await
            .unwrap();

        let finding = result
            .findings()
            .iter()
            .find(|f| f.name == "prod-clients-ca-cert")
            .unwrap();
        assert_eq!(finding.severity, Severity::Warning);
        assert!(finding.summary.contains("unreadable"));
    }

    #[tokio::test]
    async fn test_full_run_aggregates_all_kinds() {
        let store = MemoryStore::new();
        store.add_kafka(kafka("kafka", "prod", vec![Condition::new("Ready", STATUS_TRUE)]));
        store.add_topic(topic("kafka", "orders", None));
        store.add_user(KafkaUser {
            metadata: meta("kafka", "app-1", Some("prod")),
            spec: KafkaUserSpec::default(),
            status: Some(KafkaUserStatus {
                conditions: vec![Condition::new("Ready", STATUS_TRUE)],
                ..Default::default()
            }),
        });

        let context = ctx(store);
        let result = crate::health::run_health_check(&context, 30).await;

        // kafka OK + topic WARNING + user OK + two missing CA secret WARNINGs
        assert_eq!(result.findings().len(), 5);
        assert_eq!(result.count(Severity::Warning), 3);
        assert_eq!(result.count(Severity::Ok), 2);
        let report = result.format();
        assert!(report.contains("KafkaTopic/kafka/orders: WARNING"));
    }
}
