//! Well-known Strimzi annotation keys and annotation-driven actions
//!
//! Strimzi exposes several operations as metadata annotations rather than
//! typed API calls: the reconciling operator watches for these keys and acts
//! on them. The constants here are the wire contract; the action functions
//! translate each operation to exactly one read-then-patch.
//!
//! Timestamp-valued keys (`force-password-renewal`, `manual-rolling-update`)
//! only need a value distinct from the previous one to trigger
//! re-evaluation; the operator never interprets the value itself.

use crate::crd::{KafkaConnector, KafkaUser};
use crate::error::Result;
use crate::store::ResourceStore;
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::info;

/// Rebalance lifecycle requests: `approve`, `refresh` or `stop`
pub const REBALANCE: &str = "strimzi.io/rebalance";

/// Restart a connector
pub const RESTART: &str = "strimzi.io/restart";

/// Restart one connector task, valued with the task id
pub const RESTART_TASK: &str = "strimzi.io/restart-task";

/// Force regeneration of a user's password secret
pub const FORCE_PASSWORD_RENEWAL: &str = "strimzi.io/force-password-renewal";

/// Trigger a manual rolling update of the cluster pods
pub const MANUAL_ROLLING_UPDATE: &str = "strimzi.io/manual-rolling-update";

/// Single-entry annotation map
fn annotation(key: &str, value: String) -> BTreeMap<String, String> {
    BTreeMap::from([(key.to_string(), value)])
}

/// RFC 3339 timestamp for the trigger-valued annotations
fn trigger_value() -> String {
    Utc::now().to_rfc3339()
}

/// Ask the operator to restart a connector
pub async fn restart_connector(
    store: &dyn ResourceStore,
    namespace: &str,
    name: &str,
) -> Result<KafkaConnector> {
    info!(namespace, name, "requesting connector restart");
    store
        .patch_connector_annotations(namespace, name, annotation(RESTART, "true".to_string()))
        .await
}

/// Ask the operator to restart one task of a connector
pub async fn restart_connector_task(
    store: &dyn ResourceStore,
    namespace: &str,
    name: &str,
    task_id: i32,
) -> Result<KafkaConnector> {
    info!(namespace, name, task_id, "requesting connector task restart");
    store
        .patch_connector_annotations(namespace, name, annotation(RESTART_TASK, task_id.to_string()))
        .await
}

/// Ask the operator to regenerate a user's password secret
pub async fn renew_user_password(
    store: &dyn ResourceStore,
    namespace: &str,
    name: &str,
) -> Result<KafkaUser> {
    info!(namespace, name, "requesting password renewal");
    store
        .patch_user_annotations(namespace, name, annotation(FORCE_PASSWORD_RENEWAL, trigger_value()))
        .await
}

/// Ask the operator to roll the cluster pods
pub async fn trigger_rolling_update(
    store: &dyn ResourceStore,
    namespace: &str,
    cluster: &str,
) -> Result<()> {
    info!(namespace, cluster, "requesting manual rolling update");
    store
        .patch_kafka_annotations(namespace, cluster, annotation(MANUAL_ROLLING_UPDATE, trigger_value()))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{KafkaConnectorSpec, KafkaUserSpec};
    use crate::error::Error;
    use crate::store::MemoryStore;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::ResourceExt;

    fn meta(namespace: &str, name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_restart_connector_writes_the_restart_key() {
        let store = MemoryStore::new();
        store.add_connector(KafkaConnector {
            metadata: meta("kafka", "s3-sink"),
            spec: KafkaConnectorSpec::default(),
            status: None,
        });

        let patched = restart_connector(&store, "kafka", "s3-sink").await.unwrap();
        assert_eq!(patched.annotations().get(RESTART).map(String::as_str), Some("true"));
    }

    #[tokio::test]
    async fn test_restart_task_carries_the_task_id() {
        let store = MemoryStore::new();
        store.add_connector(KafkaConnector {
            metadata: meta("kafka", "s3-sink"),
            spec: KafkaConnectorSpec::default(),
            status: None,
        });

        let patched = restart_connector_task(&store, "kafka", "s3-sink", 2)
            .await
            .unwrap();
        assert_eq!(patched.annotations().get(RESTART_TASK).map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn test_renew_password_writes_a_timestamp() {
        let store = MemoryStore::new();
        store.add_user(KafkaUser {
            metadata: meta("kafka", "app-1"),
            spec: KafkaUserSpec::default(),
            status: None,
        });

        let patched = renew_user_password(&store, "kafka", "app-1").await.unwrap();
        let value = patched.annotations().get(FORCE_PASSWORD_RENEWAL).unwrap();
        // RFC 3339, parseable back
        assert!(chrono::DateTime::parse_from_rfc3339(value).is_ok());
    }

    #[tokio::test]
    async fn test_actions_surface_not_found() {
        let store = MemoryStore::new();
        let err = restart_connector(&store, "kafka", "missing").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        let err = trigger_rolling_update(&store, "kafka", "missing").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
