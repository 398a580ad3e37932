//! Resource store access
//!
//! Narrow interface over the remote resource store. Everything this crate
//! reads or writes goes through [`ResourceStore`]: typed gets and lists
//! scoped by namespace and label selector, resource creation, annotation
//! merge-patches and secret lookup. [`KubeStore`] backs it with a Kubernetes
//! API client; [`MemoryStore`] implements the same semantics in memory for
//! tests and dry runs.
//!
//! The store is shared with other actors (the reconciling operator, the
//! control plane, concurrent invocations). No method here assumes exclusive
//! access; gets return `Option` and writes surface typed `NotFound` /
//! `AlreadyExists` errors instead of guessing.

use crate::crd::{Kafka, KafkaConnector, KafkaRebalance, KafkaTopic, KafkaUser};
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use std::collections::BTreeMap;

/// Field manager name used for annotation patches
const FIELD_MANAGER: &str = "strimzi-doctor";

/// Typed access to the Strimzi resources and secrets this tool touches
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// List Kafka clusters, across all namespaces when `namespace` is absent
    async fn list_kafkas(&self, namespace: Option<&str>) -> Result<Vec<Kafka>>;

    /// Fetch one Kafka cluster, `None` when absent
    async fn get_kafka(&self, namespace: &str, name: &str) -> Result<Option<Kafka>>;

    /// Merge the given annotations onto a Kafka cluster
    async fn patch_kafka_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<Kafka>;

    /// List topics, optionally filtered by a label selector
    async fn list_topics(
        &self,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<KafkaTopic>>;

    /// List users, optionally filtered by a label selector
    async fn list_users(
        &self,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<KafkaUser>>;

    /// Merge the given annotations onto a user
    async fn patch_user_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<KafkaUser>;

    /// List connectors, optionally filtered by a label selector
    async fn list_connectors(
        &self,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<KafkaConnector>>;

    /// Merge the given annotations onto a connector
    async fn patch_connector_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<KafkaConnector>;

    /// Fetch one rebalance resource, `None` when absent
    async fn get_rebalance(&self, namespace: &str, name: &str) -> Result<Option<KafkaRebalance>>;

    /// Create a rebalance resource; `AlreadyExists` when the name is taken
    async fn create_rebalance(
        &self,
        namespace: &str,
        rebalance: &KafkaRebalance,
    ) -> Result<KafkaRebalance>;

    /// Merge the given annotations onto a rebalance resource
    async fn patch_rebalance_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<KafkaRebalance>;

    /// Fetch a secret, `None` when absent
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;
}

/// Merge-patch body that only touches `metadata.annotations`
fn annotations_patch(annotations: &BTreeMap<String, String>) -> serde_json::Value {
    serde_json::json!({ "metadata": { "annotations": annotations } })
}

/// Whether a kube API error carries the given HTTP status code
fn is_api_status(err: &kube::Error, code: u16) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == code)
}

// ============================================================================
// Kubernetes-backed store
// ============================================================================

/// [`ResourceStore`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    /// Wrap an existing Kubernetes client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn scoped<K>(&self, namespace: Option<&str>) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }

    async fn list_scoped<K>(
        &self,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<K>>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>
            + Clone
            + serde::de::DeserializeOwned
            + std::fmt::Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = self.scoped(namespace);
        let mut params = ListParams::default();
        if let Some(selector) = selector {
            params = params.labels(selector);
        }
        Ok(api.list(&params).await?.items)
    }

    async fn patch_scoped<K>(
        &self,
        kind: &str,
        namespace: &str,
        name: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>
            + Clone
            + serde::de::DeserializeOwned
            + std::fmt::Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = self.scoped(Some(namespace));
        let params = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        match api
            .patch(name, &params, &Patch::Merge(annotations_patch(&annotations)))
            .await
        {
            Ok(resource) => Ok(resource),
            Err(err) if is_api_status(&err, 404) => Err(Error::not_found(kind, namespace, name)),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn list_kafkas(&self, namespace: Option<&str>) -> Result<Vec<Kafka>> {
        self.list_scoped(namespace, None).await
    }

    async fn get_kafka(&self, namespace: &str, name: &str) -> Result<Option<Kafka>> {
        let api: Api<Kafka> = self.scoped(Some(namespace));
        Ok(api.get_opt(name).await?)
    }

    async fn patch_kafka_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<Kafka> {
        self.patch_scoped("Kafka", namespace, name, annotations).await
    }

    async fn list_topics(
        &self,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<KafkaTopic>> {
        self.list_scoped(namespace, selector).await
    }

    async fn list_users(
        &self,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<KafkaUser>> {
        self.list_scoped(namespace, selector).await
    }

    async fn patch_user_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<KafkaUser> {
        self.patch_scoped("KafkaUser", namespace, name, annotations)
            .await
    }

    async fn list_connectors(
        &self,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<KafkaConnector>> {
        self.list_scoped(namespace, selector).await
    }

    async fn patch_connector_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<KafkaConnector> {
        self.patch_scoped("KafkaConnector", namespace, name, annotations)
            .await
    }

    async fn get_rebalance(&self, namespace: &str, name: &str) -> Result<Option<KafkaRebalance>> {
        let api: Api<KafkaRebalance> = self.scoped(Some(namespace));
        Ok(api.get_opt(name).await?)
    }

    async fn create_rebalance(
        &self,
        namespace: &str,
        rebalance: &KafkaRebalance,
    ) -> Result<KafkaRebalance> {
        let api: Api<KafkaRebalance> = self.scoped(Some(namespace));
        match api.create(&PostParams::default(), rebalance).await {
            Ok(created) => Ok(created),
            Err(err) if is_api_status(&err, 409) => Err(Error::already_exists(
                "KafkaRebalance",
                namespace,
                &rebalance.name_any(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    async fn patch_rebalance_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<KafkaRebalance> {
        self.patch_scoped("KafkaRebalance", namespace, name, annotations)
            .await
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory [`ResourceStore`] with the same visible semantics as
/// [`KubeStore`], for unit tests and offline dry runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: parking_lot::RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    kafkas: Vec<Kafka>,
    topics: Vec<KafkaTopic>,
    users: Vec<KafkaUser>,
    connectors: Vec<KafkaConnector>,
    rebalances: Vec<KafkaRebalance>,
    secrets: BTreeMap<(String, String), Secret>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a Kafka cluster
    pub fn add_kafka(&self, kafka: Kafka) {
        self.inner.write().kafkas.push(kafka);
    }

    /// Seed a topic
    pub fn add_topic(&self, topic: KafkaTopic) {
        self.inner.write().topics.push(topic);
    }

    /// Seed a user
    pub fn add_user(&self, user: KafkaUser) {
        self.inner.write().users.push(user);
    }

    /// Seed a connector
    pub fn add_connector(&self, connector: KafkaConnector) {
        self.inner.write().connectors.push(connector);
    }

    /// Seed a rebalance resource
    pub fn add_rebalance(&self, rebalance: KafkaRebalance) {
        self.inner.write().rebalances.push(rebalance);
    }

    /// Seed a secret
    pub fn add_secret(&self, namespace: &str, secret: Secret) {
        let name = secret.name_any();
        self.inner
            .write()
            .secrets
            .insert((namespace.to_string(), name), secret);
    }
}

/// Match a resource against an optional namespace and equality label selector
/// (comma-separated `key=value` pairs, the subset this crate emits).
fn in_scope<K>(resource: &K, namespace: Option<&str>, selector: Option<&str>) -> bool
where
    K: ResourceExt,
{
    if let Some(ns) = namespace {
        if resource.namespace().as_deref() != Some(ns) {
            return false;
        }
    }
    if let Some(selector) = selector {
        let labels = resource.labels();
        for clause in selector.split(',') {
            match clause.split_once('=') {
                Some((key, value)) => {
                    if labels.get(key.trim()).map(String::as_str) != Some(value.trim()) {
                        return false;
                    }
                }
                None => return false,
            }
        }
    }
    true
}

fn find_mut<'a, K>(items: &'a mut [K], namespace: &str, name: &str) -> Option<&'a mut K>
where
    K: ResourceExt,
{
    items
        .iter_mut()
        .find(|r| r.namespace().as_deref() == Some(namespace) && r.name_any() == name)
}

fn merge_annotations<K>(resource: &mut K, annotations: BTreeMap<String, String>)
where
    K: ResourceExt,
{
    resource.annotations_mut().extend(annotations);
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn list_kafkas(&self, namespace: Option<&str>) -> Result<Vec<Kafka>> {
        Ok(self
            .inner
            .read()
            .kafkas
            .iter()
            .filter(|k| in_scope(*k, namespace, None))
            .cloned()
            .collect())
    }

    async fn get_kafka(&self, namespace: &str, name: &str) -> Result<Option<Kafka>> {
        Ok(self
            .inner
            .read()
            .kafkas
            .iter()
            .find(|k| k.namespace().as_deref() == Some(namespace) && k.name_any() == name)
            .cloned())
    }

    async fn patch_kafka_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<Kafka> {
        let mut inner = self.inner.write();
        let kafka = find_mut(&mut inner.kafkas, namespace, name)
            .ok_or_else(|| Error::not_found("Kafka", namespace, name))?;
        merge_annotations(kafka, annotations);
        Ok(kafka.clone())
    }

    async fn list_topics(
        &self,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<KafkaTopic>> {
        Ok(self
            .inner
            .read()
            .topics
            .iter()
            .filter(|t| in_scope(*t, namespace, selector))
            .cloned()
            .collect())
    }

    async fn list_users(
        &self,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<KafkaUser>> {
        Ok(self
            .inner
            .read()
            .users
            .iter()
            .filter(|u| in_scope(*u, namespace, selector))
            .cloned()
            .collect())
    }

    async fn patch_user_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<KafkaUser> {
        let mut inner = self.inner.write();
        let user = find_mut(&mut inner.users, namespace, name)
            .ok_or_else(|| Error::not_found("KafkaUser", namespace, name))?;
        merge_annotations(user, annotations);
        Ok(user.clone())
    }

    async fn list_connectors(
        &self,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<KafkaConnector>> {
        Ok(self
            .inner
            .read()
            .connectors
            .iter()
            .filter(|c| in_scope(*c, namespace, selector))
            .cloned()
            .collect())
    }

    async fn patch_connector_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<KafkaConnector> {
        let mut inner = self.inner.write();
        let connector = find_mut(&mut inner.connectors, namespace, name)
            .ok_or_else(|| Error::not_found("KafkaConnector", namespace, name))?;
        merge_annotations(connector, annotations);
        Ok(connector.clone())
    }

    async fn get_rebalance(&self, namespace: &str, name: &str) -> Result<Option<KafkaRebalance>> {
        Ok(self
            .inner
            .read()
            .rebalances
            .iter()
            .find(|r| r.namespace().as_deref() == Some(namespace) && r.name_any() == name)
            .cloned())
    }

    async fn create_rebalance(
        &self,
        namespace: &str,
        rebalance: &KafkaRebalance,
    ) -> Result<KafkaRebalance> {
        let mut inner = self.inner.write();
        let name = rebalance.name_any();
        if find_mut(&mut inner.rebalances, namespace, &name).is_some() {
            return Err(Error::already_exists("KafkaRebalance", namespace, &name));
        }
        let mut created = rebalance.clone();
        created.metadata.namespace = Some(namespace.to_string());
        inner.rebalances.push(created.clone());
        Ok(created)
    }

    async fn patch_rebalance_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<KafkaRebalance> {
        let mut inner = self.inner.write();
        let rebalance = find_mut(&mut inner.rebalances, namespace, name)
            .ok_or_else(|| Error::not_found("KafkaRebalance", namespace, name))?;
        merge_annotations(rebalance, annotations);
        Ok(rebalance.clone())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        Ok(self
            .inner
            .read()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}
