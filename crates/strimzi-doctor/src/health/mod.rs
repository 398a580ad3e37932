//! Pluggable health checking across the Strimzi fleet
//!
//! One invocation builds a read-only [`HealthCheckContext`], runs every
//! registered [`HealthChecker`] against it in registration order and
//! accumulates findings into a single [`HealthCheckResult`]. Checkers are
//! independent: none reads another's findings, and the final finding set does
//! not depend on execution order (only the rendering order does).
//!
//! Adding a checker is an edit to [`default_checkers`] only; no existing
//! checker or the driver changes.

pub mod checkers;
pub mod report;

pub use checkers::{
    CertificateHealthChecker, ConnectorHealthChecker, KafkaHealthChecker, TopicHealthChecker,
    UserHealthChecker,
};
pub use report::{HealthCheckResult, HealthFinding, Severity};

use crate::crd::CLUSTER_LABEL;
use crate::error::Result;
use crate::store::ResourceStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Read-only scope shared by all checkers in one invocation
#[derive(Clone)]
pub struct HealthCheckContext {
    /// Resource store handle
    pub store: Arc<dyn ResourceStore>,
    /// Restrict the scan to one namespace; all namespaces when absent
    pub namespace: Option<String>,
    /// Restrict the scan to resources of one Kafka cluster
    pub cluster: Option<String>,
}

impl HealthCheckContext {
    /// Build a context over the given store
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self {
            store,
            namespace: None,
            cluster: None,
        }
    }

    /// Restrict the scan to one namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Restrict the scan to one Kafka cluster
    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    /// Namespace filter as the store expects it
    pub fn namespace_filter(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Label selector matching the cluster filter, when one is set
    pub fn cluster_selector(&self) -> Option<String> {
        self.cluster
            .as_ref()
            .map(|cluster| format!("{CLUSTER_LABEL}={cluster}"))
    }
}

/// One health-checking plugin scanning one resource kind
///
/// A checker must not fail for a single malformed or missing resource; it
/// degrades by appending a WARNING/ERROR finding naming the resource and
/// continues. Returning `Err` means the checker could not even list its
/// resource kind; the driver then skips that checker's contribution and
/// continues with the rest.
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// Checker name, for logs
    fn name(&self) -> &'static str;

    /// Scan the context's scope, appending findings to `result`
    async fn check(&self, ctx: &HealthCheckContext, result: &mut HealthCheckResult) -> Result<()>;
}

/// The registered checker list, in rendering order
pub fn default_checkers(warning_days: i64) -> Vec<Box<dyn HealthChecker>> {
    vec![
        Box::new(KafkaHealthChecker),
        Box::new(TopicHealthChecker),
        Box::new(UserHealthChecker),
        Box::new(ConnectorHealthChecker),
        Box::new(CertificateHealthChecker::new(warning_days)),
    ]
}

/// Run the given checkers sequentially, accumulating into one result
pub async fn run_checkers(
    checkers: &[Box<dyn HealthChecker>],
    ctx: &HealthCheckContext,
) -> HealthCheckResult {
    let mut result = HealthCheckResult::new();
    for checker in checkers {
        debug!(checker = checker.name(), "running health checker");
        if let Err(err) = checker.check(ctx, &mut result).await {
            // A checker that cannot list its kind loses its contribution;
            // the remaining checkers still run.
            warn!(
                checker = checker.name(),
                error = %err,
                "health checker could not scan its resource kind; skipping"
            );
        }
    }
    result
}

/// Run every registered checker against the context
pub async fn run_health_check(ctx: &HealthCheckContext, warning_days: i64) -> HealthCheckResult {
    run_checkers(&default_checkers(warning_days), ctx).await
}
