//! Rebalance lifecycle operations
//!
//! A `KafkaRebalance` resource is a request for the external Cruise Control
//! engine to compute and execute a partition rebalance. The lifecycle is
//! owned entirely by the reconciling operator; this module never mutates a
//! state field. It observes the phase through the shared condition resolver
//! and requests transitions by writing the `strimzi.io/rebalance`
//! annotation.
//!
//! Phases: `New` (resource absent) → `PendingProposal` → `ProposalReady` →
//! `Rebalancing` → `Ready` or `Stopped`, with `NotReady` on failure.
//!
//! Only `Approve` is gated locally (it requires `ProposalReady`): approving
//! an unready proposal can trigger undefined controller behavior. `Refresh`
//! and `Stop` are safe at any phase and the operator validates or no-ops
//! them; they go straight to the annotation write, so an absent resource
//! surfaces as `NotFound` from the patch.

use crate::annotations::REBALANCE;
use crate::conditions::{self, STATE_NOT_READY};
use crate::crd::{KafkaRebalance, KafkaRebalanceSpec, CLUSTER_LABEL};
use crate::error::{Error, Result};
use crate::store::ResourceStore;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Phase of a rebalance, derived on every observation and never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceState {
    /// Resource does not exist
    New,
    /// Resource exists, Cruise Control has not published a proposal yet
    PendingProposal,
    /// A proposal is computed and awaiting approval
    ProposalReady,
    /// Partition movement is in progress
    Rebalancing,
    /// The rebalance completed
    Ready,
    /// The rebalance was stopped
    Stopped,
    /// The operator reported a failure
    NotReady,
}

impl fmt::Display for RebalanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RebalanceState::New => "New",
            RebalanceState::PendingProposal => "PendingProposal",
            RebalanceState::ProposalReady => "ProposalReady",
            RebalanceState::Rebalancing => "Rebalancing",
            RebalanceState::Ready => "Ready",
            RebalanceState::Stopped => "Stopped",
            RebalanceState::NotReady => "NotReady",
        };
        write!(f, "{label}")
    }
}

impl RebalanceState {
    /// Map a resolved condition label to a phase. Condition types map 1:1 to
    /// phase names; anything unrecognized (including "Unknown" from an empty
    /// condition list) means the proposal is still pending.
    fn from_label(label: &str) -> Self {
        match label {
            "PendingProposal" => RebalanceState::PendingProposal,
            "ProposalReady" => RebalanceState::ProposalReady,
            "Rebalancing" => RebalanceState::Rebalancing,
            "Ready" => RebalanceState::Ready,
            "Stopped" => RebalanceState::Stopped,
            STATE_NOT_READY => RebalanceState::NotReady,
            _ => RebalanceState::PendingProposal,
        }
    }
}

/// Lifecycle request for an existing rebalance resource
///
/// Each variant maps to exactly one value of the `strimzi.io/rebalance`
/// annotation; this table is the single source of truth for the wire
/// contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceRequest {
    /// Approve the computed proposal and start partition movement
    Approve,
    /// Ask Cruise Control to recompute the proposal
    Refresh,
    /// Halt further movement; in-flight moves complete
    Stop,
}

impl RebalanceRequest {
    /// Annotation value written for this request
    pub fn annotation_value(&self) -> &'static str {
        match self {
            RebalanceRequest::Approve => "approve",
            RebalanceRequest::Refresh => "refresh",
            RebalanceRequest::Stop => "stop",
        }
    }
}

/// One observation of a rebalance resource
#[derive(Debug, Clone)]
pub struct RebalanceObservation {
    /// Derived phase
    pub state: RebalanceState,
    /// Reason/message detail from the winning condition
    pub detail: Option<String>,
    /// Cruise Control session id, present while movement is in flight
    pub session_id: Option<String>,
}

/// Annotation-driven state machine over `KafkaRebalance` resources
pub struct RebalanceStateMachine {
    store: Arc<dyn ResourceStore>,
}

impl RebalanceStateMachine {
    /// Build the state machine over the given store
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    /// Derive the current phase of a rebalance resource
    pub async fn observe(&self, namespace: &str, name: &str) -> Result<RebalanceObservation> {
        let Some(rebalance) = self.store.get_rebalance(namespace, name).await? else {
            return Ok(RebalanceObservation {
                state: RebalanceState::New,
                detail: None,
                session_id: None,
            });
        };

        let resolved = conditions::resolve_opt(rebalance.status.as_ref().map(|s| &s.conditions));
        Ok(RebalanceObservation {
            state: RebalanceState::from_label(&resolved.label),
            detail: resolved.detail,
            session_id: rebalance.status.as_ref().and_then(|s| s.session_id.clone()),
        })
    }

    /// Create a rebalance resource bound to the given cluster
    ///
    /// Fails with `AlreadyExists` when a resource of that name is present;
    /// an existing rebalance is never overwritten.
    pub async fn create(
        &self,
        namespace: &str,
        name: &str,
        cluster: &str,
        spec: KafkaRebalanceSpec,
    ) -> Result<KafkaRebalance> {
        if self.store.get_rebalance(namespace, name).await?.is_some() {
            return Err(Error::already_exists("KafkaRebalance", namespace, name));
        }

        let rebalance = KafkaRebalance {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(BTreeMap::from([(
                    CLUSTER_LABEL.to_string(),
                    cluster.to_string(),
                )])),
                ..Default::default()
            },
            spec,
            status: None,
        };

        info!(namespace, name, cluster, "creating rebalance");
        self.store.create_rebalance(namespace, &rebalance).await
    }

    /// Request a lifecycle transition by writing the rebalance annotation
    ///
    /// `Approve` is checked locally against the observed phase and fails
    /// with `PreconditionFailed` (no annotation written) unless the phase is
    /// `ProposalReady`. `Refresh` and `Stop` write unconditionally.
    pub async fn request(
        &self,
        namespace: &str,
        name: &str,
        request: RebalanceRequest,
    ) -> Result<KafkaRebalance> {
        if request == RebalanceRequest::Approve {
            let observation = self.observe(namespace, name).await?;
            if observation.state != RebalanceState::ProposalReady {
                return Err(Error::PreconditionFailed {
                    action: "approve".to_string(),
                    kind: "KafkaRebalance".to_string(),
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    expected: RebalanceState::ProposalReady.to_string(),
                    actual: observation.state.to_string(),
                });
            }
        }

        info!(
            namespace,
            name,
            value = request.annotation_value(),
            "writing rebalance annotation"
        );
        self.store
            .patch_rebalance_annotations(
                namespace,
                name,
                BTreeMap::from([(
                    REBALANCE.to_string(),
                    request.annotation_value().to_string(),
                )]),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::STATUS_TRUE;
    use crate::crd::{Condition, KafkaRebalanceStatus};
    use crate::store::MemoryStore;
    use kube::ResourceExt;

    fn rebalance(namespace: &str, name: &str, conditions: Vec<Condition>) -> KafkaRebalance {
        KafkaRebalance {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: KafkaRebalanceSpec::default(),
            status: Some(KafkaRebalanceStatus {
                conditions,
                ..Default::default()
            }),
        }
    }

    fn machine(store: MemoryStore) -> (Arc<MemoryStore>, RebalanceStateMachine) {
        let store = Arc::new(store);
        (store.clone(), RebalanceStateMachine::new(store))
    }

    #[tokio::test]
    async fn test_absent_resource_observes_new() {
        let (_, fsm) = machine(MemoryStore::new());
        let obs = fsm.observe("kafka", "full").await.unwrap();
        assert_eq!(obs.state, RebalanceState::New);
    }

    #[tokio::test]
    async fn test_resource_without_true_condition_is_pending_proposal() {
        let store = MemoryStore::new();
        store.add_rebalance(rebalance("kafka", "full", vec![]));
        let (_, fsm) = machine(store);
        let obs = fsm.observe("kafka", "full").await.unwrap();
        assert_eq!(obs.state, RebalanceState::PendingProposal);
    }

    #[tokio::test]
    async fn test_condition_labels_map_to_phases() {
        for (label, expected) in [
            ("PendingProposal", RebalanceState::PendingProposal),
            ("ProposalReady", RebalanceState::ProposalReady),
            ("Rebalancing", RebalanceState::Rebalancing),
            ("Ready", RebalanceState::Ready),
            ("Stopped", RebalanceState::Stopped),
        ] {
            let store = MemoryStore::new();
            store.add_rebalance(rebalance(
                "kafka",
                "full",
                vec![Condition::new(label, STATUS_TRUE)],
            ));
            let (_, fsm) = machine(store);
            let obs = fsm.observe("kafka", "full").await.unwrap();
            assert_eq!(obs.state, expected, "label {label}");
        }
    }

    #[tokio::test]
    async fn test_create_then_duplicate_create_fails() {
        let (_, fsm) = machine(MemoryStore::new());
        let created = fsm
            .create("kafka", "full", "prod", KafkaRebalanceSpec::default())
            .await
            .unwrap();
        assert_eq!(
            created.labels().get(CLUSTER_LABEL).map(String::as_str),
            Some("prod")
        );

        let err = fsm
            .create("kafka", "full", "prod", KafkaRebalanceSpec::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_approve_requires_proposal_ready_and_writes_nothing() {
        let store = MemoryStore::new();
        store.add_rebalance(rebalance(
            "kafka",
            "full",
            vec![Condition::new("Rebalancing", STATUS_TRUE)],
        ));
        let (store, fsm) = machine(store);

        let err = fsm
            .request("kafka", "full", RebalanceRequest::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PreconditionFailed { .. }));
        assert!(err.to_string().contains("Rebalancing"));

        // no side effect on the resource
        let current = store.get_rebalance("kafka", "full").await.unwrap().unwrap();
        assert!(!current.annotations().contains_key(REBALANCE));
    }

    #[tokio::test]
    async fn test_approve_in_proposal_ready_writes_approve() {
        let store = MemoryStore::new();
        store.add_rebalance(rebalance(
            "kafka",
            "full",
            vec![Condition::new("ProposalReady", STATUS_TRUE)],
        ));
        let (_, fsm) = machine(store);

        let patched = fsm
            .request("kafka", "full", RebalanceRequest::Approve)
            .await
            .unwrap();
        assert_eq!(
            patched.annotations().get(REBALANCE).map(String::as_str),
            Some("approve")
        );
    }

    #[tokio::test]
    async fn test_stop_and_refresh_skip_precondition_checks() {
        for (request, value) in [
            (RebalanceRequest::Stop, "stop"),
            (RebalanceRequest::Refresh, "refresh"),
        ] {
            let store = MemoryStore::new();
            // a phase in which Approve would be rejected
            store.add_rebalance(rebalance(
                "kafka",
                "full",
                vec![Condition::new("Rebalancing", STATUS_TRUE)],
            ));
            let (_, fsm) = machine(store);

            let patched = fsm.request("kafka", "full", request).await.unwrap();
            assert_eq!(
                patched.annotations().get(REBALANCE).map(String::as_str),
                Some(value)
            );
        }
    }

    #[tokio::test]
    async fn test_stop_on_absent_resource_surfaces_not_found() {
        let (_, fsm) = machine(MemoryStore::new());
        let err = fsm
            .request("kafka", "missing", RebalanceRequest::Stop)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
