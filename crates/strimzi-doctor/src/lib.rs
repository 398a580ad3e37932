//! # strimzi-doctor
//!
//! Health, rebalance and certificate tooling for Strimzi-managed Kafka
//! fleets running on Kubernetes.
//!
//! The crate revolves around one abstraction: reduce an evolving,
//! partially-known remote state into a small state value plus
//! human-readable detail. Four components share it:
//!
//! - [`conditions`] — the canonical resolver turning a resource's status
//!   conditions into a [`conditions::ResolvedState`]. Every list, describe
//!   and health path uses this single reduction.
//! - [`health`] — a pluggable checker framework. Each checker scans one
//!   resource kind within a read-only scope and appends findings to one
//!   aggregated, append-only result.
//! - [`rebalance`] — an annotation-driven state machine over
//!   `KafkaRebalance` resources. Phases are observed through the resolver;
//!   transitions are requested by writing `strimzi.io/rebalance`, never by
//!   mutating state directly.
//! - [`certs`] — X.509 lifetime classification against a warning threshold.
//!
//! All state lives in the remote resource store, consumed through the
//! [`store::ResourceStore`] trait. Nothing here persists anything or runs in
//! the background; every operation is a synchronous request/observe cycle
//! re-derived from scratch.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use strimzi_doctor::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> strimzi_doctor::error::Result<()> {
//!     let client = kube::Client::try_default().await?;
//!     let store = Arc::new(KubeStore::new(client));
//!
//!     let ctx = HealthCheckContext::new(store).with_namespace("kafka");
//!     let result = run_health_check(&ctx, 30).await;
//!     print!("{}", result.format());
//!     Ok(())
//! }
//! ```

pub mod annotations;
pub mod certs;
pub mod conditions;
pub mod crd;
pub mod error;
pub mod health;
pub mod rebalance;
pub mod store;

pub mod prelude {
    //! Re-exports for convenient usage
    pub use crate::certs::{CertVerdict, CertificateExpiryEvaluator, CertificateInfo};
    pub use crate::conditions::{resolve, resolve_opt, ResolvedState};
    pub use crate::crd::{
        Condition, Kafka, KafkaConnector, KafkaRebalance, KafkaRebalanceSpec, KafkaTopic,
        KafkaUser,
    };
    pub use crate::error::{Error, Result};
    pub use crate::health::{
        run_health_check, HealthCheckContext, HealthCheckResult, HealthChecker, HealthFinding,
        Severity,
    };
    pub use crate::rebalance::{
        RebalanceObservation, RebalanceRequest, RebalanceState, RebalanceStateMachine,
    };
    pub use crate::store::{KubeStore, MemoryStore, ResourceStore};
}
