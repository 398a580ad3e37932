//! Condition state resolution
//!
//! Every list, describe and health tool in this crate derives a resource's
//! operational state through the single reduction in this module. The
//! function is pure; identical condition lists always resolve identically,
//! so compact and verbose reports can never disagree.

use crate::crd::Condition;

/// Condition status value meaning the condition holds
pub const STATUS_TRUE: &str = "True";

/// Condition status value meaning the condition does not hold
pub const STATUS_FALSE: &str = "False";

/// Condition status value meaning the condition is indeterminate
pub const STATUS_UNKNOWN: &str = "Unknown";

/// The canonical readiness condition type
pub const TYPE_READY: &str = "Ready";

/// Label reported when no condition determines a state
pub const STATE_UNKNOWN: &str = "Unknown";

/// Label reported when the Ready condition is explicitly not "True"
pub const STATE_NOT_READY: &str = "NotReady";

/// Canonical state derived from a resource's condition list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedState {
    /// State label, the `type` of the winning condition (e.g. "Ready",
    /// "ProposalReady") or one of [`STATE_UNKNOWN`] / [`STATE_NOT_READY`]
    pub label: String,

    /// Reason and message of the winning condition, folded together
    pub detail: Option<String>,
}

impl ResolvedState {
    fn new(label: &str, detail: Option<String>) -> Self {
        Self {
            label: label.to_string(),
            detail,
        }
    }

    /// Whether the resolved label is the canonical ready state
    pub fn is_ready(&self) -> bool {
        self.label == TYPE_READY
    }
}

impl std::fmt::Display for ResolvedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({})", self.label, detail),
            None => write!(f, "{}", self.label),
        }
    }
}

/// Resolve a condition list into its canonical state.
///
/// The first condition with `status == "True"`, in sequence order, wins and
/// its `type` becomes the label. Conditions are not assumed sorted; Strimzi
/// keeps mutually exclusive phase conditions at most one "True" at a time,
/// and if that upstream invariant is ever violated the result is still
/// deterministic for a given sequence order.
///
/// With no "True" condition, an explicit `Ready` condition at "False" or
/// "Unknown" resolves to [`STATE_NOT_READY`] carrying that condition's
/// detail. An empty or absent list resolves to [`STATE_UNKNOWN`], which
/// every caller treats as not ready.
pub fn resolve(conditions: &[Condition]) -> ResolvedState {
    if conditions.is_empty() {
        return ResolvedState::new(STATE_UNKNOWN, None);
    }

    if let Some(cond) = conditions.iter().find(|c| c.status == STATUS_TRUE) {
        return ResolvedState::new(&cond.condition_type, fold_detail(cond));
    }

    if let Some(ready) = conditions.iter().find(|c| c.condition_type == TYPE_READY) {
        return ResolvedState::new(STATE_NOT_READY, fold_detail(ready));
    }

    ResolvedState::new(STATE_UNKNOWN, None)
}

/// Resolve an optional condition list, treating `None` as absent.
pub fn resolve_opt(conditions: Option<&Vec<Condition>>) -> ResolvedState {
    match conditions {
        Some(conditions) => resolve(conditions),
        None => ResolvedState::new(STATE_UNKNOWN, None),
    }
}

/// Fold a condition's reason and message into one human-readable detail.
fn fold_detail(cond: &Condition) -> Option<String> {
    match (cond.reason.as_deref(), cond.message.as_deref()) {
        (Some(reason), Some(message)) => Some(format!("{reason}: {message}")),
        (Some(reason), None) => Some(reason.to_string()),
        (None, Some(message)) => Some(message.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_conditions_resolve_unknown() {
        let state = resolve(&[]);
        assert_eq!(state.label, STATE_UNKNOWN);
        assert!(state.detail.is_none());
        assert!(!state.is_ready());
    }

    #[test]
    fn test_absent_conditions_resolve_unknown() {
        let state = resolve_opt(None);
        assert_eq!(state.label, STATE_UNKNOWN);
    }

    #[test]
    fn test_single_true_condition_wins_regardless_of_position() {
        let decoys = [
            Condition::new("Ready", STATUS_FALSE),
            Condition::new("Warning", STATUS_FALSE),
        ];
        for position in 0..=decoys.len() {
            let mut conditions = decoys.to_vec();
            conditions.insert(position, Condition::new("ProposalReady", STATUS_TRUE));
            let state = resolve(&conditions);
            assert_eq!(state.label, "ProposalReady", "position {position}");
        }
    }

    #[test]
    fn test_ready_true_resolves_ready_with_detail() {
        let conditions = [Condition::new("Ready", STATUS_TRUE)
            .with_detail("Reconciled", "topic exists with 12 partitions")];
        let state = resolve(&conditions);
        assert!(state.is_ready());
        assert_eq!(
            state.detail.as_deref(),
            Some("Reconciled: topic exists with 12 partitions")
        );
    }

    #[test]
    fn test_ready_false_resolves_not_ready() {
        let conditions = [
            Condition::new("Ready", STATUS_FALSE).with_detail("KafkaError", "replication timeout")
        ];
        let state = resolve(&conditions);
        assert_eq!(state.label, STATE_NOT_READY);
        assert_eq!(
            state.detail.as_deref(),
            Some("KafkaError: replication timeout")
        );
    }

    #[test]
    fn test_ready_unknown_resolves_not_ready() {
        let conditions = [Condition::new("Ready", STATUS_UNKNOWN)];
        let state = resolve(&conditions);
        assert_eq!(state.label, STATE_NOT_READY);
        assert!(state.detail.is_none());
    }

    #[test]
    fn test_no_true_no_ready_resolves_unknown() {
        let conditions = [Condition::new("Rebalancing", STATUS_FALSE)];
        let state = resolve(&conditions);
        assert_eq!(state.label, STATE_UNKNOWN);
    }

    #[test]
    fn test_message_only_detail() {
        let mut cond = Condition::new("Ready", STATUS_TRUE);
        cond.message = Some("all brokers up".to_string());
        let state = resolve(&[cond]);
        assert_eq!(state.detail.as_deref(), Some("all brokers up"));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let conditions = [
            Condition::new("Warning", STATUS_TRUE).with_detail("UnknownFields", "ignored field"),
            Condition::new("Ready", STATUS_TRUE),
        ];
        let first = resolve(&conditions);
        let second = resolve(&conditions);
        assert_eq!(first, second);
        // first True in sequence order wins
        assert_eq!(first.label, "Warning");
    }

    #[test]
    fn test_display_includes_detail() {
        let state = ResolvedState {
            label: "NotReady".to_string(),
            detail: Some("TimeoutException: request timed out".to_string()),
        };
        assert_eq!(
            state.to_string(),
            "NotReady (TimeoutException: request timed out)"
        );
    }
}
