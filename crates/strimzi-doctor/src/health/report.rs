//! Health findings and the aggregated report
//!
//! Checkers append [`HealthFinding`]s to one [`HealthCheckResult`] during the
//! scan phase; afterwards the result is only formatted. `format()` is pure
//! and idempotent, and an empty result renders an explicit "no issues found"
//! report rather than an empty string.

use serde::Serialize;
use std::fmt;

/// Severity of a single finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Resource is healthy
    Ok,
    /// Resource is degraded or its state could not be determined
    Warning,
    /// Resource is failing
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Ok => write!(f, "OK"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// One classified observation about one resource; immutable once appended
#[derive(Debug, Clone, Serialize)]
pub struct HealthFinding {
    /// Resource kind (e.g. "KafkaTopic")
    pub kind: String,
    /// Namespace of the resource
    pub namespace: String,
    /// Name of the resource
    pub name: String,
    /// Classification
    pub severity: Severity,
    /// Human-readable summary naming what was observed
    pub summary: String,
}

impl HealthFinding {
    /// Build a finding
    pub fn new(
        kind: &str,
        namespace: &str,
        name: &str,
        severity: Severity,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            severity,
            summary: summary.into(),
        }
    }
}

impl fmt::Display for HealthFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}: {} — {}",
            self.kind, self.namespace, self.name, self.severity, self.summary
        )
    }
}

/// Append-only accumulator for one health-check invocation
///
/// Owned by the invocation that created it; never shared across concurrent
/// checks.
#[derive(Debug, Default, Serialize)]
pub struct HealthCheckResult {
    findings: Vec<HealthFinding>,
}

impl HealthCheckResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one finding; the only mutator
    pub fn append(&mut self, finding: HealthFinding) {
        self.findings.push(finding);
    }

    /// All findings, in append order
    pub fn findings(&self) -> &[HealthFinding] {
        &self.findings
    }

    /// Count of findings at the given severity
    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    /// Whether any finding is WARNING or ERROR
    pub fn has_issues(&self) -> bool {
        self.findings
            .iter()
            .any(|f| f.severity != Severity::Ok)
    }

    /// Render the report: per-severity counts, then findings grouped by
    /// resource kind in first-seen order.
    pub fn format(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Health check: {} resource(s) inspected — {} OK, {} WARNING, {} ERROR\n",
            self.findings.len(),
            self.count(Severity::Ok),
            self.count(Severity::Warning),
            self.count(Severity::Error),
        ));

        if !self.has_issues() {
            out.push_str("No issues found.\n");
            if self.findings.is_empty() {
                return out;
            }
        }

        let mut kinds: Vec<&str> = Vec::new();
        for finding in &self.findings {
            if !kinds.contains(&finding.kind.as_str()) {
                kinds.push(&finding.kind);
            }
        }

        for kind in kinds {
            out.push_str(&format!("\n{kind}:\n"));
            for finding in self.findings.iter().filter(|f| f.kind == kind) {
                out.push_str(&format!("  {finding}\n"));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_renders_no_issues() {
        let result = HealthCheckResult::new();
        let report = result.format();
        assert!(report.contains("0 WARNING"));
        assert!(report.contains("0 ERROR"));
        assert!(report.contains("No issues found."));
    }

    #[test]
    fn test_format_is_idempotent() {
        let mut result = HealthCheckResult::new();
        result.append(HealthFinding::new(
            "Kafka",
            "kafka",
            "prod",
            Severity::Ok,
            "Ready",
        ));
        assert_eq!(result.format(), result.format());
    }

    #[test]
    fn test_counts_partition_findings() {
        let mut result = HealthCheckResult::new();
        result.append(HealthFinding::new("Kafka", "a", "x", Severity::Ok, "Ready"));
        result.append(HealthFinding::new(
            "KafkaTopic",
            "a",
            "y",
            Severity::Warning,
            "no status",
        ));
        result.append(HealthFinding::new(
            "KafkaTopic",
            "a",
            "z",
            Severity::Error,
            "NotReady",
        ));

        assert_eq!(result.count(Severity::Ok), 1);
        assert_eq!(result.count(Severity::Warning), 1);
        assert_eq!(result.count(Severity::Error), 1);
        assert_eq!(
            result.count(Severity::Ok)
                + result.count(Severity::Warning)
                + result.count(Severity::Error),
            result.findings().len()
        );
    }

    #[test]
    fn test_format_groups_by_kind() {
        let mut result = HealthCheckResult::new();
        result.append(HealthFinding::new("Kafka", "a", "x", Severity::Ok, "Ready"));
        result.append(HealthFinding::new(
            "KafkaTopic",
            "a",
            "y",
            Severity::Warning,
            "no status",
        ));
        result.append(HealthFinding::new("Kafka", "b", "w", Severity::Ok, "Ready"));

        let report = result.format();
        let kafka_pos = report.find("\nKafka:\n").unwrap();
        let topic_pos = report.find("\nKafkaTopic:\n").unwrap();
        assert!(kafka_pos < topic_pos);
        assert!(report.contains("KafkaTopic/a/y: WARNING — no status"));
    }

    #[test]
    fn test_has_issues() {
        let mut result = HealthCheckResult::new();
        assert!(!result.has_issues());
        result.append(HealthFinding::new("Kafka", "a", "x", Severity::Ok, "Ready"));
        assert!(!result.has_issues());
        result.append(HealthFinding::new(
            "Kafka",
            "a",
            "y",
            Severity::Warning,
            "Unknown",
        ));
        assert!(result.has_issues());
    }
}
