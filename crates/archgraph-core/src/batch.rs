//! Ordered execution of operation lists.
//!
//! There is no rollback: the tree that comes out reflects every operation that
//! succeeded, in order, on top of the ones before it.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::GraphNode;
use crate::operation::{Operation, RawOperation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Success,
    Error,
}

/// Outcome of one operation of a batch. `operation_index` is zero-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub operation_index: usize,
    pub name: String,
    pub status: OperationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl OperationResult {
    fn success(operation_index: usize, name: &str, note: Option<String>) -> Self {
        Self {
            operation_index,
            name: name.to_string(),
            status: OperationStatus::Success,
            error: None,
            note,
        }
    }

    fn failure(operation_index: usize, name: &str, error: String) -> Self {
        Self {
            operation_index,
            name: name.to_string(),
            status: OperationStatus::Error,
            error: Some(error),
            note: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == OperationStatus::Success
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub tree: GraphNode,
    pub results: Vec<OperationResult>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationResult> {
        self.results.iter().filter(|r| !r.succeeded())
    }

    /// One line for the driving agent, e.g.
    /// `2 succeeded, 1 failed: operation 2 (add_node): parent node 'x' not found`.
    pub fn summary(&self) -> String {
        let mut summary = format!("{} succeeded, {} failed", self.succeeded(), self.failed());
        let reasons: Vec<String> = self
            .failures()
            .map(|r| {
                format!(
                    "operation {} ({}): {}",
                    r.operation_index + 1,
                    r.name,
                    r.error.as_deref().unwrap_or("unknown error")
                )
            })
            .collect();
        if !reasons.is_empty() {
            summary.push_str(": ");
            summary.push_str(&reasons.join("; "));
        }
        summary
    }
}

/// Applies `operations` in order, skipping (and logging) any that cannot be parsed or fail.
pub fn batch_update(tree: &GraphNode, operations: &[RawOperation]) -> GraphNode {
    let mut next = tree.clone();
    for (index, raw) in operations.iter().enumerate() {
        let outcome = Operation::parse(raw).and_then(|op| op.apply_in_place(&mut next));
        if let Err(err) = outcome {
            warn!(index, name = %raw.name, error = %err, "operation skipped");
        }
    }
    next
}

/// Applies `operations` in order, checking each one's references against the tree as it
/// stands at that point, and records a result per operation.
pub fn batch_update_validated(tree: &GraphNode, operations: &[RawOperation]) -> BatchReport {
    let mut next = tree.clone();
    let mut results = Vec::with_capacity(operations.len());
    for (index, raw) in operations.iter().enumerate() {
        let result = match run_validated(&mut next, raw) {
            Ok(note) => OperationResult::success(index, &raw.name, note),
            Err(err) => {
                debug!(index, name = %raw.name, error = %err, "operation failed");
                OperationResult::failure(index, &raw.name, err.to_string())
            }
        };
        results.push(result);
    }
    let report = BatchReport {
        tree: next,
        results,
    };
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "batch applied"
    );
    report
}

fn run_validated(root: &mut GraphNode, raw: &RawOperation) -> Result<Option<String>> {
    let op = Operation::parse(raw)?;
    op.check_references(root)?;
    op.apply_in_place(root)
}
