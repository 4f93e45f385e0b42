//! Explain output
//!
//! Deterministic, human-readable (and JSON-serializable) description of what
//! a call would send to the store, or why it was rejected.

use std::fmt;

use serde::Serialize;

use super::assembler::QueryDescriptor;
use super::partition::PartitionKeyBinding;
use super::render::{render, SqlQuerySpec};
use crate::error::QueryError;

/// Explain plan output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainPlan {
    /// Whether the call passed validation
    pub accepted: bool,
    pub collection: Option<String>,
    pub action: Option<String>,
    /// Rendered query (if accepted)
    pub query: Option<SqlQuerySpec>,
    /// Partition key derived from the predicates, if any
    pub partition_key: Option<PartitionKeyBinding>,
    pub page_size: Option<u32>,
    /// Base64 continuation token the call resumes from
    pub continuation: Option<String>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from an assembled descriptor
    pub fn from_descriptor(
        descriptor: &QueryDescriptor,
        partition_key: Option<PartitionKeyBinding>,
    ) -> Self {
        Self {
            accepted: true,
            collection: Some(descriptor.collection().to_string()),
            action: Some(descriptor.action().as_str().to_string()),
            query: Some(render(descriptor)),
            partition_key,
            page_size: Some(descriptor.page().page_size()),
            continuation: descriptor.page().continuation().map(|t| t.to_base64()),
            rejection_code: None,
            rejection_reason: None,
        }
    }

    /// Creates an explain plan from a rejection
    pub fn from_error(err: &QueryError) -> Self {
        Self {
            accepted: false,
            collection: None,
            action: None,
            query: None,
            partition_key: None,
            page_size: None,
            continuation: None,
            rejection_code: Some(err.code().to_string()),
            rejection_reason: Some(err.to_string()),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if !self.accepted {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
            return Ok(());
        }

        writeln!(f, "Status: ACCEPTED")?;
        if let Some(collection) = &self.collection {
            writeln!(f, "Collection: {}", collection)?;
        }
        if let Some(action) = &self.action {
            writeln!(f, "Action: {}", action)?;
        }
        if let Some(query) = &self.query {
            writeln!(f, "Query: {}", query.text)?;
            if !query.parameters.is_empty() {
                writeln!(f, "Parameters:")?;
                for param in &query.parameters {
                    writeln!(f, "  - {} = {}", param.name, param.value)?;
                }
            }
        }
        match &self.partition_key {
            Some(binding) => writeln!(f, "Partition Key: {} = {}", binding.property(), binding.value())?,
            None => writeln!(f, "Partition Key: (cross-partition)")?,
        }
        if let Some(size) = self.page_size {
            writeln!(f, "Page Size: {}", size)?;
        }
        if let Some(token) = &self.continuation {
            writeln!(f, "Continuation: {}", token)?;
        }

        Ok(())
    }
}
