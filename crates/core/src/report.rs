//! Report identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable identifier of one report configuration.
///
/// A key is never reused across different report configurations: a changed
/// report gets a new `report_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReportKey {
    pub customer_id: u32,
    pub project_id: u32,
    pub metric_id: u32,
    pub report_id: u32,
}

impl ReportKey {
    pub fn new(customer_id: u32, project_id: u32, metric_id: u32, report_id: u32) -> Self {
        Self {
            customer_id,
            project_id,
            metric_id,
            report_id,
        }
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.customer_id, self.project_id, self.metric_id, self.report_id
        )
    }
}
