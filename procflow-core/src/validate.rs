// Copyright 2025 Procflow Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Structural integrity checks for built datasets.
//!
//! These run after construction as a consistency audit, not as a gate:
//! findings are reported, the dataset stays usable. Useful before handing
//! a dataset to an external store or a rendering layer that assumes
//! cross-referenced ids resolve.

use std::collections::HashSet;

use crate::dataset::Dataset;

/// Outcome of a dataset audit
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub findings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Audit a dataset for internal consistency.
pub fn validate_dataset(dataset: &Dataset) -> ValidationReport {
    let mut findings = Vec::new();

    if dataset.name.len() < 3 {
        findings.push("Dataset name must be at least 3 characters long".to_string());
    }
    if dataset.nodes.len() < 2 {
        findings.push("Dataset must contain at least 2 process nodes".to_string());
    }
    if dataset.links.is_empty() {
        findings.push("Dataset must contain at least one transition".to_string());
    }
    if dataset.stats.cases == 0 {
        findings.push("Dataset must contain at least 1 case".to_string());
    }

    let node_ids: HashSet<&str> = dataset.nodes.iter().map(|n| n.id.as_str()).collect();
    for link in &dataset.links {
        if !node_ids.contains(link.source.as_str()) {
            findings.push(format!("Orphaned link source: {}", link.source));
        }
        if !node_ids.contains(link.target.as_str()) {
            findings.push(format!("Orphaned link target: {}", link.target));
        }
        if link.weight == 0 {
            findings.push(format!(
                "Zero-weight link: {} -> {}",
                link.source, link.target
            ));
        }
    }

    for case in &dataset.cases {
        let ordered = case
            .events
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp);
        if !ordered {
            findings.push(format!("Case {} has out-of-order events", case.case_id));
        }
    }

    ValidationReport { findings }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dataset() -> Dataset {
        Dataset::from_log(
            "t",
            "sample flow",
            "Case ID,Activity,Timestamp\n\
             A,Start,2025-01-01T00:00:00\n\
             A,End,2025-01-01T01:00:00",
        )
        .unwrap()
    }

    #[test]
    fn test_well_formed_dataset_passes() {
        let report = validate_dataset(&sample_dataset());
        assert!(report.is_valid(), "unexpected findings: {:?}", report.findings);
    }

    #[test]
    fn test_orphaned_link_detected() {
        let mut dataset = sample_dataset();
        dataset.links[0].target = "Ghost".to_string();
        let report = validate_dataset(&dataset);
        assert!(report
            .findings
            .iter()
            .any(|f| f.contains("Orphaned link target: Ghost")));
    }

    #[test]
    fn test_short_name_flagged() {
        let mut dataset = sample_dataset();
        dataset.name = "ab".to_string();
        assert!(!validate_dataset(&dataset).is_valid());
    }

    #[test]
    fn test_out_of_order_case_flagged() {
        let mut dataset = sample_dataset();
        dataset.cases[0].events.swap(0, 1);
        let report = validate_dataset(&dataset);
        assert!(report.findings.iter().any(|f| f.contains("out-of-order")));
    }
}
