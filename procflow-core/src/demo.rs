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

//! Embedded demonstration logs.
//!
//! Small curated logs compiled into the binary so a consumer can show a
//! working flow map without any upload. They go through the exact same
//! parsing path as uploaded files; the procurement log is
//! semicolon-delimited with Spanish headers on purpose, so the alias
//! matching stays exercised.

use crate::dataset::Dataset;
use crate::error::Result;

/// One embedded demo log
#[derive(Debug, Clone, Copy)]
pub struct DemoLog {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub csv: &'static str,
}

impl DemoLog {
    /// Build the full dataset for this demo
    pub fn load(&self) -> Result<Dataset> {
        Dataset::from_log(self.id, self.name, self.csv)
    }
}

/// Demo logs bundled with the crate
pub const DEMO_LOGS: &[DemoLog] = &[
    DemoLog {
        id: "hr-onboarding",
        name: "Talent Onboarding",
        description: "Hiring pipeline from accepted offer to first-month review",
        csv: include_str!("../demos/hr_onboarding.csv"),
    },
    DemoLog {
        id: "supply-procurement",
        name: "Supply Procurement",
        description: "Purchase flow from detected need to warehouse intake",
        csv: include_str!("../demos/supply_procurement.csv"),
    },
];

/// Look up a demo log by id
pub fn demo_log(id: &str) -> Option<&'static DemoLog> {
    DEMO_LOGS.iter().find(|demo| demo.id == id)
}
