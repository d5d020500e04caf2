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

//! The replay session container.
//!
//! Single owner of all mutable replay state: the active dataset, the
//! clock, and the simplification ratio. Every control-surface mutation
//! goes through this container under one lock, so playback controls,
//! dataset swaps, and frame ticks can never interleave into an
//! inconsistent view.
//!
//! Ingest is guarded by a ticket counter: each attempt takes a ticket up
//! front and may only commit while no newer ticket has committed. A slow
//! parse finishing after a newer upload is discarded instead of clobbering
//! it.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{info, warn};

use procflow_core::{
    simplify, Dataset, DemoLog, ProcessGraph, Result, SimplifiedGraph, MAX_RATIO, MIN_RATIO,
};

use crate::clock::{effective_span_ms, ClockState, ReplayClock};
use crate::tokens::{active_tokens, ActiveToken};

/// Ordering token for one ingest attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestTicket(u64);

#[derive(Debug)]
struct SessionInner {
    dataset: Option<Dataset>,
    clock: ReplayClock,
    ratio: f64,
    /// Last ticket handed out
    issued: u64,
    /// Ticket of the currently active dataset
    committed: u64,
}

/// Coordinating state container for one replay surface
#[derive(Debug)]
pub struct ReplaySession {
    inner: RwLock<SessionInner>,
}

impl Default for ReplaySession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplaySession {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SessionInner {
                dataset: None,
                clock: ReplayClock::new(),
                ratio: 0.85,
                issued: 0,
                committed: 0,
            }),
        }
    }

    /// Reserve an ordering ticket for an ingest attempt.
    pub fn begin_ingest(&self) -> IngestTicket {
        let mut inner = self.inner.write();
        inner.issued += 1;
        IngestTicket(inner.issued)
    }

    /// Install a built dataset if its ticket is still the newest to land.
    ///
    /// Returns false (and changes nothing) when a later ticket has already
    /// committed; the stale result is dropped under last-write-wins.
    /// Committing replaces the dataset wholesale and resets the clock.
    pub fn commit_ingest(&self, ticket: IngestTicket, dataset: Dataset) -> bool {
        let mut inner = self.inner.write();
        if ticket.0 <= inner.committed {
            warn!(
                ticket = ticket.0,
                committed = inner.committed,
                dataset = %dataset.name,
                "Discarding stale ingest result"
            );
            return false;
        }
        info!(
            dataset = %dataset.name,
            cases = dataset.stats.cases,
            "Activating dataset"
        );
        inner.committed = ticket.0;
        inner.dataset = Some(dataset);
        inner.clock.reset();
        true
    }

    /// Parse raw log text and activate the resulting dataset.
    ///
    /// A parse failure leaves the previously active dataset untouched.
    pub fn ingest(&self, id: &str, name: &str, raw: &str) -> Result<()> {
        let ticket = self.begin_ingest();
        let dataset = Dataset::from_log(id, name, raw)?;
        self.commit_ingest(ticket, dataset);
        Ok(())
    }

    /// Load an embedded demo log through the same ingest path.
    pub fn select_demo(&self, demo: &DemoLog) -> Result<()> {
        let ticket = self.begin_ingest();
        let dataset = demo.load()?;
        self.commit_ingest(ticket, dataset);
        Ok(())
    }

    pub fn has_dataset(&self) -> bool {
        self.inner.read().dataset.is_some()
    }

    /// Clone of the active dataset for a boundary handoff.
    pub fn dataset(&self) -> Option<Dataset> {
        self.inner.read().dataset.clone()
    }

    /// Read the active dataset under the lock without cloning.
    pub fn with_dataset<R>(&self, f: impl FnOnce(&Dataset) -> R) -> Option<R> {
        self.inner.read().dataset.as_ref().map(f)
    }

    /// Clamp and apply the simplification ratio.
    pub fn set_ratio(&self, ratio: f64) {
        self.inner.write().ratio = ratio.clamp(MIN_RATIO, MAX_RATIO);
    }

    pub fn ratio(&self) -> f64 {
        self.inner.read().ratio
    }

    /// Simplified view of the active dataset at the current ratio.
    pub fn simplified(&self) -> Option<SimplifiedGraph> {
        let inner = self.inner.read();
        let dataset = inner.dataset.as_ref()?;
        let graph = ProcessGraph {
            nodes: dataset.nodes.clone(),
            links: dataset.links.clone(),
            cases: Vec::new(),
        };
        Some(simplify(&graph, inner.ratio))
    }

    pub fn play(&self) {
        self.inner.write().clock.play();
    }

    pub fn pause(&self) {
        self.inner.write().clock.pause();
    }

    pub fn seek(&self, progress: f64) {
        self.inner.write().clock.seek(progress);
    }

    pub fn reset(&self) {
        self.inner.write().clock.reset();
    }

    pub fn set_speed(&self, speed: f64) {
        self.inner.write().clock.set_speed(speed);
    }

    pub fn clock_state(&self) -> ClockState {
        self.inner.read().clock.state()
    }

    pub fn progress(&self) -> f64 {
        self.inner.read().clock.progress()
    }

    pub fn speed(&self) -> f64 {
        self.inner.read().clock.speed()
    }

    /// The instant of dataset time the clock currently points at.
    pub fn simulated_time(&self) -> Option<DateTime<Utc>> {
        let inner = self.inner.read();
        let dataset = inner.dataset.as_ref()?;
        let (start, end) = (dataset.stats.start?, dataset.stats.end?);
        Some(inner.clock.simulated_time(start, end))
    }

    /// Advance the clock by a wall-clock delta and derive the frame's
    /// tokens. Without a dataset (or with a span-less one) the tick is a
    /// no-op returning no tokens.
    pub fn tick(&self, delta_secs: f64) -> Vec<ActiveToken> {
        let mut inner = self.inner.write();
        inner.clock.advance(delta_secs);

        let Some(dataset) = inner.dataset.as_ref() else {
            return Vec::new();
        };
        let (Some(start), Some(end)) = (dataset.stats.start, dataset.stats.end) else {
            return Vec::new();
        };

        let simulated = inner.clock.simulated_time(start, end);
        active_tokens(&dataset.cases, simulated, effective_span_ms(start, end))
    }
}
