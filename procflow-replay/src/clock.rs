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

//! Replay clock state machine.
//!
//! One authoritative progress scalar in [0,1] drives the whole replay.
//! Autoplay advances it from wall-clock deltas so playback rate is
//! independent of frame rate; reaching the end parks the clock in a dwell
//! state and then loops back to the start, which reads as a seamless
//! restart instead of an abrupt jump. Scrubbing always pauses autoplay.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Slowest playback multiplier exposed on the control surface
pub const MIN_SPEED: f64 = 0.1;

/// Fastest playback multiplier
pub const MAX_SPEED: f64 = 2.5;

/// Progress gained per wall-clock second at speed 1.0; a full replay takes
/// a minute.
const BASE_RATE: f64 = 1.0 / 60.0;

/// Wall-clock seconds spent parked at the end before looping
const LOOP_DWELL_SECS: f64 = 5.0;

/// Spans shorter than this are widened so progress-to-time mapping never
/// degenerates on sub-second logs.
const MIN_SPAN_MS: i64 = 1_000;

/// Replay lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockState {
    /// Initial state, progress at 0
    Stopped,
    /// Autoplay advancing progress
    Playing,
    /// Progress frozen where it was
    Paused,
    /// Progress at 1.0, waiting out the dwell before looping
    LoopWait,
}

/// The replay clock: progress, play state, and speed multiplier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayClock {
    state: ClockState,
    progress: f64,
    speed: f64,
    /// Wall-clock seconds accumulated in `LoopWait`
    dwell: f64,
}

impl Default for ReplayClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayClock {
    pub fn new() -> Self {
        Self {
            state: ClockState::Stopped,
            progress: 0.0,
            speed: 1.0,
            dwell: 0.0,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Start or resume autoplay. A clock already playing (or dwelling at
    /// the loop boundary, which carries playing intent) is left alone.
    pub fn play(&mut self) {
        if matches!(self.state, ClockState::Stopped | ClockState::Paused) {
            self.state = ClockState::Playing;
        }
    }

    /// Freeze progress where it is. Pausing in the dwell window cancels
    /// the pending loop.
    pub fn pause(&mut self) {
        if matches!(self.state, ClockState::Playing | ClockState::LoopWait) {
            self.state = ClockState::Paused;
            self.dwell = 0.0;
        }
    }

    /// Scrub to a progress value. Always lands paused, from any state, and
    /// is idempotent: seeking to the current position changes nothing.
    pub fn seek(&mut self, progress: f64) {
        self.progress = progress.clamp(0.0, 1.0);
        self.state = ClockState::Paused;
        self.dwell = 0.0;
    }

    /// Back to the initial state with progress at 0.
    pub fn reset(&mut self) {
        self.state = ClockState::Stopped;
        self.progress = 0.0;
        self.dwell = 0.0;
    }

    /// Clamp and apply a playback speed multiplier.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
    }

    /// Advance by a wall-clock delta. Only `Playing` moves progress;
    /// `LoopWait` burns down the dwell and then restarts from 0 without
    /// external input.
    pub fn advance(&mut self, delta_secs: f64) {
        if delta_secs <= 0.0 {
            return;
        }
        match self.state {
            ClockState::Playing => {
                self.progress += delta_secs * BASE_RATE * self.speed;
                if self.progress >= 1.0 {
                    self.progress = 1.0;
                    self.state = ClockState::LoopWait;
                    self.dwell = 0.0;
                    debug!("Replay reached end, entering loop dwell");
                }
            }
            ClockState::LoopWait => {
                self.dwell += delta_secs;
                if self.dwell >= LOOP_DWELL_SECS {
                    self.progress = 0.0;
                    self.dwell = 0.0;
                    self.state = ClockState::Playing;
                    debug!("Loop dwell elapsed, restarting replay");
                }
            }
            ClockState::Stopped | ClockState::Paused => {}
        }
    }

    /// Map progress onto the dataset span. The span is floored at one
    /// second so sub-second logs still produce a usable time axis.
    pub fn simulated_time(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> DateTime<Utc> {
        let span_ms = effective_span_ms(start, end);
        start + Duration::milliseconds((self.progress * span_ms as f64) as i64)
    }
}

/// Observed span in milliseconds, floored at [`MIN_SPAN_MS`]
pub fn effective_span_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_milliseconds().max(MIN_SPAN_MS)
}
