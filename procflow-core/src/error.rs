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

//! Error taxonomy for log ingestion.
//!
//! Format-level failures abort the ingest attempt as a whole and are meant
//! to be surfaced to the user; row-level failures are dropped inside the
//! parser and never escalate. A failed ingest must leave any previously
//! active dataset untouched.

use thiserror::Error;

/// Result type for procflow operations
pub type Result<T> = std::result::Result<T, ProcflowError>;

/// Errors raised while turning raw log text into a dataset
#[derive(Debug, Error)]
pub enum ProcflowError {
    /// Input was empty or whitespace-only
    #[error("Log text is empty")]
    EmptyInput,

    /// A header row alone is not a log
    #[error("Log must contain a header row and at least one data row")]
    TooFewLines,

    /// The payload is an HTML document rather than delimited text. Usually
    /// means a fetch for a missing resource returned an error page.
    #[error("Payload looks like an HTML document, not an event log")]
    HtmlPayload,

    /// None of the header cells matched the required column aliases
    #[error("Missing required columns: {0}")]
    MissingColumns(String),

    /// Every data row was dropped during row validation
    #[error("No valid events remain after dropping {dropped} malformed rows")]
    EmptyLog { dropped: usize },
}

impl ProcflowError {
    /// Whether the payload itself was malformed, as opposed to parseable
    /// input that simply yielded no usable events.
    pub fn is_format_error(&self) -> bool {
        !matches!(self, ProcflowError::EmptyLog { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_classification() {
        assert!(ProcflowError::EmptyInput.is_format_error());
        assert!(ProcflowError::HtmlPayload.is_format_error());
        assert!(ProcflowError::MissingColumns("timestamp".into()).is_format_error());
        assert!(!ProcflowError::EmptyLog { dropped: 4 }.is_format_error());
    }
}
