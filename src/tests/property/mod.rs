//! Property-based tests for the campaign letter renderer
//!
//! Property tests verify invariants that should hold for all inputs, rather
//! than testing specific cases.
//!
//! ## Test Modules
//!
//! - `scanner_props`: tag scanning and resolution
//!   - Tag-free text passes through unchanged
//!   - Tokens reassemble into the input
//!   - One well-formed tag yields exactly one annotated span
//!   - Substituted names are never scanned again
//!
//! - `knowledge_base_props`: lookups
//!   - Unknown identifiers yield placeholders, never errors
//!   - Case-folded lookups find the same record when enabled
//!   - Search results always contain the term
//!
//! - `positioner_props`: placement geometry
//!   - A tooltip that fits the viewport is placed inside it
//!
//! - `tooltip_props`: the tooltip state machine
//!   - Entering and leaving before the show delay never shows a tooltip
//!
//! ## Configuration
//!
//! By default, proptest runs 256 cases per property. This can be configured
//! via the `PROPTEST_CASES` environment variable:
//!
//! ```sh
//! PROPTEST_CASES=1000 cargo test property --release
//! ```

mod knowledge_base_props;
mod positioner_props;
mod scanner_props;
mod tooltip_props;
