//! Report outputs: console text, JSON and Markdown files.
//!
//! All outputs consume a finished [`Report`](crate::report::Report) read-only.
//!
//! # Submodules
//!
//! - [`console`]: Summary and detailed plain-text renderings
//! - [`json`]: Pretty JSON file named after the query and timestamp
//! - [`markdown`]: Markdown document, optionally written next to the JSON
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── search_results_jane_doe_20261019_142501.json
//! └── search_results_jane_doe_20261019_142501.md   # with --markdown
//! ```

pub mod console;
pub mod json;
pub mod markdown;
